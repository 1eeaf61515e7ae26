pub mod blog;
pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod stats;
