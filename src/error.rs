// Error types for the fetchers and the HTTP layer.
// Fetchers never panic or bubble transport errors as exceptions; every failure
// lands in one of these variants and the route layer maps it to a status.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No username provided")]
    NoUsername,

    #[error("No RSS URL configured")]
    NotConfigured,

    #[error("No posts found")]
    NoPosts,

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("Failed to parse feed: {0}")]
    Feed(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status(404))
    }

    /// Error-shaped payload embedded in aggregate responses (e.g. the dashboard).
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            total_posts: matches!(self, FetchError::NoPosts).then_some(0),
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_posts: Option<usize>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            total_posts: None,
        }
    }
}

/// Error returned from route handlers, rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        let status = match &err {
            FetchError::NoUsername | FetchError::NotConfigured | FetchError::NoPosts => {
                StatusCode::BAD_REQUEST
            }
            FetchError::Status(404) => StatusCode::NOT_FOUND,
            FetchError::Http(_) | FetchError::Status(_) | FetchError::Feed(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        Self::new(status, err.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorDetail { detail: self.detail })).into_response()
    }
}
