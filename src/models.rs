use crate::error::ErrorBody;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// GitHub payloads are passed through verbatim; only the fields the
// aggregates read are named, everything else rides along in `extra`.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_repos: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stargazers_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Repository {
    pub fn stars(&self) -> u64 {
        self.stargazers_count.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubStats {
    pub username: String,
    pub total_repos: usize,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub events_last_week: usize,
    pub events_last_month: usize,
    pub push_events: usize,
    pub pull_request_events: usize,
    pub issue_events: usize,
    pub contributions: Vec<DailyCount>,
    pub recent_activity: Vec<Event>,
    pub top_repos: Vec<Repository>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: String,
    /// ISO 8601 when the entry's date parsed, otherwise the raw `published` text.
    pub published_date: String,
    pub author: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedInfo {
    pub title: String,
    pub description: String,
    pub link: String,
    pub language: String,
    pub updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogStats {
    pub blog_title: String,
    pub total_posts: usize,
    pub recent_posts_month: usize,
    pub posts_per_month: Vec<MonthlyCount>,
    pub latest_posts: Vec<BlogPost>,
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub cache_enabled: bool,
    pub github_configured: bool,
    pub blog_configured: bool,
}

#[derive(Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub username: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub username: Option<String>,
    #[serde(default = "default_github_limit")]
    pub limit: usize,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub url: Option<String>,
}

#[derive(Deserialize)]
pub struct PostsQuery {
    pub url: Option<String>,
    #[serde(default = "default_posts_limit")]
    pub limit: usize,
}

fn default_github_limit() -> usize {
    30
}

fn default_posts_limit() -> usize {
    10
}

#[derive(Serialize, Deserialize)]
pub struct ReposResponse {
    pub repos: Vec<Repository>,
    pub count: usize,
}

#[derive(Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<Event>,
    pub count: usize,
}

#[derive(Serialize, Deserialize)]
pub struct PostsResponse {
    pub posts: Vec<BlogPost>,
    pub count: usize,
}

/// A dashboard section: the aggregate, or an error object in its place.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Section<T> {
    Error(ErrorBody),
    Data(T),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub github: Section<GitHubStats>,
    pub blog: Section<BlogStats>,
}

#[derive(Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
}
