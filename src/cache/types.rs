use std::fmt;
use std::time::Duration;

pub const USER_TTL: Duration = Duration::from_secs(3600);
pub const REPOS_TTL: Duration = Duration::from_secs(1800);
pub const EVENTS_TTL: Duration = Duration::from_secs(600); // events churn fastest
pub const GITHUB_STATS_TTL: Duration = Duration::from_secs(1800);

pub const BLOG_POSTS_TTL: Duration = Duration::from_secs(3600);
pub const BLOG_INFO_TTL: Duration = Duration::from_secs(7200);
pub const BLOG_STATS_TTL: Duration = Duration::from_secs(3600);

/// Deterministic cache keys, one variant per cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    GitHubUser(String),
    GitHubRepos(String),
    GitHubEvents(String),
    GitHubStats(String),
    BlogPosts(String),
    BlogInfo(String),
    BlogStats(String),
}

impl CacheKey {
    pub fn ttl(&self) -> Duration {
        match self {
            CacheKey::GitHubUser(_) => USER_TTL,
            CacheKey::GitHubRepos(_) => REPOS_TTL,
            CacheKey::GitHubEvents(_) => EVENTS_TTL,
            CacheKey::GitHubStats(_) => GITHUB_STATS_TTL,
            CacheKey::BlogPosts(_) => BLOG_POSTS_TTL,
            CacheKey::BlogInfo(_) => BLOG_INFO_TTL,
            CacheKey::BlogStats(_) => BLOG_STATS_TTL,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::GitHubUser(username) => write!(f, "github:user:{username}"),
            CacheKey::GitHubRepos(username) => write!(f, "github:repos:{username}"),
            CacheKey::GitHubEvents(username) => write!(f, "github:events:{username}"),
            CacheKey::GitHubStats(username) => write!(f, "github:stats:{username}"),
            CacheKey::BlogPosts(url) => write!(f, "blog:posts:{url}"),
            CacheKey::BlogInfo(url) => write!(f, "blog:info:{url}"),
            CacheKey::BlogStats(url) => write!(f, "blog:stats:{url}"),
        }
    }
}
