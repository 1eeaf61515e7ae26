use crate::blog::BlogClient;
use crate::cache::Cache;
use crate::config::Settings;
use crate::error::FetchError;
use crate::github::GitHubClient;

/// Shared handles for the route layer. Built once at startup; no globals.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub cache: Cache,
    pub github: GitHubClient,
    pub blog: BlogClient,
}

impl AppState {
    /// Connects the cache backend and builds both fetchers around it.
    pub async fn new(settings: Settings) -> Result<Self, FetchError> {
        let cache = Cache::connect(&settings.cache).await;
        Self::with_cache(settings, cache)
    }

    pub fn with_cache(settings: Settings, cache: Cache) -> Result<Self, FetchError> {
        let github = GitHubClient::new(&settings.github, cache.clone())?;
        let blog = BlogClient::new(&settings.blog, cache.clone())?;

        Ok(Self {
            settings,
            cache,
            github,
            blog,
        })
    }
}
