// GitHub activity fetcher: user profile, repositories and public events,
// each read cache-aside, plus the aggregated activity stats.

use crate::cache::{Cache, CacheKey};
use crate::config::GitHubSettings;
use crate::error::{FetchError, FetchResult};
use crate::models::{Event, GitHubStats, Profile, Repository};
use crate::stats;
use chrono::Utc;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{error, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const API_ACCEPT: &str = "application/vnd.github.v3+json";
const DEFAULT_PER_PAGE: usize = 30;

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    default_username: Option<String>,
    cache: Cache,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings, cache: Cache) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(API_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("activity-dashboard/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = &settings.token {
            match HeaderValue::from_str(&format!("token {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("GITHUB_TOKEN contains invalid header characters; ignoring it"),
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            default_username: settings.username.clone(),
            cache,
        })
    }

    pub fn default_username(&self) -> Option<&str> {
        self.default_username.as_deref()
    }

    fn resolve_username(&self, username: Option<&str>) -> FetchResult<String> {
        username
            .filter(|name| !name.trim().is_empty())
            .or(self.default_username.as_deref())
            .map(str::to_string)
            .ok_or_else(|| {
                error!("No GitHub username provided");
                FetchError::NoUsername
            })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> FetchResult<T> {
        let url = format!("{}{}", self.api_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                error!("GitHub API request failed: {}", e);
                FetchError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("GitHub API request to {} returned {}", endpoint, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        response.json::<T>().await.map_err(|e| {
            error!("GitHub API response from {} could not be decoded: {}", endpoint, e);
            FetchError::Http(e)
        })
    }

    pub async fn get_user_info(&self, username: Option<&str>) -> FetchResult<Profile> {
        let username = self.resolve_username(username)?;
        let key = CacheKey::GitHubUser(username.clone());

        if let Some(cached) = self.cache.get_key::<Profile>(&key).await {
            return Ok(cached);
        }

        let endpoint = format!("/users/{}", urlencoding::encode(&username));
        let profile: Profile = self.request(&endpoint, &[]).await?;

        self.cache.set_key(&key, &profile).await;
        Ok(profile)
    }

    pub async fn get_user_repos(
        &self,
        username: Option<&str>,
        per_page: usize,
    ) -> FetchResult<Vec<Repository>> {
        let username = self.resolve_username(username)?;
        let key = CacheKey::GitHubRepos(username.clone());

        if let Some(cached) = self.cache.get_key::<Vec<Repository>>(&key).await {
            if !cached.is_empty() {
                return Ok(cached);
            }
        }

        let endpoint = format!("/users/{}/repos", urlencoding::encode(&username));
        let params = [
            ("per_page", per_page.to_string()),
            ("sort", "updated".to_string()),
        ];
        let repos: Vec<Repository> = self.request(&endpoint, &params).await?;

        if !repos.is_empty() {
            self.cache.set_key(&key, &repos).await;
        }
        Ok(repos)
    }

    pub async fn get_user_events(
        &self,
        username: Option<&str>,
        per_page: usize,
    ) -> FetchResult<Vec<Event>> {
        let username = self.resolve_username(username)?;
        let key = CacheKey::GitHubEvents(username.clone());

        if let Some(cached) = self.cache.get_key::<Vec<Event>>(&key).await {
            if !cached.is_empty() {
                return Ok(cached);
            }
        }

        let endpoint = format!("/users/{}/events", urlencoding::encode(&username));
        let params = [("per_page", per_page.to_string())];
        let events: Vec<Event> = self.request(&endpoint, &params).await?;

        if !events.is_empty() {
            self.cache.set_key(&key, &events).await;
        }
        Ok(events)
    }

    /// Aggregated activity for `username`. Failed component reads count as empty.
    pub async fn get_activity_stats(&self, username: Option<&str>) -> FetchResult<GitHubStats> {
        let username = self.resolve_username(username)?;
        let key = CacheKey::GitHubStats(username.clone());

        if let Some(cached) = self.cache.get_key::<GitHubStats>(&key).await {
            return Ok(cached);
        }

        let events = self
            .get_user_events(Some(&username), DEFAULT_PER_PAGE)
            .await
            .unwrap_or_default();
        let repos = self
            .get_user_repos(Some(&username), DEFAULT_PER_PAGE)
            .await
            .unwrap_or_default();
        let profile = self.get_user_info(Some(&username)).await.ok();

        let stats = stats::github_stats(&username, profile.as_ref(), &repos, &events, Utc::now());

        self.cache.set_key(&key, &stats).await;
        Ok(stats)
    }
}
