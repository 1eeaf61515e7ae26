use crate::error::{ApiError, ErrorBody, FetchResult};
use crate::models::{
    BlogStats, ClearCacheResponse, DashboardResponse, EventsResponse, FeedInfo, FeedQuery,
    GitHubStats, HealthResponse, ListQuery, PostsQuery, PostsResponse, Profile, ReposResponse,
    RootResponse, Section, UserQuery,
};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

pub async fn root(State(state): State<Arc<AppState>>) -> Response {
    let index = state.settings.frontend_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => Json(RootResponse {
            message: "Activity Dashboard API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
        .into_response(),
    }
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        cache_enabled: state.cache.enabled(),
        github_configured: state.settings.github_configured(),
        blog_configured: state.settings.blog_configured(),
    })
}

pub async fn github_user(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state.github.get_user_info(params.username.as_deref()).await?;
    Ok(Json(profile))
}

pub async fn github_repos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ReposResponse>, ApiError> {
    let mut repos = state
        .github
        .get_user_repos(params.username.as_deref(), params.limit)
        .await?;
    repos.truncate(params.limit);

    let count = repos.len();
    Ok(Json(ReposResponse { repos, count }))
}

pub async fn github_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let mut events = state
        .github
        .get_user_events(params.username.as_deref(), params.limit)
        .await?;
    events.truncate(params.limit);

    let count = events.len();
    Ok(Json(EventsResponse { events, count }))
}

pub async fn github_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserQuery>,
) -> Result<Json<GitHubStats>, ApiError> {
    let stats = state
        .github
        .get_activity_stats(params.username.as_deref())
        .await?;
    Ok(Json(stats))
}

pub async fn blog_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PostsQuery>,
) -> Result<Json<PostsResponse>, ApiError> {
    let posts = state
        .blog
        .get_posts(params.url.as_deref(), params.limit)
        .await?;

    let count = posts.len();
    Ok(Json(PostsResponse { posts, count }))
}

pub async fn blog_info(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedInfo>, ApiError> {
    let info = state.blog.get_feed_info(params.url.as_deref()).await?;
    Ok(Json(info))
}

pub async fn blog_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<BlogStats>, ApiError> {
    let stats = state.blog.get_activity_stats(params.url.as_deref()).await?;
    Ok(Json(stats))
}

fn section<T>(source: &str, result: FetchResult<T>) -> Section<T> {
    match result {
        Ok(data) => Section::Data(data),
        Err(e) => {
            error!("Error fetching {} data: {}", source, e);
            Section::Error(e.to_body())
        }
    }
}

/// GitHub and blog aggregates side by side, fetched concurrently.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    let github = async {
        if state.github.default_username().is_none() {
            return Section::Error(ErrorBody::new("GitHub not configured"));
        }
        section("GitHub", state.github.get_activity_stats(None).await)
    };

    let blog = async {
        if state.blog.default_url().is_none() {
            return Section::Error(ErrorBody::new("Blog not configured"));
        }
        section("blog", state.blog.get_activity_stats(None).await)
    };

    let (github, blog) = futures::join!(github, blog);
    Json(DashboardResponse { github, blog })
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<ClearCacheResponse> {
    let success = state.cache.clear().await;
    Json(ClearCacheResponse {
        success,
        message: if success {
            "Cache cleared".to_string()
        } else {
            "Cache not enabled".to_string()
        },
    })
}
