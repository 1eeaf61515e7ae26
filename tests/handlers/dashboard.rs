use crate::fixtures::{
    FEED_PATH, disabled_cache, events_json, get_json, memory_cache, profile_json, repos_json,
    rss_feed, settings_for, test_app, unconfigured_settings,
};
use axum::http::StatusCode;
use mockito::Matcher;

#[tokio::test]
async fn unconfigured_sources_are_reported_inline() {
    let app = test_app(unconfigured_settings(), disabled_cache());
    let (status, body) = get_json(&app, "/api/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["github"]["error"], "GitHub not configured");
    assert_eq!(body["blog"]["error"], "Blog not configured");
}

#[tokio::test]
async fn combines_github_and_blog_stats() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(profile_json())
        .create_async()
        .await;
    server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(repos_json(&[10, 20]))
        .create_async()
        .await;
    server
        .mock("GET", "/users/octocat/events")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(events_json(&[3]))
        .create_async()
        .await;
    server
        .mock("GET", FEED_PATH)
        .with_status(200)
        .with_body(rss_feed("Test Blog", &[2, 50]))
        .create_async()
        .await;

    let app = test_app(settings_for(&server.url()), memory_cache());
    let (status, body) = get_json(&app, "/api/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["github"]["username"], "octocat");
    assert_eq!(body["github"]["total_repos"], 2);
    assert_eq!(body["github"]["top_repos"][0]["stargazers_count"], 20);
    assert_eq!(body["blog"]["blog_title"], "Test Blog");
    assert_eq!(body["blog"]["total_posts"], 2);
    assert_eq!(body["blog"]["recent_posts_month"], 1);
}

#[tokio::test]
async fn empty_blog_embeds_no_posts_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", FEED_PATH)
        .with_status(200)
        .with_body(rss_feed("Quiet Blog", &[]))
        .create_async()
        .await;

    let mut settings = settings_for(&server.url());
    settings.github.username = None;

    let app = test_app(settings, memory_cache());
    let (status, body) = get_json(&app, "/api/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["github"]["error"], "GitHub not configured");
    assert_eq!(body["blog"]["error"], "No posts found");
    assert_eq!(body["blog"]["total_posts"], 0);
}
