use crate::fixtures::{
    disabled_cache, events_json, get_json, memory_cache, profile_json, repos_json, settings_for,
    test_app, unconfigured_settings,
};
use activity_dashboard::models::ReposResponse;
use axum::http::StatusCode;
use mockito::Matcher;

#[tokio::test]
async fn user_endpoint_passes_profile_through() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(profile_json())
        .create_async()
        .await;

    let app = test_app(settings_for(&server.url()), memory_cache());
    let (status, body) = get_json(&app, "/api/github/user").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "octocat");
    assert_eq!(body["id"], 583231);
    assert_eq!(body["name"], "The Octocat");
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/ghost")
        .with_status(404)
        .create_async()
        .await;

    let app = test_app(settings_for(&server.url()), memory_cache());
    let (status, body) = get_json(&app, "/api/github/user?username=ghost").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn upstream_outage_is_bad_gateway() {
    let app = test_app(settings_for("http://127.0.0.1:1"), disabled_cache());
    let (status, _) = get_json(&app, "/api/github/user").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn missing_username_is_bad_request() {
    let app = test_app(unconfigured_settings(), disabled_cache());

    let (status, body) = get_json(&app, "/api/github/stats").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "No username provided");

    let (status, _) = get_json(&app, "/api/github/repos").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repos_respect_limit() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::UrlEncoded("per_page".into(), "2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(repos_json(&[1, 2]))
        .create_async()
        .await;

    let app = test_app(settings_for(&server.url()), memory_cache());
    let (status, body) = get_json(&app, "/api/github/repos?limit=2").await;

    assert_eq!(status, StatusCode::OK);
    let repos: ReposResponse = serde_json::from_value(body).unwrap();
    assert_eq!(repos.count, 2);
    assert_eq!(repos.repos[0].name.as_deref(), Some("repo-0"));
}

#[tokio::test]
async fn events_endpoint_counts_events() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/octocat/events")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(events_json(&[0, 2, 4]))
        .create_async()
        .await;

    let app = test_app(settings_for(&server.url()), memory_cache());
    let (status, body) = get_json(&app, "/api/github/events").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["events"][0]["type"], "PushEvent");
}

#[tokio::test]
async fn stats_endpoint_returns_aggregate() {
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
        .with_body(repos_json(&[3, 1, 4, 1, 5, 9, 2, 6]))
        .create_async()
        .await;
    server
        .mock("GET", "/users/octocat/events")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(events_json(&[1, 10, 40]))
        .create_async()
        .await;

    let app = test_app(settings_for(&server.url()), memory_cache());
    let (status, body) = get_json(&app, "/api/github/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events_last_week"], 1);
    assert_eq!(body["events_last_month"], 2);
    assert_eq!(body["top_repos"].as_array().unwrap().len(), 5);
    assert_eq!(body["top_repos"][0]["stargazers_count"], 9);
}
