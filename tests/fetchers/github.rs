use crate::fixtures::{
    TOKEN, USERNAME, disabled_cache, events_json, memory_cache, profile_json, repos_json,
    settings_for,
};
use activity_dashboard::cache::{Cache, CacheKey};
use activity_dashboard::config::GitHubSettings;
use activity_dashboard::error::FetchError;
use activity_dashboard::github::GitHubClient;
use activity_dashboard::models::Profile;
use mockito::Matcher;

fn client(server_url: &str, cache: Cache) -> GitHubClient {
    GitHubClient::new(&settings_for(server_url).github, cache).unwrap()
}

#[tokio::test]
async fn user_info_is_fetched_once_then_served_from_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/users/octocat")
        .match_header("authorization", format!("token {TOKEN}").as_str())
        .match_header("accept", "application/vnd.github.v3+json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(profile_json())
        .expect(1)
        .create_async()
        .await;

    let cache = memory_cache();
    let github = client(&server.url(), cache.clone());

    let first = github.get_user_info(None).await.unwrap();
    let second = github.get_user_info(Some(USERNAME)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.public_repos, Some(8));
    assert_eq!(first.extra["name"], "The Octocat");
    assert_eq!(
        cache.get::<Profile>("github:user:octocat").await,
        Some(first)
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn disabled_cache_still_serves_upstream_data() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "30".into()),
            Matcher::UrlEncoded("sort".into(), "updated".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(repos_json(&[1, 2, 3]))
        .expect(2)
        .create_async()
        .await;

    let cache = disabled_cache();
    let github = client(&server.url(), cache.clone());

    let first = github.get_user_repos(None, 30).await.unwrap();
    let second = github.get_user_repos(None, 30).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert!(!cache.enabled());
    mock.assert_async().await;
}

#[tokio::test]
async fn events_are_cached_under_their_own_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/users/octocat/events")
        .match_query(Matcher::UrlEncoded("per_page".into(), "5".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(events_json(&[0, 1]))
        .expect(1)
        .create_async()
        .await;

    let cache = memory_cache();
    let github = client(&server.url(), cache.clone());

    let events = github.get_user_events(None, 5).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind.as_deref(), Some("PushEvent"));

    let key = CacheKey::GitHubEvents(USERNAME.to_string());
    assert_eq!(cache.get_key::<Vec<activity_dashboard::models::Event>>(&key).await, Some(events));
    github.get_user_events(None, 5).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_username_makes_no_request() {
    let settings = GitHubSettings {
        api_url: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    };
    let github = GitHubClient::new(&settings, memory_cache()).unwrap();

    assert!(matches!(github.get_user_info(None).await, Err(FetchError::NoUsername)));
    assert!(matches!(github.get_user_repos(None, 30).await, Err(FetchError::NoUsername)));
    assert!(matches!(github.get_user_events(Some("  "), 30).await, Err(FetchError::NoUsername)));
    assert!(matches!(github.get_activity_stats(None).await, Err(FetchError::NoUsername)));
}

#[tokio::test]
async fn upstream_failures_are_distinguishable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/ghost")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/users/broken")
        .with_status(500)
        .create_async()
        .await;

    let cache = memory_cache();
    let github = client(&server.url(), cache.clone());

    let not_found = github.get_user_info(Some("ghost")).await.unwrap_err();
    assert!(not_found.is_not_found());

    let server_error = github.get_user_info(Some("broken")).await.unwrap_err();
    assert!(matches!(server_error, FetchError::Status(500)));

    assert_eq!(cache.get::<Profile>("github:user:ghost").await, None);

    let unreachable = client("http://127.0.0.1:1", memory_cache());
    assert!(matches!(
        unreachable.get_user_info(None).await,
        Err(FetchError::Http(_))
    ));
}

#[tokio::test]
async fn activity_stats_aggregate_and_cache() {
    let mut server = mockito::Server::new_async().await;
    let user = server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(profile_json())
        .expect(1)
        .create_async()
        .await;
    let repos = server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(repos_json(&[3, 1, 4, 1, 5, 9, 2, 6]))
        .expect(1)
        .create_async()
        .await;
    let events = server
        .mock("GET", "/users/octocat/events")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(events_json(&[1, 10, 40]))
        .expect(1)
        .create_async()
        .await;

    let github = client(&server.url(), memory_cache());

    let stats = github.get_activity_stats(None).await.unwrap();
    assert_eq!(stats.username, USERNAME);
    assert_eq!(stats.total_repos, 8);
    assert_eq!(stats.public_repos, 8);
    assert_eq!(stats.followers, 120);
    assert_eq!(stats.following, 9);
    assert_eq!(stats.events_last_week, 1);
    assert_eq!(stats.events_last_month, 2);
    assert_eq!(stats.push_events, 3);
    assert_eq!(stats.recent_activity.len(), 3);
    assert_eq!(stats.top_repos.len(), 5);
    let top: Vec<u64> = stats.top_repos.iter().map(|r| r.stars()).collect();
    assert_eq!(&top[..3], &[9, 6, 5]);

    let cached = github.get_activity_stats(Some(USERNAME)).await.unwrap();
    assert_eq!(cached, stats);

    user.assert_async().await;
    repos.assert_async().await;
    events.assert_async().await;
}

#[tokio::test]
async fn activity_stats_tolerate_failed_components() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/octocat")
        .with_status(502)
        .create_async()
        .await;
    server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(repos_json(&[7]))
        .create_async()
        .await;
    server
        .mock("GET", "/users/octocat/events")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let github = client(&server.url(), disabled_cache());
    let stats = github.get_activity_stats(None).await.unwrap();

    assert_eq!(stats.total_repos, 1);
    assert_eq!(stats.public_repos, 0);
    assert_eq!(stats.followers, 0);
    assert_eq!(stats.events_last_week, 0);
    assert!(stats.recent_activity.is_empty());
}
