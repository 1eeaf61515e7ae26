// Aggregates derived from fetched data. Pure functions of their inputs and `now`.

use crate::models::{
    BlogPost, BlogStats, DailyCount, Event, GitHubStats, MonthlyCount, Profile, Repository,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;

pub const RECENT_EVENTS: usize = 10;
pub const TOP_REPOS: usize = 5;
pub const LATEST_POSTS: usize = 5;

/// Parses GitHub's `created_at` (`2024-01-31T12:00:00Z`).
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parses a post's derived ISO 8601 date. Offset-less values are taken as UTC.
pub fn parse_post_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Top `limit` repositories by stars; equal counts keep upstream order.
pub fn top_repositories(repos: &[Repository], limit: usize) -> Vec<Repository> {
    let mut sorted = repos.to_vec();
    sorted.sort_by(|a, b| b.stars().cmp(&a.stars()));
    sorted.truncate(limit);
    sorted
}

pub fn count_events_since(events: &[Event], since: DateTime<Utc>) -> usize {
    events
        .iter()
        .filter_map(|event| event.created_at.as_deref().and_then(parse_event_time))
        .filter(|created| *created > since)
        .count()
}

fn count_kind(events: &[Event], kind: &str) -> usize {
    events
        .iter()
        .filter(|event| event.kind.as_deref() == Some(kind))
        .count()
}

/// Events per day, newest day first.
pub fn daily_contributions(events: &[Event]) -> Vec<DailyCount> {
    let mut days: BTreeMap<String, usize> = BTreeMap::new();
    for created in events
        .iter()
        .filter_map(|event| event.created_at.as_deref().and_then(parse_event_time))
    {
        *days.entry(created.format("%Y-%m-%d").to_string()).or_default() += 1;
    }

    days.into_iter()
        .rev()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

pub fn github_stats(
    username: &str,
    profile: Option<&Profile>,
    repos: &[Repository],
    events: &[Event],
    now: DateTime<Utc>,
) -> GitHubStats {
    GitHubStats {
        username: username.to_string(),
        total_repos: repos.len(),
        public_repos: profile.and_then(|p| p.public_repos).unwrap_or(0),
        followers: profile.and_then(|p| p.followers).unwrap_or(0),
        following: profile.and_then(|p| p.following).unwrap_or(0),
        events_last_week: count_events_since(events, now - Duration::days(7)),
        events_last_month: count_events_since(events, now - Duration::days(30)),
        push_events: count_kind(events, "PushEvent"),
        pull_request_events: count_kind(events, "PullRequestEvent"),
        issue_events: count_kind(events, "IssuesEvent"),
        contributions: daily_contributions(events),
        recent_activity: events.iter().take(RECENT_EVENTS).cloned().collect(),
        top_repos: top_repositories(repos, TOP_REPOS),
    }
}

/// Posts per calendar month (`YYYY-MM`), newest first; undated posts are skipped.
pub fn posts_per_month(posts: &[BlogPost]) -> Vec<MonthlyCount> {
    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for published in posts
        .iter()
        .filter_map(|post| parse_post_date(&post.published_date))
    {
        *months.entry(published.format("%Y-%m").to_string()).or_default() += 1;
    }

    months
        .into_iter()
        .rev()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

pub fn blog_stats(blog_title: &str, posts: &[BlogPost], now: DateTime<Utc>) -> BlogStats {
    let month_ago = now - Duration::days(30);
    let recent_posts_month = posts
        .iter()
        .filter_map(|post| parse_post_date(&post.published_date))
        .filter(|published| *published > month_ago)
        .count();

    BlogStats {
        blog_title: blog_title.to_string(),
        total_posts: posts.len(),
        recent_posts_month,
        posts_per_month: posts_per_month(posts),
        latest_posts: posts.iter().take(LATEST_POSTS).cloned().collect(),
    }
}
