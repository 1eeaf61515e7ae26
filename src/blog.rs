// Blog feed fetcher: RSS 2.0 and Atom documents normalized into posts,
// feed metadata and activity stats, each read cache-aside.

use crate::cache::{Cache, CacheKey};
use crate::config::BlogSettings;
use crate::error::{FetchError, FetchResult};
use crate::models::{BlogPost, BlogStats, FeedInfo};
use crate::stats;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const STATS_POST_LIMIT: usize = 100;
const ISO_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

const PLACEHOLDER_DATE: &str = "1970-01-01T00:00:00Z";

/// A parsed syndication document.
#[derive(Debug)]
pub enum FeedDocument {
    Rss(rss::Channel),
    Atom(atom_syndication::Feed),
    /// Entries read one at a time out of a document that does not parse as a whole.
    Recovered { info: FeedInfo, posts: Vec<BlogPost> },
}

impl FeedDocument {
    /// Tries RSS first, then Atom. When neither reads the whole document, each
    /// `<item>`/`<entry>` is read on its own and the unreadable ones are skipped;
    /// fails only when nothing at all can be recovered.
    pub fn parse(bytes: &[u8]) -> FetchResult<Self> {
        let rss_err = match rss::Channel::read_from(bytes) {
            Ok(channel) => return Ok(FeedDocument::Rss(channel)),
            Err(e) => e,
        };
        match atom_syndication::Feed::read_from(bytes) {
            Ok(feed) => return Ok(FeedDocument::Atom(feed)),
            Err(atom_err) => debug!("Atom parse failed after RSS: {}", atom_err),
        }

        match recover(&String::from_utf8_lossy(bytes)) {
            Some(document) => {
                warn!(
                    "Feed is malformed ({}); recovered {} entries",
                    rss_err,
                    document.posts().len()
                );
                Ok(document)
            }
            None => Err(FetchError::Feed(rss_err.to_string())),
        }
    }

    pub fn posts(&self) -> Vec<BlogPost> {
        match self {
            FeedDocument::Rss(channel) => channel.items().iter().map(rss_post).collect(),
            FeedDocument::Atom(feed) => feed.entries.iter().map(atom_post).collect(),
            FeedDocument::Recovered { posts, .. } => posts.clone(),
        }
    }

    pub fn info(&self) -> FeedInfo {
        match self {
            FeedDocument::Rss(channel) => FeedInfo {
                title: non_empty(channel.title()).unwrap_or("Unknown").to_string(),
                description: channel.description().to_string(),
                link: channel.link().to_string(),
                language: channel.language().unwrap_or_default().to_string(),
                updated: channel
                    .last_build_date()
                    .or(channel.pub_date())
                    .unwrap_or_default()
                    .to_string(),
            },
            FeedDocument::Atom(feed) => FeedInfo {
                title: non_empty(&feed.title.value).unwrap_or("Unknown").to_string(),
                description: feed
                    .subtitle
                    .as_ref()
                    .map(|text| text.value.clone())
                    .unwrap_or_default(),
                link: atom_link(&feed.links),
                language: feed.lang.clone().unwrap_or_default(),
                updated: feed.updated.to_rfc3339(),
            },
            FeedDocument::Recovered { info, .. } => info.clone(),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Parses the date forms feeds use in practice: RFC 2822 (RSS) and RFC 3339 (Atom, Dublin Core).
pub fn parse_feed_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

/// UTC ISO 8601 (seconds precision, no offset); the raw text when it does not parse.
pub fn derive_published_date(raw: &str) -> String {
    match parse_feed_date(raw) {
        Some(parsed) => iso_utc(&parsed),
        None => {
            if !raw.is_empty() {
                warn!("Unparseable post date {:?}; keeping raw value", raw);
            }
            raw.to_string()
        }
    }
}

fn iso_utc(date: &DateTime<FixedOffset>) -> String {
    date.with_timezone(&Utc).format(ISO_SECONDS).to_string()
}

fn rss_post(item: &rss::Item) -> BlogPost {
    let dublin_core = item.dublin_core_ext();
    let published = item
        .pub_date()
        .or_else(|| dublin_core.and_then(|dc| dc.dates().first().map(String::as_str)))
        .unwrap_or_default()
        .to_string();

    BlogPost {
        title: item.title().and_then(non_empty).unwrap_or("No title").to_string(),
        link: item.link().unwrap_or_default().to_string(),
        summary: item
            .description()
            .or(item.content())
            .unwrap_or_default()
            .to_string(),
        published_date: derive_published_date(&published),
        published,
        author: item
            .author()
            .or_else(|| dublin_core.and_then(|dc| dc.creators().first().map(String::as_str)))
            .and_then(non_empty)
            .unwrap_or("Unknown")
            .to_string(),
        categories: item
            .categories()
            .iter()
            .map(|category| category.name().to_string())
            .collect(),
    }
}

fn atom_post(entry: &atom_syndication::Entry) -> BlogPost {
    let date = entry.published.as_ref().unwrap_or(&entry.updated);

    BlogPost {
        title: non_empty(&entry.title.value).unwrap_or("No title").to_string(),
        link: atom_link(&entry.links),
        summary: entry
            .summary
            .as_ref()
            .map(|text| text.value.clone())
            .or_else(|| entry.content.as_ref().and_then(|content| content.value.clone()))
            .unwrap_or_default(),
        published: date.to_rfc3339(),
        published_date: iso_utc(date),
        author: entry
            .authors
            .first()
            .and_then(|person| non_empty(&person.name))
            .unwrap_or("Unknown")
            .to_string(),
        categories: entry
            .categories
            .iter()
            .map(|category| category.term.clone())
            .collect(),
    }
}

/// The `alternate` link if present, else the first link.
fn atom_link(links: &[atom_syndication::Link]) -> String {
    links
        .iter()
        .find(|link| link.rel == "alternate")
        .or(links.first())
        .map(|link| link.href.clone())
        .unwrap_or_default()
}

fn recover(text: &str) -> Option<FeedDocument> {
    if let Some((_, root)) = open_tag(text, "rss") {
        recover_rss(text, root)
    } else if let Some((_, root)) = open_tag(text, "feed") {
        recover_atom(text, root)
    } else {
        None
    }
}

fn recover_rss(text: &str, root: &str) -> Option<FeedDocument> {
    let items = elements(text, "item");
    let header_end = items.first().map_or(text.len(), |(start, _)| *start);

    let header = format!("{}</channel></rss>", &text[..header_end]);
    let info = rss::Channel::read_from(header.as_bytes())
        .ok()
        .map(|channel| FeedDocument::Rss(channel).info());

    let posts: Vec<BlogPost> = items
        .iter()
        .filter_map(|(_, item)| {
            let wrapped = format!("{root}<channel>{item}</channel></rss>");
            match rss::Channel::read_from(wrapped.as_bytes()) {
                Ok(channel) => channel.items().first().map(rss_post),
                Err(e) => {
                    warn!("Skipping unreadable feed item: {}", e);
                    None
                }
            }
        })
        .collect();

    recovered(info, posts)
}

fn recover_atom(text: &str, root: &str) -> Option<FeedDocument> {
    let entries = elements(text, "entry");
    let header_end = entries.first().map_or(text.len(), |(start, _)| *start);

    let (header, raw_updated) = replace_bad_date(&text[..header_end], "updated");
    let info = atom_syndication::Feed::read_from(format!("{header}</feed>").as_bytes())
        .ok()
        .map(|feed| {
            let mut info = FeedDocument::Atom(feed).info();
            if let Some(raw) = raw_updated {
                info.updated = raw;
            }
            info
        });

    let posts: Vec<BlogPost> = entries
        .iter()
        .filter_map(|(_, entry)| {
            let (entry, raw_published) = replace_bad_date(entry, "published");
            let (entry, raw_updated) = replace_bad_date(&entry, "updated");
            let wrapped = format!("{root}{entry}</feed>");
            match atom_syndication::Feed::read_from(wrapped.as_bytes()) {
                Ok(feed) => feed.entries.first().map(|parsed| {
                    let mut post = atom_post(parsed);
                    let raw = if parsed.published.is_some() {
                        raw_published
                    } else {
                        raw_updated
                    };
                    if let Some(raw) = raw {
                        post.published_date = derive_published_date(&raw);
                        post.published = raw;
                    }
                    post
                }),
                Err(e) => {
                    warn!("Skipping unreadable feed entry: {}", e);
                    None
                }
            }
        })
        .collect();

    recovered(info, posts)
}

fn recovered(info: Option<FeedInfo>, posts: Vec<BlogPost>) -> Option<FeedDocument> {
    if info.is_none() && posts.is_empty() {
        return None;
    }
    let info = info.unwrap_or_else(|| FeedInfo {
        title: "Unknown".to_string(),
        description: String::new(),
        link: String::new(),
        language: String::new(),
        updated: String::new(),
    });
    Some(FeedDocument::Recovered { info, posts })
}

/// Swaps a non-RFC 3339 `<name>` date for a placeholder the Atom reader accepts.
/// Returns the rewritten chunk and the raw text that was replaced.
fn replace_bad_date(chunk: &str, name: &str) -> (String, Option<String>) {
    let Some((start, end)) = element_text(chunk, name) else {
        return (chunk.to_string(), None);
    };
    let raw = chunk[start..end].trim();
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return (chunk.to_string(), None);
    }
    let rewritten = format!("{}{}{}", &chunk[..start], PLACEHOLDER_DATE, &chunk[end..]);
    (rewritten, Some(raw.to_string()))
}

/// Byte offset and text of the first `<name ...>` start tag.
fn open_tag<'a>(text: &'a str, name: &str) -> Option<(usize, &'a str)> {
    let needle = format!("<{name}");
    let mut from = 0;
    while let Some(offset) = text[from..].find(&needle) {
        let start = from + offset;
        let after = start + needle.len();
        match text[after..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => {
                let end = after + text[after..].find('>')? + 1;
                return Some((start, &text[start..end]));
            }
            _ => from = after,
        }
    }
    None
}

/// Every complete `<name>...</name>` element, in document order. A trailing
/// element without its end tag (truncated document) is left out.
fn elements<'a>(text: &'a str, name: &str) -> Vec<(usize, &'a str)> {
    let close = format!("</{name}>");
    let mut found = Vec::new();
    let mut from = 0;
    while let Some((offset, _)) = open_tag(&text[from..], name) {
        let start = from + offset;
        let Some(length) = text[start..].find(&close) else {
            break;
        };
        let end = start + length + close.len();
        found.push((start, &text[start..end]));
        from = end;
    }
    found
}

/// Byte range of the text inside the first `<name>` element.
fn element_text(chunk: &str, name: &str) -> Option<(usize, usize)> {
    let (start, tag) = open_tag(chunk, name)?;
    if tag.ends_with("/>") {
        return None;
    }
    let inner = start + tag.len();
    let end = inner + chunk[inner..].find(&format!("</{name}>"))?;
    Some((inner, end))
}

#[derive(Clone)]
pub struct BlogClient {
    client: Client,
    default_url: Option<String>,
    cache: Cache,
}

impl BlogClient {
    pub fn new(settings: &BlogSettings, cache: Cache) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("activity-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            default_url: settings.rss_url.clone(),
            cache,
        })
    }

    pub fn default_url(&self) -> Option<&str> {
        self.default_url.as_deref()
    }

    fn resolve_url(&self, url: Option<&str>) -> Option<String> {
        url.filter(|url| !url.trim().is_empty())
            .or(self.default_url.as_deref())
            .map(str::to_string)
    }

    /// Downloads and parses the feed at `url`.
    pub async fn fetch_feed(&self, url: &str) -> FetchResult<FeedDocument> {
        let response = self.client.get(url).send().await.map_err(|e| {
            error!("Failed to fetch RSS feed {}: {}", url, e);
            FetchError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("RSS feed {} returned {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        FeedDocument::parse(&body).inspect_err(|e| {
            error!("Failed to parse RSS feed {}: {}", url, e);
        })
    }

    /// Up to `limit` posts, newest first as the feed orders them.
    ///
    /// The full fetched set is cached; a different `limit` reslices the cached
    /// set instead of fetching again. Without a URL this is an empty list.
    pub async fn get_posts(&self, url: Option<&str>, limit: usize) -> FetchResult<Vec<BlogPost>> {
        let Some(url) = self.resolve_url(url) else {
            warn!("No RSS URL configured");
            return Ok(Vec::new());
        };
        let key = CacheKey::BlogPosts(url.clone());

        if let Some(mut cached) = self.cache.get_key::<Vec<BlogPost>>(&key).await {
            if !cached.is_empty() {
                cached.truncate(limit);
                return Ok(cached);
            }
        }

        let mut posts = self.fetch_feed(&url).await?.posts();

        if !posts.is_empty() {
            self.cache.set_key(&key, &posts).await;
        }

        posts.truncate(limit);
        Ok(posts)
    }

    pub async fn get_feed_info(&self, url: Option<&str>) -> FetchResult<FeedInfo> {
        let url = self.resolve_url(url).ok_or(FetchError::NotConfigured)?;
        let key = CacheKey::BlogInfo(url.clone());

        if let Some(cached) = self.cache.get_key::<FeedInfo>(&key).await {
            return Ok(cached);
        }

        let info = self.fetch_feed(&url).await?.info();

        self.cache.set_key(&key, &info).await;
        Ok(info)
    }

    /// Post counts and latest posts for the feed; `NoPosts` when nothing is retrievable.
    pub async fn get_activity_stats(&self, url: Option<&str>) -> FetchResult<BlogStats> {
        let url = self.resolve_url(url).ok_or(FetchError::NotConfigured)?;
        let key = CacheKey::BlogStats(url.clone());

        if let Some(cached) = self.cache.get_key::<BlogStats>(&key).await {
            return Ok(cached);
        }

        let posts = self
            .get_posts(Some(&url), STATS_POST_LIMIT)
            .await
            .unwrap_or_default();
        if posts.is_empty() {
            return Err(FetchError::NoPosts);
        }

        let title = match self.get_feed_info(Some(&url)).await {
            Ok(info) => info.title,
            Err(_) => "Unknown".to_string(),
        };

        let stats = stats::blog_stats(&title, &posts, Utc::now());

        self.cache.set_key(&key, &stats).await;
        Ok(stats)
    }
}
