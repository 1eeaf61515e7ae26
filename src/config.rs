use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8000,http://127.0.0.1:8000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("unknown cache backend {0:?} (expected \"redis\" or \"memory\")")]
    UnknownBackend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
}

impl RedisSettings {
    pub fn connection_url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(password),
                self.host,
                self.port,
                self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,
    pub redis: RedisSettings,
    pub default_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Redis,
            redis: RedisSettings::default(),
            default_ttl: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub token: Option<String>,
    pub username: Option<String>,
    pub api_url: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlogSettings {
    pub rss_url: Option<String>,
}

/// Application settings, read once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub github: GitHubSettings,
    pub blog: BlogSettings,
    pub cache: CacheSettings,
    pub cors_origins: Vec<String>,
    pub frontend_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
            github: GitHubSettings::default(),
            blog: BlogSettings::default(),
            cache: CacheSettings::default(),
            cors_origins: split_origins(DEFAULT_CORS_ORIGINS),
            frontend_dir: PathBuf::from("frontend"),
        }
    }
}

impl Settings {
    /// Loads `.env` (if any) and then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal in deployments.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let backend = match var("CACHE_BACKEND") {
            None => CacheBackendKind::Redis,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "redis" => CacheBackendKind::Redis,
                "memory" => CacheBackendKind::Memory,
                _ => return Err(ConfigError::UnknownBackend(value)),
            },
        };

        let ttl_secs = parse_var(
            "CACHE_TTL",
            var("CACHE_TTL"),
            defaults.cache.default_ttl.as_secs(),
        )?;
        // A zero default would write every entry already expired.
        if ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "CACHE_TTL",
                value: ttl_secs.to_string(),
            });
        }
        let default_ttl = Duration::from_secs(ttl_secs);

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", var("PORT"), defaults.port)?,
            debug: var("DEBUG").is_some_and(|value| value.eq_ignore_ascii_case("true")),
            github: GitHubSettings {
                token: var("GITHUB_TOKEN"),
                username: var("GITHUB_USERNAME"),
                api_url: var("GITHUB_API_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.github.api_url),
            },
            blog: BlogSettings {
                rss_url: var("BLOG_RSS_URL"),
            },
            cache: CacheSettings {
                backend,
                redis: RedisSettings {
                    host: var("REDIS_HOST").unwrap_or(defaults.cache.redis.host),
                    port: parse_var("REDIS_PORT", var("REDIS_PORT"), defaults.cache.redis.port)?,
                    db: parse_var("REDIS_DB", var("REDIS_DB"), defaults.cache.redis.db)?,
                    password: var("REDIS_PASSWORD"),
                },
                default_ttl,
            },
            cors_origins: var("CORS_ORIGINS")
                .map(|value| split_origins(&value))
                .unwrap_or(defaults.cors_origins),
            frontend_dir: var("FRONTEND_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.frontend_dir),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn github_configured(&self) -> bool {
        self.github.token.is_some() && self.github.username.is_some()
    }

    pub fn blog_configured(&self) -> bool {
        self.blog.rss_url.is_some()
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
