use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::constants::{DEFAULT_CHAN_API_URL, DEFAULT_REDDIT_API_URL, DEFAULT_REDDIT_AUTH_URL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// What to search for, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Free-text topic, used as the Reddit search query and the 4chan substring filter.
    pub topic: String,
    /// Subreddit searched on Reddit.
    pub subreddit: String,
    /// 4chan boards scanned, in output order.
    pub boards: Vec<String>,
    /// Maximum number of Reddit search results.
    pub result_limit: u32,
}

/// Reddit script-app credentials.
///
/// Fields stay optional so a missing value surfaces as an authentication failure of the
/// Reddit source rather than aborting the whole run.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RedditCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchConfig,

    // Reddit
    pub reddit: RedditCredentials,
    pub reddit_auth_url: String,
    pub reddit_api_url: String,

    // 4chan
    pub chan_api_url: String,

    // Output
    pub output_dir: PathBuf,

    // HTTP
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            search: SearchConfig {
                topic: env_or_default("TOPIC", "trump"),
                subreddit: env_or_default("REDDIT_SUBREDDIT", "politics"),
                boards: parse_list(&env_or_default("CHAN_BOARDS", "pol,news,int,b")),
                result_limit: parse_env_u32("RESULT_LIMIT", 100)?,
            },

            // Reddit
            reddit: RedditCredentials {
                client_id: optional_env("REDDIT_CLIENT_ID"),
                client_secret: optional_env("REDDIT_CLIENT_SECRET"),
                user_agent: optional_env("REDDIT_USER_AGENT"),
            },
            reddit_auth_url: env_or_default("REDDIT_AUTH_URL", DEFAULT_REDDIT_AUTH_URL),
            reddit_api_url: env_or_default("REDDIT_API_URL", DEFAULT_REDDIT_API_URL),

            // 4chan
            chan_api_url: env_or_default("CHAN_API_URL", DEFAULT_CHAN_API_URL),

            // Output
            output_dir: PathBuf::from(env_or_default("OUTPUT_DIR", "out")),

            // HTTP
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.topic.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "TOPIC".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.search.subreddit.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "REDDIT_SUBREDDIT".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.search.result_limit == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RESULT_LIMIT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        for (name, value) in [
            ("REDDIT_AUTH_URL", &self.reddit_auth_url),
            ("REDDIT_API_URL", &self.reddit_api_url),
            ("CHAN_API_URL", &self.chan_api_url),
        ] {
            validate_base_url(name, value)?;
        }
        Ok(())
    }

    /// Configuration with defaults and no credentials, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            search: SearchConfig {
                topic: "trump".to_string(),
                subreddit: "politics".to_string(),
                boards: vec!["pol".to_string()],
                result_limit: 10,
            },
            reddit: RedditCredentials::default(),
            reddit_auth_url: DEFAULT_REDDIT_AUTH_URL.to_string(),
            reddit_api_url: DEFAULT_REDDIT_API_URL.to_string(),
            chan_api_url: DEFAULT_CHAN_API_URL.to_string(),
            output_dir: PathBuf::from("out"),
            http_timeout: Duration::from_secs(10),
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

/// Split a comma-separated list, dropping blank entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn validate_base_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        message: format!("not a valid URL: {e}"),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("must be http or https, got '{}'", parsed.scheme()),
        });
    }
    Ok(())
}
