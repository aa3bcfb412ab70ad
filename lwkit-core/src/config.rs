//! Client configuration loaded from the process environment.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Lower bound for any configured TTL, in seconds.
pub const MIN_TTL_SECS: u64 = 30;
/// Upper bound for any configured TTL, in seconds.
pub const MAX_TTL_SECS: u64 = 86_400;

pub const DEFAULT_COLLECTIONS_TTL_SECS: u64 = 600;
pub const DEFAULT_TAGS_TTL_SECS: u64 = 600;
pub const DEFAULT_SEARCH_TTL_SECS: u64 = 120;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

const CACHE_DIR_NAME: &str = "linkwarden_cache";

/// Logical categories with an independently configurable TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TtlCategory {
    Collections,
    Tags,
    Search,
}

impl TtlCategory {
    pub const ALL: [TtlCategory; 3] = [Self::Collections, Self::Tags, Self::Search];

    /// Environment variable overriding this category's TTL.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Collections => "LW_CACHE_COLLECTIONS_TTL",
            Self::Tags => "LW_CACHE_TAGS_TTL",
            Self::Search => "LW_CACHE_SEARCH_TTL",
        }
    }

    pub fn default_secs(&self) -> u64 {
        match self {
            Self::Collections => DEFAULT_COLLECTIONS_TTL_SECS,
            Self::Tags => DEFAULT_TAGS_TTL_SECS,
            Self::Search => DEFAULT_SEARCH_TTL_SECS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collections => "collections",
            Self::Tags => "tags",
            Self::Search => "search",
        }
    }
}

/// Per-category TTLs, already clamped to [`MIN_TTL_SECS`, `MAX_TTL_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTtls {
    pub collections_secs: u64,
    pub tags_secs: u64,
    /// Reported only; search results are never cached.
    pub search_secs: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            collections_secs: DEFAULT_COLLECTIONS_TTL_SECS,
            tags_secs: DEFAULT_TAGS_TTL_SECS,
            search_secs: DEFAULT_SEARCH_TTL_SECS,
        }
    }
}

impl CacheTtls {
    pub fn get(&self, category: TtlCategory) -> u64 {
        match category {
            TtlCategory::Collections => self.collections_secs,
            TtlCategory::Tags => self.tags_secs,
            TtlCategory::Search => self.search_secs,
        }
    }

    /// Load every category from `lookup`, falling back to defaults and
    /// clamping out-of-range values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let load = |category: TtlCategory| resolve_ttl(category, lookup(category.env_var()));
        Self {
            collections_secs: load(TtlCategory::Collections),
            tags_secs: load(TtlCategory::Tags),
            search_secs: load(TtlCategory::Search),
        }
    }

    /// `(category, seconds, minutes)` triples for display.
    pub fn summary(&self) -> Vec<(TtlCategory, u64, u64)> {
        TtlCategory::ALL
            .iter()
            .map(|&category| {
                let secs = self.get(category);
                (category, secs, secs / 60)
            })
            .collect()
    }
}

/// Clamp a TTL into the accepted range.
pub fn clamp_ttl(secs: u64) -> u64 {
    secs.clamp(MIN_TTL_SECS, MAX_TTL_SECS)
}

fn resolve_ttl(category: TtlCategory, raw: Option<String>) -> u64 {
    let default = category.default_secs();
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) => {
            let clamped = clamp_ttl(secs);
            if clamped != secs {
                warn!(
                    var = category.env_var(),
                    requested = secs,
                    applied = clamped,
                    "TTL out of range, clamped"
                );
            }
            clamped
        }
        Err(_) => {
            warn!(
                var = category.env_var(),
                value = %raw,
                default,
                "TTL is not a number, using default"
            );
            default
        }
    }
}

/// Everything a process needs to talk to the bookmark service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without trailing slash.
    pub api_url: String,
    pub api_token: String,
    pub cache_ttls: CacheTtls,
    pub cache_dir: PathBuf,
    pub request_timeout: Duration,
    pub search_limit: usize,
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the endpoint.
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            cache_ttls: CacheTtls::default(),
            cache_dir: default_cache_dir(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Create ClientConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `LW_API_URL`: service base URL (required)
    /// - `LW_API_TOKEN`: bearer token (required)
    /// - `LW_CACHE_COLLECTIONS_TTL`, `LW_CACHE_TAGS_TTL`, `LW_CACHE_SEARCH_TTL`: seconds
    /// - `LW_CACHE_DIR`: cache directory (default: `$TMPDIR/linkwarden_cache`)
    /// - `LW_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
    /// - `LW_SEARCH_LIMIT`: default result limit (default: 20)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reads through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("LW_API_URL");
        let api_token = non_empty("LW_API_TOKEN");
        let (api_url, api_token) = match (api_url, api_token) {
            (Some(url), Some(token)) => (url, token),
            (url, token) => {
                let missing: Vec<&str> = [
                    url.is_none().then_some("LW_API_URL"),
                    token.is_none().then_some("LW_API_TOKEN"),
                ]
                .into_iter()
                .flatten()
                .collect();
                return Err(ConfigError::MissingRequired {
                    field: missing.join(", "),
                });
            }
        };

        let request_timeout = match non_empty("LW_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_field("LW_REQUEST_TIMEOUT_SECS", &raw)?),
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let search_limit = match non_empty("LW_SEARCH_LIMIT") {
            Some(raw) => parse_field("LW_SEARCH_LIMIT", &raw)?,
            None => DEFAULT_SEARCH_LIMIT,
        };

        let config = Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            api_token: api_token.trim().to_string(),
            cache_ttls: CacheTtls::from_lookup(&lookup),
            cache_dir: cache_dir_from_lookup(&lookup),
            request_timeout,
            search_limit,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "LW_API_URL".to_string(),
            });
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "LW_API_URL".to_string(),
                value: self.api_url.clone(),
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.api_token.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "LW_API_TOKEN".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "LW_REQUEST_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.search_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "LW_SEARCH_LIMIT".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
        reason: "expected a positive integer".to_string(),
    })
}

/// `$TMPDIR/linkwarden_cache`.
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join(CACHE_DIR_NAME)
}

/// `LW_CACHE_DIR` if set, else [`default_cache_dir`]. Needs no credentials,
/// so maintenance commands can run without a configured endpoint.
pub fn cache_dir_from_lookup<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("LW_CACHE_DIR")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_cache_dir)
}
