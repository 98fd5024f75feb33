use std::env;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub api_url: String,
    /// Base of the web client; navigation targets open under it.
    pub web_url: String,
    pub auth_token: Option<String>,
    /// Username of the signed-in viewer, as handed over by the auth provider.
    pub username: Option<String>,
    pub request_timeout: Duration,
    pub user_search: SearchSettings,
    pub content_search: SearchSettings,
    pub user_search_limit: usize,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub quiet_interval: Duration,
    pub min_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub stale_after: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".to_string(),
            web_url: "http://127.0.0.1:3000".to_string(),
            auth_token: None,
            username: None,
            request_timeout: Duration::from_secs(15),
            user_search: SearchSettings {
                quiet_interval: Duration::from_millis(300),
                min_chars: 2,
            },
            content_search: SearchSettings {
                quiet_interval: Duration::from_millis(500),
                min_chars: 2,
            },
            user_search_limit: 5,
            cache: CacheSettings::default(),
        }
    }
}

impl FrontendConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Missing or unparsable values
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("KATALOG_API_URL") {
            config.api_url = url;
        }
        if let Some(url) = lookup("KATALOG_WEB_URL") {
            config.web_url = url.trim_end_matches('/').to_string();
        }
        config.auth_token = lookup("KATALOG_AUTH_TOKEN").filter(|v| !v.trim().is_empty());
        config.username = lookup("KATALOG_USERNAME")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if let Some(secs) = parse(&lookup, "KATALOG_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse(&lookup, "KATALOG_USER_SEARCH_DEBOUNCE_MS") {
            config.user_search.quiet_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(&lookup, "KATALOG_CONTENT_SEARCH_DEBOUNCE_MS") {
            config.content_search.quiet_interval = Duration::from_millis(ms);
        }
        if let Some(min) = parse::<usize>(&lookup, "KATALOG_SEARCH_MIN_CHARS") {
            if min == 0 {
                warn!("KATALOG_SEARCH_MIN_CHARS=0 would send empty searches; using 1");
            }
            config.user_search.min_chars = min.max(1);
            config.content_search.min_chars = min.max(1);
        }
        if let Some(limit) = parse(&lookup, "KATALOG_USER_SEARCH_LIMIT") {
            config.user_search_limit = limit;
        }
        if let Some(secs) = parse(&lookup, "KATALOG_CACHE_STALE_SECS") {
            config.cache.stale_after = Duration::from_secs(secs);
        }
        if let Some(retries) = parse(&lookup, "KATALOG_CACHE_RETRIES") {
            config.cache.max_retries = retries;
        }
        config
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}
