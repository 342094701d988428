//! Runtime settings read from the INI config, with validation.

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::error::StockdashError;
use crate::domain::table::PageSize;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_BASE_URL: &str = "https://stock-backend-07c7.onrender.com";
pub const DEFAULT_FETCH_LIMIT: u32 = 1500;
pub const MAX_FETCH_LIMIT: i64 = 10_000;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub timeout: Duration,
    pub fetch_limit: u32,
    pub page_size: PageSize,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub cache_max_entries: u64,
    pub listen: SocketAddr,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            page_size: PageSize::Fifty,
            cache_enabled: true,
            cache_ttl: Duration::from_secs(300),
            cache_max_entries: 256,
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockdashError> {
        let base_url = config
            .get_string("api", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = validate_base_url(&base_url)?;

        let timeout_secs = config.get_int("api", "timeout_secs", 30);
        if timeout_secs <= 0 {
            return Err(invalid("api", "timeout_secs", "timeout_secs must be positive"));
        }

        let fetch_limit = config.get_int("dashboard", "fetch_limit", DEFAULT_FETCH_LIMIT as i64);
        if !(1..=MAX_FETCH_LIMIT).contains(&fetch_limit) {
            return Err(invalid(
                "dashboard",
                "fetch_limit",
                &format!("fetch_limit must be between 1 and {MAX_FETCH_LIMIT}"),
            ));
        }

        let page_size = config.get_int("dashboard", "page_size", 50);
        let page_size = usize::try_from(page_size)
            .ok()
            .and_then(PageSize::from_count)
            .ok_or_else(|| invalid("dashboard", "page_size", "page_size must be 25, 50 or 100"))?;

        let cache_enabled = config.get_bool("cache", "enabled", true);
        let ttl_secs = config.get_int("cache", "ttl_secs", 300);
        if ttl_secs <= 0 {
            return Err(invalid("cache", "ttl_secs", "ttl_secs must be positive"));
        }

        let max_entries = config.get_int("cache", "max_entries", 256);
        if max_entries <= 0 {
            return Err(invalid("cache", "max_entries", "max_entries must be positive"));
        }

        let listen = config
            .get_string("web", "listen")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen: SocketAddr = listen
            .trim()
            .parse()
            .map_err(|_| invalid("web", "listen", &format!("'{listen}' is not a socket address")))?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs as u64),
            fetch_limit: fetch_limit as u32,
            page_size,
            cache_enabled,
            cache_ttl: Duration::from_secs(ttl_secs as u64),
            cache_max_entries: max_entries as u64,
            listen,
        })
    }

    /// Replace the backend URL, e.g. from `--base-url`.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, StockdashError> {
        self.base_url = validate_base_url(base_url)?;
        Ok(self)
    }
}

/// Trims whitespace and any trailing slash.
fn validate_base_url(url: &str) -> Result<String, StockdashError> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(invalid("api", "base_url", "base_url must start with http:// or https://"));
    }
    Ok(url.to_string())
}

fn invalid(section: &str, key: &str, reason: &str) -> StockdashError {
    StockdashError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
