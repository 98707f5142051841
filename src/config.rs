// src/config.rs
// =============================================================================
// Runtime configuration.
//
// Every setting has a default and can be overridden from the environment
// (SHOWCASE_*). Command-line flags are applied on top of this in main.rs.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000/api/repos-catalog?username={user}";
pub const DEFAULT_UPSTREAM_URL: &str =
    "https://api.github.com/users/{user}/repos?per_page=100&sort=updated";
pub const DEFAULT_ACTIVITY_URL: &str = "https://api.github.com/repos";

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// GitHub user whose repositories are shown
    pub user: Option<String>,
    /// Where catalog and activity entries are persisted
    pub cache_dir: PathBuf,
    /// Catalog proxies, tried in order; `{user}` is substituted
    pub proxy_urls: Vec<String>,
    /// Direct catalog URL, tried after every proxy
    pub upstream_url: String,
    /// Base for the per-repository commits/contributors calls
    pub activity_url: String,
    pub catalog_ttl_secs: u64,
    pub activity_ttl_secs: u64,
    pub http_timeout_secs: u64,
    /// Full names pinned to the front of the showcase
    pub featured: Vec<String>,
    pub columns: usize,
    pub debounce_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("repo-showcase"),
            proxy_urls: vec![DEFAULT_PROXY_URL.to_string()],
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            activity_url: DEFAULT_ACTIVITY_URL.to_string(),
            catalog_ttl_secs: 600,
            activity_ttl_secs: 900,
            http_timeout_secs: 10,
            featured: Vec::new(),
            columns: 3,
            debounce_ms: 150,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source. Unparseable numbers keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(user) = var("SHOWCASE_USER") {
            config.user = Some(user);
        }
        if let Some(dir) = var("SHOWCASE_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(urls) = var("SHOWCASE_PROXY_URLS") {
            config.proxy_urls = split_list(&urls);
        }
        if let Some(url) = var("SHOWCASE_UPSTREAM_URL") {
            config.upstream_url = url;
        }
        if let Some(url) = var("SHOWCASE_ACTIVITY_URL") {
            config.activity_url = url;
        }
        if let Some(secs) = var("SHOWCASE_CATALOG_TTL_SECS").and_then(|v| v.parse().ok()) {
            config.catalog_ttl_secs = secs;
        }
        if let Some(secs) = var("SHOWCASE_ACTIVITY_TTL_SECS").and_then(|v| v.parse().ok()) {
            config.activity_ttl_secs = secs;
        }
        if let Some(secs) = var("SHOWCASE_HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.http_timeout_secs = secs;
        }
        if let Some(featured) = var("SHOWCASE_FEATURED") {
            config.featured = split_list(&featured);
        }
        if let Some(columns) = var("SHOWCASE_COLUMNS").and_then(|v| v.parse().ok()) {
            config.columns = columns;
        }
        if let Some(ms) = var("SHOWCASE_DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
            config.debounce_ms = ms;
        }
        if let Some(level) = var("SHOWCASE_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    pub fn activity_ttl(&self) -> Duration {
        Duration::from_secs(self.activity_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// "a, b,,c" -> ["a", "b", "c"]
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
