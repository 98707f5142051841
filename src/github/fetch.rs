// src/github/fetch.rs
// =============================================================================
// This module fetches a user's repository catalog.
//
// Strategy:
// - Serve from the catalog cache when an entry is fresh (memory, then disk)
// - Otherwise walk the collaborator chain in a fixed order: every configured
//   proxy first, then one direct call to the GitHub API
// - The first source answering 2xx with a parseable body wins
// - When every source fails, serve the previous cached catalog even if it
//   has expired; with nothing cached, return an empty list
//
// A failing source is never fatal and never retried; it only moves us to the
// next candidate. Callers always get a Vec, never an error.
// =============================================================================

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::client::HttpSource;
use super::model::Repository;
use crate::cache::TieredCache;
use crate::error::FetchError;

pub struct CatalogFetcher {
    source: Arc<dyn HttpSource>,
    cache: Arc<TieredCache<Vec<Repository>>>,
    user: String,
    /// Proxy URL templates, tried in order. `{user}` is substituted.
    proxies: Vec<String>,
    /// Direct GitHub API URL template, tried last.
    upstream: String,
}

impl CatalogFetcher {
    pub fn new(
        source: Arc<dyn HttpSource>,
        cache: Arc<TieredCache<Vec<Repository>>>,
        user: impl Into<String>,
        proxies: Vec<String>,
        upstream: impl Into<String>,
    ) -> Self {
        Self {
            source,
            cache,
            user: user.into(),
            proxies,
            upstream: upstream.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the catalog, sorted by updated_at descending.
    pub async fn fetch_catalog(&self, force_refresh: bool) -> Vec<Repository> {
        let key = self.user.as_str();

        // On a forced refresh both tiers are cleared before any source runs,
        // but the old copy is kept aside as the last-resort answer
        let fallback = if force_refresh {
            let previous = self.cache.get_stale(key);
            self.cache.invalidate(key);
            previous
        } else {
            if let Some(entry) = self.cache.get(key) {
                debug!(user = key, repos = entry.payload.len(), "catalog served from cache");
                return entry.payload;
            }
            None
        };

        for url in self.candidate_urls() {
            match self.try_source(&url).await {
                Ok(mut repos) => {
                    finalize_catalog(&mut repos);
                    info!(source = %url, repos = repos.len(), "catalog fetched");
                    self.cache.put(key, repos.clone());
                    return repos;
                }
                Err(e) => {
                    warn!(source = %url, error = %e, "catalog source failed, trying next");
                }
            }
        }

        match fallback.or_else(|| self.cache.get_stale(key)) {
            Some(entry) => {
                warn!(
                    user = key,
                    written_at = %entry.written_at,
                    "every catalog source failed, serving cached copy"
                );
                if force_refresh {
                    self.cache.restore(key, entry.clone());
                }
                entry.payload
            }
            None => {
                warn!(user = key, "every catalog source failed and nothing is cached");
                Vec::new()
            }
        }
    }

    /// When the catalog currently cached for this user was written, expired
    /// or not.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.cache.get_stale(&self.user).map(|entry| entry.written_at)
    }

    /// Forgets the cached catalog for this user. Activity entries are untouched.
    pub fn clear(&self) {
        self.cache.invalidate(&self.user);
    }

    fn candidate_urls(&self) -> Vec<String> {
        self.proxies
            .iter()
            .chain(std::iter::once(&self.upstream))
            .map(|template| template.replace("{user}", &self.user))
            .collect()
    }

    async fn try_source(&self, url: &str) -> Result<Vec<Repository>, FetchError> {
        let reply = self.source.get(url).await?;

        if !reply.is_success() {
            return Err(FetchError::Status(reply.status));
        }

        parse_catalog_body(&reply.body)
    }
}

/// Parses a catalog body. Accepts a bare array or an object wrapping one.
///
/// Records that fail normalization are dropped. A non-empty array in which
/// every record fails is treated as malformed.
pub fn parse_catalog_body(body: &str) -> Result<Vec<Repository>, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(obj) => ["repos", "repositories", "items", "data"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .ok_or_else(|| FetchError::Malformed("object without a repository array".to_string()))?,
        _ => {
            return Err(FetchError::Malformed(
                "expected an array of repositories".to_string(),
            ))
        }
    };

    let mut repos = Vec::with_capacity(items.len());
    for item in items {
        match Repository::from_value(item) {
            Ok(repo) => repos.push(repo),
            Err(e) => debug!(error = %e, "dropping repository record"),
        }
    }

    if repos.is_empty() && !items.is_empty() {
        return Err(FetchError::Malformed(
            "no valid repository records".to_string(),
        ));
    }

    Ok(repos)
}

// Newest first; repositories without a timestamp go last
fn finalize_catalog(repos: &mut [Repository]) {
    repos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    for (index, repo) in repos.iter_mut().enumerate() {
        repo.catalog_index = index;
    }
}

// Extracts the GitHub user name from what people type on the command line
//
// Supported formats:
//   - octo
//   - @octo
//   - https://github.com/octo
//   - github.com/octo/some-repo   (the owner is used)
pub fn parse_github_user(input: &str) -> Result<String> {
    let trimmed = input
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    let candidate = if let Some(path) = trimmed.strip_prefix("github.com/") {
        path.split('/').next().unwrap_or("")
    } else if trimmed.contains('/') || trimmed.contains('.') {
        return Err(anyhow!("Not a GitHub user or profile URL: {}", input));
    } else {
        trimmed
    };

    let user = candidate.trim_start_matches('@');

    let valid = !user.is_empty()
        && user.len() <= 39
        && user.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !user.starts_with('-');

    if !valid {
        return Err(anyhow!("Invalid GitHub user name: {}", input));
    }

    Ok(user.to_string())
}
