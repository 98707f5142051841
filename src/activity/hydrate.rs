// src/activity/hydrate.rs
// =============================================================================
// Enriches repositories with a 30-day commit count and a contributor count.
//
// How it works:
// 1. Use the per-repository activity cache when the entry is fresh
// 2. If the shared cooldown is active, report "unavailable" without calling
//    anything
// 3. Otherwise ask for commits since now-30d and for contributors, both with
//    per_page=1, concurrently, one attempt each
// 4. Read each count from the pagination Link header (see pagination.rs)
// 5. A 429 or 403 trips the shared cooldown for 5 minutes
// 6. Cache the snapshot even when only one metric came back
//
// A batch of repositories is hydrated concurrently with join_all: every
// repository gets its own future and the batch ends once all of them have
// settled. A failure in one never holds up the others.
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use super::cooldown::RateLimitCooldown;
use super::pagination::page_count_from_link;
use crate::cache::TieredCache;
use crate::clock::Clock;
use crate::github::{ActivitySnapshot, HttpReply, HttpSource, Repository};

/// How far back the commit count looks.
pub const COMMIT_WINDOW_DAYS: i64 = 30;

/// How long activity calls pause after a rate-limit response.
pub const RATE_LIMIT_COOLDOWN_MINUTES: i64 = 5;

pub struct Hydrator {
    source: Arc<dyn HttpSource>,
    cache: Arc<TieredCache<ActivitySnapshot>>,
    cooldown: Arc<RateLimitCooldown>,
    clock: Arc<dyn Clock>,
    /// e.g. https://api.github.com/repos
    api_base: String,
}

// Outcome of one metric request
#[derive(Debug, Default)]
struct Probe {
    count: Option<u64>,
    latest_commit_at: Option<DateTime<Utc>>,
    /// Not sent because the cooldown was active
    skipped: bool,
    rate_limited: bool,
}

impl Probe {
    fn failed() -> Self {
        Self::default()
    }

    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    fn rate_limited() -> Self {
        Self {
            rate_limited: true,
            ..Self::default()
        }
    }

    fn count(count: u64, latest_commit_at: Option<DateTime<Utc>>) -> Self {
        Self {
            count: Some(count),
            latest_commit_at,
            ..Self::default()
        }
    }

    fn blocked_by_rate_limit(&self) -> bool {
        self.skipped || self.rate_limited
    }
}

impl Hydrator {
    pub fn new(
        source: Arc<dyn HttpSource>,
        cache: Arc<TieredCache<ActivitySnapshot>>,
        cooldown: Arc<RateLimitCooldown>,
        clock: Arc<dyn Clock>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            source,
            cache,
            cooldown,
            clock,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn cooldown(&self) -> &RateLimitCooldown {
        &self.cooldown
    }

    /// Attaches activity to every repository in `repos` that has none yet.
    ///
    /// Returns how many repositories were hydrated.
    pub async fn hydrate(&self, repos: &mut [Repository]) -> usize {
        let pending: Vec<(usize, String)> = repos
            .iter()
            .enumerate()
            .filter(|(_, repo)| repo.activity.is_none())
            .map(|(index, repo)| (index, repo.full_name.clone()))
            .collect();

        if pending.is_empty() {
            return 0;
        }

        let tasks = pending.into_iter().map(|(index, full_name)| async move {
            let snapshot = self.snapshot_for(&full_name).await;
            (index, snapshot)
        });

        let results = join_all(tasks).await;
        let hydrated = results.len();

        for (index, snapshot) in results {
            repos[index].activity = Some(snapshot);
        }

        hydrated
    }

    /// Produces the activity snapshot for one repository.
    pub async fn snapshot_for(&self, full_name: &str) -> ActivitySnapshot {
        if let Some(entry) = self.cache.get(full_name) {
            return entry.payload;
        }

        let now = self.clock.now();
        if self.cooldown.is_active(now) {
            debug!(repo = full_name, "activity skipped, rate-limit cooldown active");
            return ActivitySnapshot::unavailable();
        }

        let since = (now - Duration::days(COMMIT_WINDOW_DAYS)).to_rfc3339_opts(SecondsFormat::Secs, true);
        let commits_url = format!(
            "{}/{}/commits?since={}&per_page=1",
            self.api_base, full_name, since
        );
        let contributors_url = format!(
            "{}/{}/contributors?per_page=1&anon=1",
            self.api_base, full_name
        );

        let (commits, contributors) =
            tokio::join!(self.probe(&commits_url), self.probe(&contributors_url));

        let snapshot = ActivitySnapshot::new(
            commits.count,
            contributors.count,
            commits.latest_commit_at,
        );

        // Nothing came back only because of the rate limit: do not pin that
        // for a whole TTL, the next cycle after the cooldown should retry
        if snapshot.unavailable
            && commits.blocked_by_rate_limit()
            && contributors.blocked_by_rate_limit()
        {
            return snapshot;
        }

        self.cache.put(full_name, snapshot.clone());
        snapshot
    }

    async fn probe(&self, url: &str) -> Probe {
        if self.cooldown.is_active(self.clock.now()) {
            return Probe::skipped();
        }

        let reply = match self.source.get(url).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!(url, error = %e, "activity request failed");
                return Probe::failed();
            }
        };

        match reply.status {
            403 | 429 => {
                self.cooldown.trip(
                    self.clock.now(),
                    Duration::minutes(RATE_LIMIT_COOLDOWN_MINUTES),
                );
                warn!(
                    url,
                    status = reply.status,
                    until = ?self.cooldown.until(),
                    "rate limited, pausing activity requests"
                );
                Probe::rate_limited()
            }
            // 204: no contributors yet. 409: the git repository is empty.
            204 | 409 => Probe::count(0, None),
            status if reply.is_success() => read_count(&reply).unwrap_or_else(|| {
                debug!(url, status, "activity response had no usable count");
                Probe::failed()
            }),
            status => {
                debug!(url, status, "activity request rejected");
                Probe::failed()
            }
        }
    }
}

// Count from the Link header, or from the body when there is a single page
fn read_count(reply: &HttpReply) -> Option<Probe> {
    let items = serde_json::from_str::<Value>(&reply.body)
        .ok()
        .and_then(|body| body.as_array().cloned());

    let latest_commit_at = items
        .as_ref()
        .and_then(|items| items.first())
        .and_then(commit_date);

    let count = reply
        .link
        .as_deref()
        .and_then(page_count_from_link)
        .or_else(|| items.as_ref().map(|items| items.len() as u64))?;

    Some(Probe::count(count, latest_commit_at))
}

fn commit_date(item: &Value) -> Option<DateTime<Utc>> {
    let commit = item.get("commit")?;
    let raw = commit
        .pointer("/committer/date")
        .or_else(|| commit.pointer("/author/date"))?
        .as_str()?;

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
