// src/render/coordinator.rs
// =============================================================================
// The render coordinator ties fetching, ranking and hydration together.
//
// One render cycle:
// 1. Compute the visible slice (eligible + matching + sorted, then cut to
//    columns x rows)
// 2. Mint a render token
// 3. Paint right away with whatever activity is already known
// 4. Hydrate the slice members that have no activity yet
// 5. When hydration settles and the token is still current, merge the
//    activity into the shared catalog, re-score, re-sort and repaint.
//    If a newer cycle started meanwhile, the result is dropped.
//
// Search input, sort changes and resizes all go through one debouncer, so a
// burst of keystrokes ends in a single cycle.
//
// Locking:
// - paint_lock is held around "mint + first paint" and around
//   "token check + merge + repaint", never across an await. That way a stale
//   cycle can never paint between a newer cycle's check and its paint.
// - catalog and input locks are only taken inside paint_lock or on their own.
//
// Every cycle asks the fetcher for the catalog again. Within the TTL that is
// a memory hit; the held copy is only swapped when the cache entry behind it
// was rewritten. A swapped-in catalog starts without activity, the activity
// cache decides whether hydration needs the network.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use super::debounce::Debouncer;
use super::frame::{Frame, Painter, Phase};
use super::token::{RenderToken, RenderTokens};
use crate::activity::Hydrator;
use crate::clock::Clock;
use crate::github::{ActivitySnapshot, CatalogFetcher, Repository};
use crate::rank::{self, SortKey};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub columns: usize,
    pub rows: usize,
    /// Full names pinned to the front, in this order
    pub featured: Vec<String>,
    pub debounce: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            columns: 3,
            rows: 2,
            featured: Vec::new(),
            debounce: Duration::from_millis(150),
        }
    }
}

/// How a render cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Nothing matched; an Empty frame was painted
    Empty(RenderToken),
    /// Painted once, every card already had activity
    Painted(RenderToken),
    /// Painted, hydrated and painted again
    Repainted(RenderToken),
    /// Painted, but a newer cycle started before hydration settled
    Superseded(RenderToken),
}

impl RenderOutcome {
    pub fn token(self) -> RenderToken {
        match self {
            RenderOutcome::Empty(t)
            | RenderOutcome::Painted(t)
            | RenderOutcome::Repainted(t)
            | RenderOutcome::Superseded(t) => t,
        }
    }
}

#[derive(Debug, Clone)]
struct ViewInput {
    query: String,
    sort: SortKey,
    columns: usize,
}

// The catalog as held between cycles, tagged with its cache write time
struct LoadedCatalog {
    repos: Vec<Repository>,
    written_at: Option<DateTime<Utc>>,
}

pub struct RenderCoordinator {
    fetcher: Arc<CatalogFetcher>,
    hydrator: Arc<Hydrator>,
    painter: Arc<dyn Painter>,
    clock: Arc<dyn Clock>,
    featured: Vec<String>,
    rows: usize,
    /// None until the first fetch completes
    catalog: RwLock<Option<LoadedCatalog>>,
    input: Mutex<ViewInput>,
    tokens: RenderTokens,
    debouncer: Debouncer,
    paint_lock: Mutex<()>,
}

impl RenderCoordinator {
    pub fn new(
        fetcher: Arc<CatalogFetcher>,
        hydrator: Arc<Hydrator>,
        painter: Arc<dyn Painter>,
        clock: Arc<dyn Clock>,
        options: RenderOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            fetcher,
            hydrator,
            painter,
            clock,
            featured: options.featured,
            rows: options.rows.max(1),
            catalog: RwLock::new(None),
            input: Mutex::new(ViewInput {
                query: String::new(),
                sort: SortKey::default(),
                columns: options.columns.max(1),
            }),
            tokens: RenderTokens::new(),
            debouncer: Debouncer::new(options.debounce),
            paint_lock: Mutex::new(()),
        })
    }

    /// Renders the current input. Safe to call repeatedly; while the catalog
    /// and activity entries are fresh, a call costs no network requests.
    pub async fn render_projects(&self) -> RenderOutcome {
        self.sync_catalog().await;
        self.run_cycle().await
    }

    /// Sets query and sort key, then renders immediately.
    pub async fn render(&self, query: &str, sort: SortKey) -> RenderOutcome {
        {
            let mut input = self.input.lock();
            input.query = query.to_string();
            input.sort = sort;
        }
        self.render_projects().await
    }

    /// Refetches the catalog past its cache, then renders.
    ///
    /// Activity already cached is reused.
    pub async fn refresh(&self) -> RenderOutcome {
        let repos = self.fetcher.fetch_catalog(true).await;
        info!(repos = repos.len(), "catalog refreshed");
        *self.catalog.write() = Some(LoadedCatalog {
            repos,
            written_at: self.fetcher.cached_at(),
        });
        self.run_cycle().await
    }

    pub fn on_search_input(self: &Arc<Self>, query: impl Into<String>) {
        self.input.lock().query = query.into();
        self.schedule_render();
    }

    pub fn on_sort_change(self: &Arc<Self>, sort: SortKey) {
        self.input.lock().sort = sort;
        self.schedule_render();
    }

    pub fn on_resize(self: &Arc<Self>, columns: usize) {
        self.input.lock().columns = columns.max(1);
        self.schedule_render();
    }

    /// Drops a debounced render that has not started yet.
    pub fn cancel_pending(&self) {
        self.debouncer.cancel();
    }

    #[cfg(test)]
    pub fn current_token(&self) -> RenderToken {
        self.tokens.current()
    }

    pub fn window(&self) -> usize {
        self.input.lock().columns * self.rows
    }

    fn schedule_render(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.debouncer.schedule(async move {
            let outcome = this.render_projects().await;
            debug!(?outcome, "debounced render finished");
        });
    }

    // Loads the catalog on a cold start and picks up a refetched one later
    async fn sync_catalog(&self) {
        if self.catalog.read().is_none() {
            self.painter.paint(&Frame::Loading);
        }

        let repos = self.fetcher.fetch_catalog(false).await;
        let written_at = self.fetcher.cached_at();

        let mut catalog = self.catalog.write();
        if let Some(current) = catalog.as_ref() {
            if current.written_at == written_at {
                return;
            }
            // Nothing cached and every source down: keep what is on screen
            if repos.is_empty() && !current.repos.is_empty() {
                debug!("catalog fetch came back empty, keeping the loaded copy");
                return;
            }
            debug!(repos = repos.len(), "catalog entry changed, swapping it in");
        }

        *catalog = Some(LoadedCatalog { repos, written_at });
    }

    async fn run_cycle(&self) -> RenderOutcome {
        let (token, sort, mut visible) = {
            let _paint = self.paint_lock.lock();
            let now = self.clock.now();
            let input = self.input.lock().clone();

            let mut visible = {
                let catalog = self.catalog.read();
                let repos = catalog.as_ref().map(|c| c.repos.as_slice()).unwrap_or(&[]);
                rank::showcase_view(repos, &input.query, input.sort, &self.featured, now)
            };
            visible.truncate(input.columns * self.rows);

            let token = self.tokens.mint();
            if visible.is_empty() {
                self.painter.paint(&Frame::Empty { query: input.query });
                return RenderOutcome::Empty(token);
            }

            self.painter
                .paint(&Frame::cards(token, Phase::Initial, &visible, now));
            (token, input.sort, visible)
        };

        if visible.iter().all(|repo| repo.activity.is_some()) {
            return RenderOutcome::Painted(token);
        }

        let hydrated = self.hydrator.hydrate(&mut visible).await;

        let _paint = self.paint_lock.lock();
        if !self.tokens.is_current(token) {
            debug!(%token, current = %self.tokens.current(), "discarding superseded render");
            return RenderOutcome::Superseded(token);
        }

        self.merge_activity(&visible);

        let now = self.clock.now();
        rank::rescore(&mut visible, sort, &self.featured, now);
        self.painter
            .paint(&Frame::cards(token, Phase::Hydrated, &visible, now));
        debug!(%token, hydrated, "render repainted with activity");

        RenderOutcome::Repainted(token)
    }

    // Copies activity from the slice into the shared catalog
    fn merge_activity(&self, visible: &[Repository]) {
        let snapshots: HashMap<&str, &ActivitySnapshot> = visible
            .iter()
            .filter_map(|repo| Some((repo.full_name.as_str(), repo.activity.as_ref()?)))
            .collect();

        let mut catalog = self.catalog.write();
        let Some(repos) = catalog.as_mut().map(|c| &mut c.repos) else {
            return;
        };

        for repo in repos.iter_mut() {
            if let Some(snapshot) = snapshots.get(repo.full_name.as_str()) {
                repo.activity = Some((*snapshot).clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::RateLimitCooldown;
    use crate::cache::{MemoryStore, TieredCache, ACTIVITY_SCHEMA_VERSION, CATALOG_SCHEMA_VERSION};
    use crate::render::frame::FrameLog;
    use crate::testing::{repo_json, reply, FakeSource, ManualClock};
    use serde_json::Value;

    const PROXY: &str = "http://proxy/repos-catalog?username={user}";
    const UPSTREAM: &str = "https://api.github.com/users/{user}/repos";
    const ACTIVITY_BASE: &str = "https://api.github.com/repos";

    struct Setup {
        source: Arc<FakeSource>,
        log: Arc<FrameLog>,
        clock: Arc<ManualClock>,
        coordinator: Arc<RenderCoordinator>,
    }

    fn setup_with(names: &[&str], options: RenderOptions) -> Setup {
        let source = FakeSource::new();
        let repos: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| repo_json(name, 10 + i as u64, "2025-05-30T00:00:00Z"))
            .collect();
        source.on("proxy/", reply(200, &Value::Array(repos).to_string()));
        build(source, options)
    }

    fn build(source: Arc<FakeSource>, options: RenderOptions) -> Setup {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::start();

        let fetcher = Arc::new(CatalogFetcher::new(
            source.clone(),
            Arc::new(TieredCache::new(
                "catalog",
                CATALOG_SCHEMA_VERSION,
                Duration::from_secs(600),
                store.clone(),
                clock.clone(),
            )),
            "octo",
            vec![PROXY.to_string()],
            UPSTREAM,
        ));
        let hydrator = Arc::new(Hydrator::new(
            source.clone(),
            Arc::new(TieredCache::new(
                "activity",
                ACTIVITY_SCHEMA_VERSION,
                Duration::from_secs(900),
                store,
                clock.clone(),
            )),
            Arc::new(RateLimitCooldown::new()),
            clock.clone(),
            ACTIVITY_BASE,
        ));

        let log = Arc::new(FrameLog::new());
        let coordinator =
            RenderCoordinator::new(fetcher, hydrator, log.clone(), clock.clone(), options);
        Setup {
            source,
            log,
            clock,
            coordinator,
        }
    }

    fn setup(names: &[&str]) -> Setup {
        setup_with(names, RenderOptions::default())
    }

    fn phases(frames: &[Frame]) -> Vec<&'static str> {
        frames
            .iter()
            .map(|frame| match frame {
                Frame::Loading => "loading",
                Frame::Empty { .. } => "empty",
                Frame::Cards { phase: Phase::Initial, .. } => "initial",
                Frame::Cards { phase: Phase::Hydrated, .. } => "hydrated",
            })
            .collect()
    }

    fn card_names(frame: &Frame) -> Vec<String> {
        match frame {
            Frame::Cards { cards, .. } => cards.iter().map(|c| c.name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_cold_start_paints_loading_then_cards_twice() {
        let s = setup(&["alpha", "beta"]);
        s.source.on("/repos/octo/", reply(200, "[]"));

        let outcome = s.coordinator.render_projects().await;

        assert!(matches!(outcome, RenderOutcome::Repainted(_)));
        assert_eq!(phases(&s.log.frames()), vec!["loading", "initial", "hydrated"]);

        match s.log.last().unwrap() {
            Frame::Cards { cards, token, .. } => {
                assert_eq!(token, outcome.token());
                assert!(cards.iter().all(|c| c.commits_30d == Some(0)));
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_render_reuses_merged_activity() {
        let s = setup(&["alpha", "beta"]);
        s.source.on("/repos/octo/", reply(200, "[]"));
        s.coordinator.render_projects().await;

        let calls = s.source.calls().len();
        let outcome = s.coordinator.render_projects().await;

        assert!(matches!(outcome, RenderOutcome::Painted(_)));
        assert_eq!(s.source.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_expired_catalog_is_fetched_again() {
        let s = setup(&["alpha", "beta"]);
        s.source.on("/repos/octo/", reply(200, "[]"));
        s.coordinator.render_projects().await;
        assert_eq!(s.source.calls_matching("proxy/"), 1);

        // Within the TTL the cached copy is enough
        s.clock.advance(chrono::Duration::minutes(5));
        s.coordinator.render_projects().await;
        assert_eq!(s.source.calls_matching("proxy/"), 1);

        s.clock.advance(chrono::Duration::hours(2));
        let outcome = s.coordinator.render_projects().await;

        assert_eq!(s.source.calls_matching("proxy/"), 2);
        // The swapped-in catalog is hydrated again, its activity had expired too
        assert!(matches!(outcome, RenderOutcome::Repainted(_)));
        assert_eq!(
            phases(&s.log.frames()),
            vec!["loading", "initial", "hydrated", "initial", "initial", "hydrated"]
        );
        assert_eq!(
            s.coordinator.catalog.read().as_ref().unwrap().written_at,
            Some(s.clock.now())
        );
    }

    #[tokio::test]
    async fn test_no_match_paints_empty_not_loading() {
        let s = setup(&["alpha", "beta"]);

        let outcome = s.coordinator.render("kubernetes", SortKey::Popular).await;

        assert!(matches!(outcome, RenderOutcome::Empty(_)));
        assert_eq!(
            s.log.last(),
            Some(Frame::Empty { query: "kubernetes".to_string() })
        );
        assert_eq!(s.source.calls_matching("/repos/octo/"), 0);
    }

    #[tokio::test]
    async fn test_total_failure_ends_in_empty_frame() {
        // No routes at all: every catalog source answers 404
        let s = build(FakeSource::new(), RenderOptions::default());

        let outcome = s.coordinator.render_projects().await;

        assert!(matches!(outcome, RenderOutcome::Empty(_)));
        assert_eq!(phases(&s.log.frames()), vec!["loading", "empty"]);
        assert_eq!(s.source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_visible_slice_is_bounded_by_window() {
        let names = ["a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8"];
        let s = setup_with(
            &names,
            RenderOptions {
                columns: 2,
                ..RenderOptions::default()
            },
        );
        s.source.on("/repos/octo/", reply(200, "[]"));

        s.coordinator.render_projects().await;

        assert_eq!(s.coordinator.window(), 4);
        assert_eq!(card_names(&s.log.last().unwrap()).len(), 4);
        assert_eq!(s.source.calls_matching("/commits?"), 4);
        assert_eq!(s.source.calls_matching("/contributors?"), 4);
    }

    #[tokio::test]
    async fn test_superseded_cycle_never_paints_or_merges() {
        let s = setup(&["alpha", "beta"]);
        let gate = s.source.hold("/repos/octo/alpha/");
        s.source.on("/repos/octo/", reply(200, "[]"));
        s.coordinator.sync_catalog().await;

        let first = tokio::spawn({
            let coordinator = s.coordinator.clone();
            async move { coordinator.render("alpha", SortKey::Popular).await }
        });

        // Wait until the first cycle painted and is stuck hydrating
        for _ in 0..500 {
            if s.log.frames().iter().any(|f| card_names(f) == vec!["alpha"]) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let second = s.coordinator.render("beta", SortKey::Popular).await;
        assert!(matches!(second, RenderOutcome::Repainted(_)));

        gate.add_permits(2);
        let first = first.await.unwrap();

        assert!(matches!(first, RenderOutcome::Superseded(_)));
        assert!(first.token() < second.token());
        assert_eq!(s.coordinator.current_token(), second.token());

        let last = s.log.last().unwrap();
        assert!(matches!(last, Frame::Cards { token, .. } if token == second.token()));
        assert_eq!(card_names(&last), vec!["beta"]);

        let catalog = s.coordinator.catalog.read();
        let repos = &catalog.as_ref().unwrap().repos;
        let alpha = repos.iter().find(|r| r.name == "alpha").unwrap();
        let beta = repos.iter().find(|r| r.name == "beta").unwrap();
        assert!(alpha.activity.is_none());
        assert!(beta.activity.is_some());
    }

    #[tokio::test]
    async fn test_burst_of_input_renders_once() {
        let s = setup_with(
            &["alpha", "beta"],
            RenderOptions {
                debounce: Duration::from_millis(20),
                ..RenderOptions::default()
            },
        );
        s.source.on("/repos/octo/", reply(200, "[]"));

        for query in ["a", "al", "alp", "alph", "alpha"] {
            s.coordinator.on_search_input(query);
        }
        tokio::time::sleep(Duration::from_millis(300)).await;

        let frames = s.log.frames();
        assert_eq!(phases(&frames), vec!["loading", "initial", "hydrated"]);
        assert_eq!(card_names(&frames[2]), vec!["alpha"]);
    }

    #[tokio::test]
    async fn test_resize_and_sort_change_are_debounced_too() {
        let s = setup_with(
            &["alpha", "beta", "gamma"],
            RenderOptions {
                debounce: Duration::from_millis(20),
                ..RenderOptions::default()
            },
        );
        s.source.on("/repos/octo/", reply(200, "[]"));

        s.coordinator.on_sort_change(SortKey::Name);
        s.coordinator.on_resize(1);
        tokio::time::sleep(Duration::from_millis(300)).await;

        // One column, two rows, alphabetical
        assert_eq!(card_names(&s.log.last().unwrap()), vec!["alpha", "beta"]);
        assert_eq!(phases(&s.log.frames()).len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_refetches_catalog_but_keeps_activity() {
        let s = setup(&["alpha"]);
        s.source.on("/repos/octo/", reply(200, "[]"));
        s.coordinator.render_projects().await;
        let activity_calls = s.source.calls_matching("/repos/octo/");

        let outcome = s.coordinator.refresh().await;

        assert!(matches!(outcome, RenderOutcome::Repainted(_)));
        assert_eq!(s.source.calls_matching("proxy/"), 2);
        assert_eq!(s.source.calls_matching("/repos/octo/"), activity_calls);
    }
}
