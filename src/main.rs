// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load configuration from the environment and apply the flags on top
// 3. Set up logging (stderr, so JSON on stdout stays clean)
// 4. Wire the engine together: HTTP source, caches, fetcher, hydrator
// 5. Dispatch to the appropriate subcommand handler
// 6. Exit with proper code (0 = success, 2 = error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod activity; // src/activity/ - commit/contributor counts and rate limiting
mod cache; // src/cache/ - memory + durable cache tiers
mod cli; // src/cli.rs - command-line parsing
mod clock; // src/clock.rs - injectable "now"
mod config; // src/config.rs - SHOWCASE_* settings
mod error; // src/error.rs - typed engine errors
mod github; // src/github/ - catalog fetching and the repository model
mod rank; // src/rank/ - eligibility, scoring and ordering
mod render; // src/render/ - render cycles and frames
mod search; // src/search/ - fuzzy matching
mod stats; // src/stats.rs - catalog statistics

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use activity::{Hydrator, RateLimitCooldown};
use cache::{
    DurableStore, FileStore, MemoryStore, TieredCache, ACTIVITY_SCHEMA_VERSION,
    CATALOG_SCHEMA_VERSION,
};
use cli::{Cli, Commands, UserArgs};
use clock::{Clock, SystemClock};
use config::Config;
use github::{parse_github_user, CatalogFetcher, HttpSource, ReqwestSource};
use rank::SortKey;
use render::{
    compact_number, print_frame, FrameLog, RenderCoordinator, RenderOptions, TerminalPainter,
};
use stats::CatalogStats;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// This is the main application logic
// Returns:
//   Ok(0) = success
//   Err   = unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    init_logging(&config.log_level);

    match cli.command {
        Commands::List { user, query, sort, columns, refresh, json } => {
            apply_columns(&mut config, columns);
            handle_list(&config, user, &query, sort, refresh, json).await
        }
        Commands::Watch { user, sort, columns } => {
            apply_columns(&mut config, columns);
            handle_watch(&config, user, sort).await
        }
        Commands::Stats { user, refresh, json } => handle_stats(&config, user, refresh, json).await,
        Commands::ClearCache { user } => handle_clear_cache(&config, user),
    }
}

// RUST_LOG wins over --log-level / SHOWCASE_LOG_LEVEL
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_columns(config: &mut Config, columns: Option<usize>) {
    if let Some(columns) = columns {
        config.columns = columns;
    }
}

// Everything a command needs to load and hydrate a user's catalog
struct Engine {
    fetcher: Arc<CatalogFetcher>,
    hydrator: Arc<Hydrator>,
    clock: Arc<dyn Clock>,
}

fn build_engine(config: &Config, user: &str) -> Result<Engine> {
    let source: Arc<dyn HttpSource> = Arc::new(
        ReqwestSource::new(config.http_timeout()).context("Failed to build HTTP client")?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Without a usable cache directory we still run, just without persistence
    let store: Arc<dyn DurableStore> = match FileStore::open(config.cache_dir.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(dir = %config.cache_dir.display(), error = %e, "cache directory unavailable, caching in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let catalog_cache = Arc::new(TieredCache::new(
        "catalog",
        CATALOG_SCHEMA_VERSION,
        config.catalog_ttl(),
        store.clone(),
        clock.clone(),
    ));
    let activity_cache = Arc::new(TieredCache::new(
        "activity",
        ACTIVITY_SCHEMA_VERSION,
        config.activity_ttl(),
        store,
        clock.clone(),
    ));

    let fetcher = Arc::new(CatalogFetcher::new(
        source.clone(),
        catalog_cache,
        user,
        config.proxy_urls.clone(),
        config.upstream_url.clone(),
    ));
    let hydrator = Arc::new(Hydrator::new(
        source,
        activity_cache,
        Arc::new(RateLimitCooldown::new()),
        clock.clone(),
        config.activity_url.clone(),
    ));

    Ok(Engine { fetcher, hydrator, clock })
}

// The --user flag wins over SHOWCASE_USER
fn resolve_user(args: UserArgs, config: &Config) -> Result<String> {
    let raw = args
        .user
        .or_else(|| config.user.clone())
        .ok_or_else(|| anyhow!("No GitHub user given: pass --user or set SHOWCASE_USER"))?;

    parse_github_user(&raw)
}

fn render_options(config: &Config) -> RenderOptions {
    RenderOptions {
        columns: config.columns,
        featured: config.featured.clone(),
        debounce: config.debounce(),
        ..RenderOptions::default()
    }
}

// Handles the 'list' subcommand
//
// Runs one full render cycle (initial paint + hydrated repaint) and prints
// only the final frame.
async fn handle_list(
    config: &Config,
    user: UserArgs,
    query: &str,
    sort: SortKey,
    refresh: bool,
    json: bool,
) -> Result<i32> {
    let user = resolve_user(user, config)?;
    let engine = build_engine(config, &user)?;

    if !json {
        println!("🔍 Building showcase for: {}", user);
    }

    if refresh {
        engine.fetcher.fetch_catalog(true).await;
    }

    let hydrator = engine.hydrator.clone();
    let log = Arc::new(FrameLog::new());
    let coordinator = RenderCoordinator::new(
        engine.fetcher,
        engine.hydrator,
        log.clone(),
        engine.clock,
        render_options(config),
    );

    let outcome = coordinator.render(query, sort).await;
    debug!(token = %outcome.token(), frames = log.len(), "render finished");

    if let Some(frame) = log.last() {
        if !json {
            println!();
        }
        print_frame(&frame, json);
    }

    if let Some(until) = hydrator.cooldown().until() {
        eprintln!(
            "⏸️  GitHub rate limit reached, activity counts paused until {}",
            until.format("%H:%M:%S UTC")
        );
    }

    Ok(0)
}

// One line of input in watch mode
#[derive(Debug, PartialEq)]
enum WatchInput {
    Query(String),
    Sort(SortKey),
    Columns(usize),
    Refresh,
    Quit,
    Invalid(String),
}

fn parse_watch_input(line: &str) -> WatchInput {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return WatchInput::Query(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit" | "q"), None) => WatchInput::Quit,
        (Some("refresh"), None) => WatchInput::Refresh,
        (Some("sort"), Some(key)) => match SortKey::from_str(key, true) {
            Ok(key) => WatchInput::Sort(key),
            Err(_) => WatchInput::Invalid(format!("Unknown sort key: {}", key)),
        },
        (Some("cols"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n > 0 => WatchInput::Columns(n),
            _ => WatchInput::Invalid(format!("Not a column count: {}", n)),
        },
        _ => WatchInput::Invalid(format!("Unknown command: {}", line)),
    }
}

// Handles the 'watch' subcommand
//
// Each stdin line goes through the same debounced path a search box would.
async fn handle_watch(config: &Config, user: UserArgs, sort: SortKey) -> Result<i32> {
    let user = resolve_user(user, config)?;
    let engine = build_engine(config, &user)?;

    println!("👀 Watching showcase for: {}", user);
    println!("   Type to search. Commands: :sort <key>, :cols <n>, :refresh, :quit");

    let coordinator = RenderCoordinator::new(
        engine.fetcher,
        engine.hydrator,
        Arc::new(TerminalPainter::new(false)),
        engine.clock,
        render_options(config),
    );

    println!("   Showing up to {} repositories\n", coordinator.window());
    coordinator.render("", sort).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match parse_watch_input(&line) {
            WatchInput::Query(query) => coordinator.on_search_input(query),
            WatchInput::Sort(key) => coordinator.on_sort_change(key),
            WatchInput::Columns(columns) => coordinator.on_resize(columns),
            WatchInput::Refresh => {
                coordinator.cancel_pending();
                coordinator.refresh().await;
            }
            WatchInput::Quit => return Ok(0),
            WatchInput::Invalid(message) => eprintln!("⚠️  {}", message),
        }
    }

    // stdin closed: render whatever input was still waiting on the debouncer
    coordinator.cancel_pending();
    coordinator.render_projects().await;

    Ok(0)
}

// Handles the 'stats' subcommand
async fn handle_stats(config: &Config, user: UserArgs, refresh: bool, json: bool) -> Result<i32> {
    let user = resolve_user(user, config)?;
    let engine = build_engine(config, &user)?;

    let catalog = engine.fetcher.fetch_catalog(refresh).await;
    let stats = CatalogStats::from_catalog(&catalog);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&user, &stats);
    }

    Ok(0)
}

fn print_stats(user: &str, stats: &CatalogStats) {
    println!("📊 Statistics for {}", user);
    println!("   📦 Repositories: {}", stats.total_repos);
    println!("   ⭐ Stars: {}", compact_number(stats.total_stars));
    println!("   🍴 Forks: {}", compact_number(stats.total_forks));

    let languages: Vec<String> = stats
        .languages
        .iter()
        .map(|(language, count)| format!("{} {}", language, count))
        .collect();
    if languages.is_empty() {
        println!("   🗣  Languages: 0");
    } else {
        println!("   🗣  Languages: {} ({})", stats.language_count(), languages.join(", "));
    }

    if let Some(name) = &stats.most_starred {
        println!("   🏆 Most starred: {}", name);
    }
    if let Some(name) = &stats.recently_updated {
        println!("   🕒 Recently updated: {}", name);
    }
}

// Handles the 'clear-cache' subcommand
fn handle_clear_cache(config: &Config, user: UserArgs) -> Result<i32> {
    let user = resolve_user(user, config)?;
    let engine = build_engine(config, &user)?;

    engine.fetcher.clear();
    println!("🧹 Cleared cached catalog for {}", engine.fetcher.user());

    Ok(0)
}
