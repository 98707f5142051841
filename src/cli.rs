// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI structure is described with structs,
// enums and #[...] attributes, and clap generates the parser.
//
// Every flag here is optional. Anything not given on the command line falls
// back to the SHOWCASE_* environment variables (see config.rs), and then to
// the built-in defaults.
// =============================================================================

use clap::{Args, Parser, Subcommand};

use crate::rank::SortKey;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "repo-showcase",
    version = "0.1.0",
    about = "Fetch, cache, rank and search a GitHub user's repositories",
    long_about = "repo-showcase builds a project showcase from a GitHub user's public repositories. \
                  The catalog is fetched through proxies with a direct GitHub fallback, cached on disk, \
                  enriched with recent commit and contributor counts, and ranked for display."
)]
pub struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

// Flags shared by every command that needs to know whose repositories to load
#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    /// GitHub user name or profile URL (e.g., octo or https://github.com/octo)
    ///
    /// Defaults to SHOWCASE_USER
    #[arg(long, short)]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the showcase once and print it
    ///
    /// Example: repo-showcase list --user octo --query parser --sort stars
    List {
        #[command(flatten)]
        user: UserArgs,

        /// Search query (substring, with typo tolerance for longer queries)
        #[arg(long, short, default_value = "")]
        query: String,

        /// Sort order
        #[arg(long, short, value_enum, default_value_t = SortKey::Popular)]
        sort: SortKey,

        /// Grid columns; the showcase shows columns x 2 repositories
        #[arg(long)]
        columns: Option<usize>,

        /// Bypass the catalog cache (activity stays cached)
        #[arg(long)]
        refresh: bool,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Interactive mode: every stdin line is a new search query
    ///
    /// Commands: `:sort <key>`, `:cols <n>`, `:refresh`, `:quit`
    Watch {
        #[command(flatten)]
        user: UserArgs,

        /// Initial sort order
        #[arg(long, short, value_enum, default_value_t = SortKey::Popular)]
        sort: SortKey,

        /// Initial grid columns
        #[arg(long)]
        columns: Option<usize>,
    },

    /// Print statistics over the whole catalog
    Stats {
        #[command(flatten)]
        user: UserArgs,

        /// Bypass the catalog cache
        #[arg(long)]
        refresh: bool,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Forget the cached catalog for a user
    ClearCache {
        #[command(flatten)]
        user: UserArgs,
    },
}
