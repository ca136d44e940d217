//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use book_analytics_core::{DEFAULT_BUCKET_SIZE, DEFAULT_LIMIT, DEFAULT_TOP_N, QueryBackend};
use clap::{Args, Parser, Subcommand};

use crate::app_config::SourceKind;

/// Query and analyze a catalog of scraped book records.
///
/// Every data command prints its result as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "book-analytics")]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: $XDG_CONFIG_HOME/book-analytics/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where the corpus is read from
    #[arg(long, value_enum, global = true)]
    pub source: Option<SourceKind>,

    /// JSON export used by the file source
    #[arg(long = "data", global = true)]
    pub data_path: Option<PathBuf>,

    /// SQLite database used by the sqlite source and the pushdown backend
    #[arg(long = "db", global = true)]
    pub db_path: Option<PathBuf>,

    /// Execution strategy: memory or pushdown
    #[arg(long, global = true)]
    pub backend: Option<QueryBackend>,

    /// Seconds before a corpus load is abandoned (1-3600)
    #[arg(long = "load-timeout", global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub load_timeout_secs: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List books with filters, sorting and pagination
    Books(BooksArgs),

    /// Count books per availability label
    Availability,

    /// Count, min, max and average over priced books
    PriceStats,

    /// Histogram of prices
    PriceBuckets {
        /// Bucket width (> 0)
        #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE, allow_negative_numbers = true)]
        bucket_size: f64,
    },

    /// Most frequent words across all titles
    TitleWords {
        /// Number of words to return (1-100)
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
    },

    /// Load a JSON export into the SQLite store
    Import(ImportArgs),

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Filters and paging for `books`.
#[derive(Args, Debug, Clone)]
pub struct BooksArgs {
    /// Case-insensitive substring of the title
    #[arg(long = "query", visible_alias = "q")]
    pub text_query: Option<String>,

    /// Inclusive lower price bound
    #[arg(long, allow_negative_numbers = true)]
    pub price_min: Option<f64>,

    /// Inclusive upper price bound
    #[arg(long, allow_negative_numbers = true)]
    pub price_max: Option<f64>,

    /// Exact availability label, case-insensitive
    #[arg(long)]
    pub availability: Option<String>,

    /// price_asc, price_desc, title_asc or title_desc
    #[arg(long)]
    pub sort: Option<String>,

    /// Page size (1-100)
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Books skipped before the page
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

/// Arguments for `import`.
#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// JSON export to import (default: the configured data path)
    pub file: Option<PathBuf>,

    /// Delete existing rows before importing
    #[arg(long)]
    pub replace: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
}
