//! CLI entry point for the book analytics tool.

use std::process::ExitCode;

use anyhow::Result;
use book_analytics_core::CatalogError;
use clap::Parser;
use tracing::debug;

mod app_config;
mod cli;
mod commands;
mod output;

use cli::{Cli, Command, ConfigCommand};

/// Process outcome mapped onto exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
    InvalidParameter,
    DataUnavailable,
}

impl ProcessExit {
    #[must_use]
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::InvalidParameter => 2,
            Self::DataUnavailable => 3,
        }
    }

    /// Classifies a failed run by the catalog error underneath it, if any.
    pub(crate) fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<CatalogError>() {
            Some(CatalogError::InvalidParameter { .. }) => Self::InvalidParameter,
            Some(CatalogError::DataUnavailable { .. }) => Self::DataUnavailable,
            None => Self::Failure,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ProcessExit::Success.into(),
        Err(err) => {
            eprintln!("error: {err:#}");
            ProcessExit::from_error(&err).into()
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loaded = app_config::load_config(cli.global.config.as_deref())?;
    let settings = app_config::resolve_settings(&cli.global, loaded.config.as_ref());

    let default_level =
        app_config::resolve_default_log_level(cli.global.verbose, cli.global.quiet, settings.verbosity);
    init_tracing(default_level);
    debug!(?settings, "settings resolved");

    match &cli.command {
        Command::Config {
            command: ConfigCommand::Show,
        } => commands::run_config_show_command(&loaded, &settings),
        Command::Import(args) => commands::run_import_command(&settings, args).await,
        Command::Books(args) => {
            let catalog = commands::build_catalog(&settings).await?;
            commands::run_books_command(&catalog, args).await
        }
        Command::Availability => {
            let catalog = commands::build_catalog(&settings).await?;
            commands::run_availability_command(&catalog).await
        }
        Command::PriceStats => {
            let catalog = commands::build_catalog(&settings).await?;
            commands::run_price_stats_command(&catalog).await
        }
        Command::PriceBuckets { bucket_size } => {
            let catalog = commands::build_catalog(&settings).await?;
            commands::run_price_buckets_command(&catalog, *bucket_size).await
        }
        Command::TitleWords { top_n } => {
            let catalog = commands::build_catalog(&settings).await?;
            commands::run_title_words_command(&catalog, *top_n).await
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the flag-derived level.
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
