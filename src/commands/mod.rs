//! CLI command handlers.

mod analytics;
mod books;
mod config;
mod import;

pub use analytics::{
    run_availability_command, run_price_buckets_command, run_price_stats_command,
    run_title_words_command,
};
pub use books::run_books_command;
pub use config::run_config_show_command;
pub use import::run_import_command;

use std::sync::Arc;

use anyhow::{Result, bail};
use book_analytics_core::{
    Catalog, CatalogError, CatalogOptions, CorpusCache, CorpusSource, Database, DatabaseOptions,
    JsonFileSource, QueryBackend, SqliteBookStore, StoreCorpusSource,
};
use tracing::{debug, instrument};

use crate::app_config::{Settings, SourceKind};

/// Opens the configured database; failures surface as unavailable data.
///
/// Only `import` may create the file; queries against a missing database fail.
pub(crate) async fn open_database(
    settings: &Settings,
    create_if_missing: bool,
) -> Result<Database> {
    let options = DatabaseOptions {
        create_if_missing,
        ..settings.db_options
    };
    Database::new(&settings.db_path, options)
        .await
        .map_err(|err| {
            CatalogError::data_unavailable(format!(
                "cannot open database '{}': {err}",
                settings.db_path.display()
            ))
            .into()
        })
}

/// Wires the corpus source, cache and backend selected by `settings`.
#[instrument(skip(settings), fields(source = settings.source.as_str(), backend = %settings.backend))]
pub(crate) async fn build_catalog(settings: &Settings) -> Result<Catalog> {
    let options = CatalogOptions {
        backend: settings.backend,
        load_timeout: settings.load_timeout,
        ..CatalogOptions::default()
    };
    let catalog = match settings.source {
        SourceKind::File => {
            if options.backend == QueryBackend::Pushdown {
                bail!("backend `pushdown` requires the sqlite source (use --source sqlite)");
            }
            let source = Arc::new(JsonFileSource::new(&settings.data_path));
            Catalog::in_memory(corpus_cache(source, &options))
        }
        SourceKind::Sqlite => {
            let store = SqliteBookStore::new(open_database(settings, false).await?)
                .with_query_timeout(options.query_timeout);
            let label = format!("sqlite:{}", settings.db_path.display());
            let source = Arc::new(StoreCorpusSource::new(store.clone(), label));
            let corpus = corpus_cache(source, &options);
            match options.backend {
                QueryBackend::Memory => Catalog::in_memory(corpus),
                QueryBackend::Pushdown => Catalog::pushdown(corpus, store),
            }
        }
    };

    debug!(corpus = %catalog.corpus().describe(), "catalog ready");
    Ok(catalog)
}

fn corpus_cache(source: Arc<dyn CorpusSource>, options: &CatalogOptions) -> Arc<CorpusCache> {
    Arc::new(CorpusCache::new(source, options.load_timeout))
}
