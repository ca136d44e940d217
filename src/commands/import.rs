//! Import command handler: seed the SQLite store from a JSON export.

use anyhow::Result;
use book_analytics_core::{CatalogError, JsonFileSource, SqliteBookStore};
use serde::Serialize;
use tracing::info;

use crate::app_config::Settings;
use crate::cli::ImportArgs;
use crate::output;

#[derive(Debug, Serialize)]
struct ImportSummary {
    source: String,
    db_path: String,
    replaced: u64,
    imported: usize,
}

pub async fn run_import_command(settings: &Settings, args: &ImportArgs) -> Result<()> {
    let path = args.file.as_ref().unwrap_or(&settings.data_path);
    let source = JsonFileSource::new(path);
    let records = source.read_raw().await.map_err(CatalogError::from)?;

    let store = SqliteBookStore::new(super::open_database(settings, true).await?);
    let (replaced, imported) = if args.replace {
        store.replace(&records).await.map_err(CatalogError::from)?
    } else {
        (0, store.import(&records).await.map_err(CatalogError::from)?)
    };

    info!(imported, replaced, db = %settings.db_path.display(), "import complete");
    output::print_json(&ImportSummary {
        source: path.display().to_string(),
        db_path: settings.db_path.display().to_string(),
        replaced,
        imported,
    })
}
