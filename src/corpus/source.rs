//! Corpus sources: a JSON export on disk or the `SQLite` store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::LoadError;
use crate::record::{Book, RawRecord, normalize_record};
use crate::store::SqliteBookStore;

/// Produces the full corpus, in source order.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Human-readable source label for logs and errors.
    fn describe(&self) -> String;

    /// Loads and normalizes every record.
    async fn load(&self) -> Result<Vec<Book>, LoadError>;
}

/// Parses a crawler export: one JSON array of record objects.
///
/// # Errors
///
/// Returns [`LoadError::Malformed`] for invalid JSON, [`LoadError::NotAnArray`]
/// when the top level is not an array, and [`LoadError::InvalidRecord`] for
/// the first element that is not an object.
pub fn parse_records(bytes: &[u8], source_label: &str) -> Result<Vec<RawRecord>, LoadError> {
    let malformed = |source| LoadError::Malformed {
        source_label: source_label.to_string(),
        source,
    };

    let Value::Array(items) = serde_json::from_slice::<Value>(bytes).map_err(malformed)? else {
        return Err(LoadError::NotAnArray {
            source_label: source_label.to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(LoadError::InvalidRecord {
                    source_label: source_label.to_string(),
                    index,
                });
            }
            serde_json::from_value(item).map_err(malformed)
        })
        .collect()
}

/// Corpus stored as a JSON array file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Creates a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this source reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw records without normalizing them.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when the file cannot be read, otherwise the
    /// errors of [`parse_records`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn read_raw(&self) -> Result<Vec<RawRecord>, LoadError> {
        let label = self.describe();
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                source_label: label.clone(),
                source,
            })?;
        let records = parse_records(&bytes, &label)?;
        debug!(records = records.len(), bytes = bytes.len(), "parsed record file");
        Ok(records)
    }
}

#[async_trait]
impl CorpusSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Vec<Book>, LoadError> {
        let records = self.read_raw().await?;
        Ok(records.iter().map(normalize_record).collect())
    }
}

/// Corpus read back from the `SQLite` store in import order.
#[derive(Debug, Clone)]
pub struct StoreCorpusSource {
    store: SqliteBookStore,
    label: String,
}

impl StoreCorpusSource {
    /// Creates a source projecting every row of `store`.
    pub fn new(store: SqliteBookStore, label: impl Into<String>) -> Self {
        Self {
            store,
            label: label.into(),
        }
    }
}

#[async_trait]
impl CorpusSource for StoreCorpusSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn load(&self) -> Result<Vec<Book>, LoadError> {
        Ok(self.store.fetch_all().await?)
    }
}
