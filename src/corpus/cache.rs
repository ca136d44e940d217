//! Single-flight cache of the loaded corpus.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::{CorpusSource, LoadError};
use crate::record::Book;

/// Default bound on one corpus load.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Caches the corpus after the first successful load.
///
/// Readers share an immutable `Arc<[Book]>` snapshot. Concurrent cache misses
/// are serialized behind a load gate, so the source is read at most once per
/// miss; a waiter that acquires the gate after a successful load returns the
/// fresh snapshot. A failed load leaves the slot empty and the next call retries.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use book_analytics_core::{CorpusCache, JsonFileSource, DEFAULT_LOAD_TIMEOUT};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = CorpusCache::new(
///     Arc::new(JsonFileSource::new("data/sample_run.json")),
///     DEFAULT_LOAD_TIMEOUT,
/// );
/// let corpus = cache.get_or_load().await?;
/// println!("{} books", corpus.len());
/// # Ok(())
/// # }
/// ```
pub struct CorpusCache {
    source: Arc<dyn CorpusSource>,
    load_timeout: Duration,
    snapshot: RwLock<Option<Arc<[Book]>>>,
    load_gate: Mutex<()>,
    loads: AtomicU64,
}

impl std::fmt::Debug for CorpusCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusCache")
            .field("source", &self.source.describe())
            .field("load_timeout", &self.load_timeout)
            .field("loads", &self.load_count())
            .finish_non_exhaustive()
    }
}

impl CorpusCache {
    /// Creates an empty cache in front of `source`.
    #[must_use]
    pub fn new(source: Arc<dyn CorpusSource>, load_timeout: Duration) -> Self {
        Self {
            source,
            load_timeout,
            snapshot: RwLock::new(None),
            load_gate: Mutex::new(()),
            loads: AtomicU64::new(0),
        }
    }

    /// Label of the underlying source.
    #[must_use]
    pub fn describe(&self) -> String {
        self.source.describe()
    }

    /// Number of load attempts started so far, successful or not.
    #[must_use]
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Returns the cached snapshot without loading.
    pub async fn cached(&self) -> Option<Arc<[Book]>> {
        self.snapshot.read().await.clone()
    }

    /// Returns the cached corpus, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns the source's [`LoadError`], or [`LoadError::Timeout`] when the
    /// load exceeds the configured bound. Nothing is cached on failure.
    pub async fn get_or_load(&self) -> Result<Arc<[Book]>, LoadError> {
        if let Some(corpus) = self.cached().await {
            return Ok(corpus);
        }

        let _gate = self.load_gate.lock().await;
        // Another caller may have finished loading while we waited.
        if let Some(corpus) = self.cached().await {
            debug!(books = corpus.len(), "corpus loaded by concurrent caller");
            return Ok(corpus);
        }

        let corpus = self.load_once().await?;
        *self.snapshot.write().await = Some(Arc::clone(&corpus));
        Ok(corpus)
    }

    /// Reloads from the source and swaps the snapshot in one step.
    ///
    /// Readers see either the old or the new corpus, never a mix. On failure
    /// the previous snapshot stays in place.
    ///
    /// # Errors
    ///
    /// Same as [`CorpusCache::get_or_load`].
    pub async fn refresh(&self) -> Result<Arc<[Book]>, LoadError> {
        let _gate = self.load_gate.lock().await;
        let corpus = self.load_once().await?;
        *self.snapshot.write().await = Some(Arc::clone(&corpus));
        Ok(corpus)
    }

    /// Drops the snapshot; the next read loads again.
    pub async fn invalidate(&self) {
        let _gate = self.load_gate.lock().await;
        *self.snapshot.write().await = None;
    }

    #[instrument(skip(self), fields(source = %self.source.describe()))]
    async fn load_once(&self) -> Result<Arc<[Book]>, LoadError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        match tokio::time::timeout(self.load_timeout, self.source.load()).await {
            Ok(Ok(books)) => {
                info!(
                    books = books.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "corpus loaded"
                );
                Ok(books.into())
            }
            Ok(Err(err)) => {
                warn!(error = %err, "corpus load failed");
                Err(err)
            }
            Err(_) => {
                warn!(timeout = ?self.load_timeout, "corpus load timed out");
                Err(LoadError::Timeout {
                    source_label: self.source.describe(),
                    after: self.load_timeout,
                })
            }
        }
    }
}
