//! Transport-facing catalog contract.
//!
//! [`Catalog`] is what a transport (HTTP handler, CLI) calls. Every operation
//! validates its parameters before touching the corpus, then runs on the
//! selected backend:
//!
//! - [`QueryBackend::Memory`] lists through a [`MemoryStore`] over the cached
//!   corpus snapshot and computes analytics in memory.
//! - [`QueryBackend::Pushdown`] lists and aggregates inside the `SQLite`
//!   store. Title word frequency always runs over the cached corpus.

mod error;

pub use error::CatalogError;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::analytics::{
    self, AvailabilityDistribution, PriceHistogram, PriceStats, WordFrequency,
};
use crate::corpus::{CorpusCache, DEFAULT_LOAD_TIMEOUT};
use crate::query::{BookPage, BookQuery};
use crate::record::Book;
use crate::store::{BookStore, DEFAULT_QUERY_TIMEOUT, MemoryStore, SqliteBookStore};

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Where listing and aggregate work executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryBackend {
    /// Scan the cached corpus.
    #[default]
    Memory,
    /// Delegate to the `SQLite` store.
    Pushdown,
}

impl QueryBackend {
    /// Returns the configuration token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Pushdown => "pushdown",
        }
    }
}

impl fmt::Display for QueryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QueryBackend {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "pushdown" => Ok(Self::Pushdown),
            _ => Err(format!(
                "unrecognized backend '{value}', expected one of: memory, pushdown"
            )),
        }
    }
}

/// Catalog tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Execution strategy for listing and aggregates.
    pub backend: QueryBackend,
    /// Bound on one corpus load.
    pub load_timeout: Duration,
    /// Bound on one pushed-down store query.
    pub query_timeout: Duration,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            backend: QueryBackend::Memory,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Book query and analytics service.
#[derive(Debug, Clone)]
pub struct Catalog {
    corpus: Arc<CorpusCache>,
    pushdown: Option<SqliteBookStore>,
}

impl Catalog {
    /// Serves everything from the cached corpus.
    #[must_use]
    pub fn in_memory(corpus: Arc<CorpusCache>) -> Self {
        Self {
            corpus,
            pushdown: None,
        }
    }

    /// Pushes listing and aggregates down into `store`.
    ///
    /// `corpus` still backs title word frequency.
    #[must_use]
    pub fn pushdown(corpus: Arc<CorpusCache>, store: SqliteBookStore) -> Self {
        Self {
            corpus,
            pushdown: Some(store),
        }
    }

    /// The active execution strategy.
    #[must_use]
    pub fn backend(&self) -> QueryBackend {
        if self.pushdown.is_some() {
            QueryBackend::Pushdown
        } else {
            QueryBackend::Memory
        }
    }

    /// The corpus cache behind this catalog.
    #[must_use]
    pub fn corpus(&self) -> &Arc<CorpusCache> {
        &self.corpus
    }

    /// Reloads the corpus, replacing the cached snapshot on success.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DataUnavailable`] when the reload fails; the
    /// previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<usize> {
        Ok(self.corpus.refresh().await?.len())
    }

    /// Filters, sorts and paginates the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidParameter`] for bad parameters (before
    /// any data access) and [`CatalogError::DataUnavailable`] when the source
    /// or store fails.
    #[instrument(skip(self, params), fields(backend = %self.backend()))]
    pub async fn list_books(&self, params: &BookQuery) -> Result<BookPage> {
        params.validate()?;

        let page = match &self.pushdown {
            Some(store) => list_from(store, params).await?,
            None => {
                let store = MemoryStore::new(self.corpus.get_or_load().await?);
                list_from(&store, params).await?
            }
        };

        debug!(
            total = page.total,
            returned = page.items.len(),
            offset = params.offset,
            "listed books"
        );
        Ok(page)
    }

    /// Groups the whole corpus by availability label.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DataUnavailable`] when the source or store fails.
    #[instrument(skip(self), fields(backend = %self.backend()))]
    pub async fn availability_distribution(&self) -> Result<AvailabilityDistribution> {
        match &self.pushdown {
            Some(store) => Ok(store.availability_distribution().await?),
            None => Ok(analytics::availability_distribution(&self.snapshot().await?)),
        }
    }

    /// Price statistics over priced books.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DataUnavailable`] when the source or store fails.
    #[instrument(skip(self), fields(backend = %self.backend()))]
    pub async fn price_stats(&self) -> Result<PriceStats> {
        match &self.pushdown {
            Some(store) => Ok(store.price_stats().await?),
            None => Ok(analytics::price_stats(&self.snapshot().await?)),
        }
    }

    /// Histogram of prices with width `bucket_size`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidParameter`] unless `bucket_size` is a
    /// finite number > 0 with a bounded layout, and
    /// [`CatalogError::DataUnavailable`] when the source or store fails.
    #[instrument(skip(self), fields(backend = %self.backend()))]
    pub async fn price_buckets(&self, bucket_size: f64) -> Result<PriceHistogram> {
        analytics::validate_bucket_size(bucket_size)?;
        match &self.pushdown {
            Some(store) => store.price_histogram(bucket_size).await,
            None => analytics::price_histogram(&self.snapshot().await?, bucket_size),
        }
    }

    /// The `top_n` most frequent title words.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidParameter`] unless `top_n` is in 1..=100,
    /// and [`CatalogError::DataUnavailable`] when the source fails.
    #[instrument(skip(self))]
    pub async fn title_words(&self, top_n: usize) -> Result<WordFrequency> {
        analytics::validate_top_n(top_n)?;
        analytics::title_words(&self.snapshot().await?, top_n)
    }

    async fn snapshot(&self) -> Result<Arc<[Book]>> {
        Ok(self.corpus.get_or_load().await?)
    }
}

async fn list_from(store: &dyn BookStore, params: &BookQuery) -> Result<BookPage> {
    let filter = params.filter();
    let total = store.count(&filter).await?;
    let items = store
        .find(&filter, params.sort, params.offset, params.limit)
        .await?;
    debug!(store = store.backend_name(), total, "store listing complete");
    Ok(BookPage { total, items })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::corpus::{CorpusSource, LoadError};
    use crate::db::Database;
    use async_trait::async_trait;

    struct FixedSource(Vec<Book>);

    #[async_trait]
    impl CorpusSource for FixedSource {
        fn describe(&self) -> String {
            "fixed".to_string()
        }

        async fn load(&self) -> std::result::Result<Vec<Book>, LoadError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl CorpusSource for BrokenSource {
        fn describe(&self) -> String {
            "broken".to_string()
        }

        async fn load(&self) -> std::result::Result<Vec<Book>, LoadError> {
            Err(LoadError::NotAnArray {
                source_label: "broken".to_string(),
            })
        }
    }

    fn catalog(books: Vec<Book>) -> Catalog {
        Catalog::in_memory(Arc::new(CorpusCache::new(
            Arc::new(FixedSource(books)),
            DEFAULT_LOAD_TIMEOUT,
        )))
    }

    fn broken() -> Catalog {
        Catalog::in_memory(Arc::new(CorpusCache::new(
            Arc::new(BrokenSource),
            DEFAULT_LOAD_TIMEOUT,
        )))
    }

    #[test]
    fn test_query_backend_parse_and_display() {
        assert_eq!("memory".parse::<QueryBackend>().unwrap(), QueryBackend::Memory);
        assert_eq!(" Pushdown ".parse::<QueryBackend>().unwrap(), QueryBackend::Pushdown);
        assert!("mongo".parse::<QueryBackend>().is_err());
        assert_eq!(QueryBackend::Pushdown.to_string(), "pushdown");
        assert_eq!(QueryBackend::default(), QueryBackend::Memory);
    }

    #[tokio::test]
    async fn test_list_books_over_memory_backend() {
        let books = vec![Book {
            id: "1".to_string(),
            title: "One".to_string(),
            url: String::new(),
            price: Some(1.0),
            availability: "In stock".to_string(),
        }];
        let catalog = catalog(books);

        let page = catalog.list_books(&BookQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(catalog.backend(), QueryBackend::Memory);
    }

    #[tokio::test]
    async fn test_invalid_parameters_rejected_before_corpus_access() {
        let catalog = broken();
        let params = BookQuery {
            limit: 0,
            ..BookQuery::default()
        };

        assert!(catalog.list_books(&params).await.unwrap_err().is_invalid_parameter());
        assert!(catalog.price_buckets(-5.0).await.unwrap_err().is_invalid_parameter());
        assert!(catalog.title_words(0).await.unwrap_err().is_invalid_parameter());
        assert_eq!(catalog.corpus().load_count(), 0);
    }

    #[tokio::test]
    async fn test_source_failure_is_data_unavailable() {
        let catalog = broken();
        assert!(
            catalog
                .list_books(&BookQuery::default())
                .await
                .unwrap_err()
                .is_data_unavailable()
        );
        assert!(catalog.price_stats().await.unwrap_err().is_data_unavailable());
        assert!(catalog.refresh().await.unwrap_err().is_data_unavailable());
    }

    #[tokio::test]
    async fn test_pushdown_query_timeout_is_data_unavailable() {
        let db = Database::new_in_memory().await.unwrap();
        let store =
            SqliteBookStore::new(db.clone()).with_query_timeout(Duration::from_millis(50));
        let catalog = Catalog::pushdown(
            Arc::new(CorpusCache::new(
                Arc::new(FixedSource(Vec::new())),
                DEFAULT_LOAD_TIMEOUT,
            )),
            store,
        );
        // Holding the single in-memory connection stalls every store query.
        let _held = db.pool().acquire().await.unwrap();

        let err = catalog.price_stats().await.unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(err.to_string().contains("timed out"));

        let err = catalog.list_books(&BookQuery::default()).await.unwrap_err();
        assert!(err.is_data_unavailable());
    }
}
