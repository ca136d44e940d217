//! `SQLite`-backed store with predicate pushdown.
//!
//! Filters, sort mapping and skip/limit run inside SQL. Text matching uses
//! the `title_folded`/`availability_folded` columns, which are lowercased in
//! Rust at import time so pushdown results equal the in-memory scan.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::SqliteConnection;
use tracing::{debug, info, instrument};

use super::{BookStore, Result, StoreError};
use crate::analytics::{
    AvailabilityBucket, AvailabilityDistribution, PriceHistogram, PriceStats,
    UNKNOWN_AVAILABILITY, bucket_count, bucket_index, buckets_from_counts, validate_bucket_size,
};
use crate::catalog::CatalogError;
use crate::db::Database;
use crate::query::{BookFilter, SortKey};
use crate::record::{Book, RawRecord, native_id_text, normalize_record, text_field};

/// Default bound on a single store query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

const BOOK_COLUMNS: &str = "id, native_id, title, url, price, price_num, availability";

const FILTER_WHERE: &str = "WHERE (?1 IS NULL OR instr(title_folded, ?1) > 0)
               AND (?2 IS NULL OR availability_folded = ?2)
               AND (?3 IS NULL OR price_num >= ?3)
               AND (?4 IS NULL OR price_num <= ?4)";

/// One `books` row as stored.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: Option<String>,
    native_id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    price: Option<String>,
    price_num: Option<f64>,
    availability: Option<String>,
}

impl BookRow {
    /// Rows go back through the record normalizer like any other raw record.
    fn into_book(self) -> Book {
        let text = |value: Option<String>| value.map(Value::String);
        let raw = RawRecord {
            id: text(self.id),
            native_id: text(self.native_id),
            title: text(self.title),
            url: text(self.url),
            price: text(self.price),
            price_num: self
                .price_num
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            availability: text(self.availability),
        };
        normalize_record(&raw)
    }
}

/// Book store persisted in the `books` table.
#[derive(Debug, Clone)]
pub struct SqliteBookStore {
    db: Database,
    query_timeout: Duration,
}

impl SqliteBookStore {
    /// Creates a store over an open database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            db,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Overrides the per-query time bound.
    #[must_use]
    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Returns the per-query time bound.
    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Appends raw records in order, inside one transaction.
    ///
    /// Each record is normalized; the raw price text is kept next to the
    /// parsed `price_num`. Records with a URL and no native id get the hex
    /// SHA-256 of the URL as their native id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if any insert fails; nothing is written then.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn import(&self, records: &[RawRecord]) -> Result<usize> {
        let mut tx = self.db.pool().begin().await?;
        insert_records(&mut tx, records).await?;
        tx.commit().await?;

        info!(imported = records.len(), "books imported");
        Ok(records.len())
    }

    /// Replaces every stored book with `records` in one transaction.
    ///
    /// Returns `(replaced, imported)`. On failure the previous rows stay.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the delete or any insert fails.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn replace(&self, records: &[RawRecord]) -> Result<(u64, usize)> {
        let mut tx = self.db.pool().begin().await?;
        let replaced = sqlx::query("DELETE FROM books")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        insert_records(&mut tx, records).await?;
        tx.commit().await?;

        info!(replaced, imported = records.len(), "books replaced");
        Ok((replaced, records.len()))
    }

    /// Reads every book in store order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on database failure or timeout.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY seq");
        let rows = self
            .timed(
                "fetch_all",
                sqlx::query_as::<_, BookRow>(&sql).fetch_all(self.db.pool()),
            )
            .await?;
        debug!(books = rows.len(), "fetched all books");
        Ok(rows.into_iter().map(BookRow::into_book).collect())
    }

    /// Groups books by folded availability label, in first-occurrence order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on database failure or timeout.
    #[instrument(skip(self))]
    pub async fn availability_distribution(&self) -> Result<AvailabilityDistribution> {
        let rows = self
            .timed(
                "availability_distribution",
                sqlx::query_as::<_, (String, i64)>(
                    r"SELECT CASE WHEN availability_folded = '' THEN ?1
                                  ELSE availability_folded END AS label,
                             COUNT(*)
                        FROM books
                       GROUP BY label
                       ORDER BY MIN(seq)",
                )
                .bind(UNKNOWN_AVAILABILITY)
                .fetch_all(self.db.pool()),
            )
            .await?;

        let buckets: Vec<AvailabilityBucket> = rows
            .into_iter()
            .map(|(label, count)| AvailabilityBucket {
                label,
                count: to_usize(count),
            })
            .collect();
        let total = buckets.iter().map(|bucket| bucket.count).sum();
        Ok(AvailabilityDistribution { total, buckets })
    }

    /// Computes price statistics over rows with a parsed price.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on database failure or timeout.
    #[instrument(skip(self))]
    pub async fn price_stats(&self) -> Result<PriceStats> {
        let (count, min, max, average) = self
            .timed(
                "price_stats",
                sqlx::query_as::<_, (i64, Option<f64>, Option<f64>, Option<f64>)>(
                    r"SELECT COUNT(price_num), MIN(price_num), MAX(price_num), AVG(price_num)
                        FROM books",
                )
                .fetch_one(self.db.pool()),
            )
            .await?;

        Ok(PriceStats {
            count: to_usize(count),
            min,
            max,
            average,
        })
    }

    /// Buckets priced rows by `floor((price_num - min) / bucket_size)`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidParameter`] for an unusable width and
    /// [`CatalogError::DataUnavailable`] on store failure.
    #[instrument(skip(self))]
    pub async fn price_histogram(
        &self,
        bucket_size: f64,
    ) -> std::result::Result<PriceHistogram, CatalogError> {
        validate_bucket_size(bucket_size)?;

        let stats = self.price_stats().await?;
        let (Some(min), Some(max)) = (stats.min, stats.max) else {
            return Ok(PriceHistogram {
                buckets: Vec::new(),
            });
        };
        let buckets = bucket_count(min, max, bucket_size)?;

        let rows = self
            .timed(
                "price_histogram",
                sqlx::query_as::<_, (f64, i64)>(
                    r"SELECT (price_num - ?1) / ?2 AS position, COUNT(*)
                        FROM books
                       WHERE price_num IS NOT NULL
                       GROUP BY position",
                )
                .bind(min)
                .bind(bucket_size)
                .fetch_all(self.db.pool()),
            )
            .await?;

        let mut counts = vec![0_usize; buckets];
        for (position, count) in rows {
            // position is already scaled, so index it against a unit width from 0.
            counts[bucket_index(position, 0.0, 1.0, buckets)] += to_usize(count);
        }

        Ok(buckets_from_counts(min, bucket_size, &counts))
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout {
                operation,
                after: self.query_timeout,
            }),
        }
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: &BookFilter) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM books {FILTER_WHERE}");
        let count = self
            .timed(
                "count",
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(filter.title_contains.as_deref())
                    .bind(filter.availability.as_deref())
                    .bind(filter.price_min)
                    .bind(filter.price_max)
                    .fetch_one(self.db.pool()),
            )
            .await?;
        Ok(to_usize(count))
    }

    #[instrument(skip(self))]
    async fn find(
        &self,
        filter: &BookFilter,
        sort: Option<SortKey>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books {FILTER_WHERE} {} LIMIT ?5 OFFSET ?6",
            sort_clause(sort)
        );
        let rows = self
            .timed(
                "find",
                sqlx::query_as::<_, BookRow>(&sql)
                    .bind(filter.title_contains.as_deref())
                    .bind(filter.availability.as_deref())
                    .bind(filter.price_min)
                    .bind(filter.price_max)
                    .bind(to_i64(limit))
                    .bind(to_i64(offset))
                    .fetch_all(self.db.pool()),
            )
            .await?;
        Ok(rows.into_iter().map(BookRow::into_book).collect())
    }
}

/// Inserts normalized rows for `records` on an open transaction.
async fn insert_records(conn: &mut SqliteConnection, records: &[RawRecord]) -> Result<()> {
    for raw in records {
        let book = normalize_record(raw);
        let explicit_id = Some(text_field(raw.id.as_ref())).filter(|id| !id.is_empty());
        let native_id = Some(native_id_text(raw.native_id.as_ref()))
            .filter(|id| !id.is_empty())
            .or_else(|| (!book.url.is_empty()).then(|| url_digest(&book.url)));
        let price_text = match raw.price.as_ref() {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        };

        sqlx::query(
            r"INSERT INTO books
                (id, native_id, title, url, price, price_num, availability,
                 title_folded, availability_folded)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(explicit_id)
        .bind(native_id)
        .bind(&book.title)
        .bind(&book.url)
        .bind(price_text)
        .bind(book.price)
        .bind(&book.availability)
        .bind(book.title.to_lowercase())
        .bind(book.availability.to_lowercase())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Maps a sort key onto SQL. Ties always fall back to import order.
fn sort_clause(sort: Option<SortKey>) -> &'static str {
    match sort {
        None => "ORDER BY seq",
        Some(SortKey::PriceAsc) => "AND price_num IS NOT NULL ORDER BY price_num ASC, seq ASC",
        Some(SortKey::PriceDesc) => "AND price_num IS NOT NULL ORDER BY price_num DESC, seq ASC",
        Some(SortKey::TitleAsc) => "ORDER BY title_folded ASC, seq ASC",
        Some(SortKey::TitleDesc) => "ORDER BY title_folded DESC, seq ASC",
    }
}

fn url_digest(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded(records: Value) -> SqliteBookStore {
        let db = Database::new_in_memory().await.unwrap();
        let store = SqliteBookStore::new(db);
        let records: Vec<RawRecord> = serde_json::from_value(records).unwrap();
        store.import(&records).await.unwrap();
        store
    }

    fn sample() -> Value {
        json!([
            {"id": "1", "title": "The Cat", "price": "£10.00", "availability": "In stock"},
            {"id": "2", "title": "Dog Days", "price": "£25.50", "availability": "In stock"},
            {"id": "3", "title": "Bird Box", "price": "£40.00", "availability": "Out of stock"},
            {"id": "4", "title": "Another Cat Tale", "price": null, "availability": "In stock"}
        ])
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|book| book.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_import_and_fetch_all_round_trips_normalized_books() {
        let store = seeded(sample()).await;
        let books = store.fetch_all().await.unwrap();

        assert_eq!(ids(&books), vec!["1", "2", "3", "4"]);
        assert_eq!(books[1].price, Some(25.5));
        assert_eq!(books[3].price, None);
        assert_eq!(books[2].availability, "Out of stock");
    }

    #[tokio::test]
    async fn test_import_assigns_url_digest_as_native_id() {
        let store = seeded(json!([{"url": "http://books.toscrape.com/x/", "title": "X"}])).await;
        let native: Option<String> = sqlx::query_scalar("SELECT native_id FROM books")
            .fetch_one(store.db.pool())
            .await
            .unwrap();

        let native = native.unwrap();
        assert_eq!(native.len(), 64);
        assert_eq!(native, url_digest("http://books.toscrape.com/x/"));
    }

    #[tokio::test]
    async fn test_import_keeps_raw_price_and_backfills_price_num() {
        let store = seeded(json!([{"id": "a", "price": "£1,234.56"}])).await;
        let (price, price_num): (Option<String>, Option<f64>) =
            sqlx::query_as("SELECT price, price_num FROM books")
                .fetch_one(store.db.pool())
                .await
                .unwrap();

        assert_eq!(price.as_deref(), Some("£1,234.56"));
        assert_eq!(price_num, Some(1234.56));
    }

    #[tokio::test]
    async fn test_count_and_find_push_down_filters() {
        let store = seeded(sample()).await;
        let filter = BookFilter {
            title_contains: Some("cat".to_string()),
            ..BookFilter::default()
        };

        assert_eq!(store.count(&filter).await.unwrap(), 2);
        let found = store.find(&filter, None, 0, 20).await.unwrap();
        assert_eq!(ids(&found), vec!["1", "4"]);
    }

    #[tokio::test]
    async fn test_price_bounds_exclude_unpriced_rows() {
        let store = seeded(sample()).await;
        let filter = BookFilter {
            price_min: Some(0.0),
            ..BookFilter::default()
        };
        assert_eq!(store.count(&filter).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_find_price_sort_skips_unpriced_and_paginates() {
        let store = seeded(sample()).await;
        let filter = BookFilter::default();

        let first = store.find(&filter, Some(SortKey::PriceDesc), 0, 2).await.unwrap();
        let second = store.find(&filter, Some(SortKey::PriceDesc), 2, 2).await.unwrap();

        assert_eq!(ids(&first), vec!["3", "2"]);
        assert_eq!(ids(&second), vec!["1"]);
    }

    #[tokio::test]
    async fn test_availability_distribution_pushdown() {
        let store = seeded(json!([
            {"id": "1", "availability": "In stock"},
            {"id": "2", "availability": "  "},
            {"id": "3", "availability": "IN STOCK"},
            {"id": "4"}
        ]))
        .await;

        let dist = store.availability_distribution().await.unwrap();
        assert_eq!(dist.total, 4);
        assert_eq!(
            dist.buckets,
            vec![
                AvailabilityBucket {
                    label: "in stock".to_string(),
                    count: 2
                },
                AvailabilityBucket {
                    label: UNKNOWN_AVAILABILITY.to_string(),
                    count: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_price_stats_pushdown() {
        let store = seeded(sample()).await;
        let stats = store.price_stats().await.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(40.0));
        assert!((stats.average.unwrap() - 25.166_666_666_666_668).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_price_stats_on_empty_store() {
        let store = seeded(json!([])).await;
        let stats = store.price_stats().await.unwrap();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.min, None);
        assert_eq!(stats.average, None);
    }

    #[tokio::test]
    async fn test_price_histogram_pushdown() {
        let store = seeded(json!([
            {"id": "a", "price": 0.0},
            {"id": "b", "price": 5.0},
            {"id": "c", "price": 10.0},
            {"id": "d", "price": 15.0},
            {"id": "e"}
        ]))
        .await;

        let histogram = store.price_histogram(5.0).await.unwrap();
        let counts: Vec<usize> = histogram.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 1]);
        assert!(store.price_histogram(0.0).await.unwrap_err().is_invalid_parameter());
    }

    #[tokio::test]
    async fn test_replace_swaps_rows_in_one_step() {
        let store = seeded(sample()).await;
        let records: Vec<RawRecord> =
            serde_json::from_value(json!([{"id": "9", "title": "Only"}])).unwrap();

        assert_eq!(store.replace(&records).await.unwrap(), (4, 1));
        assert_eq!(ids(&store.fetch_all().await.unwrap()), vec!["9"]);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_rows() {
        let store = seeded(sample()).await;
        sqlx::query(
            r"CREATE TRIGGER reject_title BEFORE INSERT ON books
              WHEN NEW.title = 'reject me'
              BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(store.db.pool())
        .await
        .unwrap();
        let records: Vec<RawRecord> = serde_json::from_value(json!([
            {"id": "a", "title": "Fine"},
            {"id": "b", "title": "reject me"}
        ]))
        .unwrap();

        assert!(store.replace(&records).await.is_err());
        assert_eq!(
            ids(&store.fetch_all().await.unwrap()),
            vec!["1", "2", "3", "4"]
        );
    }

    #[tokio::test]
    async fn test_query_timeout_surfaces_as_store_timeout() {
        let store = seeded(sample())
            .await
            .with_query_timeout(Duration::from_millis(50));
        // The in-memory pool has one connection; holding it stalls every query.
        let _held = store.db.pool().acquire().await.unwrap();

        let err = store.count(&BookFilter::default()).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, StoreError::Timeout { operation: "count", .. }));
    }

    #[test]
    fn test_sort_clause_breaks_ties_by_seq() {
        for key in [
            SortKey::PriceAsc,
            SortKey::PriceDesc,
            SortKey::TitleAsc,
            SortKey::TitleDesc,
        ] {
            assert!(sort_clause(Some(key)).ends_with("seq ASC"));
        }
        assert_eq!(sort_clause(None), "ORDER BY seq");
    }
}
