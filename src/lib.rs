//! Book Analytics Core Library
//!
//! Query and analytics engine over a catalog of scraped book records. Raw,
//! loosely typed records are normalized into canonical [`Book`]s, cached as
//! an immutable corpus, and served through filter/sort/paginate listing and
//! four corpus-wide analytics views.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`record`] - Canonical book entity, price and record normalization
//! - [`db`] - `SQLite` connection pool and migrations
//! - [`store`] - `BookStore` listing capability (in-memory and SQL pushdown)
//! - [`corpus`] - Corpus sources and the single-flight corpus cache
//! - [`query`] - Listing parameters, validation, predicate, sort, pagination
//! - [`analytics`] - Availability, price statistics, histogram, title words
//! - [`catalog`] - Transport-facing contract and error taxonomy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analytics;
pub mod catalog;
pub mod corpus;
pub mod db;
pub mod query;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use analytics::{
    AvailabilityBucket, AvailabilityDistribution, DEFAULT_BUCKET_SIZE, DEFAULT_TOP_N, PriceBucket,
    PriceHistogram, PriceStats, WordCount, WordFrequency, tokenize_title,
};
pub use catalog::{Catalog, CatalogError, CatalogOptions, QueryBackend};
pub use corpus::{
    CorpusCache, CorpusSource, DEFAULT_LOAD_TIMEOUT, JsonFileSource, LoadError, StoreCorpusSource,
    parse_records,
};
pub use db::{Database, DatabaseOptions, DbError};
pub use query::{BookFilter, BookPage, BookQuery, DEFAULT_LIMIT, SortKey, parse_sort};
pub use record::{Book, RawRecord, normalize_record, parse_price, parse_price_value};
pub use store::{BookStore, MemoryStore, SqliteBookStore, StoreError};
