//! Book stores: the listing capability shared by both execution strategies.
//!
//! [`BookStore`] is the seam the catalog lists through. [`MemoryStore`] scans
//! an immutable corpus snapshot; [`SqliteBookStore`] pushes the same
//! predicate, sort mapping and skip/limit down into SQL.

mod error;
mod memory;
mod sqlite;

pub use error::{StoreDbErrorKind, StoreError};
pub use memory::MemoryStore;
pub use sqlite::{DEFAULT_QUERY_TIMEOUT, SqliteBookStore};

use async_trait::async_trait;

use crate::query::{BookFilter, SortKey};
use crate::record::Book;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Listing contract implemented by every backend.
///
/// Implementations must agree on counts and ordering for identical inputs:
/// unsorted results follow corpus order, sorted results break ties by corpus
/// order, and price sorts omit books without a price.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Short backend label for logs.
    fn backend_name(&self) -> &'static str;

    /// Counts books matching `filter`.
    async fn count(&self, filter: &BookFilter) -> Result<usize>;

    /// Returns at most `limit` matching books after skipping `offset`.
    async fn find(
        &self,
        filter: &BookFilter,
        sort: Option<SortKey>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Book>>;
}
