//! In-memory store over a cached corpus snapshot.

use std::sync::Arc;

use async_trait::async_trait;

use super::{BookStore, Result};
use crate::query::{BookFilter, SortKey, sort_books};
use crate::record::Book;

/// Full-scan store over an immutable corpus snapshot.
///
/// Cloning shares the snapshot.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    books: Arc<[Book]>,
}

impl MemoryStore {
    /// Wraps an existing snapshot.
    #[must_use]
    pub fn new(books: Arc<[Book]>) -> Self {
        Self { books }
    }

    /// Number of books in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Returns true when the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// The snapshot in corpus order.
    #[must_use]
    pub fn books(&self) -> &[Book] {
        &self.books
    }
}

impl From<Vec<Book>> for MemoryStore {
    fn from(books: Vec<Book>) -> Self {
        Self::new(books.into())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn count(&self, filter: &BookFilter) -> Result<usize> {
        Ok(self.books.iter().filter(|book| filter.matches(book)).count())
    }

    async fn find(
        &self,
        filter: &BookFilter,
        sort: Option<SortKey>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Book>> {
        let matched: Vec<&Book> = self.books.iter().filter(|book| filter.matches(book)).collect();
        let ranked = match sort {
            Some(sort) => sort_books(matched, sort),
            None => matched,
        };
        Ok(ranked.into_iter().skip(offset).take(limit).cloned().collect())
    }
}
