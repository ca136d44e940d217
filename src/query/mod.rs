//! Book listing: filter, sort, and paginate.
//!
//! [`BookQuery`] carries the per-request parameters. It validates them and
//! builds the shared [`BookFilter`] predicate that both execution strategies
//! evaluate: the in-memory scan in [`query`] and the SQL pushdown in
//! [`crate::store::SqliteBookStore`].

mod sort;

pub use sort::{SortKey, sort_books};

use serde::Serialize;

use crate::catalog::CatalogError;
use crate::record::Book;

/// Default page size.
pub const DEFAULT_LIMIT: usize = 20;

/// Largest accepted page size.
pub const MAX_LIMIT: usize = 100;

/// Longest accepted text query, in characters.
pub const MAX_TEXT_QUERY_CHARS: usize = 100;

/// Longest accepted availability filter, in characters.
pub const MAX_AVAILABILITY_CHARS: usize = 50;

/// Parameters for one listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct BookQuery {
    /// Case-insensitive substring matched against titles.
    pub text_query: Option<String>,
    /// Inclusive lower price bound.
    pub price_min: Option<f64>,
    /// Inclusive upper price bound.
    pub price_max: Option<f64>,
    /// Case-insensitive exact availability label.
    pub availability: Option<String>,
    /// Ordering applied after filtering.
    pub sort: Option<SortKey>,
    /// Page size (1..=100).
    pub limit: usize,
    /// Records skipped before the page starts.
    pub offset: usize,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            text_query: None,
            price_min: None,
            price_max: None,
            availability: None,
            sort: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl BookQuery {
    /// Checks every parameter constraint.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidParameter`] naming the first offending parameter.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(text) = &self.text_query
            && text.chars().count() > MAX_TEXT_QUERY_CHARS
        {
            return Err(CatalogError::invalid_parameter(
                "q",
                format!("at most {MAX_TEXT_QUERY_CHARS} characters"),
            ));
        }
        if let Some(availability) = &self.availability
            && availability.chars().count() > MAX_AVAILABILITY_CHARS
        {
            return Err(CatalogError::invalid_parameter(
                "availability",
                format!("at most {MAX_AVAILABILITY_CHARS} characters"),
            ));
        }
        validate_price_bound("price_min", self.price_min)?;
        validate_price_bound("price_max", self.price_max)?;
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(CatalogError::invalid_parameter(
                "limit",
                format!("expected 1..={MAX_LIMIT}, got {}", self.limit),
            ));
        }
        Ok(())
    }

    /// Builds the predicate shared by both execution strategies.
    #[must_use]
    pub fn filter(&self) -> BookFilter {
        BookFilter {
            title_contains: non_blank(self.text_query.as_deref()).map(str::to_lowercase),
            availability: non_blank(self.availability.as_deref())
                .map(|label| label.trim().to_lowercase()),
            price_min: self.price_min,
            price_max: self.price_max,
        }
    }
}

fn validate_price_bound(name: &'static str, bound: Option<f64>) -> Result<(), CatalogError> {
    match bound {
        Some(value) if !value.is_finite() => Err(CatalogError::invalid_parameter(
            name,
            "must be a finite number",
        )),
        Some(value) if value < 0.0 => Err(CatalogError::invalid_parameter(
            name,
            format!("must be >= 0, got {value}"),
        )),
        _ => Ok(()),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Parses an optional sort token from the transport.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidParameter`] for unrecognized tokens.
pub fn parse_sort(token: Option<&str>) -> Result<Option<SortKey>, CatalogError> {
    match token.map(str::trim).filter(|token| !token.is_empty()) {
        None => Ok(None),
        Some(token) => token
            .parse()
            .map(Some)
            .map_err(|reason: String| CatalogError::invalid_parameter("sort", reason)),
    }
}

/// Conjunctive predicate over books.
///
/// Text fields are stored already case-folded so the SQL pushdown can bind
/// them as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    /// Lowercased substring the lowercased title must contain.
    pub title_contains: Option<String>,
    /// Trimmed, lowercased label the trimmed, lowercased availability must equal.
    pub availability: Option<String>,
    /// Inclusive lower price bound; excludes books without a price.
    pub price_min: Option<f64>,
    /// Inclusive upper price bound; excludes books without a price.
    pub price_max: Option<f64>,
}

impl BookFilter {
    /// Returns true when the book satisfies every active predicate.
    #[must_use]
    pub fn matches(&self, book: &Book) -> bool {
        self.matches_title(book) && self.matches_availability(book) && self.matches_price(book)
    }

    fn matches_title(&self, book: &Book) -> bool {
        self.title_contains
            .as_deref()
            .is_none_or(|needle| book.title.to_lowercase().contains(needle))
    }

    fn matches_availability(&self, book: &Book) -> bool {
        self.availability
            .as_deref()
            .is_none_or(|wanted| book.availability.trim().to_lowercase() == wanted)
    }

    fn matches_price(&self, book: &Book) -> bool {
        if self.price_min.is_none() && self.price_max.is_none() {
            return true;
        }
        let Some(price) = book.price else {
            return false;
        };
        self.price_min.is_none_or(|min| price >= min) && self.price_max.is_none_or(|max| price <= max)
    }
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookPage {
    /// Matches before sorting and pagination.
    pub total: usize,
    /// The requested page.
    pub items: Vec<Book>,
}

/// Runs a listing request over an in-memory corpus.
///
/// `total` counts every book matching the filter; price sorts then drop books
/// without a price from the ranked set before `offset`/`limit` are applied.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidParameter`] when `params` fail validation.
pub fn query(corpus: &[Book], params: &BookQuery) -> Result<BookPage, CatalogError> {
    params.validate()?;
    let filter = params.filter();

    let matched: Vec<&Book> = corpus.iter().filter(|book| filter.matches(book)).collect();
    let total = matched.len();

    let ranked = match params.sort {
        Some(sort) => sort_books(matched, sort),
        None => matched,
    };

    let items = ranked
        .into_iter()
        .skip(params.offset)
        .take(params.limit)
        .cloned()
        .collect();

    Ok(BookPage { total, items })
}
