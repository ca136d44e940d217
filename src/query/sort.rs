//! Sort keys and the in-memory ordering they select.

use std::cmp::Ordering;
use std::fmt;

use crate::record::Book;

/// Ordering applied to a filtered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Cheapest first; books without a price are dropped.
    PriceAsc,
    /// Most expensive first; books without a price are dropped.
    PriceDesc,
    /// Case-folded title, A to Z.
    TitleAsc,
    /// Case-folded title, Z to A.
    TitleDesc,
}

impl SortKey {
    /// Returns the transport token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::TitleAsc => "title_asc",
            Self::TitleDesc => "title_desc",
        }
    }

    /// Returns true for the two price orderings.
    #[must_use]
    pub fn is_price(&self) -> bool {
        matches!(self, Self::PriceAsc | Self::PriceDesc)
    }

    /// Returns true for descending orderings.
    #[must_use]
    pub fn is_descending(&self) -> bool {
        matches!(self, Self::PriceDesc | Self::TitleDesc)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "title_asc" => Ok(Self::TitleAsc),
            "title_desc" => Ok(Self::TitleDesc),
            _ => Err(format!(
                "unrecognized sort '{value}', expected one of: price_asc, price_desc, title_asc, title_desc"
            )),
        }
    }
}

/// Orders matched books by `sort`.
///
/// The sort is stable in both directions: equal keys keep their corpus order
/// even for descending sorts. Price sorts drop books without a price.
#[must_use]
pub fn sort_books(books: Vec<&Book>, sort: SortKey) -> Vec<&Book> {
    let descending = sort.is_descending();
    let directed = |ordering: Ordering| if descending { ordering.reverse() } else { ordering };

    if sort.is_price() {
        let mut priced: Vec<(f64, &Book)> = books
            .into_iter()
            .filter_map(|book| book.price.map(|price| (price, book)))
            .collect();
        priced.sort_by(|(a, _), (b, _)| directed(a.partial_cmp(b).unwrap_or(Ordering::Equal)));
        return priced.into_iter().map(|(_, book)| book).collect();
    }

    // Fold once per book rather than once per comparison.
    let mut keyed: Vec<(String, &Book)> = books
        .into_iter()
        .map(|book| (book.title.to_lowercase(), book))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| directed(a.cmp(b)));
    keyed.into_iter().map(|(_, book)| book).collect()
}
