//! Corpus-wide analytics: availability, price statistics, price histogram,
//! and title word frequency.
//!
//! Every view is a pure function of the full, unfiltered corpus.

mod words;

pub use words::{title_words, tokenize_title};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;
use crate::record::Book;

/// Label used for books without an availability value.
pub const UNKNOWN_AVAILABILITY: &str = "unknown";

/// Default histogram bucket width.
pub const DEFAULT_BUCKET_SIZE: f64 = 10.0;

/// Upper bound on histogram buckets a single request may produce.
pub const MAX_HISTOGRAM_BUCKETS: usize = 10_000;

/// Default number of title words returned.
pub const DEFAULT_TOP_N: usize = 10;

/// Largest accepted `top_n`.
pub const MAX_TOP_N: usize = 100;

/// Count of books sharing one availability label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityBucket {
    /// Lowercased, trimmed label.
    pub label: String,
    /// Books carrying the label.
    pub count: usize,
}

/// Books grouped by availability label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDistribution {
    /// Sum of all bucket counts (the corpus size).
    pub total: usize,
    /// One bucket per distinct label.
    pub buckets: Vec<AvailabilityBucket>,
}

impl AvailabilityDistribution {
    /// Looks up the count for a label.
    #[must_use]
    pub fn count_for(&self, label: &str) -> Option<usize> {
        self.buckets
            .iter()
            .find(|bucket| bucket.label == label)
            .map(|bucket| bucket.count)
    }
}

/// Summary statistics over priced books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    /// Books with a price.
    pub count: usize,
    /// Lowest price.
    pub min: Option<f64>,
    /// Highest price.
    pub max: Option<f64>,
    /// Arithmetic mean.
    pub average: Option<f64>,
}

/// One half-open histogram bucket `[lower, upper)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBucket {
    /// Inclusive lower bound.
    pub lower: f64,
    /// Exclusive upper bound.
    pub upper: f64,
    /// Books whose price falls in the bucket.
    pub count: usize,
}

/// Price histogram starting at the lowest price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistogram {
    /// Contiguous buckets covering min..=max.
    pub buckets: Vec<PriceBucket>,
}

/// One title word and its frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    /// Lowercased token.
    pub word: String,
    /// Occurrences across all titles.
    pub count: usize,
}

/// Most frequent title words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequency {
    /// Words by descending count, ties in first-occurrence order.
    pub top: Vec<WordCount>,
}

/// Normalized availability label used for grouping.
#[must_use]
pub fn availability_label(raw: &str) -> String {
    let label = raw.trim().to_lowercase();
    if label.is_empty() {
        UNKNOWN_AVAILABILITY.to_string()
    } else {
        label
    }
}

/// Groups the corpus by normalized availability label.
///
/// Buckets appear in first-occurrence order.
#[must_use]
pub fn availability_distribution(corpus: &[Book]) -> AvailabilityDistribution {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<AvailabilityBucket> = Vec::new();

    for book in corpus {
        let label = availability_label(&book.availability);
        match positions.get(&label) {
            Some(&index) => buckets[index].count += 1,
            None => {
                positions.insert(label.clone(), buckets.len());
                buckets.push(AvailabilityBucket { label, count: 1 });
            }
        }
    }

    let total = buckets.iter().map(|bucket| bucket.count).sum();
    AvailabilityDistribution { total, buckets }
}

/// Computes count/min/max/average over books with a price.
#[must_use]
pub fn price_stats(corpus: &[Book]) -> PriceStats {
    let prices: Vec<f64> = corpus.iter().filter_map(|book| book.price).collect();
    if prices.is_empty() {
        return PriceStats {
            count: 0,
            min: None,
            max: None,
            average: None,
        };
    }

    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = prices.iter().sum();
    #[allow(clippy::cast_precision_loss)]
    let average = sum / prices.len() as f64;

    PriceStats {
        count: prices.len(),
        min: Some(min),
        max: Some(max),
        average: Some(average),
    }
}

/// Checks that a histogram width is usable.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidParameter`] unless `bucket_size` is finite and > 0.
pub fn validate_bucket_size(bucket_size: f64) -> Result<(), CatalogError> {
    if bucket_size.is_finite() && bucket_size > 0.0 {
        Ok(())
    } else {
        Err(CatalogError::invalid_parameter(
            "bucket_size",
            format!("must be a finite number > 0, got {bucket_size}"),
        ))
    }
}

/// Number of buckets needed to cover `min..=max`.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidParameter`] when the layout would exceed
/// [`MAX_HISTOGRAM_BUCKETS`].
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn bucket_count(min: f64, max: f64, bucket_size: f64) -> Result<usize, CatalogError> {
    let span = ((max - min) / bucket_size).floor();
    if !span.is_finite() || span >= MAX_HISTOGRAM_BUCKETS as f64 {
        return Err(CatalogError::invalid_parameter(
            "bucket_size",
            format!(
                "{bucket_size} needs {} buckets for price range {min}..={max}, at most {MAX_HISTOGRAM_BUCKETS} allowed",
                span + 1.0
            ),
        ));
    }
    Ok(span as usize + 1)
}

/// Bucket index for a price: `floor((price - min) / bucket_size)`, clamped to the layout.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn bucket_index(price: f64, min: f64, bucket_size: f64, buckets: usize) -> usize {
    let index = ((price - min) / bucket_size).floor().max(0.0) as usize;
    index.min(buckets.saturating_sub(1))
}

/// Lays out `counts.len()` buckets of width `bucket_size` starting at `min`.
#[must_use]
pub(crate) fn buckets_from_counts(min: f64, bucket_size: f64, counts: &[usize]) -> PriceHistogram {
    let buckets = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            #[allow(clippy::cast_precision_loss)]
            let lower = min + i as f64 * bucket_size;
            PriceBucket {
                lower,
                upper: lower + bucket_size,
                count,
            }
        })
        .collect();
    PriceHistogram { buckets }
}

/// Buckets priced books into half-open bins of width `bucket_size`.
///
/// The first bucket starts at the lowest price; the last one contains the
/// highest price. Returns no buckets when no book has a price.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidParameter`] for a non-positive or
/// non-finite width, or one so small the layout exceeds
/// [`MAX_HISTOGRAM_BUCKETS`].
pub fn price_histogram(corpus: &[Book], bucket_size: f64) -> Result<PriceHistogram, CatalogError> {
    validate_bucket_size(bucket_size)?;

    let stats = price_stats(corpus);
    let (Some(min), Some(max)) = (stats.min, stats.max) else {
        return Ok(PriceHistogram {
            buckets: Vec::new(),
        });
    };

    let buckets = bucket_count(min, max, bucket_size)?;
    let mut counts = vec![0_usize; buckets];
    for price in corpus.iter().filter_map(|book| book.price) {
        counts[bucket_index(price, min, bucket_size, buckets)] += 1;
    }

    Ok(buckets_from_counts(min, bucket_size, &counts))
}

/// Checks that `top_n` is within 1..=[`MAX_TOP_N`].
///
/// # Errors
///
/// Returns [`CatalogError::InvalidParameter`] when out of range.
pub fn validate_top_n(top_n: usize) -> Result<(), CatalogError> {
    if (1..=MAX_TOP_N).contains(&top_n) {
        Ok(())
    } else {
        Err(CatalogError::invalid_parameter(
            "top_n",
            format!("expected 1..={MAX_TOP_N}, got {top_n}"),
        ))
    }
}
