//! Title word frequency.

use std::collections::HashMap;

use super::{WordCount, WordFrequency, validate_top_n};
use crate::catalog::CatalogError;
use crate::record::Book;

/// Splits a title into lowercase tokens with ASCII punctuation removed.
///
/// ```
/// use book_analytics_core::tokenize_title;
///
/// assert_eq!(tokenize_title("Dogs? Yes, dogs."), vec!["dogs", "yes", "dogs"]);
/// ```
#[must_use]
pub fn tokenize_title(title: &str) -> Vec<String> {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Returns the `top_n` most frequent title words across the corpus.
///
/// Ties keep the order in which words first appeared.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidParameter`] when `top_n` is outside 1..=100.
pub fn title_words(corpus: &[Book], top_n: usize) -> Result<WordFrequency, CatalogError> {
    validate_top_n(top_n)?;

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<WordCount> = Vec::new();

    for token in corpus.iter().flat_map(|book| tokenize_title(&book.title)) {
        match positions.get(&token) {
            Some(&index) => counts[index].count += 1,
            None => {
                positions.insert(token.clone(), counts.len());
                counts.push(WordCount {
                    word: token,
                    count: 1,
                });
            }
        }
    }

    // Stable: equal counts stay in first-occurrence order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top_n);

    Ok(WordFrequency { top: counts })
}
