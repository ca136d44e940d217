//! Canonical book records and the normalization that produces them.
//!
//! Raw records come from a crawler export (JSON array) or from the `SQLite`
//! store. Their fields are optional and loosely typed; [`normalize_record`]
//! maps each one onto the canonical [`Book`] without ever failing.
//!
//! # Example
//!
//! ```
//! use book_analytics_core::{RawRecord, normalize_record};
//! use serde_json::json;
//!
//! let raw: RawRecord = serde_json::from_value(json!({
//!     "url": " http://books.toscrape.com/a-light-in-the-attic/ ",
//!     "title": "A Light in the Attic",
//!     "price": "£51.77",
//!     "availability": "In stock"
//! }))
//! .unwrap();
//!
//! let book = normalize_record(&raw);
//! assert_eq!(book.id, "http://books.toscrape.com/a-light-in-the-attic/");
//! assert_eq!(book.price, Some(51.77));
//! ```

mod price;

pub use price::{parse_price, parse_price_value};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical book entity served by the query and analytics engines.
///
/// `price` is either a finite number or `None`; it is never `NaN` or infinite.
/// All keys are always serialized, `price` as `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Stable identifier: explicit id, else URL, else store-native id.
    pub id: String,
    /// Trimmed title, empty when absent.
    pub title: String,
    /// Trimmed source URL, empty when absent.
    pub url: String,
    /// Parsed price.
    pub price: Option<f64>,
    /// Trimmed availability label with its original casing.
    pub availability: String,
}

/// A raw, heterogeneous source record.
///
/// Every field is optional and accepted in any JSON shape; unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Explicit identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Store-native identifier (`_id`).
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<Value>,
    /// Book title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    /// Source URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    /// Raw price token, e.g. `"£51.77"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    /// Precomputed numeric price written by a backfill step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_num: Option<Value>,
    /// Availability label, e.g. `"In stock (22 available)"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Value>,
}

/// Maps a raw record onto the canonical [`Book`].
///
/// - `id`: first non-empty (after trimming) of `id`, `url`, `_id`; else empty.
/// - `title`, `url`, `availability`: trimmed text, empty when absent.
/// - `price`: a numeric `price_num` is used directly; otherwise the raw `price`
///   goes through [`parse_price_value`].
#[must_use]
pub fn normalize_record(raw: &RawRecord) -> Book {
    let id = [
        text_field(raw.id.as_ref()),
        text_field(raw.url.as_ref()),
        native_id_text(raw.native_id.as_ref()),
    ]
    .into_iter()
    .find(|candidate| !candidate.is_empty())
    .unwrap_or_default();

    let price = match raw.price_num.as_ref() {
        Some(Value::Number(number)) => number.as_f64().filter(|value| value.is_finite()),
        _ => parse_price_value(raw.price.as_ref()),
    };

    Book {
        id,
        title: text_field(raw.title.as_ref()),
        url: text_field(raw.url.as_ref()),
        price,
        availability: text_field(raw.availability.as_ref()),
    }
}

/// Trimmed textual form of a scalar field; empty for null, absent, or non-scalar values.
pub(crate) fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Store-native ids may be plain scalars or extended-JSON objects (`{"$oid": "..."}`).
pub(crate) fn native_id_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Object(map)) => text_field(map.get("$oid")),
        other => text_field(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_prefers_explicit_id() {
        let book = normalize_record(&raw(json!({"id": " b-1 ", "url": "u1", "_id": "x"})));
        assert_eq!(book.id, "b-1");
    }

    #[test]
    fn test_normalize_falls_back_to_url_then_native_id() {
        let book = normalize_record(&raw(json!({"url": " http://x/1 ", "_id": "abc"})));
        assert_eq!(book.id, "http://x/1");
        assert_eq!(book.url, "http://x/1");

        let book = normalize_record(&raw(json!({"_id": "abc"})));
        assert_eq!(book.id, "abc");
        assert_eq!(book.url, "");
    }

    #[test]
    fn test_normalize_skips_whitespace_only_id() {
        let book = normalize_record(&raw(json!({"id": "   ", "url": "u9"})));
        assert_eq!(book.id, "u9");
    }

    #[test]
    fn test_normalize_accepts_numeric_and_extended_json_ids() {
        assert_eq!(normalize_record(&raw(json!({"id": 7}))).id, "7");
        let book = normalize_record(&raw(json!({"_id": {"$oid": "65a1f0"}})));
        assert_eq!(book.id, "65a1f0");
    }

    #[test]
    fn test_normalize_empty_record_yields_empty_strings() {
        let book = normalize_record(&RawRecord::default());
        assert_eq!(
            book,
            Book {
                id: String::new(),
                title: String::new(),
                url: String::new(),
                price: None,
                availability: String::new(),
            }
        );
    }

    #[test]
    fn test_normalize_null_fields_yield_empty_strings() {
        let book = normalize_record(&raw(
            json!({"title": null, "url": null, "availability": null, "price": null}),
        ));
        assert_eq!(book.title, "");
        assert_eq!(book.url, "");
        assert_eq!(book.availability, "");
        assert_eq!(book.price, None);
    }

    #[test]
    fn test_normalize_trims_text_fields_and_keeps_case() {
        let book = normalize_record(&raw(
            json!({"title": "  The Cat \n", "availability": " In Stock (3 available) "}),
        ));
        assert_eq!(book.title, "The Cat");
        assert_eq!(book.availability, "In Stock (3 available)");
    }

    #[test]
    fn test_normalize_numeric_price_num_bypasses_parsing() {
        let book = normalize_record(&raw(json!({"price": "£99.00", "price_num": 12.5})));
        assert_eq!(book.price, Some(12.5));
    }

    #[test]
    fn test_normalize_non_numeric_price_num_falls_back_to_price() {
        let book = normalize_record(&raw(json!({"price": "£51.77", "price_num": "oops"})));
        assert_eq!(book.price, Some(51.77));

        let book = normalize_record(&raw(json!({"price": "£51.77", "price_num": null})));
        assert_eq!(book.price, Some(51.77));
    }

    #[test]
    fn test_normalize_malformed_price_degrades_to_none() {
        let book = normalize_record(&raw(json!({"price": "call for price"})));
        assert_eq!(book.price, None);
    }

    #[test]
    fn test_book_serializes_null_price() {
        let book = normalize_record(&raw(json!({"id": "1", "title": "T"})));
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(
            value,
            json!({"id": "1", "title": "T", "url": "", "price": null, "availability": ""})
        );
    }

    #[test]
    fn test_raw_record_ignores_unknown_keys() {
        let record = raw(json!({"title": "T", "rating": "Three", "upc": "a897fe39b1053632"}));
        assert_eq!(record.title, Some(json!("T")));
    }
}
