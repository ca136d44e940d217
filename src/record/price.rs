//! Price parsing for noisy scraped currency strings.
//!
//! Scraped prices arrive as `"£51.77"`, `"$1,234.56"`, bare numbers, or junk.
//! [`parse_price`] is total: anything that does not yield a finite number
//! degrades to `None` instead of failing the load.

use serde_json::Value;

/// Currency symbols stripped before parsing.
const CURRENCY_SYMBOLS: [char; 3] = ['£', '$', '€'];

/// Thousands separator stripped before parsing.
const THOUSANDS_SEPARATOR: char = ',';

/// Parses a raw price token into a finite `f64`.
///
/// Currency symbols and thousands separators are removed and the remainder is
/// trimmed. Returns `None` for empty input, unparseable text, `NaN`, and
/// infinities.
///
/// # Examples
///
/// ```
/// use book_analytics_core::parse_price;
///
/// assert_eq!(parse_price("£51.77"), Some(51.77));
/// assert_eq!(parse_price("1,234.56"), Some(1234.56));
/// assert_eq!(parse_price("nan"), None);
/// ```
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != THOUSANDS_SEPARATOR)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a price from an arbitrary JSON value.
///
/// Numbers are taken as-is (if finite), strings go through [`parse_price`],
/// `null` and absent values yield `None`. Other shapes are coerced to their
/// textual form first, which never parses as a number.
#[must_use]
pub fn parse_price_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Null => None,
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        Value::String(text) => parse_price(text),
        other => parse_price(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_price_strips_pound_sign() {
        assert_eq!(parse_price("£51.77"), Some(51.77));
    }

    #[test]
    fn test_parse_price_strips_dollar_sign() {
        assert_eq!(parse_price("$10.50"), Some(10.5));
    }

    #[test]
    fn test_parse_price_strips_euro_sign_and_whitespace() {
        assert_eq!(parse_price("  € 7.25 "), Some(7.25));
    }

    #[test]
    fn test_parse_price_strips_thousands_separators() {
        assert_eq!(parse_price("1,234.56"), Some(1234.56));
        assert_eq!(parse_price("£1,000,000"), Some(1_000_000.0));
    }

    #[test]
    fn test_parse_price_empty_is_none() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("   "), None);
        assert_eq!(parse_price("£"), None);
    }

    #[test]
    fn test_parse_price_non_finite_is_none() {
        assert_eq!(parse_price("nan"), None);
        assert_eq!(parse_price("NaN"), None);
        assert_eq!(parse_price("inf"), None);
        assert_eq!(parse_price("-infinity"), None);
        assert_eq!(parse_price("1e400"), None);
    }

    #[test]
    fn test_parse_price_garbage_is_none() {
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price("£12.3.4"), None);
        assert_eq!(parse_price("twelve pounds"), None);
    }

    #[test]
    fn test_parse_price_accepts_plain_numbers() {
        assert_eq!(parse_price("0"), Some(0.0));
        assert_eq!(parse_price("42"), Some(42.0));
        assert_eq!(parse_price("-3.5"), Some(-3.5));
    }

    #[test]
    fn test_parse_price_value_handles_json_shapes() {
        assert_eq!(parse_price_value(None), None);
        assert_eq!(parse_price_value(Some(&Value::Null)), None);
        assert_eq!(parse_price_value(Some(&json!(25.5))), Some(25.5));
        assert_eq!(parse_price_value(Some(&json!(12))), Some(12.0));
        assert_eq!(parse_price_value(Some(&json!("£51.77"))), Some(51.77));
        assert_eq!(parse_price_value(Some(&json!(true))), None);
        assert_eq!(parse_price_value(Some(&json!(["1.0"]))), None);
    }
}
