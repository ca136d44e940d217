//! Error types for corpus loading.

use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while producing a corpus from its source.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file could not be read.
    #[error("cannot read {source_label}: {source}")]
    Io {
        /// Source description (usually a path).
        source_label: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The source is not valid JSON.
    #[error("{source_label} is not valid JSON: {source}")]
    Malformed {
        /// Source description.
        source_label: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The top-level JSON value is not an array.
    #[error("{source_label} must contain a JSON array of records")]
    NotAnArray {
        /// Source description.
        source_label: String,
    },

    /// An array element is not a JSON object.
    #[error("record {index} in {source_label} is not a JSON object")]
    InvalidRecord {
        /// Source description.
        source_label: String,
        /// Zero-based position in the array.
        index: usize,
    },

    /// The backing store failed.
    #[error("store source failed: {0}")]
    Store(#[from] StoreError),

    /// The load did not finish within its time bound.
    #[error("loading {source_label} timed out after {after:?}")]
    Timeout {
        /// Source description.
        source_label: String,
        /// The bound that elapsed.
        after: Duration,
    },
}
