//! Error taxonomy for the catalog contract.

use thiserror::Error;

use crate::corpus::LoadError;
use crate::store::StoreError;

/// Errors returned by catalog queries and analytics.
///
/// Malformed prices are never errors; they degrade to an absent price during
/// normalization.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The book source could not be read, parsed, or reached in time.
    #[error("book data unavailable: {reason}")]
    DataUnavailable {
        /// Human-readable cause.
        reason: String,
    },

    /// A caller-supplied parameter violates its constraint.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as seen by the caller.
        name: &'static str,
        /// Which constraint was violated.
        reason: String,
    },
}

impl CatalogError {
    /// Creates a `DataUnavailable` error.
    pub fn data_unavailable(reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidParameter` error.
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Returns true for caller errors (client-error condition at the transport).
    #[must_use]
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }

    /// Returns true for source failures (service-unavailable condition at the transport).
    #[must_use]
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

impl From<LoadError> for CatalogError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Store(store_err) => Self::from(store_err),
            other => Self::data_unavailable(other.to_string()),
        }
    }
}

/// Contended or slow stores are transient; their reason tells the caller to retry.
impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        if err.is_busy_or_locked() || err.is_timeout() {
            Self::data_unavailable(format!("store busy, retry later: {err}"))
        } else {
            Self::data_unavailable(err.to_string())
        }
    }
}
