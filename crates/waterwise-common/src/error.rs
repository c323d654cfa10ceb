//! Error types for WaterWise
//!
//! The numeric core clamps bad scalars instead of failing, so these errors
//! only surface at the edges: override parsing, solver configuration, and
//! callers that explicitly demand a converged estimate.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using WaterwiseError
pub type Result<T> = std::result::Result<T, WaterwiseError>;

/// Unified error type for WaterWise operations
#[derive(Debug, Error)]
pub enum WaterwiseError {
    // Tariff errors
    #[error("Tariff error: {0}")]
    Tariff(#[from] TariffError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Tariff calculation and usage solving errors
#[derive(Debug, Error)]
pub enum TariffError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown rate key: {0}")]
    UnknownRateKey(String),

    #[error(
        "Invalid search range: upper bound {upper} must be positive and at most {}",
        crate::MAX_USAGE_M3
    )]
    InvalidSearchRange { upper: Decimal },

    #[error(
        "No convergence for target {target} after {iterations} iterations (best estimate {best_usage} m3)"
    )]
    NoConvergence {
        target: Decimal,
        best_usage: Decimal,
        iterations: u32,
    },
}

impl TariffError {
    /// Shorthand for an invalid input on a named field
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TariffError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for WaterwiseError {
    fn from(err: serde_json::Error) -> Self {
        WaterwiseError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for WaterwiseError {
    fn from(err: anyhow::Error) -> Self {
        WaterwiseError::Internal(err.to_string())
    }
}
