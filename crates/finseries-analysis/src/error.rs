//! Error types for analytics.

use finseries_data::DataError;
use thiserror::Error;

/// Result type for analytics.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while computing analytics.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Storage or upstream failure
    #[error(transparent)]
    Data(#[from] DataError),

    /// A year argument could not be accepted
    #[error("Invalid year: {0}")]
    InvalidYear(String),

    /// A comparison needs at least one selection
    #[error("No selections given")]
    EmptySelection,

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
