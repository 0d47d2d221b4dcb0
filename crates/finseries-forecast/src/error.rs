//! Error types for forecasting.

use finseries_data::DataError;
use thiserror::Error;

/// Result type for forecasting.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while preparing, training or predicting.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Storage failure
    #[error(transparent)]
    Data(#[from] DataError),

    /// Not enough data to build the training set
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Required account columns are absent from the pivot
    #[error("Missing required accounts: {}", .0.join(", "))]
    MissingAccounts(Vec<String>),

    /// Too few joined rows to split and fit
    #[error("Need at least 2 rows to train, found {0}")]
    TooFewRows(usize),

    /// The company has no feature rows
    #[error("Company not found in training data: {0}")]
    CompanyNotFound(String),

    /// Train and validation splits overlap or are empty
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Numerical failure in the solver
    #[error("Linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl ForecastError {
    /// Whether the failure stems from missing or insufficient stored data.
    pub const fn is_data_insufficiency(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData(_) | Self::MissingAccounts(_) | Self::TooFewRows(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_accounts_display() {
        let err = ForecastError::MissingAccounts(vec![
            "ifrs-full_Inventories".to_string(),
            "ifrs-full_SharePremium".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing required accounts: ifrs-full_Inventories, ifrs-full_SharePremium"
        );
        assert!(err.is_data_insufficiency());
        assert!(!ForecastError::InvariantViolation("overlap".to_string()).is_data_insufficiency());
    }
}
