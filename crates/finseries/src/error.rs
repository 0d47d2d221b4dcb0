//! Errors surfaced by the service layer.

use crate::export::ExportError;
use finseries_analysis::AnalysisError;
use finseries_data::DataError;
use finseries_forecast::ForecastError;
use thiserror::Error;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors from any layer below the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Fetching, parsing or storage failure.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Ratio or comparison failure.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Forecast failure.
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// Export failure.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ServiceError {
    /// Whether the caller should retry later because the directory is loading.
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::Data(DataError::NotReady))
    }

    /// Whether the error reports a well-formed query that matched nothing.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Data(DataError::NotFound(_)) | Self::Forecast(ForecastError::CompanyNotFound(_))
        )
    }

    /// Whether OpenDART failed or answered with something unusable.
    pub const fn is_upstream(&self) -> bool {
        match self {
            Self::Data(e) => e.is_upstream(),
            _ => false,
        }
    }
}
