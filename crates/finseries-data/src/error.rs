//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// The corp-code directory has not finished loading yet.
    #[error("Corp directory is still loading, please retry shortly")]
    NotReady,

    /// A well-formed query matched nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No statement data could be assembled for a company.
    #[error("No data available for {corp}: {reason}")]
    NoData {
        /// Company that was queried
        corp: String,
        /// Reason for missing data
        reason: String,
    },

    /// Required configuration is missing.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// Invalid request argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(String),

    /// OpenDART reported a non-success status in the response body.
    #[error("OpenDART API error (status {status}): {message}")]
    DartApi {
        /// Status code returned by the API
        status: String,
        /// Message returned by the API
        message: String,
    },

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// ZIP archive error
    #[error("Archive error: {0}")]
    Archive(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for DataError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

impl From<quick_xml::Error> for DataError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl DataError {
    /// Whether the error came from the external source (network, HTTP, API
    /// status or a malformed payload) rather than from local data.
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Http(_)
                | Self::DartApi { .. }
                | Self::Parse(_)
                | Self::XmlParse(_)
                | Self::Archive(_)
                | Self::Serialization(_)
        )
    }
}
