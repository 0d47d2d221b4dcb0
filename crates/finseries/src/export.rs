//! Export of stored line items and analysis results.
//!
//! CSV output has one record per line item; JSON output is the serde form
//! of the same records.

use finseries_analysis::FinancialRatios;
use finseries_data::model::LineItem;
use finseries_data::store::StatementStore;
use finseries_forecast::Prediction;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn json_string<T: Serialize + ?Sized>(
    value: &T,
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(serde_json::to_string(value)?),
    }
}

impl Exporter for [LineItem] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self),
            ExportFormat::Json | ExportFormat::PrettyJson => json_string(self, format),
        }
    }
}

impl Exporter for Vec<LineItem> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        self.as_slice().export_to_string(format)
    }
}

/// One named metric, flattened for CSV.
#[derive(Debug, Serialize)]
struct MetricRecord<'a> {
    name: &'a str,
    value: Option<f64>,
}

impl Exporter for FinancialRatios {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(
                self.entries()
                    .into_iter()
                    .map(|(name, value)| MetricRecord { name, value }),
            ),
            ExportFormat::Json | ExportFormat::PrettyJson => json_string(self, format),
        }
    }
}

impl Exporter for Prediction {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string([self]),
            ExportFormat::Json | ExportFormat::PrettyJson => json_string(self, format),
        }
    }
}

/// Every stored line item, in stored order.
///
/// # Errors
/// Propagates store failures.
pub fn stored_rows<St: StatementStore>(store: &St) -> crate::Result<Vec<LineItem>> {
    let rows = store.all_rows()?;
    tracing::debug!(rows = rows.len(), "loaded rows for export");
    Ok(rows)
}
