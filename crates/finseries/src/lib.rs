#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finseries/finseries/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod export;
pub mod service;

// Re-export main types from sub-crates
pub use finseries_analysis as analysis;
pub use finseries_data as data;
pub use finseries_forecast as forecast;

pub use error::{Result, ServiceError};
pub use export::{ExportError, ExportFormat, Exporter};
pub use service::{IngestOutcome, StatementView, current_year, ingest, prepare_for_insert, view};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
