//! OpenDART (Korean Financial Supervisory Service) integration.
//!
//! Covers the corp-code catalog, the per-year balance-sheet endpoint and the
//! stitching of overlapping report windows into an annual series.

pub mod client;
pub mod corp_code;
pub mod stitch;

pub use client::{DART_BASE_URL, DartClient, RawStatementRow, StatementSource};
pub use corp_code::{CorpDirectory, parse_catalog_archive, parse_catalog_xml};
pub use stitch::{
    AnnualSeries, StatementWindow, fetch_annual_series, fetch_windows, stitch, window_anchors,
};
