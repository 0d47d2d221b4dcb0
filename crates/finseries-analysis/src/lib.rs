#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finseries/finseries/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod comparison;
pub mod error;
pub mod format;
pub mod indicators;

pub use comparison::{
    ChartColumn, ChartSeries, ComparisonMerger, ComparisonRow, ComparisonTable, Selection,
    SelectionRows, chart_series, dedupe_selections, merge_selections,
};
pub use error::{AnalysisError, Result};
pub use format::{format_korean_amount, validate_year};
pub use indicators::{FinancialRatios, IndicatorCalculator, compute_ratios};
