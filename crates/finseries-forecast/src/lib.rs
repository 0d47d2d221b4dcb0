#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finseries/finseries/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dataset;
pub mod error;
pub mod linalg;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod projection;
pub mod split;

pub use dataset::{
    AccountPivot, FEATURE_ACCOUNT_IDS, PivotRow, TARGET_ACCOUNT_IDS, TARGET_NAMES, TrainingData,
    prepare,
};
pub use error::{ForecastError, Result};
pub use metrics::{TargetMetrics, ValidationReport};
pub use model::LinearModel;
pub use pipeline::{ForecastOutcome, ForecastPipeline, Prediction, TrainedForecast, predict, train};
