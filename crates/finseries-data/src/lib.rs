#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finseries/finseries/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dart;
pub mod error;
pub mod model;
pub mod store;

pub use error::{DataError, Result};
pub use model::{Company, CorpCode, LineItem};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
