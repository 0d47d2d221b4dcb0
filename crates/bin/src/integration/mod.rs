//! Glue between the CLI and the library crates.
//!
//! Database location handling and terminal rendering of results.

pub(crate) mod report;
pub(crate) mod store_manager;
