//! Persistence of stitched line items.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::{CorpCode, LineItem};

/// Storage operations needed by ingestion and the analytical consumers.
pub trait StatementStore {
    /// Most recent fiscal year stored for a company.
    fn latest_year_for_company(&self, corp_code: &CorpCode) -> Result<Option<i32>>;

    /// Remove every row of a company, returning the number removed.
    fn delete_all_for_company(&self, corp_code: &CorpCode) -> Result<usize>;

    /// Append rows, preserving their order.
    fn insert_rows(&self, rows: &[LineItem]) -> Result<usize>;

    /// Rows of one company and year, in insertion order.
    fn rows_for_company_year(&self, corp_name: &str, year: i32) -> Result<Vec<LineItem>>;

    /// Every stored row, in insertion order.
    fn all_rows(&self) -> Result<Vec<LineItem>>;

    /// Distinct company names, sorted.
    fn companies(&self) -> Result<Vec<String>>;

    /// Distinct years stored for a company, newest first.
    fn years_for_company(&self, corp_name: &str) -> Result<Vec<i32>>;
}
