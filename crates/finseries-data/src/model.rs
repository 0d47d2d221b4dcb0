//! Core record types shared across the workspace.

use crate::error::Result;
use derive_more::{Display, From, Into};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// OpenDART company identifier.
///
/// An eight digit code such as `00126380`; kept as text so leading zeros
/// survive round trips through storage.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CorpCode(String);

impl CorpCode {
    /// Create a new corp code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrow the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorpCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// A company entry from the corp-code catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Display name
    pub corp_name: String,
    /// OpenDART identifier
    pub corp_code: CorpCode,
}

/// A single balance-sheet fact for one company, account and fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Company display name
    pub corp_name: String,
    /// Company identifier
    pub corp_code: CorpCode,
    /// Account taxonomy code (e.g. `ifrs-full_Assets`); absent for legacy rows
    pub account_id: Option<String>,
    /// Account display name (e.g. `자산총계`)
    pub account_nm: String,
    /// Signed amount in KRW
    pub amount: Option<i64>,
    /// Fiscal year
    pub year: i32,
}

impl LineItem {
    /// Deduplication key: (account id, account name, year).
    pub fn dedup_key(&self) -> (Option<&str>, &str, i32) {
        (self.account_id.as_deref(), self.account_nm.as_str(), self.year)
    }
}

/// Parse an amount as reported by OpenDART or read back from storage.
///
/// Accepts plain integers, thousands separators and decimal notation
/// (truncated toward zero). Blank values, `-` and anything unparseable are
/// absent.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    if let Ok(value) = cleaned.parse::<i64>() {
        return Some(value);
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
        .map(|v| v.trunc() as i64)
}

/// Parse an optional raw amount field.
pub fn parse_optional_amount(raw: Option<&str>) -> Option<i64> {
    raw.and_then(parse_amount)
}

/// Treat a zero amount as "no data".
pub const fn nonzero_amount(amount: Option<i64>) -> Option<i64> {
    match amount {
        Some(0) => None,
        other => other,
    }
}

/// Build a long-form DataFrame from line items.
///
/// Columns: `corp_name`, `corp_code`, `account_id`, `account_nm`, `amount`,
/// `year`.
pub fn line_items_frame(items: &[LineItem]) -> Result<DataFrame> {
    let corp_names: Vec<&str> = items.iter().map(|i| i.corp_name.as_str()).collect();
    let corp_codes: Vec<&str> = items.iter().map(|i| i.corp_code.as_str()).collect();
    let account_ids: Vec<Option<&str>> = items.iter().map(|i| i.account_id.as_deref()).collect();
    let account_nms: Vec<&str> = items.iter().map(|i| i.account_nm.as_str()).collect();
    let amounts: Vec<Option<i64>> = items.iter().map(|i| i.amount).collect();
    let years: Vec<i32> = items.iter().map(|i| i.year).collect();

    let df = DataFrame::new(vec![
        Series::new("corp_name".into(), corp_names).into(),
        Series::new("corp_code".into(), corp_codes).into(),
        Series::new("account_id".into(), account_ids).into(),
        Series::new("account_nm".into(), account_nms).into(),
        Series::new("amount".into(), amounts).into(),
        Series::new("year".into(), years).into(),
    ])?;

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1234", Some(1234))]
    #[case("-5000", Some(-5000))]
    #[case("1,234,567", Some(1_234_567))]
    #[case(" 42 ", Some(42))]
    #[case("12.9", Some(12))]
    #[case("-12.9", Some(-12))]
    #[case("", None)]
    #[case("-", None)]
    #[case("n/a", None)]
    #[case("NaN", None)]
    fn test_parse_amount(#[case] raw: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_amount(raw), expected);
    }

    #[test]
    fn test_nonzero_amount() {
        assert_eq!(nonzero_amount(Some(0)), None);
        assert_eq!(nonzero_amount(Some(7)), Some(7));
        assert_eq!(nonzero_amount(None), None);
    }

    #[test]
    fn test_corp_code_display() {
        let code = CorpCode::new("00126380");
        assert_eq!(code.to_string(), "00126380");
        assert_eq!(code.as_str(), "00126380");
    }

    #[test]
    fn test_line_items_frame() {
        let items = vec![
            LineItem {
                corp_name: "삼성전자".to_string(),
                corp_code: CorpCode::new("00126380"),
                account_id: Some("ifrs-full_Assets".to_string()),
                account_nm: "자산총계".to_string(),
                amount: Some(100),
                year: 2023,
            },
            LineItem {
                corp_name: "삼성전자".to_string(),
                corp_code: CorpCode::new("00126380"),
                account_id: None,
                account_nm: "기타".to_string(),
                amount: None,
                year: 2023,
            },
        ];

        let df = line_items_frame(&items).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("account_id").unwrap().null_count(), 1);
        assert_eq!(df.column("amount").unwrap().null_count(), 1);
    }
}
