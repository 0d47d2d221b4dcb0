//! Financial ratios from one year of balance-sheet line items.
//!
//! Accounts are looked up by display name. A zero amount counts as missing,
//! so any ratio with a missing numerator or denominator is `None`. Inventory
//! is the one exception: the quick ratio treats missing inventory as zero.

use crate::error::Result;
use finseries_data::model::{LineItem, nonzero_amount};
use finseries_data::store::StatementStore;
use serde::{Deserialize, Serialize};

/// 유동자산
pub const CURRENT_ASSETS: &str = "유동자산";
/// 유동부채
pub const CURRENT_LIABILITIES: &str = "유동부채";
/// 부채총계
pub const TOTAL_LIABILITIES: &str = "부채총계";
/// 자본총계
pub const TOTAL_EQUITY: &str = "자본총계";
/// 자산총계
pub const TOTAL_ASSETS: &str = "자산총계";
/// 재고자산
pub const INVENTORIES: &str = "재고자산";

/// Ratios in percent, rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRatios {
    /// Current assets / current liabilities
    pub current_ratio: Option<f64>,
    /// Total liabilities / total assets
    pub debt_ratio: Option<f64>,
    /// Total equity / total assets
    pub equity_ratio: Option<f64>,
    /// (Current assets - inventory) / current liabilities
    pub quick_ratio: Option<f64>,
    /// Total liabilities / total equity
    pub debt_to_equity: Option<f64>,
}

impl FinancialRatios {
    /// Ratios paired with their keys, in display order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("current_ratio", self.current_ratio),
            ("debt_ratio", self.debt_ratio),
            ("equity_ratio", self.equity_ratio),
            ("quick_ratio", self.quick_ratio),
            ("debt_to_equity", self.debt_to_equity),
        ]
    }
}

fn amount_of(rows: &[LineItem], account_nm: &str) -> Option<i64> {
    rows.iter()
        .find(|r| r.account_nm == account_nm)
        .and_then(|r| nonzero_amount(r.amount))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent(numerator: Option<i64>, denominator: Option<i64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    Some(round2(n as f64 / d as f64 * 100.0))
}

/// Compute ratios from one company-year of line items. Never fails.
pub fn compute_ratios(rows: &[LineItem]) -> FinancialRatios {
    let current_assets = amount_of(rows, CURRENT_ASSETS);
    let current_liabilities = amount_of(rows, CURRENT_LIABILITIES);
    let total_liabilities = amount_of(rows, TOTAL_LIABILITIES);
    let total_equity = amount_of(rows, TOTAL_EQUITY);
    let total_assets = amount_of(rows, TOTAL_ASSETS);
    let inventories = amount_of(rows, INVENTORIES).unwrap_or(0);

    FinancialRatios {
        current_ratio: percent(current_assets, current_liabilities),
        debt_ratio: percent(total_liabilities, total_assets),
        equity_ratio: percent(total_equity, total_assets),
        quick_ratio: percent(
            current_assets.map(|ca| ca.saturating_sub(inventories)),
            current_liabilities,
        ),
        debt_to_equity: percent(total_liabilities, total_equity),
    }
}

/// Store-backed ratio calculator.
#[derive(Debug)]
pub struct IndicatorCalculator<'a, S> {
    store: &'a S,
}

impl<'a, S: StatementStore> IndicatorCalculator<'a, S> {
    /// Create a calculator reading from `store`.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Ratios for a company and year; all `None` when nothing is stored.
    pub fn compute(&self, corp_name: &str, year: i32) -> Result<FinancialRatios> {
        let rows = self.store.rows_for_company_year(corp_name, year)?;
        if rows.is_empty() {
            tracing::debug!(corp_name, year, "no rows for indicators");
        }
        Ok(compute_ratios(&rows))
    }
}
