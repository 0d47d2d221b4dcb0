//! Training data: stored line items pivoted to (company, year) rows.

use crate::error::{ForecastError, Result};
use finseries_data::model::{LineItem, line_items_frame};
use polars::prelude::*;
use std::collections::HashMap;

/// Feature accounts, in model column order.
pub const FEATURE_ACCOUNT_IDS: [&str; 14] = [
    "ifrs-full_CashAndCashEquivalents",
    "ifrs-full_Inventories",
    "ifrs-full_PropertyPlantAndEquipment",
    "ifrs-full_IntangibleAssetsAndGoodwill",
    "ifrs-full_CurrentTradeReceivables",
    "ifrs-full_OtherCurrentAssets",
    "ifrs-full_LongtermBorrowings",
    "ifrs-full_CurrentProvisions",
    "ifrs-full_OtherCurrentLiabilities",
    "ifrs-full_DeferredTaxLiabilities",
    "ifrs-full_IssuedCapital",
    "ifrs-full_RetainedEarnings",
    "ifrs-full_SharePremium",
    "ifrs-full_NoncontrollingInterests",
];

/// Target accounts: total assets, total equity, total liabilities.
pub const TARGET_ACCOUNT_IDS: [&str; 3] = [
    "ifrs-full_Assets",
    "ifrs-full_Equity",
    "ifrs-full_Liabilities",
];

/// Display names of the targets, aligned with [`TARGET_ACCOUNT_IDS`].
pub const TARGET_NAMES: [&str; 3] = ["자산총계", "자본총계", "부채총계"];

/// One (company, year) row of a pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    /// Company display name
    pub corp_name: String,
    /// Fiscal year
    pub year: i32,
    /// One value per pivot column; `None` where the account was not reported
    pub values: Vec<Option<f64>>,
}

/// Wide table of summed amounts, one column per account id that occurs in
/// the data. Rows are sorted by company name, then year.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountPivot {
    /// Column account ids, a subset of the requested ids in their order
    pub account_ids: Vec<String>,
    /// Rows
    pub rows: Vec<PivotRow>,
}

impl AccountPivot {
    /// Pivot a long frame with `corp_name`, `year`, `account_id`, `amount`
    /// columns, keeping only `account_ids`. Amounts are summed per cell;
    /// null amounts count as zero.
    pub fn from_frame(frame: DataFrame, account_ids: &[&str]) -> Result<Self> {
        let wanted = account_ids
            .iter()
            .fold(lit(false), |acc, id| acc.or(col("account_id").eq(lit(*id))));

        let grouped = frame
            .lazy()
            .filter(wanted)
            .group_by([col("corp_name"), col("year"), col("account_id")])
            .agg([col("amount").cast(DataType::Float64).sum().alias("amount")])
            .sort(["corp_name", "year"], Default::default())
            .collect()?;

        let names = grouped.column("corp_name")?.str()?;
        let years = grouped.column("year")?.i32()?;
        let ids = grouped.column("account_id")?.str()?;
        let amounts = grouped.column("amount")?.f64()?;

        let present: Vec<&str> = account_ids
            .iter()
            .copied()
            .filter(|id| ids.into_iter().any(|v| v == Some(*id)))
            .collect();
        let slot: HashMap<&str, usize> =
            present.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut rows: Vec<PivotRow> = Vec::new();
        let mut row_index: HashMap<(String, i32), usize> = HashMap::new();

        for i in 0..grouped.height() {
            let (Some(name), Some(year), Some(id)) = (names.get(i), years.get(i), ids.get(i)) else {
                continue;
            };
            let Some(&column) = slot.get(id) else {
                continue;
            };

            let index = *row_index.entry((name.to_string(), year)).or_insert_with(|| {
                rows.push(PivotRow {
                    corp_name: name.to_string(),
                    year,
                    values: vec![None; present.len()],
                });
                rows.len() - 1
            });
            rows[index].values[column] = Some(amounts.get(i).unwrap_or(0.0));
        }

        rows.sort_by(|a, b| a.corp_name.cmp(&b.corp_name).then(a.year.cmp(&b.year)));

        Ok(Self {
            account_ids: present.into_iter().map(str::to_string).collect(),
            rows,
        })
    }

    /// Replace every missing cell with `value`.
    pub fn fill_missing(mut self, value: f64) -> Self {
        for row in &mut self.rows {
            for cell in &mut row.values {
                cell.get_or_insert(value);
            }
        }
        self
    }

    /// Position of an account column.
    pub fn column_index(&self, account_id: &str) -> Option<usize> {
        self.account_ids.iter().position(|id| id == account_id)
    }

    /// Requested ids that have no column.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|id| self.column_index(id).is_none())
            .map(|id| (*id).to_string())
            .collect()
    }

    /// Rows of one company, oldest year first.
    pub fn rows_for(&self, corp_name: &str) -> Vec<&PivotRow> {
        let mut rows: Vec<&PivotRow> =
            self.rows.iter().filter(|r| r.corp_name == corp_name).collect();
        rows.sort_by_key(|r| r.year);
        rows
    }

    /// Whether the pivot has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Feature and target pivots built from the stored line items.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    /// Feature accounts, missing cells filled with zero
    pub features: AccountPivot,
    /// Target accounts, missing cells left empty
    pub targets: AccountPivot,
}

/// Build the training pivots from every stored line item.
///
/// # Errors
/// Returns `InsufficientData` when nothing is stored, no row carries an
/// account id, or either the target or the feature accounts are absent.
pub fn prepare(items: &[LineItem]) -> Result<TrainingData> {
    if items.is_empty() {
        return Err(ForecastError::InsufficientData(
            "no stored statements; ingest a company first".to_string(),
        ));
    }

    let frame = line_items_frame(items)
        .map_err(ForecastError::Data)?
        .lazy()
        .filter(col("account_id").is_not_null())
        .collect()?;

    if frame.height() == 0 {
        return Err(ForecastError::InsufficientData(
            "no stored rows carry an account id".to_string(),
        ));
    }

    let targets = AccountPivot::from_frame(frame.clone(), &TARGET_ACCOUNT_IDS)?;
    if targets.is_empty() {
        return Err(ForecastError::InsufficientData(
            "no target account rows (assets, equity, liabilities)".to_string(),
        ));
    }

    let features = AccountPivot::from_frame(frame, &FEATURE_ACCOUNT_IDS)?;
    if features.is_empty() {
        return Err(ForecastError::InsufficientData(
            "no feature account rows".to_string(),
        ));
    }

    tracing::debug!(
        feature_rows = features.rows.len(),
        target_rows = targets.rows.len(),
        "training pivots built"
    );

    Ok(TrainingData {
        features: features.fill_missing(0.0),
        targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use finseries_data::model::CorpCode;

    fn item(corp: &str, id: Option<&str>, amount: Option<i64>, year: i32) -> LineItem {
        LineItem {
            corp_name: corp.to_string(),
            corp_code: CorpCode::new("00000001"),
            account_id: id.map(str::to_string),
            account_nm: id.unwrap_or("이름없음").to_string(),
            amount,
            year,
        }
    }

    #[test]
    fn test_pivot_sums_and_fills() {
        let items = vec![
            item("나", Some("ifrs-full_Inventories"), Some(10), 2023),
            item("나", Some("ifrs-full_Inventories"), Some(5), 2023),
            item("나", Some("ifrs-full_IssuedCapital"), None, 2023),
            item("가", Some("ifrs-full_CashAndCashEquivalents"), Some(7), 2022),
            item("가", Some("ifrs-full_Assets"), Some(100), 2022),
            item("나", Some("ifrs-full_Assets"), Some(200), 2023),
            item("나", None, Some(1), 2023),
        ];

        let data = prepare(&items).unwrap();
        let features = &data.features;
        assert_eq!(
            features.account_ids,
            vec![
                "ifrs-full_CashAndCashEquivalents",
                "ifrs-full_Inventories",
                "ifrs-full_IssuedCapital"
            ]
        );
        assert_eq!(features.rows.len(), 2);
        assert_eq!(features.rows[0].corp_name, "가");
        assert_eq!(features.rows[0].values, vec![Some(7.0), Some(0.0), Some(0.0)]);
        assert_eq!(features.rows[1].values, vec![Some(0.0), Some(15.0), Some(0.0)]);

        assert_eq!(data.targets.account_ids, vec!["ifrs-full_Assets"]);
        assert_eq!(
            data.targets.missing_columns(&TARGET_ACCOUNT_IDS),
            vec!["ifrs-full_Equity", "ifrs-full_Liabilities"]
        );
    }

    #[test]
    fn test_prepare_empty() {
        assert!(matches!(prepare(&[]), Err(ForecastError::InsufficientData(_))));
    }

    #[test]
    fn test_prepare_without_account_ids() {
        let items = vec![item("가", None, Some(1), 2023)];
        assert!(matches!(prepare(&items), Err(ForecastError::InsufficientData(_))));
    }

    #[test]
    fn test_prepare_without_targets() {
        let items = vec![item("가", Some("ifrs-full_Inventories"), Some(1), 2023)];
        assert!(matches!(prepare(&items), Err(ForecastError::InsufficientData(_))));
    }

    #[test]
    fn test_prepare_without_features() {
        let items = vec![item("가", Some("ifrs-full_Assets"), Some(1), 2023)];
        assert!(matches!(prepare(&items), Err(ForecastError::InsufficientData(_))));
    }

    #[test]
    fn test_rows_for_sorted_by_year() {
        let items = vec![
            item("가", Some("ifrs-full_Inventories"), Some(3), 2023),
            item("가", Some("ifrs-full_Inventories"), Some(1), 2021),
            item("가", Some("ifrs-full_Assets"), Some(1), 2021),
        ];
        let data = prepare(&items).unwrap();
        let years: Vec<i32> = data.features.rows_for("가").iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2021, 2023]);
        assert!(data.features.rows_for("없음").is_empty());
    }
}
