//! Cross-company, cross-year comparison tables.
//!
//! Each selection contributes one amount column. Tables are folded left to
//! right with full outer joins: on account id when both sides carry at least
//! one id, on account name otherwise. Rows keep left-side order with
//! right-only rows appended.

use crate::error::{AnalysisError, Result};
use finseries_data::model::{LineItem, nonzero_amount};
use finseries_data::store::StatementStore;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One (company, year) column of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Company display name
    pub corp_name: String,
    /// Fiscal year
    pub year: i32,
}

impl Selection {
    /// Create a selection.
    pub fn new(corp_name: impl Into<String>, year: i32) -> Self {
        Self {
            corp_name: corp_name.into(),
            year,
        }
    }

    /// Column label, `company(year)`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.corp_name, self.year)
    }
}

/// A selection together with its stored rows.
#[derive(Debug, Clone)]
pub struct SelectionRows {
    /// The selection
    pub selection: Selection,
    /// Line items stored for it
    pub rows: Vec<LineItem>,
}

/// One aligned account across all selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Account taxonomy code, when known on either side of the join
    pub account_id: Option<String>,
    /// Account display name
    pub account_nm: String,
    /// One amount per selection column
    pub amounts: Vec<Option<i64>>,
    /// Second amount minus first (two-way comparisons only)
    pub difference: Option<i64>,
    /// Difference relative to the first amount, in percent
    pub percent_change: Option<f64>,
}

/// Wide comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    /// Column labels, one per selection that yielded rows
    pub columns: Vec<String>,
    /// Aligned rows with at least two non-null amounts
    pub rows: Vec<ComparisonRow>,
    /// Whether `difference`/`percent_change` are populated
    pub has_deltas: bool,
}

impl ComparisonTable {
    /// Render as a DataFrame: `account_nm`, one column per selection, and
    /// `difference`/`percent_change` for two-way comparisons.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.columns.len() + 3);
        let names: Vec<&str> = self.rows.iter().map(|r| r.account_nm.as_str()).collect();
        columns.push(Series::new("account_nm".into(), names).into());

        for (slot, label) in self.columns.iter().enumerate() {
            let values: Vec<Option<i64>> = self
                .rows
                .iter()
                .map(|r| r.amounts.get(slot).copied().flatten())
                .collect();
            columns.push(Series::new(label.as_str().into(), values).into());
        }

        if self.has_deltas {
            let difference: Vec<Option<i64>> = self.rows.iter().map(|r| r.difference).collect();
            let percent: Vec<Option<f64>> = self.rows.iter().map(|r| r.percent_change).collect();
            columns.push(Series::new("difference".into(), difference).into());
            columns.push(Series::new("percent_change".into(), percent).into());
        }

        Ok(DataFrame::new(columns)?)
    }
}

/// Series for a grouped bar chart: account names plus one value array per
/// selection, missing values filled with zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Account names, one per bar group
    pub accounts: Vec<String>,
    /// One column per selection
    pub columns: Vec<ChartColumn>,
}

/// Values of one selection in a [`ChartSeries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartColumn {
    /// Selection label
    pub label: String,
    /// Amount per account, aligned with [`ChartSeries::accounts`]
    pub values: Vec<i64>,
}

/// Drop repeated selections, keeping the first occurrence.
///
/// Returns the unique selections and the labels of the dropped repeats.
pub fn dedupe_selections(selections: &[Selection]) -> (Vec<Selection>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(selections.len());
    let mut duplicates = Vec::new();

    for selection in selections {
        if seen.insert(selection) {
            unique.push(selection.clone());
        } else {
            duplicates.push(selection.label());
        }
    }

    (unique, duplicates)
}

#[derive(Debug, Clone)]
struct WorkRow {
    account_id: Option<String>,
    account_nm: String,
    amounts: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinKey {
    AccountId,
    AccountName,
}

impl JoinKey {
    fn choose(left: &[WorkRow], right: &[WorkRow]) -> Self {
        let has_id = |rows: &[WorkRow]| rows.iter().any(|r| r.account_id.is_some());
        if has_id(left) && has_id(right) {
            Self::AccountId
        } else {
            Self::AccountName
        }
    }

    fn of<'r>(&self, row: &'r WorkRow) -> Option<&'r str> {
        match self {
            Self::AccountId => row.account_id.as_deref(),
            Self::AccountName => Some(row.account_nm.as_str()),
        }
    }
}

/// Full outer join of `left` (with `width` amount slots) and single-slot
/// `right`. A left row pairs with the first unused right row sharing its
/// key; null keys never match.
fn outer_join(left: Vec<WorkRow>, right: Vec<WorkRow>, width: usize) -> Vec<WorkRow> {
    let key = JoinKey::choose(&left, &right);
    let mut used = vec![false; right.len()];
    let mut merged = Vec::with_capacity(left.len() + right.len());

    for mut row in left {
        let matched = key.of(&row).and_then(|k| {
            right
                .iter()
                .enumerate()
                .position(|(i, r)| !used[i] && key.of(r) == Some(k))
        });

        match matched {
            Some(i) => {
                used[i] = true;
                let other = &right[i];
                if row.account_id.is_none() {
                    row.account_id.clone_from(&other.account_id);
                }
                row.amounts.push(other.amounts.first().copied().flatten());
            }
            None => row.amounts.push(None),
        }
        merged.push(row);
    }

    for (i, row) in right.into_iter().enumerate() {
        if used[i] {
            continue;
        }
        let mut amounts = vec![None; width];
        amounts.push(row.amounts.first().copied().flatten());
        merged.push(WorkRow { amounts, ..row });
    }

    merged
}

fn work_rows(rows: &[LineItem], normalise_zero: bool) -> Vec<WorkRow> {
    rows.iter()
        .map(|item| WorkRow {
            account_id: item.account_id.clone(),
            account_nm: item.account_nm.clone(),
            amounts: vec![if normalise_zero {
                nonzero_amount(item.amount)
            } else {
                item.amount
            }],
        })
        .collect()
}

fn fold_joins(
    inputs: &[SelectionRows],
    normalise_zero: bool,
    names_only: bool,
) -> Option<(Vec<String>, Vec<WorkRow>)> {
    let mut present = inputs.iter().filter(|s| !s.rows.is_empty());
    let first = present.next()?;

    let mut columns = vec![first.selection.label()];
    let mut table = work_rows(&first.rows, normalise_zero);

    for next in present {
        let right = work_rows(&next.rows, normalise_zero);
        table = if names_only {
            outer_join_on_name(table, right, columns.len())
        } else {
            outer_join(table, right, columns.len())
        };
        columns.push(next.selection.label());
    }

    Some((columns, table))
}

fn outer_join_on_name(left: Vec<WorkRow>, right: Vec<WorkRow>, width: usize) -> Vec<WorkRow> {
    let strip = |rows: Vec<WorkRow>| -> Vec<WorkRow> {
        rows.into_iter()
            .map(|r| WorkRow {
                account_id: None,
                ..r
            })
            .collect()
    };
    outer_join(strip(left), strip(right), width)
}

/// Merge pre-fetched selections into a comparison table.
///
/// Returns `None` when no selection has rows or no account is reported by
/// at least two selections.
pub fn merge_selections(inputs: &[SelectionRows]) -> Option<ComparisonTable> {
    let (columns, table) = fold_joins(inputs, true, false)?;

    // Deltas follow the request, not the columns that happened to have rows
    let has_deltas = inputs.len() == 2 && columns.len() == 2;

    let rows: Vec<ComparisonRow> = table
        .into_iter()
        .filter(|r| r.amounts.iter().filter(|a| a.is_some()).count() >= 2)
        .map(|r| {
            let (difference, percent_change) = if has_deltas {
                deltas(r.amounts[0], r.amounts[1])
            } else {
                (None, None)
            };
            ComparisonRow {
                account_id: r.account_id,
                account_nm: r.account_nm,
                amounts: r.amounts,
                difference,
                percent_change,
            }
        })
        .collect();

    if rows.is_empty() {
        return None;
    }

    Some(ComparisonTable {
        columns,
        rows,
        has_deltas,
    })
}

fn deltas(base: Option<i64>, other: Option<i64>) -> (Option<i64>, Option<f64>) {
    let (Some(base), Some(other)) = (base, other) else {
        return (None, None);
    };
    let difference = other.checked_sub(base);
    let percent = if base == 0 {
        None
    } else {
        Some((other as f64 - base as f64) / base as f64 * 100.0)
    };
    (difference, percent)
}

/// Build chart series from pre-fetched selections, joining on account name.
///
/// Returns `None` when no selection has rows.
pub fn chart_series(inputs: &[SelectionRows]) -> Option<ChartSeries> {
    let (labels, table) = fold_joins(inputs, false, true)?;

    let accounts = table.iter().map(|r| r.account_nm.clone()).collect();
    let columns = labels
        .into_iter()
        .enumerate()
        .map(|(slot, label)| ChartColumn {
            label,
            values: table
                .iter()
                .map(|r| r.amounts.get(slot).copied().flatten().unwrap_or(0))
                .collect(),
        })
        .collect();

    Some(ChartSeries { accounts, columns })
}

/// Store-backed comparison builder.
#[derive(Debug)]
pub struct ComparisonMerger<'a, S> {
    store: &'a S,
}

impl<'a, S: StatementStore> ComparisonMerger<'a, S> {
    /// Create a merger reading from `store`.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn fetch(&self, selections: &[Selection]) -> Result<Vec<SelectionRows>> {
        if selections.is_empty() {
            return Err(AnalysisError::EmptySelection);
        }

        selections
            .iter()
            .map(|selection| {
                let rows = self
                    .store
                    .rows_for_company_year(&selection.corp_name, selection.year)?;
                if rows.is_empty() {
                    tracing::debug!(selection = %selection, "no stored rows for selection");
                }
                Ok(SelectionRows {
                    selection: selection.clone(),
                    rows,
                })
            })
            .collect()
    }

    /// Build the comparison table for `selections`.
    pub fn merge(&self, selections: &[Selection]) -> Result<Option<ComparisonTable>> {
        Ok(merge_selections(&self.fetch(selections)?))
    }

    /// Build chart series for `selections`.
    pub fn chart_series(&self, selections: &[Selection]) -> Result<Option<ChartSeries>> {
        Ok(chart_series(&self.fetch(selections)?))
    }
}
