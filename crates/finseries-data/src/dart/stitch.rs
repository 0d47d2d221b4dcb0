//! Stitching of overlapping annual-report windows into a ten-year series.
//!
//! Each annual report carries three amount columns: the current period
//! (당기), the prior period (전기) and the period before that (전전기).
//! Reports are requested every third year walking backward, and their
//! columns are spread out into one row per fiscal year.

use crate::dart::client::{RawStatementRow, SJ_DIV_BALANCE_SHEET, StatementSource};
use crate::error::{DataError, Result};
use crate::model::{Company, LineItem, parse_optional_amount};
use std::collections::{HashMap, HashSet};

/// Reports anchored at or before this year carry no usable prior column.
pub const PRIOR_PERIOD_CUTOFF: i32 = 2015;

/// Reports anchored at or before this year carry no usable prior-prior column.
pub const PRIOR_PRIOR_PERIOD_CUTOFF: i32 = 2016;

/// Distance between consecutive window anchors.
pub const WINDOW_STRIDE: i32 = 3;

/// Years covered below the start year (ten years in total).
pub const SERIES_SPAN: i32 = 9;

/// Offsets from the current year tried as the series start year.
const START_YEAR_OFFSETS: [i32; 2] = [1, 2];

/// Raw rows of one annual report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementWindow {
    /// Business year the report was filed for
    pub anchor_year: i32,
    /// Rows returned for that report
    pub rows: Vec<RawStatementRow>,
}

/// A company's balance sheet spread over consecutive fiscal years.
///
/// Items are sorted by year descending and, within a year, by the account
/// order of the start year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnualSeries {
    /// Most recent year the series was built for
    pub start_year: i32,
    /// Stitched line items
    pub items: Vec<LineItem>,
}

impl AnnualSeries {
    /// Number of line items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the series holds no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recent year present.
    pub fn latest_year(&self) -> Option<i32> {
        self.items.iter().map(|i| i.year).max()
    }

    /// Distinct years, newest first.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.items.iter().map(|i| i.year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        years
    }

    /// Whether any item falls in `year`.
    pub fn has_year(&self, year: i32) -> bool {
        self.items.iter().any(|i| i.year == year)
    }

    /// Consume the series, returning its items.
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }
}

/// Anchor years for a series ending at `start_year`.
///
/// Walks back in steps of [`WINDOW_STRIDE`] while the anchor stays within
/// the span, then adds the span's last year if the stride overshot it.
pub fn window_anchors(start_year: i32) -> Vec<i32> {
    let end_year = start_year - SERIES_SPAN;
    let mut anchors: Vec<i32> = (end_year..=start_year)
        .rev()
        .step_by(WINDOW_STRIDE as usize)
        .collect();

    if anchors.last().is_some_and(|&last| last > end_year) {
        anchors.push(end_year);
    }
    anchors
}

fn is_balance_sheet(row: &RawStatementRow) -> bool {
    row.sj_div
        .as_deref()
        .is_none_or(|div| div == SJ_DIV_BALANCE_SHEET)
}

fn line_item(
    company: &Company,
    row: &RawStatementRow,
    raw_amount: Option<&String>,
    year: i32,
) -> Option<LineItem> {
    let raw_amount = raw_amount?;
    let account_nm = row.account_nm.as_deref()?.trim();
    if account_nm.is_empty() {
        return None;
    }

    Some(LineItem {
        corp_name: company.corp_name.clone(),
        corp_code: company.corp_code.clone(),
        account_id: row
            .account_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        account_nm: account_nm.to_string(),
        amount: parse_optional_amount(Some(raw_amount)),
        year,
    })
}

/// Spread one window's columns into per-year line items.
///
/// All current-period rows come first, then prior, then prior-prior.
fn expand_window(company: &Company, window: &StatementWindow) -> Vec<LineItem> {
    let year = window.anchor_year;
    let rows: Vec<&RawStatementRow> = window.rows.iter().filter(|r| is_balance_sheet(r)).collect();
    let mut items = Vec::with_capacity(rows.len() * 3);

    items.extend(
        rows.iter()
            .filter_map(|r| line_item(company, r, r.thstrm_amount.as_ref(), year)),
    );

    if year > PRIOR_PERIOD_CUTOFF {
        items.extend(
            rows.iter()
                .filter_map(|r| line_item(company, r, r.frmtrm_amount.as_ref(), year - 1)),
        );
    }

    if year > PRIOR_PRIOR_PERIOD_CUTOFF {
        items.extend(
            rows.iter()
                .filter_map(|r| line_item(company, r, r.bfefrmtrm_amount.as_ref(), year - 2)),
        );
    }

    items
}

/// Merge windows into a deduplicated, ordered series.
///
/// # Errors
/// Returns `DataError::NoData` if no line item survives.
pub fn stitch(
    company: &Company,
    windows: &[StatementWindow],
    start_year: i32,
) -> Result<AnnualSeries> {
    let end_year = start_year - SERIES_SPAN;

    let mut seen = HashSet::new();
    let mut items: Vec<LineItem> = windows
        .iter()
        .flat_map(|w| expand_window(company, w))
        .filter(|item| item.year >= end_year && item.year <= start_year)
        .filter(|item| {
            seen.insert((
                item.account_id.clone(),
                item.account_nm.clone(),
                item.year,
            ))
        })
        .collect();

    if items.is_empty() {
        return Err(DataError::NoData {
            corp: company.corp_code.to_string(),
            reason: "no statement window returned balance-sheet rows".to_string(),
        });
    }

    let mut account_order: HashMap<String, usize> = HashMap::new();
    for item in items.iter().filter(|i| i.year == start_year) {
        let next = account_order.len();
        account_order.entry(item.account_nm.clone()).or_insert(next);
    }

    // Stable sort keeps appearance order for unseen accounts
    items.sort_by_key(|item| {
        (
            std::cmp::Reverse(item.year),
            account_order
                .get(&item.account_nm)
                .copied()
                .unwrap_or(usize::MAX),
        )
    });

    Ok(AnnualSeries { start_year, items })
}

/// Fetch every window for a series ending at `start_year`.
///
/// Failed windows are logged and skipped.
pub async fn fetch_windows<S: StatementSource>(
    source: &S,
    company: &Company,
    start_year: i32,
) -> Vec<StatementWindow> {
    let anchors = window_anchors(start_year);
    let mut windows = Vec::with_capacity(anchors.len());

    for anchor_year in anchors {
        match source.fetch_window(&company.corp_code, anchor_year).await {
            Ok(rows) => {
                tracing::debug!(
                    corp_code = %company.corp_code,
                    year = anchor_year,
                    rows = rows.len(),
                    "statement window fetched"
                );
                windows.push(StatementWindow { anchor_year, rows });
            }
            Err(e) => {
                tracing::warn!(
                    corp_code = %company.corp_code,
                    year = anchor_year,
                    error = %e,
                    "statement window skipped"
                );
            }
        }
    }

    windows
}

/// Fetch and stitch the ten-year series for a company.
///
/// Starts from the year before `current_year`; when that year's report is
/// not yet filed the series is rebuilt one year earlier.
///
/// # Errors
/// Returns `DataError::NoData` if neither start year yields any rows.
pub async fn fetch_annual_series<S: StatementSource>(
    source: &S,
    company: &Company,
    current_year: i32,
) -> Result<AnnualSeries> {
    let mut fallback: Option<AnnualSeries> = None;

    for offset in START_YEAR_OFFSETS {
        let start_year = current_year - offset;
        let windows = fetch_windows(source, company, start_year).await;

        match stitch(company, &windows, start_year) {
            Ok(series) if series.has_year(start_year) => return Ok(series),
            Ok(series) => {
                tracing::info!(
                    corp_code = %company.corp_code,
                    start_year,
                    "no rows for start year, retrying one year earlier"
                );
                fallback = Some(series);
            }
            Err(e) => {
                tracing::info!(corp_code = %company.corp_code, start_year, error = %e, "no series");
            }
        }
    }

    fallback.ok_or_else(|| DataError::NoData {
        corp: company.corp_name.clone(),
        reason: "no financial data available".to_string(),
    })
}
