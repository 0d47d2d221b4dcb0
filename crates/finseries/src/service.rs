//! Ingestion and stored-statement views.
//!
//! Ingest resolves a company name through the corp directory, fetches and
//! stitches its ten-year series, then writes it with an upsert policy keyed
//! on the latest fiscal year:
//!
//! - nothing stored: insert
//! - stored latest year equals the fetched latest year: skip
//! - stored latest year differs: delete the company's rows, then insert

use crate::error::Result;
use chrono::Datelike;
use finseries_data::DataError;
use finseries_data::dart::{AnnualSeries, CorpDirectory, StatementSource, fetch_annual_series};
use finseries_data::model::{Company, LineItem};
use finseries_data::store::StatementStore;
use std::fmt;

/// What an ingest did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The company was new to the store.
    Inserted {
        /// Company that was ingested
        corp_name: String,
        /// Rows written
        rows: usize,
        /// Latest fiscal year of the series
        latest_year: i32,
    },

    /// Older rows were replaced by a newer series.
    Updated {
        /// Company that was ingested
        corp_name: String,
        /// Rows written
        rows: usize,
        /// Rows deleted before writing
        replaced: usize,
        /// Latest year that was stored before
        previous_year: i32,
        /// Latest fiscal year of the series
        latest_year: i32,
    },

    /// The store already holds the same latest year; nothing was written.
    AlreadyRegistered {
        /// Company that was ingested
        corp_name: String,
        /// Latest fiscal year already stored
        latest_year: i32,
    },
}

impl IngestOutcome {
    /// Rows written by the ingest.
    pub const fn rows_written(&self) -> usize {
        match self {
            Self::Inserted { rows, .. } | Self::Updated { rows, .. } => *rows,
            Self::AlreadyRegistered { .. } => 0,
        }
    }
}

impl fmt::Display for IngestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted {
                corp_name,
                rows,
                latest_year,
            } => write!(f, "{corp_name}: stored {rows} rows through {latest_year}"),
            Self::Updated {
                corp_name,
                rows,
                previous_year,
                latest_year,
                ..
            } => write!(
                f,
                "{corp_name}: updated {previous_year} -> {latest_year}, stored {rows} rows"
            ),
            Self::AlreadyRegistered {
                corp_name,
                latest_year,
            } => write!(f, "{corp_name}: already registered through {latest_year}"),
        }
    }
}

/// The current calendar year in local time.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Write a fetched series according to the upsert policy.
///
/// # Errors
/// Returns `DataError::NoData` for an empty series and propagates store
/// failures.
pub fn prepare_for_insert<St: StatementStore>(
    store: &St,
    company: &Company,
    series: AnnualSeries,
) -> Result<IngestOutcome> {
    let Some(latest_year) = series.latest_year() else {
        return Err(DataError::NoData {
            corp: company.corp_name.clone(),
            reason: "stitched series is empty".to_string(),
        }
        .into());
    };

    let stored = store.latest_year_for_company(&company.corp_code)?;
    let corp_name = company.corp_name.clone();

    let outcome = match stored {
        Some(previous_year) if previous_year == latest_year => {
            tracing::info!(
                corp_code = %company.corp_code,
                latest_year,
                "already registered, skipping"
            );
            IngestOutcome::AlreadyRegistered {
                corp_name,
                latest_year,
            }
        }
        Some(previous_year) => {
            let replaced = store.delete_all_for_company(&company.corp_code)?;
            let rows = store.insert_rows(&series.into_items())?;
            tracing::info!(
                corp_code = %company.corp_code,
                previous_year,
                latest_year,
                replaced,
                rows,
                "replaced stored series"
            );
            IngestOutcome::Updated {
                corp_name,
                rows,
                replaced,
                previous_year,
                latest_year,
            }
        }
        None => {
            let rows = store.insert_rows(&series.into_items())?;
            tracing::info!(corp_code = %company.corp_code, latest_year, rows, "stored new series");
            IngestOutcome::Inserted {
                corp_name,
                rows,
                latest_year,
            }
        }
    };

    Ok(outcome)
}

/// Resolve, fetch, stitch and store one company.
///
/// # Errors
/// - `DataError::NotReady` while the directory is loading
/// - `DataError::NotFound` for an unknown company name
/// - `DataError::NoData` when no window yields rows
pub async fn ingest<S, St>(
    directory: &CorpDirectory,
    source: &S,
    store: &St,
    corp_name: &str,
    current_year: i32,
) -> Result<IngestOutcome>
where
    S: StatementSource,
    St: StatementStore,
{
    let corp_name = corp_name.trim();
    let corp_code = directory
        .resolve(corp_name)?
        .ok_or_else(|| DataError::NotFound(format!("company '{corp_name}'")))?;

    let company = Company {
        corp_name: corp_name.to_string(),
        corp_code,
    };

    let series = fetch_annual_series(source, &company, current_year).await?;
    tracing::debug!(
        corp_code = %company.corp_code,
        start_year = series.start_year,
        rows = series.len(),
        "series stitched"
    );

    prepare_for_insert(store, &company, series)
}

/// Stored rows of one company and year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementView {
    /// Company display name
    pub corp_name: String,
    /// Year shown
    pub year: i32,
    /// Every stored year of the company, newest first
    pub years: Vec<i32>,
    /// Rows of `year`, in stored order
    pub rows: Vec<LineItem>,
}

/// Load the stored rows for a company, defaulting to its latest year.
///
/// # Errors
/// Returns `DataError::NotFound` when the company has no stored rows.
pub fn view<St: StatementStore>(
    store: &St,
    corp_name: &str,
    year: Option<i32>,
) -> Result<StatementView> {
    let years = store.years_for_company(corp_name)?;
    let Some(&latest) = years.first() else {
        return Err(DataError::NotFound(format!("no stored statements for '{corp_name}'")).into());
    };

    let year = year.unwrap_or(latest);
    let rows = store.rows_for_company_year(corp_name, year)?;

    Ok(StatementView {
        corp_name: corp_name.to_string(),
        year,
        years,
        rows,
    })
}
