//! Ingest, view and export against a canned statement source.

use finseries::data::dart::{CorpDirectory, RawStatementRow, StatementSource};
use finseries::data::model::{Company, CorpCode};
use finseries::data::store::{SqliteStore, StatementStore};
use finseries::data::{DataError, Result};
use finseries::export::stored_rows;
use finseries::{ExportFormat, Exporter, IngestOutcome, ServiceError, ingest, view};
use tempfile::TempDir;

struct CannedSource {
    windows: Vec<(i32, Vec<RawStatementRow>)>,
}

impl StatementSource for CannedSource {
    async fn fetch_window(
        &self,
        _corp_code: &CorpCode,
        anchor_year: i32,
    ) -> Result<Vec<RawStatementRow>> {
        self.windows
            .iter()
            .find(|(year, _)| *year == anchor_year)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| DataError::DartApi {
                status: "013".to_string(),
                message: "no data".to_string(),
            })
    }
}

fn row(id: &str, name: &str, amounts: [&str; 3]) -> RawStatementRow {
    RawStatementRow {
        sj_div: Some("BS".to_string()),
        account_id: Some(id.to_string()),
        account_nm: Some(name.to_string()),
        thstrm_amount: Some(amounts[0].to_string()),
        frmtrm_amount: Some(amounts[1].to_string()),
        bfefrmtrm_amount: Some(amounts[2].to_string()),
    }
}

fn window(anchor_year: i32, scale: i64) -> (i32, Vec<RawStatementRow>) {
    let amounts = |base: i64| {
        [
            (base * scale).to_string(),
            (base * scale - 10).to_string(),
            (base * scale - 20).to_string(),
        ]
    };
    let a = amounts(100);
    let l = amounts(40);
    (
        anchor_year,
        vec![
            row("ifrs-full_Assets", "자산총계", [&a[0], &a[1], &a[2]]),
            row("ifrs-full_Liabilities", "부채총계", [&l[0], &l[1], &l[2]]),
        ],
    )
}

fn directory() -> CorpDirectory {
    CorpDirectory::from_companies(vec![Company {
        corp_name: "삼성전자".to_string(),
        corp_code: CorpCode::new("00126380"),
    }])
}

fn store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("finance.db")).unwrap();
    (dir, store)
}

#[tokio::test]
async fn test_insert_update_and_skip() {
    let (_dir, store) = store();
    let directory = directory();

    // 2024 report not filed yet: the series starts at 2023
    let older = CannedSource {
        windows: vec![window(2023, 1)],
    };
    let outcome = ingest(&directory, &older, &store, "삼성전자", 2025).await.unwrap();
    assert_eq!(
        outcome,
        IngestOutcome::Inserted {
            corp_name: "삼성전자".to_string(),
            rows: 6,
            latest_year: 2023,
        }
    );

    let newer = CannedSource {
        windows: vec![window(2024, 2)],
    };
    let outcome = ingest(&directory, &newer, &store, " 삼성전자 ", 2025).await.unwrap();
    assert_eq!(
        outcome,
        IngestOutcome::Updated {
            corp_name: "삼성전자".to_string(),
            rows: 6,
            replaced: 6,
            previous_year: 2023,
            latest_year: 2024,
        }
    );

    let outcome = ingest(&directory, &newer, &store, "삼성전자", 2025).await.unwrap();
    assert_eq!(outcome.rows_written(), 0);
    assert!(matches!(outcome, IngestOutcome::AlreadyRegistered { latest_year: 2024, .. }));

    assert_eq!(store.row_count().unwrap(), 6);
    assert_eq!(store.years_for_company("삼성전자").unwrap(), vec![2024, 2023, 2022]);
}

#[tokio::test]
async fn test_unknown_company() {
    let (_dir, store) = store();
    let source = CannedSource {
        windows: vec![window(2024, 1)],
    };
    let err = ingest(&directory(), &source, &store, "없는회사", 2025).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_directory_not_ready() {
    let (_dir, store) = store();
    let source = CannedSource { windows: Vec::new() };
    let err = ingest(&CorpDirectory::new(), &source, &store, "삼성전자", 2025).await.unwrap_err();
    assert!(err.is_not_ready());
}

#[tokio::test]
async fn test_no_data_leaves_store_empty() {
    let (_dir, store) = store();
    let source = CannedSource { windows: Vec::new() };
    let err = ingest(&directory(), &source, &store, "삼성전자", 2025).await.unwrap_err();
    assert!(matches!(err, ServiceError::Data(DataError::NoData { .. })));
    assert_eq!(store.row_count().unwrap(), 0);
}

#[tokio::test]
async fn test_view_and_export() {
    let (_dir, store) = store();
    let source = CannedSource {
        windows: vec![window(2024, 1)],
    };
    ingest(&directory(), &source, &store, "삼성전자", 2025).await.unwrap();

    let latest = view(&store, "삼성전자", None).unwrap();
    assert_eq!(latest.year, 2024);
    assert_eq!(latest.years, vec![2024, 2023, 2022]);
    let names: Vec<&str> = latest.rows.iter().map(|r| r.account_nm.as_str()).collect();
    assert_eq!(names, vec!["자산총계", "부채총계"]);
    assert_eq!(latest.rows[0].amount, Some(100));

    let earlier = view(&store, "삼성전자", Some(2022)).unwrap();
    assert_eq!(earlier.rows[0].amount, Some(80));

    assert!(view(&store, "없는회사", None).unwrap_err().is_not_found());

    let csv = stored_rows(&store).unwrap().export_to_string(ExportFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 7);
    assert!(csv.contains("00126380,ifrs-full_Assets,자산총계,100,2024"));
}
