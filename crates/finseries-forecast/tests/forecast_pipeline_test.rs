//! End-to-end forecasting over a temporary SQLite store.

use approx::assert_relative_eq;
use finseries_data::model::{CorpCode, LineItem};
use finseries_data::store::{SqliteStore, StatementStore};
use finseries_forecast::{FEATURE_ACCOUNT_IDS, ForecastError, ForecastPipeline, TARGET_ACCOUNT_IDS};
use tempfile::TempDir;

/// Scale of company `c` in year `year`: grows 10% a year.
fn scale(c: usize, year: i32) -> f64 {
    1.0e9 * (c as f64 + 1.0) * 1.1_f64.powi(year - 2019)
}

fn company_rows(c: usize, years: &[i32]) -> Vec<LineItem> {
    company_rows_with_assets(c, years, 30.0)
}

/// Rows whose stored total assets are `assets_factor` times the scale,
/// against equity 12 and liabilities 18.
fn company_rows_with_assets(c: usize, years: &[i32], assets_factor: f64) -> Vec<LineItem> {
    let corp_name = format!("회사{}", c);
    let corp_code = CorpCode::new(format!("0000000{}", c));
    let mut rows = Vec::new();

    for &year in years {
        let s = scale(c, year);
        for (j, id) in FEATURE_ACCOUNT_IDS.iter().enumerate() {
            rows.push(LineItem {
                corp_name: corp_name.clone(),
                corp_code: corp_code.clone(),
                account_id: Some((*id).to_string()),
                account_nm: format!("계정{}", j),
                amount: Some((s * (j as f64 + 1.0)).round() as i64),
                year,
            });
        }
        for (id, (name, factor)) in TARGET_ACCOUNT_IDS
            .iter()
            .zip([("자산총계", assets_factor), ("자본총계", 12.0), ("부채총계", 18.0)])
        {
            rows.push(LineItem {
                corp_name: corp_name.clone(),
                corp_code: corp_code.clone(),
                account_id: Some((*id).to_string()),
                account_nm: name.to_string(),
                amount: Some((s * factor).round() as i64),
                year,
            });
        }
    }

    rows
}

fn seeded_store(companies: usize) -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("finance.db")).unwrap();
    let years = [2019, 2020, 2021, 2022, 2023];
    for c in 0..companies {
        store.insert_rows(&company_rows(c, &years)).unwrap();
    }
    (dir, store)
}

#[test]
fn test_forecast_latest_year() {
    let (_dir, store) = seeded_store(3);
    let outcome = ForecastPipeline::new(&store).run("회사1", None).unwrap();

    let report = &outcome.report;
    assert!(report.is_split);
    assert_eq!(report.train_size + report.val_size, 15);
    assert_eq!(report.val_size, 3);
    assert_eq!(report.targets.len(), 3);

    let p = &outcome.prediction;
    assert_eq!(p.base_year, 2023);
    assert_eq!(p.target_year, 2023);

    let s = scale(1, 2023);
    assert_relative_eq!(p.total_assets as f64, 30.0 * s, max_relative = 1e-6);
    assert_relative_eq!(p.total_equity as f64, 12.0 * s, max_relative = 1e-6);
    assert_relative_eq!(p.total_liabilities as f64, 18.0 * s, max_relative = 1e-6);
    assert!((p.total_assets - (p.total_liabilities + p.total_equity)).abs() <= 1);
}

#[test]
fn test_forecast_projects_with_growth() {
    let (_dir, store) = seeded_store(3);
    let outcome = ForecastPipeline::new(&store).run("회사0", Some(2025)).unwrap();

    let p = &outcome.prediction;
    assert_eq!(p.target_year, 2025);
    let s = scale(0, 2023) * 1.21;
    assert_relative_eq!(p.total_equity as f64, 12.0 * s, max_relative = 1e-6);
    assert_relative_eq!(p.total_liabilities as f64, 18.0 * s, max_relative = 1e-6);
}

#[test]
fn test_inconsistent_totals_are_repaired() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("finance.db")).unwrap();
    let years = [2019, 2020, 2021, 2022, 2023];
    for c in 0..3 {
        store.insert_rows(&company_rows_with_assets(c, &years, 35.0)).unwrap();
    }

    let p = ForecastPipeline::new(&store).run("회사2", None).unwrap().prediction;
    assert!(p.identity_adjusted);
    assert!((p.total_assets - (p.total_liabilities + p.total_equity)).abs() <= 1);

    let s = scale(2, 2023);
    assert_relative_eq!(p.total_assets as f64, 30.0 * s, max_relative = 1e-6);
    assert_relative_eq!(p.total_equity as f64, 12.0 * s, max_relative = 1e-6);
    assert_relative_eq!(p.total_liabilities as f64, 18.0 * s, max_relative = 1e-6);
}

#[test]
fn test_past_target_year_uses_latest_inputs() {
    let (_dir, store) = seeded_store(2);
    let outcome = ForecastPipeline::new(&store).run("회사0", Some(2020)).unwrap();
    assert_eq!(outcome.prediction.base_year, 2023);
    assert_eq!(outcome.prediction.target_year, 2023);
}

#[test]
fn test_small_dataset_is_not_a_genuine_split() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("finance.db")).unwrap();
    store.insert_rows(&company_rows(0, &[2022, 2023])).unwrap();

    let outcome = ForecastPipeline::new(&store).run("회사0", None).unwrap();
    assert!(!outcome.report.is_split);
    assert_eq!(outcome.report.train_size, 1);
    assert_eq!(outcome.report.val_size, 1);
    assert!(outcome.report.avg_r2.is_nan());
}

#[test]
fn test_unknown_company() {
    let (_dir, store) = seeded_store(2);
    let result = ForecastPipeline::new(&store).run("없는회사", None);
    assert!(matches!(result, Err(ForecastError::CompanyNotFound(_))));
}

#[test]
fn test_empty_store_is_insufficient() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("finance.db")).unwrap();
    let result = ForecastPipeline::new(&store).run("회사0", None);
    assert!(matches!(result, Err(ref e) if e.is_data_insufficiency()));
}
