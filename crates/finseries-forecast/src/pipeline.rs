//! Train-and-predict pipeline for balance-sheet totals.

use crate::dataset::{
    AccountPivot, FEATURE_ACCOUNT_IDS, TARGET_ACCOUNT_IDS, TARGET_NAMES, TrainingData, prepare,
};
use crate::error::{ForecastError, Result};
use crate::metrics::{TargetMetrics, ValidationReport};
use crate::model::LinearModel;
use crate::projection::{compound_growth_rates, project, repair_identity};
use crate::split::{SPLIT_SEED, train_validation_split};
use finseries_data::store::StatementStore;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Datasets of at least this many rows count as a genuine holdout.
const GENUINE_SPLIT_MIN_ROWS: usize = 5;

/// A fitted model and its validation report.
#[derive(Debug, Clone)]
pub struct TrainedForecast {
    /// Fitted model
    pub model: LinearModel,
    /// Validation metrics
    pub report: ValidationReport,
}

/// Predicted balance-sheet totals for one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Company display name
    pub corp_name: String,
    /// Latest year with feature data
    pub base_year: i32,
    /// Year the inputs were projected to
    pub target_year: i32,
    /// Total assets (자산총계)
    #[serde(rename = "자산총계")]
    pub total_assets: i64,
    /// Total equity (자본총계)
    #[serde(rename = "자본총계")]
    pub total_equity: i64,
    /// Total liabilities (부채총계)
    #[serde(rename = "부채총계")]
    pub total_liabilities: i64,
    /// Whether assets were replaced by liabilities + equity
    pub identity_adjusted: bool,
}

impl Prediction {
    /// Totals keyed by display name, in target order.
    pub fn entries(&self) -> [(&'static str, i64); 3] {
        [
            (TARGET_NAMES[0], self.total_assets),
            (TARGET_NAMES[1], self.total_equity),
            (TARGET_NAMES[2], self.total_liabilities),
        ]
    }
}

/// Result of a full forecast run.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    /// The prediction
    pub prediction: Prediction,
    /// Validation report of the model that produced it
    pub report: ValidationReport,
}

fn to_ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| (*id).to_string()).collect()
}

/// Join features with targets and fit the model.
///
/// # Errors
/// Data-insufficiency errors when the join is empty, a required account
/// column is absent, a target cell is missing or fewer than two rows remain;
/// `InvariantViolation` if the split is degenerate.
pub fn train(data: &TrainingData) -> Result<TrainedForecast> {
    let targets_by_key: HashMap<(&str, i32), &Vec<Option<f64>>> = data
        .targets
        .rows
        .iter()
        .map(|r| ((r.corp_name.as_str(), r.year), &r.values))
        .collect();

    let joined: Vec<(&Vec<Option<f64>>, &Vec<Option<f64>>)> = data
        .features
        .rows
        .iter()
        .filter_map(|f| {
            targets_by_key
                .get(&(f.corp_name.as_str(), f.year))
                .map(|t| (&f.values, *t))
        })
        .collect();

    if joined.is_empty() {
        return Err(ForecastError::InsufficientData(
            "no (company, year) has both feature and target accounts".to_string(),
        ));
    }

    let mut missing = data.features.missing_columns(&FEATURE_ACCOUNT_IDS);
    missing.extend(data.targets.missing_columns(&TARGET_ACCOUNT_IDS));
    if !missing.is_empty() {
        return Err(ForecastError::MissingAccounts(missing));
    }

    let feature_cols = column_positions(&data.features, &FEATURE_ACCOUNT_IDS)?;
    let target_cols = column_positions(&data.targets, &TARGET_ACCOUNT_IDS)?;

    let n = joined.len();
    let mut x = Array2::<f64>::zeros((n, feature_cols.len()));
    let mut y = Array2::<f64>::zeros((n, target_cols.len()));
    for (i, (features, targets)) in joined.iter().enumerate() {
        for (j, &c) in feature_cols.iter().enumerate() {
            x[[i, j]] = features[c].ok_or_else(missing_value)?;
        }
        for (j, &c) in target_cols.iter().enumerate() {
            y[[i, j]] = targets[c].ok_or_else(missing_value)?;
        }
    }

    if n < 2 {
        return Err(ForecastError::TooFewRows(n));
    }

    let (train_idx, val_idx) = train_validation_split(n, SPLIT_SEED)?;
    let x_train = x.select(Axis(0), &train_idx);
    let y_train = y.select(Axis(0), &train_idx);
    let x_val = x.select(Axis(0), &val_idx);
    let y_val = y.select(Axis(0), &val_idx);

    let model = LinearModel::fit(
        to_ids(&FEATURE_ACCOUNT_IDS),
        to_ids(&TARGET_ACCOUNT_IDS),
        &x_train,
        &y_train,
    )?;

    let y_pred = model.predict(&x_val)?;
    let metrics = TARGET_NAMES
        .iter()
        .enumerate()
        .map(|(j, name)| {
            (
                (*name).to_string(),
                TargetMetrics::compute(y_val.column(j), y_pred.column(j)),
            )
        })
        .collect();

    let report = ValidationReport::new(
        metrics,
        n >= GENUINE_SPLIT_MIN_ROWS,
        train_idx.len(),
        val_idx.len(),
    );

    tracing::info!(
        rows = n,
        train = report.train_size,
        validation = report.val_size,
        avg_r2 = report.avg_r2,
        "forecast model trained"
    );

    Ok(TrainedForecast { model, report })
}

fn missing_value() -> ForecastError {
    ForecastError::InsufficientData(
        "training data has missing values; every account is required".to_string(),
    )
}

fn column_positions(pivot: &AccountPivot, ids: &[&str]) -> Result<Vec<usize>> {
    ids.iter()
        .map(|id| {
            pivot
                .column_index(id)
                .ok_or_else(|| ForecastError::MissingAccounts(vec![(*id).to_string()]))
        })
        .collect()
}

/// Predict a company's totals from its latest feature row.
///
/// When `target_year` lies beyond the latest year and at least two years
/// are available, inputs are grown at their compound rate between the two
/// most recent years first.
pub fn predict(
    model: &LinearModel,
    features: &AccountPivot,
    corp_name: &str,
    target_year: Option<i32>,
) -> Result<Prediction> {
    let history = features.rows_for(corp_name);
    let Some(latest) = history.last() else {
        return Err(ForecastError::CompanyNotFound(corp_name.to_string()));
    };

    let ids: Vec<&str> = model.feature_ids().iter().map(String::as_str).collect();
    let missing = features.missing_columns(&ids);
    if !missing.is_empty() {
        return Err(ForecastError::MissingAccounts(missing));
    }
    let columns = column_positions(features, &ids)?;

    let vector = |values: &[Option<f64>]| -> Result<Vec<f64>> {
        columns
            .iter()
            .map(|&c| {
                values[c].ok_or_else(|| {
                    ForecastError::InsufficientData(format!(
                        "{} has no value for {}",
                        corp_name, features.account_ids[c]
                    ))
                })
            })
            .collect()
    };

    let base = vector(&latest.values)?;
    let latest_year = latest.year;

    let inputs = match (target_year, history.len()) {
        (Some(year), len) if year > latest_year && len >= 2 => {
            let previous = history[len - 2];
            let earlier = vector(&previous.values)?;
            let rates = compound_growth_rates(&base, &earlier, latest_year - previous.year);
            project(&base, &rates, year - latest_year)
        }
        _ => base,
    };

    let output = model.predict_one(&inputs)?;
    let value_of = |id: &str| -> Result<f64> {
        model
            .target_ids()
            .iter()
            .position(|t| t == id)
            .map(|i| output[i])
            .ok_or_else(|| ForecastError::MissingAccounts(vec![id.to_string()]))
    };

    let assets = value_of(TARGET_ACCOUNT_IDS[0])?;
    let equity = value_of(TARGET_ACCOUNT_IDS[1])?;
    let liabilities = value_of(TARGET_ACCOUNT_IDS[2])?;
    let (assets, identity_adjusted) = repair_identity(assets, liabilities, equity);

    if identity_adjusted {
        tracing::debug!(corp_name, "assets replaced by liabilities + equity");
    }

    Ok(Prediction {
        corp_name: corp_name.to_string(),
        base_year: latest_year,
        target_year: target_year.unwrap_or(latest_year).max(latest_year),
        total_assets: assets as i64,
        total_equity: equity as i64,
        total_liabilities: liabilities as i64,
        identity_adjusted,
    })
}

/// Store-backed forecast pipeline. The model is rebuilt from storage on
/// every run.
#[derive(Debug)]
pub struct ForecastPipeline<'a, S> {
    store: &'a S,
}

impl<'a, S: StatementStore> ForecastPipeline<'a, S> {
    /// Create a pipeline reading from `store`.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Build training pivots from every stored line item.
    pub fn prepare(&self) -> Result<TrainingData> {
        let items = self.store.all_rows()?;
        prepare(&items)
    }

    /// Prepare, train and predict in one go.
    pub fn run(&self, corp_name: &str, target_year: Option<i32>) -> Result<ForecastOutcome> {
        let data = self.prepare()?;
        let trained = train(&data)?;
        let prediction = predict(&trained.model, &data.features, corp_name, target_year)?;
        Ok(ForecastOutcome {
            prediction,
            report: trained.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PivotRow;

    fn feature_pivot(rows: Vec<(&str, i32, f64)>) -> AccountPivot {
        AccountPivot {
            account_ids: to_ids(&FEATURE_ACCOUNT_IDS),
            rows: rows
                .into_iter()
                .map(|(name, year, v)| PivotRow {
                    corp_name: name.to_string(),
                    year,
                    values: vec![Some(v); FEATURE_ACCOUNT_IDS.len()],
                })
                .collect(),
        }
    }

    fn target_pivot(rows: Vec<(&str, i32, [f64; 3])>) -> AccountPivot {
        AccountPivot {
            account_ids: to_ids(&TARGET_ACCOUNT_IDS),
            rows: rows
                .into_iter()
                .map(|(name, year, v)| PivotRow {
                    corp_name: name.to_string(),
                    year,
                    values: v.iter().map(|x| Some(*x)).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_train_needs_two_rows() {
        let data = TrainingData {
            features: feature_pivot(vec![("가", 2023, 1.0)]),
            targets: target_pivot(vec![("가", 2023, [3.0, 2.0, 1.0])]),
        };
        assert!(matches!(train(&data), Err(ForecastError::TooFewRows(1))));
    }

    #[test]
    fn test_train_empty_join() {
        let data = TrainingData {
            features: feature_pivot(vec![("가", 2023, 1.0)]),
            targets: target_pivot(vec![("나", 2023, [3.0, 2.0, 1.0])]),
        };
        assert!(matches!(train(&data), Err(ForecastError::InsufficientData(_))));
    }

    #[test]
    fn test_train_missing_target_value() {
        let mut targets = target_pivot(vec![
            ("가", 2022, [3.0, 2.0, 1.0]),
            ("가", 2023, [3.0, 2.0, 1.0]),
        ]);
        targets.rows[1].values[2] = None;
        let data = TrainingData {
            features: feature_pivot(vec![("가", 2022, 1.0), ("가", 2023, 2.0)]),
            targets,
        };
        assert!(matches!(train(&data), Err(ForecastError::InsufficientData(_))));
    }

    #[test]
    fn test_train_missing_feature_column() {
        let mut features = feature_pivot(vec![("가", 2022, 1.0), ("가", 2023, 2.0)]);
        features.account_ids.pop();
        for row in &mut features.rows {
            row.values.pop();
        }
        let data = TrainingData {
            features,
            targets: target_pivot(vec![
                ("가", 2022, [3.0, 2.0, 1.0]),
                ("가", 2023, [6.0, 4.0, 2.0]),
            ]),
        };
        assert!(matches!(
            train(&data),
            Err(ForecastError::MissingAccounts(ref ids))
                if ids == &vec!["ifrs-full_NoncontrollingInterests".to_string()]
        ));
    }

    #[test]
    fn test_predict_unknown_company() {
        let data = TrainingData {
            features: feature_pivot(vec![("가", 2022, 1.0), ("가", 2023, 2.0)]),
            targets: target_pivot(vec![
                ("가", 2022, [3.0, 2.0, 1.0]),
                ("가", 2023, [6.0, 4.0, 2.0]),
            ]),
        };
        let trained = train(&data).unwrap();
        assert!(matches!(
            predict(&trained.model, &data.features, "없는회사", None),
            Err(ForecastError::CompanyNotFound(_))
        ));
    }
}
