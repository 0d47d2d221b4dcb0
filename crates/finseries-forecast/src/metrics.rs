//! Validation metrics.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Coefficient of determination.
///
/// `NaN` below two samples. A constant target scores 1.0 when predicted
/// exactly and 0.0 otherwise.
pub fn r2_score(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    let n = y_true.len();
    if n < 2 {
        return f64::NAN;
    }

    let mean = y_true.sum() / n as f64;
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Mean squared error.
pub fn mean_squared_error(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    mean_of(y_true.iter().zip(y_pred.iter()).map(|(t, p)| (t - p).powi(2)))
}

/// Mean absolute error.
pub fn mean_absolute_error(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    mean_of(y_true.iter().zip(y_pred.iter()).map(|(t, p)| (t - p).abs()))
}

fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

/// Validation metrics for one target account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetMetrics {
    /// Coefficient of determination
    pub r2: f64,
    /// Mean squared error
    pub mse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
}

impl TargetMetrics {
    /// Compute all metrics for one target column.
    pub fn compute(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> Self {
        let mse = mean_squared_error(y_true, y_pred);
        Self {
            r2: r2_score(y_true, y_pred),
            mse,
            mae: mean_absolute_error(y_true, y_pred),
            rmse: mse.sqrt(),
        }
    }
}

/// Validation summary of a trained forecast model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Per-target metrics keyed by display name, in target order
    pub targets: Vec<(String, TargetMetrics)>,
    /// Unweighted mean R²
    pub avg_r2: f64,
    /// Unweighted mean MSE
    pub avg_mse: f64,
    /// Unweighted mean MAE
    pub avg_mae: f64,
    /// Unweighted mean RMSE
    pub avg_rmse: f64,
    /// Whether the dataset was large enough for a genuine holdout
    pub is_split: bool,
    /// Training rows
    pub train_size: usize,
    /// Validation rows
    pub val_size: usize,
}

impl ValidationReport {
    /// Summarise per-target metrics.
    pub fn new(
        targets: Vec<(String, TargetMetrics)>,
        is_split: bool,
        train_size: usize,
        val_size: usize,
    ) -> Self {
        let avg = |f: fn(&TargetMetrics) -> f64| mean_of(targets.iter().map(|(_, m)| f(m)));
        Self {
            avg_r2: avg(|m| m.r2),
            avg_mse: avg(|m| m.mse),
            avg_mae: avg(|m| m.mae),
            avg_rmse: avg(|m| m.rmse),
            targets,
            is_split,
            train_size,
            val_size,
        }
    }

    /// Metrics for one target by display name.
    pub fn target(&self, name: &str) -> Option<&TargetMetrics> {
        self.targets.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_r2_perfect_and_mean() {
        let y = array![1.0, 2.0, 3.0];
        assert_relative_eq!(r2_score(y.view(), y.view()), 1.0);

        let mean_pred = array![2.0, 2.0, 2.0];
        assert_relative_eq!(r2_score(y.view(), mean_pred.view()), 0.0);
    }

    #[test]
    fn test_r2_single_sample_is_nan() {
        let y = array![5.0];
        assert!(r2_score(y.view(), y.view()).is_nan());
    }

    #[test]
    fn test_r2_constant_target() {
        let y = array![4.0, 4.0];
        assert_relative_eq!(r2_score(y.view(), array![4.0, 4.0].view()), 1.0);
        assert_relative_eq!(r2_score(y.view(), array![4.0, 5.0].view()), 0.0);
    }

    #[test]
    fn test_errors() {
        let t = array![1.0, 2.0, 3.0, 4.0];
        let p = array![2.0, 2.0, 2.0, 2.0];
        assert_relative_eq!(mean_squared_error(t.view(), p.view()), 1.5);
        assert_relative_eq!(mean_absolute_error(t.view(), p.view()), 1.0);

        let m = TargetMetrics::compute(t.view(), p.view());
        assert_relative_eq!(m.rmse, 1.5_f64.sqrt());
    }

    #[test]
    fn test_report_averages() {
        let a = TargetMetrics { r2: 0.9, mse: 4.0, mae: 2.0, rmse: 2.0 };
        let b = TargetMetrics { r2: 0.7, mse: 16.0, mae: 4.0, rmse: 4.0 };
        let report = ValidationReport::new(
            vec![("자산총계".to_string(), a), ("자본총계".to_string(), b)],
            true,
            8,
            2,
        );
        assert_relative_eq!(report.avg_r2, 0.8);
        assert_relative_eq!(report.avg_mse, 10.0);
        assert_relative_eq!(report.avg_rmse, 3.0);
        assert_eq!(report.target("자본총계"), Some(&b));
    }
}
