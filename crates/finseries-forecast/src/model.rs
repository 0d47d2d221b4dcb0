//! Multi-output linear regression over named account columns.

use crate::error::{ForecastError, Result};
use crate::linalg::least_squares_with_intercept;
use ndarray::{Array1, Array2};

/// A fitted linear model mapping feature accounts to target accounts.
#[derive(Debug, Clone)]
pub struct LinearModel {
    feature_ids: Vec<String>,
    target_ids: Vec<String>,
    coefficients: Array2<f64>,
    intercept: Array1<f64>,
}

impl LinearModel {
    /// Fit on `x` (rows x features) and `y` (rows x targets).
    pub fn fit(
        feature_ids: Vec<String>,
        target_ids: Vec<String>,
        x: &Array2<f64>,
        y: &Array2<f64>,
    ) -> Result<Self> {
        if x.ncols() != feature_ids.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: feature_ids.len(),
                actual: x.ncols(),
            });
        }
        if y.ncols() != target_ids.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: target_ids.len(),
                actual: y.ncols(),
            });
        }

        let fit = least_squares_with_intercept(x, y)?;
        tracing::debug!(rows = x.nrows(), rank = fit.rank, "linear model fitted");

        Ok(Self {
            feature_ids,
            target_ids,
            coefficients: fit.coefficients,
            intercept: fit.intercept,
        })
    }

    /// Feature account ids, in column order.
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Target account ids, in output order.
    pub fn target_ids(&self) -> &[String] {
        &self.target_ids
    }

    /// Predict every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.feature_ids.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.feature_ids.len(),
                actual: x.ncols(),
            });
        }
        Ok(x.dot(&self.coefficients) + &self.intercept)
    }

    /// Predict a single feature vector.
    pub fn predict_one(&self, features: &[f64]) -> Result<Array1<f64>> {
        if features.len() != self.feature_ids.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.feature_ids.len(),
                actual: features.len(),
            });
        }
        let input = Array1::from(features.to_vec());
        Ok(input.dot(&self.coefficients) + &self.intercept)
    }
}
