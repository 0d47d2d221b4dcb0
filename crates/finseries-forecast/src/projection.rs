//! Forward projection of feature vectors and accounting-identity repair.

/// Largest tolerated gap between assets and liabilities + equity.
pub const IDENTITY_TOLERANCE: f64 = 0.01;

/// Per-account compound annual growth rate between two observations.
///
/// The rate is zero where the earlier value is not positive or the growth
/// ratio is negative.
pub fn compound_growth_rates(latest: &[f64], earlier: &[f64], years_between: i32) -> Vec<f64> {
    let exponent = 1.0 / f64::from(years_between.max(1));
    latest
        .iter()
        .zip(earlier)
        .map(|(&now, &then)| {
            if then <= 0.0 {
                return 0.0;
            }
            let ratio = now / then;
            if ratio < 0.0 {
                0.0
            } else {
                ratio.powf(exponent) - 1.0
            }
        })
        .collect()
}

/// Grow `base` by `rates` over `years`.
pub fn project(base: &[f64], rates: &[f64], years: i32) -> Vec<f64> {
    base.iter()
        .zip(rates)
        .map(|(&value, &rate)| value * (1.0 + rate).powi(years))
        .collect()
}

/// Force assets = liabilities + equity.
///
/// Returns the (possibly replaced) assets and whether it was adjusted.
pub fn repair_identity(assets: f64, liabilities: f64, equity: f64) -> (f64, bool) {
    let implied = liabilities + equity;
    if (assets - implied).abs() > IDENTITY_TOLERANCE {
        (implied, true)
    } else {
        (assets, false)
    }
}
