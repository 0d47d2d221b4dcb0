//! Dense linear algebra for the forecast model.
//!
//! Least squares runs on the centered design with every column scaled to
//! unit norm, so balance-sheet accounts that differ by many orders of
//! magnitude carry equal weight in the rank decision. The scaled design is
//! factored by one-sided Jacobi rotations, which never forms the Gram
//! matrix. Only directions with a vanishing singular value (all-zero or
//! duplicate columns, or more features than rows) are dropped, and within
//! those the minimum-norm solution in scaled coordinates is taken.

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Jacobi sweep limit.
const MAX_SWEEPS: usize = 100;

/// Two columns count as orthogonal once their cosine falls below this
/// multiple of machine epsilon per row.
const ORTHOGONALITY_ULPS: f64 = 4.0;

/// Singular values below this fraction of the largest are treated as zero.
const RANK_TOLERANCE: f64 = 1e-12;

/// Thin singular value decomposition `a = u · diag(singular_values) · vᵀ`.
#[derive(Debug, Clone)]
pub struct SingularValueDecomposition {
    /// Left singular vectors (n x p); columns of zero singular values are zero
    pub u: Array2<f64>,
    /// Singular values, sorted in descending order
    pub singular_values: Array1<f64>,
    /// Right singular vectors (p x p), aligned with `singular_values`
    pub v: Array2<f64>,
}

/// Singular value decomposition by one-sided (Hestenes) Jacobi rotations.
///
/// Pairs of columns are rotated until every pair is orthogonal; the column
/// norms are then the singular values and the accumulated rotations the
/// right singular vectors.
///
/// # Errors
/// Returns `LinearAlgebra` for non-finite input.
pub fn jacobi_svd(a: &Array2<f64>) -> Result<SingularValueDecomposition> {
    if a.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::LinearAlgebra("non-finite input".to_string()));
    }

    let p = a.ncols();
    let tolerance = ORTHOGONALITY_ULPS * f64::EPSILON * a.nrows().max(1) as f64;
    let mut w = a.clone();
    let mut v = Array2::<f64>::eye(p);

    let mut converged = p < 2;
    for _ in 0..MAX_SWEEPS {
        if converged {
            break;
        }
        converged = true;
        for j in 0..p {
            for k in (j + 1)..p {
                if orthogonalize(&mut w, &mut v, j, k, tolerance) {
                    converged = false;
                }
            }
        }
    }

    if !converged {
        tracing::warn!(sweeps = MAX_SWEEPS, "jacobi svd stopped before full convergence");
    }

    let norms: Vec<f64> = w.columns().into_iter().map(column_norm).collect();
    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&i, &j| norms[j].total_cmp(&norms[i]));

    let mut u = Array2::<f64>::zeros(w.raw_dim());
    let mut v_sorted = Array2::<f64>::zeros((p, p));
    for (to, &from) in order.iter().enumerate() {
        if norms[from] > 0.0 {
            u.column_mut(to).assign(&w.column(from).mapv(|x| x / norms[from]));
        }
        v_sorted.column_mut(to).assign(&v.column(from));
    }

    Ok(SingularValueDecomposition {
        u,
        singular_values: order.iter().map(|&i| norms[i]).collect(),
        v: v_sorted,
    })
}

/// Rotate columns `j` and `k` of `w` to be orthogonal, applying the same
/// rotation to `v`. Returns whether a rotation was needed.
fn orthogonalize(
    w: &mut Array2<f64>,
    v: &mut Array2<f64>,
    j: usize,
    k: usize,
    tolerance: f64,
) -> bool {
    let (alpha, beta, gamma) = {
        let (cj, ck) = (w.column(j), w.column(k));
        (cj.dot(&cj), ck.dot(&ck), cj.dot(&ck))
    };
    if alpha == 0.0 || beta == 0.0 || gamma.abs() <= tolerance * (alpha * beta).sqrt() {
        return false;
    }

    let zeta = (beta - alpha) / (2.0 * gamma);
    let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
    let c = 1.0 / (1.0 + t * t).sqrt();
    let s = c * t;

    for m in [w, v] {
        for mut row in m.rows_mut() {
            let (x, y) = (row[j], row[k]);
            row[j] = c * x - s * y;
            row[k] = s * x + c * y;
        }
    }
    true
}

/// Coefficients of an affine multi-output fit `y = x · coefficients + intercept`.
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    /// Slope matrix (features x targets)
    pub coefficients: Array2<f64>,
    /// Intercept per target
    pub intercept: Array1<f64>,
    /// Numerical rank of the centered design matrix
    pub rank: usize,
}

fn column_norm(column: ArrayView1<'_, f64>) -> f64 {
    column.dot(&column).sqrt()
}

/// Ordinary least squares with an intercept, for every target column at
/// once.
///
/// # Arguments
/// * `x` - Design matrix (n x p)
/// * `y` - Targets (n x k)
///
/// # Errors
/// Returns error if the row counts differ, there are no rows, or any input
/// is non-finite.
pub fn least_squares_with_intercept(
    x: &Array2<f64>,
    y: &Array2<f64>,
) -> Result<LeastSquaresFit> {
    let n = x.nrows();
    if y.nrows() != n {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            actual: y.nrows(),
        });
    }
    if n == 0 {
        return Err(ForecastError::LinearAlgebra("no rows to fit".to_string()));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(ForecastError::LinearAlgebra("non-finite input".to_string()));
    }

    let (p, k) = (x.ncols(), y.ncols());
    let empty = || ForecastError::LinearAlgebra("no rows to fit".to_string());
    let x_mean = x.mean_axis(Axis(0)).ok_or_else(empty)?;
    let y_mean = y.mean_axis(Axis(0)).ok_or_else(empty)?;
    let mut xs = x - &x_mean;
    let yc = y - &y_mean;

    // Constant columns keep a zero norm and end up with a zero coefficient
    let norms: Vec<f64> = xs.columns().into_iter().map(column_norm).collect();
    for (mut column, &norm) in xs.columns_mut().into_iter().zip(&norms) {
        if norm > 0.0 {
            column.mapv_inplace(|v| v / norm);
        }
    }

    let svd = jacobi_svd(&xs)?;
    let sigma_max = svd.singular_values.first().copied().unwrap_or(0.0);

    let mut scaled = Array2::<f64>::zeros((p, k));
    let mut rank = 0;
    for (i, &sigma) in svd.singular_values.iter().enumerate() {
        if sigma <= RANK_TOLERANCE * sigma_max || sigma <= 0.0 {
            continue;
        }
        rank += 1;
        let projection = svd.u.column(i).dot(&yc) / sigma;
        let direction = svd.v.column(i);
        for row in 0..p {
            for col in 0..k {
                scaled[[row, col]] += direction[row] * projection[col];
            }
        }
    }

    let mut coefficients = scaled;
    for (mut row, &norm) in coefficients.rows_mut().into_iter().zip(&norms) {
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        } else {
            row.fill(0.0);
        }
    }

    let intercept = &y_mean - &x_mean.dot(&coefficients);

    Ok(LeastSquaresFit {
        coefficients,
        intercept,
        rank,
    })
}
