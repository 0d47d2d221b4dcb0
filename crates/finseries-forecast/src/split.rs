//! Seeded train/validation split.

use crate::error::{ForecastError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Seed used for every forecast split.
pub const SPLIT_SEED: u64 = 42;

/// Validation fraction for large datasets.
const DEFAULT_VALIDATION_FRACTION: f64 = 0.2;

/// Datasets at or below this size get at least one validation row.
const SMALL_DATASET: usize = 5;

/// Fraction of rows held out for validation.
pub fn validation_fraction(n: usize) -> f64 {
    if n <= SMALL_DATASET && n > 0 {
        (1.0 / n as f64).max(DEFAULT_VALIDATION_FRACTION)
    } else {
        DEFAULT_VALIDATION_FRACTION
    }
}

/// Number of validation rows, `ceil(fraction * n)`.
pub fn validation_size(n: usize) -> usize {
    (validation_fraction(n) * n as f64).ceil() as usize
}

/// Shuffled row indices split into (train, validation).
///
/// # Errors
/// Returns `TooFewRows` below two rows, and `InvariantViolation` if either
/// side ends up empty or the two overlap.
pub fn train_validation_split(n: usize, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if n < 2 {
        return Err(ForecastError::TooFewRows(n));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_val = validation_size(n).min(n);
    let validation = indices[..n_val].to_vec();
    let train = indices[n_val..].to_vec();

    if train.is_empty() || validation.is_empty() {
        return Err(ForecastError::InvariantViolation(format!(
            "split produced {} train and {} validation rows",
            train.len(),
            validation.len()
        )));
    }

    let held_out: HashSet<usize> = validation.iter().copied().collect();
    if train.iter().any(|i| held_out.contains(i)) {
        return Err(ForecastError::InvariantViolation(
            "train and validation rows overlap".to_string(),
        ));
    }

    Ok((train, validation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(2, 0.5, 1)]
    #[case(3, 1.0 / 3.0, 1)]
    #[case(4, 0.25, 1)]
    #[case(5, 0.2, 1)]
    #[case(6, 0.2, 2)]
    #[case(10, 0.2, 2)]
    #[case(11, 0.2, 3)]
    fn test_validation_sizes(#[case] n: usize, #[case] fraction: f64, #[case] size: usize) {
        assert_relative_eq!(validation_fraction(n), fraction);
        assert_eq!(validation_size(n), size);
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        for n in 2..40 {
            let (train, val) = train_validation_split(n, SPLIT_SEED).unwrap();
            assert_eq!(train.len() + val.len(), n);
            assert_eq!(val.len(), validation_size(n));

            let mut all: Vec<usize> = train.iter().chain(val.iter()).copied().collect();
            all.sort_unstable();
            assert_eq!(all, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let first = train_validation_split(20, SPLIT_SEED).unwrap();
        let second = train_validation_split(20, SPLIT_SEED).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_needs_two_rows() {
        assert!(matches!(train_validation_split(1, SPLIT_SEED), Err(ForecastError::TooFewRows(1))));
    }
}
