//! Display helpers for KRW amounts and year arguments.

use crate::error::{AnalysisError, Result};

const JO: f64 = 1e12;
const EOK: f64 = 1e8;

/// Format an amount in 조 (10^12) or 억 (10^8) units with one decimal.
///
/// Smaller amounts get thousands separators; `None` and zero render as `-`.
pub fn format_korean_amount(amount: Option<f64>) -> String {
    let Some(value) = amount.filter(|v| v.is_finite() && *v != 0.0) else {
        return "-".to_string();
    };

    let magnitude = value.abs();
    if magnitude >= JO {
        format!("{:.1}조", value / JO)
    } else if magnitude >= EOK {
        format!("{:.1}억", value / EOK)
    } else {
        group_thousands(value.round() as i64)
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Parse a year argument, optionally enforcing a minimum.
pub fn validate_year(input: &str, min_year: Option<i32>) -> Result<i32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::InvalidYear("a year is required".to_string()));
    }

    let year: i32 = trimmed
        .parse()
        .map_err(|_| AnalysisError::InvalidYear(format!("'{}' is not a year", trimmed)))?;

    match min_year {
        Some(min) if year < min => Err(AnalysisError::InvalidYear(format!(
            "year must be {} or later",
            min
        ))),
        _ => Ok(year),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "-")]
    #[case(Some(0.0), "-")]
    #[case(Some(455_905_980_000_000.0), "455.9조")]
    #[case(Some(-1_500_000_000_000.0), "-1.5조")]
    #[case(Some(250_000_000.0), "2.5억")]
    #[case(Some(99_999_999.0), "99,999,999")]
    #[case(Some(1234.4), "1,234")]
    #[case(Some(-1234.0), "-1,234")]
    #[case(Some(999.0), "999")]
    fn test_format_korean_amount(#[case] amount: Option<f64>, #[case] expected: &str) {
        assert_eq!(format_korean_amount(amount), expected);
    }

    #[test]
    fn test_validate_year() {
        assert_eq!(validate_year(" 2023 ", None).unwrap(), 2023);
        assert_eq!(validate_year("2023", Some(2015)).unwrap(), 2023);
        assert!(matches!(validate_year("2010", Some(2015)), Err(AnalysisError::InvalidYear(_))));
        assert!(matches!(validate_year("", None), Err(AnalysisError::InvalidYear(_))));
        assert!(matches!(validate_year("twenty", None), Err(AnalysisError::InvalidYear(_))));
    }
}
