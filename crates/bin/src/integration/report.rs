//! Terminal rendering of stored statements and analysis results.

use finseries::StatementView;
use finseries_analysis::{ChartSeries, ComparisonTable, FinancialRatios, format_korean_amount};
use finseries_data::model::Company;
use finseries_forecast::{ForecastOutcome, ValidationReport};
use serde_json::json;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

fn korean(amount: Option<i64>) -> String {
    format_korean_amount(amount.map(|a| a as f64))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v))
}

fn header(title: &str) {
    println!("\n{}", RULE);
    println!("{}", title);
    println!("{}\n", RULE);
}

pub(crate) fn print_search(term: &str, companies: &[Company]) {
    if companies.is_empty() {
        println!("No companies match '{}'", term);
        return;
    }
    for company in companies {
        println!("  {}  {}", company.corp_code, company.corp_name);
    }
    println!("\n{} match(es)", companies.len());
}

pub(crate) fn print_companies(companies: &[String]) {
    if companies.is_empty() {
        println!("No companies stored yet; run `finseries ingest <name>` first");
        return;
    }
    println!("Stored companies:");
    for company in companies {
        println!("  {}", company);
    }
}

pub(crate) fn print_view(view: &StatementView) {
    header(&format!("{} ({})", view.corp_name, view.year));

    let years: Vec<String> = view.years.iter().map(i32::to_string).collect();
    println!("Stored years: {}\n", years.join(", "));

    for row in &view.rows {
        println!("  {:<40} {:>20}", row.account_nm, korean(row.amount));
    }
    if view.rows.is_empty() {
        println!("  (no rows for {})", view.year);
    }
}

pub(crate) fn print_ratios(corp_name: &str, year: i32, ratios: &FinancialRatios) {
    header(&format!("FINANCIAL RATIOS: {} ({})", corp_name, year));
    for (name, value) in ratios.entries() {
        println!("  {:<20} {:>12}", name, percent(value));
    }
}

pub(crate) fn print_comparison(table: &ComparisonTable) {
    header("COMPARISON");

    let mut line = format!("  {:<32}", "account");
    for column in &table.columns {
        line.push_str(&format!(" {:>18}", column));
    }
    if table.has_deltas {
        line.push_str(&format!(" {:>18} {:>10}", "difference", "change"));
    }
    println!("{}", line);

    for row in &table.rows {
        let mut line = format!("  {:<32}", row.account_nm);
        for amount in &row.amounts {
            line.push_str(&format!(" {:>18}", korean(*amount)));
        }
        if table.has_deltas {
            line.push_str(&format!(
                " {:>18} {:>10}",
                korean(row.difference),
                percent(row.percent_change)
            ));
        }
        println!("{}", line);
    }
}

pub(crate) fn print_chart(chart: &ChartSeries) {
    header("CHART SERIES");
    for (i, account) in chart.accounts.iter().enumerate() {
        let values: Vec<String> = chart
            .columns
            .iter()
            .map(|c| format!("{}={}", c.label, c.values.get(i).copied().unwrap_or(0)))
            .collect();
        println!("  {:<32} {}", account, values.join("  "));
    }
}

fn metric(value: f64) -> String {
    if value.is_finite() {
        format!("{:.4}", value)
    } else {
        "n/a".to_string()
    }
}

fn print_report(report: &ValidationReport) {
    if report.is_split {
        println!(
            "Validation: {} training / {} validation rows",
            report.train_size, report.val_size
        );
    } else {
        println!(
            "Validation: too few rows for a meaningful split ({} / {})",
            report.train_size, report.val_size
        );
    }
    for (name, m) in &report.targets {
        println!(
            "  {:<10} r2 {:>10}  rmse {:>12}  mae {:>12}",
            name,
            metric(m.r2),
            format_korean_amount(Some(m.rmse)),
            format_korean_amount(Some(m.mae))
        );
    }
    println!(
        "  {:<10} r2 {:>10}  rmse {:>12}  mae {:>12}",
        "average",
        metric(report.avg_r2),
        format_korean_amount(Some(report.avg_rmse)),
        format_korean_amount(Some(report.avg_mae))
    );
}

pub(crate) fn print_forecast(outcome: &ForecastOutcome) {
    let p = &outcome.prediction;
    header(&format!(
        "FORECAST: {} ({}, from {} data)",
        p.corp_name, p.target_year, p.base_year
    ));

    for (name, amount) in p.entries() {
        println!("  {:<10} {:>20}", name, korean(Some(amount)));
    }
    if p.identity_adjusted {
        println!("\n  (assets set to liabilities + equity)");
    }
    println!();
    print_report(&outcome.report);
}

pub(crate) fn forecast_json(outcome: &ForecastOutcome) -> serde_json::Value {
    let report = &outcome.report;
    let finite = |v: f64| v.is_finite().then_some(v);

    let targets: Vec<_> = report
        .targets
        .iter()
        .map(|(name, m)| {
            json!({
                "target": name,
                "r2": finite(m.r2),
                "mse": finite(m.mse),
                "mae": finite(m.mae),
                "rmse": finite(m.rmse),
            })
        })
        .collect();

    json!({
        "prediction": outcome.prediction,
        "metrics": {
            "targets": targets,
            "avg_r2": finite(report.avg_r2),
            "avg_mse": finite(report.avg_mse),
            "avg_mae": finite(report.avg_mae),
            "avg_rmse": finite(report.avg_rmse),
            "is_split": report.is_split,
            "train_size": report.train_size,
            "val_size": report.val_size,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use finseries_forecast::{Prediction, TargetMetrics};

    #[test]
    fn test_percent() {
        assert_eq!(percent(Some(66.666)), "66.67%");
        assert_eq!(percent(None), "-");
    }

    #[test]
    fn test_forecast_json_drops_nan() {
        let m = TargetMetrics {
            r2: f64::NAN,
            mse: 4.0,
            mae: 2.0,
            rmse: 2.0,
        };
        let outcome = ForecastOutcome {
            prediction: Prediction {
                corp_name: "가".to_string(),
                base_year: 2023,
                target_year: 2024,
                total_assets: 300,
                total_equity: 120,
                total_liabilities: 180,
                identity_adjusted: false,
            },
            report: ValidationReport {
                targets: vec![("자산총계".to_string(), m)],
                avg_r2: f64::NAN,
                avg_mse: 4.0,
                avg_mae: 2.0,
                avg_rmse: 2.0,
                is_split: false,
                train_size: 1,
                val_size: 1,
            },
        };

        let value = forecast_json(&outcome);
        assert!(value["metrics"]["avg_r2"].is_null());
        assert_eq!(value["prediction"]["자산총계"], 300);
        assert_eq!(value["metrics"]["targets"][0]["mse"], 4.0);
    }
}
