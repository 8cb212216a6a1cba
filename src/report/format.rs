//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the engine code stays clean and testable
//! - output changes are localized

use crate::domain::{ForecastConfig, Prediction};
use crate::service::SalesSnapshot;

/// How many skipped rows are listed individually in the summary.
const MAX_LISTED_ROW_ERRORS: usize = 10;

/// Format the load summary (input, row counts, coverage, scaling).
pub fn format_load_summary(snapshot: &SalesSnapshot, config: &ForecastConfig) -> String {
    let mut out = String::new();
    let report = snapshot.load_report();

    out.push_str("=== weekcast - weekly sales forecast ===\n");
    out.push_str(&format!("Data: {}\n", config.data_path.display()));
    out.push_str(&format!(
        "Rows: read={} | used={} | skipped={}\n",
        report.rows_read,
        report.rows_used,
        report.rows_skipped()
    ));

    let years = year_range(snapshot);
    match years {
        Some((lo, hi)) => out.push_str(&format!(
            "Items: {} | years=[{lo}, {hi}]\n",
            snapshot.item_count()
        )),
        None => out.push_str(&format!("Items: {}\n", snapshot.item_count())),
    }

    let scale = snapshot.week_scale();
    out.push_str(&format!(
        "Scaling: {}-day window -> {}-day week (x{:.4})\n",
        scale.observed_days,
        scale.week_days,
        scale.factor()
    ));

    if !report.row_errors.is_empty() {
        out.push_str("\nSkipped rows:\n");
        for e in report.row_errors.iter().take(MAX_LISTED_ROW_ERRORS) {
            out.push_str(&format!("  line {}: {}\n", e.line, e.message));
        }
        let rest = report.row_errors.len().saturating_sub(MAX_LISTED_ROW_ERRORS);
        if rest > 0 {
            out.push_str(&format!("  ... and {rest} more\n"));
        }
    }

    out
}

/// Format the batch report: a title line, then one line per item.
pub fn format_predictions(predictions: &[Prediction], target_year: i32) -> String {
    let mut out = format!("Predicted weekly sales for {target_year} (using Linear Regression):\n");
    for p in predictions {
        out.push_str(&format_prediction(p));
        out.push('\n');
    }
    out
}

/// One report line.
pub fn format_prediction(p: &Prediction) -> String {
    format!("Item: {}, Predicted Quantity: {}", p.item_name, p.predicted_quantity)
}

/// Format predictions as an aligned table including how each was produced.
pub fn format_table(predictions: &[Prediction]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<32} {:>6} {:>10} {:>6} {:<28}\n",
            "item", "year", "quantity", "years", "method"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<32} {:-<6} {:-<10} {:-<6} {:-<28}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    for p in predictions {
        out.push_str(
            format!(
                "{:<32} {:>6} {:>10} {:>6} {:<28}\n",
                truncate(&p.item_name, 32),
                p.target_year,
                p.predicted_quantity,
                p.years_observed,
                p.method.label(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn year_range(snapshot: &SalesSnapshot) -> Option<(i32, i32)> {
    let aggs = snapshot.aggregates();
    let lo = aggs.iter().map(|a| a.year).min()?;
    let hi = aggs.iter().map(|a| a.year).max()?;
    Some((lo, hi))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
