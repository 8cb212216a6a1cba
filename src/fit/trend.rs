//! Fit-or-fallback trend estimation.
//!
//! With two or more distinct years, a least-squares line of weekly quantity on
//! year is evaluated at the target year. With a single year there is no trend
//! to fit, and the mean of that year's values is carried forward.
//!
//! The line is evaluated wherever it is asked to be, including far outside the
//! observed years.

use std::collections::BTreeSet;

use crate::domain::{NegativePolicy, PredictionMethod, SeriesPoint};
use crate::math::{LineFit, fit_line};

/// Raw (unrounded) estimate for one target year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub method: PredictionMethod,
    /// The fitted line, when a trend was fitted.
    pub line: Option<LineFit>,
    pub years_observed: usize,
}

impl Estimate {
    /// Whole-unit quantity under the given negative-value policy.
    pub fn quantity(&self, policy: NegativePolicy) -> i64 {
        let q = round_quantity(self.value);
        match policy {
            NegativePolicy::Allow => q,
            NegativePolicy::ClampZero => q.max(0),
        }
    }
}

/// Estimate the weekly quantity at `target_year`.
///
/// Returns `None` for an empty series.
pub fn predict(series: &[SeriesPoint], target_year: i32) -> Option<Estimate> {
    if series.is_empty() {
        return None;
    }

    let years: BTreeSet<i32> = series.iter().map(|p| p.year).collect();
    let years_observed = years.len();

    if years_observed >= 2 {
        let xs: Vec<f64> = series.iter().map(|p| f64::from(p.year)).collect();
        let ys: Vec<f64> = series.iter().map(|p| p.quantity).collect();
        if let Some(line) = fit_line(&xs, &ys) {
            return Some(Estimate {
                value: line.eval(f64::from(target_year)),
                method: PredictionMethod::Trend,
                line: Some(line),
                years_observed,
            });
        }
    }

    let mean = series.iter().map(|p| p.quantity).sum::<f64>() / series.len() as f64;
    Some(Estimate {
        value: mean,
        method: PredictionMethod::CarryForward,
        line: None,
        years_observed,
    })
}

/// Round to the nearest integer, ties to even.
pub fn round_quantity(value: f64) -> i64 {
    value.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(values: &[(i32, f64)]) -> Vec<SeriesPoint> {
        values
            .iter()
            .map(|&(year, quantity)| SeriesPoint { year, quantity })
            .collect()
    }

    #[test]
    fn single_year_carries_forward() {
        let est = predict(&pts(&[(2023, 100.0)]), 2024).unwrap();
        assert_eq!(est.method, PredictionMethod::CarryForward);
        assert_eq!(est.quantity(NegativePolicy::Allow), 100);
        assert!(est.line.is_none());
    }

    #[test]
    fn single_year_with_several_rows_uses_mean() {
        let est = predict(&pts(&[(2023, 10.0), (2023, 20.0)]), 2030).unwrap();
        assert_eq!(est.method, PredictionMethod::CarryForward);
        assert_eq!(est.years_observed, 1);
        assert_eq!(est.quantity(NegativePolicy::Allow), 15);
    }

    #[test]
    fn two_years_extrapolate_linearly() {
        let est = predict(&pts(&[(2022, 100.0), (2023, 120.0)]), 2024).unwrap();
        assert_eq!(est.method, PredictionMethod::Trend);
        assert_eq!(est.quantity(NegativePolicy::Allow), 140);
    }

    #[test]
    fn order_of_points_is_irrelevant() {
        let a = predict(&pts(&[(2020, 7.0), (2021, 9.5), (2023, 15.75)]), 2024).unwrap();
        let b = predict(&pts(&[(2023, 15.75), (2020, 7.0), (2021, 9.5)]), 2024).unwrap();
        assert_eq!(a.quantity(NegativePolicy::Allow), b.quantity(NegativePolicy::Allow));
        assert!((a.value - b.value).abs() < 1e-9);
    }

    #[test]
    fn target_inside_observed_range() {
        let est = predict(&pts(&[(2020, 10.0), (2022, 30.0)]), 2021).unwrap();
        assert_eq!(est.quantity(NegativePolicy::Allow), 20);
    }

    #[test]
    fn falling_trend_can_go_negative_unless_clamped() {
        let est = predict(&pts(&[(2021, 30.0), (2022, 10.0)]), 2024).unwrap();
        assert_eq!(est.quantity(NegativePolicy::Allow), -30);
        assert_eq!(est.quantity(NegativePolicy::ClampZero), 0);
    }

    #[test]
    fn empty_series_has_no_estimate() {
        assert!(predict(&[], 2024).is_none());
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(round_quantity(12.5), 12);
        assert_eq!(round_quantity(13.5), 14);
        assert_eq!(round_quantity(-2.5), -2);
        assert_eq!(round_quantity(8.75), 9);
    }
}
