//! Ordinary least squares.
//!
//! Trend fits here are tiny (one row per observed year, two columns), but the
//! year values are large and close together, which makes the raw
//! `[1, year]` design matrix badly conditioned. `fit_line` therefore centres
//! the predictor on its mean before solving and shifts the intercept back
//! afterwards.
//!
//! The solve itself goes through SVD so that degenerate inputs (all `x`
//! equal) come back as `None` instead of garbage.

use nalgebra::{DMatrix, DVector};

/// A fitted line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
}

impl LineFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = a + b x` by least squares.
///
/// Returns `None` when there are fewer than two points, the inputs differ in
/// length, or `x` has no spread.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<LineFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len();
    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let spread = xs.iter().map(|x| (x - x_mean).abs()).fold(0.0, f64::max);
    if spread == 0.0 {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, x) in xs.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = x - x_mean;
    }
    let y = DVector::from_column_slice(ys);

    let beta = solve_least_squares(&design, &y)?;
    let slope = beta[1];
    Some(LineFit {
        intercept: beta[0] - slope * x_mean,
        slope,
    })
}
