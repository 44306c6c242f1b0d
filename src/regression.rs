//! Least-squares trend lines over an ordered series.

use serde::Serialize;

/// Slopes whose magnitude is below this are reported as flat.
pub const FLAT_EPSILON: f64 = 1e-9;

/// Direction of a fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrendDirection {
    /// Positive slope.
    Up,
    /// Negative slope.
    Down,
    /// Slope within [`FLAT_EPSILON`] of zero.
    Flat,
}

impl TrendDirection {
    /// Classifies a slope.
    #[inline]
    #[must_use]
    pub fn from_slope(slope: f64) -> Self {
        if slope.abs() < FLAT_EPSILON {
            Self::Flat
        } else if slope > 0.0_f64 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// Ordinary least-squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendFit {
    /// Change in value per index step.
    pub slope: f64,
    /// Value at index 0.
    pub intercept: f64,
    /// Sign of the slope.
    pub direction: TrendDirection,
    /// Slope as a percentage of the window's mean value; absent when the
    /// mean is zero.
    pub slope_pct_of_mean: Option<f64>,
    /// Number of points fitted.
    pub points: usize,
}

impl TrendFit {
    /// Evaluates the line at `x`.
    #[inline]
    #[must_use]
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }
}

/// Fits a least-squares line through `(index, value)` pairs.
///
/// Returns `None` when fewer than two points are given, when the x values
/// are all equal (zero denominator), or when the sums overflow to a
/// non-finite slope.
#[must_use]
pub fn fit_trend_line(points: &[(f64, f64)]) -> Option<TrendFit> {
    if points.len() < 2 {
        return None;
    }

    let mut n = 0.0_f64;
    let mut sum_x = 0.0_f64;
    let mut sum_y = 0.0_f64;
    let mut sum_xy = 0.0_f64;
    let mut sum_x2 = 0.0_f64;
    for &(x, y) in points {
        n += 1.0_f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n.mul_add(sum_x2, -(sum_x * sum_x));
    if denominator == 0.0_f64 {
        return None;
    }
    let slope = n.mul_add(sum_xy, -(sum_x * sum_y)) / denominator;
    let intercept = slope.mul_add(-sum_x, sum_y) / n;
    if !slope.is_finite() || !intercept.is_finite() {
        return None;
    }

    let mean = sum_y / n;
    let slope_pct_of_mean = (mean != 0.0_f64).then(|| slope / mean.abs() * 100.0_f64);

    Some(TrendFit {
        slope,
        intercept,
        direction: TrendDirection::from_slope(slope),
        slope_pct_of_mean,
        points: points.len(),
    })
}

/// Fits a line through `values`, using each value's position (0, 1, ...)
/// as its x coordinate.
#[must_use]
pub fn fit_values(values: &[f64]) -> Option<TrendFit> {
    let mut x = 0.0_f64;
    let points: Vec<(f64, f64)> = values
        .iter()
        .map(|&y| {
            let point = (x, y);
            x += 1.0_f64;
            point
        })
        .collect();
    fit_trend_line(&points)
}
