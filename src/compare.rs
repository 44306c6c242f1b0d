//! Period-over-period comparison of aggregated windows.
//!
//! The comparator only reports the raw signed delta. Whether a change is
//! good news depends on the metric (less spending is favorable even though
//! its delta is negative), so the caller passes `invert` and receives a
//! [`Favorability`] tag; mapping that tag to colours is a presentation
//! concern.

use serde::Serialize;

/// Whether a change is good news for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Favorability {
    /// The metric moved in the desired direction (or did not move).
    Favorable,
    /// The metric moved in the undesired direction.
    Unfavorable,
    /// No percentage could be computed.
    Unavailable,
}

/// Result of comparing two equal-length windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowComparison {
    /// Sum of the current window.
    pub current: f64,
    /// Sum of the previous window.
    pub previous: f64,
    /// `current - previous`.
    pub delta: f64,
    /// Percentage change; `None` when the previous sum is zero.
    pub pct: Option<f64>,
    /// Classification of `pct` for the metric's sign convention.
    pub favorability: Favorability,
}

/// Percentage change from `previous` to `current`, relative to the
/// magnitude of `previous`.
///
/// Returns `None` when `previous` is zero; the result is never infinite or
/// NaN for finite inputs.
#[inline]
#[must_use]
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0_f64 {
        return None;
    }
    let pct = (current - previous) / previous.abs() * 100.0_f64;
    pct.is_finite().then_some(pct)
}

/// Classifies a percentage change.
///
/// With `invert` unset an increase is favorable (income, balance); with it
/// set a decrease is favorable (expenses). A zero change is favorable
/// either way.
#[inline]
#[must_use]
pub fn classify(pct: Option<f64>, invert: bool) -> Favorability {
    match pct {
        None => Favorability::Unavailable,
        Some(value) => {
            let improved = if invert {
                value <= 0.0_f64
            } else {
                value >= 0.0_f64
            };
            if improved {
                Favorability::Favorable
            } else {
                Favorability::Unfavorable
            }
        }
    }
}

/// Compares the sums of two windows.
///
/// Returns `None` when either window is empty or the windows differ in
/// length, since such a comparison would not be like-for-like.
#[must_use]
pub fn compare_windows(
    current: &[f64],
    previous: &[f64],
    invert: bool,
) -> Option<WindowComparison> {
    if current.is_empty() || previous.is_empty() || current.len() != previous.len() {
        return None;
    }
    let current_sum: f64 = current.iter().sum();
    let previous_sum: f64 = previous.iter().sum();
    let pct = percent_change(current_sum, previous_sum);
    Some(WindowComparison {
        current: current_sum,
        previous: previous_sum,
        delta: current_sum - previous_sum,
        pct,
        favorability: classify(pct, invert),
    })
}

/// Splits the tail of a series into `(previous, current)` windows of
/// `window` values each.
///
/// Returns `None` when the series holds fewer than `2 * window` values or
/// `window` is zero.
#[must_use]
pub fn split_windows(values: &[f64], window: usize) -> Option<(&[f64], &[f64])> {
    if window == 0 {
        return None;
    }
    let start = values.len().checked_sub(window.checked_mul(2)?)?;
    let (_, tail) = values.split_at_checked(start)?;
    tail.split_at_checked(window)
}
