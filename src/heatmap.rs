//! Daily activity series and the week-column heatmap built from it.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar;
use crate::error::Result;
use crate::models::{Granularity, Transaction, TransactionKind};

/// Cells per heatmap column.
pub const DAYS_PER_COLUMN: usize = 7;

/// Highest quantized intensity level.
pub const MAX_LEVEL: u8 = 4;

/// Total of one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivityPoint {
    /// Calendar day.
    pub date: NaiveDate,
    /// Sum of the day's matching transactions.
    pub value: f64,
}

/// One heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HeatmapCell {
    /// A real day.
    Day {
        /// Calendar day.
        date: NaiveDate,
        /// The day's total.
        value: f64,
        /// `value / max(1, max value)`.
        intensity: f64,
        /// Intensity quantized to `0..=MAX_LEVEL`; 0 only for days
        /// without activity.
        level: u8,
    },
    /// Filler after the last day of a partial column.
    Padding,
}

impl HeatmapCell {
    /// ISO date of the cell, or an empty string for padding.
    #[must_use]
    pub fn date_label(&self) -> String {
        match *self {
            Self::Day { date, .. } => date.format("%Y-%m-%d").to_string(),
            Self::Padding => String::new(),
        }
    }

    /// Returns `true` for padding cells.
    #[inline]
    #[must_use]
    pub const fn is_padding(&self) -> bool {
        matches!(*self, Self::Padding)
    }
}

/// Grid of week columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    /// Columns of [`DAYS_PER_COLUMN`] cells each.
    pub columns: Vec<Vec<HeatmapCell>>,
    /// Largest daily value in the input (0 for an empty input).
    pub max_value: f64,
}

/// Builds an ascending, zero-filled series of `days` daily totals of `kind`
/// ending at `today`.
///
/// # Errors
///
/// Returns an error if the span leaves the supported date range.
#[tracing::instrument(level = "debug", skip(transactions), fields(transactions = transactions.len()))]
pub fn daily_series(
    transactions: &[Transaction],
    kind: TransactionKind,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<DailyActivityPoint>> {
    let periods = calendar::trailing_periods(today, Granularity::Day, days)?;
    let mut totals: HashMap<NaiveDate, f64> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.kind == kind) {
        *totals.entry(tx.date()).or_default() += tx.amount;
    }
    Ok(periods
        .iter()
        .map(|period| DailyActivityPoint {
            date: period.start,
            value: totals.get(&period.start).copied().unwrap_or_default(),
        })
        .collect())
}

/// Lays daily points out as columns of seven consecutive input days.
///
/// Columns follow input order rather than weekday alignment; the final
/// column is filled up with [`HeatmapCell::Padding`].
#[must_use]
pub fn build_heatmap(points: &[DailyActivityPoint]) -> Heatmap {
    let max_value = points
        .iter()
        .map(|point| point.value)
        .fold(0.0_f64, f64::max);
    let scale = max_value.max(1.0_f64);

    let columns = points
        .chunks(DAYS_PER_COLUMN)
        .map(|chunk| {
            let mut column: Vec<HeatmapCell> = chunk
                .iter()
                .map(|point| {
                    let intensity = point.value / scale;
                    HeatmapCell::Day {
                        date: point.date,
                        value: point.value,
                        intensity,
                        level: level_of(intensity),
                    }
                })
                .collect();
            column.resize(DAYS_PER_COLUMN, HeatmapCell::Padding);
            column
        })
        .collect();

    Heatmap { columns, max_value }
}

/// Quantizes an intensity into quarter steps.
fn level_of(intensity: f64) -> u8 {
    if intensity <= 0.0_f64 {
        0
    } else if intensity <= 0.25_f64 {
        1
    } else if intensity <= 0.5_f64 {
        2
    } else if intensity <= 0.75_f64 {
        3
    } else {
        MAX_LEVEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trends::tests::{date, tx};

    fn points(values: &[f64]) -> Vec<DailyActivityPoint> {
        let mut day = date(2024, 3, 1);
        values
            .iter()
            .map(|&value| {
                let point = DailyActivityPoint { date: day, value };
                day = day.succ_opt().unwrap();
                point
            })
            .collect()
    }

    #[test]
    fn ten_days_make_two_columns() {
        let heatmap = build_heatmap(&points(&[1.0; 10]));
        assert_eq!(heatmap.columns.len(), 2);
        assert!(heatmap.columns.iter().all(|c| c.len() == DAYS_PER_COLUMN));
        assert!(heatmap.columns[0].iter().all(|c| !c.is_padding()));
        let second = &heatmap.columns[1];
        assert!(second[..3].iter().all(|c| !c.is_padding()));
        assert!(second[3..].iter().all(HeatmapCell::is_padding));
        assert_eq!(second[3].date_label(), "");
        assert_eq!(second[0].date_label(), "2024-03-08");
    }

    #[test]
    fn zero_value_day_is_not_padding() {
        let heatmap = build_heatmap(&points(&[0.0]));
        let cell = heatmap.columns[0][0];
        assert!(!cell.is_padding());
        assert_eq!(cell.date_label(), "2024-03-01");
        assert!(matches!(cell, HeatmapCell::Day { level: 0, .. }));
    }

    #[test]
    fn intensity_is_relative_to_max_with_floor_of_one() {
        let heatmap = build_heatmap(&points(&[50.0, 100.0, 10.0, 80.0]));
        assert!((heatmap.max_value - 100.0).abs() < f64::EPSILON);
        let levels: Vec<u8> = heatmap.columns[0]
            .iter()
            .filter_map(|cell| match *cell {
                HeatmapCell::Day { level, .. } => Some(level),
                HeatmapCell::Padding => None,
            })
            .collect();
        assert_eq!(levels, [2, 4, 1, 4]);

        let small = build_heatmap(&points(&[0.5]));
        match small.columns[0][0] {
            HeatmapCell::Day { intensity, .. } => assert!((intensity - 0.5).abs() < f64::EPSILON),
            HeatmapCell::Padding => panic!("expected a day"),
        }
    }

    #[test]
    fn empty_input_has_no_columns() {
        let heatmap = build_heatmap(&[]);
        assert!(heatmap.columns.is_empty());
        assert!(heatmap.max_value.abs() < f64::EPSILON);
    }

    #[test]
    fn daily_series_is_zero_filled_and_ascending() {
        let transactions = vec![
            tx("t1", TransactionKind::Expense, 10.0, date(2024, 3, 3), None),
            tx("t2", TransactionKind::Expense, 5.0, date(2024, 3, 3), None),
            tx("t3", TransactionKind::Income, 99.0, date(2024, 3, 4), None),
            tx("t4", TransactionKind::Expense, 7.0, date(2024, 2, 1), None),
        ];
        let series =
            daily_series(&transactions, TransactionKind::Expense, date(2024, 3, 4), 3).unwrap();
        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, [date(2024, 3, 2), date(2024, 3, 3), date(2024, 3, 4)]);
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, [0.0, 15.0, 0.0]);

        assert!(
            daily_series(&transactions, TransactionKind::Expense, date(2024, 3, 4), 0)
                .unwrap()
                .is_empty()
        );
    }
}
