//! Date-indexed return series.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Date, MoatError, Result};

/// Daily returns ordered by date.
///
/// Construction sorts observations by date; a later duplicate date replaces
/// an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<Date>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Build a series from `(date, return)` observations.
    pub fn new(observations: impl IntoIterator<Item = (Date, f64)>) -> Self {
        let ordered: std::collections::BTreeMap<Date, f64> = observations.into_iter().collect();
        let (dates, values) = ordered.into_iter().unzip();
        Self { dates, values }
    }

    /// Build a series from a frame with a date column and a float column.
    ///
    /// Rows with a null date or value are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`MoatError::MissingColumn`] when either column is absent and a
    /// Polars error when the columns have the wrong dtype.
    pub fn from_frame(df: &DataFrame, date_col: &str, value_col: &str) -> Result<Self> {
        let dates = df
            .column(date_col)
            .map_err(|_| MoatError::MissingColumn(date_col.to_string()))?
            .as_materialized_series()
            .date()?
            .as_date_iter()
            .collect::<Vec<_>>();
        let values = df
            .column(value_col)
            .map_err(|_| MoatError::MissingColumn(value_col.to_string()))?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .collect::<Vec<_>>();

        Ok(Self::new(
            dates
                .into_iter()
                .zip(values)
                .filter_map(|(d, v)| Some((d?, v?))),
        ))
    }

    /// Observation dates, ascending.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Returns in date order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Last observation date.
    pub fn last_date(&self) -> Option<Date> {
        self.dates.last().copied()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pair the two series on their common dates.
    pub fn align(&self, other: &Self) -> (Vec<f64>, Vec<f64>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.dates.len() && j < other.dates.len() {
            match self.dates[i].cmp(&other.dates[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    left.push(self.values[i]);
                    right.push(other.values[j]);
                    i += 1;
                    j += 1;
                }
            }
        }
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_series_sorted() {
        let series = ReturnSeries::new([(d(3), 0.03), (d(1), 0.01), (d(2), 0.02)]);
        assert_eq!(series.values(), &[0.01, 0.02, 0.03]);
        assert_eq!(series.last_date(), Some(d(3)));
    }

    #[test]
    fn test_align_intersects_dates() {
        let a = ReturnSeries::new([(d(1), 0.01), (d(2), 0.02), (d(4), 0.04)]);
        let b = ReturnSeries::new([(d(2), -0.02), (d(3), -0.03), (d(4), -0.04)]);
        let (left, right) = a.align(&b);
        assert_eq!(left, vec![0.02, 0.04]);
        assert_eq!(right, vec![-0.02, -0.04]);
    }

    #[test]
    fn test_from_frame() {
        let df = df! {
            "date" => &[d(2), d(1)],
            "ret" => &[0.02, 0.01],
        }
        .unwrap();
        let series = ReturnSeries::from_frame(&df, "date", "ret").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.values(), &[0.01, 0.02]);
    }

    #[test]
    fn test_from_frame_missing_column() {
        let df = df! { "date" => &[d(1)] }.unwrap();
        assert!(matches!(
            ReturnSeries::from_frame(&df, "date", "ret"),
            Err(MoatError::MissingColumn(_))
        ));
    }
}
