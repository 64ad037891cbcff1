//! Counts, for every whole-degree temperature in a range, how many days of a
//! series stayed strictly below it.

use crate::analysis::error::AnalysisError;
use crate::types::series::TemperatureSeries;
use polars::prelude::{Column, DataFrame, PolarsResult};

/// One line of the threshold table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRow {
    pub temperature: i32,
    /// Days with `temperature_2m < temperature`.
    pub days_below: usize,
    /// `days_below / total days`, rounded to 3 decimals. Days without a
    /// recorded temperature count toward the total but never as below.
    pub proportion_below: f64,
}

/// Builds one row per integer temperature from `high` down to `low`, inclusive.
///
/// # Errors
///
/// * [`AnalysisError::InvalidBounds`] if `low > high`.
/// * [`AnalysisError::EmptySeries`] if `series` has no points, since the
///   proportions would be undefined.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use heatpump::{threshold_table, DailyTemperaturePoint, LatLon, TemperatureSeries, TemperatureUnit};
///
/// let day = |d| NaiveDate::from_ymd_opt(2023, 1, d).unwrap();
/// let series = TemperatureSeries::new(
///     LatLon(40.1, -88.2),
///     TemperatureUnit::Fahrenheit,
///     vec![
///         DailyTemperaturePoint::new(day(1), 10.0),
///         DailyTemperaturePoint::new(day(2), 5.0),
///         DailyTemperaturePoint::new(day(3), 15.0),
///     ],
/// );
///
/// let rows = threshold_table(&series, 5, 15)?;
/// assert_eq!(rows.len(), 11);
/// assert_eq!((rows[0].temperature, rows[0].days_below), (15, 2));
/// assert_eq!(rows[0].proportion_below, 0.667);
/// # Ok::<(), heatpump::AnalysisError>(())
/// ```
pub fn threshold_table(
    series: &TemperatureSeries,
    low: i32,
    high: i32,
) -> Result<Vec<ThresholdRow>, AnalysisError> {
    if low > high {
        return Err(AnalysisError::InvalidBounds { low, high });
    }
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }

    let mut sorted: Vec<f64> = series.recorded_temperatures().collect();
    sorted.sort_by(f64::total_cmp);
    let total = series.len() as f64;

    Ok((low..=high)
        .rev()
        .map(|temperature| {
            let bound = f64::from(temperature);
            let days_below = sorted.partition_point(|&t| t < bound);
            ThresholdRow {
                temperature,
                days_below,
                proportion_below: round_to_thousandths(days_below as f64 / total),
            }
        })
        .collect())
}

/// Rounds half to even at the third decimal.
fn round_to_thousandths(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}

/// Exports rows with the columns `Temperature, Days_Below, Proportion_Below`.
pub fn threshold_frame(rows: &[ThresholdRow]) -> PolarsResult<DataFrame> {
    let temperatures: Vec<i32> = rows.iter().map(|r| r.temperature).collect();
    let days: Vec<u64> = rows.iter().map(|r| r.days_below as u64).collect();
    let proportions: Vec<f64> = rows.iter().map(|r| r.proportion_below).collect();
    DataFrame::new(vec![
        Column::new("Temperature".into(), temperatures),
        Column::new("Days_Below".into(), days),
        Column::new("Proportion_Below".into(), proportions),
    ])
}
