//! Derives the plot-ready columns of a temperature series: which days stayed
//! above the plot threshold, and the requested rolling averages.

use crate::analysis::rolling::{trailing_mean, RollingWindow};
use crate::types::series::TemperatureSeries;
use crate::types::temperature_unit::TemperatureUnit;
use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, PolarsResult};
use std::collections::BTreeSet;

/// One day of an [`AnnotatedSeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedPoint {
    pub date: NaiveDate,
    /// `None` on days the archive has no value for.
    pub temperature_2m: Option<f64>,
    /// `temperature_2m > threshold`; always `false` on a missing day.
    pub above_threshold: bool,
    /// 7-day trailing mean, if requested and enough history exists.
    pub weekly_avg: Option<f64>,
    /// 30-day trailing mean, if requested and enough history exists.
    pub monthly_avg: Option<f64>,
}

impl AnnotatedPoint {
    pub fn rolling_avg(&self, window: RollingWindow) -> Option<f64> {
        match window {
            RollingWindow::Weekly => self.weekly_avg,
            RollingWindow::Monthly => self.monthly_avg,
        }
    }
}

/// A temperature series with threshold flags and rolling averages, ready to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    pub latitude: f64,
    pub longitude: f64,
    pub unit: TemperatureUnit,
    pub threshold: f64,
    /// The windows that were computed, in a stable order.
    pub windows: BTreeSet<RollingWindow>,
    pub points: Vec<AnnotatedPoint>,
}

/// Annotates every point of `series` against `threshold` and computes the
/// requested rolling averages.
///
/// The output has the same length and order as the input; the input is left
/// untouched. A rolling average is `None` wherever its window holds a missing
/// day.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use heatpump::{annotate, DailyTemperaturePoint, LatLon, RollingWindow, TemperatureSeries, TemperatureUnit};
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
/// let annotated = annotate(&series, 8.0, &[RollingWindow::Weekly]);
/// let flags: Vec<bool> = annotated.points.iter().map(|p| p.above_threshold).collect();
/// assert_eq!(flags, vec![true, false, true]);
/// assert!(annotated.points.iter().all(|p| p.weekly_avg.is_none()));
/// ```
pub fn annotate(
    series: &TemperatureSeries,
    threshold: f64,
    rolling_windows: &[RollingWindow],
) -> AnnotatedSeries {
    let windows: BTreeSet<RollingWindow> = rolling_windows.iter().copied().collect();
    let temperatures: Vec<Option<f64>> = series.temperatures().collect();

    let rolling_for = |window: RollingWindow| {
        if windows.contains(&window) {
            trailing_mean(&temperatures, window.days())
        } else {
            vec![None; temperatures.len()]
        }
    };
    let weekly = rolling_for(RollingWindow::Weekly);
    let monthly = rolling_for(RollingWindow::Monthly);

    let points = series
        .points
        .iter()
        .zip(weekly)
        .zip(monthly)
        .map(|((point, weekly_avg), monthly_avg)| AnnotatedPoint {
            date: point.date,
            temperature_2m: point.temperature_2m,
            above_threshold: point.temperature_2m.is_some_and(|t| t > threshold),
            weekly_avg,
            monthly_avg,
        })
        .collect();

    AnnotatedSeries {
        latitude: series.latitude,
        longitude: series.longitude,
        unit: series.unit,
        threshold,
        windows,
        points,
    }
}

impl AnnotatedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Exports the series with the columns `date, temperature_2m,
    /// above_threshold` plus one column per computed rolling window.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<NaiveDate> = self.points.iter().map(|p| p.date).collect();
        let temperatures: Vec<Option<f64>> =
            self.points.iter().map(|p| p.temperature_2m).collect();
        let flags: Vec<bool> = self.points.iter().map(|p| p.above_threshold).collect();

        let mut columns = vec![
            Column::new("date".into(), dates),
            Column::new("temperature_2m".into(), temperatures),
            Column::new("above_threshold".into(), flags),
        ];
        for window in &self.windows {
            let averages: Vec<Option<f64>> =
                self.points.iter().map(|p| p.rolling_avg(*window)).collect();
            columns.push(Column::new(window.column_name().into(), averages));
        }
        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::city::LatLon;
    use crate::types::series::DailyTemperaturePoint;
    use chrono::Duration;

    fn series_of(values: &[f64]) -> TemperatureSeries {
        let start = NaiveDate::from_ymd_opt(2022, 12, 1).unwrap();
        TemperatureSeries::new(
            LatLon(40.12, -88.26),
            TemperatureUnit::Fahrenheit,
            values
                .iter()
                .enumerate()
                .map(|(i, &t)| DailyTemperaturePoint::new(start + Duration::days(i as i64), t))
                .collect(),
        )
    }

    #[test]
    fn test_threshold_flags_are_strict() {
        let series = series_of(&[10.0, 5.0, 15.0, 8.0]);
        let annotated = annotate(&series, 8.0, &[]);

        let flags: Vec<bool> = annotated.points.iter().map(|p| p.above_threshold).collect();
        assert_eq!(flags, vec![true, false, true, false]);
        assert_eq!(annotated.len(), series.len());
        assert!(annotated.windows.is_empty());
    }

    #[test]
    fn test_rolling_averages_match_window_means() {
        let values: Vec<f64> = (0..45).map(|i| ((i * 7) % 23) as f64 - 4.5).collect();
        let series = series_of(&values);
        let annotated = annotate(
            &series,
            0.0,
            &[RollingWindow::Monthly, RollingWindow::Weekly, RollingWindow::Weekly],
        );

        assert_eq!(annotated.windows.len(), 2);
        for window in [RollingWindow::Weekly, RollingWindow::Monthly] {
            let w = window.days();
            for (i, point) in annotated.points.iter().enumerate() {
                match point.rolling_avg(window) {
                    None => assert!(i + 1 < w, "{} avg missing at {}", window, i),
                    Some(avg) => {
                        assert!(i + 1 >= w);
                        let mean = values[i + 1 - w..=i].iter().sum::<f64>() / w as f64;
                        assert!((avg - mean).abs() < 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_unrequested_window_is_absent() {
        let series = series_of(&[1.0; 40]);
        let annotated = annotate(&series, 0.0, &[RollingWindow::Weekly]);
        assert!(annotated.points.iter().all(|p| p.monthly_avg.is_none()));
        assert_eq!(annotated.points[6].weekly_avg, Some(1.0));
    }

    #[test]
    fn test_input_series_untouched() {
        let series = series_of(&[3.0, 4.0]);
        let before = series.clone();
        let _ = annotate(&series, 3.5, &[RollingWindow::Weekly]);
        assert_eq!(series, before);
    }

    #[test]
    fn test_missing_day_is_kept_and_blanks_rolling_windows() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let points = (0..8)
            .map(|i| {
                let day = start + Duration::days(i);
                if i == 3 {
                    DailyTemperaturePoint::missing(day)
                } else {
                    DailyTemperaturePoint::new(day, i as f64)
                }
            })
            .collect();
        let series = TemperatureSeries::new(LatLon(40.12, -88.26), TemperatureUnit::Fahrenheit, points);

        let annotated = annotate(&series, -100.0, &[RollingWindow::Weekly]);
        assert_eq!(annotated.len(), 8);
        assert_eq!(annotated.points[3].temperature_2m, None);
        assert!(!annotated.points[3].above_threshold);
        assert!(annotated.points[4].above_threshold);
        // Both full weeks (ending on day 7 and day 8) include the missing day.
        assert!(annotated.points.iter().all(|p| p.weekly_avg.is_none()));
    }

    #[test]
    fn test_to_frame_columns() -> PolarsResult<()> {
        let series = series_of(&[10.0, 5.0, 15.0]);
        let frame = annotate(&series, 8.0, &[RollingWindow::Weekly]).to_frame()?;

        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["date", "temperature_2m", "above_threshold", "w_rolling_avg"]
        );
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.column("w_rolling_avg")?.null_count(), 3);
        Ok(())
    }
}
