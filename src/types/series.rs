//! Defines the daily minimum temperature series returned by the archive and the
//! query that identifies it.

use crate::types::city::LatLon;
use crate::types::temperature_unit::TemperatureUnit;
use chrono::NaiveDate;
use std::ops::RangeInclusive;

/// One day of the series: the minimum temperature two metres above ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyTemperaturePoint {
    /// The UTC calendar day this value belongs to.
    pub date: NaiveDate,
    /// Daily minimum temperature in the series' unit, `None` when the archive
    /// has no value for the day.
    pub temperature_2m: Option<f64>,
}

impl DailyTemperaturePoint {
    pub fn new(date: NaiveDate, temperature_2m: f64) -> Self {
        Self {
            date,
            temperature_2m: Some(temperature_2m),
        }
    }

    /// A day the archive reported without a temperature.
    pub fn missing(date: NaiveDate) -> Self {
        Self {
            date,
            temperature_2m: None,
        }
    }
}

/// A daily minimum temperature series for one location, date range and unit.
///
/// Points are ordered by ascending date with one point per day, including days
/// without a recorded temperature. The location
/// is the one reported by the archive, which snaps requests to its grid and can
/// therefore differ slightly from the requested coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSeries {
    /// Grid latitude reported by the archive.
    pub latitude: f64,
    /// Grid longitude reported by the archive.
    pub longitude: f64,
    /// The unit every point is expressed in.
    pub unit: TemperatureUnit,
    /// The daily points, ascending by date.
    pub points: Vec<DailyTemperaturePoint>,
}

impl TemperatureSeries {
    pub fn new(
        location: LatLon,
        unit: TemperatureUnit,
        points: Vec<DailyTemperaturePoint>,
    ) -> Self {
        Self {
            latitude: location.0,
            longitude: location.1,
            unit,
            points,
        }
    }

    pub fn location(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the temperatures in date order, `None` for missing days.
    pub fn temperatures(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.points.iter().map(|p| p.temperature_2m)
    }

    /// Iterates over the recorded temperatures only, skipping missing days.
    pub fn recorded_temperatures(&self) -> impl Iterator<Item = f64> + '_ {
        self.temperatures().flatten()
    }

    pub fn missing_days(&self) -> usize {
        self.points.iter().filter(|p| p.temperature_2m.is_none()).count()
    }
}

/// The inputs that fully determine a fetched series.
///
/// Two equal queries always describe the same series, which is what the
/// dashboard memoizes on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesQuery {
    /// Catalog key of the selected city.
    pub city_state: String,
    /// First requested day (inclusive).
    pub start_date: NaiveDate,
    /// Last requested day (inclusive, as the archive interprets it).
    pub end_date: NaiveDate,
    pub unit: TemperatureUnit,
}

impl SeriesQuery {
    pub fn new(
        city_state: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        unit: TemperatureUnit,
    ) -> Self {
        Self {
            city_state: city_state.into(),
            start_date,
            end_date,
            unit,
        }
    }

    /// Returns a description of the problem if the dates are reversed or fall
    /// outside `supported`.
    pub fn check_dates(&self, supported: &RangeInclusive<NaiveDate>) -> Option<String> {
        if self.start_date > self.end_date {
            return Some(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            ));
        }
        if !supported.contains(&self.start_date) || !supported.contains(&self.end_date) {
            return Some(format!(
                "dates {}..={} fall outside the supported range {}..={}",
                self.start_date,
                self.end_date,
                supported.start(),
                supported.end()
            ));
        }
        None
    }
}

/// The historical range the dashboard offers: 2020-01-01 through 2024-01-01.
pub fn default_supported_range() -> RangeInclusive<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).expect("literal date is valid");
    let end = NaiveDate::from_ymd_opt(2024, 1, 1).expect("literal date is valid");
    start..=end
}
