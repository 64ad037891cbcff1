//! Decoding of the archive's JSON response into a [`TemperatureSeries`].
//!
//! Requests ask for `timeformat=unixtime`, so the daily block carries epoch
//! seconds. The date axis is rebuilt from a start/end/interval descriptor and
//! must line up with both the timestamps and the values.

use crate::archive::error::FetchError;
use crate::types::city::LatLon;
use crate::types::series::{DailyTemperaturePoint, TemperatureSeries};
use crate::types::temperature_unit::TemperatureUnit;
use chrono::{DateTime, NaiveDate};
use log::warn;
use serde::Deserialize;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DailyBlock {
    pub time: Vec<i64>,
    pub temperature_2m_min: Vec<Option<f64>>,
}

/// Body of a rejected request, e.g. `{"error": true, "reason": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub reason: String,
}

/// Half-open time range `[start, end)` stepped by `interval`, all in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub start: i64,
    pub end: i64,
    pub interval: i64,
}

impl TimeAxis {
    /// Derives the descriptor from the first two timestamps. A lone timestamp
    /// spans one day. Returns `None` for an empty or non-increasing axis, or
    /// one whose span does not fit in an `i64`.
    pub fn from_timestamps(time: &[i64]) -> Option<Self> {
        let start = *time.first()?;
        let interval = match time.get(1) {
            Some(second) => second.checked_sub(start)?,
            None => SECONDS_PER_DAY,
        };
        if interval <= 0 {
            return None;
        }
        let end = time.last()?.checked_add(interval)?;
        if end.checked_sub(start).is_none() {
            return None;
        }
        Some(Self {
            start,
            end,
            interval,
        })
    }

    pub fn len(&self) -> usize {
        if self.interval <= 0 {
            return 0;
        }
        self.end
            .checked_sub(self.start)
            .map_or(0, |span| (span.max(0) / self.interval) as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The timestamps of the axis, in order.
    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len() as i64).map_while(move |k| {
            k.checked_mul(self.interval)
                .and_then(|offset| self.start.checked_add(offset))
        })
    }
}

impl ArchiveResponse {
    /// Converts the response into a series with one point per day.
    ///
    /// Days without a value (the archive reports `null` for days it has no
    /// reanalysis for yet) are kept as missing points and logged.
    pub(crate) fn into_series(
        self,
        unit: TemperatureUnit,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TemperatureSeries, FetchError> {
        let empty = || FetchError::EmptySeries {
            start: start_date,
            end: end_date,
        };
        let daily = self.daily.ok_or_else(empty)?;
        if daily.time.is_empty() {
            return Err(empty());
        }

        let axis = TimeAxis::from_timestamps(&daily.time).ok_or_else(|| {
            FetchError::MalformedResponse(
                "daily time axis is not increasing or is out of range".to_string(),
            )
        })?;
        if axis.interval != SECONDS_PER_DAY {
            return Err(FetchError::MalformedResponse(format!(
                "daily time axis steps by {} seconds instead of one day",
                axis.interval
            )));
        }
        if axis.len() != daily.time.len() || axis.len() != daily.temperature_2m_min.len() {
            return Err(FetchError::MalformedResponse(format!(
                "time axis spans {} steps but response has {} timestamps and {} values",
                axis.len(),
                daily.time.len(),
                daily.temperature_2m_min.len()
            )));
        }
        if let Some((expected, found)) = axis
            .timestamps()
            .zip(daily.time.iter().copied())
            .find(|(expected, found)| expected != found)
        {
            return Err(FetchError::MalformedResponse(format!(
                "daily time axis has a gap: expected {} but found {}",
                expected, found
            )));
        }

        let mut points = Vec::with_capacity(axis.len());
        let mut missing = 0usize;
        for (timestamp, value) in axis.timestamps().zip(daily.temperature_2m_min) {
            let date = DateTime::from_timestamp(timestamp, 0)
                .ok_or_else(|| {
                    FetchError::MalformedResponse(format!("timestamp {} out of range", timestamp))
                })?
                .date_naive();
            match value {
                Some(temperature) => points.push(DailyTemperaturePoint::new(date, temperature)),
                None => {
                    missing += 1;
                    points.push(DailyTemperaturePoint::missing(date));
                }
            }
        }

        if missing > 0 {
            warn!(
                "Archive has no temperature for {} of {} days between {} and {}",
                missing,
                axis.len(),
                start_date,
                end_date
            );
        }
        if missing == points.len() {
            return Err(empty());
        }

        Ok(TemperatureSeries::new(
            LatLon(self.latitude, self.longitude),
            unit,
            points,
        ))
    }
}
