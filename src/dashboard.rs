//! The interactive session: resolves a city, fetches its series and derives
//! everything the plot, table and map need.
//!
//! Each interaction is a pure function of its inputs plus the static catalog.
//! The only state kept between interactions is a single-slot memo of the last
//! fetched series, keyed by the [`SeriesQuery`] that produced it, so that
//! changing only the threshold, rolling windows or table bounds does not hit
//! the network again.

use crate::analysis::annotate::{annotate, AnnotatedSeries};
use crate::analysis::rolling::RollingWindow;
use crate::analysis::threshold_table::{threshold_frame, threshold_table, ThresholdRow};
use crate::archive::client::ArchiveClient;
use crate::archive::error::FetchError;
use crate::catalog::city_catalog::CityCatalog;
use crate::catalog::error::CatalogError;
use crate::error::HeatpumpError;
use crate::types::city::{CityRecord, LatLon};
use crate::types::series::{default_supported_range, SeriesQuery, TemperatureSeries};
use crate::types::temperature_unit::TemperatureUnit;
use bon::bon;
use chrono::NaiveDate;
use log::{debug, info};
use polars::prelude::{DataFrame, PolarsResult};
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything derived from one interaction.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// The selected catalog entry.
    pub city: CityRecord,
    /// The series annotated for plotting.
    pub annotated: AnnotatedSeries,
    /// Days-below counts from `table_high` down to `table_low`.
    pub table: Vec<ThresholdRow>,
}

impl DashboardView {
    /// Grid coordinates reported by the archive, used to center the map.
    pub fn reported_location(&self) -> LatLon {
        LatLon(self.annotated.latitude, self.annotated.longitude)
    }

    /// The reported coordinates as shown under the city selector.
    ///
    /// ```
    /// # use heatpump::*;
    /// # use std::collections::BTreeSet;
    /// let view = DashboardView {
    ///     city: CityRecord::new("Champaign, Illinois", 40.1142, -88.2737),
    ///     annotated: AnnotatedSeries {
    ///         latitude: 40.124_565,
    ///         longitude: -88.263_84,
    ///         unit: TemperatureUnit::Fahrenheit,
    ///         threshold: 5.0,
    ///         windows: BTreeSet::new(),
    ///         points: vec![],
    ///     },
    ///     table: vec![],
    /// };
    /// assert_eq!(view.coordinates_label(), "40.1246°N, -88.2638°E");
    /// ```
    pub fn coordinates_label(&self) -> String {
        let LatLon(lat, lng) = self.reported_location();
        format!("{:.4}°N, {:.4}°E", lat, lng)
    }

    pub fn series_frame(&self) -> PolarsResult<DataFrame> {
        self.annotated.to_frame()
    }

    pub fn table_frame(&self) -> PolarsResult<DataFrame> {
        threshold_frame(&self.table)
    }
}

/// A dashboard session over a static city catalog.
///
/// # Examples
///
/// ```no_run
/// # use heatpump::{ArchiveClient, Dashboard, HeatpumpError, RollingWindow, TemperatureUnit};
/// # use chrono::NaiveDate;
/// # use std::path::Path;
/// # #[tokio::main]
/// # async fn main() -> Result<(), HeatpumpError> {
/// let client = ArchiveClient::builder().build()?;
/// let dashboard = Dashboard::open(Path::new("data/cities.csv"), client).await?;
///
/// let view = dashboard
///     .view()
///     .city_state("Champaign, Illinois")
///     .start_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
///     .end_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
///     .unit(TemperatureUnit::Fahrenheit)
///     .rolling_windows(vec![RollingWindow::Weekly])
///     .call()
///     .await?;
///
/// println!("{}", view.coordinates_label());
/// println!("{}", view.table_frame()?);
/// # Ok(())
/// # }
/// ```
pub struct Dashboard {
    catalog: CityCatalog,
    client: ArchiveClient,
    supported_range: RangeInclusive<NaiveDate>,
    memo: Mutex<Option<(SeriesQuery, Arc<TemperatureSeries>)>>,
}

#[bon]
impl Dashboard {
    pub fn new(catalog: CityCatalog, client: ArchiveClient) -> Self {
        Self {
            catalog,
            client,
            supported_range: default_supported_range(),
            memo: Mutex::new(None),
        }
    }

    /// Loads the catalog file off the async runtime and creates a session.
    pub async fn open(catalog_path: &Path, client: ArchiveClient) -> Result<Self, HeatpumpError> {
        let path = catalog_path.to_path_buf();
        let catalog = tokio::task::spawn_blocking(move || CityCatalog::load(&path)).await??;
        Ok(Self::new(catalog, client))
    }

    /// Replaces the range of dates queries may ask for.
    pub fn with_supported_range(mut self, supported_range: RangeInclusive<NaiveDate>) -> Self {
        self.supported_range = supported_range;
        self
    }

    pub fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    pub fn supported_range(&self) -> &RangeInclusive<NaiveDate> {
        &self.supported_range
    }

    /// Returns the series for `query`, fetching only when it differs from the
    /// last successfully fetched query.
    ///
    /// A failed fetch leaves the memo as it was, so the previous series stays
    /// available to the caller.
    ///
    /// # Errors
    ///
    /// * [`HeatpumpError::Catalog`] if the city is not catalogued.
    /// * [`HeatpumpError::Fetch`] if the dates are invalid or the archive fails.
    pub async fn series(&self, query: &SeriesQuery) -> Result<Arc<TemperatureSeries>, HeatpumpError> {
        if let Some(problem) = query.check_dates(&self.supported_range) {
            return Err(FetchError::InvalidQuery(problem).into());
        }

        {
            let memo = self.memo.lock().await;
            if let Some((cached_query, series)) = memo.as_ref() {
                if cached_query == query {
                    debug!("Reusing series for {:?}", query);
                    return Ok(Arc::clone(series));
                }
            }
        }

        let location = self.catalog.coordinates(&query.city_state)?;
        info!(
            "Fetching {} from {} to {} in {}",
            query.city_state, query.start_date, query.end_date, query.unit
        );
        let series = Arc::new(
            self.client
                .fetch_series(location, query.start_date, query.end_date, query.unit)
                .await?,
        );

        *self.memo.lock().await = Some((query.clone(), Arc::clone(&series)));
        Ok(series)
    }

    /// Computes the full view for one interaction.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.city_state(&str)`: **Required.** Catalog key of the city.
    /// * `.start_date(NaiveDate)` / `.end_date(NaiveDate)`: **Required.** Inclusive date range.
    /// * `.unit(TemperatureUnit)`: Optional. Defaults to Fahrenheit.
    /// * `.threshold(f64)`: Optional. Plot threshold, defaults to the unit's default.
    /// * `.rolling_windows(Vec<RollingWindow>)`: Optional. Defaults to none.
    /// * `.table_low(i32)` / `.table_high(i32)`: Optional. Table bounds, default to
    ///   the unit's defaults.
    #[builder]
    pub async fn view(
        &self,
        #[builder(into)] city_state: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        unit: Option<TemperatureUnit>,
        threshold: Option<f64>,
        #[builder(default)] rolling_windows: Vec<RollingWindow>,
        table_low: Option<i32>,
        table_high: Option<i32>,
    ) -> Result<DashboardView, HeatpumpError> {
        let unit = unit.unwrap_or_default();
        let threshold = threshold.unwrap_or_else(|| f64::from(unit.default_threshold()));
        let (default_low, default_high) = unit.default_table_bounds();
        let table_low = table_low.unwrap_or(default_low);
        let table_high = table_high.unwrap_or(default_high);

        let query = SeriesQuery::new(city_state, start_date, end_date, unit);
        let series = self.series(&query).await?;

        let city = self
            .catalog
            .get(&query.city_state)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownCity(query.city_state.clone()))?;
        let annotated = annotate(&series, threshold, &rolling_windows);
        let table = threshold_table(&series, table_low, table_high)?;

        Ok(DashboardView {
            city,
            annotated,
            table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // 2023-01-01T00:00:00Z
    const JAN_1_2023: i64 = 1_672_531_200;
    const DAY: i64 = 86_400;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn archive_body(values: &[f64]) -> serde_json::Value {
        let time: Vec<i64> = (0..values.len() as i64).map(|k| JAN_1_2023 + k * DAY).collect();
        serde_json::json!({
            "latitude": 40.12,
            "longitude": -88.26,
            "daily": {"time": time, "temperature_2m_min": values}
        })
    }

    fn dashboard(server: &MockServer) -> Result<Dashboard, HeatpumpError> {
        let client = ArchiveClient::builder()
            .base_url(server.uri())
            .use_cache(false)
            .max_attempts(1)
            .backoff_factor(0.0)
            .build()?;
        let catalog = CityCatalog::from_records(vec![
            CityRecord::new("Champaign, Illinois", 40.1142, -88.2737),
            CityRecord::new("Chicago, Illinois", 41.8375, -87.6866),
        ]);
        Ok(Dashboard::new(catalog, client))
    }

    fn query(city: &str, unit: TemperatureUnit) -> SeriesQuery {
        SeriesQuery::new(city, date(2023, 1, 1), date(2023, 1, 3), unit)
    }

    #[tokio::test]
    async fn test_series_memoized_per_query() -> Result<(), HeatpumpError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&[10.0, 5.0, 15.0])))
            .expect(2)
            .mount(&server)
            .await;
        let dashboard = dashboard(&server)?;

        let fahrenheit = query("Champaign, Illinois", TemperatureUnit::Fahrenheit);
        let first = dashboard.series(&fahrenheit).await?;
        let again = dashboard.series(&fahrenheit).await?;
        assert!(Arc::ptr_eq(&first, &again));

        let celsius = query("Champaign, Illinois", TemperatureUnit::Celsius);
        let switched = dashboard.series(&celsius).await?;
        assert!(!Arc::ptr_eq(&first, &switched));
        assert_eq!(switched.unit, TemperatureUnit::Celsius);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_series() -> Result<(), HeatpumpError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("latitude", "41.8375"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("latitude", "40.1142"))
            .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&[10.0, 5.0, 15.0])))
            .expect(1)
            .mount(&server)
            .await;
        let dashboard = dashboard(&server)?;

        let champaign = query("Champaign, Illinois", TemperatureUnit::Fahrenheit);
        let first = dashboard.series(&champaign).await?;

        let chicago = query("Chicago, Illinois", TemperatureUnit::Fahrenheit);
        assert!(matches!(
            dashboard.series(&chicago).await,
            Err(HeatpumpError::Fetch(FetchError::RetriesExhausted { .. }))
        ));

        let after_failure = dashboard.series(&champaign).await?;
        assert!(Arc::ptr_eq(&first, &after_failure));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_unknown_city_and_unsupported_dates() -> Result<(), HeatpumpError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&[1.0])))
            .expect(0)
            .mount(&server)
            .await;
        let dashboard = dashboard(&server)?;

        assert!(matches!(
            dashboard.series(&query("Gotham, New Jersey", TemperatureUnit::Fahrenheit)).await,
            Err(HeatpumpError::Catalog(CatalogError::UnknownCity(_)))
        ));

        let too_late = SeriesQuery::new(
            "Champaign, Illinois",
            date(2023, 6, 1),
            date(2025, 1, 1),
            TemperatureUnit::Fahrenheit,
        );
        assert!(matches!(
            dashboard.series(&too_late).await,
            Err(HeatpumpError::Fetch(FetchError::InvalidQuery(_)))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_view_applies_unit_defaults() -> Result<(), HeatpumpError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("temperature_unit", "celsius"))
            .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&[-21.0, -15.0, -9.5])))
            .expect(1)
            .mount(&server)
            .await;
        let dashboard = dashboard(&server)?;

        let view = dashboard
            .view()
            .city_state("Champaign, Illinois")
            .start_date(date(2023, 1, 1))
            .end_date(date(2023, 1, 3))
            .unit(TemperatureUnit::Celsius)
            .rolling_windows(vec![RollingWindow::Weekly])
            .call()
            .await?;

        assert_eq!(view.city.city_state, "Champaign, Illinois");
        assert_eq!(view.reported_location(), LatLon(40.12, -88.26));
        assert_eq!(view.annotated.threshold, -15.0);
        let flags: Vec<bool> = view.annotated.points.iter().map(|p| p.above_threshold).collect();
        assert_eq!(flags, vec![false, false, true]);

        // Celsius table defaults to -10 down to -20.
        assert_eq!(view.table.len(), 11);
        assert_eq!(view.table[0].temperature, -10);
        assert_eq!(view.table[0].days_below, 2);
        assert_eq!(view.table[10].temperature, -20);
        assert_eq!(view.table[10].days_below, 1);

        assert_eq!(view.series_frame()?.height(), 3);
        assert_eq!(view.table_frame()?.height(), 11);
        Ok(())
    }

    #[tokio::test]
    async fn test_view_reuses_series_for_new_threshold() -> Result<(), HeatpumpError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&[10.0, 5.0, 15.0])))
            .expect(1)
            .mount(&server)
            .await;
        let dashboard = dashboard(&server)?;

        for threshold in [8.0, 12.0] {
            let view = dashboard
                .view()
                .city_state("Champaign, Illinois")
                .start_date(date(2023, 1, 1))
                .end_date(date(2023, 1, 3))
                .threshold(threshold)
                .table_low(5)
                .table_high(15)
                .call()
                .await?;
            assert_eq!(view.annotated.threshold, threshold);
            assert_eq!(view.table.len(), 11);
        }
        Ok(())
    }
}
