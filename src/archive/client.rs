//! Client for the Open-Meteo historical weather archive.
//!
//! One [`ArchiveClient::fetch_series`] call issues at most one logical request
//! for the daily minimum temperature of a location. The transport retries
//! transient failures with exponential backoff and keeps successful response
//! bodies in a [`ResponseCache`] that never expires.

use crate::archive::cache::ResponseCache;
use crate::archive::error::FetchError;
use crate::archive::response::{ApiErrorBody, ArchiveResponse};
use crate::types::city::LatLon;
use crate::types::series::TemperatureSeries;
use crate::types::temperature_unit::TemperatureUnit;
use crate::utils::get_cache_dir;
use bon::bon;
use chrono::NaiveDate;
use log::{info, warn};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://archive-api.open-meteo.com";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DAILY_VARIABLE: &str = "temperature_2m_min";

/// Fetches daily minimum temperature series from the weather archive.
///
/// # Examples
///
/// ```no_run
/// # use heatpump::{ArchiveClient, FetchError, LatLon, TemperatureUnit};
/// # use chrono::NaiveDate;
/// # #[tokio::main]
/// # async fn main() -> Result<(), FetchError> {
/// let client = ArchiveClient::builder().build()?;
/// let series = client
///     .fetch_series(
///         LatLon(40.1142, -88.2737),
///         NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
///         NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
///         TemperatureUnit::Fahrenheit,
///     )
///     .await?;
/// println!("{} days at {:?}", series.len(), series.location());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: Client,
    base_url: String,
    cache: Option<ResponseCache>,
    max_attempts: u32,
    backoff_factor: f64,
}

#[bon]
impl ArchiveClient {
    /// Creates a client.
    ///
    /// # Arguments
    ///
    /// * `.base_url(String)`: Optional. Archive host, defaults to [`DEFAULT_BASE_URL`].
    /// * `.cache_folder(PathBuf)`: Optional. Where responses are cached. Defaults to
    ///   the user cache directory (e.g. `~/.cache/heatpump_rs_cache`).
    /// * `.use_cache(bool)`: Optional. Defaults to `true`.
    /// * `.max_attempts(u32)`: Optional. Attempts per request, defaults to 5.
    /// * `.backoff_factor(f64)`: Optional. Seconds; the n-th retry waits
    ///   `backoff_factor * 2^(n-1)`. Defaults to 0.2.
    /// * `.timeout(Duration)`: Optional. Per-attempt timeout, defaults to 30 s.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be created.
    #[builder]
    pub fn new(
        #[builder(into)] base_url: Option<String>,
        cache_folder: Option<PathBuf>,
        #[builder(default = true)] use_cache: bool,
        #[builder(default = DEFAULT_MAX_ATTEMPTS)] max_attempts: u32,
        #[builder(default = DEFAULT_BACKOFF_FACTOR)] backoff_factor: f64,
        #[builder(default = DEFAULT_TIMEOUT)] timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::ClientBuild)?;

        let cache = if use_cache {
            match cache_folder.or_else(get_cache_dir) {
                Some(dir) => Some(ResponseCache::new(&dir)),
                None => {
                    warn!("Could not determine a cache directory; responses will not be cached");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            cache,
            max_attempts: max_attempts.max(1),
            backoff_factor: backoff_factor.max(0.0),
        })
    }
}

impl ArchiveClient {
    /// Fetches the daily minimum temperature at `location` from `start_date` to
    /// `end_date` (both inclusive, as the archive interprets them).
    ///
    /// The returned series carries the grid coordinates the archive reports,
    /// which may differ slightly from `location`.
    ///
    /// # Errors
    ///
    /// * [`FetchError::InvalidQuery`] if `start_date > end_date`. No request is made.
    /// * [`FetchError::RetriesExhausted`] if transient failures persist for every attempt.
    /// * [`FetchError::Api`] / [`FetchError::HttpStatus`] for rejected requests.
    /// * [`FetchError::Decode`] / [`FetchError::MalformedResponse`] for unusable bodies.
    /// * [`FetchError::EmptySeries`] if the archive has no temperatures for the range.
    pub async fn fetch_series(
        &self,
        location: LatLon,
        start_date: NaiveDate,
        end_date: NaiveDate,
        unit: TemperatureUnit,
    ) -> Result<TemperatureSeries, FetchError> {
        if start_date > end_date {
            return Err(FetchError::InvalidQuery(format!(
                "start date {} is after end date {}",
                start_date, end_date
            )));
        }

        let url = self.request_url(location, start_date, end_date, unit);
        let cache_key = self.cache_key(location, start_date, end_date, unit);

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(&cache_key).await {
                match serde_json::from_slice::<ArchiveResponse>(&body) {
                    Ok(response) => return response.into_series(unit, start_date, end_date),
                    Err(e) => warn!("Discarding unreadable cache entry for {}: {}", cache_key, e),
                }
            }
        }

        let body = self.get_with_retry(&url).await?;
        let response: ArchiveResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
                url: url.clone(),
                source: e,
            })?;
        let series = response.into_series(unit, start_date, end_date)?;

        if let Some(cache) = &self.cache {
            cache.put(&cache_key, &body).await;
        }
        info!(
            "Fetched {} daily points for ({}, {}) from {} to {}",
            series.len(),
            series.latitude,
            series.longitude,
            start_date,
            end_date
        );
        Ok(series)
    }

    fn request_url(
        &self,
        location: LatLon,
        start_date: NaiveDate,
        end_date: NaiveDate,
        unit: TemperatureUnit,
    ) -> String {
        format!(
            "{}/v1/archive?latitude={}&longitude={}&start_date={}&end_date={}&daily={}&temperature_unit={}&timezone=GMT&timeformat=unixtime",
            self.base_url,
            location.0,
            location.1,
            start_date.format("%Y-%m-%d"),
            end_date.format("%Y-%m-%d"),
            DAILY_VARIABLE,
            unit.query_value(),
        )
    }

    /// Keys include the archive host so clients sharing a cache folder never
    /// serve each other's responses.
    fn cache_key(
        &self,
        location: LatLon,
        start_date: NaiveDate,
        end_date: NaiveDate,
        unit: TemperatureUnit,
    ) -> String {
        let host = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        format!(
            "archive_{}_{}_{}_{}_{}_{}_{}",
            host, location.0, location.1, start_date, end_date, DAILY_VARIABLE, unit
        )
    }

    /// Delay before the retry that follows failed attempt number `attempt` (1-based).
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        Duration::from_secs_f64(self.backoff_factor * 2f64.powi(exponent))
    }

    async fn get_with_retry(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 1;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt, self.max_attempts, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        info!("Requesting {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let status = response.status();
        let status_error = response.error_for_status_ref().err();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        match status_error {
            None => Ok(body.to_vec()),
            Some(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                if status.is_client_error() {
                    if let Ok(api_error) = serde_json::from_slice::<ApiErrorBody>(&body) {
                        if status != reqwest::StatusCode::TOO_MANY_REQUESTS {
                            return Err(FetchError::Api {
                                url: url.to_string(),
                                reason: api_error.reason,
                            });
                        }
                    }
                }
                Err(FetchError::HttpStatus {
                    url: url.to_string(),
                    status,
                    source: e,
                })
            }
        }
    }
}
