//! Historical cold-day statistics for US cities.
//!
//! The crate builds a city catalog from a raw US city list, fetches daily
//! minimum temperatures for a catalogued city from the Open-Meteo archive, and
//! derives what a heat pump dashboard shows: days above a plot threshold,
//! weekly and monthly rolling averages, and a table of how many days fell below
//! each temperature.

mod analysis;
mod archive;
mod catalog;
mod dashboard;
mod error;
mod types;
mod utils;

pub use dashboard::{Dashboard, DashboardView};
pub use error::HeatpumpError;

pub use catalog::builder::{build_catalog, build_catalog_file, MIN_POPULATION, RAW_COLUMNS};
pub use catalog::city_catalog::{CityCatalog, CATALOG_COLUMNS};
pub use catalog::error::CatalogError;

pub use archive::cache::ResponseCache;
pub use archive::client::{
    ArchiveClient, DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT,
};
pub use archive::error::FetchError;
pub use archive::response::TimeAxis;

pub use analysis::annotate::{annotate, AnnotatedPoint, AnnotatedSeries};
pub use analysis::error::AnalysisError;
pub use analysis::rolling::{trailing_mean, RollingWindow};
pub use analysis::threshold_table::{threshold_frame, threshold_table, ThresholdRow};

pub use types::city::{CityRecord, LatLon};
pub use types::series::{
    default_supported_range, DailyTemperaturePoint, SeriesQuery, TemperatureSeries,
};
pub use types::temperature_unit::TemperatureUnit;

pub use utils::get_cache_dir;
