//! Turns a raw US city list into the catalog the dashboard selects cities from.
//!
//! The raw list (e.g. the Simple Maps `uscities.csv`) carries one row per city
//! with many columns. The catalog keeps only cities with at least
//! [`MIN_POPULATION`] inhabitants, keyed by `"City, State"`, with their
//! coordinates.

use crate::catalog::error::CatalogError;
use crate::catalog::io::{float_column, read_csv, require_columns, string_column, write_catalog_csv};
use crate::types::city::CityRecord;
use log::{info, warn};
use polars::prelude::{col, lit, DataFrame, DataType, IntoLazy};
use std::collections::HashMap;
use std::path::Path;

/// Cities smaller than this are left out of the catalog.
pub const MIN_POPULATION: f64 = 10_000.0;

/// Columns a raw city file must provide.
pub const RAW_COLUMNS: [&str; 5] = ["city", "state_name", "population", "lat", "lng"];

/// Builds catalog records from a raw city DataFrame.
///
/// Rows are kept when `population >= 10000`; each kept row is keyed as
/// `city + ", " + state_name`. When several rows share a key the first one wins,
/// in input order. Rows missing any required value are skipped.
///
/// # Errors
///
/// Returns [`CatalogError::MissingColumn`] if any of [`RAW_COLUMNS`] is absent,
/// and [`CatalogError::ColumnType`] if a column cannot be read as text or number.
///
/// # Examples
///
/// ```
/// use heatpump::build_catalog;
/// use polars::prelude::*;
///
/// let raw = df!(
///     "city" => ["Champaign", "Tolono"],
///     "state_name" => ["Illinois", "Illinois"],
///     "population" => [145_000i64, 3_500],
///     "lat" => [40.1142, 39.9861],
///     "lng" => [-88.2737, -88.2594],
/// )?;
///
/// let catalog = build_catalog(&raw)?;
/// assert_eq!(catalog.len(), 1);
/// assert_eq!(catalog[0].city_state, "Champaign, Illinois");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn build_catalog(raw: &DataFrame) -> Result<Vec<CityRecord>, CatalogError> {
    require_columns(raw, &RAW_COLUMNS)?;

    let populated = raw
        .clone()
        .lazy()
        .filter(
            col("population")
                .cast(DataType::Float64)
                .gt_eq(lit(MIN_POPULATION)),
        )
        .collect()?;

    let cities = string_column(&populated, "city")?;
    let states = string_column(&populated, "state_name")?;
    let lats = float_column(&populated, "lat")?;
    let lngs = float_column(&populated, "lng")?;

    let mut records: Vec<CityRecord> = Vec::with_capacity(populated.height());
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(populated.height());
    let mut incomplete = 0usize;
    let mut duplicates = 0usize;

    for (((city, state), lat), lng) in cities.into_iter().zip(states).zip(lats).zip(lngs) {
        let (Some(city), Some(state), Some(lat), Some(lng)) = (city, state, lat, lng) else {
            incomplete += 1;
            continue;
        };
        let key = CityRecord::key(&city, &state);

        if let Some(&index) = seen.get(&key) {
            duplicates += 1;
            let first = &records[index];
            if first.lat != lat || first.lng != lng {
                warn!(
                    "Duplicate city '{}' with different coordinates ({}, {}) vs ({}, {}); keeping the first",
                    key, first.lat, first.lng, lat, lng
                );
            }
            continue;
        }

        seen.insert(key.clone(), records.len());
        records.push(CityRecord::new(key, lat, lng));
    }

    if incomplete > 0 {
        warn!("Skipped {} rows with missing city data", incomplete);
    }
    info!(
        "Catalog built: {} raw rows, {} below population threshold, {} duplicates, {} kept",
        raw.height(),
        raw.height() - populated.height(),
        duplicates,
        records.len()
    );

    Ok(records)
}

/// Reads a raw city CSV, builds the catalog and writes it to `output`.
///
/// The written file has the header `city_state,lat,lng`. Missing parent
/// directories of `output` are created.
///
/// # Errors
///
/// Returns [`CatalogError::Read`] / [`CatalogError::Write`] for I/O failures,
/// [`CatalogError::CsvRead`] if the input is not valid CSV, and the errors of
/// [`build_catalog`].
pub fn build_catalog_file(input: &Path, output: &Path) -> Result<Vec<CityRecord>, CatalogError> {
    info!("Building city catalog from {:?}", input);
    let raw = read_csv(input)?;
    let records = build_catalog(&raw)?;
    write_catalog_csv(&records, output)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_population_filter_and_dedup() -> Result<(), CatalogError> {
        let raw = df!(
            "city" => ["A", "B", "B"],
            "state_name" => ["X", "Y", "Y"],
            "population" => [5000i64, 20000, 20000],
            "lat" => [None, Some(1.0), Some(1.0)],
            "lng" => [None, Some(2.0), Some(2.0)],
        )?;

        let catalog = build_catalog(&raw)?;
        assert_eq!(catalog, vec![CityRecord::new("B, Y", 1.0, 2.0)]);
        Ok(())
    }

    #[test]
    fn test_keeps_first_of_conflicting_duplicates() -> Result<(), CatalogError> {
        let raw = df!(
            "city" => ["Springfield", "Springfield", "Springfield"],
            "state_name" => ["Illinois", "Illinois", "Missouri"],
            "population" => [114_000i64, 114_000, 169_000],
            "lat" => [39.78, 10.0, 37.19],
            "lng" => [-89.64, 10.0, -93.29],
        )?;

        let catalog = build_catalog(&raw)?;
        assert_eq!(
            catalog,
            vec![
                CityRecord::new("Springfield, Illinois", 39.78, -89.64),
                CityRecord::new("Springfield, Missouri", 37.19, -93.29),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_no_small_cities_and_unique_keys() -> Result<(), CatalogError> {
        let raw = df!(
            "city" => ["Urbana", "Savoy", "Mahomet", "Urbana", "Danville", "Rantoul"],
            "state_name" => ["Illinois", "Illinois", "Illinois", "Illinois", "Illinois", "Illinois"],
            "population" => [38_000i64, 9_999, 10_000, 38_000, 29_000, 12_000],
            "lat" => [40.11, 40.05, 40.19, 40.11, 40.14, 40.31],
            "lng" => [-88.20, -88.25, -88.40, -88.20, -87.61, -88.15],
        )?;

        let catalog = build_catalog(&raw)?;
        let keys: Vec<&str> = catalog.iter().map(|r| r.city_state.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "Urbana, Illinois",
                "Mahomet, Illinois",
                "Danville, Illinois",
                "Rantoul, Illinois"
            ]
        );
        let unique: HashSet<&str> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());
        Ok(())
    }

    #[test]
    fn test_skips_rows_with_missing_values() -> Result<(), CatalogError> {
        let raw = df!(
            "city" => [Some("Peoria"), None, Some("Normal")],
            "state_name" => ["Illinois", "Illinois", "Illinois"],
            "population" => [Some(113_000i64), Some(50_000), None],
            "lat" => [40.69, 40.0, 40.51],
            "lng" => [-89.59, -89.0, -88.99],
        )?;

        let catalog = build_catalog(&raw)?;
        assert_eq!(catalog, vec![CityRecord::new("Peoria, Illinois", 40.69, -89.59)]);
        Ok(())
    }

    #[test]
    fn test_missing_column_is_schema_error() -> Result<(), PolarsError> {
        let raw = df!(
            "city" => ["Champaign"],
            "state_name" => ["Illinois"],
            "lat" => [40.11],
            "lng" => [-88.27],
        )?;

        let result = build_catalog(&raw);
        assert!(matches!(result, Err(CatalogError::MissingColumn(ref c)) if c == "population"));
        Ok(())
    }

    #[test]
    fn test_build_catalog_file_writes_normalized_csv() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("uscities.csv");
        let output = dir.path().join("data").join("cities.csv");
        std::fs::write(
            &input,
            "city,city_ascii,state_id,state_name,county_name,lat,lng,population\n\
             Champaign,Champaign,IL,Illinois,Champaign,40.1142,-88.2737,145000\n\
             Tolono,Tolono,IL,Illinois,Champaign,39.9861,-88.2594,3500\n\
             Champaign,Champaign,IL,Illinois,Champaign,40.1142,-88.2737,145000\n",
        )?;

        let records = build_catalog_file(&input, &output)?;
        assert_eq!(records.len(), 1);

        let written = std::fs::read_to_string(&output)?;
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("city_state,lat,lng"));
        assert!(lines.next().is_some_and(|l| l.starts_with("\"Champaign, Illinois\",40.1142,")));
        assert_eq!(lines.next(), None);
        Ok(())
    }

    #[test]
    fn test_non_numeric_coordinates_are_type_error() -> Result<(), PolarsError> {
        let raw = df!(
            "city" => ["Champaign"],
            "state_name" => ["Illinois"],
            "population" => [145_000i64],
            "lat" => ["north"],
            "lng" => ["-88.27"],
        )?;

        let result = build_catalog(&raw);
        assert!(matches!(result, Err(CatalogError::ColumnType { ref column, .. }) if column == "lat"));
        Ok(())
    }

    #[test]
    fn test_unwritable_output_is_write_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("uscities.csv");
        std::fs::write(
            &input,
            "city,state_name,lat,lng,population\nChampaign,Illinois,40.1142,-88.2737,145000\n",
        )?;
        // The output's parent directory is a regular file.
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"not a directory")?;

        let result = build_catalog_file(&input, &blocker.join("cities.csv"));
        assert!(matches!(result, Err(CatalogError::Write(_, _))));
        Ok(())
    }

    #[test]
    fn test_unreadable_input_is_read_error() {
        let result = build_catalog_file(
            Path::new("/definitely/not/here/uscities.csv"),
            Path::new("cities.csv"),
        );
        assert!(matches!(result, Err(CatalogError::Read(_, _))));
    }
}
