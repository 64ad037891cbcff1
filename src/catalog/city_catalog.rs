use crate::catalog::error::CatalogError;
use crate::catalog::io::{float_column, read_csv, require_columns, string_column, write_catalog_csv};
use crate::types::city::{CityRecord, LatLon};
use haversine::{distance, Location as HaversineLocation, Units};
use log::{info, warn};
use ordered_float::OrderedFloat;
use rstar::RTree;
use std::collections::HashMap;
use std::path::Path;

/// Columns a catalog file must provide.
pub const CATALOG_COLUMNS: [&str; 3] = ["city_state", "lat", "lng"];

/// The static city lookup table, loaded once at startup.
///
/// Records keep the order of the catalog file. Lookups by `city_state` are
/// constant time; proximity searches go through an R-tree.
#[derive(Debug, Clone)]
pub struct CityCatalog {
    records: Vec<CityRecord>,
    index: HashMap<String, usize>,
    rtree: RTree<CityRecord>,
}

impl CityCatalog {
    /// Creates a catalog from records. Should a key repeat, the first record is kept.
    pub fn from_records(records: Vec<CityRecord>) -> Self {
        let mut unique = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            if index.contains_key(&record.city_state) {
                warn!(
                    "Catalog contains '{}' more than once; keeping the first",
                    record.city_state
                );
                continue;
            }
            index.insert(record.city_state.clone(), unique.len());
            unique.push(record);
        }
        let rtree = RTree::bulk_load(unique.clone());
        Self {
            records: unique,
            index,
            rtree,
        }
    }

    /// Loads a catalog file with the columns `city_state, lat, lng`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Read`] if the file cannot be opened,
    /// [`CatalogError::CsvRead`] if it is not valid CSV and
    /// [`CatalogError::MissingColumn`] if a catalog column is absent.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let df = read_csv(path)?;
        require_columns(&df, &CATALOG_COLUMNS)?;

        let names = string_column(&df, "city_state")?;
        let lats = float_column(&df, "lat")?;
        let lngs = float_column(&df, "lng")?;

        let records: Vec<CityRecord> = names
            .into_iter()
            .zip(lats)
            .zip(lngs)
            .filter_map(|((name, lat), lng)| match (name, lat, lng) {
                (Some(name), Some(lat), Some(lng)) => Some(CityRecord::new(name, lat, lng)),
                _ => None,
            })
            .collect();

        if records.len() != df.height() {
            warn!(
                "Skipped {} incomplete rows in catalog {:?}",
                df.height() - records.len(),
                path
            );
        }
        info!("Loaded {} cities from {:?}", records.len(), path);
        Ok(Self::from_records(records))
    }

    /// Writes the catalog as a `city_state, lat, lng` CSV file.
    pub fn write(&self, path: &Path) -> Result<(), CatalogError> {
        write_catalog_csv(&self.records, path)
    }

    pub fn get(&self, city_state: &str) -> Option<&CityRecord> {
        self.index.get(city_state).map(|&i| &self.records[i])
    }

    /// The coordinates of a catalogued city.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownCity`] if `city_state` is not catalogued.
    pub fn coordinates(&self, city_state: &str) -> Result<LatLon, CatalogError> {
        self.get(city_state)
            .map(CityRecord::location)
            .ok_or_else(|| CatalogError::UnknownCity(city_state.to_string()))
    }

    /// All selectable city names, in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.city_state.as_str())
    }

    pub fn records(&self) -> &[CityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finds up to `limit` catalogued cities within `max_distance_km` of `location`,
    /// closest first, paired with their haversine distance in kilometres.
    pub fn nearest(
        &self,
        location: LatLon,
        limit: usize,
        max_distance_km: f64,
    ) -> Vec<(&CityRecord, f64)> {
        if limit == 0 {
            return vec![];
        }

        // Degree-space ordering differs from great-circle ordering away from
        // the equator, so look at more candidates than requested.
        let candidate_limit = (limit * 2).max(20);
        let origin = HaversineLocation {
            latitude: location.0,
            longitude: location.1,
        };

        let mut found: Vec<(&CityRecord, f64)> = self
            .rtree
            .nearest_neighbor_iter(&[location.0, location.1])
            .take(candidate_limit)
            .filter_map(|record| {
                let dist_km = distance(
                    HaversineLocation {
                        latitude: origin.latitude,
                        longitude: origin.longitude,
                    },
                    HaversineLocation {
                        latitude: record.lat,
                        longitude: record.lng,
                    },
                    Units::Kilometers,
                );
                (dist_km <= max_distance_km).then_some((record, dist_km))
            })
            .collect();

        found.sort_by_key(|(_, d)| OrderedFloat(*d));
        found.truncate(limit);
        found
    }
}
