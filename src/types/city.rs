//! Defines the catalog entry for a single city and the coordinate pair used for
//! lookups. Also includes implementations necessary for spatial indexing using
//! the `rstar` crate.

use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use heatpump::LatLon;
///
/// let champaign = LatLon(40.1142, -88.2737);
/// assert_eq!(champaign.0, 40.1142); // Latitude
/// assert_eq!(champaign.1, -88.2737); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

/// A single entry of the city catalog.
///
/// `city_state` is the display and lookup key (`"Champaign, Illinois"`), unique
/// within a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    /// City name and state name joined by `", "`.
    pub city_state: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl CityRecord {
    pub fn new(city_state: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            city_state: city_state.into(),
            lat,
            lng,
        }
    }

    /// The key a raw `city` / `state_name` pair is catalogued under.
    ///
    /// ```
    /// use heatpump::CityRecord;
    ///
    /// assert_eq!(CityRecord::key("Champaign", "Illinois"), "Champaign, Illinois");
    /// ```
    pub fn key(city: &str, state_name: &str) -> String {
        format!("{}, {}", city, state_name)
    }

    pub fn location(&self) -> LatLon {
        LatLon(self.lat, self.lng)
    }
}

// --- R-Tree Implementations ---

impl RTreeObject for CityRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

/// Squared Euclidean distance in degree space. Only used to order R-tree
/// candidates; real distances are computed with haversine afterwards.
impl PointDistance for CityRecord {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.lat - point[0];
        let dy = self.lng - point[1];
        dx * dx + dy * dy
    }
}
