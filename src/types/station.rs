//! Station identity: the opaque NDBC identifier plus where the station sits.

use serde::Serialize;

/// A latitude/longitude pair where either half may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees (positive for North).
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees (positive for East).
    pub longitude: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns the pair as `(latitude, longitude)`.
    pub fn pair(&self) -> (Option<f64>, Option<f64>) {
        (self.latitude, self.longitude)
    }

    pub fn is_known(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Identifies a station as of one fetch. A refresh replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationIdentity {
    /// The NDBC station identifier (e.g. "ROBN4" or "41012").
    pub id: String,
    /// The human-readable station name, when the feed supplies one.
    pub name: Option<String>,
    pub coordinates: Coordinates,
}

impl StationIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            coordinates: Coordinates::default(),
        }
    }
}
