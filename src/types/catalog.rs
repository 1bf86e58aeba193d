//! The allow-list of properties a station feed can be asked for, and the
//! sub-properties that make up each grouped property.

use crate::normalize::error::NormalizeError;
use indexmap::IndexMap;

/// Properties the NDBC SOS service serves directly. `lat`, `lon` and the
/// observation time are read off every response and are not listed here.
pub const GENERAL: &[&str] = &[
    "air_pressure_at_sea_level",
    "air_temperature",
    "currents",
    "sea_floor_depth_below_sea_surface",
    "sea_water_electrical_conductivity",
    "sea_water_salinity",
    "sea_water_temperature",
    "waves",
    "winds",
];

/// One row per depth bin of an ADCP current profile.
pub const CURRENTS: &[&str] = &[
    "bin", // (count)
    "depth", // (m)
    "direction_of_sea_water_velocity", // (degree)
    "sea_water_speed", // (c/s)
    "upward_sea_water_velocity", // (c/s)
    "error_velocity", // (c/s)
    "platform_orientation", // (degree)
    "platform_pitch_angle", // (degree)
    "platform_roll_angle", // (degree)
    "sea_water_temperature", // (C)
    "pct_good_3_beam", // (%)
    "pct_good_4_beam", // (%)
    "pct_rejected", // (%)
    "pct_bad", // (%)
    "echo_intensity_beam1", // (count)
    "echo_intensity_beam2", // (count)
    "echo_intensity_beam3", // (count)
    "echo_intensity_beam4", // (count)
    "correlation_magnitude_beam1", // (count)
    "correlation_magnitude_beam2", // (count)
    "correlation_magnitude_beam3", // (count)
    "correlation_magnitude_beam4", // (count)
    "quality_flags",
];

pub const WAVES: &[&str] = &[
    "sea_surface_wave_significant_height", // (m)
    "sea_surface_wave_peak_period", // (s)
    "sea_surface_wave_mean_period", // (s)
    "sea_surface_swell_wave_significant_height", // (m)
    "sea_surface_swell_wave_period", // (s)
    "sea_surface_wind_wave_significant_height", // (m)
    "sea_surface_wind_wave_period", // (s)
    "sea_water_temperature", // (c)
    "sea_surface_wave_to_direction", // (degree)
    "sea_surface_swell_wave_to_direction", // (degree)
    "sea_surface_wind_wave_to_direction", // (degree)
    "number_of_frequencies", // (count)
    "center_frequencies", // (Hz)
    "bandwidths", // (Hz)
    "spectral_energy", // (m**2/Hz)
    "mean_wave_direction", // (degree)
    "principal_wave_direction", // (degree)
    "polar_coordinate_r1", // (1)
    "polar_coordinate_r2", // (1)
    "calculation_method",
    "sampling_rate", // (Hz)
];

pub const WINDS: &[&str] = &[
    "wind_from_direction", // (degree)
    "wind_speed", // (m/s)
    "wind_speed_of_gust", // (m/s)
    "upward_air_velocity", // (m/s)
];

/// The recognized properties of a station feed.
///
/// `general` lists what may be requested from a station; `groups` maps each
/// grouped property to its ordered sub-property stubs. A stub is recognized
/// when it appears in either.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCatalog {
    general: Vec<String>,
    groups: IndexMap<String, Vec<String>>,
}

impl PropertyCatalog {
    pub fn new(general: Vec<String>, groups: IndexMap<String, Vec<String>>) -> Self {
        Self { general, groups }
    }

    /// The stock NDBC SOS catalog.
    pub fn ndbc() -> Self {
        let owned = |stubs: &[&str]| stubs.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut groups = IndexMap::new();
        groups.insert("currents".to_string(), owned(CURRENTS));
        groups.insert("waves".to_string(), owned(WAVES));
        groups.insert("winds".to_string(), owned(WINDS));

        Self::new(owned(GENERAL), groups)
    }

    pub fn general(&self) -> &[String] {
        &self.general
    }

    /// Sub-property stubs of a grouped property, or `None` for scalar ones.
    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn is_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// True if `stub` can be requested from a station directly.
    pub fn is_observable(&self, stub: &str) -> bool {
        self.general.iter().any(|known| known == stub)
    }

    /// True if `stub` is a general property or a sub-property of any group.
    pub fn recognizes(&self, stub: &str) -> bool {
        self.is_observable(stub)
            || self
                .groups
                .values()
                .any(|subs| subs.iter().any(|known| known == stub))
    }

    pub fn ensure_observable(&self, stub: &str) -> Result<(), NormalizeError> {
        if self.is_observable(stub) {
            Ok(())
        } else {
            Err(NormalizeError::UnknownProperty(stub.to_string()))
        }
    }

    pub fn ensure_recognized(&self, stub: &str) -> Result<(), NormalizeError> {
        if self.recognizes(stub) {
            Ok(())
        } else {
            Err(NormalizeError::UnknownProperty(stub.to_string()))
        }
    }
}

impl Default for PropertyCatalog {
    fn default() -> Self {
        Self::ndbc()
    }
}
