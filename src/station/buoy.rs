//! The station object: named, lazily fetched properties of one NDBC buoy.
//!
//! A [`Buoy`] fetches nothing when it is built. The first request for a
//! property pulls the matching SOS payload through its [`FeedSource`],
//! decodes it and caches the result; later requests are served from the cache
//! until [`Buoy::refresh`] drops it.

use crate::error::BuoyantError;
use crate::normalize::group::{GroupDecoder, GroupRow};
use crate::normalize::record::{parse_tabular, RawRecord};
use crate::normalize::resolver::{record_timestamp, PropertyResolver};
use crate::normalize::timestamp::Timestamp;
use crate::normalize::tree::{DecodeTables, TreeDecoder, TreeObservation};
use crate::transport::client::{FeedSource, CAM_ENDPOINT, STATION_PAGE_ENDPOINT};
use crate::transport::sos::SosRequest;
use crate::types::catalog::PropertyCatalog;
use crate::types::property_value::PropertyValue;
use crate::types::station::Coordinates;
use bon::bon;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::{hash_map::Entry, HashMap};

/// A property as served by a station.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// A scalar property, resolved against the first record of the response.
    Value(PropertyValue),
    /// A grouped property (`currents`, `waves`, `winds`): one row per record.
    Group(Vec<GroupRow>),
}

impl Property {
    pub fn as_value(&self) -> Option<&PropertyValue> {
        match self {
            Property::Value(value) => Some(value),
            Property::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&[GroupRow]> {
        match self {
            Property::Group(rows) => Some(rows),
            Property::Value(_) => None,
        }
    }

    /// True for a missing scalar and for a group with no rows.
    pub fn is_missing(&self) -> bool {
        match self {
            Property::Value(value) => value.is_missing(),
            Property::Group(rows) => rows.is_empty(),
        }
    }
}

/// Everything learned about the station since the last refresh.
#[derive(Debug, Default)]
struct Snapshot {
    properties: HashMap<String, Property>,
    latest: Option<TreeObservation>,
    coordinates: Option<Coordinates>,
    observed_at: Option<Timestamp>,
}

/// A property decoded from one tabular response, with the station details
/// that ride along on its first record.
struct Fetched {
    property: Property,
    coordinates: Option<Coordinates>,
    observed_at: Option<Timestamp>,
}

/// Generates one accessor per general property of the NDBC catalog.
macro_rules! property_accessors {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("The station's `", stringify!($name), "` property.")]
            pub fn $name(&mut self) -> Result<&Property, BuoyantError> {
                self.property(stringify!($name))
            }
        )*
    };
}

/// An NDBC station and its cached properties.
///
/// # Examples
///
/// ```no_run
/// use buoyant::{Buoy, BuoyantError, NdbcClient};
///
/// # fn run() -> Result<(), BuoyantError> {
/// let mut buoy = Buoy::builder()
///     .id("41012")
///     .source(NdbcClient::builder().build()?)
///     .build();
///
/// let temperature = buoy.air_temperature()?.clone();
/// let waves = buoy.waves()?;
/// println!("{:?} ({} wave rows)", temperature, waves.as_group().map_or(0, |rows| rows.len()));
/// # Ok(())
/// # }
/// ```
pub struct Buoy<S> {
    id: String,
    source: S,
    catalog: PropertyCatalog,
    tables: DecodeTables,
    snapshot: Snapshot,
}

#[bon]
impl<S: FeedSource> Buoy<S> {
    #[builder]
    pub fn new(
        #[builder(into)] id: String,
        source: S,
        catalog: Option<PropertyCatalog>,
        tables: Option<DecodeTables>,
    ) -> Self {
        Self {
            id,
            source,
            catalog: catalog.unwrap_or_default(),
            tables: tables.unwrap_or_default(),
            snapshot: Snapshot::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn catalog(&self) -> &PropertyCatalog {
        &self.catalog
    }

    /// Returns `stub`, fetching it on first access.
    ///
    /// # Errors
    ///
    /// [`NormalizeError::UnknownProperty`](crate::NormalizeError::UnknownProperty)
    /// for a stub the catalog does not list, before any fetch happens.
    /// Transport and decoding failures propagate and leave the cache as it was.
    pub fn property(&mut self, stub: &str) -> Result<&Property, BuoyantError> {
        self.catalog.ensure_observable(stub)?;

        match self.snapshot.properties.entry(stub.to_string()) {
            Entry::Occupied(entry) => {
                debug!("Cache hit for '{}' at station {}", stub, self.id);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                info!("Cache miss for '{}' at station {}, fetching", stub, self.id);
                let request = SosRequest::new(self.id.as_str(), stub);
                let fetched = fetch_property(&self.source, &self.catalog, &request)?;

                if self.snapshot.coordinates.is_none() {
                    self.snapshot.coordinates = fetched.coordinates.filter(Coordinates::is_known);
                }
                if self.snapshot.observed_at.is_none() {
                    self.snapshot.observed_at = fetched.observed_at;
                }
                Ok(entry.insert(fetched.property))
            }
        }
    }

    /// Fetches `stub` as observed near `instant`. The result is not cached.
    pub fn fetch_at(&self, stub: &str, instant: DateTime<Utc>) -> Result<Property, BuoyantError> {
        self.catalog.ensure_observable(stub)?;
        let request = SosRequest::new(self.id.as_str(), stub).at(instant);
        Ok(fetch_property(&self.source, &self.catalog, &request)?.property)
    }

    /// The decoded latest-observation document, fetched on first access.
    pub fn latest(&mut self) -> Result<&TreeObservation, BuoyantError> {
        let latest = match self.snapshot.latest.take() {
            Some(latest) => {
                debug!("Cache hit for latest observation at station {}", self.id);
                latest
            }
            None => {
                info!("Cache miss for latest observation at station {}, fetching", self.id);
                let xml = self.source.latest_observation(&self.id)?;
                TreeDecoder::new(&self.tables).decode(&xml)?
            }
        };
        Ok(self.snapshot.latest.insert(latest))
    }

    /// The station position.
    ///
    /// Taken from the first tabular response when one has been fetched,
    /// otherwise from the latest-observation document.
    pub fn coords(&mut self) -> Result<Coordinates, BuoyantError> {
        if let Some(coordinates) = self.snapshot.coordinates {
            return Ok(coordinates);
        }
        let coordinates = self.latest()?.coordinates();
        self.snapshot.coordinates = Some(coordinates);
        Ok(coordinates)
    }

    /// Observation time of the first record seen since the last refresh.
    pub fn observed_at(&self) -> Option<&Timestamp> {
        self.snapshot.observed_at.as_ref()
    }

    /// Drops every cached value. The next access to anything refetches it.
    pub fn refresh(&mut self) {
        info!("Refreshing station {}", self.id);
        self.snapshot = Snapshot::default();
    }

    property_accessors!(
        air_pressure_at_sea_level,
        air_temperature,
        currents,
        sea_floor_depth_below_sea_surface,
        sea_water_electrical_conductivity,
        sea_water_salinity,
        sea_water_temperature,
        waves,
        winds,
    );
}

impl<S> Buoy<S> {
    /// The station's NDBC web page.
    pub fn url(&self) -> String {
        format!("{}?station={}", STATION_PAGE_ENDPOINT, self.id)
    }

    /// Where the station's buoycam image is served, if it has a camera.
    pub fn image_url(&self) -> String {
        format!("{}?station={}", CAM_ENDPOINT, self.id)
    }
}

/// Runs one tabular request and decodes the property it asked for.
fn fetch_property<S: FeedSource>(
    source: &S,
    catalog: &PropertyCatalog,
    request: &SosRequest,
) -> Result<Fetched, BuoyantError> {
    let body = source.observations(request)?;
    let records = parse_tabular(&body)?;
    let first = records.first();
    let stub = request.observed_property.as_str();

    let property = if catalog.is_group(stub) {
        Property::Group(GroupDecoder::for_group(catalog, stub)?.decode(&records)?)
    } else {
        let value = match first {
            Some(record) => PropertyResolver::new(catalog, record).resolve(stub)?,
            None => PropertyValue::Missing,
        };
        Property::Value(value)
    };

    Ok(Fetched {
        property,
        coordinates: first.map(RawRecord::coordinates).transpose()?,
        observed_at: first.and_then(record_timestamp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::error::NormalizeError;
    use crate::transport::error::TransportError;
    use chrono::TimeZone;
    use std::cell::{Cell, RefCell};

    const AIR_TEMPERATURE_CSV: &str = "station_id,sensor_id,\"latitude (degree)\",\"longitude (degree)\",date_time,\"depth (m)\",\"air_temperature (C)\"\n\
urn:ioos:station:wmo:41012,urn:ioos:sensor:wmo:41012::airtemp1,30.04,-80.53,2017-03-01T12:50:00Z,,21.6\n";

    const WINDS_CSV: &str = "station_id,sensor_id,\"latitude (degree)\",\"longitude (degree)\",date_time,\"depth (m)\",\"wind_from_direction (degree)\",\"wind_speed (m/s)\",\"wind_speed_of_gust (m/s)\",\"upward_air_velocity (m/s)\"\n\
urn:ioos:station:wmo:41012,urn:ioos:sensor:wmo:41012::anemometer1,30.04,-80.53,2017-03-01T12:50:00Z,-4.1,250.0,7.2,9.1,\n\
urn:ioos:station:wmo:41012,urn:ioos:sensor:wmo:41012::anemometer2,30.04,-80.53,2017-03-01T12:50:00Z,-3.8,252.0,7.0,8.8,\n";

    const LATEST_XML: &str = r#"<observation id="41012" lat="30.041" lon="-80.533" name="St. Augustine, FL">
    <datetime>2017-03-01T12:50:00UTC</datetime>
    <airtemp uom="F">70.9</airtemp>
</observation>"#;

    /// Serves canned payloads and counts every fetch.
    #[derive(Default)]
    struct MockSource {
        csv: HashMap<&'static str, &'static str>,
        xml: Option<&'static str>,
        fetches: Cell<usize>,
        requests: RefCell<Vec<SosRequest>>,
    }

    impl MockSource {
        fn new() -> Self {
            let mut csv = HashMap::new();
            csv.insert("air_temperature", AIR_TEMPERATURE_CSV);
            csv.insert("winds", WINDS_CSV);
            csv.insert("sea_water_salinity", "");
            Self {
                csv,
                xml: Some(LATEST_XML),
                ..Self::default()
            }
        }
    }

    impl FeedSource for MockSource {
        fn latest_observation(&self, _station: &str) -> Result<String, TransportError> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(self.xml.unwrap_or_default().to_string())
        }

        fn observations(&self, request: &SosRequest) -> Result<String, TransportError> {
            self.fetches.set(self.fetches.get() + 1);
            self.requests.borrow_mut().push(request.clone());
            self.csv
                .get(request.observed_property.as_str())
                .map(|body| body.to_string())
                .ok_or_else(|| TransportError::ServiceException {
                    station: request.station.clone(),
                    property: request.observed_property.clone(),
                    message: "no data".to_string(),
                })
        }
    }

    fn buoy(source: &MockSource) -> Buoy<&MockSource> {
        Buoy::builder().id("41012").source(source).build()
    }

    #[test]
    fn test_property_is_fetched_once() -> Result<(), BuoyantError> {
        let source = MockSource::new();
        let mut buoy = buoy(&source);

        let first = buoy.air_temperature()?.clone();
        let second = buoy.property("air_temperature")?.clone();

        assert_eq!(source.fetches.get(), 1);
        assert_eq!(first, second);
        let value = first.as_value().and_then(PropertyValue::as_observation).cloned();
        assert_eq!(value.as_ref().map(|o| o.value()), Some(21.6));
        assert_eq!(value.as_ref().and_then(|o| o.unit()), Some("C"));
        Ok(())
    }

    #[test]
    fn test_refresh_clears_everything() -> Result<(), BuoyantError> {
        let source = MockSource::new();
        let mut buoy = buoy(&source);

        buoy.air_temperature()?;
        buoy.latest()?;
        assert!(buoy.observed_at().is_some());

        buoy.refresh();
        assert!(buoy.observed_at().is_none());

        buoy.air_temperature()?;
        buoy.latest()?;
        assert_eq!(source.fetches.get(), 4);
        Ok(())
    }

    #[test]
    fn test_grouped_property_decodes_every_record() -> Result<(), BuoyantError> {
        let source = MockSource::new();
        let mut buoy = buoy(&source);

        let rows = buoy.winds()?.as_group().map(<[GroupRow]>::to_vec).unwrap_or_default();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.len() == 4));
        assert_eq!(rows[1]["wind_speed"].as_f64(), Some(7.0));
        assert!(rows[0]["upward_air_velocity"].is_missing());
        Ok(())
    }

    #[test]
    fn test_coordinates_come_from_first_tabular_record() -> Result<(), BuoyantError> {
        let source = MockSource::new();
        let mut buoy = buoy(&source);

        buoy.winds()?;
        assert_eq!(buoy.coords()?.pair(), (Some(30.04), Some(-80.53)));
        assert_eq!(source.fetches.get(), 1);
        assert_eq!(
            buoy.observed_at().and_then(Timestamp::to_utc),
            Some(Utc.with_ymd_and_hms(2017, 3, 1, 12, 50, 0).unwrap())
        );
        Ok(())
    }

    #[test]
    fn test_coordinates_fall_back_to_latest_observation() -> Result<(), BuoyantError> {
        let source = MockSource::new();
        let mut buoy = buoy(&source);

        assert_eq!(buoy.coords()?.pair(), (Some(30.041), Some(-80.533)));
        assert_eq!(buoy.latest()?.station.name.as_deref(), Some("St. Augustine, FL"));
        assert_eq!(buoy.latest()?.get("air_temp"), Some(&PropertyValue::Number(70.9)));
        assert_eq!(source.fetches.get(), 1);
        Ok(())
    }

    #[test]
    fn test_blank_tabular_position_falls_back_to_latest_observation() -> Result<(), BuoyantError> {
        let mut source = MockSource::new();
        source.csv.insert(
            "sea_water_temperature",
            "station_id,\"latitude (degree)\",\"longitude (degree)\",date_time,\"sea_water_temperature (C)\"\n\
urn:ioos:station:wmo:41012,,,2017-03-01T12:50:00Z,22.4\n",
        );
        let mut buoy = buoy(&source);

        buoy.sea_water_temperature()?;
        let coordinates = buoy.coords()?;

        assert!(coordinates.is_known());
        assert_eq!(coordinates.pair(), (Some(30.041), Some(-80.533)));
        assert_eq!(source.fetches.get(), 2);
        Ok(())
    }

    #[test]
    fn test_unknown_property_never_fetches() {
        let source = MockSource::new();
        let mut buoy = buoy(&source);

        assert!(matches!(
            buoy.property("air_temp"),
            Err(BuoyantError::Normalize(NormalizeError::UnknownProperty(_)))
        ));
        assert_eq!(source.fetches.get(), 0);
    }

    #[test]
    fn test_empty_response_is_missing() -> Result<(), BuoyantError> {
        let source = MockSource::new();
        let mut buoy = buoy(&source);

        assert!(buoy.sea_water_salinity()?.is_missing());
        assert!(buoy.coords().is_ok());
        Ok(())
    }

    #[test]
    fn test_transport_errors_are_not_cached() {
        let source = MockSource::new();
        let mut buoy = buoy(&source);

        assert!(matches!(buoy.currents(), Err(BuoyantError::Transport(_))));
        assert!(matches!(buoy.currents(), Err(BuoyantError::Transport(_))));
        assert_eq!(source.fetches.get(), 2);
    }

    #[test]
    fn test_fetch_at_sets_event_time_and_skips_cache() -> Result<(), BuoyantError> {
        let source = MockSource::new();
        let buoy = buoy(&source);
        let instant = Utc.with_ymd_and_hms(2017, 3, 1, 12, 0, 0).unwrap();

        buoy.fetch_at("air_temperature", instant)?;
        buoy.fetch_at("air_temperature", instant)?;

        assert_eq!(source.fetches.get(), 2);
        assert_eq!(source.requests.borrow()[0].event_time, Some(instant));
        Ok(())
    }

    #[test]
    fn test_urls() {
        let source = MockSource::new();
        let buoy = buoy(&source);

        assert_eq!(buoy.url(), "https://www.ndbc.noaa.gov/station_page.php?station=41012");
        assert_eq!(buoy.image_url(), "https://www.ndbc.noaa.gov/buoycam.php?station=41012");
    }
}
