//! Decoding of the latest-observation XML feed.
//!
//! The payload is a single `<observation>` element whose attributes describe
//! the station and whose children are individual readings:
//!
//! ```xml
//! <observation id="ROBN4" lat="40.657" lon="-74.065" name="8530973 - Robbins Reef, NJ">
//!     <datetime>2014-11-01T01:30:00UTC</datetime>
//!     <airtemp uom="F">53.6</airtemp>
//! </observation>
//! ```
//!
//! Tag names are mapped to canonical property names and coerced to typed
//! values through [`DecodeTables`]. Units and any other attributes on the
//! readings are collected into separate maps.

use crate::normalize::error::NormalizeError;
use crate::normalize::timestamp::{parse_zoned, Timestamp};
use crate::types::property_value::PropertyValue;
use crate::types::station::{Coordinates, StationIdentity};
use indexmap::IndexMap;
use log::debug;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const OBSERVATION_TAG: &[u8] = b"observation";
const ID_ATTRIBUTE: &str = "id";
const UNIT_ATTRIBUTE: &str = "uom";
const LATITUDE: &str = "lat";
const LONGITUDE: &str = "lon";
const NAME: &str = "name";

/// How a field's text is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Number,
    /// A date-time with a trailing zone name, see [`parse_zoned`].
    Timestamp,
    Text,
}

/// The rename and coercion tables used by [`TreeDecoder`].
///
/// `renames` maps raw tag or attribute names to canonical property names.
/// `coercions` is keyed by canonical name; anything not listed stays text.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeTables {
    renames: IndexMap<String, String>,
    coercions: IndexMap<String, Coercion>,
}

impl DecodeTables {
    pub fn new(renames: IndexMap<String, String>, coercions: IndexMap<String, Coercion>) -> Self {
        Self { renames, coercions }
    }

    /// The tables for the NDBC `get_observation_as_xml` feed.
    pub fn ndbc() -> Self {
        let renames = [
            ("airtemp", "air_temp"),
            ("avgperiod", "average_period"),
            ("domperiod", "dominant_period"),
            ("meanwavedir", "mean_wave_direction"),
            ("msg", "message"),
            ("watertemp", "water_temp"),
            ("waveht", "wave_height"),
            ("winddir", "wind_direction"),
            ("windgust", "wind_gust"),
            ("windspeed", "wind_speed"),
        ]
        .into_iter()
        .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
        .collect();

        let coercions = [
            ("air_temp", Coercion::Number),
            ("average_period", Coercion::Number),
            ("datetime", Coercion::Timestamp),
            ("dewpoint", Coercion::Number),
            ("dominant_period", Coercion::Number),
            ("lat", Coercion::Number),
            ("lon", Coercion::Number),
            ("mean_wave_direction", Coercion::Number),
            ("pressure", Coercion::Number),
            ("water_temp", Coercion::Number),
            ("wave_height", Coercion::Number),
            ("wind_direction", Coercion::Number),
            ("wind_gust", Coercion::Number),
            ("wind_speed", Coercion::Number),
        ]
        .into_iter()
        .map(|(canonical, coercion)| (canonical.to_string(), coercion))
        .collect();

        Self::new(renames, coercions)
    }

    /// The canonical name for a raw tag; unknown tags keep their own name.
    pub fn canonical_name<'a>(&'a self, raw: &'a str) -> &'a str {
        self.renames.get(raw).map(String::as_str).unwrap_or(raw)
    }

    pub fn coercion(&self, canonical: &str) -> Coercion {
        self.coercions.get(canonical).copied().unwrap_or(Coercion::Text)
    }

    /// Every canonical name the rename table can produce.
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.renames.values().map(String::as_str)
    }

    /// Renames `raw` and coerces `text` according to the tables.
    fn convert(&self, raw: &str, text: Option<&str>) -> Result<(String, PropertyValue), NormalizeError> {
        let canonical = self.canonical_name(raw).to_string();
        let Some(text) = text else {
            return Ok((canonical, PropertyValue::Missing));
        };

        let value = match self.coercion(&canonical) {
            Coercion::Number => text
                .trim()
                .parse()
                .map(PropertyValue::Number)
                .map_err(|_| NormalizeError::invalid_number(raw, text))?,
            Coercion::Timestamp => PropertyValue::Timestamp(Timestamp::Zoned(parse_zoned(text.trim())?)),
            Coercion::Text => PropertyValue::Text(text.to_string()),
        };
        Ok((canonical, value))
    }
}

impl Default for DecodeTables {
    fn default() -> Self {
        Self::ndbc()
    }
}

/// Everything decoded from one latest-observation payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeObservation {
    pub station: StationIdentity,
    /// Canonical property name to value. Every name from the rename table is
    /// present, as [`PropertyValue::Missing`] when the payload lacks it.
    pub properties: IndexMap<String, PropertyValue>,
    /// Canonical property name to unit label.
    pub units: IndexMap<String, String>,
    /// Canonical property name to the element's remaining attributes.
    pub meta: IndexMap<String, IndexMap<String, String>>,
}

impl TreeObservation {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn unit(&self, name: &str) -> Option<&str> {
        self.units.get(name).map(String::as_str)
    }

    pub fn coordinates(&self) -> Coordinates {
        self.station.coordinates
    }

    pub fn observed_at(&self) -> Option<&Timestamp> {
        self.properties.get("datetime").and_then(PropertyValue::as_timestamp)
    }
}

/// A direct child of the observation element.
struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    text: Option<String>,
}

impl Element {
    /// Trims the collected text; whitespace-only content counts as absent.
    fn finish(mut self) -> Self {
        self.text = self
            .text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        self
    }
}

pub struct TreeDecoder<'a> {
    tables: &'a DecodeTables,
}

impl<'a> TreeDecoder<'a> {
    pub fn new(tables: &'a DecodeTables) -> Self {
        Self { tables }
    }

    /// Decodes a latest-observation XML payload.
    ///
    /// # Errors
    ///
    /// Fails on malformed XML, on a payload without an `<observation>`
    /// element, and on values that do not survive their table coercion.
    pub fn decode(&self, xml: &str) -> Result<TreeObservation, NormalizeError> {
        let (root, children) = read_observation(xml)?;

        let mut station = StationIdentity::new(root.get(ID_ATTRIBUTE).cloned().unwrap_or_default());
        let mut properties = IndexMap::new();

        for (key, value) in root.iter().filter(|(key, _)| key.as_str() != ID_ATTRIBUTE) {
            let (name, value) = self.tables.convert(key, Some(value))?;
            properties.insert(name, value);
        }

        for child in &children {
            let (name, value) = self.tables.convert(&child.tag, child.text.as_deref())?;
            properties.insert(name, value);
        }

        let mut units = IndexMap::new();
        let mut meta = IndexMap::new();
        for child in children {
            let name = self.tables.canonical_name(&child.tag).to_string();
            let mut attributes = child.attributes;
            // An empty unit stays behind as an ordinary attribute.
            if attributes.get(UNIT_ATTRIBUTE).is_some_and(|unit| !unit.is_empty()) {
                if let Some(unit) = attributes.shift_remove(UNIT_ATTRIBUTE) {
                    units.insert(name.clone(), unit);
                }
            }
            if !attributes.is_empty() {
                meta.insert(name, attributes);
            }
        }

        for name in self.tables.canonical_names() {
            if !properties.contains_key(name) {
                properties.insert(name.to_string(), PropertyValue::Missing);
            }
        }

        station.name = properties.get(NAME).and_then(PropertyValue::as_str).map(str::to_string);
        station.coordinates = Coordinates::new(
            properties.get(LATITUDE).and_then(PropertyValue::as_f64),
            properties.get(LONGITUDE).and_then(PropertyValue::as_f64),
        );

        debug!(
            "Decoded observation for station '{}' with {} properties and {} units",
            station.id,
            properties.len(),
            units.len()
        );

        Ok(TreeObservation {
            station,
            properties,
            units,
            meta,
        })
    }
}

/// Pulls the first `<observation>` element's attributes and its direct
/// children out of the payload.
fn read_observation(xml: &str) -> Result<(IndexMap<String, String>, Vec<Element>), NormalizeError> {
    let mut reader = Reader::from_str(xml);

    let mut root: Option<IndexMap<String, String>> = None;
    let mut children = Vec::new();
    let mut current: Option<Element> = None;
    // Nesting depth inside the observation element; 0 until it is found.
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) if root.is_none() => {
                if e.name().as_ref() == OBSERVATION_TAG {
                    root = Some(attributes(&e)?);
                    depth = 1;
                }
            }
            Event::Empty(e) if root.is_none() => {
                if e.name().as_ref() == OBSERVATION_TAG {
                    root = Some(attributes(&e)?);
                    break;
                }
            }
            Event::Start(e) => {
                depth += 1;
                if depth == 2 {
                    current = Some(element(&e)?);
                }
            }
            Event::Empty(e) => {
                if depth == 1 {
                    children.push(element(&e)?);
                }
            }
            Event::Text(t) if depth >= 2 => {
                let raw = String::from_utf8_lossy(&t);
                push_text(&mut current, &unescape(&raw)?);
            }
            Event::GeneralRef(r) if depth >= 2 => {
                let reference = format!("&{};", String::from_utf8_lossy(&r));
                push_text(&mut current, &unescape(&reference)?);
            }
            Event::CData(t) if depth >= 2 => {
                push_text(&mut current, &String::from_utf8_lossy(&t));
            }
            Event::End(_) if depth > 0 => {
                if depth == 2 {
                    children.extend(current.take().map(Element::finish));
                }
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let root = root.ok_or(NormalizeError::MissingObservationNode)?;
    Ok((root, children))
}

fn element(start: &BytesStart<'_>) -> Result<Element, NormalizeError> {
    Ok(Element {
        tag: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes: attributes(start)?,
        text: None,
    })
}

/// Appends a text fragment to the element being read. Entity references
/// arrive as their own events, so one text node may take several calls.
fn push_text(current: &mut Option<Element>, fragment: &str) {
    if let Some(element) = current {
        element.text.get_or_insert_with(String::new).push_str(fragment);
    }
}

fn attributes(start: &BytesStart<'_>) -> Result<IndexMap<String, String>, NormalizeError> {
    start
        .attributes()
        .map(|attribute| -> Result<(String, String), NormalizeError> {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attribute.value);
            Ok((key, unescape(&raw)?.into_owned()))
        })
        .collect()
}
