//! Resolves a semantic property stub (e.g. `air_temperature`) against one raw
//! record, turning the matched cell into a typed [`PropertyValue`].

use crate::normalize::error::NormalizeError;
use crate::normalize::record::RawRecord;
use crate::normalize::timestamp::{parse_iso, Timestamp};
use crate::normalize::unit::extract_unit;
use crate::types::catalog::PropertyCatalog;
use crate::types::observation::Observation;
use crate::types::property_value::PropertyValue;
use log::warn;

/// Stub of the column holding each record's observation time.
pub const DATE_TIME_STUB: &str = "date_time";

/// Separator used by list-encoded cells such as spectral bins.
pub const LIST_DELIMITER: char = ';';

/// Resolves property stubs against a single record.
///
/// The record's timestamp is worked out once up front and attached to every
/// observation resolved from it.
pub struct PropertyResolver<'a> {
    catalog: &'a PropertyCatalog,
    record: &'a RawRecord,
    timestamp: Option<Timestamp>,
}

impl<'a> PropertyResolver<'a> {
    pub fn new(catalog: &'a PropertyCatalog, record: &'a RawRecord) -> Self {
        Self {
            catalog,
            record,
            timestamp: record_timestamp(record),
        }
    }

    /// The observation time shared by every value in this record.
    pub fn timestamp(&self) -> Option<&Timestamp> {
        self.timestamp.as_ref()
    }

    /// Resolves `stub` against the record.
    ///
    /// The first field whose name contains `stub` is used. Its unit comes
    /// from the ` (<unit>)` suffix of the field name.
    ///
    /// * No matching field, or an empty cell: [`PropertyValue::Missing`].
    /// * A `;`-separated cell: one entry per non-empty segment, wrapped as
    ///   [`Observation`]s when a unit is known, bare strings otherwise.
    /// * A cell without a unit: [`PropertyValue::Text`], untouched.
    /// * Anything else: a single [`Observation`].
    ///
    /// # Errors
    ///
    /// [`NormalizeError::UnknownProperty`] if `stub` is not in the catalog,
    /// and [`NormalizeError::InvalidNumber`] if a unit-bearing cell does not
    /// parse as a number.
    pub fn resolve(&self, stub: &str) -> Result<PropertyValue, NormalizeError> {
        self.catalog.ensure_recognized(stub)?;

        let Some((field, value)) = self.record.find(stub) else {
            return Ok(PropertyValue::Missing);
        };
        let unit = extract_unit(field);

        if value.contains(LIST_DELIMITER) {
            let segments = value.split(LIST_DELIMITER).filter(|segment| !segment.is_empty());
            return match unit {
                Some(unit) => segments
                    .map(|segment| self.observation(field, segment, unit))
                    .collect::<Result<Vec<_>, _>>()
                    .map(PropertyValue::Observations),
                None => Ok(PropertyValue::Texts(
                    segments.map(str::to_string).collect(),
                )),
            };
        }

        match unit {
            _ if value.is_empty() => Ok(PropertyValue::Missing),
            None => Ok(PropertyValue::Text(value.to_string())),
            Some(unit) => self.observation(field, value, unit).map(PropertyValue::Observation),
        }
    }

    fn observation(&self, field: &str, raw: &str, unit: &str) -> Result<Observation, NormalizeError> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| NormalizeError::invalid_number(field, raw))?;
        Ok(Observation::new(value, unit).with_timestamp(self.timestamp))
    }
}

/// Finds and parses the record's `date_time` field.
///
/// The timestamp is auxiliary, so a missing or malformed value yields `None`
/// instead of failing the whole record.
pub fn record_timestamp(record: &RawRecord) -> Option<Timestamp> {
    let (_, raw) = record.find(DATE_TIME_STUB)?;
    match parse_iso(raw) {
        Ok(timestamp) => Some(timestamp),
        Err(e) => {
            warn!("Ignoring record timestamp: {}", e);
            None
        }
    }
}
