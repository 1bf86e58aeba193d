//! Raw records: one row of a tabular feed, keyed by the header text exactly as
//! the feed wrote it (units and all).

use crate::normalize::error::NormalizeError;
use crate::types::station::Coordinates;
use indexmap::IndexMap;
use log::debug;
use polars::prelude::*;
use std::io::Cursor;

const LATITUDE_STUB: &str = "latitude";
const LONGITUDE_STUB: &str = "longitude";

/// A single row of raw feed data.
///
/// Keys keep the order of the feed's header row, which is the order the
/// fuzzy lookup in [`RawRecord::find`] walks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: IndexMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the first `(field, value)` whose field name contains `stub`.
    ///
    /// This is a plain ordered scan: when several headers contain the stub,
    /// the leftmost one wins, with no attempt to pick a better match.
    pub fn find(&self, stub: &str) -> Option<(&str, &str)> {
        self.iter().find(|(field, _)| field.contains(stub))
    }

    /// Reads the station position carried on every SOS row.
    ///
    /// Absent or empty columns give an unknown half; a non-numeric value is
    /// an error.
    pub fn coordinates(&self) -> Result<Coordinates, NormalizeError> {
        Ok(Coordinates::new(
            self.coordinate(LATITUDE_STUB)?,
            self.coordinate(LONGITUDE_STUB)?,
        ))
    }

    fn coordinate(&self, stub: &str) -> Result<Option<f64>, NormalizeError> {
        match self.find(stub) {
            Some((_, value)) if value.trim().is_empty() => Ok(None),
            Some((field, value)) => value.trim().parse().map(Some).map_err(|_| {
                NormalizeError::InvalidCoordinate {
                    field: field.to_string(),
                    value: value.to_string(),
                }
            }),
            None => Ok(None),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Splits a header-plus-rows tabular payload into raw records.
///
/// Every column is read as text so that list-encoded cells (`0;0;0.12`) and
/// oddly formatted numbers reach the resolver untouched. Null cells become
/// empty strings. A blank payload yields no records.
pub fn parse_tabular(text: &str) -> Result<Vec<RawRecord>, NormalizeError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
        .finish()
        .map_err(NormalizeError::Csv)?;

    let columns = df
        .get_columns()
        .iter()
        .map(|column| -> PolarsResult<(String, &StringChunked)> {
            Ok((column.name().to_string(), column.str()?))
        })
        .collect::<PolarsResult<Vec<_>>>()
        .map_err(NormalizeError::Csv)?;

    let records: Vec<RawRecord> = (0..df.height())
        .map(|idx| {
            columns
                .iter()
                .map(|(name, values)| (name.clone(), values.get(idx).unwrap_or_default()))
                .collect()
        })
        .collect();

    debug!(
        "Parsed {} records with {} fields from tabular payload",
        records.len(),
        columns.len()
    );
    Ok(records)
}
