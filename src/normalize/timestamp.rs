//! Parsing of the two timestamp encodings found in NDBC feeds, plus the
//! formatter used to build `eventtime` request parameters.
//!
//! The two encodings fail for different reasons, so they get two separate
//! entry points instead of one parser that guesses:
//!
//! * [`parse_zoned`] handles the latest-observation XML feed, where a zone name
//!   is glued onto the end of the date-time (`2014-11-01T01:30:00UTC`).
//! * [`parse_iso`] handles the SOS tabular feed (`2017-03-01T12:30:00Z`), where
//!   the final character decides between UTC and naive local time.

use crate::normalize::error::NormalizeError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use serde::Serialize;
use std::fmt;

/// The date-time layout shared by both encodings, without any zone marker.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Length of the zone name appended to latest-observation timestamps.
const ZONE_SUFFIX_LEN: usize = 3;

/// A normalized feed timestamp.
///
/// Zone-aware readings keep the zone they were reported in. Readings from the
/// tabular feed that carry no `Z` marker stay naive, since the feed gives no
/// way to know which zone they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Timestamp {
    /// An instant with a named zone attached (UTC included).
    Zoned(DateTime<Tz>),
    /// A local wall-clock time with no zone information.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Returns the instant in UTC, or `None` for naive timestamps.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Zoned(instant) => Some(instant.with_timezone(&Utc)),
            Timestamp::Naive(_) => None,
        }
    }

    pub fn is_aware(&self) -> bool {
        matches!(self, Timestamp::Zoned(_))
    }

    /// The wall-clock reading as it appeared in the feed.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Timestamp::Zoned(instant) => instant.naive_local(),
            Timestamp::Naive(naive) => *naive,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Zoned(instant) => write!(f, "{}", instant.to_rfc3339()),
            Timestamp::Naive(naive) => write!(f, "{}", naive.format(ISO_FORMAT)),
        }
    }
}

/// Parses a date-time with a trailing three-letter zone name, such as
/// `2014-11-01T01:30:00UTC` or `2014-11-01T01:30:00EST`.
///
/// The zone is applied with tz-database rules rather than a fixed offset. A
/// wall-clock time that occurs twice (DST fall-back) resolves to standard
/// time, and so does one that never occurs (spring-forward gap).
///
/// # Errors
///
/// Returns [`NormalizeError::MalformedTimestamp`] if the date-time prefix does
/// not match [`ISO_FORMAT`] or the suffix is not a known zone name.
pub fn parse_zoned(input: &str) -> Result<DateTime<Tz>, NormalizeError> {
    let split = input
        .len()
        .checked_sub(ZONE_SUFFIX_LEN)
        .filter(|&idx| input.is_char_boundary(idx))
        .ok_or_else(|| NormalizeError::malformed_timestamp(input, "too short for a zone suffix"))?;
    let (local, zone) = input.split_at(split);

    let naive = NaiveDateTime::parse_from_str(local, ISO_FORMAT)
        .map_err(|e| NormalizeError::malformed_timestamp(input, e.to_string()))?;
    let tz: Tz = zone
        .parse()
        .map_err(|_| NormalizeError::malformed_timestamp(input, format!("unknown zone '{zone}'")))?;

    if let Some(instant) = tz.from_local_datetime(&naive).latest() {
        return Ok(instant);
    }

    // Spring-forward gap: read the wall clock in the zone's standard time.
    let standard = tz.offset_from_utc_datetime(&naive).base_utc_offset();
    let utc = naive
        .checked_sub_signed(standard)
        .ok_or_else(|| NormalizeError::malformed_timestamp(input, "out of range"))?;
    Ok(tz.from_utc_datetime(&utc))
}

/// Parses an ISO-8601 timestamp whose last character is a zone marker, such
/// as `2017-03-01T12:30:00Z`.
///
/// Everything but the final character must match [`ISO_FORMAT`]. A final `Z`
/// yields a UTC instant; any other final character yields a naive time.
pub fn parse_iso(input: &str) -> Result<Timestamp, NormalizeError> {
    let (split, marker) = input
        .char_indices()
        .last()
        .ok_or_else(|| NormalizeError::malformed_timestamp(input, "empty timestamp"))?;

    let naive = NaiveDateTime::parse_from_str(&input[..split], ISO_FORMAT)
        .map_err(|e| NormalizeError::malformed_timestamp(input, e.to_string()))?;

    if marker == 'Z' {
        Ok(Timestamp::Zoned(Tz::UTC.from_utc_datetime(&naive)))
    } else {
        Ok(Timestamp::Naive(naive))
    }
}

/// Formats an instant as `YYYY-MM-DDTHH:MM:SSZ`, converting to UTC first.
///
/// This is the inverse of [`parse_iso`] for `Z`-suffixed input only.
pub fn iso_format<T: TimeZone>(instant: &DateTime<T>) -> String {
    instant
        .with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}
