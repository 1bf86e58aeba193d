use crate::normalize::timestamp::Timestamp;
use crate::types::observation::Observation;
use serde::Serialize;

/// The result of resolving one property against a feed payload.
///
/// `Missing` is a regular outcome, not an error: it covers absent fields,
/// empty cells and readings the station simply does not report.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum PropertyValue {
    #[default]
    Missing,
    /// A unit-bearing numeric reading.
    Observation(Observation),
    /// A list-encoded field whose header carried a unit.
    Observations(Vec<Observation>),
    /// A bare number, as coerced by the tree decoder.
    Number(f64),
    /// A timestamp, as coerced by the tree decoder.
    Timestamp(Timestamp),
    /// A value with no unit, passed through untouched.
    Text(String),
    /// A list-encoded field whose header carried no unit.
    Texts(Vec<String>),
}

impl PropertyValue {
    /// True for `Missing` and for list-encoded fields with no entries left.
    pub fn is_missing(&self) -> bool {
        match self {
            PropertyValue::Missing => true,
            PropertyValue::Observations(values) => values.is_empty(),
            PropertyValue::Texts(values) => values.is_empty(),
            _ => false,
        }
    }

    /// The numeric reading, if this value holds a single number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Observation(observation) => Some(observation.value()),
            PropertyValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_observation(&self) -> Option<&Observation> {
        match self {
            PropertyValue::Observation(observation) => Some(observation),
            _ => None,
        }
    }

    pub fn as_observations(&self) -> Option<&[Observation]> {
        match self {
            PropertyValue::Observations(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_texts(&self) -> Option<&[String]> {
        match self {
            PropertyValue::Texts(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            PropertyValue::Timestamp(timestamp) => Some(timestamp),
            _ => None,
        }
    }

    /// The unit label carried by the value itself, if any.
    pub fn unit(&self) -> Option<&str> {
        match self {
            PropertyValue::Observation(observation) => observation.unit(),
            PropertyValue::Observations(values) => values.first().and_then(Observation::unit),
            _ => None,
        }
    }
}

impl From<Observation> for PropertyValue {
    fn from(observation: Observation) -> Self {
        PropertyValue::Observation(observation)
    }
}
