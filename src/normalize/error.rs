use polars::error::PolarsError;
use quick_xml::escape::EscapeError;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Malformed timestamp '{input}': {reason}")]
    MalformedTimestamp { input: String, reason: String },

    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    #[error("Value '{value}' of field '{field}' is not a number")]
    InvalidNumber { field: String, value: String },

    #[error("Coordinate field '{field}' holds '{value}', which is not a number")]
    InvalidCoordinate { field: String, value: String },

    #[error("Failed to decode tabular payload")]
    Csv(#[source] PolarsError),

    #[error("Failed to read XML payload")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML attribute")]
    XmlAttribute(#[from] AttrError),

    #[error("Malformed XML escape sequence")]
    XmlEscape(#[from] EscapeError),

    #[error("XML payload has no <observation> element")]
    MissingObservationNode,
}

impl NormalizeError {
    pub(crate) fn malformed_timestamp(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_number(field: &str, value: &str) -> Self {
        Self::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}
