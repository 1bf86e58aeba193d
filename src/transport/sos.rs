//! Request parameters for the NDBC SOS `GetObservation` call, and detection of
//! the XML exception reports the service sends back in place of CSV.

use crate::normalize::timestamp::iso_format;
use crate::transport::error::TransportError;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

const OFFERING_PREFIX: &str = "urn:ioos:station:wmo:";
const EXCEPTION_MARKER: &str = "ExceptionReport";

static EXCEPTION_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?ExceptionText>\s*(.*?)\s*</(?:\w+:)?ExceptionText>")
        .expect("exception text pattern is valid")
});

/// One tabular observation request for a single station and property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosRequest {
    pub station: String,
    pub observed_property: String,
    /// Requests the observation nearest this instant instead of the latest.
    pub event_time: Option<DateTime<Utc>>,
}

impl SosRequest {
    pub fn new(station: impl Into<String>, observed_property: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            observed_property: observed_property.into(),
            event_time: None,
        }
    }

    pub fn at(mut self, instant: DateTime<Utc>) -> Self {
        self.event_time = Some(instant);
        self
    }

    pub fn offering(&self) -> String {
        format!("{}{}", OFFERING_PREFIX, self.station)
    }

    /// The query string pairs, in the order the service documents them.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("request", "GetObservation".to_string()),
            ("service", "SOS".to_string()),
            ("version", "1.0.0".to_string()),
            ("offering", self.offering()),
            ("observedproperty", self.observed_property.clone()),
            ("responseformat", "text/csv".to_string()),
        ];
        if let Some(instant) = &self.event_time {
            params.push(("eventtime", iso_format(instant)));
        }
        params
    }
}

/// Maps an `ExceptionReport` body to [`TransportError::ServiceException`];
/// any other body passes through.
pub(crate) fn check_exception(request: &SosRequest, body: String) -> Result<String, TransportError> {
    if !body.contains(EXCEPTION_MARKER) {
        return Ok(body);
    }
    let message = EXCEPTION_TEXT
        .captures(&body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unspecified service exception".to_string());
    Err(TransportError::ServiceException {
        station: request.station.clone(),
        property: request.observed_property.clone(),
        message,
    })
}
