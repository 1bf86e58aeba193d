use crate::transport::error::TransportError;
use crate::transport::sos::{check_exception, SosRequest};
use bon::bon;
use log::{info, warn};
use reqwest::blocking::Client;
use std::time::Duration;

pub const SOS_ENDPOINT: &str = "https://sdf.ndbc.noaa.gov/sos/server.php";
pub const OBSERVATION_ENDPOINT: &str = "https://www.ndbc.noaa.gov/get_observation_as_xml.php";
pub const STATION_PAGE_ENDPOINT: &str = "https://www.ndbc.noaa.gov/station_page.php";
pub const CAM_ENDPOINT: &str = "https://www.ndbc.noaa.gov/buoycam.php";

/// Where raw station payloads come from.
///
/// Implementations only move text; all decoding happens in the caller.
pub trait FeedSource {
    /// The latest-observation XML document for `station`.
    fn latest_observation(&self, station: &str) -> Result<String, TransportError>;

    /// The CSV body answering `request`.
    fn observations(&self, request: &SosRequest) -> Result<String, TransportError>;
}

impl<T: FeedSource + ?Sized> FeedSource for &T {
    fn latest_observation(&self, station: &str) -> Result<String, TransportError> {
        (**self).latest_observation(station)
    }

    fn observations(&self, request: &SosRequest) -> Result<String, TransportError> {
        (**self).observations(request)
    }
}

impl<T: FeedSource + ?Sized> FeedSource for Box<T> {
    fn latest_observation(&self, station: &str) -> Result<String, TransportError> {
        (**self).latest_observation(station)
    }

    fn observations(&self, request: &SosRequest) -> Result<String, TransportError> {
        (**self).observations(request)
    }
}

/// Blocking HTTP client for the NDBC feeds.
///
/// # Examples
///
/// ```no_run
/// use buoyant::{NdbcClient, TransportError};
/// use std::time::Duration;
///
/// # fn run() -> Result<(), TransportError> {
/// let client = NdbcClient::builder()
///     .timeout(Duration::from_secs(20))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NdbcClient {
    http: Client,
    sos_endpoint: String,
    observation_endpoint: String,
}

#[bon]
impl NdbcClient {
    /// Creates a client. Endpoints default to the public NDBC services.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the HTTP client cannot be
    /// constructed (e.g. no TLS backend is available).
    #[builder]
    pub fn new(
        #[builder(into)] sos_endpoint: Option<String>,
        #[builder(into)] observation_endpoint: Option<String>,
        timeout: Option<Duration>,
        #[builder(into)] user_agent: Option<String>,
    ) -> Result<Self, TransportError> {
        let mut http = Client::builder();
        if let Some(timeout) = timeout {
            http = http.timeout(timeout);
        }
        if let Some(user_agent) = user_agent {
            http = http.user_agent(user_agent);
        }

        Ok(Self {
            http: http.build().map_err(TransportError::ClientBuild)?,
            sos_endpoint: sos_endpoint.unwrap_or_else(|| SOS_ENDPOINT.to_string()),
            observation_endpoint: observation_endpoint
                .unwrap_or_else(|| OBSERVATION_ENDPOINT.to_string()),
        })
    }

    fn get_text(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, TransportError> {
        let url = endpoint.to_string();
        info!("Requesting {} with {:?}", url, params);

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .map_err(|e| TransportError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    TransportError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    TransportError::NetworkRequest(url, e)
                });
            }
        };

        response
            .text()
            .map_err(|e| TransportError::NetworkRequest(url, e))
    }
}

impl FeedSource for NdbcClient {
    fn latest_observation(&self, station: &str) -> Result<String, TransportError> {
        self.get_text(&self.observation_endpoint, &[("station", station.to_string())])
    }

    fn observations(&self, request: &SosRequest) -> Result<String, TransportError> {
        let body = self.get_text(&self.sos_endpoint, &request.query_params())?;
        check_exception(request, body)
    }
}
