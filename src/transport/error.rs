use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Service rejected request for '{property}' at station {station}: {message}")]
    ServiceException {
        station: String,
        property: String,
        message: String,
    },
}
