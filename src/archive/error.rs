use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid archive query: {0}")]
    InvalidQuery(String),

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

    #[error("Request for {url} still failing after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },

    #[error("Archive rejected request for {url}: {reason}")]
    Api { url: String, reason: String },

    #[error("Failed to decode archive response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed archive response: {0}")]
    MalformedResponse(String),

    #[error("Archive returned no temperatures for {start}..={end}")]
    EmptySeries { start: NaiveDate, end: NaiveDate },
}

impl FetchError {
    const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

    /// Transient failures worth another attempt: connection problems and
    /// overload/gateway statuses.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            FetchError::NetworkRequest(..) => true,
            FetchError::HttpStatus { status, .. } => {
                Self::RETRY_STATUSES.contains(&status.as_u16())
            }
            _ => false,
        }
    }
}
