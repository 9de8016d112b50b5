use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{service} returned status \"{status}\"")]
    ApiStatus { service: &'static str, status: String },

    #[error("no coverage at ({lat}, {lng})")]
    NoCoverage { lat: f64, lng: f64 },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("model returned no usable candidates")]
    EmptyModelResponse,
}
