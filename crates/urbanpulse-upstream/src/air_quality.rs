//! Client for the air-quality service.
//!
//! Unlike the other Maps services this one takes a POST body with the
//! coordinate and answers with a list of index readings; only the first
//! index is consumed.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://airquality.googleapis.com";

/// Category reported when the service returns no index for a coordinate.
const DEFAULT_CATEGORY: &str = "Moderate";

#[derive(Clone)]
pub struct AirQualityClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AqiReading {
    pub aqi: i64,
    pub category: String,
}

#[derive(Serialize)]
struct LookupRequest {
    location: LookupLocation,
}

#[derive(Serialize)]
struct LookupLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct LookupEnvelope {
    #[serde(default)]
    indexes: Vec<IndexDto>,
}

#[derive(Debug, Deserialize)]
struct IndexDto {
    aqi: Option<i64>,
    category: Option<String>,
}

impl AirQualityClient {
    /// Creates a client pointed at the production air-quality service.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, UpstreamError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the HTTP client cannot be built,
    /// or [`UpstreamError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            api_key: api_key.to_owned(),
            base_url: http::parse_base_url(base_url)?,
        })
    }

    /// Fetches the current AQI reading at a coordinate. An empty index list
    /// degrades to `aqi: 0` with the default category rather than an error.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::UnexpectedStatus`] on a non-2xx HTTP status.
    /// - [`UpstreamError::Http`] on network failure.
    /// - [`UpstreamError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn current(&self, lat: f64, lng: f64) -> Result<AqiReading, UpstreamError> {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("v1")
                .push("currentConditions:lookup");
        }
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let request = LookupRequest {
            location: LookupLocation {
                latitude: lat,
                longitude: lng,
            },
        };

        let response = self.client.post(url.clone()).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let envelope: LookupEnvelope =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Deserialize {
                context: "air quality lookup".to_owned(),
                source: e,
            })?;

        let first = envelope.indexes.into_iter().next();
        Ok(AqiReading {
            aqi: first.as_ref().and_then(|i| i.aqi).unwrap_or(0),
            category: first
                .and_then(|i| i.category)
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
        })
    }
}
