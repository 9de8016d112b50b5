//! Client for the Maps elevation service.
//!
//! The service accepts a pipe-delimited list of `lat,lng` locations and
//! answers with a `{ status, results }` envelope; any status other than
//! `"OK"` is surfaced as [`UpstreamError::ApiStatus`].

use reqwest::{Client, Url};
use serde::Deserialize;

use urbanpulse_engine::types::{ProbePoint, RawSample};

use crate::error::UpstreamError;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/elevation";

#[derive(Clone)]
pub struct ElevationClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ElevationEnvelope {
    status: String,
    #[serde(default)]
    results: Vec<ElevationResult>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    location: LocationDto,
    elevation: f64,
}

#[derive(Debug, Deserialize)]
struct LocationDto {
    lat: f64,
    lng: f64,
}

impl ElevationClient {
    /// Creates a client pointed at the production elevation service.
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

    /// Fetches elevations for a whole probe grid in one batched request.
    ///
    /// Returns one [`RawSample`] per upstream result, carrying the
    /// service-echoed coordinates rather than the requested ones.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::UnexpectedStatus`] on a non-2xx HTTP status.
    /// - [`UpstreamError::ApiStatus`] if the envelope status is not `"OK"`.
    /// - [`UpstreamError::Http`] on network failure.
    /// - [`UpstreamError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn lookup_batch(
        &self,
        points: &[ProbePoint],
    ) -> Result<Vec<RawSample>, UpstreamError> {
        let locations = points
            .iter()
            .map(|p| format!("{},{}", p.lat, p.lng))
            .collect::<Vec<_>>()
            .join("|");
        let url = self.build_url(&locations);

        let envelope = self.request_envelope(url).await?;
        if envelope.status != "OK" {
            return Err(UpstreamError::ApiStatus {
                service: "elevation",
                status: envelope.status,
            });
        }

        Ok(envelope
            .results
            .into_iter()
            .map(|r| RawSample {
                lat: r.location.lat,
                lng: r.location.lng,
                elevation: Some(r.elevation),
                ..RawSample::default()
            })
            .collect())
    }

    /// Fetches the elevation at a single coordinate.
    ///
    /// # Errors
    ///
    /// Same as [`ElevationClient::lookup_batch`], plus
    /// [`UpstreamError::NoCoverage`] when the service returns an empty
    /// result set for the coordinate.
    pub async fn lookup_point(&self, lat: f64, lng: f64) -> Result<f64, UpstreamError> {
        let point = ProbePoint { lat, lng };
        let samples = self.lookup_batch(std::slice::from_ref(&point)).await?;
        samples
            .first()
            .and_then(|s| s.elevation)
            .ok_or(UpstreamError::NoCoverage { lat, lng })
    }

    fn build_url(&self, locations: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("json");
        }
        url.query_pairs_mut()
            .append_pair("locations", locations)
            .append_pair("key", &self.api_key);
        url
    }

    async fn request_envelope(&self, url: Url) -> Result<ElevationEnvelope, UpstreamError> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Deserialize {
            context: "elevation lookup".to_owned(),
            source: e,
        })
    }
}
