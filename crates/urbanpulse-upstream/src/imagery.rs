//! Client for street-view and satellite imagery.
//!
//! Street-view coverage is probed via the metadata endpoint at expanding
//! radii before any image is fetched, since many clicked coordinates have no
//! panorama at the exact spot. Image fetches degrade to `None` on any
//! failure — the AI routes tolerate a missing picture.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::UpstreamError;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Search radii in meters: the exact location first, then outwards.
const METADATA_SEARCH_RADII_M: &[u32] = &[0, 50, 100, 200, 400, 800, 1600, 3200, 6400];

const IMAGE_SIZE: &str = "600x400";

#[derive(Clone)]
pub struct ImageryClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct MetadataEnvelope {
    status: String,
    #[serde(default)]
    location: Option<MetadataLocation>,
}

#[derive(Debug, Deserialize)]
struct MetadataLocation {
    lat: f64,
    lng: f64,
}

impl ImageryClient {
    /// Creates a client pointed at the production imagery services.
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

    /// Finds the nearest street-view panorama, probing outwards from the
    /// exact coordinate. Returns the panorama's coordinate, or `None` when
    /// no imagery exists within the largest radius.
    pub async fn find_street_view(&self, lat: f64, lng: f64) -> Option<(f64, f64)> {
        for &radius in METADATA_SEARCH_RADII_M {
            let mut url = self.endpoint(&["streetview", "metadata"]);
            url.query_pairs_mut()
                .append_pair("location", &format!("{lat},{lng}"))
                .append_pair("radius", &radius.to_string())
                .append_pair("source", "outdoor")
                .append_pair("key", &self.api_key);

            let envelope: Option<MetadataEnvelope> = match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => resp.json().await.ok(),
                Ok(_) | Err(_) => None,
            };

            if let Some(envelope) = envelope {
                if envelope.status == "OK" {
                    if let Some(loc) = envelope.location {
                        return Some((loc.lat, loc.lng));
                    }
                }
            }
        }
        None
    }

    /// Fetches a ground-level street-view snapshot as base64 JPEG, or `None`
    /// on any failure.
    pub async fn street_view_jpeg_base64(&self, lat: f64, lng: f64) -> Option<String> {
        let mut url = self.endpoint(&["streetview"]);
        url.query_pairs_mut()
            .append_pair("size", IMAGE_SIZE)
            .append_pair("location", &format!("{lat},{lng}"))
            .append_pair("fov", "90")
            .append_pair("heading", "235")
            .append_pair("pitch", "10")
            .append_pair("key", &self.api_key);
        self.fetch_image_base64(url, "street view").await
    }

    /// Fetches a top-down satellite snapshot as base64 JPEG, or `None` on
    /// any failure.
    pub async fn satellite_jpeg_base64(&self, lat: f64, lng: f64) -> Option<String> {
        let mut url = self.endpoint(&["staticmap"]);
        url.query_pairs_mut()
            .append_pair("center", &format!("{lat},{lng}"))
            .append_pair("zoom", "18")
            .append_pair("size", IMAGE_SIZE)
            .append_pair("maptype", "satellite")
            .append_pair("key", &self.api_key);
        self.fetch_image_base64(url, "satellite").await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut parts) = url.path_segments_mut() {
            parts.pop_if_empty();
            for segment in segments {
                parts.push(segment);
            }
        }
        url
    }

    async fn fetch_image_base64(&self, url: Url, kind: &'static str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(kind, error = %e, "image fetch failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(kind, status = %response.status(), "image fetch returned non-2xx");
            return None;
        }
        let bytes = response.bytes().await.ok()?;
        Some(STANDARD.encode(&bytes))
    }
}
