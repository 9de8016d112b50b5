//! Client for the solar building-insights service.
//!
//! `find_closest_building` looks up the nearest processed building footprint
//! for a coordinate. Per the pipeline's failure policy, "no mapped building
//! here" (HTTP error, missing potential, unparseable body) is `Ok(None)` —
//! only transport-level failures surface as errors.

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::UpstreamError;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://solar.googleapis.com";

#[derive(Clone)]
pub struct SolarClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

/// The subset of building insights the pipeline consumes. Coordinates are
/// the upstream building center, not the probe point that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingInsights {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub max_array_panels: f64,
    pub roof_area_m2: f64,
}

#[derive(Debug, Deserialize)]
struct InsightsDto {
    name: Option<String>,
    center: Option<LatLngDto>,
    #[serde(rename = "solarPotential")]
    solar_potential: Option<SolarPotentialDto>,
}

#[derive(Debug, Deserialize)]
struct LatLngDto {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct SolarPotentialDto {
    #[serde(rename = "maxArrayPanels", default)]
    max_array_panels: f64,
    #[serde(rename = "wholeRoofStats")]
    whole_roof_stats: Option<RoofStatsDto>,
}

#[derive(Debug, Deserialize)]
struct RoofStatsDto {
    #[serde(rename = "areaMeters2", default)]
    area_meters2: f64,
}

impl SolarClient {
    /// Creates a client pointed at the production solar service.
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

    /// Looks up the nearest processed building for a coordinate.
    ///
    /// Returns `Ok(None)` when the service has no coverage (non-2xx status,
    /// missing solar potential, or an unparseable body).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] only on transport failure.
    pub async fn find_closest_building(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<Option<BuildingInsights>, UpstreamError> {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("v1")
                .push("buildingInsights:findClosest");
        }
        url.query_pairs_mut()
            .append_pair("location.latitude", &lat.to_string())
            .append_pair("location.longitude", &lng.to_string())
            .append_pair("requiredQuality", "BASE")
            .append_pair("experiments", "EXPANDED_COVERAGE")
            .append_pair("key", &self.api_key);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            tracing::debug!(lat, lng, status = %response.status(), "no solar coverage");
            return Ok(None);
        }

        let body = response.text().await?;
        let dto: InsightsDto = match serde_json::from_str(&body) {
            Ok(dto) => dto,
            Err(e) => {
                tracing::debug!(lat, lng, error = %e, "solar response unparseable; skipping point");
                return Ok(None);
            }
        };

        let (Some(id), Some(center), Some(potential)) =
            (dto.name, dto.center, dto.solar_potential)
        else {
            return Ok(None);
        };

        Ok(Some(BuildingInsights {
            id,
            lat: center.latitude,
            lng: center.longitude,
            max_array_panels: potential.max_array_panels,
            roof_area_m2: potential
                .whole_roof_stats
                .map(|s| s.area_meters2)
                .unwrap_or_default(),
        }))
    }
}
