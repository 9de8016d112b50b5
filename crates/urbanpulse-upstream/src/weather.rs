//! Client for the current-weather service (Open-Meteo style, keyless).

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::UpstreamError;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: Url,
}

/// Current conditions at a coordinate. Fields are optional because the
/// service omits them when a station has no reading; callers decide the
/// fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurrentWeather {
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub weathercode: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ForecastEnvelope {
    #[serde(default)]
    current_weather: Option<CurrentWeatherDto>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherDto {
    temperature: Option<f64>,
    windspeed: Option<f64>,
    weathercode: Option<i64>,
}

impl WeatherClient {
    /// Creates a client pointed at the production weather service.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, UpstreamError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the HTTP client cannot be built,
    /// or [`UpstreamError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            base_url: http::parse_base_url(base_url)?,
        })
    }

    /// Fetches current conditions at a coordinate.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::UnexpectedStatus`] on a non-2xx HTTP status.
    /// - [`UpstreamError::Http`] on network failure.
    /// - [`UpstreamError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn current(&self, lat: f64, lng: f64) -> Result<CurrentWeather, UpstreamError> {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("v1").push("forecast");
        }
        url.query_pairs_mut()
            .append_pair("latitude", &lat.to_string())
            .append_pair("longitude", &lng.to_string())
            .append_pair("current_weather", "true");

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let envelope: ForecastEnvelope =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Deserialize {
                context: "weather current conditions".to_owned(),
                source: e,
            })?;

        Ok(envelope
            .current_weather
            .map(|dto| CurrentWeather {
                temperature: dto.temperature,
                windspeed: dto.windspeed,
                weathercode: dto.weathercode,
            })
            .unwrap_or_default())
    }
}
