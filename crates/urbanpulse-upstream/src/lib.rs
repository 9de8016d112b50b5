//! Typed clients for the external services the sampling pipeline fans out
//! to (elevation, weather, air quality, solar, street/satellite imagery,
//! generative AI), plus the per-layer grid sampler that orchestrates them.
//!
//! Every client takes a `with_base_url` constructor so integration tests can
//! point it at a wiremock server.

mod ai;
mod air_quality;
mod elevation;
mod error;
mod http;
mod imagery;
mod sampler;
mod solar;
mod weather;

pub use ai::{extract_json_object, GenerativeClient, Part};
pub use air_quality::{AirQualityClient, AqiReading};
pub use elevation::ElevationClient;
pub use error::UpstreamError;
pub use imagery::ImageryClient;
pub use sampler::{GridSampler, TerrainSamples};
pub use solar::{BuildingInsights, SolarClient};
pub use weather::{CurrentWeather, WeatherClient};
