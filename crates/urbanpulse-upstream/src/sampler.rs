//! Per-layer grid sampling strategies.
//!
//! Thermal and flood grids share one strategy: a single batched elevation
//! request for every probe point plus ambient conditions looked up once at
//! the center (conditions are assumed uniform over the ~1.5 km probe
//! radius). The solar deep scan instead issues one building lookup per probe
//! point with bounded concurrency and deduplicates by building id.
//!
//! Failure containment: a failed batch or a failed individual probe never
//! propagates — the layer simply yields fewer (or zero) samples.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};

use urbanpulse_engine::types::{AmbientConditions, Building, Layer, ProbePoint, RawSample};

use crate::air_quality::AirQualityClient;
use crate::elevation::ElevationClient;
use crate::solar::SolarClient;
use crate::weather::WeatherClient;

/// Fallback ambient temperature when the weather service has no reading;
/// the render layer assumes the same baseline.
const DEFAULT_AMBIENT_TEMP_C: f64 = 30.0;

/// Elevation samples plus the center-point ambient conditions they were
/// fetched under.
#[derive(Debug)]
pub struct TerrainSamples {
    pub samples: Vec<RawSample>,
    pub ambient: AmbientConditions,
}

/// Fans probe grids out to the upstream services, one strategy per layer.
pub struct GridSampler {
    elevation: ElevationClient,
    weather: WeatherClient,
    air_quality: AirQualityClient,
    solar: SolarClient,
    solar_max_concurrent: usize,
}

impl GridSampler {
    #[must_use]
    pub fn new(
        elevation: ElevationClient,
        weather: WeatherClient,
        air_quality: AirQualityClient,
        solar: SolarClient,
        solar_max_concurrent: usize,
    ) -> Self {
        Self {
            elevation,
            weather,
            air_quality,
            solar,
            solar_max_concurrent,
        }
    }

    /// Samples elevation for every probe point and ambient conditions at the
    /// center. Used by the thermal and flood layers; only thermal pays for
    /// the extra air-quality lookup.
    ///
    /// An elevation batch failure yields an empty sample set; a failed
    /// ambient lookup falls back to neutral conditions. Neither is an error.
    pub async fn sample_terrain(
        &self,
        layer: Layer,
        points: &[ProbePoint],
        center: ProbePoint,
    ) -> TerrainSamples {
        let aqi_lookup = async {
            if matches!(layer, Layer::Thermal) {
                self.air_quality.current(center.lat, center.lng).await.ok()
            } else {
                None
            }
        };

        let (elevation_result, weather_result, aqi) = tokio::join!(
            self.elevation.lookup_batch(points),
            self.weather.current(center.lat, center.lng),
            aqi_lookup,
        );

        let samples = elevation_result.unwrap_or_else(|e| {
            tracing::warn!(%layer, error = %e, "elevation batch failed; returning empty sample set");
            Vec::new()
        });

        let weather = weather_result.unwrap_or_else(|e| {
            tracing::warn!(%layer, error = %e, "weather lookup failed; using neutral ambient");
            crate::weather::CurrentWeather::default()
        });

        let ambient = AmbientConditions {
            temperature: weather.temperature.unwrap_or(DEFAULT_AMBIENT_TEMP_C),
            windspeed: weather.windspeed.unwrap_or(0.0),
            aqi: aqi.map_or(0, |a| a.aqi),
            weather_code: weather.weathercode.unwrap_or(0),
        };

        TerrainSamples { samples, ambient }
    }

    /// Solar deep scan: one nearest-building lookup per probe point, fanned
    /// out with bounded concurrency. Nearby probes commonly resolve to the
    /// same footprint, so results are deduplicated by building id (first
    /// resolution wins). Failed probes are silently dropped.
    pub async fn sample_buildings(&self, points: &[ProbePoint]) -> Vec<Building> {
        let resolved: Vec<Option<Building>> = stream::iter(points.iter().copied())
            .map(|p| async move {
                match self.solar.find_closest_building(p.lat, p.lng).await {
                    Ok(Some(insights)) => Some(Building {
                        id: insights.id,
                        lat: insights.lat,
                        lng: insights.lng,
                        weight: insights.max_array_panels,
                        area: insights.roof_area_m2.round(),
                    }),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::debug!(lat = p.lat, lng = p.lng, error = %e, "solar probe failed; dropping point");
                        None
                    }
                }
            })
            .buffer_unordered(self.solar_max_concurrent.max(1))
            .collect()
            .await;

        let mut by_id: HashMap<String, Building> = HashMap::new();
        let mut ordered = Vec::new();
        for building in resolved.into_iter().flatten() {
            if !by_id.contains_key(&building.id) {
                by_id.insert(building.id.clone(), building.clone());
                ordered.push(building);
            }
        }
        ordered
    }
}
