//! Heatmap grid routes.
//!
//! Each layer follows the same shape: check the coverage cache, and on a
//! miss generate a jittered probe grid, fan it out through the sampler,
//! weigh the results, and cache the covered region. Failures degrade to an
//! empty array so the render layer simply draws nothing.

use axum::extract::State;
use axum::Json;

use urbanpulse_engine::{
    flood_weight, generate_grid, is_raining, thermal_weight, Building, CacheEntry, GridSpec,
    Layer, WeightedPoint,
};

use super::{AppState, QueryBody};

fn grid_spec(state: &AppState, layer: Layer, body: &QueryBody) -> GridSpec {
    let config = &state.config;
    let (spread_degrees, jitter_fraction) = match layer {
        Layer::Thermal => (
            config.thermal_spread_degrees,
            config.thermal_jitter_fraction,
        ),
        Layer::Flood => (config.flood_spread_degrees, config.flood_jitter_fraction),
        // Building centers are real coordinates, not lattice artifacts, so
        // the solar scan needs no jitter.
        Layer::Solar => (config.solar_spread_degrees, 0.0),
    };
    GridSpec {
        center: body.center(),
        spread_degrees,
        divisions: config.grid_divisions,
        jitter_fraction,
    }
}

pub async fn thermal_grid(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Json<Vec<WeightedPoint>> {
    Json(heat_grid(&state, Layer::Thermal, &body).await)
}

pub async fn flood_grid(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Json<Vec<WeightedPoint>> {
    Json(heat_grid(&state, Layer::Flood, &body).await)
}

/// Shared thermal/flood pipeline: one batched elevation lookup per grid,
/// ambient conditions fetched once at the center.
async fn heat_grid(state: &AppState, layer: Layer, body: &QueryBody) -> Vec<WeightedPoint> {
    let coverage = match layer {
        Layer::Thermal => &state.coverage.thermal,
        _ => &state.coverage.flood,
    };

    {
        let cache = coverage.cache.lock().await;
        if let Some(entry) = cache.lookup(body.lat, body.lng) {
            tracing::debug!(%layer, lat = body.lat, lng = body.lng, "serving grid from coverage cache");
            return entry.data.clone();
        }
    }

    let ticket = coverage.gate.begin();
    let spec = grid_spec(state, layer, body);
    let points = {
        let mut rng = rand::rng();
        generate_grid(&spec, &mut rng)
    };

    let terrain = state.sampler.sample_terrain(layer, &points, body.center()).await;
    let ambient = terrain.ambient;
    let raining = is_raining(ambient.weather_code);

    let weighted: Vec<WeightedPoint> = terrain
        .samples
        .into_iter()
        .filter_map(|sample| {
            let elevation = sample.elevation?;
            let weight = match layer {
                Layer::Thermal => thermal_weight(elevation, &ambient),
                _ => flood_weight(elevation, raining),
            };
            Some(WeightedPoint {
                lat: sample.lat,
                lng: sample.lng,
                weight,
            })
        })
        .collect();

    // An empty result means the upstream fetch failed; caching it would pin
    // a permanently blank region.
    if !weighted.is_empty() {
        let entry = CacheEntry::around(
            body.lat,
            body.lng,
            spec.spread_degrees / 2.0,
            weighted.clone(),
        );
        let mut cache = coverage.cache.lock().await;
        cache.insert_if_live(&ticket, entry);
    }

    weighted
}

/// Solar deep scan: per-probe building lookups, deduplicated upstream by
/// building id.
pub async fn solar_grid(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Json<Vec<Building>> {
    let coverage = &state.coverage.solar;

    {
        let cache = coverage.cache.lock().await;
        if let Some(entry) = cache.lookup(body.lat, body.lng) {
            tracing::debug!(lat = body.lat, lng = body.lng, "serving solar scan from coverage cache");
            return Json(entry.data.clone());
        }
    }

    let ticket = coverage.gate.begin();
    let spec = grid_spec(&state, Layer::Solar, &body);
    let points = {
        let mut rng = rand::rng();
        generate_grid(&spec, &mut rng)
    };

    let buildings = state.sampler.sample_buildings(&points).await;

    if !buildings.is_empty() {
        let entry = CacheEntry::around(
            body.lat,
            body.lng,
            spec.spread_degrees / 2.0,
            buildings.clone(),
        );
        let mut cache = coverage.cache.lock().await;
        cache.insert_if_live(&ticket, entry);
    }

    Json(buildings)
}
