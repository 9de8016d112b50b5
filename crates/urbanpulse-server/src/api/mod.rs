mod advisory;
mod conditions;
mod flood;
mod grids;
mod solar;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use urbanpulse_core::AppConfig;
use urbanpulse_engine::{
    Building, CacheStore, CoverageCache, FileStore, MemoryStore, ProbePoint, QueryGate,
    WeightedPoint,
};
use urbanpulse_upstream::{
    AirQualityClient, ElevationClient, GenerativeClient, GridSampler, ImageryClient, SolarClient,
    WeatherClient,
};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState};

pub type SharedStore<T> = Box<dyn CacheStore<T> + Send + Sync>;

/// One layer's coverage cache plus the gate that supersedes its in-flight
/// queries.
pub struct LayerCoverage<T: Clone> {
    pub cache: Mutex<CoverageCache<T, SharedStore<T>>>,
    pub gate: QueryGate,
}

impl<T: Clone> LayerCoverage<T> {
    fn open(store: SharedStore<T>) -> Self {
        Self {
            cache: Mutex::new(CoverageCache::open(store)),
            gate: QueryGate::new(),
        }
    }
}

/// Per-layer coverage state. Thermal and flood cache weighted heatmap points;
/// solar caches deduplicated buildings.
pub struct CoverageState {
    pub thermal: LayerCoverage<WeightedPoint>,
    pub flood: LayerCoverage<WeightedPoint>,
    pub solar: LayerCoverage<Building>,
}

impl CoverageState {
    /// Durable caches, one JSON file per layer under `dir`.
    #[must_use]
    pub fn on_disk(dir: &Path) -> Self {
        Self {
            thermal: LayerCoverage::open(Box::new(FileStore::new(
                dir.join("thermal-coverage.json"),
            ))),
            flood: LayerCoverage::open(Box::new(FileStore::new(dir.join("flood-coverage.json")))),
            solar: LayerCoverage::open(Box::new(FileStore::new(dir.join("solar-coverage.json")))),
        }
    }

    /// Ephemeral caches for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            thermal: LayerCoverage::open(Box::new(MemoryStore)),
            flood: LayerCoverage::open(Box::new(MemoryStore)),
            solar: LayerCoverage::open(Box::new(MemoryStore)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sampler: Arc<GridSampler>,
    pub elevation: ElevationClient,
    pub weather: WeatherClient,
    pub air_quality: AirQualityClient,
    pub solar: SolarClient,
    pub imagery: ImageryClient,
    pub generative: Option<GenerativeClient>,
    pub coverage: Arc<CoverageState>,
}

/// Common request body for the query routes: a clicked coordinate plus an
/// optional human-readable place name for the AI routes.
#[derive(Debug, Deserialize)]
pub struct QueryBody {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "locationName", default)]
    pub location_name: Option<String>,
}

impl QueryBody {
    fn center(&self) -> ProbePoint {
        ProbePoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let query_routes = Router::new()
        .route("/api/v1/thermal-grid", post(grids::thermal_grid))
        .route("/api/v1/flood-grid", post(grids::flood_grid))
        .route("/api/v1/solar-grid", post(grids::solar_grid))
        .route("/api/v1/flood", post(flood::flood_point))
        .route("/api/v1/solar", post(solar::solar_point))
        .route("/api/v1/google-data", post(conditions::current_conditions))
        .route("/api/v1/analyze", post(advisory::analyze))
        .route("/api/v1/generate-report", post(advisory::generate_report))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .merge(query_routes)
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthData { status: "ok" })
}

#[must_use]
pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use urbanpulse_core::Environment;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> AppConfig {
        AppConfig {
            env: Environment::Test,
            bind_addr: "127.0.0.1:0".parse().expect("socket addr"),
            log_level: "info".to_owned(),
            maps_api_key: "test-key".to_owned(),
            gemini_api_key: None,
            upstream_timeout_secs: 5,
            grid_divisions: 10,
            thermal_spread_degrees: 0.015,
            thermal_jitter_fraction: 0.8,
            flood_spread_degrees: 0.015,
            flood_jitter_fraction: 0.4,
            solar_spread_degrees: 3.0,
            solar_max_concurrent_probes: 4,
            cache_dir: "./data".into(),
        }
    }

    /// State with every client pointed at one mock server. The generative
    /// client is opt-in because most routes must work without it.
    fn test_state(uri: &str, with_generative: bool) -> AppState {
        let elevation = ElevationClient::with_base_url("test-key", 5, uri).expect("elevation");
        let weather = WeatherClient::with_base_url(5, uri).expect("weather");
        let air_quality =
            AirQualityClient::with_base_url("test-key", 5, uri).expect("air quality");
        let solar = SolarClient::with_base_url("test-key", 5, uri).expect("solar");
        let imagery = ImageryClient::with_base_url("test-key", 5, uri).expect("imagery");
        let sampler = Arc::new(GridSampler::new(
            elevation.clone(),
            weather.clone(),
            air_quality.clone(),
            solar.clone(),
            4,
        ));
        AppState {
            config: Arc::new(test_config()),
            sampler,
            elevation,
            weather,
            air_quality,
            solar,
            imagery,
            generative: with_generative.then(|| {
                GenerativeClient::with_base_url("test-key", 5, uri).expect("generative")
            }),
            coverage: Arc::new(CoverageState::in_memory()),
        }
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    fn kl_body() -> serde_json::Value {
        serde_json::json!({ "lat": 3.1579, "lng": 101.7116 })
    }

    async fn mount_elevation(server: &MockServer, elevations: &[f64]) {
        let results: Vec<serde_json::Value> = elevations
            .iter()
            .enumerate()
            .map(|(i, e)| {
                serde_json::json!({
                    "location": { "lat": 3.15 + 0.001 * i as f64, "lng": 101.71 },
                    "elevation": e
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": results
            })))
            .mount(server)
            .await;
    }

    async fn mount_weather(server: &MockServer, temperature: f64, windspeed: f64, code: i64) {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_weather": {
                    "temperature": temperature,
                    "windspeed": windspeed,
                    "weathercode": code
                }
            })))
            .mount(server)
            .await;
    }

    async fn mount_aqi(server: &MockServer, aqi: i64, category: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/currentConditions:lookup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "indexes": [{ "aqi": aqi, "category": category }]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn health_returns_ok_with_request_id_header() {
        let app = build_app(
            test_state("http://127.0.0.1:1", false),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn thermal_grid_weights_match_reference_ambient() {
        let server = MockServer::start().await;
        // elevation 20, temp 32, aqi 150, wind 5 → weight 25.1 per point.
        mount_elevation(&server, &[20.0, 20.0]).await;
        mount_weather(&server, 32.0, 5.0, 0).await;
        mount_aqi(&server, 150, "Unhealthy").await;

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/thermal-grid", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let points = json.as_array().expect("array body");
        assert_eq!(points.len(), 2);
        for p in points {
            let weight = p["weight"].as_f64().expect("weight");
            assert!((weight - 25.1).abs() < 0.01, "got {weight}");
        }
    }

    #[tokio::test]
    async fn grid_route_returns_empty_array_when_elevation_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_weather(&server, 31.0, 2.0, 0).await;

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/flood-grid", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn second_grid_query_at_same_center_is_served_from_cache() {
        let server = MockServer::start().await;
        let results: Vec<serde_json::Value> = (0..3)
            .map(|i| {
                serde_json::json!({
                    "location": { "lat": 3.15 + 0.001 * f64::from(i), "lng": 101.71 },
                    "elevation": 25.0
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": results
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_weather(&server, 30.0, 0.0, 61).await;

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());

        let first = app
            .clone()
            .oneshot(post_json("/api/v1/flood-grid", &kl_body()))
            .await
            .expect("first response");
        let first_json = body_json(first).await;

        let second = app
            .oneshot(post_json("/api/v1/flood-grid", &kl_body()))
            .await
            .expect("second response");
        let second_json = body_json(second).await;

        assert_eq!(first_json, second_json);
        assert_eq!(first_json.as_array().map(Vec::len), Some(3));
        // wiremock verifies on drop that the elevation endpoint saw 1 call.
    }

    #[tokio::test]
    async fn solar_grid_returns_deduplicated_buildings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/buildingInsights:findClosest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "buildings/kl-tower",
                "center": { "latitude": 3.1528, "longitude": 101.7038 },
                "solarPotential": {
                    "maxArrayPanels": 120.0,
                    "wholeRoofStats": { "areaMeters2": 950.2 }
                }
            })))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/solar-grid", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let buildings = json.as_array().expect("array body");
        assert_eq!(buildings.len(), 1, "100 probes, one building id");
        assert_eq!(buildings[0]["id"], "buildings/kl-tower");
        assert_eq!(buildings[0]["weight"], 120.0);
        assert_eq!(buildings[0]["area"], 950.0);
    }

    #[tokio::test]
    async fn flood_point_reports_critical_band_below_30m() {
        let server = MockServer::start().await;
        mount_elevation(&server, &[25.04]).await;
        mount_weather(&server, 29.0, 3.0, 63).await; // moderate rain

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/flood", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["elevation"], "25.0");
        assert_eq!(json["riskLevel"], "Critical");
        assert_eq!(json["estDepth"], "0.8m - 1.5m");
        assert_eq!(json["rainChance"], 0.8);
        assert_eq!(json["source"], "Google Elevation API");
    }

    #[tokio::test]
    async fn flood_point_returns_404_without_coverage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": []
            })))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/flood", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No elevation data");
    }

    #[tokio::test]
    async fn solar_point_computes_tariff_savings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/buildingInsights:findClosest"))
            .and(query_param("requiredQuality", "BASE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "buildings/roof-1",
                "center": { "latitude": 3.1579, "longitude": 101.7116 },
                "solarPotential": {
                    "maxArrayPanels": 64.0,
                    "wholeRoofStats": { "areaMeters2": 813.4 }
                }
            })))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/solar", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["area"], 813.0);
        // 813 × 4 × 0.15 × 365 × 0.5 = 89023.5 → 89024
        assert_eq!(json["savings"], 89024.0);
        assert_eq!(json["potential"], "Excellent");
        assert_eq!(json["source"], "Google Solar API");
    }

    #[tokio::test]
    async fn solar_point_degrades_to_data_pending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/buildingInsights:findClosest"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/solar", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK, "solar never errors");
        let json = body_json(response).await;
        assert_eq!(json["area"], 0.0);
        assert_eq!(json["savings"], 0.0);
        assert_eq!(json["potential"], "Data Pending");
    }

    #[tokio::test]
    async fn google_data_combines_aqi_and_weather() {
        let server = MockServer::start().await;
        mount_aqi(&server, 55, "Good").await;
        mount_weather(&server, 29.4, 6.2, 61).await;

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/google-data", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["aqi"], 55);
        assert_eq!(json["status"], "Good");
        assert_eq!(json["temp"], 29.4);
        assert_eq!(json["windspeed"], 6.2);
        assert_eq!(json["condition"], "Rainy");
        assert_eq!(json["weathercode"], 61);
    }

    #[tokio::test]
    async fn google_data_returns_error_body_when_aqi_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/currentConditions:lookup"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        mount_weather(&server, 30.0, 0.0, 0).await;

        let app = build_app(test_state(&server.uri(), false), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/google-data", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["aqi"], 0);
        assert_eq!(json["status"], "Error");
    }

    #[tokio::test]
    async fn analyze_returns_500_without_generative_client() {
        let app = build_app(
            test_state("http://127.0.0.1:1", false),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(post_json(
                "/api/v1/analyze",
                &serde_json::json!({ "lat": 3.15, "lng": 101.71, "locationName": "KLCC" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn analyze_returns_404_without_street_view_coverage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streetview/metadata"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "ZERO_RESULTS" })),
            )
            .mount(&server)
            .await;

        let app = build_app(test_state(&server.uri(), true), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/analyze", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No Street View imagery found");
    }

    #[tokio::test]
    async fn analyze_tolerates_snake_case_model_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streetview/metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "location": { "lat": 3.1580, "lng": 101.7117 }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/streetview"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"jpeg".to_vec(), "image/jpeg"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash-lite:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{
                    "text": "Here you go: {\"walkability_score\": 72, \"shade_score\": 41, \"summary\": \"Wide pavement, sparse trees.\", \"recommendation\": \"Plant shade trees along the kerb.\"}"
                }] } }]
            })))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server.uri(), true), default_rate_limit_state());
        let response = app
            .oneshot(post_json(
                "/api/v1/analyze",
                &serde_json::json!({ "lat": 3.1579, "lng": 101.7116, "locationName": "KLCC" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["walkabilityScore"], 72.0);
        assert_eq!(json["shadeScore"], 41.0);
        assert_eq!(json["summary"], "Wide pavement, sparse trees.");
        assert_eq!(json["recommendation"], "Plant shade trees along the kerb.");
    }

    #[tokio::test]
    async fn analyze_rejects_unparseable_model_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streetview/metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "location": { "lat": 3.1580, "lng": 101.7117 }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/streetview"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"jpeg".to_vec(), "image/jpeg"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash-lite:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "no json at all" }] } }]
            })))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server.uri(), true), default_rate_limit_state());
        let response = app
            .oneshot(post_json("/api/v1/analyze", &kl_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid AI response");
    }

    #[tokio::test]
    async fn generate_report_requires_name_and_coordinates() {
        let app = build_app(
            test_state("http://127.0.0.1:1", true),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(post_json(
                "/api/v1/generate-report",
                &serde_json::json!({ "lat": 3.15, "lng": 101.71 }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Location name and coordinates are required");
    }

    #[tokio::test]
    async fn generate_report_stamps_timestamp_and_image_data_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streetview"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"sv".to_vec(), "image/jpeg"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/staticmap"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"sat".to_vec(), "image/jpeg"))
            .mount(&server)
            .await;

        let report = serde_json::json!({
            "title": "Urban Intelligence Briefing: KLCC",
            "executive_summary": "Dense urban core with strong canopy along the park edge.",
            "location_name": "KLCC",
            "key_metrics": [{
                "label": "Walkability Index",
                "value": 82,
                "unit": "/100",
                "status": "Good",
                "description": "Wide sidewalks and crossings visible."
            }],
            "recommendations": ["Extend the covered walkway network."],
            "environmental_insights": "Canopy density tracks the park boundary."
        });
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash-lite:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": report.to_string() }] } }]
            })))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server.uri(), true), default_rate_limit_state());
        let response = app
            .oneshot(post_json(
                "/api/v1/generate-report",
                &serde_json::json!({
                    "lat": 3.1579,
                    "lng": 101.7116,
                    "locationName": "KLCC",
                    "aqi": 55,
                    "temp": 31.5
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        let data = &json["data"];
        assert_eq!(data["location_name"], "KLCC");
        assert!(data["generated_at"].is_string());
        assert_eq!(
            data["images"]["streetView"].as_str(),
            Some("data:image/jpeg;base64,c3Y=")
        );
        assert_eq!(
            data["images"]["satellite"].as_str(),
            Some("data:image/jpeg;base64,c2F0")
        );
    }

    #[tokio::test]
    async fn query_routes_are_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let app = build_app(
            test_state(&server.uri(), false),
            RateLimitState::new(2, Duration::from_secs(60)),
        );

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(post_json("/api/v1/flood-grid", &kl_body()))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let limited = app
            .oneshot(post_json("/api/v1/flood-grid", &kl_body()))
            .await
            .expect("response");
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
