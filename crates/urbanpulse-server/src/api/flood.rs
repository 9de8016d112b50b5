//! Single-point flood assessment.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use urbanpulse_engine::{flood_risk, rain_chance};
use urbanpulse_upstream::UpstreamError;

use super::{AppState, QueryBody};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FloodAssessment {
    /// Meters above sea level, one decimal, as displayed.
    elevation: String,
    risk_level: &'static str,
    est_depth: &'static str,
    rain_chance: f64,
    source: &'static str,
}

pub async fn flood_point(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Response {
    let (elevation_result, weather_result) = tokio::join!(
        state.elevation.lookup_point(body.lat, body.lng),
        state.weather.current(body.lat, body.lng),
    );

    let elevation = match elevation_result {
        Ok(elevation) => elevation,
        Err(UpstreamError::NoCoverage { .. }) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "No elevation data" })),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(lat = body.lat, lng = body.lng, error = %e, "flood assessment failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "API Failure" })),
            )
                .into_response();
        }
    };

    // Elevation drives the assessment; a missing weather reading only costs
    // the rain-chance refinement.
    let weather = weather_result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "weather lookup failed; assuming dry conditions");
        urbanpulse_upstream::CurrentWeather::default()
    });

    let risk = flood_risk(elevation);
    Json(FloodAssessment {
        elevation: format!("{elevation:.1}"),
        risk_level: risk.level,
        est_depth: risk.est_depth,
        rain_chance: rain_chance(weather.weathercode.unwrap_or(0)),
        source: "Google Elevation API",
    })
    .into_response()
}
