//! Single-building solar assessment.
//!
//! This route never fails: coordinates without a mapped building (most of
//! the map outside city centers) degrade to a zeroed "Data Pending"
//! assessment, with the source string recording why.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use urbanpulse_engine::solar_savings_rm;

use super::{AppState, QueryBody};

#[derive(Debug, Serialize)]
pub struct SolarAssessment {
    /// Whole-roof area in m², rounded.
    area: f64,
    /// Estimated yearly savings in RM.
    savings: f64,
    potential: &'static str,
    source: &'static str,
}

const PENDING: SolarAssessment = SolarAssessment {
    area: 0.0,
    savings: 0.0,
    potential: "Data Pending",
    source: "Google Solar API (No Potential)",
};

pub async fn solar_point(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Json<SolarAssessment> {
    match state.solar.find_closest_building(body.lat, body.lng).await {
        Ok(Some(building)) => {
            let area = building.roof_area_m2.round();
            Json(SolarAssessment {
                area,
                savings: solar_savings_rm(area),
                potential: "Excellent",
                source: "Google Solar API",
            })
        }
        Ok(None) => Json(PENDING),
        Err(e) => {
            tracing::warn!(lat = body.lat, lng = body.lng, error = %e, "solar lookup failed");
            Json(SolarAssessment {
                source: "Google Solar API (Unavailable)",
                ..PENDING
            })
        }
    }
}
