//! AI advisory routes: street-level design analysis and the full urban
//! intelligence report.
//!
//! Both routes require the generative client; without a configured API key
//! they answer 500. Model output is treated as hostile input: the JSON is
//! regex-extracted from whatever prose wraps it, alternate key spellings are
//! tolerated, and missing fields fall back to explicit placeholders.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use urbanpulse_upstream::{extract_json_object, GenerativeClient, Part};

use super::{AppState, QueryBody};

const REPORT_FAILURE_MESSAGE: &str = "Failed to synthesize AI report. Please try again.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StreetAnalysis {
    walkability_score: f64,
    shade_score: f64,
    summary: String,
    recommendation: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// First present numeric value among alternate key spellings.
fn number_field(value: &serde_json::Value, keys: &[&str], default: f64) -> f64 {
    keys.iter()
        .find_map(|k| value.get(k).and_then(serde_json::Value::as_f64))
        .unwrap_or(default)
}

fn string_field(value: &serde_json::Value, keys: &[&str], default: &str) -> String {
    keys.iter()
        .find_map(|k| value.get(k).and_then(serde_json::Value::as_str))
        .map_or_else(|| default.to_owned(), str::to_owned)
}

pub async fn analyze(State(state): State<AppState>, Json(body): Json<QueryBody>) -> Response {
    let Some(generative) = state.generative.as_ref() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AI analysis is not configured",
        );
    };

    let Some((pano_lat, pano_lng)) = state.imagery.find_street_view(body.lat, body.lng).await
    else {
        return error_response(StatusCode::NOT_FOUND, "No Street View imagery found");
    };

    let Some(image) = state.imagery.street_view_jpeg_base64(pano_lat, pano_lng).await else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch Street View image",
        );
    };

    let location = body
        .location_name
        .clone()
        .unwrap_or_else(|| format!("{}, {}", body.lat, body.lng));
    let prompt = format!(
        "Analyze this Street View image of {location}. Act as an Urban Designer. \
         Return ONLY a raw JSON object with these EXACT keys: \
         walkabilityScore (number 1-100), shadeScore (number 1-100), \
         summary (string, max 2 sentences), recommendation (string, 1 specific actionable fix)."
    );

    let parts = [Part::Text(prompt), Part::InlineJpeg(image)];
    let text = match generative.generate(&parts, false).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "street analysis generation failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "AI analysis failed");
        }
    };

    let parsed: serde_json::Value = match extract_json_object(&text)
        .and_then(|obj| serde_json::from_str(obj).ok())
    {
        Some(parsed) => parsed,
        None => {
            tracing::error!(raw = %text, "model answered without a parseable JSON object");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid AI response");
        }
    };

    Json(StreetAnalysis {
        walkability_score: number_field(&parsed, &["walkabilityScore", "walkability_score"], 20.0),
        shade_score: number_field(&parsed, &["shadeScore", "shade_score"], 20.0),
        summary: string_field(&parsed, &["summary", "analysis"], "No summary provided by AI."),
        recommendation: string_field(
            &parsed,
            &["recommendation", "suggested_fix"],
            "No recommendation provided.",
        ),
    })
    .into_response()
}

/// Baseline metrics the dashboard already fetched; the model grounds the
/// report in these instead of guessing.
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(rename = "locationName", default)]
    pub location_name: Option<String>,
    #[serde(rename = "walkabilityScore", default)]
    pub walkability_score: Option<f64>,
    #[serde(rename = "shadeScore", default)]
    pub shade_score: Option<f64>,
    #[serde(default)]
    pub aqi: Option<i64>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(rename = "solarPotential", default)]
    pub solar_potential: Option<String>,
    #[serde(rename = "floodRiskLevel", default)]
    pub flood_risk_level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UrbanReport {
    title: String,
    executive_summary: String,
    #[serde(default)]
    location_name: String,
    key_metrics: Vec<ReportMetric>,
    recommendations: Vec<String>,
    environmental_insights: String,
    #[serde(default)]
    generated_at: Option<String>,
    #[serde(default)]
    images: Option<ReportImages>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReportMetric {
    label: String,
    /// Numeric or string, as the model produced it.
    value: serde_json::Value,
    unit: String,
    status: String,
    description: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReportImages {
    #[serde(skip_serializing_if = "Option::is_none")]
    satellite: Option<String>,
    #[serde(rename = "streetView", skip_serializing_if = "Option::is_none")]
    street_view: Option<String>,
}

fn report_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

fn report_prompt(name: &str, lat: f64, lng: f64, req: &ReportRequest) -> String {
    let fmt_f64 = |v: Option<f64>| v.map_or_else(|| "unknown".to_owned(), |v| v.to_string());
    let fmt_i64 = |v: Option<i64>| v.map_or_else(|| "unknown".to_owned(), |v| v.to_string());
    fn fmt_str(v: Option<&String>) -> &str {
        v.map_or("unknown", String::as_str)
    }

    format!(
        "Act as a senior urban planning consultant preparing a briefing for \
         city officials. Produce an urban intelligence report for {name} \
         (coordinates {lat}, {lng}) in Kuala Lumpur, using the attached \
         satellite and street-level imagery plus these measured baselines: \
         walkability score {walkability}/100, shade score {shade}/100, \
         AQI {aqi}, temperature {temp} C, solar potential {solar}, \
         flood risk level {flood}.\n\
         Return ONLY a JSON object with this exact shape:\n\
         {{\n\
           \"title\": string,\n\
           \"executive_summary\": string (3-4 sentences),\n\
           \"location_name\": string,\n\
           \"key_metrics\": [ {{ \"label\": string, \"value\": number or string, \
         \"unit\": string, \"status\": \"Good\" | \"Moderate\" | \"Poor\", \
         \"description\": string }} ] (4-6 entries),\n\
           \"recommendations\": [ string ] (exactly 4 specific interventions),\n\
           \"environmental_insights\": string\n\
         }}\n\
         Scores above 70 are Good, 40-70 Moderate, below 40 Poor. Stay \
         consistent with the measured baselines; do not invent contradicting \
         numbers.",
        walkability = fmt_f64(req.walkability_score),
        shade = fmt_f64(req.shade_score),
        aqi = fmt_i64(req.aqi),
        temp = fmt_f64(req.temp),
        solar = fmt_str(req.solar_potential.as_ref()),
        flood = fmt_str(req.flood_risk_level.as_ref()),
    )
}

pub async fn generate_report(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Response {
    let (Some(name), Some(lat), Some(lng)) = (
        req.location_name.as_deref().filter(|n| !n.is_empty()),
        req.lat,
        req.lng,
    ) else {
        return report_error(
            StatusCode::BAD_REQUEST,
            "Location name and coordinates are required",
        );
    };

    let Some(generative) = state.generative.as_ref() else {
        return report_error(StatusCode::INTERNAL_SERVER_ERROR, REPORT_FAILURE_MESSAGE);
    };

    let (satellite, street_view) = tokio::join!(
        state.imagery.satellite_jpeg_base64(lat, lng),
        state.imagery.street_view_jpeg_base64(lat, lng),
    );

    let mut parts = vec![Part::Text(report_prompt(name, lat, lng, &req))];
    if let Some(data) = &satellite {
        parts.push(Part::InlineJpeg(data.clone()));
    }
    if let Some(data) = &street_view {
        parts.push(Part::InlineJpeg(data.clone()));
    }

    match synthesize_report(generative, &parts).await {
        Ok(mut report) => {
            report.location_name = name.to_owned();
            report.generated_at = Some(chrono::Utc::now().to_rfc3339());
            report.images = Some(ReportImages {
                satellite: satellite.map(|d| format!("data:image/jpeg;base64,{d}")),
                street_view: street_view.map(|d| format!("data:image/jpeg;base64,{d}")),
            });
            Json(json!({ "success": true, "data": report })).into_response()
        }
        Err(e) => {
            tracing::error!(location = name, error = %e, "report synthesis failed");
            report_error(StatusCode::INTERNAL_SERVER_ERROR, REPORT_FAILURE_MESSAGE)
        }
    }
}

async fn synthesize_report(
    generative: &GenerativeClient,
    parts: &[Part],
) -> anyhow::Result<UrbanReport> {
    let text = generative.generate(parts, true).await?;
    let object = extract_json_object(&text)
        .ok_or_else(|| anyhow::anyhow!("model answered without a JSON object"))?;
    Ok(serde_json::from_str(object)?)
}
