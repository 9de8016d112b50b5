//! Risk/intensity weight formulas.
//!
//! Converts raw physical readings into the scalar weights consumed by the
//! heatmap render layer. Weights are always finite and non-negative; the
//! thermal weight additionally floors at 0.1 because the renderer's
//! log-style color ramp breaks on zero.

use crate::types::AmbientConditions;

/// Elevation above which heat pooling stops contributing (urban KL baseline).
pub const THERMAL_REFERENCE_ELEVATION_M: f64 = 35.0;

/// Elevation at or above which flood depth is zero.
pub const FLOOD_REFERENCE_HEIGHT_M: f64 = 45.0;

const THERMAL_FLOOR: f64 = 0.1;
const AQI_PENALTY_THRESHOLD: i64 = 100;
const AQI_PENALTY: f64 = 1.2;
const WIND_COOLING_PER_UNIT: f64 = 0.1;
const TEMP_NORMALIZATION_C: f64 = 30.0;
const RAIN_MULTIPLIER_WET: f64 = 2.0;
const RAIN_MULTIPLIER_DRY: f64 = 0.5;

const RAIN_CHANCE_WET: f64 = 0.8;
const RAIN_CHANCE_DRY: f64 = 0.2;

const SUN_HOURS_PER_DAY: f64 = 4.0;
const PANEL_EFFICIENCY: f64 = 0.15;
const DAYS_PER_YEAR: f64 = 365.0;
const TARIFF_RM_PER_KWH: f64 = 0.5;

/// Weather condition codes classified as precipitation: drizzle, rain,
/// showers, and thunderstorms.
pub const RAINING_WEATHER_CODES: &[i64] = &[51, 53, 55, 61, 63, 65, 80, 81, 82, 95, 96, 99];

#[must_use]
pub fn is_raining(weather_code: i64) -> bool {
    RAINING_WEATHER_CODES.contains(&weather_code)
}

/// Thermal heat-pooling weight for a probe point.
///
/// Lower elevation (basin) raises the weight; hotter ambient temperature and
/// poor air quality scale it up; wind scales it down. Never below 0.1.
#[must_use]
pub fn thermal_weight(elevation: f64, ambient: &AmbientConditions) -> f64 {
    let base = (THERMAL_REFERENCE_ELEVATION_M - elevation + 5.0).max(THERMAL_FLOOR);
    let temp_factor = ambient.temperature / TEMP_NORMALIZATION_C;
    let aqi_penalty = if ambient.aqi > AQI_PENALTY_THRESHOLD {
        AQI_PENALTY
    } else {
        1.0
    };
    let wind_cooling = ambient.windspeed * WIND_COOLING_PER_UNIT;

    clamp_weight(base * temp_factor * aqi_penalty - wind_cooling, THERMAL_FLOOR)
}

/// Flood-risk weight for a probe point.
///
/// Quadratic depth below the reference height exaggerates basin severity;
/// the binary rain classification doubles or halves the baseline. Zero at or
/// above the reference height.
#[must_use]
pub fn flood_weight(elevation: f64, raining: bool) -> f64 {
    let depth = (FLOOD_REFERENCE_HEIGHT_M - elevation).max(0.0);
    let multiplier = if raining {
        RAIN_MULTIPLIER_WET
    } else {
        RAIN_MULTIPLIER_DRY
    };
    clamp_weight(depth * depth * multiplier, 0.0)
}

/// Flood classification for a single queried coordinate, derived from KL
/// topography: most of the city sits between 20 m and 100 m, and urban zones
/// below ~35 m pool water first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodRisk {
    pub level: &'static str,
    pub est_depth: &'static str,
}

#[must_use]
pub fn flood_risk(elevation: f64) -> FloodRisk {
    if elevation < 30.0 {
        FloodRisk {
            level: "Critical",
            est_depth: "0.8m - 1.5m",
        }
    } else if elevation < FLOOD_REFERENCE_HEIGHT_M {
        FloodRisk {
            level: "Moderate",
            est_depth: "0.2m - 0.5m",
        }
    } else {
        FloodRisk {
            level: "Low",
            est_depth: "0.0m",
        }
    }
}

/// Coarse precipitation probability derived from the binary rain
/// classification; there is no upstream probability feed.
#[must_use]
pub fn rain_chance(weather_code: i64) -> f64 {
    if is_raining(weather_code) {
        RAIN_CHANCE_WET
    } else {
        RAIN_CHANCE_DRY
    }
}

/// Estimated yearly solar savings in RM for a roof area: 4 sun-hours/day at
/// 15% panel efficiency, year-round, at RM 0.50 per kWh. Rounded to whole RM.
#[must_use]
pub fn solar_savings_rm(roof_area_m2: f64) -> f64 {
    (roof_area_m2 * SUN_HOURS_PER_DAY * PANEL_EFFICIENCY * DAYS_PER_YEAR * TARIFF_RM_PER_KWH)
        .round()
}

fn clamp_weight(value: f64, floor: f64) -> f64 {
    if value.is_finite() {
        value.max(floor)
    } else {
        floor
    }
}
