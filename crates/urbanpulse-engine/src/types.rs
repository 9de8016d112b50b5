//! Domain types shared across the sampling pipeline.

use serde::{Deserialize, Serialize};

/// A single (lat, lng) sample location in a generated probe grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbePoint {
    pub lat: f64,
    pub lng: f64,
}

/// One of the three visualization modes, each with its own fetch and weight
/// logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Thermal,
    Flood,
    Solar,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Thermal => write!(f, "thermal"),
            Layer::Flood => write!(f, "flood"),
            Layer::Solar => write!(f, "solar"),
        }
    }
}

/// Union of whatever the upstream services returned for one probe point.
///
/// Fields are optional because different layers populate different subsets;
/// a sample with no elevation never reaches the weight calculator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSample {
    pub lat: f64,
    pub lng: f64,
    pub elevation: Option<f64>,
    pub temperature: Option<f64>,
    pub rain_chance: Option<f64>,
    pub windspeed: Option<f64>,
    pub aqi: Option<i64>,
}

/// The unit consumed by the heatmap render layer. `weight` is always finite
/// and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

/// A building matched by the solar deep scan, deduplicated by upstream id.
/// `weight` carries the maximum installable panel count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
    pub area: f64,
}

/// Center-point ambient conditions, assumed uniform over the probe radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientConditions {
    pub temperature: f64,
    pub windspeed: f64,
    pub aqi: i64,
    pub weather_code: i64,
}
