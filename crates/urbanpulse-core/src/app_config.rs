use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Key for the Maps platform services (elevation, solar, air quality,
    /// street view imagery). Required at startup.
    pub maps_api_key: String,
    /// Key for the generative-AI service. Optional; the analyze and report
    /// routes return HTTP 500 when it is absent.
    pub gemini_api_key: Option<String>,
    pub upstream_timeout_secs: u64,
    /// Probe lattice is `grid_divisions × grid_divisions` points per query.
    pub grid_divisions: u32,
    pub thermal_spread_degrees: f64,
    pub thermal_jitter_fraction: f64,
    pub flood_spread_degrees: f64,
    pub flood_jitter_fraction: f64,
    /// Solar deep-scan spread. Much wider than thermal/flood because mapped
    /// building coverage is sparse outside city centers.
    pub solar_spread_degrees: f64,
    pub solar_max_concurrent_probes: usize,
    /// Directory holding the per-layer coverage cache files.
    pub cache_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("maps_api_key", &"[redacted]")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("grid_divisions", &self.grid_divisions)
            .field("thermal_spread_degrees", &self.thermal_spread_degrees)
            .field("thermal_jitter_fraction", &self.thermal_jitter_fraction)
            .field("flood_spread_degrees", &self.flood_spread_degrees)
            .field("flood_jitter_fraction", &self.flood_jitter_fraction)
            .field("solar_spread_degrees", &self.solar_spread_degrees)
            .field(
                "solar_max_concurrent_probes",
                &self.solar_max_concurrent_probes,
            )
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}
