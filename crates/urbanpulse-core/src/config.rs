use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be a non-negative finite number, got {raw}"),
            });
        }
        Ok(value)
    };

    let maps_api_key = require("MAPS_API_KEY")?;
    let gemini_api_key = lookup("GEMINI_API_KEY").ok();

    let env = parse_environment(&or_default("URBANPULSE_ENV", "development"));

    let bind_addr = parse_addr("URBANPULSE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("URBANPULSE_LOG_LEVEL", "info");

    let upstream_timeout_secs = parse_u64("URBANPULSE_UPSTREAM_TIMEOUT_SECS", "30")?;

    let grid_divisions = parse_u32("URBANPULSE_GRID_DIVISIONS", "10")?;
    let thermal_spread_degrees = parse_f64("URBANPULSE_THERMAL_SPREAD_DEG", "0.015")?;
    let thermal_jitter_fraction = parse_f64("URBANPULSE_THERMAL_JITTER", "0.8")?;
    let flood_spread_degrees = parse_f64("URBANPULSE_FLOOD_SPREAD_DEG", "0.015")?;
    let flood_jitter_fraction = parse_f64("URBANPULSE_FLOOD_JITTER", "0.4")?;
    let solar_spread_degrees = parse_f64("URBANPULSE_SOLAR_SPREAD_DEG", "3.0")?;
    let solar_max_concurrent_probes = parse_usize("URBANPULSE_SOLAR_MAX_CONCURRENT", "8")?;

    let cache_dir = PathBuf::from(or_default("URBANPULSE_CACHE_DIR", "./data"));

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        maps_api_key,
        gemini_api_key,
        upstream_timeout_secs,
        grid_divisions,
        thermal_spread_degrees,
        thermal_jitter_fraction,
        flood_spread_degrees,
        flood_jitter_fraction,
        solar_spread_degrees,
        solar_max_concurrent_probes,
        cache_dir,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
