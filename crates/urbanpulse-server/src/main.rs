mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use urbanpulse_upstream::{
    AirQualityClient, ElevationClient, GenerativeClient, GridSampler, ImageryClient, SolarClient,
    WeatherClient,
};

use crate::api::{build_app, default_rate_limit_state, AppState, CoverageState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(urbanpulse_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let timeout = config.upstream_timeout_secs;
    let elevation = ElevationClient::new(&config.maps_api_key, timeout)?;
    let weather = WeatherClient::new(timeout)?;
    let air_quality = AirQualityClient::new(&config.maps_api_key, timeout)?;
    let solar = SolarClient::new(&config.maps_api_key, timeout)?;
    let imagery = ImageryClient::new(&config.maps_api_key, timeout)?;
    let generative = match config.gemini_api_key.as_deref() {
        Some(key) => Some(GenerativeClient::new(key, timeout)?),
        None => {
            tracing::warn!("GEMINI_API_KEY not set; analyze and report routes will return 500");
            None
        }
    };

    let sampler = Arc::new(GridSampler::new(
        elevation.clone(),
        weather.clone(),
        air_quality.clone(),
        solar.clone(),
        config.solar_max_concurrent_probes,
    ));
    let coverage = Arc::new(CoverageState::on_disk(&config.cache_dir));

    let state = AppState {
        config: Arc::clone(&config),
        sampler,
        elevation,
        weather,
        air_quality,
        solar,
        imagery,
        generative,
        coverage,
    };
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "urbanpulse server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
