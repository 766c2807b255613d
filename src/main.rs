//! Ghost Job Radar: binary entrypoint.
//! Boots the Axum HTTP server over the listing aggregator, truth score and ticker cache.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ghost_job_radar::ingest::browser::ChromiumSessionFactory;
use ghost_job_radar::ingest::config::load_config_default;
use ghost_job_radar::telemetry::Metrics;
use ghost_job_radar::{build_state, create_router};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - GHOST_RADAR_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("GHOST_RADAR_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scrape=info,aggregate=info,ticker=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = load_config_default()?;
    let metrics = Metrics::init(cfg.ticker_ttl_secs)?;

    let sessions = Arc::new(ChromiumSessionFactory::new(cfg.clone()));
    let state = build_state(&cfg, sessions)?;
    tracing::info!(
        headless = cfg.headless,
        ttl_secs = cfg.ticker_ttl_secs,
        "ghost job radar ready"
    );

    let router = create_router(state).merge(metrics.router());
    Ok(router.into())
}
