mod analytics;
mod api;
mod combinations;
mod config;
mod db;
mod error;
mod state;
mod types;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, QueryBackend};
use crate::db::backend::verify_backends;
use crate::db::{snapshot, SqlEngine};
use crate::error::Result;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Snapshot ---
    let dataset = snapshot::load(&cfg.data_path).await?;
    if dataset.is_empty() {
        warn!(path = %cfg.data_path, "Snapshot has no picks; every query will return empty results");
    }

    // --- SQL mirror ---
    let sql = if cfg.needs_sql_backend() {
        let engine = SqlEngine::mirror(&dataset).await?;
        if cfg.verify_backends_on_startup {
            verify_backends(&dataset, &engine).await?;
        }
        Some(engine)
    } else {
        None
    };
    info!(
        backend = %cfg.query_backend,
        sql_mirror = sql.is_some(),
        verified = cfg.verify_backends_on_startup,
        "Query engines ready"
    );
    if cfg.query_backend != QueryBackend::Memory && !cfg.verify_backends_on_startup {
        warn!("Serving from the SQL mirror without a startup cross-check");
    }

    // --- HTTP API server ---
    let api_state = ApiState {
        dataset: Arc::clone(&dataset),
        sql,
        backend: cfg.query_backend,
        latency: Arc::new(LatencyStats::new()?),
        health: Arc::new(HealthState::new()),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
