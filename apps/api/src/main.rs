mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod roadmap;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::jobs::runner::{JobRunner, RetryPolicy};
use crate::llm_client::GeminiClient;
use crate::roadmap::pipeline::RoadmapPipeline;
use crate::roadmap::sanitizer::ValidationMode;
use crate::roadmap::store::PgRoadmapStore;
use crate::routes::build_router;
use crate::state::AppState;

/// How long in-flight jobs get to finish after the server stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Roadmap API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgRoadmapStore::new(db));

    // Initialize generation provider
    let provider = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    )?);
    info!("Generation provider initialized (model: {})", provider.model());

    let validation = ValidationMode::from_strict_flag(config.strict_validation);
    if validation == ValidationMode::Strict {
        warn!("Strict roadmap validation enabled: non-conforming provider output will fail jobs");
    }

    // Pipeline and job runner
    let pipeline = Arc::new(RoadmapPipeline::new(provider, store.clone(), validation));
    let (jobs, runner_handle) = JobRunner::spawn(
        pipeline,
        RetryPolicy {
            retries: config.job_retries,
            base_backoff: config.job_backoff,
        },
        config.job_retention,
    );

    let state = AppState { store, jobs };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it every JobQueue handle) is gone; let the runner drain.
    info!("Server stopped, waiting for in-flight roadmap jobs");
    if tokio::time::timeout(SHUTDOWN_GRACE, runner_handle)
        .await
        .is_err()
    {
        warn!("Job runner did not drain within {}s", SHUTDOWN_GRACE.as_secs());
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
