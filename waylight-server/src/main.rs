use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::BoxError;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use clap::Parser;
use tower::ServiceBuilder;
use tower::limit::ConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use waylight_core::loading::GraphStore;

use waylight_server::config::Config;
use waylight_server::state::AppState;

#[derive(Parser)]
#[command(about = "Safety-weighted pedestrian routing server")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "waylight.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run(Args::parse()).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), String> {
    let config = Config::load(&args.config)?;

    info!(
        "Loading routing data: graph {}, walkable area {}",
        config.graph_asset.display(),
        config.walkable_asset.display()
    );
    // A failed load aborts startup; serving a partial graph is worse
    // than not serving.
    let store = GraphStore::open(&config.graph_asset, &config.walkable_asset)
        .map_err(|e| e.to_string())?;

    let state = Arc::new(AppState::new(&config, store)?);
    let app = waylight_server::app(state).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            ))),
    );

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .map_err(|e| format!("Failed to bind {}: {e}", config.listen))?;
    info!("Listening on http://{}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| e.to_string())
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal error: {err}"),
        )
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install shutdown handler: {e}");
        return;
    }
    info!("Shutting down");
}
