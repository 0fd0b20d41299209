//! HTTP surface for the waylight routing engine.

pub mod config;
pub mod directions;
pub mod handlers;
pub mod state;
pub mod tile_cache;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/route", get(handlers::route))
        .route("/segments", get(handlers::segments))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
