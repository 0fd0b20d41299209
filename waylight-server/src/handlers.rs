//! HTTP handlers and the core-error to status-code mapping.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use waylight_core::algo::segment_features;
use waylight_core::model::{GridKey, RouteMode};
use waylight_core::routing::{RouteRequest, find_route};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct RouteParams {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    #[serde(default)]
    pub mode: RouteMode,
    /// Force a store reload before searching
    #[serde(default)]
    pub reload: bool,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub waypoints: Vec<Waypoint>,
    pub safety_score: f64,
    pub distance_meters: f64,
}

pub enum ApiError {
    Core(waylight_core::Error),
    Upstream(String),
    ReloadFailed(String),
}

impl From<waylight_core::Error> for ApiError {
    fn from(e: waylight_core::Error) -> Self {
        Self::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use waylight_core::Error;

        let (status, message) = match self {
            Self::Core(e) => {
                let status = match &e {
                    Error::InvalidCoordinates(_) | Error::NonWalkableEndpoint { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    Error::NoStreetNearby | Error::NoSafeRouteFound => StatusCode::NOT_FOUND,
                    Error::GraphLoad(_) | Error::Io(_) | Error::InvalidData(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
            Self::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
            Self::ReloadFailed(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub async fn route(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RouteParams>,
) -> Result<Json<RouteResponse>, ApiError> {
    if params.reload {
        info!("Forced graph reload requested");
        state.store.reload().map_err(|e| {
            error!("Reload failed, previous graph stays active: {e}");
            ApiError::ReloadFailed(format!("Graph reload failed: {e}"))
        })?;
    }

    let request = RouteRequest::new(
        params.start_lat,
        params.start_lon,
        params.end_lat,
        params.end_lon,
    )
    .with_mode(params.mode)
    .with_snap_radius(state.snap_radius_m);

    let data = state.store.snapshot();
    let result = find_route(&data, &request)?;

    let mut waypoints: Vec<Waypoint> = result
        .waypoints
        .iter()
        .map(|p| Waypoint {
            latitude: p.y(),
            longitude: p.x(),
        })
        .collect();

    if let Some(directions) = &state.directions {
        waypoints = directions
            .resolve(&waypoints)
            .await
            .map_err(ApiError::Upstream)?;
    }

    Ok(Json(RouteResponse {
        waypoints,
        safety_score: result.safety_score,
        distance_meters: result.distance_meters,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SegmentParams {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// Segments whose centroid cell overlaps the viewport, as GeoJSON.
/// Responses are cached per grid-aligned viewport in insertion order.
pub async fn segments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SegmentParams>,
) -> Result<Response, ApiError> {
    let bounds = Rect::new(
        Coord {
            x: params.min_lon,
            y: params.min_lat,
        },
        Coord {
            x: params.max_lon,
            y: params.max_lat,
        },
    );

    // Two viewports covering the same cell range serve the same tile.
    let min_key = GridKey::for_point(params.min_lat, params.min_lon);
    let max_key = GridKey::for_point(params.max_lat, params.max_lon);
    let tile_key = format!("{min_key}:{max_key}");

    if let Some(cached) = state.tile_cache().get(&tile_key) {
        return Ok(json_body(cached.clone()));
    }

    let data = state.store.snapshot();
    let collection = segment_features(&data.graph, &data.index, &bounds);
    let body = serde_json::to_string(&collection).unwrap_or_default();
    state.tile_cache().insert(tile_key, body.clone());

    Ok(json_body(body))
}

fn json_body(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let data = state.store.snapshot();
    let grid = data.index.stats();

    Json(json!({
        "graph": {
            "nodes": data.graph.node_count(),
            "edges": data.graph.edge_count(),
        },
        "walkable_cells": data.walkable.len(),
        "grid_index": grid,
        "tile_cache_entries": state.tile_cache().len(),
    }))
}

pub async fn health() -> &'static str {
    "OK"
}
