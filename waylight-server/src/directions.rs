//! Client for the external street-following directions provider.
//!
//! The routing engine emits straight-line waypoints; the provider
//! resolves them into geometry that follows actual street curves. The
//! provider is fussy about request size and availability, so failures
//! are retried with progressively fewer waypoints (full, 12, endpoints
//! only) before a service error is surfaced. The engine never depends
//! on this client - it sits strictly on the caller side.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::DirectionsConfig;
use crate::handlers::Waypoint;

pub struct DirectionsClient {
    http: reqwest::Client,
    url: String,
}

impl DirectionsClient {
    pub fn new(config: &DirectionsConfig) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("Failed to build directions client: {e}"))?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    /// Resolve street-following geometry for the waypoint sequence,
    /// relaxing the request on each failure.
    pub async fn resolve(&self, waypoints: &[Waypoint]) -> Result<Vec<Waypoint>, String> {
        for count in relaxation_ladder(waypoints.len()) {
            let attempt = subsample(waypoints, count);
            match self.request(&attempt).await {
                Ok(geometry) => return Ok(geometry),
                Err(e) => warn!("Directions request with {count} waypoints failed: {e}"),
            }
        }
        Err("Directions provider unavailable after relaxed retries".to_string())
    }

    async fn request(&self, waypoints: &[Waypoint]) -> Result<Vec<Waypoint>, String> {
        #[derive(Serialize)]
        struct DirectionsRequest<'a> {
            waypoints: &'a [Waypoint],
        }

        #[derive(Deserialize)]
        struct DirectionsResponse {
            geometry: Vec<Waypoint>,
        }

        let response = self
            .http
            .post(&self.url)
            .json(&DirectionsRequest { waypoints })
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let body: DirectionsResponse = response.json().await.map_err(|e| e.to_string())?;
        if body.geometry.len() < 2 {
            return Err("Provider returned no geometry".to_string());
        }
        Ok(body.geometry)
    }
}

/// Waypoint counts to try, most detailed first. Endpoints-only is the
/// last rung.
fn relaxation_ladder(n: usize) -> Vec<usize> {
    let mut rungs: Vec<usize> = [n, 12, 2]
        .into_iter()
        .filter(|&count| count >= 2 && count <= n)
        .collect();
    rungs.dedup();
    rungs
}

/// Uniform stride subsample keeping the first and last waypoints.
fn subsample(waypoints: &[Waypoint], max: usize) -> Vec<Waypoint> {
    let n = waypoints.len();
    if n <= max {
        return waypoints.to_vec();
    }
    let step = (n - 1) as f64 / (max - 1) as f64;
    (0..max)
        .map(|i| waypoints[((i as f64) * step).round() as usize])
        .collect()
}
