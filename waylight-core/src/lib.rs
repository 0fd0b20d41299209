//! Safety-weighted pedestrian routing engine.
//!
//! Holds an in-memory street graph whose edges carry precomputed
//! crime-risk scores, a uniform grid index for viewport queries and
//! endpoint snapping, and a Dijkstra search that trades distance
//! against risk exposure. Everything outside the engine (tiles,
//! geocoding, the directions provider that resolves final street
//! geometry) talks to it through [`loading::GraphStore`] and
//! [`routing::find_route`].

pub mod algo;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;

/// Grid cell size in degrees, roughly 200 m at the target latitude.
/// Shared by the segment index and the walkable-area keys; the two must
/// never quantize differently.
pub const GRID_SIZE: f64 = 0.002;

/// Coordinate quantization step for node identity, in degrees (~1.1 m).
/// Segment endpoints closer than this collapse into one shared node.
pub const COORD_QUANTIZATION: f64 = 1e-5;

/// Hard cap on waypoints handed to the external directions provider.
pub const MAX_WAYPOINTS: usize = 25;

/// Default snapping radius around a request endpoint, in meters.
pub const DEFAULT_SNAP_RADIUS_M: f64 = 100.0;

/// Risk multiplier in the blended edge weight:
/// `weight = length_m * (1 + SAFETY_WEIGHT * normalized_risk)`.
/// An edge with the worst observed risk costs five times its length.
pub const SAFETY_WEIGHT: f64 = 4.0;
