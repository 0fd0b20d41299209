//! Data model for safety-weighted pedestrian routing
//!
//! Contains the street graph, the uniform grid keys and the
//! walkable-area set.

pub mod grid;
pub mod streets;

pub use grid::{GridKey, WalkableArea};
pub use streets::{EdgeId, NodeId, RouteMode, StreetEdge, StreetGraph, StreetNode};
