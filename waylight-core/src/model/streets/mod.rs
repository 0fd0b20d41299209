//! Pedestrian street network model

pub mod components;
pub mod network;

pub use components::{EdgeId, NodeId, RouteMode, StreetEdge, StreetNode};
pub use network::{IndexedPoint, StreetGraph};
