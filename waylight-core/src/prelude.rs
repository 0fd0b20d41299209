pub use crate::{
    COORD_QUANTIZATION, DEFAULT_SNAP_RADIUS_M, GRID_SIZE, MAX_WAYPOINTS, SAFETY_WEIGHT,
};

// Re-export key components
pub use crate::Error;
pub use crate::algo::{GridStats, SegmentGridIndex, segment_features};
pub use crate::loading::{GraphStore, RoutingData, load_street_graph, load_walkable_area};
pub use crate::model::{
    EdgeId, GridKey, NodeId, RouteMode, StreetEdge, StreetGraph, StreetNode, WalkableArea,
};
pub use crate::routing::{RouteRequest, RouteResult, find_route};
