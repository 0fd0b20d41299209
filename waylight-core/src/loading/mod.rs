//! This module is responsible for loading the persisted street-graph
//! and walkable-area assets and building the in-memory routing data.

mod asset;
mod segments;
mod store;

pub use asset::{load_street_graph, load_walkable_area};
pub use store::{GraphStore, RoutingData};

use geo::LineString;

use crate::model::{EdgeId, NodeId, StreetEdge};

/// Edge parsed from an asset, before risk normalization.
pub(crate) struct PendingEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub length_m: f64,
    pub safety_score: f64,
    pub name: Option<String>,
    pub geometry: LineString<f64>,
}

/// Min-max normalize raw risk scores over the full edge set and
/// precompute the blended traversal weight. When every segment carries
/// the same raw score the normalized risk is 0.0 throughout and safest
/// mode degenerates to shortest.
pub(crate) fn finalize_edges(pending: Vec<PendingEdge>) -> Vec<(NodeId, NodeId, StreetEdge)> {
    let (min, max) = pending
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), e| {
            (min.min(e.safety_score), max.max(e.safety_score))
        });
    let span = max - min;

    pending
        .into_iter()
        .map(|e| {
            let normalized = if span > 0.0 {
                (e.safety_score - min) / span
            } else {
                0.0
            };
            let edge = StreetEdge {
                id: e.id,
                length_m: e.length_m,
                safety_score: e.safety_score,
                normalized_safety: normalized,
                weight: StreetEdge::blended_weight(e.length_m, normalized),
                name: e.name,
                geometry: e.geometry,
            };
            (e.source, e.target, edge)
        })
        .collect()
}
