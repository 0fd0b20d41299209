//! Persisted asset parsing: the structural graph dump and the
//! walkable-cell list.
//!
//! The graph dump carries node and edge arrays only; adjacency is
//! always rebuilt from the edges here, never persisted, so the two
//! cannot drift apart.

use std::fs;
use std::path::Path;

use geo::{Coord, LineString, Point};
use hashbrown::HashMap;
use log::info;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{PendingEdge, finalize_edges, segments};
use crate::Error;
use crate::model::{EdgeId, GridKey, NodeId, StreetGraph, StreetNode, WalkableArea};

#[derive(Debug, Deserialize)]
pub(crate) struct GraphDump {
    nodes: Vec<(NodeId, NodeRecord)>,
    edges: Vec<(EdgeId, EdgeRecord)>,
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeRecord {
    source_id: NodeId,
    target_id: NodeId,
    properties: EdgeProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeProperties {
    length_meters: f64,
    safety_score: f64,
    #[serde(default)]
    street_name: Option<String>,
    /// `[lon, lat]` pairs; absent for straight segments
    #[serde(default)]
    geometry: Option<Vec<[f64; 2]>>,
}

/// Load the street graph from `path`.
///
/// Accepts either the structural dump or a GeoJSON `FeatureCollection`
/// of scored segment centerlines (the ETL's native output); the format
/// is sniffed from the JSON.
///
/// # Errors
///
/// `Error::GraphLoad` when the asset is missing, malformed, or an edge
/// references a node that does not exist.
pub fn load_street_graph(path: &Path) -> Result<StreetGraph, Error> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::GraphLoad(format!("{}: {e}", path.display())))?;
    let value: JsonValue = serde_json::from_str(&raw)
        .map_err(|e| Error::GraphLoad(format!("{}: {e}", path.display())))?;

    if value.get("type").and_then(JsonValue::as_str) == Some("FeatureCollection") {
        return segments::street_graph_from_geojson(value);
    }

    let dump: GraphDump =
        serde_json::from_value(value).map_err(|e| Error::GraphLoad(e.to_string()))?;
    street_graph_from_dump(dump)
}

fn street_graph_from_dump(dump: GraphDump) -> Result<StreetGraph, Error> {
    let mut positions: HashMap<NodeId, Point<f64>> = HashMap::with_capacity(dump.nodes.len());
    let nodes: Vec<StreetNode> = dump
        .nodes
        .into_iter()
        .map(|(id, record)| {
            let geometry = Point::new(record.lon, record.lat);
            positions.insert(id, geometry);
            StreetNode { id, geometry }
        })
        .collect();

    let pending = dump
        .edges
        .into_iter()
        .map(|(id, record)| {
            let geometry = match record.properties.geometry {
                Some(coords) => LineString::from(
                    coords
                        .iter()
                        .map(|[lon, lat]| Coord { x: *lon, y: *lat })
                        .collect::<Vec<_>>(),
                ),
                // Straight segment between the endpoint nodes.
                None => {
                    let source = positions.get(&record.source_id).ok_or_else(|| {
                        Error::GraphLoad(format!(
                            "Edge {id:?} references missing source node {:?}",
                            record.source_id
                        ))
                    })?;
                    let target = positions.get(&record.target_id).ok_or_else(|| {
                        Error::GraphLoad(format!(
                            "Edge {id:?} references missing target node {:?}",
                            record.target_id
                        ))
                    })?;
                    LineString::from(vec![source.0, target.0])
                }
            };

            Ok(PendingEdge {
                id,
                source: record.source_id,
                target: record.target_id,
                length_m: record.properties.length_meters,
                safety_score: record.properties.safety_score,
                name: record.properties.street_name,
                geometry,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    info!(
        "Loaded graph dump: {} nodes, {} edges",
        nodes.len(),
        pending.len()
    );

    StreetGraph::from_parts(nodes, finalize_edges(pending))
}

/// Load the walkable-area asset: a JSON array of grid-cell key strings.
///
/// # Errors
///
/// `Error::GraphLoad` on a missing or malformed asset.
pub fn load_walkable_area(path: &Path) -> Result<WalkableArea, Error> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::GraphLoad(format!("{}: {e}", path.display())))?;
    let keys: Vec<String> =
        serde_json::from_str(&raw).map_err(|e| Error::GraphLoad(format!("{}: {e}", path.display())))?;

    let cells = keys
        .iter()
        .map(|key| key.parse::<GridKey>())
        .collect::<Result<Vec<_>, Error>>()
        .map_err(|e| Error::GraphLoad(e.to_string()))?;

    info!("Loaded walkable area: {} cells", cells.len());
    Ok(WalkableArea::from_keys(cells))
}
