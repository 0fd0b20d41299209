//! Street graph construction from a GeoJSON collection of scored
//! segment centerlines, the native output of the offline ETL.
//!
//! Node identity is derived by coordinate quantization
//! ([`NodeId::from_coords`]), so segments meeting at the same physical
//! intersection share one node regardless of float drift in the source
//! data.

use geo::{Coord, Distance, Haversine, LineString, Point};
use geojson::{FeatureCollection, GeoJson};
use hashbrown::HashMap;
use itertools::Itertools;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde_json::Value as JsonValue;

use super::{PendingEdge, finalize_edges};
use crate::Error;
use crate::model::{EdgeId, NodeId, StreetGraph, StreetNode};

/// One centerline part, extracted from a feature before graph assembly.
struct RawPart {
    coords: Vec<Coord<f64>>,
    length_m: f64,
    safety_score: f64,
    name: Option<String>,
}

pub(crate) fn street_graph_from_geojson(value: JsonValue) -> Result<StreetGraph, Error> {
    let geojson = GeoJson::from_json_value(value)
        .map_err(|e| Error::GraphLoad(format!("Malformed segment GeoJSON: {e}")))?;
    let collection = FeatureCollection::try_from(geojson)
        .map_err(|e| Error::GraphLoad(format!("Malformed segment GeoJSON: {e}")))?;

    let feature_count = collection.features.len();
    let parts: Vec<RawPart> = collection
        .features
        .par_iter()
        .flat_map_iter(extract_parts)
        .collect();

    if parts.is_empty() {
        return Err(Error::GraphLoad(format!(
            "Segment collection has no usable centerlines ({feature_count} features)"
        )));
    }

    let mut nodes: HashMap<NodeId, StreetNode> = HashMap::new();
    let mut pending = Vec::with_capacity(parts.len());

    for (i, part) in parts.into_iter().enumerate() {
        let first = part.coords[0];
        let last = part.coords[part.coords.len() - 1];
        let source = NodeId::from_coords(first.y, first.x);
        let target = NodeId::from_coords(last.y, last.x);

        if source == target {
            debug!("Skipping closed or degenerate segment at ({}, {})", first.y, first.x);
            continue;
        }

        nodes.entry(source).or_insert(StreetNode {
            id: source,
            geometry: Point::from(first),
        });
        nodes.entry(target).or_insert(StreetNode {
            id: target,
            geometry: Point::from(last),
        });

        pending.push(PendingEdge {
            id: EdgeId(i as u64),
            source,
            target,
            length_m: part.length_m,
            safety_score: part.safety_score,
            name: part.name,
            geometry: LineString::from(part.coords),
        });
    }

    info!(
        "Built graph from segment collection: {} nodes, {} edges ({} features)",
        nodes.len(),
        pending.len(),
        feature_count
    );

    StreetGraph::from_parts(nodes.into_values().collect(), finalize_edges(pending))
}

/// Pull the centerline parts out of one feature. A `MultiLineString`
/// contributes one part (edge) per component; features without a usable
/// centerline are dropped with a warning rather than failing the load.
fn extract_parts(feature: &geojson::Feature) -> Vec<RawPart> {
    let Some(geometry) = &feature.geometry else {
        warn!("Segment feature without geometry, skipping");
        return Vec::new();
    };

    let lines: Vec<Vec<Vec<f64>>> = match &geometry.value {
        geojson::Value::LineString(line) => vec![line.clone()],
        geojson::Value::MultiLineString(lines) => lines.clone(),
        other => {
            warn!("Segment feature with non-centerline geometry {other:?}, skipping");
            return Vec::new();
        }
    };

    let property = |key: &str| feature.properties.as_ref().and_then(|p| p.get(key));
    let safety_score = property("safety_score")
        .and_then(JsonValue::as_f64)
        .unwrap_or(0.0);
    let declared_length = property("segment_length_m").and_then(JsonValue::as_f64);
    let name = property("name")
        .and_then(JsonValue::as_str)
        .map(str::to_owned);

    lines
        .into_iter()
        .filter_map(|line| {
            let coords: Vec<Coord<f64>> = line
                .iter()
                .filter(|position| position.len() >= 2)
                .map(|position| Coord {
                    x: position[0],
                    y: position[1],
                })
                .collect();
            if coords.len() < 2 {
                return None;
            }

            // ETL-declared lengths are trusted; a MultiLineString's
            // declared length covers the whole feature, so recompute
            // per part in that case too.
            let length_m = match declared_length {
                Some(length) if length > 0.0 => length,
                _ => line_length_m(&coords),
            };

            Some(RawPart {
                coords,
                length_m,
                safety_score,
                name: name.clone(),
            })
        })
        .collect()
}

fn line_length_m(coords: &[Coord<f64>]) -> f64 {
    coords
        .iter()
        .tuple_windows()
        .map(|(a, b)| Haversine.distance(Point::from(*a), Point::from(*b)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_collection(json: &str) -> JsonValue {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn builds_graph_and_merges_shared_endpoints() {
        // Two segments meeting at (38.901, -77.030): three nodes, not four.
        let value = feature_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature",
                     "geometry": {"type": "LineString",
                                  "coordinates": [[-77.030, 38.900], [-77.030, 38.901]]},
                     "properties": {"safety_score": 0.8, "name": "7th St NW"}},
                    {"type": "Feature",
                     "geometry": {"type": "LineString",
                                  "coordinates": [[-77.0300000001, 38.9010000001], [-77.030, 38.902]]},
                     "properties": {"safety_score": 0.2}}
                ]
            }"#,
        );

        let graph = street_graph_from_geojson(value).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let shared = graph
            .node_index(NodeId::from_coords(38.901, -77.030))
            .unwrap();
        assert_eq!(graph.edges(shared).count(), 2);
    }

    #[test]
    fn computes_length_when_not_declared() {
        let value = feature_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature",
                     "geometry": {"type": "LineString",
                                  "coordinates": [[-77.030, 38.900], [-77.030, 38.901]]},
                     "properties": {"safety_score": 0.5}}
                ]
            }"#,
        );

        let graph = street_graph_from_geojson(value).unwrap();
        let idx = graph
            .node_index(NodeId::from_coords(38.900, -77.030))
            .unwrap();
        let edge = graph.edges(idx).next().unwrap();
        // One degree of latitude is ~111 km, so 0.001 degrees is ~111 m.
        assert!((edge.weight().length_m - 111.0).abs() < 2.0);
    }

    #[test]
    fn normalizes_risk_over_the_collection() {
        let value = feature_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature",
                     "geometry": {"type": "LineString",
                                  "coordinates": [[-77.030, 38.900], [-77.030, 38.901]]},
                     "properties": {"safety_score": 2.0}},
                    {"type": "Feature",
                     "geometry": {"type": "LineString",
                                  "coordinates": [[-77.030, 38.901], [-77.030, 38.902]]},
                     "properties": {"safety_score": 6.0}}
                ]
            }"#,
        );

        let graph = street_graph_from_geojson(value).unwrap();
        let mut normalized: Vec<f64> = graph
            .graph
            .edge_weights()
            .map(|e| e.normalized_safety)
            .collect();
        normalized.sort_by(f64::total_cmp);
        assert_eq!(normalized, vec![0.0, 1.0]);
    }

    #[test]
    fn empty_collection_fails_load() {
        let value = feature_collection(r#"{"type": "FeatureCollection", "features": []}"#);
        assert!(matches!(
            street_graph_from_geojson(value),
            Err(Error::GraphLoad(_))
        ));
    }
}
