//! Uniform grid index over street segments.
//!
//! Segments are bucketed by the grid cell their centroid falls in, so a
//! bounding-box query touches only the cells overlapping the box
//! instead of scanning every segment. Built once per graph load and
//! immutable afterwards.
//!
//! Known limitation, kept deliberately: a long segment whose centroid
//! lies outside the query bounds is missed even when part of its
//! geometry crosses them. Acceptable for viewport queries at this cell
//! size; widen the requested bounds by a cell if that ever matters.

use geo::Rect;
use geojson::{Feature, FeatureCollection, Geometry};
use hashbrown::{HashMap, HashSet};
use petgraph::graph::EdgeIndex;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use crate::model::{GridKey, StreetGraph};

/// Index health numbers for diagnostics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GridStats {
    pub cell_count: usize,
    pub segment_count: usize,
    pub mean_segments_per_cell: f64,
}

#[derive(Debug, Clone)]
pub struct SegmentGridIndex {
    cells: HashMap<GridKey, Vec<EdgeIndex>>,
    segment_count: usize,
}

impl SegmentGridIndex {
    /// Bucket every edge of `graph` by its centroid cell.
    pub fn build(graph: &StreetGraph) -> Self {
        let mut cells: HashMap<GridKey, Vec<EdgeIndex>> = HashMap::new();
        let mut segment_count = 0;

        for idx in graph.graph.edge_indices() {
            let centroid = graph.edge(idx).centroid();
            cells
                .entry(GridKey::for_point(centroid.y, centroid.x))
                .or_default()
                .push(idx);
            segment_count += 1;
        }

        Self {
            cells,
            segment_count,
        }
    }

    /// Segments bucketed in any cell overlapping `bounds`.
    ///
    /// Iterates the inclusive grid-key range covering the bounds and
    /// unions the matching buckets, deduplicating by edge index so a
    /// segment is returned once no matter how many touched cells (or
    /// overlapping ranges) reference it.
    pub fn query(&self, bounds: &Rect<f64>) -> Vec<EdgeIndex> {
        let min = GridKey::for_point(bounds.min().y, bounds.min().x);
        let max = GridKey::for_point(bounds.max().y, bounds.max().x);

        let mut seen: HashSet<EdgeIndex> = HashSet::new();
        let mut result = Vec::new();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                if let Some(bucket) = self.cells.get(&GridKey { x, y }) {
                    for &edge in bucket {
                        if seen.insert(edge) {
                            result.push(edge);
                        }
                    }
                }
            }
        }
        result
    }

    pub fn stats(&self) -> GridStats {
        let cell_count = self.cells.len();
        let mean = if cell_count == 0 {
            0.0
        } else {
            self.segment_count as f64 / cell_count as f64
        };
        GridStats {
            cell_count,
            segment_count: self.segment_count,
            mean_segments_per_cell: mean,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// GeoJSON rendition of a viewport query, one feature per segment.
pub fn segment_features(
    graph: &StreetGraph,
    index: &SegmentGridIndex,
    bounds: &Rect<f64>,
) -> FeatureCollection {
    let features = index
        .query(bounds)
        .into_iter()
        .map(|idx| {
            let edge = graph.edge(idx);
            let mut properties = Map::new();
            properties.insert("edgeId".to_string(), json!(edge.id.0));
            properties.insert("lengthMeters".to_string(), json!(edge.length_m));
            properties.insert("safetyScore".to_string(), json!(edge.safety_score));
            properties.insert(
                "normalizedSafetyScore".to_string(),
                json!(edge.normalized_safety),
            );
            if let Some(name) = &edge.name {
                properties.insert("streetName".to_string(), JsonValue::String(name.clone()));
            }

            Feature {
                bbox: None,
                geometry: Some(Geometry::new((&edge.geometry).into())),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use geo::{Coord, Point, Rect, line_string};

    use super::*;
    use crate::model::{EdgeId, NodeId, StreetEdge, StreetNode};

    fn node(lat: f64, lon: f64) -> StreetNode {
        StreetNode {
            id: NodeId::from_coords(lat, lon),
            geometry: Point::new(lon, lat),
        }
    }

    fn edge(id: u64, a: &StreetNode, b: &StreetNode) -> (NodeId, NodeId, StreetEdge) {
        (
            a.id,
            b.id,
            StreetEdge {
                id: EdgeId(id),
                length_m: 100.0,
                safety_score: 0.0,
                normalized_safety: 0.0,
                weight: 100.0,
                name: None,
                geometry: line_string![
                    (x: a.geometry.x(), y: a.geometry.y()),
                    (x: b.geometry.x(), y: b.geometry.y()),
                ],
            },
        )
    }

    fn bounds(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Rect<f64> {
        Rect::new(
            Coord { x: min_lon, y: min_lat },
            Coord { x: max_lon, y: max_lat },
        )
    }

    fn test_graph() -> StreetGraph {
        // Two short segments near the origin cell and one far away.
        let a = node(38.9000, -77.0300);
        let b = node(38.9005, -77.0300);
        let c = node(38.9010, -77.0300);
        let d = node(38.9500, -77.0300);
        let e = node(38.9505, -77.0300);
        let edges = vec![edge(0, &a, &b), edge(1, &b, &c), edge(2, &d, &e)];
        StreetGraph::from_parts(vec![a, b, c, d, e], edges).unwrap()
    }

    #[test]
    fn query_returns_segments_with_centroids_in_bounds_without_duplicates() {
        let graph = test_graph();
        let index = SegmentGridIndex::build(&graph);

        let hits = index.query(&bounds(38.899, -77.031, 38.902, -77.029));
        let mut ids: Vec<u64> = hits.iter().map(|&i| graph.edge(i).id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);

        // The whole-city query touches every cell but still reports each
        // segment exactly once.
        let all = index.query(&bounds(38.0, -78.0, 39.0, -76.0));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn centroid_outside_bounds_is_missed_even_when_geometry_crosses() {
        // One long segment spanning many cells; its centroid sits near
        // 38.925. A viewport over the segment's southern end crosses the
        // geometry but not the centroid cell, so the query misses it.
        let a = node(38.9000, -77.0300);
        let b = node(38.9500, -77.0300);
        let edges = vec![edge(0, &a, &b)];
        let graph = StreetGraph::from_parts(vec![a, b], edges).unwrap();
        let index = SegmentGridIndex::build(&graph);

        let southern_view = bounds(38.899, -77.031, 38.905, -77.029);
        assert!(index.query(&southern_view).is_empty());

        let centroid_view = bounds(38.920, -77.031, 38.930, -77.029);
        assert_eq!(index.query(&centroid_view).len(), 1);
    }

    #[test]
    fn stats_report_index_health() {
        let graph = test_graph();
        let index = SegmentGridIndex::build(&graph);

        let stats = index.stats();
        assert_eq!(stats.segment_count, 3);
        assert!(stats.cell_count >= 2);
        assert!(stats.mean_segments_per_cell > 0.0);
    }

    #[test]
    fn viewport_features_carry_segment_properties() {
        let graph = test_graph();
        let index = SegmentGridIndex::build(&graph);

        let collection = segment_features(&graph, &index, &bounds(38.899, -77.031, 38.902, -77.029));
        assert_eq!(collection.features.len(), 2);
        let properties = collection.features[0].properties.as_ref().unwrap();
        assert!(properties.contains_key("edgeId"));
        assert!(properties.contains_key("safetyScore"));
    }
}
