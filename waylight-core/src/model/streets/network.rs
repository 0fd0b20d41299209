//! Street graph: petgraph adjacency plus an R-tree over nodes for
//! snapping request endpoints.

use geo::{Distance, Haversine, Point};
use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::components::{NodeId, StreetEdge, StreetNode};
use crate::Error;

/// Meters per degree of latitude; used to widen a metric snap radius
/// into a conservative degree-space candidate sweep.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// R-tree entry: a `[lon, lat]` point tagged with its graph node.
#[derive(Debug, Clone)]
pub struct IndexedPoint {
    point: [f64; 2],
    node: NodeIndex,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedPoint {
    // Squared Euclidean distance in degree space. Candidates are
    // re-checked with exact haversine distance before use.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Undirected street graph with stable-id lookup and node snapping.
///
/// Adjacency lives in the petgraph structure and is rebuilt from the
/// edge list at load time, so it cannot drift from the edges. Read-only
/// after construction; reload replaces the whole graph.
#[derive(Debug, Clone)]
pub struct StreetGraph {
    pub graph: UnGraph<StreetNode, StreetEdge>,
    node_ids: HashMap<NodeId, NodeIndex>,
    rtree: RTree<IndexedPoint>,
}

impl StreetGraph {
    /// Assemble a graph from loaded nodes and edges.
    ///
    /// # Errors
    ///
    /// `Error::GraphLoad` if an edge references a node id that is not in
    /// the node set.
    pub fn from_parts(
        nodes: Vec<StreetNode>,
        edges: Vec<(NodeId, NodeId, StreetEdge)>,
    ) -> Result<Self, Error> {
        let mut graph = UnGraph::with_capacity(nodes.len(), edges.len());
        let mut node_ids = HashMap::with_capacity(nodes.len());

        for node in nodes {
            let id = node.id;
            let idx = graph.add_node(node);
            node_ids.insert(id, idx);
        }

        for (source, target, edge) in edges {
            let source_idx = *node_ids.get(&source).ok_or_else(|| {
                Error::GraphLoad(format!(
                    "Edge {:?} references missing source node {source:?}",
                    edge.id
                ))
            })?;
            let target_idx = *node_ids.get(&target).ok_or_else(|| {
                Error::GraphLoad(format!(
                    "Edge {:?} references missing target node {target:?}",
                    edge.id
                ))
            })?;
            graph.add_edge(source_idx, target_idx, edge);
        }

        let entries: Vec<IndexedPoint> = graph
            .node_indices()
            .map(|idx| IndexedPoint {
                point: [graph[idx].geometry.x(), graph[idx].geometry.y()],
                node: idx,
            })
            .collect();
        let rtree = RTree::bulk_load(entries);

        Ok(Self {
            graph,
            node_ids,
            rtree,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_ids.get(&id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &StreetNode {
        &self.graph[idx]
    }

    pub fn edge(&self, idx: EdgeIndex) -> &StreetEdge {
        &self.graph[idx]
    }

    /// Edges incident to `node`, both directions.
    pub fn edges(
        &self,
        node: NodeIndex,
    ) -> petgraph::graph::Edges<'_, StreetEdge, petgraph::Undirected> {
        self.graph.edges(node)
    }

    /// Snap a coordinate to the nearest graph node within `radius_m`
    /// meters, or `None` when no node is close enough.
    ///
    /// Candidates come from a degree-space R-tree sweep widened to cover
    /// the radius at any longitude scale, then are ranked by exact
    /// haversine distance with ties broken by lower node id, so equal
    /// inputs always snap to the same node.
    pub fn nearest_node_within(&self, point: Point<f64>, radius_m: f64) -> Option<(NodeIndex, f64)> {
        let lat_scale = point.y().to_radians().cos().abs().max(0.01);
        let radius_deg = radius_m / (METERS_PER_DEGREE * lat_scale);

        self.rtree
            .locate_within_distance([point.x(), point.y()], radius_deg * radius_deg)
            .filter_map(|entry| {
                let candidate = &self.graph[entry.node];
                let distance = Haversine.distance(point, candidate.geometry);
                (distance <= radius_m).then_some((entry.node, distance, candidate.id))
            })
            .min_by(|(_, d1, id1), (_, d2, id2)| {
                d1.total_cmp(d2).then_with(|| id1.cmp(id2))
            })
            .map(|(node, distance, _)| (node, distance))
    }
}

#[cfg(test)]
mod tests {
    use geo::{Point, line_string};

    use super::*;
    use crate::model::streets::components::EdgeId;

    fn node(lat: f64, lon: f64) -> StreetNode {
        StreetNode {
            id: NodeId::from_coords(lat, lon),
            geometry: Point::new(lon, lat),
        }
    }

    fn edge(id: u64, a: &StreetNode, b: &StreetNode) -> (NodeId, NodeId, StreetEdge) {
        let length_m = Haversine.distance(a.geometry, b.geometry);
        (
            a.id,
            b.id,
            StreetEdge {
                id: EdgeId(id),
                length_m,
                safety_score: 0.0,
                normalized_safety: 0.0,
                weight: length_m,
                name: None,
                geometry: line_string![
                    (x: a.geometry.x(), y: a.geometry.y()),
                    (x: b.geometry.x(), y: b.geometry.y()),
                ],
            },
        )
    }

    #[test]
    fn dangling_edge_reference_fails_load() {
        let a = node(38.900, -77.030);
        let b = node(38.901, -77.030);
        let missing = node(38.999, -77.999);
        let bad_edge = edge(0, &a, &missing);

        let result = StreetGraph::from_parts(vec![a, b], vec![bad_edge]);
        assert!(matches!(result, Err(Error::GraphLoad(_))));
    }

    #[test]
    fn adjacency_matches_incident_edges() {
        let a = node(38.900, -77.030);
        let b = node(38.901, -77.030);
        let c = node(38.902, -77.030);
        let edges = vec![edge(0, &a, &b), edge(1, &b, &c)];
        let ids = [a.id, b.id, c.id];

        let graph = StreetGraph::from_parts(vec![a, b, c], edges).unwrap();

        for (id, expected_degree) in ids.iter().zip([1usize, 2, 1]) {
            let idx = graph.node_index(*id).unwrap();
            assert_eq!(graph.edges(idx).count(), expected_degree);
        }
    }

    #[test]
    fn snapping_is_bounded_and_deterministic() {
        let a = node(38.900, -77.030);
        let b = node(38.901, -77.030);
        let a_id = a.id;
        let graph = StreetGraph::from_parts(vec![a, b], vec![]).unwrap();

        // ~11 m north of node a: well within 100 m.
        let (snapped, distance) = graph
            .nearest_node_within(Point::new(-77.030, 38.9001), 100.0)
            .unwrap();
        assert_eq!(graph.node(snapped).id, a_id);
        assert!(distance < 15.0);

        // Nothing within 50 m of a point ~1 km away.
        assert!(
            graph
                .nearest_node_within(Point::new(-77.030, 38.91), 50.0)
                .is_none()
        );
    }
}
