use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::model::{RouteMode, StreetGraph};

#[derive(Copy, Clone)]
struct State {
    cost: f64,
    distance: f64,
    node: NodeIndex,
}

// Min-heap by cost (reversed from standard Rust BinaryHeap). Equal-cost
// entries order by lower cumulative distance, then node index, so the
// search is fully deterministic.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.distance.total_cmp(&self.distance))
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

/// Finalized path from start to target with the edges traversed.
#[derive(Debug, Clone)]
pub(crate) struct PathTrace {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
    pub cost: f64,
    pub distance_m: f64,
}

/// Dijkstra over the street graph with the cost selected by `mode`.
///
/// Edge costs are non-negative by construction (length, or length
/// scaled up by risk), which is what lets a finalized node stay final.
/// Between equal-cost paths the lower cumulative distance wins, so
/// equal-risk detours do not degenerate into arbitrary loops. Returns
/// `None` when the frontier exhausts before reaching the target.
pub(crate) fn shortest_path(
    graph: &StreetGraph,
    start: NodeIndex,
    target: NodeIndex,
    mode: RouteMode,
) -> Option<PathTrace> {
    let estimated_nodes = graph.graph.node_count().min(1000);
    let mut best: HashMap<NodeIndex, (f64, f64)> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> =
        HashMap::with_capacity(estimated_nodes);
    let mut finalized = FixedBitSet::with_capacity(graph.graph.node_count());
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    heap.push(State {
        cost: 0.0,
        distance: 0.0,
        node: start,
    });
    best.insert(start, (0.0, 0.0));

    while let Some(State { cost, distance, node }) = heap.pop() {
        // Stale heap entry for an already-finalized node.
        if finalized.contains(node.index()) {
            continue;
        }
        finalized.insert(node.index());

        if node == target {
            break;
        }

        for edge in graph.edges(node) {
            let next = edge.target();
            if finalized.contains(next.index()) {
                continue;
            }

            let weight = edge.weight();
            let next_cost = cost + mode.edge_cost(weight);
            let next_distance = distance + weight.length_m;

            match best.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert((next_cost, next_distance));
                    predecessors.insert(next, (node, edge.id()));
                    heap.push(State {
                        cost: next_cost,
                        distance: next_distance,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    let (known_cost, known_distance) = *entry.get();
                    if next_cost < known_cost
                        || (next_cost == known_cost && next_distance < known_distance)
                    {
                        *entry.get_mut() = (next_cost, next_distance);
                        predecessors.insert(next, (node, edge.id()));
                        heap.push(State {
                            cost: next_cost,
                            distance: next_distance,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    if !finalized.contains(target.index()) {
        return None;
    }

    // Follow predecessors backward from target to start.
    let mut nodes = vec![target];
    let mut edges = Vec::new();
    let mut current = target;
    while current != start {
        let (prev, via) = predecessors[&current];
        edges.push(via);
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();
    edges.reverse();

    let (cost, distance_m) = best[&target];
    Some(PathTrace {
        nodes,
        edges,
        cost,
        distance_m,
    })
}
