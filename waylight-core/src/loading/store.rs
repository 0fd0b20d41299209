//! Reloadable owner of the routing data.
//!
//! Replaces the usual global mutable graph singleton with an explicit
//! handle: searches borrow an immutable snapshot, reload builds a fresh
//! snapshot off to the side and publishes it with one pointer swap, so
//! a search in flight keeps the graph it started with and never sees a
//! half-updated one.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use log::info;

use super::asset::{load_street_graph, load_walkable_area};
use crate::Error;
use crate::algo::SegmentGridIndex;
use crate::model::{StreetGraph, WalkableArea};

/// One immutable snapshot of everything a search needs.
#[derive(Debug)]
pub struct RoutingData {
    pub graph: StreetGraph,
    pub walkable: WalkableArea,
    pub index: SegmentGridIndex,
}

/// Owns the asset paths and the active [`RoutingData`] snapshot.
pub struct GraphStore {
    graph_path: PathBuf,
    walkable_path: PathBuf,
    current: RwLock<Arc<RoutingData>>,
}

impl GraphStore {
    /// Load both assets and build the initial snapshot.
    ///
    /// # Errors
    ///
    /// `Error::GraphLoad` if either asset is missing or invalid. Callers
    /// should treat this as fatal at startup rather than serve a partial
    /// graph.
    pub fn open(graph_path: &Path, walkable_path: &Path) -> Result<Self, Error> {
        let data = load_routing_data(graph_path, walkable_path)?;
        Ok(Self {
            graph_path: graph_path.to_path_buf(),
            walkable_path: walkable_path.to_path_buf(),
            current: RwLock::new(Arc::new(data)),
        })
    }

    /// The active snapshot. Holders keep a consistent graph for as long
    /// as they keep the `Arc`, across any number of reloads.
    pub fn snapshot(&self) -> Arc<RoutingData> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rebuild the snapshot from the assets and atomically replace the
    /// active one. On failure the previous snapshot stays active.
    ///
    /// # Errors
    ///
    /// `Error::GraphLoad` if either asset fails to load; the store is
    /// left unchanged.
    pub fn reload(&self) -> Result<(), Error> {
        let data = load_routing_data(&self.graph_path, &self.walkable_path)?;
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(data);
        Ok(())
    }
}

fn load_routing_data(graph_path: &Path, walkable_path: &Path) -> Result<RoutingData, Error> {
    let graph = load_street_graph(graph_path)?;
    let walkable = load_walkable_area(walkable_path)?;
    let index = SegmentGridIndex::build(&graph);

    let stats = index.stats();
    info!(
        "Routing data ready: {} nodes, {} edges, {} walkable cells, {:.1} segments/cell",
        graph.node_count(),
        graph.edge_count(),
        walkable.len(),
        stats.mean_segments_per_cell
    );

    Ok(RoutingData {
        graph,
        walkable,
        index,
    })
}
