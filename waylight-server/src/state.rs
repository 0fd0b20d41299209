//! Shared server state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use waylight_core::loading::GraphStore;

use crate::config::Config;
use crate::directions::DirectionsClient;
use crate::tile_cache::FifoCache;

pub struct AppState {
    pub store: GraphStore,
    pub directions: Option<DirectionsClient>,
    pub snap_radius_m: f64,
    tile_cache: Mutex<FifoCache<String, String>>,
}

impl AppState {
    pub fn new(config: &Config, store: GraphStore) -> Result<Self, String> {
        let directions = config
            .directions
            .as_ref()
            .map(DirectionsClient::new)
            .transpose()?;

        Ok(Self {
            store,
            directions,
            snap_radius_m: config.snap_radius_m,
            tile_cache: Mutex::new(FifoCache::new(config.tile_cache_capacity)),
        })
    }

    pub fn tile_cache(&self) -> MutexGuard<'_, FifoCache<String, String>> {
        self.tile_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
