//! Server configuration, loaded from a TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Persisted street-graph asset (structural dump or scored GeoJSON)
    pub graph_asset: PathBuf,
    /// Walkable-cell asset (JSON array of grid key strings)
    pub walkable_asset: PathBuf,
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_snap_radius")]
    pub snap_radius_m: f64,
    #[serde(default = "default_tile_cache_capacity")]
    pub tile_cache_capacity: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// External street-following directions provider; engine waypoints
    /// are served directly when absent.
    #[serde(default)]
    pub directions: Option<DirectionsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectionsConfig {
    pub url: String,
    #[serde(default = "default_directions_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_listen() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_snap_radius() -> f64 {
    waylight_core::DEFAULT_SNAP_RADIUS_M
}

fn default_tile_cache_capacity() -> usize {
    256
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent_requests() -> usize {
    64
}

fn default_directions_timeout_secs() -> u64 {
    5
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if !self.graph_asset.exists() {
            return Err(format!(
                "Graph asset not found: {}",
                self.graph_asset.display()
            ));
        }
        if !self.walkable_asset.exists() {
            return Err(format!(
                "Walkable asset not found: {}",
                self.walkable_asset.display()
            ));
        }
        if self.tile_cache_capacity == 0 {
            return Err("tile_cache_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let asset = tempfile::NamedTempFile::new().unwrap();
        let mut config_file = tempfile::NamedTempFile::new().unwrap();
        write!(
            config_file,
            "graph_asset = {:?}\nwalkable_asset = {:?}\n",
            asset.path(),
            asset.path()
        )
        .unwrap();

        let config = Config::load(config_file.path()).unwrap();
        assert_eq!(config.listen, "127.0.0.1:3000");
        assert_eq!(config.tile_cache_capacity, 256);
        assert!(config.directions.is_none());
    }

    #[test]
    fn missing_asset_fails_validation() {
        let mut config_file = tempfile::NamedTempFile::new().unwrap();
        write!(
            config_file,
            "graph_asset = \"/nonexistent/graph.json\"\nwalkable_asset = \"/nonexistent/walkable.json\"\n"
        )
        .unwrap();

        assert!(Config::load(config_file.path()).is_err());
    }
}
