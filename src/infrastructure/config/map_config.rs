//! Per-plugin map configuration files.
//!
//! Each plugin has an optional `<plugins_dir>/<plugin_id>.yaml` mapping map
//! ids to [`MapConfig`]s, resolved relative to the main configuration
//! file's directory.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::models::MapConfig;

/// Map configurations of one plugin, keyed by map id.
pub type PluginMapConfigs = HashMap<String, MapConfig>;

/// Resolves and loads plugin map configuration files.
#[derive(Debug, Clone)]
pub struct MapConfigStore {
    root: PathBuf,
}

impl MapConfigStore {
    pub fn new(config_dir: impl AsRef<Path>, plugins_dir: impl AsRef<Path>) -> Self {
        Self {
            root: config_dir.as_ref().join(plugins_dir),
        }
    }

    pub fn path_for(&self, plugin_id: &str) -> PathBuf {
        self.root.join(format!("{plugin_id}.yaml"))
    }

    /// Load the map configurations of a plugin.
    ///
    /// A missing file yields an empty set; an unreadable, malformed or
    /// invalid file is an error.
    pub fn load(&self, plugin_id: &str) -> Result<PluginMapConfigs> {
        let path = self.path_for(plugin_id);
        if !path.exists() {
            tracing::warn!(plugin = plugin_id, path = %path.display(), "no map configuration file for plugin");
            return Ok(PluginMapConfigs::new());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read map configuration {}", path.display()))?;
        let configs: PluginMapConfigs = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse map configuration {}", path.display()))?;
        for (map_id, config) in &configs {
            config
                .validate()
                .map_err(|reason| anyhow!("Invalid map {map_id} in {}: {reason}", path.display()))?;
        }

        tracing::debug!(plugin = plugin_id, maps = configs.len(), "loaded map configuration");
        Ok(configs)
    }
}
