//! Docking configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! min_connections = 1
//! transfer_overlaps = true
//!
//! [[blocks]]
//! name = "brick_1x2"
//! mesh = "/Game/Blocks/Meshes/Brick1x2"
//! voxels = [
//!     { min = [0, 0, 0], max = [0, 1, 0], kind = "female" },
//!     { min = [0, 0, 1], max = [0, 1, 1], kind = "male" },
//! ]
//! ```

use crate::{BlockDef, BlockRegistry, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine-wide docking settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockingConfig {
    /// Male/female connections needed for a merge (values below 1 count as 1)
    pub min_connections: u32,
    /// Hand the merged-away assembly's overlaps over to the survivor
    pub transfer_overlaps: bool,
    /// Block types registered in addition to the built-in ones
    pub blocks: Vec<BlockDef>,
}

impl Default for DockingConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            transfer_overlaps: true,
            blocks: Vec::new(),
        }
    }
}

impl DockingConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Effective connection threshold
    pub fn required_connections(&self) -> u32 {
        self.min_connections.max(1)
    }

    /// Built-in block types plus the ones declared here
    pub fn build_registry(&self) -> Result<BlockRegistry> {
        let mut registry = BlockRegistry::with_builtin();
        for def in &self.blocks {
            registry.register(def)?;
        }
        Ok(registry)
    }
}
