//! Block instances

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use voxel::VoxelVolume;

/// Unique identifier of a block instance
///
/// Stays with the block when it migrates to another assembly, so the host
/// can re-parent the matching visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

/// Opaque reference to the visual of a block (mesh asset path)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshRef(pub String);

impl MeshRef {
    pub fn new(path: impl Into<String>) -> Self {
        MeshRef(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MeshRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One clamping block: an immutable docking footprint plus its visual
///
/// The voxel template is shared between all instances of a block type.
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    block_type: Arc<str>,
    mesh: MeshRef,
    volume: Arc<VoxelVolume>,
}

impl Block {
    pub fn new(
        id: BlockId,
        block_type: impl Into<Arc<str>>,
        mesh: MeshRef,
        volume: Arc<VoxelVolume>,
    ) -> Self {
        Self {
            id,
            block_type: block_type.into(),
            mesh,
            volume,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Name of the registry entry this block was created from
    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn mesh(&self) -> &MeshRef {
        &self.mesh
    }

    /// Docking footprint in block-local grid coordinates
    pub fn volume(&self) -> &VoxelVolume {
        &self.volume
    }
}
