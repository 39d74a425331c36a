//! Block type registry
//!
//! Every block type is plain data: a name, a mesh reference and a voxel
//! template. The built-in table carries the 2x2, 1x4 and 20x20 clamping
//! blocks; more types can be declared in TOML (see [`BlockDef`]).

use crate::{Block, BlockId, Error, MeshRef, Result};
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use voxel::{VoxelType, VoxelVolume};

/// An inclusive box of voxels of one kind
///
/// `max` defaults to `min`, i.e. a single voxel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelSpan {
    pub min: [i32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<[i32; 3]>,
    pub kind: VoxelType,
}

impl VoxelSpan {
    pub fn single(at: [i32; 3], kind: VoxelType) -> Self {
        Self {
            min: at,
            max: None,
            kind,
        }
    }

    pub fn fill(min: [i32; 3], max: [i32; 3], kind: VoxelType) -> Self {
        Self {
            min,
            max: Some(max),
            kind,
        }
    }
}

/// Declarative description of a block type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDef {
    pub name: String,
    pub mesh: String,
    pub voxels: Vec<VoxelSpan>,
}

impl BlockDef {
    /// Build the voxel template; later spans overwrite earlier ones
    pub fn build_volume(&self) -> VoxelVolume {
        let mut volume = VoxelVolume::new();
        for span in &self.voxels {
            let min = IVec3::from_array(span.min);
            let max = IVec3::from_array(span.max.unwrap_or(span.min));
            volume.fill(min, max, span.kind);
        }
        volume
    }

    /// Plate of `width` x `depth` studs: female layer at z = 0, male at z = 1
    pub fn plate(name: &str, mesh: &str, width: i32, depth: i32) -> Self {
        Self {
            name: name.to_string(),
            mesh: mesh.to_string(),
            voxels: vec![
                VoxelSpan::fill([0, 0, 0], [width - 1, depth - 1, 0], VoxelType::Female),
                VoxelSpan::fill([0, 0, 1], [width - 1, depth - 1, 1], VoxelType::Male),
            ],
        }
    }
}

/// The clamping blocks shipped with the engine
pub fn builtin_block_defs() -> Vec<BlockDef> {
    vec![
        BlockDef::plate("block_2x2", "/Game/Blocks/Meshes/Block2x2", 2, 2),
        BlockDef::plate("block_1x4", "/Game/Blocks/Meshes/Block1x4", 1, 4),
        BlockDef::plate("block_20x20", "/Game/Blocks/Meshes/Block20x20", 20, 20),
    ]
}

/// A registered block type
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    name: Arc<str>,
    mesh: MeshRef,
    volume: Arc<VoxelVolume>,
}

impl BlockTemplate {
    fn new(name: &str, mesh: MeshRef, volume: VoxelVolume) -> Self {
        Self {
            name: Arc::from(name),
            mesh,
            volume: Arc::new(volume),
        }
    }

    fn from_def(def: &BlockDef) -> Self {
        Self::new(&def.name, MeshRef::new(def.mesh.clone()), def.build_volume())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &MeshRef {
        &self.mesh
    }

    pub fn volume(&self) -> &VoxelVolume {
        &self.volume
    }

    /// Create a block instance sharing this template's voxels
    pub fn instantiate(&self, id: BlockId) -> Block {
        Block::new(id, self.name.clone(), self.mesh.clone(), self.volume.clone())
    }
}

/// Mapping from block type name to its template
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    templates: BTreeMap<String, BlockTemplate>,
}

impl BlockRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with [`builtin_block_defs`]
    pub fn with_builtin() -> Self {
        let templates = builtin_block_defs()
            .iter()
            .map(|def| (def.name.clone(), BlockTemplate::from_def(def)))
            .collect();
        Self { templates }
    }

    /// Register a block type from its declarative form
    pub fn register(&mut self, def: &BlockDef) -> Result<()> {
        self.register_volume(&def.name, MeshRef::new(def.mesh.clone()), def.build_volume())
    }

    /// Register a block type from an already built volume
    pub fn register_volume(
        &mut self,
        name: &str,
        mesh: MeshRef,
        volume: VoxelVolume,
    ) -> Result<()> {
        if self.templates.contains_key(name) {
            return Err(Error::DuplicateBlockType(name.to_string()));
        }
        if volume.is_empty() {
            return Err(Error::EmptyTemplate(name.to_string()));
        }
        self.templates
            .insert(name.to_string(), BlockTemplate::new(name, mesh, volume));
        Ok(())
    }

    /// Look up a block type
    pub fn get(&self, name: &str) -> Option<&BlockTemplate> {
        self.templates.get(name)
    }

    /// Check whether a block type is registered
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Create a block instance of a registered type
    pub fn instantiate(&self, name: &str, id: BlockId) -> Result<Block> {
        self.get(name)
            .map(|template| template.instantiate(id))
            .ok_or_else(|| Error::UnknownBlockType(name.to_string()))
    }
}
