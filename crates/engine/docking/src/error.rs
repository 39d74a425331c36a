//! Error types for the docking crate

use crate::AssemblyHandle;
use thiserror::Error;

/// Result type alias for docking operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by block authoring and coordinator bookkeeping
///
/// Docking itself never fails: mergability and merges answer with `bool`.
#[derive(Debug, Error)]
pub enum Error {
    /// Block type not present in the registry
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    /// Block type registered twice
    #[error("Duplicate block type: {0}")]
    DuplicateBlockType(String),

    /// Block type without any voxel
    #[error("Block type has an empty voxel template: {0}")]
    EmptyTemplate(String),

    /// Assembly without blocks, or one already merged away
    #[error("Assembly has no blocks or was merged away")]
    EmptyAssembly,

    /// Handle that does not refer to a live assembly
    #[error("Unknown or removed assembly: {0}")]
    UnknownAssembly(AssemblyHandle),

    /// Invalid voxel data in a block definition
    #[error("Invalid voxel data: {0}")]
    Voxel(#[from] voxel::Error),

    /// Configuration could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
