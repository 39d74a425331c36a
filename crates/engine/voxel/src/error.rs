//! Error types for the voxel crate

use thiserror::Error;

/// Result type alias for voxel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building voxel data from authored input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Rotation is not a multiple of 90 degrees
    #[error("Invalid block rotation: {0} degrees (must be a multiple of 90)")]
    InvalidRotation(i32),

    /// Unknown voxel kind name
    #[error("Unknown voxel kind: {0}")]
    UnknownVoxelKind(String),
}
