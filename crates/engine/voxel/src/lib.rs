//! Voxel crate - docking grid primitives for clamping blocks
//!
//! Blocks dock onto each other through a coarse grid of 1 x 1 x 0.5 cells.
//! Each occupied cell is tagged with a [`VoxelType`]: male cells on top of a
//! block plug into female cells on the bottom of the block above it, and
//! blocking cells simply take up space.
//!
//! # Overview
//!
//! - [`VoxelVolume`]: sparse cell map with union, transform and bounds queries
//! - [`BlockTransform`]: integer translation plus quarter-turn yaw, the only
//!   transforms the grid can represent exactly
//! - [`Pose`]: continuous rigid transform, snapped onto the grid with
//!   [`BlockTransform::quantize`]
//!
//! # Example
//!
//! ```rust
//! use voxel::{BlockRotation, BlockTransform, VoxelType, VoxelVolume};
//! use voxel::glam::IVec3;
//!
//! let mut plate = VoxelVolume::new();
//! plate.fill(IVec3::new(0, 0, 0), IVec3::new(1, 1, 0), VoxelType::Female);
//! plate.fill(IVec3::new(0, 0, 1), IVec3::new(1, 1, 1), VoxelType::Male);
//!
//! let turned = plate.transform_to(&BlockTransform::new(0, 0, 2, BlockRotation::Rotate90));
//! assert_eq!(turned.get(IVec3::new(-1, 1, 2)), VoxelType::Female);
//! assert_eq!(turned.get(IVec3::new(5, 5, 5)), VoxelType::Free);
//! ```

mod error;
mod pose;
mod transform;
mod volume;
mod voxel_type;

pub use error::{Error, Result};
pub use pose::Pose;
pub use transform::{BlockRotation, BlockTransform};
pub use volume::{debug_color, voxel_center, DebugBox, VoxelVolume, VOXEL_HALF_EXTENTS};
pub use voxel_type::VoxelType;

// Re-export glam for convenience
pub use glam;
