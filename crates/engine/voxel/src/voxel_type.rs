//! Docking voxel kinds

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a single docking voxel
///
/// A voxel covers 1 x 1 x 0.5 units. Male voxels sit on top of a block and
/// plug into the female voxels on the bottom of the block above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoxelType {
    /// Empty cell, never stored in a volume
    #[default]
    Free,
    /// Occupied cell without a docking face
    Blocking,
    /// Accepts a male voxel directly below
    Female,
    /// Accepts a female voxel directly above
    Male,
}

impl VoxelType {
    /// All kinds, in declaration order
    pub const ALL: [VoxelType; 4] = [
        VoxelType::Free,
        VoxelType::Blocking,
        VoxelType::Female,
        VoxelType::Male,
    ];

    /// Check whether the cell is occupied
    pub fn is_occupied(self) -> bool {
        self != VoxelType::Free
    }

    /// Lowercase name used in authored data
    pub fn name(self) -> &'static str {
        match self {
            VoxelType::Free => "free",
            VoxelType::Blocking => "blocking",
            VoxelType::Female => "female",
            VoxelType::Male => "male",
        }
    }
}

impl fmt::Display for VoxelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for VoxelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoxelType::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownVoxelKind(s.to_string()))
    }
}
