//! Sparse docking voxel volumes

use crate::{BlockTransform, Pose, VoxelType};
use glam::{IVec3, Vec3};
use std::collections::BTreeMap;
use std::fmt;

/// Half extents of one voxel in world units (1 x 1 x 0.5 cell)
pub const VOXEL_HALF_EXTENTS: Vec3 = Vec3::new(0.5, 0.5, 0.25);

/// Sparse map from grid coordinate to voxel kind
///
/// Only occupied cells are stored; [`VoxelVolume::get`] reports
/// [`VoxelType::Free`] for everything else. The z axis uses half-unit steps,
/// so a cell at `(x, y, z)` sits at physical height `z / 2`.
///
/// Cells are kept ordered by `(x, y, z)` so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoxelVolume {
    voxels: BTreeMap<[i32; 3], VoxelType>,
}

impl VoxelVolume {
    /// Create an empty volume
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a cell; inserting `Free` removes it
    pub fn add(&mut self, coord: IVec3, kind: VoxelType) {
        if kind == VoxelType::Free {
            self.voxels.remove(&coord.to_array());
        } else {
            self.voxels.insert(coord.to_array(), kind);
        }
    }

    /// Fill the inclusive box `min..=max` with one kind
    pub fn fill(&mut self, min: IVec3, max: IVec3, kind: VoxelType) {
        let lo = min.min(max);
        let hi = min.max(max);
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    self.add(IVec3::new(x, y, z), kind);
                }
            }
        }
    }

    /// Union `other` into this volume after mapping it through `transform`
    ///
    /// Cells of `other` overwrite existing cells at the same coordinate.
    pub fn add_volume(&mut self, other: &VoxelVolume, transform: &BlockTransform) {
        for (coord, kind) in other.iter() {
            self.add(transform.apply(coord), kind);
        }
    }

    /// Kind at a coordinate, `Free` if absent
    pub fn get(&self, coord: IVec3) -> VoxelType {
        self.voxels
            .get(&coord.to_array())
            .copied()
            .unwrap_or(VoxelType::Free)
    }

    /// Check whether a coordinate is occupied
    pub fn contains(&self, coord: IVec3) -> bool {
        self.voxels.contains_key(&coord.to_array())
    }

    /// Copy of this volume with every coordinate mapped through `transform`
    pub fn transform_to(&self, transform: &BlockTransform) -> VoxelVolume {
        let mut result = VoxelVolume::new();
        result.add_volume(self, transform);
        result
    }

    /// Iterate over occupied cells in `(x, y, z)` order
    pub fn iter(&self) -> impl Iterator<Item = (IVec3, VoxelType)> + '_ {
        self.voxels
            .iter()
            .map(|(coord, kind)| (IVec3::from_array(*coord), *kind))
    }

    /// Number of occupied cells
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Check whether no cell is occupied
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Inclusive min/max corners of the occupied cells
    pub fn bounds(&self) -> Option<(IVec3, IVec3)> {
        let mut cells = self.iter().map(|(coord, _)| coord);
        let first = cells.next()?;
        Some(cells.fold((first, first), |(min, max), c| (min.min(c), max.max(c))))
    }

    /// Extent of the bounding box in cells; zero for an empty volume
    pub fn dimension(&self) -> IVec3 {
        match self.bounds() {
            Some((min, max)) => max - min + IVec3::ONE,
            None => IVec3::ZERO,
        }
    }

    /// Midpoint of the bounding box in grid coordinates
    ///
    /// An empty volume has no bounding box; `Vec3::ZERO` is returned.
    pub fn bounding_center(&self) -> Vec3 {
        match self.bounds() {
            Some((min, max)) => (min.as_vec3() + max.as_vec3()) / 2.0,
            None => Vec3::ZERO,
        }
    }

    /// Distinct z layers, ascending
    pub fn layers(&self) -> Vec<i32> {
        let mut layers: Vec<i32> = self.iter().map(|(coord, _)| coord.z).collect();
        layers.sort_unstable();
        layers.dedup();
        layers
    }
}

impl FromIterator<(IVec3, VoxelType)> for VoxelVolume {
    fn from_iter<I: IntoIterator<Item = (IVec3, VoxelType)>>(iter: I) -> Self {
        let mut volume = VoxelVolume::new();
        volume.extend(iter);
        volume
    }
}

impl Extend<(IVec3, VoxelType)> for VoxelVolume {
    fn extend<I: IntoIterator<Item = (IVec3, VoxelType)>>(&mut self, iter: I) {
        for (coord, kind) in iter {
            self.add(coord, kind);
        }
    }
}

impl fmt::Display for VoxelVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "VOLUME ({} voxels)", self.len())?;
        for (coord, kind) in self.iter() {
            writeln!(f, "\t{}, {}, {}\t{}", coord.x, coord.y, coord.z, kind)?;
        }
        Ok(())
    }
}

/// Physical position of a cell center in the volume's local space
pub fn voxel_center(coord: IVec3) -> Vec3 {
    Vec3::new(coord.x as f32, coord.y as f32, coord.z as f32 / 2.0)
}

/// World-space box describing one voxel, for host-side debug drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugBox {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: glam::Quat,
    pub kind: VoxelType,
    /// RGB in 0..1
    pub color: Vec3,
}

/// Suggested debug colour for a voxel kind
pub fn debug_color(kind: VoxelType) -> Vec3 {
    match kind {
        VoxelType::Male => Vec3::new(0.0, 0.0, 1.0),
        VoxelType::Female => Vec3::new(1.0, 0.0, 1.0),
        VoxelType::Blocking | VoxelType::Free => Vec3::ZERO,
    }
}

impl VoxelVolume {
    /// One debug box per occupied cell, placed in world space by `pose`
    ///
    /// This only produces data; drawing is left to the host.
    pub fn debug_boxes(&self, pose: &Pose) -> Vec<DebugBox> {
        self.iter()
            .map(|(coord, kind)| DebugBox {
                center: pose.transform_point(voxel_center(coord)),
                half_extents: VOXEL_HALF_EXTENTS,
                rotation: pose.rotation,
                kind,
                color: debug_color(kind),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockRotation;

    fn plate_2x2() -> VoxelVolume {
        let mut volume = VoxelVolume::new();
        volume.fill(IVec3::new(0, 0, 0), IVec3::new(1, 1, 0), VoxelType::Female);
        volume.fill(IVec3::new(0, 0, 1), IVec3::new(1, 1, 1), VoxelType::Male);
        volume
    }

    #[test]
    fn test_free_removes() {
        let mut volume = VoxelVolume::new();
        volume.add(IVec3::new(1, 2, 3), VoxelType::Male);
        assert_eq!(volume.get(IVec3::new(1, 2, 3)), VoxelType::Male);

        volume.add(IVec3::new(1, 2, 3), VoxelType::Free);
        assert_eq!(volume.get(IVec3::new(1, 2, 3)), VoxelType::Free);
        assert!(volume.is_empty());
    }

    #[test]
    fn test_overwrite() {
        let mut volume = VoxelVolume::new();
        volume.add(IVec3::ZERO, VoxelType::Male);
        volume.add(IVec3::ZERO, VoxelType::Blocking);
        assert_eq!(volume.len(), 1);
        assert_eq!(volume.get(IVec3::ZERO), VoxelType::Blocking);
    }

    #[test]
    fn test_transform_to_rotates_then_translates() {
        let mut volume = VoxelVolume::new();
        volume.add(IVec3::new(1, 0, 0), VoxelType::Female);

        let moved = volume.transform_to(&BlockTransform::new(10, 0, 2, BlockRotation::Rotate90));
        assert_eq!(moved.get(IVec3::new(10, 1, 2)), VoxelType::Female);
        assert_eq!(moved.len(), 1);

        // Source is untouched
        assert_eq!(volume.get(IVec3::new(1, 0, 0)), VoxelType::Female);
    }

    #[test]
    fn test_add_volume_unions() {
        let mut volume = plate_2x2();
        volume.add_volume(&plate_2x2(), &BlockTransform::new(0, 0, 2, BlockRotation::Rotate0));
        assert_eq!(volume.len(), 16);
        assert_eq!(volume.layers(), vec![0, 1, 2, 3]);
        assert_eq!(volume.dimension(), IVec3::new(2, 2, 4));
    }

    #[test]
    fn test_bounds_and_center() {
        let volume = plate_2x2();
        assert_eq!(volume.bounds(), Some((IVec3::ZERO, IVec3::new(1, 1, 1))));
        assert_eq!(volume.dimension(), IVec3::new(2, 2, 2));
        assert_eq!(volume.bounding_center(), Vec3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_empty_volume_sentinels() {
        let volume = VoxelVolume::new();
        assert_eq!(volume.bounds(), None);
        assert_eq!(volume.dimension(), IVec3::ZERO);
        assert_eq!(volume.bounding_center(), Vec3::ZERO);
    }

    #[test]
    fn test_display_lists_voxels() {
        let mut volume = VoxelVolume::new();
        volume.add(IVec3::new(0, 1, 2), VoxelType::Male);
        let text = volume.to_string();
        assert!(text.starts_with("VOLUME (1 voxels)"));
        assert!(text.contains("0, 1, 2\tmale"));
    }

    #[test]
    fn test_debug_boxes() {
        let mut volume = VoxelVolume::new();
        volume.add(IVec3::new(1, 0, 2), VoxelType::Female);
        let pose = Pose::from_translation(Vec3::new(0.0, 0.0, 10.0));

        let boxes = volume.debug_boxes(&pose);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].center, Vec3::new(1.0, 0.0, 11.0));
        assert_eq!(boxes[0].half_extents, VOXEL_HALF_EXTENTS);
        assert_eq!(boxes[0].color, Vec3::new(1.0, 0.0, 1.0));
    }
}
