//! Assemblies of docked blocks
//!
//! An [`Assembly`] is a rigid group of blocks sharing one pose. Two
//! assemblies can merge when, after snapping the smaller one onto the larger
//! one's grid, none of their voxels collide and at least one male voxel
//! plugs into a female voxel.

use crate::{Block, BlockId};
use glam::{IVec3, Vec3};
use std::collections::BTreeMap;
use std::fmt;
use voxel::{BlockRotation, BlockTransform, Pose, VoxelType, VoxelVolume};

/// A block together with its placement inside an assembly
#[derive(Debug, Clone)]
pub struct PlacedBlock {
    pub block: Block,
    pub transform: BlockTransform,
}

/// Why a docking attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// One of the assemblies was already merged away
    MergeRemoved,
    /// A source voxel lands on an occupied target cell
    Overlap { at: IVec3, target: VoxelType },
    /// A blocking voxel lands directly on a male voxel
    BlockingOnMale { at: IVec3 },
    /// A female voxel sits on something other than male or free
    FemaleMismatch { at: IVec3, below: VoxelType },
    /// A male voxel sits under something other than female or free
    MaleMismatch { at: IVec3, above: VoxelType },
    /// Geometry fits but too few studs connect
    TooFewConnections { found: u32, required: u32 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MergeRemoved => write!(f, "assembly already merged away"),
            Rejection::Overlap { at, target } => write!(f, "overlaps {target} voxel at {at}"),
            Rejection::BlockingOnMale { at } => write!(f, "blocking voxel on male at {at}"),
            Rejection::FemaleMismatch { at, below } => {
                write!(f, "female voxel at {at} above {below}")
            }
            Rejection::MaleMismatch { at, above } => write!(f, "male voxel at {at} below {above}"),
            Rejection::TooFewConnections { found, required } => {
                write!(f, "{found} connections, {required} required")
            }
        }
    }
}

/// Outcome of evaluating one assembly against another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockingReport {
    /// Snapped transform of the source in the target's grid
    pub transform: BlockTransform,
    /// Male/female pairs counted before the check stopped
    pub connections: u32,
    pub rejection: Option<Rejection>,
}

impl DockingReport {
    pub fn is_mergable(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Result of a successful merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Transform of the merged-away assembly in the survivor's grid
    pub relative: BlockTransform,
    pub connections: u32,
    /// Blocks that moved, in their previous order
    pub moved: Vec<BlockId>,
}

/// A rigid group of blocks
#[derive(Debug, Clone)]
pub struct Assembly {
    pose: Pose,
    blocks: BTreeMap<BlockId, PlacedBlock>,
    merge_removed: bool,
}

impl Assembly {
    /// Assembly holding a single block at the identity transform
    pub fn new(block: Block, pose: Pose) -> Self {
        let mut blocks = BTreeMap::new();
        blocks.insert(
            block.id(),
            PlacedBlock {
                block,
                transform: BlockTransform::IDENTITY,
            },
        );
        Self {
            pose,
            blocks,
            merge_removed: false,
        }
    }

    /// Assembly from pre-placed blocks; `None` when there are none
    pub fn from_blocks(
        blocks: impl IntoIterator<Item = (Block, BlockTransform)>,
        pose: Pose,
    ) -> Option<Self> {
        let blocks: BTreeMap<_, _> = blocks
            .into_iter()
            .map(|(block, transform)| (block.id(), PlacedBlock { block, transform }))
            .collect();
        if blocks.is_empty() {
            return None;
        }
        Some(Self {
            pose,
            blocks,
            merge_removed: false,
        })
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Blocks in id order
    pub fn blocks(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.blocks.values()
    }

    pub fn block(&self, id: BlockId) -> Option<&PlacedBlock> {
        self.blocks.get(&id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Whether this assembly has been merged into another one
    ///
    /// A merged-away assembly holds no blocks and refuses further merges.
    pub fn is_merge_removed(&self) -> bool {
        self.merge_removed
    }

    /// World pose of a block
    pub fn block_world_pose(&self, id: BlockId) -> Option<Pose> {
        self.blocks
            .get(&id)
            .map(|placed| self.pose * placed.transform.to_pose())
    }

    /// Union of all block footprints in assembly space
    pub fn aggregate_volume(&self) -> VoxelVolume {
        let mut volume = VoxelVolume::new();
        for placed in self.blocks.values() {
            volume.add_volume(placed.block.volume(), &placed.transform);
        }
        volume
    }

    /// Bounding box extent of the aggregate volume, in cells
    pub fn dimension(&self) -> IVec3 {
        self.aggregate_volume().dimension()
    }

    /// Physical volume of the bounding box (z cells count half)
    ///
    /// Used to decide which of two touching assemblies absorbs the other.
    /// An empty assembly measures zero.
    pub fn volume_metric(&self) -> f32 {
        let dim = self.dimension();
        dim.x as f32 * dim.y as f32 * (dim.z as f32 / 2.0)
    }

    /// Best-fitting grid transform of `self` in the space of `other`
    ///
    /// Takes the continuous delta between the two poses, keeps only its
    /// heading snapped to a quarter turn, and rotates about the block centre
    /// rather than its corner so a slightly skewed assembly does not jump by
    /// a whole cell. Collisions and connections are not checked here.
    pub fn relative_transform_to(&self, other: &Assembly) -> BlockTransform {
        let delta = other.pose.inverse() * self.pose;
        let rotation = BlockRotation::from_yaw_degrees(delta.yaw_degrees());

        // Half extent in x/y; a quarter in z since z cells are half height
        let dim = self.dimension().as_vec3();
        let offset = Vec3::new(dim.x / 2.0, dim.y / 2.0, dim.z / 4.0);

        let location =
            rotation.to_quat() * -offset + delta.translation + delta.rotation * offset;

        // Snap to whole units; z then becomes an even number of half steps
        let snapped = location.round();
        BlockTransform::new(
            snapped.x as i32,
            snapped.y as i32,
            (snapped.z * 2.0) as i32,
            rotation,
        )
    }

    /// Evaluate docking of `self` onto `other` without mutating either
    pub fn docking_report(&self, other: &Assembly, min_connections: u32) -> DockingReport {
        let transform = self.relative_transform_to(other);
        let mut report = DockingReport {
            transform,
            connections: 0,
            rejection: None,
        };

        if self.merge_removed || other.merge_removed {
            report.rejection = Some(Rejection::MergeRemoved);
            return report;
        }

        let source = self.aggregate_volume().transform_to(&transform);
        let target = other.aggregate_volume();

        for (at, kind) in source.iter() {
            let occupied = target.get(at);
            if occupied.is_occupied() {
                report.rejection = Some(Rejection::Overlap {
                    at,
                    target: occupied,
                });
                return report;
            }

            match kind {
                VoxelType::Blocking => {
                    if target.get(at - IVec3::Z) == VoxelType::Male {
                        report.rejection = Some(Rejection::BlockingOnMale { at });
                        return report;
                    }
                }
                VoxelType::Female => match target.get(at - IVec3::Z) {
                    VoxelType::Male => report.connections += 1,
                    VoxelType::Free => {}
                    below => {
                        report.rejection = Some(Rejection::FemaleMismatch { at, below });
                        return report;
                    }
                },
                VoxelType::Male => match target.get(at + IVec3::Z) {
                    VoxelType::Female => report.connections += 1,
                    VoxelType::Free => {}
                    above => {
                        report.rejection = Some(Rejection::MaleMismatch { at, above });
                        return report;
                    }
                },
                VoxelType::Free => {}
            }
        }

        let required = min_connections.max(1);
        if report.connections < required {
            report.rejection = Some(Rejection::TooFewConnections {
                found: report.connections,
                required,
            });
        }
        report
    }

    /// Check whether `self` can dock onto `other` at their current poses
    pub fn is_mergable_to(&self, other: &Assembly) -> bool {
        self.docking_report(other, 1).is_mergable()
    }

    /// Move every block of `self` into `other`
    ///
    /// Returns `false` and leaves both untouched when either side is already
    /// merged away or the docking check fails. On success `self` is flagged
    /// as merge-removed, holds no blocks, and must be discarded.
    pub fn merge_to(&mut self, other: &mut Assembly) -> bool {
        self.merge_into(other, 1).is_ok()
    }

    /// [`Assembly::merge_to`] with a custom connection threshold
    ///
    /// Reports why the merge was refused instead of a bare `false`.
    pub fn merge_into(
        &mut self,
        other: &mut Assembly,
        min_connections: u32,
    ) -> std::result::Result<MergeOutcome, Rejection> {
        let report = self.docking_report(other, min_connections);
        if let Some(rejection) = report.rejection {
            return Err(rejection);
        }

        self.merge_removed = true;
        let relative = report.transform;
        let blocks = std::mem::take(&mut self.blocks);
        let mut moved = Vec::with_capacity(blocks.len());

        for (id, placed) in blocks {
            let transform = placed.transform.then(&relative);
            other.blocks.insert(
                id,
                PlacedBlock {
                    block: placed.block,
                    transform,
                },
            );
            moved.push(id);
        }

        Ok(MergeOutcome {
            relative,
            connections: report.connections,
            moved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockRegistry;

    fn plate(registry: &BlockRegistry, id: u64, position: Vec3) -> Assembly {
        let block = registry.instantiate("block_2x2", BlockId(id)).unwrap();
        Assembly::new(block, Pose::from_translation(position))
    }

    #[test]
    fn test_single_block_metrics() {
        let registry = BlockRegistry::with_builtin();
        let a = plate(&registry, 1, Vec3::ZERO);
        assert_eq!(a.block_count(), 1);
        assert_eq!(a.dimension(), IVec3::new(2, 2, 2));
        assert_eq!(a.volume_metric(), 4.0);
        assert!(!a.is_merge_removed());
    }

    #[test]
    fn test_from_blocks_rejects_empty() {
        assert!(Assembly::from_blocks(Vec::new(), Pose::IDENTITY).is_none());
    }

    #[test]
    fn test_relative_transform_stacked() {
        let registry = BlockRegistry::with_builtin();
        let top = plate(&registry, 1, Vec3::new(0.2, -0.3, 1.1));
        let bottom = plate(&registry, 2, Vec3::ZERO);

        let t = top.relative_transform_to(&bottom);
        assert_eq!(t, BlockTransform::new(0, 0, 2, BlockRotation::Rotate0));

        let t = bottom.relative_transform_to(&top);
        assert_eq!(t, BlockTransform::new(0, 0, -2, BlockRotation::Rotate0));
    }

    #[test]
    fn test_relative_transform_turned() {
        let registry = BlockRegistry::with_builtin();
        // Almost a quarter turn, sitting one unit up
        let top = Assembly::new(
            registry.instantiate("block_2x2", BlockId(1)).unwrap(),
            Pose::from_yaw_degrees(88.0, Vec3::new(1.0, 0.0, 1.0)),
        );
        let bottom = plate(&registry, 2, Vec3::ZERO);

        let t = top.relative_transform_to(&bottom);
        assert_eq!(t.rotation, BlockRotation::Rotate90);
        assert_eq!((t.x, t.y, t.z), (1, 0, 2));

        // Grid rotation maps the turned footprint back onto the bottom plate
        let footprint = top.aggregate_volume().transform_to(&t);
        for x in 0..2 {
            for y in 0..2 {
                assert_eq!(footprint.get(IVec3::new(x, y, 2)), VoxelType::Female);
            }
        }
        assert!(top.is_mergable_to(&bottom));
    }

    #[test]
    fn test_report_counts_connections() {
        let registry = BlockRegistry::with_builtin();
        let top = plate(&registry, 1, Vec3::new(0.0, 0.0, 1.0));
        let bottom = plate(&registry, 2, Vec3::ZERO);

        let report = top.docking_report(&bottom, 1);
        assert_eq!(report.connections, 4);
        assert!(report.is_mergable());

        let strict = top.docking_report(&bottom, 5);
        assert_eq!(
            strict.rejection,
            Some(Rejection::TooFewConnections {
                found: 4,
                required: 5
            })
        );
    }

    #[test]
    fn test_overlap_rejected() {
        let registry = BlockRegistry::with_builtin();
        let a = plate(&registry, 1, Vec3::new(1.0, 0.0, 0.0));
        let b = plate(&registry, 2, Vec3::ZERO);

        let report = a.docking_report(&b, 1);
        assert!(matches!(report.rejection, Some(Rejection::Overlap { .. })));
        assert!(!a.is_mergable_to(&b));
    }

    #[test]
    fn test_offset_stack_connects_partially() {
        let registry = BlockRegistry::with_builtin();
        // Shifted by one stud: only two studs overlap
        let top = plate(&registry, 1, Vec3::new(1.0, 0.0, 1.0));
        let bottom = plate(&registry, 2, Vec3::ZERO);

        let report = top.docking_report(&bottom, 1);
        assert_eq!(report.connections, 2);
        assert!(report.is_mergable());
    }

    #[test]
    fn test_merge_moves_blocks() {
        let registry = BlockRegistry::with_builtin();
        let mut top = plate(&registry, 1, Vec3::new(0.0, 0.0, 1.0));
        let mut bottom = plate(&registry, 2, Vec3::ZERO);

        let outcome = top.merge_into(&mut bottom, 1).unwrap();
        assert_eq!(outcome.moved, vec![BlockId(1)]);
        assert_eq!(outcome.connections, 4);

        assert!(top.is_merge_removed());
        assert_eq!(top.block_count(), 0);
        assert_eq!(bottom.block_count(), 2);
        assert_eq!(
            bottom.block(BlockId(1)).unwrap().transform,
            BlockTransform::new(0, 0, 2, BlockRotation::Rotate0)
        );
        assert_eq!(bottom.aggregate_volume().layers(), vec![0, 1, 2, 3]);

        // A merged-away assembly never merges again
        assert!(!top.merge_to(&mut bottom));
        assert_eq!(bottom.block_count(), 2);
    }

    #[test]
    fn test_failed_merge_leaves_both_untouched() {
        let registry = BlockRegistry::with_builtin();
        let mut a = plate(&registry, 1, Vec3::new(5.0, 0.0, 0.0));
        let mut b = plate(&registry, 2, Vec3::ZERO);

        assert!(!a.merge_to(&mut b));
        assert!(!a.is_merge_removed());
        assert_eq!(a.block_count(), 1);
        assert_eq!(b.block_count(), 1);
    }

    #[test]
    fn test_block_world_pose() {
        let registry = BlockRegistry::with_builtin();
        let mut top = plate(&registry, 1, Vec3::new(10.0, 0.0, 1.0));
        let mut bottom = plate(&registry, 2, Vec3::new(10.0, 0.0, 0.0));
        assert!(top.merge_to(&mut bottom));

        let pose = bottom.block_world_pose(BlockId(1)).unwrap();
        assert!((pose.translation - Vec3::new(10.0, 0.0, 1.0)).length() < 1e-5);
    }
}
