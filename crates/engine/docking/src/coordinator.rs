//! Merge coordinator
//!
//! Owns every assembly in the scene and decides, once per tick, which
//! touching pairs merge. The host reports physical contacts through
//! [`MergeCoordinator::notify_overlap_begin`] /
//! [`MergeCoordinator::notify_overlap_end`] and applies the returned
//! [`MergeEvent`]s to its own scene graph.
//!
//! A tick walks live assemblies in handle order. For each touching pair,
//! whichever side recorded the contact, the larger assembly absorbs the
//! smaller one; on equal size the lower handle survives. A failed merge leaves the pair touching so it is
//! retried on the next tick.

use crate::{Assembly, BlockId, BlockRegistry, DockingConfig, Error, MeshRef, Result};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use voxel::{BlockTransform, Pose};

/// Stable handle of an assembly; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssemblyHandle(pub u32);

impl AssemblyHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AssemblyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "assembly#{}", self.0)
    }
}

/// Lifecycle state of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    Live,
    /// Merged into `target` during tick `tick`
    MergedInto { target: AssemblyHandle, tick: u64 },
    Despawned,
}

/// A block that moved to another assembly
#[derive(Debug, Clone, PartialEq)]
pub struct MigratedBlock {
    pub id: BlockId,
    pub block_type: String,
    pub mesh: MeshRef,
    /// Placement inside the target assembly
    pub transform: BlockTransform,
    /// World pose after the move
    pub pose: Pose,
}

/// Emitted for every successful merge
///
/// The host destroys the source's representation and re-parents each
/// block visual under the target.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeEvent {
    pub source: AssemblyHandle,
    pub target: AssemblyHandle,
    /// Tick counter at the time of the merge (0 for merges outside a tick)
    pub tick: u64,
    /// Snapped transform of the source in the target's grid
    pub relative: BlockTransform,
    pub connections: u32,
    pub blocks: Vec<MigratedBlock>,
}

#[derive(Debug)]
struct Entry {
    assembly: Assembly,
    overlaps: BTreeSet<AssemblyHandle>,
}

#[derive(Debug)]
enum Slot {
    Live(Entry),
    MergedInto { target: AssemblyHandle, tick: u64 },
    Despawned,
}

/// Scene-level owner of assemblies and their contacts
#[derive(Debug)]
pub struct MergeCoordinator {
    config: DockingConfig,
    registry: BlockRegistry,
    slots: Vec<Slot>,
    next_block_id: u64,
    tick: u64,
    elapsed: f32,
    pending: Vec<MergeEvent>,
}

impl Default for MergeCoordinator {
    fn default() -> Self {
        Self::new(BlockRegistry::with_builtin(), DockingConfig::default())
    }
}

impl MergeCoordinator {
    pub fn new(registry: BlockRegistry, config: DockingConfig) -> Self {
        Self {
            config,
            registry,
            slots: Vec::new(),
            next_block_id: 1,
            tick: 0,
            elapsed: 0.0,
            pending: Vec::new(),
        }
    }

    /// Coordinator with the registry described by `config`
    pub fn from_config(config: DockingConfig) -> Result<Self> {
        let registry = config.build_registry()?;
        Ok(Self::new(registry, config))
    }

    pub fn config(&self) -> &DockingConfig {
        &self.config
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Spawn a single-block assembly of a registered type
    pub fn spawn(&mut self, block_type: &str, pose: Pose) -> Result<AssemblyHandle> {
        let id = BlockId(self.next_block_id);
        let block = self.registry.instantiate(block_type, id)?;
        self.spawn_assembly(Assembly::new(block, pose))
    }

    /// Take ownership of an assembly built elsewhere
    ///
    /// Assemblies without blocks, including ones emptied by
    /// [`Assembly::merge_to`], are refused.
    pub fn spawn_assembly(&mut self, assembly: Assembly) -> Result<AssemblyHandle> {
        if assembly.is_merge_removed() || assembly.block_count() == 0 {
            return Err(Error::EmptyAssembly);
        }
        let max_id = assembly.blocks().map(|b| b.block.id().0).max().unwrap_or(0);
        self.next_block_id = self.next_block_id.max(max_id + 1);

        let handle = AssemblyHandle(self.slots.len() as u32);
        tracing::debug!(
            "Spawned {} with {} block(s)",
            handle,
            assembly.block_count()
        );
        self.slots.push(Slot::Live(Entry {
            assembly,
            overlaps: BTreeSet::new(),
        }));
        Ok(handle)
    }

    /// Remove a live assembly and forget its contacts
    pub fn despawn(&mut self, handle: AssemblyHandle) -> Result<Assembly> {
        let entry = self
            .take_live(handle, Slot::Despawned)
            .ok_or(Error::UnknownAssembly(handle))?;
        self.forget(handle);
        tracing::debug!("Despawned {}", handle);
        Ok(entry.assembly)
    }

    pub fn state(&self, handle: AssemblyHandle) -> Option<AssemblyState> {
        self.slots.get(handle.index()).map(|slot| match slot {
            Slot::Live(_) => AssemblyState::Live,
            Slot::MergedInto { target, tick } => AssemblyState::MergedInto {
                target: *target,
                tick: *tick,
            },
            Slot::Despawned => AssemblyState::Despawned,
        })
    }

    pub fn is_live(&self, handle: AssemblyHandle) -> bool {
        self.entry(handle).is_some()
    }

    /// Follow merges until reaching a live assembly
    ///
    /// `None` if the chain ends in a despawned slot.
    pub fn resolve(&self, mut handle: AssemblyHandle) -> Option<AssemblyHandle> {
        loop {
            match self.slots.get(handle.index())? {
                Slot::Live(_) => return Some(handle),
                Slot::MergedInto { target, .. } => handle = *target,
                Slot::Despawned => return None,
            }
        }
    }

    pub fn assembly(&self, handle: AssemblyHandle) -> Option<&Assembly> {
        self.entry(handle).map(|entry| &entry.assembly)
    }

    pub fn pose(&self, handle: AssemblyHandle) -> Option<Pose> {
        self.assembly(handle).map(|a| *a.pose())
    }

    /// Update a pose after the host's physics step
    pub fn set_pose(&mut self, handle: AssemblyHandle, pose: Pose) -> Result<()> {
        let entry = self
            .entry_mut(handle)
            .ok_or(Error::UnknownAssembly(handle))?;
        entry.assembly.set_pose(pose);
        Ok(())
    }

    /// Live handles in ascending order
    pub fn live_handles(&self) -> Vec<AssemblyHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Slot::Live(_)))
            .map(|(i, _)| AssemblyHandle(i as u32))
            .collect()
    }

    /// Number of live assemblies
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assemblies `handle` currently touches
    pub fn overlaps(&self, handle: AssemblyHandle) -> Vec<AssemblyHandle> {
        self.entry(handle)
            .map(|entry| entry.overlaps.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Size metric used to pick the surviving assembly
    pub fn size_of(&self, handle: AssemblyHandle) -> Option<f32> {
        self.assembly(handle).map(Assembly::volume_metric)
    }

    /// Record that `a` started touching `b`
    ///
    /// Directed: the host reports each side separately. Self-contacts and
    /// dead handles are ignored.
    pub fn notify_overlap_begin(&mut self, a: AssemblyHandle, b: AssemblyHandle) {
        if a == b || !self.is_live(b) {
            return;
        }
        if let Some(entry) = self.entry_mut(a) {
            if entry.overlaps.insert(b) {
                tracing::trace!("{} overlaps {}", a, b);
            }
        }
    }

    /// Record that `a` stopped touching `b`
    pub fn notify_overlap_end(&mut self, a: AssemblyHandle, b: AssemblyHandle) {
        if let Some(entry) = self.entry_mut(a) {
            if entry.overlaps.remove(&b) {
                tracing::trace!("{} no longer overlaps {}", a, b);
            }
        }
    }

    /// Merge `source` into `target`
    ///
    /// Returns `false` without side effects for equal or dead handles and
    /// when the docking check fails.
    pub fn merge(&mut self, source: AssemblyHandle, target: AssemblyHandle) -> bool {
        if source == target {
            return false;
        }
        let min_connections = self.config.required_connections();
        let (Some(src_slot), Some(dst_slot)) = self.pair_mut(source, target) else {
            return false;
        };
        let (Slot::Live(src), Slot::Live(dst)) = (src_slot, dst_slot) else {
            return false;
        };

        let outcome = match src.assembly.merge_into(&mut dst.assembly, min_connections) {
            Ok(outcome) => outcome,
            Err(rejection) => {
                tracing::trace!("{} cannot dock onto {}: {}", source, target, rejection);
                return false;
            }
        };

        let blocks = outcome
            .moved
            .iter()
            .filter_map(|id| {
                let placed = dst.assembly.block(*id)?;
                Some(MigratedBlock {
                    id: *id,
                    block_type: placed.block.block_type().to_string(),
                    mesh: placed.block.mesh().clone(),
                    transform: placed.transform,
                    pose: dst.assembly.block_world_pose(*id)?,
                })
            })
            .collect::<Vec<_>>();

        let tick = self.tick;
        let Some(removed) = self.take_live(source, Slot::MergedInto { target, tick }) else {
            return false;
        };

        self.forget(source);
        if self.config.transfer_overlaps {
            self.transfer_overlaps(source, target, removed.overlaps);
        }

        tracing::info!(
            "Merged {} into {} ({} block(s), {} connection(s))",
            source,
            target,
            blocks.len(),
            outcome.connections
        );

        self.pending.push(MergeEvent {
            source,
            target,
            tick,
            relative: outcome.relative,
            connections: outcome.connections,
            blocks,
        });
        true
    }

    /// Evaluate all touching pairs once
    ///
    /// Returns the merges performed during this tick together with any
    /// queued by direct [`MergeCoordinator::merge`] calls since the last one.
    pub fn tick(&mut self, dt: f32) -> Vec<MergeEvent> {
        self.tick += 1;
        self.elapsed += dt;

        for index in 0..self.slots.len() {
            let a = AssemblyHandle(index as u32);
            let Some(entry) = self.entry(a) else {
                continue;
            };
            let touching: Vec<AssemblyHandle> = entry.overlaps.iter().copied().collect();

            // A contact recorded on either side is enough to try the pair
            for b in touching {
                let Some(size_a) = self.size_of(a) else {
                    break;
                };
                let Some(size_b) = self.size_of(b) else {
                    continue;
                };
                let (source, target) = match size_a.total_cmp(&size_b) {
                    Ordering::Greater => (b, a),
                    Ordering::Less => (a, b),
                    Ordering::Equal => (a.max(b), a.min(b)),
                };
                self.merge(source, target);
            }
        }

        let events = std::mem::take(&mut self.pending);
        if !events.is_empty() {
            tracing::debug!(
                "Tick {}: {} merge(s), {} live assemblies",
                self.tick,
                events.len(),
                self.len()
            );
        }
        events
    }

    /// Number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Sum of all `dt` passed to [`MergeCoordinator::tick`]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn entry(&self, handle: AssemblyHandle) -> Option<&Entry> {
        match self.slots.get(handle.index())? {
            Slot::Live(entry) => Some(entry),
            _ => None,
        }
    }

    fn entry_mut(&mut self, handle: AssemblyHandle) -> Option<&mut Entry> {
        match self.slots.get_mut(handle.index())? {
            Slot::Live(entry) => Some(entry),
            _ => None,
        }
    }

    /// Replace a live slot and hand back its entry; other slots stay as they are
    fn take_live(&mut self, handle: AssemblyHandle, replacement: Slot) -> Option<Entry> {
        let slot = self.slots.get_mut(handle.index())?;
        match std::mem::replace(slot, replacement) {
            Slot::Live(entry) => Some(entry),
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Disjoint mutable access to two distinct slots
    fn pair_mut(
        &mut self,
        a: AssemblyHandle,
        b: AssemblyHandle,
    ) -> (Option<&mut Slot>, Option<&mut Slot>) {
        let (i, j) = (a.index(), b.index());
        if i == j || i >= self.slots.len() || j >= self.slots.len() {
            return (None, None);
        }
        if i < j {
            let (low, high) = self.slots.split_at_mut(j);
            (Some(&mut low[i]), Some(&mut high[0]))
        } else {
            let (low, high) = self.slots.split_at_mut(i);
            (Some(&mut high[0]), Some(&mut low[j]))
        }
    }

    /// Drop `handle` from every overlap set
    fn forget(&mut self, handle: AssemblyHandle) {
        for slot in &mut self.slots {
            if let Slot::Live(entry) = slot {
                entry.overlaps.remove(&handle);
            }
        }
    }

    /// Contacts of a merged-away assembly now belong to its survivor
    fn transfer_overlaps(
        &mut self,
        source: AssemblyHandle,
        target: AssemblyHandle,
        overlaps: BTreeSet<AssemblyHandle>,
    ) {
        for other in overlaps {
            if other == target || other == source || !self.is_live(other) {
                continue;
            }
            if let Some(entry) = self.entry_mut(target) {
                entry.overlaps.insert(other);
            }
            if let Some(entry) = self.entry_mut(other) {
                entry.overlaps.insert(target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn stacked() -> (MergeCoordinator, AssemblyHandle, AssemblyHandle) {
        let mut coordinator = MergeCoordinator::default();
        let bottom = coordinator
            .spawn("block_2x2", Pose::from_translation(Vec3::ZERO))
            .unwrap();
        let top = coordinator
            .spawn("block_2x2", Pose::from_translation(Vec3::new(0.0, 0.0, 1.0)))
            .unwrap();
        (coordinator, bottom, top)
    }

    #[test]
    fn test_spawn_assigns_handles_and_block_ids() {
        let (coordinator, bottom, top) = stacked();
        assert_eq!(bottom, AssemblyHandle(0));
        assert_eq!(top, AssemblyHandle(1));
        assert_eq!(coordinator.len(), 2);

        let ids: Vec<_> = [bottom, top]
            .iter()
            .flat_map(|h| coordinator.assembly(*h).unwrap().blocks())
            .map(|b| b.block.id())
            .collect();
        assert_eq!(ids, vec![BlockId(1), BlockId(2)]);
    }

    #[test]
    fn test_spawn_unknown_type() {
        let mut coordinator = MergeCoordinator::default();
        assert!(matches!(
            coordinator.spawn("block_9x9", Pose::IDENTITY),
            Err(Error::UnknownBlockType(_))
        ));
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_overlap_bookkeeping() {
        let (mut coordinator, bottom, top) = stacked();
        coordinator.notify_overlap_begin(bottom, bottom);
        coordinator.notify_overlap_begin(bottom, AssemblyHandle(42));
        assert!(coordinator.overlaps(bottom).is_empty());

        coordinator.notify_overlap_begin(bottom, top);
        coordinator.notify_overlap_begin(bottom, top);
        assert_eq!(coordinator.overlaps(bottom), vec![top]);
        assert!(coordinator.overlaps(top).is_empty());

        coordinator.notify_overlap_end(bottom, top);
        assert!(coordinator.overlaps(bottom).is_empty());
    }

    #[test]
    fn test_tick_merges_stack() {
        let (mut coordinator, bottom, top) = stacked();
        coordinator.notify_overlap_begin(bottom, top);
        coordinator.notify_overlap_begin(top, bottom);

        let events = coordinator.tick(1.0 / 60.0);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.source, top);
        assert_eq!(event.target, bottom);
        assert_eq!(event.tick, 1);
        assert_eq!(event.connections, 4);
        assert_eq!(event.blocks.len(), 1);
        assert_eq!(event.blocks[0].id, BlockId(2));
        assert_eq!(event.blocks[0].block_type, "block_2x2");

        assert_eq!(
            coordinator.state(top),
            Some(AssemblyState::MergedInto {
                target: bottom,
                tick: 1
            })
        );
        assert_eq!(coordinator.resolve(top), Some(bottom));
        assert!(coordinator.overlaps(bottom).is_empty());
        assert_eq!(coordinator.assembly(bottom).unwrap().block_count(), 2);

        // Nothing left to merge
        assert!(coordinator.tick(1.0 / 60.0).is_empty());
        assert_eq!(coordinator.tick_count(), 2);
    }

    #[test]
    fn test_merge_rejects_dead_and_equal_handles() {
        let (mut coordinator, bottom, top) = stacked();
        assert!(!coordinator.merge(bottom, bottom));
        assert!(!coordinator.merge(AssemblyHandle(7), bottom));

        assert!(coordinator.merge(top, bottom));
        assert!(!coordinator.merge(top, bottom));
        assert!(!coordinator.merge(bottom, top));
        assert_eq!(coordinator.assembly(bottom).unwrap().block_count(), 2);

        // Direct merges are reported on the next tick
        let events = coordinator.tick(0.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tick, 0);
    }

    #[test]
    fn test_despawn_forgets_contacts() {
        let (mut coordinator, bottom, top) = stacked();
        coordinator.notify_overlap_begin(bottom, top);
        let removed = coordinator.despawn(top).unwrap();
        assert_eq!(removed.block_count(), 1);

        assert!(coordinator.overlaps(bottom).is_empty());
        assert_eq!(coordinator.state(top), Some(AssemblyState::Despawned));
        assert_eq!(coordinator.resolve(top), None);
        assert!(matches!(
            coordinator.despawn(top),
            Err(Error::UnknownAssembly(_))
        ));
        assert!(matches!(
            coordinator.set_pose(top, Pose::IDENTITY),
            Err(Error::UnknownAssembly(_))
        ));
    }

    #[test]
    fn test_overlaps_transfer_to_survivor() {
        let mut coordinator = MergeCoordinator::default();
        let bottom = coordinator.spawn("block_2x2", Pose::IDENTITY).unwrap();
        let top = coordinator
            .spawn("block_2x2", Pose::from_translation(Vec3::new(0.0, 0.0, 1.0)))
            .unwrap();
        let far = coordinator
            .spawn("block_2x2", Pose::from_translation(Vec3::new(30.0, 0.0, 0.0)))
            .unwrap();
        coordinator.notify_overlap_begin(top, far);
        coordinator.notify_overlap_begin(far, top);

        assert!(coordinator.merge(top, bottom));
        assert_eq!(coordinator.overlaps(bottom), vec![far]);
        assert_eq!(coordinator.overlaps(far), vec![bottom]);
    }

    #[test]
    fn test_overlap_transfer_disabled() {
        let config = DockingConfig {
            transfer_overlaps: false,
            ..DockingConfig::default()
        };
        let mut coordinator = MergeCoordinator::from_config(config).unwrap();
        let bottom = coordinator.spawn("block_2x2", Pose::IDENTITY).unwrap();
        let top = coordinator
            .spawn("block_2x2", Pose::from_translation(Vec3::new(0.0, 0.0, 1.0)))
            .unwrap();
        let far = coordinator
            .spawn("block_2x2", Pose::from_translation(Vec3::new(30.0, 0.0, 0.0)))
            .unwrap();
        coordinator.notify_overlap_begin(far, top);

        assert!(coordinator.merge(top, bottom));
        assert!(coordinator.overlaps(bottom).is_empty());
        assert!(coordinator.overlaps(far).is_empty());
    }

    #[test]
    fn test_despawn_keeps_merged_state() {
        let (mut coordinator, bottom, top) = stacked();
        assert!(coordinator.merge(top, bottom));

        assert!(matches!(
            coordinator.despawn(top),
            Err(Error::UnknownAssembly(_))
        ));
        assert_eq!(
            coordinator.state(top),
            Some(AssemblyState::MergedInto {
                target: bottom,
                tick: 0
            })
        );
        assert_eq!(coordinator.resolve(top), Some(bottom));
    }

    #[test]
    fn test_spawn_assembly_refuses_merged_away() {
        let registry = BlockRegistry::with_builtin();
        let mut top = Assembly::new(
            registry.instantiate("block_2x2", BlockId(1)).unwrap(),
            Pose::from_translation(Vec3::new(0.0, 0.0, 1.0)),
        );
        let mut bottom = Assembly::new(
            registry.instantiate("block_2x2", BlockId(2)).unwrap(),
            Pose::IDENTITY,
        );
        assert!(top.merge_to(&mut bottom));

        let mut coordinator = MergeCoordinator::default();
        assert!(matches!(
            coordinator.spawn_assembly(top),
            Err(Error::EmptyAssembly)
        ));
        assert!(coordinator.is_empty());

        let handle = coordinator.spawn_assembly(bottom).unwrap();
        assert_eq!(coordinator.assembly(handle).unwrap().block_count(), 2);
    }
}
