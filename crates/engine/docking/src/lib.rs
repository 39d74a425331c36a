//! Docking crate - clamping-block assemblies for Crossworld-style voxel scenes
//!
//! Blocks carry a half-height voxel footprint (see the `voxel` crate). Rigid
//! groups of blocks form assemblies; when two assemblies touch and their
//! male studs plug into female sockets, the smaller one is merged into the
//! larger one.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  MergeCoordinator                        │
//! ├─────────────────────────────────────────────────────────┤
//! │  Arena of assemblies (stable handles)                   │
//! │  ├── Overlap sets fed by the host                       │
//! │  ├── Per-tick size ordering and tie-break               │
//! │  └── MergeEvent queue for the host                      │
//! ├─────────────────────────────────────────────────────────┤
//! │  Assembly                                                │
//! │  ├── Pose + blocks with grid transforms                 │
//! │  ├── Relative transform snapping                        │
//! │  └── Docking check and merge                            │
//! ├─────────────────────────────────────────────────────────┤
//! │  BlockRegistry                                           │
//! │  ├── Built-in 2x2, 1x4 and 20x20 blocks                 │
//! │  └── TOML-declared block types                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use docking::{MergeCoordinator, glam::Vec3, voxel::Pose};
//!
//! let mut coordinator = MergeCoordinator::default();
//! let bottom = coordinator.spawn("block_2x2", Pose::IDENTITY).unwrap();
//! let top = coordinator
//!     .spawn("block_2x2", Pose::from_translation(Vec3::new(0.0, 0.0, 1.0)))
//!     .unwrap();
//!
//! coordinator.notify_overlap_begin(bottom, top);
//! coordinator.notify_overlap_begin(top, bottom);
//!
//! let events = coordinator.tick(1.0 / 60.0);
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].target, bottom);
//! assert_eq!(coordinator.assembly(bottom).unwrap().block_count(), 2);
//! ```

mod assembly;
mod block;
mod config;
mod coordinator;
mod error;
mod registry;

pub use assembly::{Assembly, DockingReport, MergeOutcome, PlacedBlock, Rejection};
pub use block::{Block, BlockId, MeshRef};
pub use config::DockingConfig;
pub use coordinator::{
    AssemblyHandle, AssemblyState, MergeCoordinator, MergeEvent, MigratedBlock,
};
pub use error::{Error, Result};
pub use registry::{builtin_block_defs, BlockDef, BlockRegistry, BlockTemplate, VoxelSpan};

pub use glam;
pub use voxel;
