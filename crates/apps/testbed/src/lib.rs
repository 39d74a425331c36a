//! Docking testbed
//!
//! Runs a scripted scene through the merge coordinator without a physics
//! engine: assemblies are placed at fixed poses, contacts are declared up
//! front, and scripted moves stand in for the host's physics step.
//!
//! Scenes are TOML files:
//!
//! ```toml
//! ticks = 3
//! overlaps = [["base", "brick"]]
//!
//! [docking]
//! min_connections = 1
//!
//! [[assemblies]]
//! name = "base"
//! block = "block_20x20"
//!
//! [[assemblies]]
//! name = "brick"
//! block = "block_2x2"
//! position = [3.0, 0.0, 1.0]
//! ```

use anyhow::{bail, Context};
use docking::{AssemblyHandle, DockingConfig, MergeCoordinator, MergeEvent};
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use voxel::{DebugBox, Pose};

/// The bundled stack scene, independent of the working directory
pub fn default_scene_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("scenes")
        .join("stack.toml")
}

fn default_ticks() -> u64 {
    1
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

/// A named single-block assembly placed in the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblySpec {
    pub name: String,
    pub block: String,
    #[serde(default)]
    pub position: [f32; 3],
    /// Heading about +Z in degrees
    #[serde(default)]
    pub yaw: f32,
}

impl AssemblySpec {
    pub fn pose(&self) -> Pose {
        Pose::from_yaw_degrees(self.yaw, Vec3::from_array(self.position))
    }
}

/// Pose change applied before a given tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveSpec {
    /// Tick number (1-based) the move happens before
    pub tick: u64,
    pub name: String,
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
}

/// A docking scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default)]
    pub docking: DockingConfig,
    #[serde(default)]
    pub assemblies: Vec<AssemblySpec>,
    /// Pairs of assembly names that touch for the whole run
    ///
    /// Must precede the first table header in the file.
    #[serde(default)]
    pub overlaps: Vec<[String; 2]>,
    #[serde(default)]
    pub moves: Vec<MoveSpec>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse scene")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Spawn everything and run `ticks` coordinator ticks
    pub fn run(&self) -> anyhow::Result<ScenarioReport> {
        let mut coordinator = MergeCoordinator::from_config(self.docking.clone())
            .context("Invalid docking configuration")?;

        let mut names = BTreeMap::new();
        let mut handles = Vec::with_capacity(self.assemblies.len());
        for entry in &self.assemblies {
            if names.contains_key(entry.name.as_str()) {
                bail!("Duplicate assembly name: {}", entry.name);
            }
            let handle = coordinator
                .spawn(&entry.block, entry.pose())
                .with_context(|| format!("Failed to spawn {}", entry.name))?;
            names.insert(entry.name.as_str(), handle);
            handles.push((entry.name.clone(), handle));
        }

        let lookup = |name: &str| -> anyhow::Result<AssemblyHandle> {
            names
                .get(name)
                .copied()
                .with_context(|| format!("Unknown assembly in scene: {}", name))
        };

        for [a, b] in &self.overlaps {
            let (a, b) = (lookup(a)?, lookup(b)?);
            coordinator.notify_overlap_begin(a, b);
            coordinator.notify_overlap_begin(b, a);
        }

        let mut events = Vec::new();
        for tick in 1..=self.ticks {
            for step in self.moves.iter().filter(|m| m.tick == tick) {
                let pose = Pose::from_yaw_degrees(step.yaw, Vec3::from_array(step.position));
                let handle = lookup(&step.name)?;
                if coordinator.is_live(handle) {
                    coordinator.set_pose(handle, pose)?;
                } else {
                    tracing::warn!("Skipping move of merged assembly {}", step.name);
                }
            }
            let merged = coordinator.tick(self.dt);
            for event in &merged {
                tracing::info!(
                    "Tick {}: {} -> {} ({} block(s))",
                    tick,
                    event.source,
                    event.target,
                    event.blocks.len()
                );
            }
            events.extend(merged);
        }

        let survivors = handles
            .into_iter()
            .filter_map(|(name, handle)| {
                let assembly = coordinator.assembly(handle)?;
                let volume = assembly.aggregate_volume();
                Some(Survivor {
                    name,
                    handle,
                    blocks: assembly.block_count(),
                    dimension: volume.dimension(),
                    layers: volume.layers(),
                    debug_boxes: volume.debug_boxes(assembly.pose()),
                })
            })
            .collect();

        Ok(ScenarioReport {
            ticks: coordinator.tick_count(),
            events,
            survivors,
        })
    }
}

/// A live assembly at the end of a run
#[derive(Debug, Clone)]
pub struct Survivor {
    pub name: String,
    pub handle: AssemblyHandle,
    pub blocks: usize,
    pub dimension: IVec3,
    pub layers: Vec<i32>,
    pub debug_boxes: Vec<DebugBox>,
}

/// Outcome of [`Scenario::run`]
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub ticks: u64,
    pub events: Vec<MergeEvent>,
    pub survivors: Vec<Survivor>,
}

impl ScenarioReport {
    pub fn survivor(&self, name: &str) -> Option<&Survivor> {
        self.survivors.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} tick(s), {} merge(s)", self.ticks, self.events.len())?;
        for event in &self.events {
            writeln!(
                f,
                "  tick {}: {} -> {} at ({}, {}, {}) rot {} with {} connection(s)",
                event.tick,
                event.source,
                event.target,
                event.relative.x,
                event.relative.y,
                event.relative.z,
                event.relative.rotation_degrees(),
                event.connections
            )?;
            for block in &event.blocks {
                writeln!(f, "    {} {} [{}]", block.id, block.block_type, block.mesh)?;
            }
        }
        for survivor in &self.survivors {
            writeln!(
                f,
                "  {} ({}): {} block(s), extent {}, layers {:?}",
                survivor.name, survivor.handle, survivor.blocks, survivor.dimension, survivor.layers
            )?;
        }
        Ok(())
    }
}
