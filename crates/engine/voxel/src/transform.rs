//! Quantized block transforms
//!
//! A [`BlockTransform`] is the only kind of transform the docking grid can
//! apply exactly: integer translation (z in half units) and yaw in quarter
//! turns. Continuous poses are snapped onto it with
//! [`BlockTransform::quantize`].

use crate::{Error, Pose, Result};
use glam::{IVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Yaw rotation of a block, restricted to quarter turns about +Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockRotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl BlockRotation {
    /// Rotation from a number of counter-clockwise quarter turns (wraps)
    pub fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => BlockRotation::Rotate0,
            1 => BlockRotation::Rotate90,
            2 => BlockRotation::Rotate180,
            _ => BlockRotation::Rotate270,
        }
    }

    /// Number of quarter turns in 0..4
    pub fn quarter_turns(self) -> i32 {
        match self {
            BlockRotation::Rotate0 => 0,
            BlockRotation::Rotate90 => 1,
            BlockRotation::Rotate180 => 2,
            BlockRotation::Rotate270 => 3,
        }
    }

    /// Rotation in degrees (0, 90, 180 or 270)
    pub fn degrees(self) -> i32 {
        self.quarter_turns() * 90
    }

    /// Exact rotation from degrees; any multiple of 90 is accepted and wrapped
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(Error::InvalidRotation(degrees));
        }
        Ok(Self::from_quarter_turns(degrees / 90))
    }

    /// Snap a continuous yaw onto the nearest quarter turn
    ///
    /// The yaw is wrapped into [0, 360) and bucketed with half-open
    /// intervals: [45, 135) is 90, [135, 225) is 180, [225, 315) is 270 and
    /// everything else is 0.
    pub fn from_yaw_degrees(yaw: f32) -> Self {
        let yaw = yaw.rem_euclid(360.0);
        if (45.0..135.0).contains(&yaw) {
            BlockRotation::Rotate90
        } else if (135.0..225.0).contains(&yaw) {
            BlockRotation::Rotate180
        } else if (225.0..315.0).contains(&yaw) {
            BlockRotation::Rotate270
        } else {
            BlockRotation::Rotate0
        }
    }

    /// Apply `self`, then `other`
    pub fn then(self, other: BlockRotation) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }

    /// Rotation undoing `self`
    pub fn inverse(self) -> Self {
        Self::from_quarter_turns(-self.quarter_turns())
    }

    /// Rotate the XY components of a grid coordinate; z is untouched
    pub fn rotate(self, v: IVec3) -> IVec3 {
        match self {
            BlockRotation::Rotate0 => v,
            BlockRotation::Rotate90 => IVec3::new(-v.y, v.x, v.z),
            BlockRotation::Rotate180 => IVec3::new(-v.x, -v.y, v.z),
            BlockRotation::Rotate270 => IVec3::new(v.y, -v.x, v.z),
        }
    }

    /// Continuous rotation about +Z
    pub fn to_quat(self) -> Quat {
        Quat::from_rotation_z((self.degrees() as f32).to_radians())
    }
}

/// Discrete transform of a block within an assembly
///
/// Translation is in voxel units: x and y are whole units, z is half units
/// (a physical z offset of 1.0 is `z == 2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockTransform {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub rotation: BlockRotation,
}

impl BlockTransform {
    /// The identity transform
    pub const IDENTITY: BlockTransform = BlockTransform {
        x: 0,
        y: 0,
        z: 0,
        rotation: BlockRotation::Rotate0,
    };

    /// Create a transform from its components
    pub fn new(x: i32, y: i32, z: i32, rotation: BlockRotation) -> Self {
        Self { x, y, z, rotation }
    }

    /// Pure translation in voxel units
    pub fn from_offset(offset: IVec3) -> Self {
        Self::new(offset.x, offset.y, offset.z, BlockRotation::Rotate0)
    }

    /// Translation part in voxel units
    pub fn offset(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Nearest representable transform to a continuous pose
    ///
    /// Only the planar heading of the rotation survives. x and y are rounded
    /// to whole units, z is doubled before rounding. This is lossy: feeding
    /// the result through [`BlockTransform::to_pose`] does not in general
    /// give back the input.
    pub fn quantize(pose: &Pose) -> Self {
        let t = pose.translation;
        Self {
            x: t.x.round() as i32,
            y: t.y.round() as i32,
            z: (t.z * 2.0).round() as i32,
            rotation: BlockRotation::from_yaw_degrees(pose.yaw_degrees()),
        }
    }

    /// Continuous pose of this transform
    pub fn to_pose(&self) -> Pose {
        Pose::new(
            self.rotation.to_quat(),
            Vec3::new(self.x as f32, self.y as f32, self.z as f32 / 2.0),
        )
    }

    /// Rotation in degrees
    pub fn rotation_degrees(&self) -> i32 {
        self.rotation.degrees()
    }

    /// Map a grid coordinate: rotate XY, then translate
    pub fn apply(&self, v: IVec3) -> IVec3 {
        self.rotation.rotate(v) + self.offset()
    }

    /// Apply `self`, then `outer`
    ///
    /// Used to re-express a block placed in one assembly in the space of
    /// another: `local.then(relative)`.
    pub fn then(&self, outer: &BlockTransform) -> Self {
        let offset = outer.apply(self.offset());
        Self {
            x: offset.x,
            y: offset.y,
            z: offset.z,
            rotation: self.rotation.then(outer.rotation),
        }
    }

    /// Transform undoing `self`
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        let offset = rotation.rotate(-self.offset());
        Self {
            x: offset.x,
            y: offset.y,
            z: offset.z,
            rotation,
        }
    }
}
