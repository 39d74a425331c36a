//! Continuous rigid transforms

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Continuous rigid transform (rotation then translation)
///
/// Composition follows glam's matrix convention: `a * b` applies `b` first,
/// then `a`. A pose expressing "child relative to parent" therefore composes
/// as `parent * child`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Orientation
    pub rotation: Quat,
    /// Position
    pub translation: Vec3,
}

impl Pose {
    /// The identity pose
    pub const IDENTITY: Pose = Pose {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Create a pose from rotation and translation
    pub fn new(rotation: Quat, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Create a pure translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation,
        }
    }

    /// Create a pose rotated about +Z by `yaw` degrees
    pub fn from_yaw_degrees(yaw: f32, translation: Vec3) -> Self {
        Self {
            rotation: Quat::from_rotation_z(yaw.to_radians()),
            translation,
        }
    }

    /// Inverse transform
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            rotation,
            translation: rotation * -self.translation,
        }
    }

    /// Transform a point from local into parent space
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    /// Rotate a direction (translation is ignored)
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    /// Planar heading in degrees, in [-180, 180]
    ///
    /// Rotates +X by the pose rotation, drops the Z component and measures
    /// the angle in the XY plane. A degenerate projection yields 0.
    pub fn yaw_degrees(&self) -> f32 {
        let forward = self.rotation * Vec3::X;
        let planar = Vec3::new(forward.x, forward.y, 0.0).normalize_or_zero();
        planar.y.atan2(planar.x).to_degrees()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            rotation: (self.rotation * rhs.rotation).normalize(),
            translation: self.rotation * rhs.translation + self.translation,
        }
    }
}
