//! Conversions between the host engine's math types (`glam`) and the physics
//! engine's (`nalgebra`, as re-exported by Rapier).
//!
//! All conversions are total and allocation free. Both sides are `Copy` value
//! types, so results are returned by value instead of written into scratch
//! destinations.

use glam::{Quat, Vec3};
use nalgebra as na;

#[inline]
pub fn vector_to_na(v: Vec3) -> na::Vector3<f32> {
    na::Vector3::new(v.x, v.y, v.z)
}

#[inline]
pub fn vector_from_na(v: &na::Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn point_to_na(p: Vec3) -> na::Point3<f32> {
    na::Point3::new(p.x, p.y, p.z)
}

#[inline]
pub fn point_from_na(p: &na::Point3<f32>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

/// Convert a host quaternion into a nalgebra unit quaternion.
///
/// The input is renormalized; unit inputs come through unchanged.
#[inline]
pub fn rotation_to_na(q: Quat) -> na::UnitQuaternion<f32> {
    // nalgebra's storage order is (i, j, k, w); `Quaternion::new` takes w first.
    na::UnitQuaternion::from_quaternion(na::Quaternion::new(q.w, q.x, q.y, q.z))
}

#[inline]
pub fn rotation_from_na(q: &na::UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

/// A rigid placement (position + orientation) in host math types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    #[inline]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[inline]
    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Convert to a nalgebra `Isometry3` for use with Rapier queries.
    #[inline]
    pub fn to_isometry(&self) -> na::Isometry3<f32> {
        na::Isometry3::from_parts(
            na::Translation3::from(vector_to_na(self.position)),
            rotation_to_na(self.rotation),
        )
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Pose> for na::Isometry3<f32> {
    fn from(pose: Pose) -> Self {
        pose.to_isometry()
    }
}

impl From<&na::Isometry3<f32>> for Pose {
    fn from(iso: &na::Isometry3<f32>) -> Self {
        Self {
            position: vector_from_na(&iso.translation.vector),
            rotation: rotation_from_na(&iso.rotation),
        }
    }
}
