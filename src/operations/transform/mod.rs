mod rotate;

pub use rotate::rotation_about;

use crate::math::{Quaternion, RigidTransform, Vector3};
use crate::mesh::Mesh;
use crate::topology::Shell;

/// Solids that can be moved by a rigid transform.
pub trait Transform {
    /// Returns a transformed copy; face tags are carried over unchanged.
    #[must_use]
    fn transformed(&self, xf: &RigidTransform) -> Self;
}

impl Transform for Shell {
    fn transformed(&self, xf: &RigidTransform) -> Self {
        Shell::transformed(self, xf)
    }
}

impl Transform for Mesh {
    fn transformed(&self, xf: &RigidTransform) -> Self {
        Mesh::transformed(self, xf)
    }
}

/// A pure translation.
#[must_use]
pub fn translation(offset: &Vector3) -> RigidTransform {
    RigidTransform::translation(offset.x, offset.y, offset.z)
}

/// Rotation by `rotation` about the origin followed by a move by `offset`.
#[must_use]
pub fn placement(offset: &Vector3, rotation: &Quaternion) -> RigidTransform {
    RigidTransform::from_parts(translation(offset).translation, *rotation)
}
