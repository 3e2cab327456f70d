use crate::error::{GeometryError, Result};
use crate::math::{Point3, RigidTransform, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// An infinite oriented plane.
///
/// `P(u, v) = origin + u * u_dir + v * v_dir`, with `u_dir × v_dir = normal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane through `origin` facing `normal`.
    ///
    /// The in-plane basis is derived from the normal, so two planes built
    /// from the same normal share the same UV frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        let reference = if normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u_dir = reference.cross(&normal).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    #[must_use]
    pub fn transformed(&self, xf: &RigidTransform) -> Self {
        Self {
            origin: xf * self.origin,
            u_dir: xf * self.u_dir,
            v_dir: xf * self.v_dir,
            normal: xf * self.normal,
        }
    }
}

impl Surface for Plane {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(self.origin + self.u_dir * u + self.v_dir * v)
    }

    fn normal(&self, _u: f64, _v: f64) -> Result<Vector3> {
        Ok(self.normal)
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn basis_is_right_handed() {
        for n in [Vector3::x(), Vector3::y(), Vector3::z(), Vector3::new(1.0, 2.0, 3.0)] {
            let plane = Plane::from_normal(Point3::origin(), n).unwrap();
            let cross = plane.u_dir().cross(plane.v_dir());
            assert_relative_eq!(cross, *plane.plane_normal(), epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert!(Plane::from_normal(Point3::origin(), Vector3::zeros()).is_err());
    }
}
