use crate::error::{OperationError, Result};
use crate::math::{Point3, Quaternion, RigidTransform, Vector3, TOLERANCE};

/// Rotation by `angle` radians about the axis through `center` along `axis`.
///
/// The rotation part is `R` and the translation part is `c - R c`, so that
/// `p ↦ c + R (p - c)` and the center is a fixed point.
///
/// # Errors
///
/// Returns an error if the axis direction is zero-length.
pub fn rotation_about(center: &Point3, axis: &Vector3, angle: f64) -> Result<RigidTransform> {
    let len = axis.norm();
    if len < TOLERANCE {
        return Err(OperationError::InvalidInput("rotation axis must be non-zero".into()).into());
    }
    let axis = nalgebra::Unit::new_unchecked(axis / len);
    let rotation = Quaternion::from_axis_angle(&axis, angle);
    let shift = center.coords - rotation * center.coords;
    Ok(RigidTransform::from_parts(shift.into(), rotation))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn rotate_90_around_z_at_origin() {
        let xf = rotation_about(&Point3::origin(), &Vector3::z(), FRAC_PI_2).unwrap();
        assert_relative_eq!(xf * Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn center_is_fixed() {
        let c = Point3::new(3.0, -2.0, 1.5);
        for angle in [0.3, FRAC_PI_2, PI, -1.1] {
            let xf = rotation_about(&c, &Vector3::new(1.0, 1.0, 0.0), angle).unwrap();
            assert_relative_eq!(xf * c, c, epsilon = 1e-12);
        }
    }

    #[test]
    fn matches_centered_rotation() {
        let c = Point3::new(1.0, 1.0, 0.0);
        let xf = rotation_about(&c, &Vector3::z(), PI).unwrap();
        // c + R(p - c) with p = (2, 1, 0) -> (0, 1, 0)
        assert_relative_eq!(xf * Point3::new(2.0, 1.0, 0.0), Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn zero_axis_returns_error() {
        assert!(rotation_about(&Point3::origin(), &Vector3::zeros(), 1.0).is_err());
    }
}
