use std::f64::consts::{FRAC_PI_2, TAU};

use crate::error::{OperationError, Result};
use crate::geometry::surface::{BezierPatch, Plane};
use crate::geometry::{BezierCurve, BezierLoop};
use crate::loops::BezierLoopSet;
use crate::math::{Point3, Quaternion, Vector3, TOLERANCE};
use crate::operations::transform::rotation_about;
use crate::topology::{FaceData, Shell};

/// Sweeps a loop set about an axis into a shell.
///
/// Each boundary curve and each quarter-turn (or smaller) step of the sweep
/// becomes one rational patch, quadratic along the sweep. A partial sweep
/// is closed by two planar caps, which come first in the shell.
pub struct Revolve<'a> {
    loops: &'a BezierLoopSet,
    axis_point: Point3,
    axis_dir: Vector3,
    angle: f64,
}

impl<'a> Revolve<'a> {
    /// Creates a new `Revolve` operation. Angles beyond a full turn are
    /// clamped to a full turn.
    #[must_use]
    pub fn new(loops: &'a BezierLoopSet, axis_point: Point3, axis_dir: Vector3, angle: f64) -> Self {
        Self {
            loops,
            axis_point,
            axis_dir,
            angle,
        }
    }

    /// Executes the revolution.
    ///
    /// An empty loop set gives an empty shell.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the axis is zero, the
    /// angle is not positive, or the profile plane does not sweep any
    /// volume about the axis.
    pub fn execute(&self) -> Result<Shell> {
        let axis_len = self.axis_dir.norm();
        if axis_len < TOLERANCE {
            return Err(OperationError::InvalidInput("revolve axis has zero length".into()).into());
        }
        if self.angle.is_nan() || self.angle <= TOLERANCE {
            return Err(OperationError::InvalidInput(format!(
                "revolve angle must be positive, got {}",
                self.angle
            ))
            .into());
        }
        if self.loops.is_empty() {
            return Ok(Shell::default());
        }

        let axis = self.axis_dir / axis_len;
        let full = self.angle >= TAU - TOLERANCE;
        let angle = self.angle.min(TAU);

        let side = self.sweep_side(&axis);
        if side.abs() < TOLERANCE {
            return Err(OperationError::InvalidInput(
                "profile does not sweep any volume about the axis".into(),
            )
            .into());
        }

        // The profile must turn counter-clockwise about the sweep direction
        // for the patches to face outward.
        let (normal, profile): (Vector3, Vec<BezierLoop>) = if side > 0.0 {
            (self.loops.normal, self.loops.loops.clone())
        } else {
            (
                -self.loops.normal,
                self.loops.loops.iter().map(BezierLoop::reversed).collect(),
            )
        };

        let mut faces = Vec::new();
        if !full {
            let start = Plane::from_normal(self.loops.point, -normal)?;
            faces.push(FaceData::planar(
                start,
                profile.iter().map(BezierLoop::reversed).collect(),
            ));

            let xf = rotation_about(&self.axis_point, &axis, angle)?;
            let end = Plane::from_normal(xf * self.loops.point, xf * normal)?;
            faces.push(FaceData::planar(
                end,
                profile.iter().map(|l| l.transformed(&xf)).collect(),
            ));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = ((angle / FRAC_PI_2) - 1e-9).ceil().max(1.0) as usize;
        for curve in profile.iter().flat_map(|l| l.curves.iter()) {
            for patch in self.sweep_curve(curve, &axis, angle, steps, full)? {
                faces.push(FaceData::patch(patch));
            }
        }

        Ok(Shell::new(faces))
    }

    /// The signed component of the sweep direction along the profile
    /// normal, taken at the control point farthest from the axis.
    fn sweep_side(&self, axis: &Vector3) -> f64 {
        self.loops
            .iter_curves()
            .flat_map(|c| c.ctrl().iter())
            .map(|p| self.loops.normal.dot(&axis.cross(&(p - self.axis_point))))
            .fold(0.0, |best: f64, s| if s.abs() > best.abs() { s } else { best })
    }

    fn sweep_curve(
        &self,
        curve: &BezierCurve,
        axis: &Vector3,
        angle: f64,
        steps: usize,
        full: bool,
    ) -> Result<Vec<BezierPatch>> {
        #[allow(clippy::cast_precision_loss)]
        let phi = angle / steps as f64;
        let half = phi * 0.5;
        let w_mid = half.cos();

        // Boundary columns at every step angle, shared by neighbouring
        // patches so their edges coincide exactly.
        let columns: Vec<Vec<Point3>> = (0..=steps)
            .map(|k| {
                if k == 0 || (full && k == steps) {
                    return curve.ctrl().to_vec();
                }
                #[allow(clippy::cast_precision_loss)]
                let rot = Quaternion::from_scaled_axis(axis * (phi * k as f64));
                curve
                    .ctrl()
                    .iter()
                    .map(|p| self.axis_point + rot * (p - self.axis_point))
                    .collect()
            })
            .collect();

        let mut patches = Vec::with_capacity(steps);
        for k in 0..steps {
            #[allow(clippy::cast_precision_loss)]
            let rot_mid = Quaternion::from_scaled_axis(axis * (phi * k as f64 + half));
            let mut ctrl = Vec::with_capacity(curve.ctrl().len());
            let mut weights = Vec::with_capacity(curve.ctrl().len());
            for (i, (p, w)) in curve.ctrl().iter().zip(curve.weights()).enumerate() {
                let rel = p - self.axis_point;
                let along = axis * axis.dot(&rel);
                let radial = rel - along;
                let mid = self.axis_point + along + rot_mid * radial / w_mid;
                ctrl.push(vec![columns[k][i], mid, columns[k + 1][i]]);
                weights.push(vec![*w, w * w_mid, *w]);
            }
            patches.push(BezierPatch::rational(ctrl, weights)?);
        }
        Ok(patches)
    }
}
