use crate::error::{GeometryError, Result};
use crate::geometry::curve::{BezierCurve, BezierLoop};
use crate::math::{Point3, RigidTransform, Vector3, Vector4, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// A rational tensor-product Bezier patch, degree 1 to 3 in each direction.
///
/// Control points are indexed `ctrl[i][j]` with `i` along `u` and `j`
/// along `v`.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierPatch {
    ctrl: Vec<Vec<Point3>>,
    weights: Vec<Vec<f64>>,
}

impl BezierPatch {
    /// Creates a rational patch.
    ///
    /// # Errors
    ///
    /// Returns an error if the control net is not rectangular, if either
    /// degree is outside 1 to 3, or if any weight is not positive.
    pub fn rational(ctrl: Vec<Vec<Point3>>, weights: Vec<Vec<f64>>) -> Result<Self> {
        let rows = ctrl.len();
        let cols = ctrl.first().map_or(0, Vec::len);
        if !(2..=4).contains(&rows) || !(2..=4).contains(&cols) {
            return Err(GeometryError::Degenerate(format!(
                "patch control net must be 2..4 by 2..4, got {rows} by {cols}"
            ))
            .into());
        }
        let rectangular = ctrl.iter().all(|r| r.len() == cols)
            && weights.len() == rows
            && weights.iter().all(|r| r.len() == cols);
        if !rectangular {
            return Err(GeometryError::Degenerate("patch control net is ragged".into()).into());
        }
        if let Some(&w) = weights
            .iter()
            .flatten()
            .find(|w| !(**w > TOLERANCE && w.is_finite()))
        {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "weight",
                value: w,
                min: TOLERANCE,
                max: f64::INFINITY,
            }
            .into());
        }
        Ok(Self { ctrl, weights })
    }

    #[must_use]
    pub fn degree_u(&self) -> usize {
        self.ctrl.len() - 1
    }

    #[must_use]
    pub fn degree_v(&self) -> usize {
        self.ctrl[0].len() - 1
    }

    #[must_use]
    pub fn ctrl(&self, i: usize, j: usize) -> Point3 {
        self.ctrl[i][j]
    }

    #[must_use]
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.weights[i][j]
    }

    /// The row of control points at `u` index `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[Point3] {
        &self.ctrl[i]
    }

    /// The control points at the four parameter-space corners, in the order
    /// `(0,0)`, `(1,0)`, `(1,1)`, `(0,1)`.
    #[must_use]
    pub fn corners(&self) -> [Point3; 4] {
        let nu = self.degree_u();
        let nv = self.degree_v();
        [
            self.ctrl[0][0],
            self.ctrl[nu][0],
            self.ctrl[nu][nv],
            self.ctrl[0][nv],
        ]
    }

    /// The four boundary curves, running `v = 0`, `u = 1`, `v = 1`, `u = 0`
    /// so that the loop winds counter-clockwise about `∂u × ∂v`.
    #[must_use]
    pub fn boundary(&self) -> BezierLoop {
        let nu = self.degree_u();
        let nv = self.degree_v();
        let column = |j: usize| -> (Vec<Point3>, Vec<f64>) {
            (
                self.ctrl.iter().map(|r| r[j]).collect(),
                self.weights.iter().map(|r| r[j]).collect(),
            )
        };
        let (bottom, bottom_w) = column(0);
        let (top, top_w) = column(nv);
        let bottom = BezierCurve::from_parts(bottom, bottom_w);
        let right = BezierCurve::from_parts(self.ctrl[nu].clone(), self.weights[nu].clone());
        let top = BezierCurve::from_parts(top, top_w).reversed();
        let left = BezierCurve::from_parts(self.ctrl[0].clone(), self.weights[0].clone()).reversed();
        BezierLoop::new(vec![bottom, right, top, left])
    }

    #[must_use]
    pub fn transformed(&self, xf: &RigidTransform) -> Self {
        Self {
            ctrl: self
                .ctrl
                .iter()
                .map(|r| r.iter().map(|p| xf * p).collect())
                .collect(),
            weights: self.weights.clone(),
        }
    }

    #[must_use]
    pub fn translated(&self, offset: &Vector3) -> Self {
        Self {
            ctrl: self
                .ctrl
                .iter()
                .map(|r| r.iter().map(|p| p + offset).collect())
                .collect(),
            weights: self.weights.clone(),
        }
    }

    /// Point and both partial derivatives at `(u, v)`.
    #[must_use]
    pub fn point_and_partials(&self, u: f64, v: f64) -> (Point3, Vector3, Vector3) {
        let mut col_pts = Vec::with_capacity(self.ctrl.len());
        let mut col_dv = Vec::with_capacity(self.ctrl.len());
        for (row, wrow) in self.ctrl.iter().zip(&self.weights) {
            let mut hs: Vec<Vector4> = row
                .iter()
                .zip(wrow)
                .map(|(p, &w)| Vector4::new(p.x * w, p.y * w, p.z * w, w))
                .collect();
            let (h, dh) = de_casteljau(&mut hs, v);
            col_pts.push(h);
            col_dv.push(dh);
        }
        let (h, dh_du) = de_casteljau(&mut col_pts, u);
        let (dh_dv, _) = de_casteljau(&mut col_dv, u);

        let w = h.w;
        let p = Vector3::new(h.x, h.y, h.z) / w;
        let pu = (Vector3::new(dh_du.x, dh_du.y, dh_du.z) - p * dh_du.w) / w;
        let pv = (Vector3::new(dh_dv.x, dh_dv.y, dh_dv.z) - p * dh_dv.w) / w;
        (Point3::from(p), pu, pv)
    }

    #[must_use]
    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.point_and_partials(u, v).0
    }
}

/// Evaluates homogeneous control points at `t`, returning value and
/// derivative. Overwrites `pts`.
fn de_casteljau(pts: &mut [Vector4], t: f64) -> (Vector4, Vector4) {
    let n = pts.len() - 1;
    for level in 1..n {
        for i in 0..=(n - level) {
            pts[i] = pts[i] * (1.0 - t) + pts[i + 1] * t;
        }
    }
    if n == 0 {
        return (pts[0], Vector4::zeros());
    }
    let value = pts[0] * (1.0 - t) + pts[1] * t;
    #[allow(clippy::cast_precision_loss)]
    let derivative = (pts[1] - pts[0]) * n as f64;
    (value, derivative)
}

impl Surface for BezierPatch {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        check_unit("u", u)?;
        check_unit("v", v)?;
        Ok(self.point_at(u, v))
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        check_unit("u", u)?;
        check_unit("v", v)?;
        let (_, pu, pv) = self.point_and_partials(u, v);
        let n = pu.cross(&pv);
        let len = n.norm();
        if len < TOLERANCE {
            return Err(GeometryError::Degenerate(format!("patch normal at ({u}, {v})")).into());
        }
        Ok(n / len)
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, 1.0, 0.0, 1.0)
    }
}

fn check_unit(parameter: &'static str, value: f64) -> Result<()> {
    if (-TOLERANCE..=1.0 + TOLERANCE).contains(&value) {
        Ok(())
    } else {
        Err(GeometryError::ParameterOutOfRange {
            parameter,
            value,
            min: 0.0,
            max: 1.0,
        }
        .into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn bilinear() -> BezierPatch {
        BezierPatch::rational(
            vec![
                vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)],
                vec![Point3::new(2.0, 0.0, 0.0), Point3::new(2.0, 0.0, 1.0)],
            ],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn bilinear_evaluation() {
        let patch = bilinear();
        let p = patch.evaluate(0.5, 0.25).unwrap();
        assert_relative_eq!(p, Point3::new(1.0, 0.0, 0.25), epsilon = 1e-12);
        let n = patch.normal(0.5, 0.5).unwrap();
        // pu = +x, pv = +z, so the normal is x × z = -y.
        assert_relative_eq!(n, -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn quarter_cylinder_lies_on_radius() {
        let w = FRAC_1_SQRT_2;
        let patch = BezierPatch::rational(
            vec![
                vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 1.0)],
                vec![Point3::new(1.0, 1.0, 0.0), Point3::new(1.0, 1.0, 1.0)],
                vec![Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 1.0, 1.0)],
            ],
            vec![vec![1.0, 1.0], vec![w, w], vec![1.0, 1.0]],
        )
        .unwrap();
        for i in 0..=4 {
            let p = patch.point_at(f64::from(i) / 4.0, 0.5);
            assert_relative_eq!(p.x.hypot(p.y), 1.0, epsilon = 1e-12);
            assert_relative_eq!(p.z, 0.5, epsilon = 1e-12);
        }
        let n = patch.normal(0.5, 0.5).unwrap();
        assert_relative_eq!(n, Vector3::new(w, w, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn boundary_is_closed() {
        let patch = bilinear();
        let boundary = patch.boundary();
        assert_eq!(boundary.curves.len(), 4);
        assert!(boundary.is_closed(1e-12));
        for pair in boundary.curves.windows(2) {
            assert_eq!(pair[0].finish(), pair[1].start());
        }
    }

    #[test]
    fn ragged_net_is_rejected() {
        let result = BezierPatch::rational(
            vec![
                vec![Point3::origin(), Point3::new(0.0, 0.0, 1.0)],
                vec![Point3::new(1.0, 0.0, 0.0)],
            ],
            vec![vec![1.0, 1.0], vec![1.0]],
        );
        assert!(result.is_err());
    }
}
