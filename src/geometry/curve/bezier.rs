use crate::error::{GeometryError, Result};
use crate::math::{points_equal, Point3, RigidTransform, Vector3, Vector4, TOLERANCE};
use crate::tessellation::TessellationParams;

use super::{Curve, CurveDomain};

/// A rational Bezier curve of degree 1 to 3.
///
/// Parametrized over `t ∈ [0, 1]` with `P(0) = ctrl[0]` and `P(1) = ctrl[n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    ctrl: Vec<Point3>,
    weights: Vec<f64>,
}

impl BezierCurve {
    /// A straight segment from `a` to `b`.
    #[must_use]
    pub fn line(a: Point3, b: Point3) -> Self {
        Self {
            ctrl: vec![a, b],
            weights: vec![1.0, 1.0],
        }
    }

    /// A conic arc `p0 -> p2` whose middle control point `p1` carries weight
    /// `w`. For a circular arc of angle `φ`, `w = cos(φ / 2)`.
    #[must_use]
    pub(crate) fn quadratic_arc(p0: Point3, p1: Point3, p2: Point3, w: f64) -> Self {
        Self::from_parts(vec![p0, p1, p2], vec![1.0, w, 1.0])
    }

    /// Builds a curve from control data already known to be valid.
    pub(crate) fn from_parts(ctrl: Vec<Point3>, weights: Vec<f64>) -> Self {
        debug_assert!((2..=4).contains(&ctrl.len()) && ctrl.len() == weights.len());
        Self { ctrl, weights }
    }

    /// A polynomial Bezier curve with unit weights.
    ///
    /// # Errors
    ///
    /// Returns an error if the control polygon does not describe degree 1 to 3.
    pub fn new(ctrl: Vec<Point3>) -> Result<Self> {
        let weights = vec![1.0; ctrl.len()];
        Self::rational(ctrl, weights)
    }

    /// A rational Bezier curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the degree is not 1 to 3, if the weight count does
    /// not match, or if any weight is not positive.
    pub fn rational(ctrl: Vec<Point3>, weights: Vec<f64>) -> Result<Self> {
        if !(2..=4).contains(&ctrl.len()) {
            return Err(GeometryError::Degenerate(format!(
                "bezier curve needs 2 to 4 control points, got {}",
                ctrl.len()
            ))
            .into());
        }
        if weights.len() != ctrl.len() {
            return Err(GeometryError::Degenerate(format!(
                "{} weights for {} control points",
                weights.len(),
                ctrl.len()
            ))
            .into());
        }
        if let Some(&w) = weights.iter().find(|w| !(**w > TOLERANCE && w.is_finite())) {
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
    pub fn ctrl(&self) -> &[Point3] {
        &self.ctrl
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.ctrl.len() - 1
    }

    #[must_use]
    pub fn start(&self) -> Point3 {
        self.ctrl[0]
    }

    #[must_use]
    pub fn finish(&self) -> Point3 {
        self.ctrl[self.ctrl.len() - 1]
    }

    /// Reverses the direction of travel in place.
    pub fn reverse(&mut self) {
        self.ctrl.reverse();
        self.weights.reverse();
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut c = self.clone();
        c.reverse();
        c
    }

    #[must_use]
    pub fn translated(&self, offset: &Vector3) -> Self {
        Self {
            ctrl: self.ctrl.iter().map(|p| p + offset).collect(),
            weights: self.weights.clone(),
        }
    }

    #[must_use]
    pub fn transformed(&self, xf: &RigidTransform) -> Self {
        Self {
            ctrl: self.ctrl.iter().map(|p| xf * p).collect(),
            weights: self.weights.clone(),
        }
    }

    /// Point and first derivative at `t`, by homogeneous de Casteljau.
    fn point_and_derivative(&self, t: f64) -> (Point3, Vector3) {
        let mut pts: Vec<Vector4> = self
            .ctrl
            .iter()
            .zip(&self.weights)
            .map(|(p, &w)| Vector4::new(p.x * w, p.y * w, p.z * w, w))
            .collect();
        let n = pts.len() - 1;
        for level in 1..n {
            for i in 0..=(n - level) {
                pts[i] = pts[i] * (1.0 - t) + pts[i + 1] * t;
            }
        }
        let q0 = pts[0];
        let q1 = pts[1];
        let h = q0 * (1.0 - t) + q1 * t;
        #[allow(clippy::cast_precision_loss)]
        let dh = (q1 - q0) * n as f64;

        let w = h.w;
        let p = Vector3::new(h.x, h.y, h.z) / w;
        let dp = (Vector3::new(dh.x, dh.y, dh.z) - p * dh.w) / w;
        (Point3::from(p), dp)
    }

    /// Point at `t` without range checks.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        if t <= 0.0 {
            return self.start();
        }
        if t >= 1.0 {
            return self.finish();
        }
        self.point_and_derivative(t).0
    }

    /// Largest distance of an interior control point from the chord.
    fn chord_deviation(&self) -> f64 {
        let a = self.start();
        let b = self.finish();
        let chord = b - a;
        let len = chord.norm();
        self.ctrl[1..self.ctrl.len() - 1]
            .iter()
            .map(|p| {
                let d = p - a;
                if len < TOLERANCE {
                    d.norm()
                } else {
                    d.cross(&chord).norm() / len
                }
            })
            .fold(0.0, f64::max)
    }

    /// Number of straight pieces used to approximate this curve.
    #[must_use]
    pub fn segments(&self, params: &TessellationParams) -> usize {
        if self.degree() == 1 {
            return 1;
        }
        let dev = self.chord_deviation();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = (dev / params.tolerance).sqrt().ceil() as usize;
        n.clamp(params.min_segments, params.max_segments)
    }

    /// Piecewise-linear approximation, including both endpoints.
    #[must_use]
    pub fn pwl(&self, params: &TessellationParams) -> Vec<Point3> {
        let n = self.segments(params);
        #[allow(clippy::cast_precision_loss)]
        (0..=n).map(|i| self.point_at(i as f64 / n as f64)).collect()
    }
}

impl Curve for BezierCurve {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        check_parameter(t)?;
        Ok(self.point_at(t))
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        check_parameter(t)?;
        let (_, d) = self.point_and_derivative(t.clamp(0.0, 1.0));
        let len = d.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(d / len)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(0.0, 1.0)
    }

    fn is_closed(&self) -> bool {
        points_equal(&self.start(), &self.finish(), TOLERANCE)
    }
}

fn check_parameter(t: f64) -> Result<()> {
    if (-TOLERANCE..=1.0 + TOLERANCE).contains(&t) {
        Ok(())
    } else {
        Err(GeometryError::ParameterOutOfRange {
            parameter: "t",
            value: t,
            min: 0.0,
            max: 1.0,
        }
        .into())
    }
}

/// An ordered chain of Bezier curves, each starting where the previous one
/// finishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BezierLoop {
    pub curves: Vec<BezierCurve>,
}

impl BezierLoop {
    #[must_use]
    pub fn new(curves: Vec<BezierCurve>) -> Self {
        Self { curves }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Returns `true` if the last curve finishes at the first curve's start.
    #[must_use]
    pub fn is_closed(&self, eps: f64) -> bool {
        match (self.curves.first(), self.curves.last()) {
            (Some(first), Some(last)) => points_equal(&first.start(), &last.finish(), eps),
            _ => false,
        }
    }

    /// Reverses the loop direction in place.
    pub fn reverse(&mut self) {
        self.curves.reverse();
        for c in &mut self.curves {
            c.reverse();
        }
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut l = self.clone();
        l.reverse();
        l
    }

    #[must_use]
    pub fn translated(&self, offset: &Vector3) -> Self {
        Self::new(self.curves.iter().map(|c| c.translated(offset)).collect())
    }

    #[must_use]
    pub fn transformed(&self, xf: &RigidTransform) -> Self {
        Self::new(self.curves.iter().map(|c| c.transformed(xf)).collect())
    }

    /// Polygon through the loop, without repeating the closing vertex.
    #[must_use]
    pub fn pwl(&self, params: &TessellationParams) -> Vec<Point3> {
        let mut pts = Vec::new();
        for c in &self.curves {
            let seg = c.pwl(params);
            pts.extend_from_slice(&seg[..seg.len() - 1]);
        }
        pts
    }

    /// Returns `true` if every curve is a straight segment.
    #[must_use]
    pub fn is_polygonal(&self) -> bool {
        self.curves.iter().all(|c| c.degree() == 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn quarter_circle() -> BezierCurve {
        BezierCurve::rational(
            vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![1.0, FRAC_1_SQRT_2, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn line_evaluates_linearly() {
        let c = BezierCurve::line(Point3::origin(), Point3::new(2.0, 0.0, 0.0));
        let p = c.evaluate(0.25).unwrap();
        assert_relative_eq!(p, Point3::new(0.5, 0.0, 0.0), epsilon = 1e-12);
        let t = c.tangent(0.5).unwrap();
        assert_relative_eq!(t, Vector3::x(), epsilon = 1e-12);
        assert_eq!(c.degree(), 1);
    }

    #[test]
    fn rational_quadratic_lies_on_circle() {
        let c = quarter_circle();
        for i in 0..=10 {
            let p = c.evaluate(f64::from(i) / 10.0).unwrap();
            assert_relative_eq!(p.coords.norm(), 1.0, epsilon = 1e-12);
        }
        let mid = c.evaluate(0.5).unwrap();
        assert_relative_eq!(mid.x, FRAC_1_SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn tangent_is_perpendicular_on_circle() {
        let c = quarter_circle();
        let p = c.evaluate(0.3).unwrap();
        let t = c.tangent(0.3).unwrap();
        assert_relative_eq!(p.coords.dot(&t), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(BezierCurve::new(vec![Point3::origin()]).is_err());
        assert!(BezierCurve::rational(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            vec![1.0, 0.0]
        )
        .is_err());
        let c = quarter_circle();
        assert!(c.evaluate(1.5).is_err());
    }

    #[test]
    fn reversed_swaps_endpoints() {
        let c = quarter_circle();
        let r = c.reversed();
        assert_eq!(r.start(), c.finish());
        assert_eq!(r.finish(), c.start());
        assert_relative_eq!(r.point_at(0.3), c.point_at(0.7), epsilon = 1e-12);
    }

    #[test]
    fn pwl_respects_segment_bounds() {
        let params = TessellationParams::default();
        let c = quarter_circle();
        let pts = c.pwl(&params);
        assert!(pts.len() > params.min_segments);
        assert_eq!(pts.first(), Some(&c.start()));
        assert_eq!(pts.last(), Some(&c.finish()));

        let line = BezierCurve::line(Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(line.pwl(&params).len(), 2);
    }

    #[test]
    fn loop_closure_and_reverse() {
        let a = Point3::origin();
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let mut l = BezierLoop::new(vec![
            BezierCurve::line(a, b),
            BezierCurve::line(b, c),
            BezierCurve::line(c, a),
        ]);
        assert!(l.is_closed(1e-9));
        assert!(l.is_polygonal());
        assert_eq!(l.pwl(&TessellationParams::default()), vec![a, b, c]);
        l.reverse();
        assert_eq!(l.pwl(&TessellationParams::default()), vec![a, c, b]);
    }
}
