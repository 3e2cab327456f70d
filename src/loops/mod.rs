//! Assembly of a group's sketch curves into closed, oriented loops.

use std::collections::VecDeque;

use tracing::warn;

use crate::config::EvalConfig;
use crate::geometry::{BezierCurve, BezierLoop, Plane};
use crate::group::GroupHandle;
use crate::math::intersect_2d::{segment_segment_contact_2d, SegmentContact};
use crate::math::polygon_3d::{newell_normal, project_to_uv, signed_area_2d, winding_number_2d};
use crate::math::{points_equal, Point2, Point3, Vector3};
use crate::sketch::Sketch;
use crate::tessellation::TessellationParams;

/// Outcome of loop assembly, with a diagnostic location on failure.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PolygonError {
    #[default]
    Good,
    /// A curve endpoint has no partner; `a` is the dangling end, `b` the
    /// start of the chain it belongs to.
    NotClosed { a: Point3, b: Point3 },
    NotCoplanar { at: Point3 },
    SelfIntersecting { at: Point3 },
}

impl PolygonError {
    #[must_use]
    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }
}

/// Closed loops sharing one plane, oriented so that outer boundaries wind
/// counter-clockwise about `normal` and holes clockwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BezierLoopSet {
    pub loops: Vec<BezierLoop>,
    pub normal: Vector3,
    /// A point on the loops' plane.
    pub point: Point3,
}

impl BezierLoopSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn iter_curves(&self) -> impl Iterator<Item = &BezierCurve> {
        self.loops.iter().flat_map(|l| l.curves.iter())
    }
}

/// Result of assembling one group's curves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopAssembly {
    pub loops: BezierLoopSet,
    /// Piecewise-linear contours matching `loops`, one per loop.
    pub polygon: Vec<Vec<Point3>>,
    pub all_closed: bool,
    pub error: PolygonError,
}

impl LoopAssembly {
    fn failed(error: PolygonError, all_closed: bool) -> Self {
        Self {
            loops: BezierLoopSet::default(),
            polygon: Vec::new(),
            all_closed,
            error,
        }
    }
}

/// Links curves into closed loops and classifies the result.
pub struct AssembleLoops {
    length_eps: f64,
    params: TessellationParams,
}

impl AssembleLoops {
    /// Creates a new `AssembleLoops` operation.
    #[must_use]
    pub fn new(config: &EvalConfig) -> Self {
        Self {
            length_eps: config.length_eps,
            params: config.tessellation,
        }
    }

    /// Assembles the non-construction curves that `group` owns in `sketch`.
    ///
    /// Entities whose geometry cannot be converted are skipped with a
    /// warning, which usually leaves the profile open.
    #[must_use]
    pub fn for_group(&self, sketch: &Sketch, group: GroupHandle) -> LoopAssembly {
        let mut curves = Vec::new();
        for (id, entity) in sketch.entities_of(group) {
            if entity.construction {
                continue;
            }
            match entity.bezier_curves() {
                Ok(c) => curves.extend(c),
                Err(e) => warn!(%group, ?id, error = %e, "skipping degenerate sketch entity"),
            }
        }
        self.execute(curves)
    }

    /// Classifies `curves` as not closed, not coplanar, self-intersecting,
    /// or good, in that order of precedence. Only a good result keeps its
    /// loops.
    #[must_use]
    pub fn execute(&self, curves: Vec<BezierCurve>) -> LoopAssembly {
        if curves.is_empty() {
            return LoopAssembly {
                all_closed: true,
                ..LoopAssembly::default()
            };
        }

        let mut loops = match link_curves(curves, self.length_eps) {
            Ok(loops) => loops,
            Err((a, b)) => {
                return LoopAssembly::failed(PolygonError::NotClosed { a, b }, false);
            }
        };

        let mut polygon: Vec<Vec<Point3>> = loops.iter().map(|l| l.pwl(&self.params)).collect();
        let point = polygon[0][0];

        // A contour whose signed area cancels out (a figure eight) still
        // spans a plane; fall back to any three non-collinear vertices.
        let normal = polygon
            .iter()
            .find_map(|c| newell_normal(c))
            .or_else(|| spanning_normal(&polygon, self.length_eps));
        let Some(normal) = normal else {
            return LoopAssembly::failed(PolygonError::SelfIntersecting { at: point }, true);
        };

        for p in polygon.iter().flatten() {
            if (p - point).dot(&normal).abs() > self.length_eps {
                return LoopAssembly::failed(PolygonError::NotCoplanar { at: *p }, true);
            }
        }

        let Ok(plane) = Plane::from_normal(point, normal) else {
            return LoopAssembly::failed(PolygonError::NotCoplanar { at: point }, true);
        };
        let projected: Vec<Vec<Point2>> = polygon
            .iter()
            .map(|c| c.iter().map(|p| project_to_uv(p, &plane)).collect())
            .collect();

        if let Some(at) = first_self_intersection(&projected, self.length_eps) {
            return LoopAssembly::failed(
                PolygonError::SelfIntersecting {
                    at: plane.origin() + plane.u_dir() * at.x + plane.v_dir() * at.y,
                },
                true,
            );
        }

        fix_contour_directions(&mut loops, &mut polygon, &projected);

        LoopAssembly {
            loops: BezierLoopSet {
                loops,
                normal,
                point,
            },
            polygon,
            all_closed: true,
            error: PolygonError::Good,
        }
    }
}

/// Greedily chains curves end to start. A curve that only matches by its
/// finish is reversed. On failure returns the dangling end and the start of
/// its chain.
fn link_curves(
    curves: Vec<BezierCurve>,
    eps: f64,
) -> std::result::Result<Vec<BezierLoop>, (Point3, Point3)> {
    let mut remaining: VecDeque<BezierCurve> = curves.into();
    let mut loops = Vec::new();

    while let Some(first) = remaining.pop_front() {
        let start = first.start();
        let mut hanging = first.finish();
        let mut chain = vec![first];

        while !points_equal(&hanging, &start, eps) {
            let next = remaining.iter().position(|c| {
                points_equal(&c.start(), &hanging, eps) || points_equal(&c.finish(), &hanging, eps)
            });
            let Some(i) = next else {
                return Err((hanging, start));
            };
            let Some(mut c) = remaining.remove(i) else {
                return Err((hanging, start));
            };
            if !points_equal(&c.start(), &hanging, eps) {
                c.reverse();
            }
            hanging = c.finish();
            chain.push(c);
        }
        loops.push(BezierLoop::new(chain));
    }
    Ok(loops)
}

/// Normal of the plane through the first vertex and two others that are not
/// collinear with it.
fn spanning_normal(polygon: &[Vec<Point3>], eps: f64) -> Option<Vector3> {
    let mut pts = polygon.iter().flatten();
    let origin = *pts.next()?;
    let mut first_dir: Option<Vector3> = None;
    for p in pts {
        let d = p - origin;
        match first_dir {
            None if d.norm() > eps => first_dir = Some(d),
            Some(u) => {
                let n = u.cross(&d);
                if n.norm() > eps * u.norm() {
                    return Some(n.normalize());
                }
            }
            None => {}
        }
    }
    None
}

/// Finds the first place where the projected contours cross or overlap
/// themselves or each other.
fn first_self_intersection(contours: &[Vec<Point2>], eps: f64) -> Option<Point2> {
    let edges: Vec<(usize, usize, Point2, Point2)> = contours
        .iter()
        .enumerate()
        .flat_map(|(ci, c)| {
            let n = c.len();
            (0..n).map(move |i| (ci, i, c[i], c[(i + 1) % n]))
        })
        .collect();

    for (k, &(ci, i, a0, a1)) in edges.iter().enumerate() {
        let len_i = contours[ci].len();
        for &(cj, j, b0, b1) in &edges[k + 1..] {
            let adjacent = ci == cj && (j == i + 1 || (i == 0 && j + 1 == len_i));
            match segment_segment_contact_2d(&a0, &a1, &b0, &b1, eps) {
                SegmentContact::None => {}
                SegmentContact::Overlap { at } => return Some(at),
                SegmentContact::Point { at, t, u } => {
                    if adjacent {
                        continue;
                    }
                    let la = (a1 - a0).norm();
                    let lb = (b1 - b0).norm();
                    let interior_a = t * la > eps && (1.0 - t) * la > eps;
                    let interior_b = u * lb > eps && (1.0 - u) * lb > eps;
                    if interior_a || interior_b {
                        return Some(at);
                    }
                }
            }
        }
    }
    None
}

/// Orients loops by nesting depth: even depth counter-clockwise about the
/// normal, odd depth clockwise.
fn fix_contour_directions(
    loops: &mut [BezierLoop],
    polygon: &mut [Vec<Point3>],
    projected: &[Vec<Point2>],
) {
    for (i, contour) in projected.iter().enumerate() {
        let probe = interior_probe(contour);
        let depth = projected
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != i && winding_number_2d(&probe, other) != 0)
            .count();
        let ccw = signed_area_2d(contour) > 0.0;
        let want_ccw = depth % 2 == 0;
        if ccw != want_ccw {
            loops[i].reverse();
            polygon[i] = reversed_contour(&polygon[i]);
        }
    }
}

/// Reverses a closed contour while keeping its first vertex, matching the
/// vertex order of the reversed Bezier loop.
fn reversed_contour(contour: &[Point3]) -> Vec<Point3> {
    let mut out = Vec::with_capacity(contour.len());
    if let Some((first, rest)) = contour.split_first() {
        out.push(*first);
        out.extend(rest.iter().rev());
    }
    out
}

/// A point on the contour's first edge, used to test containment in other
/// (non-crossing) contours.
fn interior_probe(contour: &[Point2]) -> Point2 {
    match contour {
        [a, b, ..] => nalgebra::center(a, b),
        [a] => *a,
        [] => Point2::origin(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_3d::signed_area_2d;

    fn assembler() -> AssembleLoops {
        AssembleLoops::new(&EvalConfig::default())
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64, z: f64) -> Vec<BezierCurve> {
        let p = [
            Point3::new(x0, y0, z),
            Point3::new(x1, y0, z),
            Point3::new(x1, y1, z),
            Point3::new(x0, y1, z),
        ];
        (0..4).map(|i| BezierCurve::line(p[i], p[(i + 1) % 4])).collect()
    }

    #[test]
    fn empty_input_is_good() {
        let out = assembler().execute(Vec::new());
        assert!(out.all_closed);
        assert_eq!(out.error, PolygonError::Good);
        assert!(out.loops.is_empty());
    }

    #[test]
    fn links_shuffled_and_reversed_curves() {
        let mut curves = rect(0.0, 0.0, 2.0, 1.0, 0.0);
        curves.swap(1, 3);
        curves[2] = curves[2].reversed();
        let out = assembler().execute(curves);
        assert_eq!(out.error, PolygonError::Good);
        assert_eq!(out.loops.loops.len(), 1);
        let l = &out.loops.loops[0];
        for pair in l.curves.windows(2) {
            assert!(points_equal(&pair[0].finish(), &pair[1].start(), 1e-9));
        }
        assert!(l.is_closed(1e-9));
    }

    #[test]
    fn open_chain_reports_dangling_segment() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let out = assembler().execute(vec![BezierCurve::line(a, b)]);
        assert!(!out.all_closed);
        assert_eq!(out.error, PolygonError::NotClosed { a: b, b: a });
        assert!(out.loops.is_empty());
    }

    #[test]
    fn loops_in_different_planes() {
        let mut curves = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        curves.extend(rect(3.0, 0.0, 4.0, 1.0, 1.0));
        let out = assembler().execute(curves);
        assert!(out.all_closed);
        assert!(matches!(out.error, PolygonError::NotCoplanar { .. }));
        assert!(out.loops.is_empty());
    }

    #[test]
    fn bow_tie_self_intersects() {
        let p = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let curves = (0..4).map(|i| BezierCurve::line(p[i], p[(i + 1) % 4])).collect();
        let out = assembler().execute(curves);
        match out.error {
            PolygonError::SelfIntersecting { at } => {
                assert!((at - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-9);
            }
            other => panic!("expected self-intersection, got {other:?}"),
        }
    }

    #[test]
    fn collinear_loop_is_rejected() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let out = assembler().execute(vec![BezierCurve::line(a, b), BezierCurve::line(b, a)]);
        assert!(out.all_closed);
        assert!(matches!(out.error, PolygonError::SelfIntersecting { .. }));
    }

    #[test]
    fn hole_is_oriented_opposite_to_outer() {
        let mut curves = rect(0.0, 0.0, 4.0, 4.0, 0.0);
        // Hole drawn with the same winding as the outer boundary.
        curves.extend(rect(1.0, 1.0, 2.0, 2.0, 0.0));
        let out = assembler().execute(curves);
        assert_eq!(out.error, PolygonError::Good);
        let plane = Plane::from_normal(out.loops.point, out.loops.normal).unwrap();
        let areas: Vec<f64> = out
            .polygon
            .iter()
            .map(|c| {
                let uv: Vec<Point2> = c.iter().map(|p| project_to_uv(p, &plane)).collect();
                signed_area_2d(&uv)
            })
            .collect();
        assert!(areas[0] > 0.0);
        assert!(areas[1] < 0.0);
    }

    #[test]
    fn circle_sketch_forms_one_loop() {
        let mut sketch = Sketch::new();
        let g = GroupHandle(1);
        sketch.add_circle(g, Point3::origin(), Vector3::z(), 2.0);
        let out = assembler().for_group(&sketch, g);
        assert_eq!(out.error, PolygonError::Good);
        assert_eq!(out.loops.loops.len(), 1);
        assert_eq!(out.loops.loops[0].curves.len(), 4);
        assert!(out.loops.normal.z.abs() > 0.999);
    }
}
