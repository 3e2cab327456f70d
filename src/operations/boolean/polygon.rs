//! Convex-or-not planar polygons that remember which face they came from.

use crate::identity::FaceTag;
use crate::math::{Point3, Vector3};
use crate::math::polygon_3d::newell_normal;

/// Distance below which a vertex counts as lying on a splitting plane.
pub(super) const PLANE_EPS: f64 = 1e-7;

/// A splitting plane `normal · p = w`; the front side is where
/// `normal · p > w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct SplitPlane {
    pub normal: Vector3,
    pub w: f64,
}

impl SplitPlane {
    fn distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.w
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }
}

/// A planar polygon, counter-clockwise about `plane.normal`.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct TaggedPolygon {
    pub vertices: Vec<Point3>,
    pub plane: SplitPlane,
    pub tag: FaceTag,
}

impl TaggedPolygon {
    /// Builds a polygon from its vertices, or `None` if they enclose no area.
    pub fn new(vertices: Vec<Point3>, tag: FaceTag) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let normal = newell_normal(&vertices)?;
        let w = normal.dot(&vertices[0].coords);
        Some(Self {
            vertices,
            plane: SplitPlane { normal, w },
            tag,
        })
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }

    /// Fan triangulation, exact for the convex pieces the splitter produces.
    pub fn fan(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        (1..self.vertices.len().saturating_sub(1))
            .map(|i| [self.vertices[0], self.vertices[i], self.vertices[i + 1]])
    }
}

/// Where a polygon lies relative to a splitting plane.
#[derive(Debug, Default)]
pub(super) struct SplitResult {
    pub coplanar_front: Vec<TaggedPolygon>,
    pub coplanar_back: Vec<TaggedPolygon>,
    pub front: Vec<TaggedPolygon>,
    pub back: Vec<TaggedPolygon>,
}

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// Splits `polygon` by `plane`, appending the pieces to `out`.
pub(super) fn split_polygon(plane: &SplitPlane, polygon: TaggedPolygon, out: &mut SplitResult) {
    let mut kind = COPLANAR;
    let types: Vec<u8> = polygon
        .vertices
        .iter()
        .map(|v| {
            let t = plane.distance(v);
            let ty = if t < -PLANE_EPS {
                BACK
            } else if t > PLANE_EPS {
                FRONT
            } else {
                COPLANAR
            };
            kind |= ty;
            ty
        })
        .collect();

    match kind {
        COPLANAR => {
            if plane.normal.dot(&polygon.plane.normal) > 0.0 {
                out.coplanar_front.push(polygon);
            } else {
                out.coplanar_back.push(polygon);
            }
        }
        FRONT => out.front.push(polygon),
        BACK => out.back.push(polygon),
        _ => {
            debug_assert_eq!(kind, SPANNING);
            let n = polygon.vertices.len();
            let mut f = Vec::with_capacity(n + 1);
            let mut b = Vec::with_capacity(n + 1);
            for i in 0..n {
                let j = (i + 1) % n;
                let (ti, tj) = (types[i], types[j]);
                let (vi, vj) = (polygon.vertices[i], polygon.vertices[j]);
                if ti != BACK {
                    f.push(vi);
                }
                if ti != FRONT {
                    b.push(vi);
                }
                if (ti | tj) == SPANNING {
                    let t = (plane.w - plane.normal.dot(&vi.coords))
                        / plane.normal.dot(&(vj - vi));
                    let v = vi + (vj - vi) * t;
                    f.push(v);
                    b.push(v);
                }
            }
            if f.len() >= 3 {
                out.front.push(TaggedPolygon {
                    vertices: f,
                    plane: polygon.plane,
                    tag: polygon.tag.clone(),
                });
            }
            if b.len() >= 3 {
                out.back.push(TaggedPolygon {
                    vertices: b,
                    plane: polygon.plane,
                    tag: polygon.tag,
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unit_square() -> TaggedPolygon {
        TaggedPolygon::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            FaceTag::NoEntity,
        )
        .unwrap()
    }

    #[test]
    fn spanning_square_is_cut_in_two() {
        let plane = SplitPlane {
            normal: Vector3::x(),
            w: 0.25,
        };
        let mut out = SplitResult::default();
        split_polygon(&plane, unit_square(), &mut out);
        assert_eq!(out.front.len(), 1);
        assert_eq!(out.back.len(), 1);
        assert_eq!(out.front[0].vertices.len(), 4);
        assert!(out.back[0].vertices.iter().all(|v| v.x <= 0.25 + 1e-12));
    }

    #[test]
    fn coplanar_polygons_sort_by_facing() {
        let mut out = SplitResult::default();
        let up = SplitPlane {
            normal: Vector3::z(),
            w: 0.0,
        };
        split_polygon(&up, unit_square(), &mut out);
        let mut flipped = unit_square();
        flipped.flip();
        split_polygon(&up, flipped, &mut out);
        assert_eq!(out.coplanar_front.len(), 1);
        assert_eq!(out.coplanar_back.len(), 1);
    }

    #[test]
    fn collinear_points_are_rejected() {
        let line = vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(TaggedPolygon::new(line, FaceTag::NoEntity).is_none());
    }

    #[test]
    fn fan_covers_polygon() {
        assert_eq!(unit_square().fan().count(), 2);
    }
}
