use crate::geometry::surface::Plane;

use super::{Point2, Point3, Vector3, TOLERANCE};

/// Newell's method normal of a closed polygon.
///
/// The result points so that the polygon winds counter-clockwise about it.
/// Returns `None` when the polygon has no area.
#[must_use]
pub fn newell_normal(polygon: &[Point3]) -> Option<Vector3> {
    let n = polygon.len();
    if n < 3 {
        return None;
    }
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    let len = normal.norm();
    if len < TOLERANCE {
        None
    } else {
        Some(normal / len)
    }
}

/// Projects a 3D point onto the UV coordinate system of a plane.
#[must_use]
pub fn project_to_uv(point: &Point3, plane: &Plane) -> Point2 {
    let diff = point - plane.origin();
    Point2::new(diff.dot(plane.u_dir()), diff.dot(plane.v_dir()))
}

/// Signed area of a 2D polygon; positive when counter-clockwise.
#[must_use]
pub fn signed_area_2d(verts: &[Point2]) -> f64 {
    let n = verts.len();
    let mut twice = 0.0;
    for i in 0..n {
        let a = &verts[i];
        let b = &verts[(i + 1) % n];
        twice += a.x * b.y - b.x * a.y;
    }
    twice * 0.5
}

/// Winding number of `p` with respect to polygon `verts`.
///
/// Non-zero => inside, zero => outside.
#[must_use]
pub fn winding_number_2d(p: &Point2, verts: &[Point2]) -> i32 {
    let n = verts.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = &verts[i];
        let b = &verts[(i + 1) % n];
        let side = cross_2d(b.x - a.x, b.y - a.y, p.x - a.x, p.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// 2D cross product: `(ax * by - ay * bx)`.
#[inline]
#[must_use]
pub fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}
