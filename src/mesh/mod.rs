pub mod kd_tree;

pub use kd_tree::KdTree;

use crate::identity::FaceTag;
use crate::math::{Aabb, Point3, RigidTransform, Vector3, TOLERANCE};

/// A triangle with the identity of the face it approximates.
///
/// Vertices wind counter-clockwise seen from outside the solid.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
    pub tag: FaceTag,
}

impl Triangle {
    #[must_use]
    pub fn new(a: Point3, b: Point3, c: Point3, tag: FaceTag) -> Self {
        Self { a, b, c, tag }
    }

    #[must_use]
    pub fn vertices(&self) -> [Point3; 3] {
        [self.a, self.b, self.c]
    }

    pub fn vertices_mut(&mut self) -> [&mut Point3; 3] {
        [&mut self.a, &mut self.b, &mut self.c]
    }

    /// Twice-area vector, `(b - a) × (c - a)`.
    #[must_use]
    pub fn area_vector(&self) -> Vector3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    /// Unit normal, or `None` for a sliver.
    #[must_use]
    pub fn normal(&self) -> Option<Vector3> {
        let n = self.area_vector();
        let len = n.norm();
        (len > TOLERANCE).then(|| n / len)
    }

    /// Returns `true` if two corners coincide within `eps` or the triangle
    /// has no area.
    #[must_use]
    pub fn is_degenerate(&self, eps: f64) -> bool {
        let e = eps * eps;
        (self.a - self.b).norm_squared() < e
            || (self.b - self.c).norm_squared() < e
            || (self.c - self.a).norm_squared() < e
            || self.area_vector().norm() < TOLERANCE
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            a: self.a,
            b: self.c,
            c: self.b,
            tag: self.tag.clone(),
        }
    }

    #[must_use]
    pub fn transformed(&self, xf: &RigidTransform) -> Self {
        Self {
            a: xf * self.a,
            b: xf * self.b,
            c: xf * self.c,
            tag: self.tag.clone(),
        }
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.vertices())
    }
}

/// A triangle soup approximating a solid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    #[must_use]
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn clear(&mut self) {
        self.triangles.clear();
    }

    /// Appends all triangles of `other`.
    pub fn merge(&mut self, other: &Mesh) {
        self.triangles.extend(other.triangles.iter().cloned());
    }

    #[must_use]
    pub fn transformed(&self, xf: &RigidTransform) -> Self {
        Self {
            triangles: self.triangles.iter().map(|t| t.transformed(xf)).collect(),
        }
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(self.triangles.iter().flat_map(|t| [&t.a, &t.b, &t.c]))
    }

    /// Distinct vertex positions, compared bit-exactly, in first-seen order.
    #[must_use]
    pub fn unique_vertices(&self) -> Vec<Point3> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for t in &self.triangles {
            for p in t.vertices() {
                if seen.insert(point_key(&p)) {
                    out.push(p);
                }
            }
        }
        out
    }
}

/// Bit-exact hash key for a point.
#[must_use]
pub fn point_key(p: &Point3) -> [u64; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}
