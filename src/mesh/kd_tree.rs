//! Spatial partition over a triangle soup, used to weld a freshly combined
//! mesh into a vertex-to-vertex consistent one.

use std::collections::VecDeque;

use tracing::trace;

use crate::math::{Aabb, Point3, Vector3, TOLERANCE};

use super::{Mesh, Triangle};

/// Depth limit for the splitting tree.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone)]
enum KdNode {
    Leaf(Vec<usize>),
    Split {
        axis: usize,
        value: f64,
        lt: Box<KdNode>,
        gt: Box<KdNode>,
    },
}

impl KdNode {
    fn build(triangles: &[Triangle], indices: Vec<usize>, leaf_size: usize, depth: usize) -> Self {
        if indices.len() <= leaf_size || depth >= MAX_DEPTH {
            return Self::Leaf(indices);
        }

        let centroids: Vec<Point3> = indices
            .iter()
            .map(|&i| {
                let t = &triangles[i];
                Point3::from((t.a.coords + t.b.coords + t.c.coords) / 3.0)
            })
            .collect();
        let extent = Aabb::from_points(&centroids);
        let size = extent.max - extent.min;
        let axis = size.imax();
        if size[axis] <= TOLERANCE {
            return Self::Leaf(indices);
        }

        let mut keys: Vec<f64> = centroids.iter().map(|c| c[axis]).collect();
        keys.sort_by(f64::total_cmp);
        let value = keys[keys.len() / 2];

        let mut lt = Vec::new();
        let mut gt = Vec::new();
        for &i in &indices {
            let bb = triangles[i].aabb();
            if bb.min[axis] <= value {
                lt.push(i);
            }
            if bb.max[axis] >= value {
                gt.push(i);
            }
        }
        if lt.len() == indices.len() || gt.len() == indices.len() {
            return Self::Leaf(indices);
        }

        Self::Split {
            axis,
            value,
            lt: Box::new(Self::build(triangles, lt, leaf_size, depth + 1)),
            gt: Box::new(Self::build(triangles, gt, leaf_size, depth + 1)),
        }
    }

    fn query(&self, bbox: &Aabb, out: &mut Vec<usize>) {
        match self {
            Self::Leaf(items) => out.extend_from_slice(items),
            Self::Split {
                axis,
                value,
                lt,
                gt,
            } => {
                if bbox.min[*axis] <= *value {
                    lt.query(bbox, out);
                }
                if bbox.max[*axis] >= *value {
                    gt.query(bbox, out);
                }
            }
        }
    }
}

/// A balanced kd-tree over the triangles of a mesh.
#[derive(Debug, Clone)]
pub struct KdTree {
    triangles: Vec<Triangle>,
    root: KdNode,
    leaf_size: usize,
}

impl KdTree {
    /// Builds a tree holding a copy of `mesh`'s triangles.
    #[must_use]
    pub fn from_mesh(mesh: &Mesh, leaf_size: usize) -> Self {
        let triangles = mesh.triangles.clone();
        let leaf_size = leaf_size.max(1);
        let root = KdNode::build(&triangles, (0..triangles.len()).collect(), leaf_size, 0);
        Self {
            triangles,
            root,
            leaf_size,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Indices of triangles whose bounding boxes may overlap `bbox`, sorted
    /// and without duplicates.
    #[must_use]
    pub fn query(&self, bbox: &Aabb) -> Vec<usize> {
        let mut out = Vec::new();
        self.root.query(bbox, &mut out);
        out.sort_unstable();
        out.dedup();
        out.retain(|&i| self.triangles[i].aabb().overlaps(bbox));
        out
    }

    fn rebuild(&mut self) {
        self.root = KdNode::build(
            &self.triangles,
            (0..self.triangles.len()).collect(),
            self.leaf_size,
            0,
        );
    }

    /// Welds every corner to a canonical position within `tol`, then splits
    /// triangles whose edges pass through another vertex.
    ///
    /// Corners closer than `tol` end up bit-identical. Clusters are formed
    /// transitively, and the canonical position of a cluster is the original
    /// position of its first corner.
    pub fn snap_to_mesh(&mut self, tol: f64) {
        self.weld_vertices(tol);
        self.triangles.retain(|t| !t.is_degenerate(TOLERANCE));
        self.rebuild();
        self.split_t_junctions(tol);
        self.triangles.retain(|t| !t.is_degenerate(TOLERANCE));
        self.rebuild();
    }

    fn weld_vertices(&mut self, tol: f64) {
        let corners: Vec<Point3> = self
            .triangles
            .iter()
            .flat_map(Triangle::vertices)
            .collect();
        let mut sets = DisjointSet::new(corners.len());
        let tol2 = tol * tol;

        for (k, p) in corners.iter().enumerate() {
            let bbox = Aabb::from_points([p]).expanded(tol);
            for t in self.query(&bbox) {
                for c in 0..3 {
                    let k2 = 3 * t + c;
                    if k2 != k && (corners[k2] - p).norm_squared() < tol2 {
                        sets.union(k, k2);
                    }
                }
            }
        }

        let mut moved = 0usize;
        for (t, tri) in self.triangles.iter_mut().enumerate() {
            for (c, v) in tri.vertices_mut().into_iter().enumerate() {
                let canonical = corners[sets.find(3 * t + c)];
                if *v != canonical {
                    *v = canonical;
                    moved += 1;
                }
            }
        }
        trace!(corners = corners.len(), moved, "welded mesh vertices");
    }

    fn split_t_junctions(&mut self, tol: f64) {
        // The tree still indexes the welded triangles; splits only reuse
        // their vertices, so queries against it stay valid.
        let mut queue: VecDeque<Triangle> = self.triangles.iter().cloned().collect();
        let budget = queue.len().saturating_mul(16).max(64);
        let mut splits = 0usize;
        let mut out = Vec::with_capacity(queue.len());

        while let Some(tri) = queue.pop_front() {
            let hit = if splits < budget {
                self.find_junction(&tri, tol)
            } else {
                None
            };
            match hit {
                Some((edge, v)) => {
                    let [p0, p1, p2] = tri.vertices();
                    let (p, q, r) = match edge {
                        0 => (p0, p1, p2),
                        1 => (p1, p2, p0),
                        _ => (p2, p0, p1),
                    };
                    queue.push_back(Triangle::new(p, v, r, tri.tag.clone()));
                    queue.push_back(Triangle::new(v, q, r, tri.tag));
                    splits += 1;
                }
                None => out.push(tri),
            }
        }
        if splits > 0 {
            trace!(splits, "split mesh t-junctions");
        }
        self.triangles = out;
    }

    /// Finds a vertex of a neighbouring triangle lying strictly inside one
    /// of `tri`'s edges. Returns the edge index and the vertex.
    fn find_junction(&self, tri: &Triangle, tol: f64) -> Option<(usize, Point3)> {
        let corners = tri.vertices();
        for edge in 0..3 {
            let p = corners[edge];
            let q = corners[(edge + 1) % 3];
            let d: Vector3 = q - p;
            let len2 = d.norm_squared();
            if len2 <= tol * tol {
                continue;
            }
            let bbox = Aabb::from_points([&p, &q]).expanded(tol);
            for t in self.query(&bbox) {
                for v in self.triangles[t].vertices() {
                    if corners.contains(&v) {
                        continue;
                    }
                    let s = (v - p).dot(&d) / len2;
                    if s <= 0.0 || s >= 1.0 {
                        continue;
                    }
                    let foot = p + d * s;
                    let along = s * len2.sqrt();
                    let rest = (1.0 - s) * len2.sqrt();
                    if (v - foot).norm() < tol && along > tol && rest > tol {
                        return Some((edge, v));
                    }
                }
            }
        }
        None
    }

    /// The tree's triangles as a mesh, without degenerate slivers.
    #[must_use]
    pub fn make_mesh(&self) -> Mesh {
        Mesh::new(
            self.triangles
                .iter()
                .filter(|t| !t.is_degenerate(TOLERANCE))
                .cloned()
                .collect(),
        )
    }
}

/// Builds a tree over `mesh`, welds it with `tol` and returns the clean
/// result.
#[must_use]
pub fn reconcile(mesh: &Mesh, tol: f64, leaf_size: usize) -> Mesh {
    let mut tree = KdTree::from_mesh(mesh, leaf_size);
    tree.snap_to_mesh(tol);
    tree.make_mesh()
}

/// Union-find whose representative is always the smallest member.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut k: usize) -> usize {
        let mut root = k;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[k] != root {
            let next = self.parent[k];
            self.parent[k] = root;
            k = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra < rb {
            self.parent[rb] = ra;
        } else if rb < ra {
            self.parent[ra] = rb;
        }
    }
}
