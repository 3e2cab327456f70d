use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::{Result, TessellationError};
use crate::geometry::surface::{BezierPatch, Plane};
use crate::geometry::{BezierCurve, BezierLoop};
use crate::math::polygon_3d::project_to_uv;
use crate::math::{Point3, TOLERANCE};
use crate::mesh::{Mesh, Triangle};
use crate::topology::{FaceData, FaceSurface};

use super::TessellationParams;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Tessellates a face into tagged triangles.
pub struct TessellateFace {
    params: TessellationParams,
}

impl TessellateFace {
    /// Creates a new `TessellateFace` operation.
    #[must_use]
    pub fn new(params: TessellationParams) -> Self {
        Self { params }
    }

    /// Executes the tessellation, returning a triangle mesh.
    ///
    /// Triangles wind counter-clockwise about the face's outward normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the face's trims cannot be triangulated.
    pub fn execute(&self, face: &FaceData) -> Result<Mesh> {
        let triangles = match &face.surface {
            FaceSurface::Plane(plane) => tessellate_plane(plane, &face.trims, &self.params)?,
            FaceSurface::Patch(patch) => tessellate_patch(patch, &self.params),
        };
        Ok(Mesh::new(
            triangles
                .into_iter()
                .map(|[a, b, c]| Triangle::new(a, b, c, face.tag.clone()))
                .collect(),
        ))
    }
}

/// Tessellates a planar face using CDT over its trim polygons.
fn tessellate_plane(
    plane: &Plane,
    trims: &[BezierLoop],
    params: &TessellationParams,
) -> Result<Vec<[Point3; 3]>> {
    let mut cdt = Cdt::new();
    let mut positions: HashMap<FixedVertexHandle, Point3> = HashMap::new();

    for trim in trims {
        let pts = trim.pwl(params);
        if pts.len() < 3 {
            continue;
        }
        insert_constraint_loop(&mut cdt, &mut positions, plane, &pts)?;
    }

    let interior = classify_interior_faces(&cdt);
    let mut out = Vec::with_capacity(interior.len());
    for face in cdt.inner_faces() {
        if !interior.contains(&face.fix().index()) {
            continue;
        }
        let [a, b, c] = face.vertices().map(|v| {
            positions.get(&v.fix()).copied().unwrap_or_else(|| {
                let p = v.position();
                plane.origin() + plane.u_dir() * p.x + plane.v_dir() * p.y
            })
        });
        out.push([a, b, c]);
    }
    Ok(out)
}

fn insert_constraint_loop(
    cdt: &mut Cdt,
    positions: &mut HashMap<FixedVertexHandle, Point3>,
    plane: &Plane,
    points: &[Point3],
) -> Result<()> {
    let mut handles = Vec::with_capacity(points.len());
    for p in points {
        let uv = project_to_uv(p, plane);
        let h = cdt
            .insert(SpadePoint2::new(uv.x, uv.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        positions.entry(h).or_insert(*p);
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from != to && cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        }
    }
    Ok(())
}

/// Classifies which inner faces of the CDT are inside the trims using
/// flood-fill. Each crossed constraint edge increments the depth; odd depth
/// is interior.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth_map.contains_key(&idx) {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(idx, depth);
            if depth % 2 == 1 {
                interior.insert(idx);
            }
            queue.push_back((inner.fix(), depth));
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let n_idx = neighbor.fix().index();
            if depth_map.contains_key(&n_idx) {
                continue;
            }
            let new_depth = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(n_idx, new_depth);
            if new_depth % 2 == 1 {
                interior.insert(n_idx);
            }
            queue.push_back((neighbor.fix(), new_depth));
        }
    }

    interior
}

/// Number of pieces along `u` (`along_u == true`) or `v`.
fn patch_segments(patch: &BezierPatch, along_u: bool, params: &TessellationParams) -> usize {
    let (count, degree) = if along_u {
        (patch.degree_v() + 1, patch.degree_u())
    } else {
        (patch.degree_u() + 1, patch.degree_v())
    };
    if degree == 1 {
        return 1;
    }
    (0..count)
        .map(|k| {
            let (ctrl, weights): (Vec<Point3>, Vec<f64>) = (0..=degree)
                .map(|m| {
                    let (i, j) = if along_u { (m, k) } else { (k, m) };
                    (patch.ctrl(i, j), patch.weight(i, j))
                })
                .unzip();
            BezierCurve::from_parts(ctrl, weights).segments(params)
        })
        .max()
        .unwrap_or(1)
}

/// Tessellates a patch over a uniform parameter grid.
fn tessellate_patch(patch: &BezierPatch, params: &TessellationParams) -> Vec<[Point3; 3]> {
    let nu = patch_segments(patch, true, params);
    let nv = patch_segments(patch, false, params);

    #[allow(clippy::cast_precision_loss)]
    let grid: Vec<Vec<Point3>> = (0..=nu)
        .map(|i| {
            (0..=nv)
                .map(|j| patch.point_at(i as f64 / nu as f64, j as f64 / nv as f64))
                .collect()
        })
        .collect();

    let mut out = Vec::with_capacity(2 * nu * nv);
    for i in 0..nu {
        for j in 0..nv {
            let p00 = grid[i][j];
            let p10 = grid[i + 1][j];
            let p11 = grid[i + 1][j + 1];
            let p01 = grid[i][j + 1];
            for tri in [[p00, p10, p11], [p00, p11, p01]] {
                let area = (tri[1] - tri[0]).cross(&(tri[2] - tri[0])).norm();
                if area > TOLERANCE {
                    out.push(tri);
                }
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::FaceTag;
    use crate::math::Vector3;

    fn square_loop(x0: f64, y0: f64, x1: f64, y1: f64) -> BezierLoop {
        let p = [
            Point3::new(x0, y0, 0.0),
            Point3::new(x1, y0, 0.0),
            Point3::new(x1, y1, 0.0),
            Point3::new(x0, y1, 0.0),
        ];
        BezierLoop::new((0..4).map(|i| BezierCurve::line(p[i], p[(i + 1) % 4])).collect())
    }

    fn area(mesh: &Mesh) -> f64 {
        mesh.triangles.iter().map(|t| t.area_vector().norm() * 0.5).sum()
    }

    #[test]
    fn square_gives_two_triangles_facing_normal() {
        let plane = Plane::from_normal(Point3::origin(), Vector3::z()).unwrap();
        let face = FaceData::planar(plane, vec![square_loop(0.0, 0.0, 1.0, 1.0)]);
        let mesh = TessellateFace::new(TessellationParams::default()).execute(&face).unwrap();
        assert_eq!(mesh.len(), 2);
        for t in &mesh.triangles {
            assert!(t.normal().unwrap().z > 0.999);
        }
    }

    #[test]
    fn hole_is_excluded() {
        let plane = Plane::from_normal(Point3::origin(), Vector3::z()).unwrap();
        let face = FaceData::planar(
            plane,
            vec![
                square_loop(0.0, 0.0, 4.0, 4.0),
                square_loop(1.0, 1.0, 2.0, 2.0).reversed(),
            ],
        );
        let mesh = TessellateFace::new(TessellationParams::default()).execute(&face).unwrap();
        assert!((area(&mesh) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn triangles_inherit_face_tag() {
        let plane = Plane::from_normal(Point3::origin(), Vector3::z()).unwrap();
        let mut face = FaceData::planar(plane, vec![square_loop(0.0, 0.0, 1.0, 1.0)]);
        face.tag = crate::identity::remap(
            crate::group::GroupHandle(1),
            &FaceTag::NoEntity,
            crate::identity::RemapKey::Top,
        );
        let mesh = TessellateFace::new(TessellationParams::default()).execute(&face).unwrap();
        assert!(mesh.triangles.iter().all(|t| t.tag == face.tag));
    }

    #[test]
    fn bilinear_patch_is_one_quad() {
        let patch = BezierPatch::rational(
            vec![
                vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)],
                vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 1.0)],
            ],
            vec![vec![1.0; 2]; 2],
        )
        .unwrap();
        let mesh = TessellateFace::new(TessellationParams::default())
            .execute(&FaceData::patch(patch))
            .unwrap();
        assert_eq!(mesh.len(), 2);
        assert!((area(&mesh) - 1.0).abs() < 1e-12);
    }
}
