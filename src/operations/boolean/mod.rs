mod bsp;
mod polygon;

use std::fmt;

use crate::error::{OperationError, Result};
use crate::geometry::surface::Plane;
use crate::geometry::{BezierCurve, BezierLoop};
use crate::math::{points_equal, Point3, TOLERANCE};
use crate::mesh::{Mesh, Triangle};
use crate::tessellation::{TessellateFace, TessellationParams};
use crate::topology::{FaceData, FaceSurface, Shell};

use polygon::{TaggedPolygon, PLANE_EPS};

/// How a group's solid is combined with the running solid before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BooleanOp {
    #[default]
    Union,
    Difference,
    /// Both solids side by side, without resolving their overlap.
    Assembly,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Union => f.write_str("union"),
            Self::Difference => f.write_str("difference"),
            Self::Assembly => f.write_str("assembly"),
        }
    }
}

/// Boolean combination of two solids of the same representation.
///
/// Face tags of both operands survive into the result.
pub trait SolidOps: Clone {
    fn is_empty(&self) -> bool;

    /// `self ∪ other`.
    ///
    /// # Errors
    ///
    /// Returns an error if the representation cannot combine these solids.
    fn union(&self, other: &Self) -> Result<Self>;

    /// `self − other`.
    ///
    /// # Errors
    ///
    /// Returns an error if the representation cannot combine these solids.
    fn difference(&self, other: &Self) -> Result<Self>;

    /// Both solids in one, overlap left as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the representation cannot hold both solids.
    fn assembly(&self, other: &Self) -> Result<Self>;

    /// Dispatches on `op`. An empty operand never reaches the underlying
    /// operation.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying operation.
    fn combine(&self, other: &Self, op: BooleanOp) -> Result<Self> {
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(match op {
                BooleanOp::Union | BooleanOp::Assembly => other.clone(),
                BooleanOp::Difference => self.clone(),
            });
        }
        match op {
            BooleanOp::Union => self.union(other),
            BooleanOp::Difference => self.difference(other),
            BooleanOp::Assembly => self.assembly(other),
        }
    }
}

/// Folds one group's solid into the running solid of the group before it.
pub struct BooleanFold {
    op: BooleanOp,
    suppressed: bool,
}

impl BooleanFold {
    /// Creates a new `BooleanFold` operation.
    #[must_use]
    pub fn new(op: BooleanOp, suppressed: bool) -> Self {
        Self { op, suppressed }
    }

    /// Executes the fold. An empty `this` or a suppressed group passes
    /// `prev` through unchanged.
    ///
    /// # Errors
    ///
    /// Propagates a failure of the combining operation.
    pub fn execute<T: SolidOps>(&self, prev: &T, this: &T) -> Result<T> {
        if this.is_empty() || self.suppressed {
            return Ok(prev.clone());
        }
        prev.combine(this, self.op)
    }
}

impl SolidOps for Mesh {
    fn is_empty(&self) -> bool {
        Mesh::is_empty(self)
    }

    fn union(&self, other: &Self) -> Result<Self> {
        Ok(polygons_to_mesh(&bsp::union(
            mesh_to_polygons(self),
            mesh_to_polygons(other),
        )))
    }

    fn difference(&self, other: &Self) -> Result<Self> {
        Ok(polygons_to_mesh(&bsp::difference(
            mesh_to_polygons(self),
            mesh_to_polygons(other),
        )))
    }

    fn assembly(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.merge(other);
        Ok(out)
    }
}

/// The exact boolean handles polyhedral shells only: planar faces with
/// straight trims, and planar bilinear patches.
impl SolidOps for Shell {
    fn is_empty(&self) -> bool {
        Shell::is_empty(self)
    }

    fn union(&self, other: &Self) -> Result<Self> {
        polygons_to_shell(bsp::union(shell_to_polygons(self)?, shell_to_polygons(other)?))
    }

    fn difference(&self, other: &Self) -> Result<Self> {
        polygons_to_shell(bsp::difference(
            shell_to_polygons(self)?,
            shell_to_polygons(other)?,
        ))
    }

    fn assembly(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.merge(other);
        Ok(out)
    }
}

fn mesh_to_polygons(mesh: &Mesh) -> Vec<TaggedPolygon> {
    mesh.triangles
        .iter()
        .filter_map(|t| TaggedPolygon::new(t.vertices().to_vec(), t.tag.clone()))
        .collect()
}

fn polygons_to_mesh(polygons: &[TaggedPolygon]) -> Mesh {
    let mut mesh = Mesh::default();
    for p in polygons {
        for [a, b, c] in p.fan() {
            let tri = Triangle::new(a, b, c, p.tag.clone());
            if !tri.is_degenerate(PLANE_EPS) {
                mesh.triangles.push(tri);
            }
        }
    }
    mesh
}

fn shell_to_polygons(shell: &Shell) -> Result<Vec<TaggedPolygon>> {
    let mut out = Vec::with_capacity(shell.len());
    for face in &shell.faces {
        match &face.surface {
            FaceSurface::Plane(plane) => {
                if !face.trims.iter().all(BezierLoop::is_polygonal) {
                    return Err(OperationError::Unsupported(
                        "planar face with curved trim edges".into(),
                    )
                    .into());
                }
                if let [trim] = face.trims.as_slice() {
                    let pts = trim.pwl(&TessellationParams::default());
                    if is_convex(&pts, plane) {
                        out.extend(TaggedPolygon::new(pts, face.tag.clone()));
                        continue;
                    }
                }
                let mesh = TessellateFace::new(TessellationParams::default()).execute(face)?;
                out.extend(mesh_to_polygons(&mesh));
            }
            FaceSurface::Patch(patch) => {
                let quad = patch.corners();
                let planar = face.is_bilinear()
                    && TaggedPolygon::new(quad.to_vec(), face.tag.clone()).is_some_and(|p| {
                        quad.iter()
                            .all(|v| (p.plane.normal.dot(&v.coords) - p.plane.w).abs() < PLANE_EPS)
                    });
                if !planar {
                    return Err(
                        OperationError::Unsupported("curved surface patch".into()).into()
                    );
                }
                out.extend(TaggedPolygon::new(quad.to_vec(), face.tag.clone()));
            }
        }
    }
    Ok(out)
}

/// `true` if `pts` turn consistently counter-clockwise about the plane
/// normal.
fn is_convex(pts: &[Point3], plane: &Plane) -> bool {
    let n = pts.len();
    n >= 3
        && (0..n).all(|i| {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            let c = pts[(i + 2) % n];
            (b - a).cross(&(c - b)).dot(plane.plane_normal()) >= -TOLERANCE
        })
}

fn polygons_to_shell(polygons: Vec<TaggedPolygon>) -> Result<Shell> {
    let mut faces = Vec::with_capacity(polygons.len());
    for p in polygons {
        let mut pts: Vec<Point3> = Vec::with_capacity(p.vertices.len());
        for v in p.vertices {
            if pts.last().is_none_or(|last| !points_equal(last, &v, PLANE_EPS)) {
                pts.push(v);
            }
        }
        while pts.len() > 1
            && pts
                .first()
                .zip(pts.last())
                .is_some_and(|(f, l)| points_equal(f, l, PLANE_EPS))
        {
            pts.pop();
        }
        if pts.len() < 3 {
            continue;
        }
        let plane = Plane::from_normal(pts[0], p.plane.normal)?;
        let n = pts.len();
        let trim = BezierLoop::new(
            (0..n)
                .map(|i| BezierCurve::line(pts[i], pts[(i + 1) % n]))
                .collect(),
        );
        let mut face = FaceData::planar(plane, vec![trim]);
        face.tag = p.tag;
        faces.push(face);
    }
    Ok(Shell::new(faces))
}
