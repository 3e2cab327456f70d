use crate::geometry::surface::{BezierPatch, Plane, Surface};
use crate::geometry::BezierLoop;
use crate::identity::FaceTag;
use crate::math::{Point3, RigidTransform, Vector3};

/// The geometric surface carrying a face.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceSurface {
    /// A plane; the face is the region its trim loops enclose.
    Plane(Plane),
    /// A Bezier patch; the face is the whole unit parameter square.
    Patch(BezierPatch),
}

impl FaceSurface {
    /// The surface point at parameters `(0, 0)`.
    #[must_use]
    pub fn origin_point(&self) -> Point3 {
        match self {
            Self::Plane(plane) => *plane.origin(),
            Self::Patch(patch) => patch.ctrl(0, 0),
        }
    }

    /// The unit outward normal at parameters `(0, 0)`, if it is defined.
    #[must_use]
    pub fn origin_normal(&self) -> Option<Vector3> {
        match self {
            Self::Plane(plane) => Some(*plane.plane_normal()),
            Self::Patch(patch) => patch.normal(0.0, 0.0).ok(),
        }
    }

    #[must_use]
    pub fn transformed(&self, xf: &RigidTransform) -> Self {
        match self {
            Self::Plane(plane) => Self::Plane(plane.transformed(xf)),
            Self::Patch(patch) => Self::Patch(patch.transformed(xf)),
        }
    }
}

/// One face of a shell: a surface, the loops bounding it, and its identity.
///
/// Planar faces keep outer trims counter-clockwise about the plane normal
/// and hole trims clockwise. Patch faces carry their parameter boundary as
/// a single trim.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceData {
    pub surface: FaceSurface,
    pub trims: Vec<BezierLoop>,
    pub tag: FaceTag,
}

impl FaceData {
    /// A planar face bounded by `trims`.
    #[must_use]
    pub fn planar(plane: Plane, trims: Vec<BezierLoop>) -> Self {
        Self {
            surface: FaceSurface::Plane(plane),
            trims,
            tag: FaceTag::NoEntity,
        }
    }

    /// A face covering the whole of `patch`.
    #[must_use]
    pub fn patch(patch: BezierPatch) -> Self {
        let trims = vec![patch.boundary()];
        Self {
            surface: FaceSurface::Patch(patch),
            trims,
            tag: FaceTag::NoEntity,
        }
    }

    /// Returns `true` for a degree (1, 1) patch.
    #[must_use]
    pub fn is_bilinear(&self) -> bool {
        matches!(&self.surface, FaceSurface::Patch(p) if p.degree_u() == 1 && p.degree_v() == 1)
    }

    #[must_use]
    pub fn transformed(&self, xf: &RigidTransform) -> Self {
        Self {
            surface: self.surface.transformed(xf),
            trims: self.trims.iter().map(|t| t.transformed(xf)).collect(),
            tag: self.tag.clone(),
        }
    }
}
