use crate::error::{OperationError, Result};
use crate::geometry::surface::{BezierPatch, Plane};
use crate::geometry::{BezierCurve, BezierLoop};
use crate::group::{GroupHandle, Subtype};
use crate::identity::{remap, FaceTag, RemapKey};
use crate::loops::BezierLoopSet;
use crate::math::{points_equal, Point3, Vector3, TOLERANCE};
use crate::sketch::EntityId;
use crate::topology::{FaceData, FaceSurface, Shell};

/// Bottom and top offsets for an extrusion by `translation`.
///
/// One-sided extrusions span `0..2t`; two-sided ones span `-t..t`.
#[must_use]
pub fn extrusion_offsets(translation: &Vector3, subtype: Subtype) -> (Vector3, Vector3) {
    match subtype {
        Subtype::OneSided => (Vector3::zeros(), translation * 2.0),
        Subtype::TwoSided => (-translation, *translation),
    }
}

/// Extrudes a loop set between two offsets into a closed shell.
///
/// Face 0 is the bottom cap and face 1 the top cap; every boundary curve
/// then contributes one side patch, linear along the extrusion.
pub struct Extrude<'a> {
    loops: &'a BezierLoopSet,
    bottom: Vector3,
    top: Vector3,
}

impl<'a> Extrude<'a> {
    /// Creates a new `Extrude` operation.
    #[must_use]
    pub fn new(loops: &'a BezierLoopSet, bottom: Vector3, top: Vector3) -> Self {
        Self { loops, bottom, top }
    }

    /// Executes the extrusion.
    ///
    /// An empty loop set gives an empty shell.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the extrusion direction
    /// lies in the profile plane.
    pub fn execute(&self) -> Result<Shell> {
        if self.loops.is_empty() {
            return Ok(Shell::default());
        }

        let dir = self.top - self.bottom;
        let along = dir.dot(&self.loops.normal);
        if along.abs() < TOLERANCE {
            return Err(OperationError::InvalidInput(
                "extrusion direction lies in the profile plane".into(),
            )
            .into());
        }

        // Orient the profile so it winds counter-clockwise about the
        // direction of travel; side patches then face outward.
        let (normal, profile): (Vector3, Vec<BezierLoop>) = if along > 0.0 {
            (self.loops.normal, self.loops.loops.clone())
        } else {
            (
                -self.loops.normal,
                self.loops.loops.iter().map(BezierLoop::reversed).collect(),
            )
        };

        let mut faces = Vec::with_capacity(2 + profile.iter().map(|l| l.curves.len()).sum::<usize>());

        let bottom_plane = Plane::from_normal(self.loops.point + self.bottom, -normal)?;
        faces.push(FaceData::planar(
            bottom_plane,
            profile
                .iter()
                .map(|l| l.reversed().translated(&self.bottom))
                .collect(),
        ));

        let top_plane = Plane::from_normal(self.loops.point + self.top, normal)?;
        faces.push(FaceData::planar(
            top_plane,
            profile.iter().map(|l| l.translated(&self.top)).collect(),
        ));

        for curve in profile.iter().flat_map(|l| l.curves.iter()) {
            faces.push(FaceData::patch(self.side_patch(curve)?));
        }

        Ok(Shell::new(faces))
    }

    fn side_patch(&self, curve: &BezierCurve) -> Result<BezierPatch> {
        let ctrl = curve
            .ctrl()
            .iter()
            .map(|p| vec![p + self.bottom, p + self.top])
            .collect();
        let weights = curve.weights().iter().map(|&w| vec![w, w]).collect();
        BezierPatch::rational(ctrl, weights)
    }

    /// Tags the caps as top and bottom and each straight side with the
    /// sketch line it was swept from.
    ///
    /// Matching compares positions within `eps`; faces that match nothing
    /// keep their tag.
    pub fn tag_faces<I>(&self, shell: &mut Shell, group: GroupHandle, lines: I, eps: f64)
    where
        I: IntoIterator<Item = (EntityId, Point3, Point3)>,
    {
        let lines: Vec<_> = lines.into_iter().collect();
        let on_orig = self.loops.point;

        for (i, face) in shell.faces.iter_mut().enumerate() {
            if i < 2 {
                let p = face.surface.origin_point();
                let Some(n) = face.surface.origin_normal() else {
                    continue;
                };
                let d = n.dot(&p.coords);
                if ((on_orig + self.top).coords.dot(&n) - d).abs() < eps {
                    face.tag = remap(group, &FaceTag::NoEntity, RemapKey::Top);
                }
                if ((on_orig + self.bottom).coords.dot(&n) - d).abs() < eps {
                    face.tag = remap(group, &FaceTag::NoEntity, RemapKey::Bottom);
                }
                continue;
            }

            if !face.is_bilinear() {
                continue;
            }
            let FaceSurface::Patch(patch) = &face.surface else {
                continue;
            };
            let eq = |a: &Point3, b: Point3| points_equal(a, &b, eps);
            for (id, a, b) in &lines {
                let a = a + self.top;
                let b = b + self.top;
                if (eq(&a, patch.ctrl(0, 0)) && eq(&b, patch.ctrl(1, 0)))
                    || (eq(&b, patch.ctrl(0, 0)) && eq(&a, patch.ctrl(1, 0)))
                    || (eq(&a, patch.ctrl(0, 1)) && eq(&b, patch.ctrl(1, 1)))
                    || (eq(&b, patch.ctrl(0, 1)) && eq(&a, patch.ctrl(1, 1)))
                {
                    face.tag = remap(group, &FaceTag::Entity(*id), RemapKey::LineToFace);
                    break;
                }
            }
        }
    }
}
