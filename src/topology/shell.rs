use crate::math::{Point3, RigidTransform};
use crate::tessellation::TessellationParams;

use super::face::FaceData;

/// A boundary-representation solid: an ordered list of faces.
///
/// Face order is significant; profile builders emit their cap faces first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shell {
    pub faces: Vec<FaceData>,
}

impl Shell {
    #[must_use]
    pub fn new(faces: Vec<FaceData>) -> Self {
        Self { faces }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn clear(&mut self) {
        self.faces.clear();
    }

    /// Appends all faces of `other` without any intersection handling.
    pub fn merge(&mut self, other: &Shell) {
        self.faces.extend(other.faces.iter().cloned());
    }

    #[must_use]
    pub fn transformed(&self, xf: &RigidTransform) -> Self {
        Self {
            faces: self.faces.iter().map(|f| f.transformed(xf)).collect(),
        }
    }

    /// Polyline segments along every trim curve, for edge display.
    #[must_use]
    pub fn edges(&self, params: &TessellationParams) -> Vec<(Point3, Point3)> {
        let mut out = Vec::new();
        for face in &self.faces {
            for trim in &face.trims {
                for curve in &trim.curves {
                    let pts = curve.pwl(params);
                    out.extend(pts.windows(2).map(|w| (w[0], w[1])));
                }
            }
        }
        out
    }
}
