//! A group's solid in one of its two representations.

use std::fmt;

use crate::error::Result;
use crate::identity::{FaceTag, RemapFaces, RemapKey};
use crate::group::GroupHandle;
use crate::math::RigidTransform;
use crate::mesh::Mesh;
use crate::operations::transform::Transform;
use crate::tessellation::{TessellateShell, TessellationParams};
use crate::topology::Shell;

/// Which representation a combine step runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepresentationKind {
    Shell,
    Mesh,
}

impl fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell => f.write_str("shell"),
            Self::Mesh => f.write_str("mesh"),
        }
    }
}

/// Picks the exact shell path only while neither side carries a mesh and
/// the group does not force meshing. Once a mesh appears, every later
/// combine runs on meshes.
#[must_use]
pub fn choose_representation(
    prev_has_mesh: bool,
    this_has_mesh: bool,
    force_to_mesh: bool,
) -> RepresentationKind {
    if !prev_has_mesh && !this_has_mesh && !force_to_mesh {
        RepresentationKind::Shell
    } else {
        RepresentationKind::Mesh
    }
}

/// A solid held either as an exact shell or as a triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum Solid {
    Shell(Shell),
    Mesh(Mesh),
}

impl Default for Solid {
    fn default() -> Self {
        Self::Shell(Shell::default())
    }
}

impl From<Shell> for Solid {
    fn from(shell: Shell) -> Self {
        Self::Shell(shell)
    }
}

impl From<Mesh> for Solid {
    fn from(mesh: Mesh) -> Self {
        Self::Mesh(mesh)
    }
}

impl Solid {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Shell(s) => s.is_empty(),
            Self::Mesh(m) => m.is_empty(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> RepresentationKind {
        match self {
            Self::Shell(_) => RepresentationKind::Shell,
            Self::Mesh(_) => RepresentationKind::Mesh,
        }
    }

    /// `true` if this is a mesh with at least one triangle.
    #[must_use]
    pub fn has_mesh(&self) -> bool {
        matches!(self, Self::Mesh(m) if !m.is_empty())
    }

    #[must_use]
    pub fn as_shell(&self) -> Option<&Shell> {
        match self {
            Self::Shell(s) => Some(s),
            Self::Mesh(_) => None,
        }
    }

    #[must_use]
    pub fn as_mesh(&self) -> Option<&Mesh> {
        match self {
            Self::Mesh(m) => Some(m),
            Self::Shell(_) => None,
        }
    }

    /// The shell, or an empty one for a mesh solid.
    #[must_use]
    pub fn shell_or_empty(&self) -> Shell {
        self.as_shell().cloned().unwrap_or_default()
    }

    /// The solid as triangles; shells are tessellated.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell face cannot be tessellated.
    pub fn to_mesh(&self, params: &TessellationParams) -> Result<Mesh> {
        match self {
            Self::Shell(s) => TessellateShell::new(*params).execute(s),
            Self::Mesh(m) => Ok(m.clone()),
        }
    }

    /// Distinct face tags, in first-seen order.
    #[must_use]
    pub fn face_tags(&self) -> Vec<FaceTag> {
        let mut out: Vec<FaceTag> = Vec::new();
        let mut push = |tag: &FaceTag| {
            if !out.contains(tag) {
                out.push(tag.clone());
            }
        };
        match self {
            Self::Shell(s) => s.faces.iter().for_each(|f| push(&f.tag)),
            Self::Mesh(m) => m.triangles.iter().for_each(|t| push(&t.tag)),
        }
        out
    }

    /// Number of faces (or triangles) carrying `tag`.
    #[must_use]
    pub fn faces_with_tag(&self, tag: &FaceTag) -> usize {
        match self {
            Self::Shell(s) => s.faces.iter().filter(|f| &f.tag == tag).count(),
            Self::Mesh(m) => m.triangles.iter().filter(|t| &t.tag == tag).count(),
        }
    }
}

impl Transform for Solid {
    fn transformed(&self, xf: &RigidTransform) -> Self {
        match self {
            Self::Shell(s) => Self::Shell(s.transformed(xf)),
            Self::Mesh(m) => Self::Mesh(m.transformed(xf)),
        }
    }
}

impl RemapFaces for Solid {
    fn remap_faces(&mut self, group: GroupHandle, key: RemapKey) {
        match self {
            Self::Shell(s) => s.remap_faces(group, key),
            Self::Mesh(m) => m.remap_faces(group, key),
        }
    }
}
