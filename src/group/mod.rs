//! Groups: the steps of the modeling history and their derived solids.

mod chain;
mod display;

pub use chain::GroupChain;
pub use display::DisplayCache;

use std::fmt;

use crate::loops::{LoopAssembly, PolygonError};
use crate::math::{Point3, Quaternion, Vector3};
use crate::operations::boolean::BooleanOp;
use crate::solid::Solid;

/// Stable identifier of a group within its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupHandle(pub u32);

impl fmt::Display for GroupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{:03}", self.0)
    }
}

/// Whether an extrusion or repeat runs one way from the profile, or
/// symmetrically on both sides of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subtype {
    #[default]
    OneSided,
    TwoSided,
}

/// What a group does, with its resolved numeric parameters.
///
/// Vectors are half-step values: a one-sided extrusion by `v` spans
/// `0..2v`, and translate copies sit `2v` apart. A rotate `angle` is the
/// half-angle of the per-half-step rotation, so copies sit `4θ` apart.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKind {
    /// Free sketch in 3D.
    Drawing3d,
    /// Sketch on a workplane.
    DrawingWorkplane,
    Extrude {
        source: GroupHandle,
        translation: Vector3,
    },
    Revolve {
        source: GroupHandle,
        axis_point: Point3,
        axis_dir: Vector3,
        /// Sweep angle in radians; a full turn needs no caps.
        angle: f64,
    },
    Translate {
        source: GroupHandle,
        translation: Vector3,
        copies: u32,
        skip_first: bool,
    },
    Rotate {
        source: GroupHandle,
        center: Point3,
        axis: Vector3,
        angle: f64,
        copies: u32,
        skip_first: bool,
    },
    /// A solid brought in from elsewhere, placed by `offset` and `rotation`.
    Import {
        solid: Solid,
        offset: Vector3,
        rotation: Quaternion,
    },
}

impl GroupKind {
    /// The group whose output this one consumes, if any.
    #[must_use]
    pub fn source(&self) -> Option<GroupHandle> {
        match self {
            Self::Extrude { source, .. }
            | Self::Revolve { source, .. }
            | Self::Translate { source, .. }
            | Self::Rotate { source, .. } => Some(*source),
            Self::Drawing3d | Self::DrawingWorkplane | Self::Import { .. } => None,
        }
    }

    /// `true` for kinds whose own entities are assembled into loops.
    #[must_use]
    pub fn assembles_loops(&self) -> bool {
        !matches!(self, Self::Extrude { .. } | Self::Revolve { .. })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Drawing3d => "drawing-3d",
            Self::DrawingWorkplane => "drawing-workplane",
            Self::Extrude { .. } => "extrude",
            Self::Revolve { .. } => "revolve",
            Self::Translate { .. } => "translate",
            Self::Rotate { .. } => "rotate",
            Self::Import { .. } => "import",
        }
    }
}

/// Something that went wrong while evaluating a group. Recorded on the
/// group; evaluation of the chain carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupIssue {
    /// The source handle is missing or does not come earlier in the chain.
    InvalidSource(GroupHandle),
    /// The group's own parameters cannot produce a solid.
    InvalidParameters(String),
    /// The exact boolean could not handle the operands; the mesh path was
    /// used instead.
    BooleanFellBackToMesh,
    EvaluationFailed(String),
}

impl fmt::Display for GroupIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSource(h) => write!(f, "source group {h} is not an earlier group"),
            Self::InvalidParameters(msg) => write!(f, "invalid parameters: {msg}"),
            Self::BooleanFellBackToMesh => f.write_str("exact boolean fell back to mesh"),
            Self::EvaluationFailed(msg) => write!(f, "evaluation failed: {msg}"),
        }
    }
}

/// One step of the modeling history.
///
/// The user-facing settings are public fields; everything derived by
/// evaluation is read through accessors.
#[derive(Debug, Clone)]
pub struct Group {
    handle: GroupHandle,
    pub name: String,
    pub kind: GroupKind,
    pub subtype: Subtype,
    /// How this group's solid joins the running solid before it.
    pub combine: BooleanOp,
    /// Run this group's combine on meshes even when exact shells would do.
    pub force_to_mesh: bool,
    pub suppress: bool,

    pub(crate) assembly: LoopAssembly,
    pub(crate) this_solid: Solid,
    pub(crate) running: Solid,
    pub(crate) issues: Vec<GroupIssue>,
    pub(crate) display_dirty: bool,
    pub(crate) display: DisplayCache,
}

impl Group {
    /// A new group; its handle is assigned when it joins a chain.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            handle: GroupHandle(0),
            name: name.into(),
            kind,
            subtype: Subtype::default(),
            combine: BooleanOp::default(),
            force_to_mesh: false,
            suppress: false,
            assembly: LoopAssembly {
                all_closed: true,
                ..LoopAssembly::default()
            },
            this_solid: Solid::default(),
            running: Solid::default(),
            issues: Vec::new(),
            display_dirty: true,
            display: DisplayCache::default(),
        }
    }

    #[must_use]
    pub fn with_subtype(mut self, subtype: Subtype) -> Self {
        self.subtype = subtype;
        self
    }

    #[must_use]
    pub fn with_combine(mut self, combine: BooleanOp) -> Self {
        self.combine = combine;
        self
    }

    #[must_use]
    pub fn with_force_to_mesh(mut self, force: bool) -> Self {
        self.force_to_mesh = force;
        self
    }

    #[must_use]
    pub fn with_suppress(mut self, suppress: bool) -> Self {
        self.suppress = suppress;
        self
    }

    #[must_use]
    pub fn handle(&self) -> GroupHandle {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: GroupHandle) {
        self.handle = handle;
    }

    /// Loops assembled from this group's own entities.
    #[must_use]
    pub fn assembly(&self) -> &LoopAssembly {
        &self.assembly
    }

    #[must_use]
    pub fn polygon_error(&self) -> &PolygonError {
        &self.assembly.error
    }

    /// The solid this group adds, before combining.
    #[must_use]
    pub fn this_solid(&self) -> &Solid {
        &self.this_solid
    }

    /// The accumulated solid after this group.
    #[must_use]
    pub fn running(&self) -> &Solid {
        &self.running
    }

    #[must_use]
    pub fn issues(&self) -> &[GroupIssue] {
        &self.issues
    }

    /// `true` until [`Group::generate_display_items`] has consumed the
    /// latest running solid.
    #[must_use]
    pub fn is_display_dirty(&self) -> bool {
        self.display_dirty
    }

    #[must_use]
    pub fn display(&self) -> &DisplayCache {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_display_is_padded() {
        assert_eq!(GroupHandle(7).to_string(), "g007");
    }

    #[test]
    fn only_profile_builders_skip_loop_assembly() {
        let src = GroupHandle(1);
        assert!(GroupKind::Drawing3d.assembles_loops());
        assert!(GroupKind::Translate {
            source: src,
            translation: Vector3::x(),
            copies: 2,
            skip_first: false,
        }
        .assembles_loops());
        assert!(!GroupKind::Extrude {
            source: src,
            translation: Vector3::z(),
        }
        .assembles_loops());
    }

    #[test]
    fn new_group_starts_dirty_and_empty() {
        let g = Group::new("sketch", GroupKind::DrawingWorkplane);
        assert!(g.is_display_dirty());
        assert!(g.running().is_empty());
        assert!(g.polygon_error().is_good());
        assert_eq!(g.kind.source(), None);
    }
}
