//! Replication of a source group's solid along a translation or rotation.

use tracing::trace;

use crate::error::Result;
use crate::group::{GroupHandle, Subtype};
use crate::identity::{RemapFaces, RemapKey};
use crate::math::{Point3, RigidTransform, Vector3};
use crate::operations::boolean::{BooleanOp, SolidOps};
use crate::operations::transform::{rotation_about, translation, Transform};

/// The motion applied between copies. `translation` is a half-step:
/// consecutive copies are `2 * translation` apart. `angle` is the half-angle
/// of the per-half-step quaternion, so a copy `scale` half-steps out turns
/// by `2 * scale * angle` and consecutive copies are `4 * angle` apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepeatMotion {
    Translate { translation: Vector3 },
    Rotate { center: Point3, axis: Vector3, angle: f64 },
}

/// One copy of a step-and-repeat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iteration {
    /// Copy index `a`.
    pub index: u32,
    /// Signed multiple of the half-step parameter for this copy.
    pub scale: i64,
    pub key: RemapKey,
}

/// Folds transformed copies of a step solid into a running solid.
pub struct StepRepeat {
    group: GroupHandle,
    motion: RepeatMotion,
    subtype: Subtype,
    copies: u32,
    skip_first: bool,
    op: BooleanOp,
}

impl StepRepeat {
    /// Creates a new `StepRepeat` operation for `group`, combining each
    /// copy with `op`.
    #[must_use]
    pub fn new(group: GroupHandle, motion: RepeatMotion, subtype: Subtype, copies: u32) -> Self {
        Self {
            group,
            motion,
            subtype,
            copies,
            skip_first: false,
            op: BooleanOp::Union,
        }
    }

    /// Leaves out the untransformed copy of a one-sided repeat. The copy
    /// count stays the same, so the pattern grows by one step.
    #[must_use]
    pub fn skip_first(mut self, skip: bool) -> Self {
        self.skip_first = skip;
        self
    }

    #[must_use]
    pub fn with_op(mut self, op: BooleanOp) -> Self {
        self.op = op;
        self
    }

    /// The copies to generate, in order.
    ///
    /// One-sided repeats place copy `a` at `2a` half-steps; two-sided
    /// repeats centre the pattern on the original. The final copy is keyed
    /// [`RemapKey::Last`] so its faces stay stable when the count changes.
    #[must_use]
    pub fn iterations(&self) -> Vec<Iteration> {
        let mut n = i64::from(self.copies);
        let mut a0 = 0;
        if self.subtype == Subtype::OneSided && self.skip_first {
            a0 += 1;
            n += 1;
        }
        (a0..n)
            .map(|a| {
                let scale = a * 2
                    - match self.subtype {
                        Subtype::OneSided => 0,
                        Subtype::TwoSided => n - 1,
                    };
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let index = a as u32;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let key = RemapKey::for_iteration(index, n as u32);
                Iteration { index, scale, key }
            })
            .collect()
    }

    /// The rigid motion of a copy `scale` half-steps away from the original.
    ///
    /// # Errors
    ///
    /// Returns an error if a rotation axis is zero.
    pub fn transform_for(&self, scale: i64) -> Result<RigidTransform> {
        #[allow(clippy::cast_precision_loss)]
        let s = scale as f64;
        match self.motion {
            RepeatMotion::Translate { translation: t } => Ok(translation(&(t * s))),
            RepeatMotion::Rotate {
                center,
                axis,
                angle,
            } => rotation_about(&center, &axis, 2.0 * angle * s),
        }
    }

    /// Executes the repeat. Starting from `prev`, each copy of `step` is
    /// moved, has its faces remapped to this group, and is combined in.
    ///
    /// # Errors
    ///
    /// Propagates a failure of the transform or of the combining operation.
    pub fn execute<T>(&self, prev: &T, step: &T) -> Result<T>
    where
        T: SolidOps + Transform + RemapFaces,
    {
        let mut so_far = prev.clone();
        for it in self.iterations() {
            let xf = self.transform_for(it.scale)?;
            let mut copy = step.transformed(&xf);
            copy.remap_faces(self.group, it.key);
            trace!(
                group = %self.group,
                index = it.index,
                scale = it.scale,
                key = %it.key,
                op = %self.op,
                "step and repeat copy"
            );
            so_far = so_far.combine(&copy, self.op)?;
        }
        Ok(so_far)
    }
}
