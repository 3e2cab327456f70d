use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::EvalConfig;
use crate::error::{GroupSolidError, OperationError, Result};
use crate::identity::{RemapFaces, RemapKey};
use crate::loops::{AssembleLoops, LoopAssembly};
use crate::mesh::kd_tree::reconcile;
use crate::mesh::Mesh;
use crate::operations::boolean::BooleanFold;
use crate::operations::shaping::{extrusion_offsets, Extrude, Revolve};
use crate::operations::step_repeat::{RepeatMotion, StepRepeat};
use crate::operations::transform::{placement, Transform};
use crate::sketch::Sketch;
use crate::solid::{choose_representation, RepresentationKind, Solid};
use crate::topology::Shell;

use super::{Group, GroupHandle, GroupIssue, GroupKind};

/// The ordered modeling history, together with the sketch its groups draw
/// from.
///
/// Each group reads only the finished results of groups before it, so
/// evaluation runs strictly front to back.
#[derive(Debug, Clone)]
pub struct GroupChain {
    groups: Vec<Group>,
    index: HashMap<GroupHandle, usize>,
    next_handle: u32,
    config: EvalConfig,
    sketch: Sketch,
}

impl Default for GroupChain {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupChain {
    /// An empty chain with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
            next_handle: 1,
            config: EvalConfig::default(),
            sketch: Sketch::new(),
        }
    }

    /// An empty chain with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    #[must_use]
    pub fn sketch(&self) -> &Sketch {
        &self.sketch
    }

    pub fn sketch_mut(&mut self) -> &mut Sketch {
        &mut self.sketch
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Reserves the handle the next added group will get. Lets a caller
    /// draw entities for a group before adding it.
    #[must_use]
    pub fn next_handle(&self) -> GroupHandle {
        GroupHandle(self.next_handle)
    }

    /// Appends `group` at the end of the chain.
    pub fn push(&mut self, group: Group) -> GroupHandle {
        let at = self.groups.len();
        self.insert_at(at, group)
    }

    /// Inserts `group` directly after `after`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] if `after` is not in the chain.
    pub fn insert_after(&mut self, after: GroupHandle, group: Group) -> Result<GroupHandle> {
        let at = self.position(after)? + 1;
        Ok(self.insert_at(at, group))
    }

    fn insert_at(&mut self, at: usize, mut group: Group) -> GroupHandle {
        let handle = GroupHandle(self.next_handle);
        self.next_handle += 1;
        group.set_handle(handle);
        self.groups.insert(at, group);
        self.reindex();
        handle
    }

    /// Removes a group. Groups that used it as their source will report
    /// [`GroupIssue::InvalidSource`] on the next evaluation.
    pub fn remove(&mut self, handle: GroupHandle) -> Option<Group> {
        let at = *self.index.get(&handle)?;
        let group = self.groups.remove(at);
        self.reindex();
        Some(group)
    }

    fn reindex(&mut self) {
        self.index = self
            .groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.handle(), i))
            .collect();
    }

    fn position(&self, handle: GroupHandle) -> Result<usize> {
        self.index
            .get(&handle)
            .copied()
            .ok_or_else(|| OperationError::NotFound(format!("group {handle}")).into())
    }

    #[must_use]
    pub fn index_of(&self, handle: GroupHandle) -> Option<usize> {
        self.index.get(&handle).copied()
    }

    #[must_use]
    pub fn get(&self, handle: GroupHandle) -> Option<&Group> {
        self.groups.get(self.index_of(handle)?)
    }

    pub fn get_mut(&mut self, handle: GroupHandle) -> Option<&mut Group> {
        let i = self.index_of(handle)?;
        self.groups.get_mut(i)
    }

    /// The group immediately before `handle`.
    #[must_use]
    pub fn previous(&self, handle: GroupHandle) -> Option<&Group> {
        let i = self.index_of(handle)?;
        i.checked_sub(1).map(|p| &self.groups[p])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    /// Recomputes every group in order.
    pub fn evaluate(&mut self) {
        self.evaluate_range(0);
    }

    /// Recomputes `handle` and every group after it. Earlier groups keep
    /// their results.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] if `handle` is not in the chain.
    pub fn evaluate_from(&mut self, handle: GroupHandle) -> Result<()> {
        let start = self.position(handle)?;
        self.evaluate_range(start);
        Ok(())
    }

    fn evaluate_range(&mut self, start: usize) {
        let ctx = EvalContext {
            config: &self.config,
            sketch: &self.sketch,
            index: &self.index,
        };
        for i in start..self.groups.len() {
            let (upstream, rest) = self.groups.split_at_mut(i);
            ctx.evaluate_group(upstream, &mut rest[0]);
        }
    }
}

/// Read-only state shared by every group evaluation in one pass.
struct EvalContext<'a> {
    config: &'a EvalConfig,
    sketch: &'a Sketch,
    index: &'a HashMap<GroupHandle, usize>,
}

impl EvalContext<'_> {
    /// The index of `source` if it comes before position `upstream.len()`.
    fn source<'g>(&self, upstream: &'g [Group], source: GroupHandle) -> Option<(usize, &'g Group)> {
        let i = *self.index.get(&source)?;
        upstream.get(i).map(|g| (i, g))
    }

    fn evaluate_group(&self, upstream: &[Group], group: &mut Group) {
        group.issues.clear();
        group.this_solid = Solid::default();
        group.running = Solid::default();

        group.assembly = if group.kind.assembles_loops() {
            AssembleLoops::new(self.config).for_group(self.sketch, group.handle())
        } else {
            LoopAssembly {
                all_closed: true,
                ..LoopAssembly::default()
            }
        };
        if !group.assembly.error.is_good() {
            warn!(
                group = %group.handle(),
                error = ?group.assembly.error,
                "sketch does not form valid loops"
            );
        }

        let prev = upstream.last().map(|g| &g.running);

        match &group.kind {
            GroupKind::Translate { source, .. } | GroupKind::Rotate { source, .. } => {
                let source = *source;
                let Some((at, src)) = self.source(upstream, source) else {
                    pass_through_invalid(group, source, prev);
                    return;
                };
                let pg = at.checked_sub(1).map(|p| &upstream[p].running);
                self.step_and_repeat(group, src, pg, prev);
                group.display_dirty = true;
                return;
            }
            GroupKind::Extrude { source, .. } | GroupKind::Revolve { source, .. } => {
                let source = *source;
                let Some((_, src)) = self.source(upstream, source) else {
                    pass_through_invalid(group, source, prev);
                    return;
                };
                match self.profile_solid(group, src) {
                    Ok(shell) => group.this_solid = Solid::Shell(shell),
                    Err(e) => {
                        warn!(group = %group.handle(), error = %e, "profile solid failed");
                        group.issues.push(GroupIssue::InvalidParameters(e.to_string()));
                    }
                }
            }
            GroupKind::Import {
                solid,
                offset,
                rotation,
            } => {
                let mut placed = solid.transformed(&placement(offset, rotation));
                placed.remap_faces(group.handle(), RemapKey::Copy(0));
                group.this_solid = placed;
            }
            GroupKind::Drawing3d | GroupKind::DrawingWorkplane => {}
        }

        self.fold(group, prev);
        group.display_dirty = true;
    }

    fn profile_solid(&self, group: &Group, src: &Group) -> Result<Shell> {
        let loops = &src.assembly.loops;
        match &group.kind {
            GroupKind::Extrude { translation, .. } => {
                let (bottom, top) = extrusion_offsets(translation, group.subtype);
                let op = Extrude::new(loops, bottom, top);
                let mut shell = op.execute()?;
                op.tag_faces(
                    &mut shell,
                    group.handle(),
                    self.sketch.lines_of(src.handle()),
                    self.config.length_eps,
                );
                Ok(shell)
            }
            GroupKind::Revolve {
                axis_point,
                axis_dir,
                angle,
                ..
            } => Revolve::new(loops, *axis_point, *axis_dir, *angle).execute(),
            _ => Ok(Shell::default()),
        }
    }

    /// Combines this group's solid into the previous running solid.
    fn fold(&self, group: &mut Group, prev: Option<&Solid>) {
        let empty = Solid::default();
        let prev = prev.unwrap_or(&empty);
        let op = BooleanFold::new(group.combine, group.suppress);

        let kind = choose_representation(
            prev.has_mesh(),
            group.this_solid.has_mesh(),
            group.force_to_mesh,
        );
        debug!(
            group = %group.handle(),
            kind = group.kind.name(),
            representation = %kind,
            combine = %group.combine,
            "evaluating group"
        );

        if kind == RepresentationKind::Shell {
            let this = group.this_solid.shell_or_empty();
            match op.execute(&prev.shell_or_empty(), &this) {
                Ok(shell) => {
                    group.running = Solid::Shell(shell);
                    return;
                }
                Err(e) if is_unsupported(&e) => {
                    warn!(group = %group.handle(), error = %e, "exact boolean failed, using meshes");
                    group.issues.push(GroupIssue::BooleanFellBackToMesh);
                }
                Err(e) => {
                    reject_parameters(group, &e, prev);
                    return;
                }
            }
        }

        let result = self.meshes(prev, &group.this_solid).and_then(|(prevm, thism)| {
            let out = op.execute(&prevm, &thism)?;
            Ok(self.reconcile(&out))
        });
        match result {
            Ok(mesh) => group.running = Solid::Mesh(mesh),
            Err(e) => {
                warn!(group = %group.handle(), error = %e, "mesh boolean failed");
                group.issues.push(GroupIssue::EvaluationFailed(e.to_string()));
                group.running = prev.clone();
            }
        }
    }

    /// `pg` is the running solid before the source, where the fold starts;
    /// `before` is this group's predecessor, passed through on bad input.
    fn step_and_repeat(
        &self,
        group: &mut Group,
        src: &Group,
        pg: Option<&Solid>,
        before: Option<&Solid>,
    ) {
        let empty = Solid::default();
        let prev = pg.unwrap_or(&empty);
        let before = before.unwrap_or(&empty);

        let (motion, copies, skip_first) = match &group.kind {
            GroupKind::Translate {
                translation,
                copies,
                skip_first,
                ..
            } => (
                RepeatMotion::Translate {
                    translation: *translation,
                },
                *copies,
                *skip_first,
            ),
            GroupKind::Rotate {
                center,
                axis,
                angle,
                copies,
                skip_first,
                ..
            } => (
                RepeatMotion::Rotate {
                    center: *center,
                    axis: *axis,
                    angle: *angle,
                },
                *copies,
                *skip_first,
            ),
            _ => return,
        };
        let op = StepRepeat::new(group.handle(), motion, group.subtype, copies)
            .skip_first(skip_first)
            .with_op(src.combine);
        if let Err(e) = op.transform_for(0) {
            reject_parameters(group, &e, before);
            return;
        }

        let kind = choose_representation(
            prev.has_mesh(),
            src.this_solid.has_mesh(),
            group.force_to_mesh,
        );
        debug!(
            group = %group.handle(),
            kind = group.kind.name(),
            source = %src.handle(),
            representation = %kind,
            copies,
            "evaluating step and repeat"
        );

        if kind == RepresentationKind::Shell {
            match op.execute(&prev.shell_or_empty(), &src.this_solid.shell_or_empty()) {
                Ok(shell) => {
                    group.running = Solid::Shell(shell);
                    return;
                }
                Err(e) if is_unsupported(&e) => {
                    warn!(group = %group.handle(), error = %e, "exact repeat failed, using meshes");
                    group.issues.push(GroupIssue::BooleanFellBackToMesh);
                }
                Err(e) => {
                    reject_parameters(group, &e, before);
                    return;
                }
            }
        }

        let result = self.meshes(prev, &src.this_solid).and_then(|(prevm, stepm)| {
            let out = op.execute(&prevm, &stepm)?;
            Ok(self.reconcile(&out))
        });
        match result {
            Ok(mesh) => group.running = Solid::Mesh(mesh),
            Err(e) => {
                warn!(group = %group.handle(), error = %e, "mesh repeat failed");
                group.issues.push(GroupIssue::EvaluationFailed(e.to_string()));
                group.running = prev.clone();
            }
        }
    }

    fn meshes(&self, a: &Solid, b: &Solid) -> Result<(Mesh, Mesh)> {
        Ok((
            a.to_mesh(&self.config.tessellation)?,
            b.to_mesh(&self.config.tessellation)?,
        ))
    }

    fn reconcile(&self, mesh: &Mesh) -> Mesh {
        reconcile(mesh, self.config.snap_tolerance, self.config.kd_leaf_size)
    }
}

/// `true` when the exact shell path cannot represent the operands, as
/// opposed to the group's own parameters being unusable.
fn is_unsupported(e: &GroupSolidError) -> bool {
    matches!(e, GroupSolidError::Operation(OperationError::Unsupported(_)))
}

/// A group whose parameters cannot produce a solid contributes nothing.
fn reject_parameters(group: &mut Group, e: &GroupSolidError, prev: &Solid) {
    warn!(group = %group.handle(), error = %e, "group parameters rejected");
    group.issues.push(GroupIssue::InvalidParameters(e.to_string()));
    group.running = prev.clone();
}

/// A group whose source is unusable contributes nothing.
fn pass_through_invalid(group: &mut Group, source: GroupHandle, prev: Option<&Solid>) {
    warn!(group = %group.handle(), %source, "source group is not an earlier group");
    group.issues.push(GroupIssue::InvalidSource(source));
    group.running = prev.cloned().unwrap_or_default();
    group.display_dirty = true;
}
