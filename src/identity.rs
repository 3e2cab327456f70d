//! Face identity tags and the remapping rules that keep them stable across
//! extrusion, replication and import.

use std::fmt;

use crate::group::GroupHandle;
use crate::mesh::Mesh;
use crate::sketch::EntityId;
use crate::topology::Shell;

/// Identifies the sketch entity (or pseudo-entity) a face came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FaceTag {
    /// The face has no selectable origin.
    #[default]
    NoEntity,
    /// A sketch entity tagged directly.
    Entity(EntityId),
    /// A tag derived by `group` from `source` under `key`.
    Remapped {
        group: GroupHandle,
        source: Box<FaceTag>,
        key: RemapKey,
    },
}

/// Symbolic key used to derive a fresh tag from an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemapKey {
    /// Copy `n` of a step-and-repeat; import uses copy 0 as pass-through.
    Copy(u32),
    /// The final copy of a step-and-repeat, whatever the count.
    Last,
    /// Top cap of an extrusion.
    Top,
    /// Bottom cap of an extrusion.
    Bottom,
    /// Side face swept from a sketch line.
    LineToFace,
}

impl RemapKey {
    /// Key for iteration `a` of `n` in a step-and-repeat.
    #[must_use]
    pub fn for_iteration(a: u32, n: u32) -> Self {
        if a + 1 == n {
            Self::Last
        } else {
            Self::Copy(a)
        }
    }
}

impl fmt::Display for RemapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy(n) => write!(f, "copy{n}"),
            Self::Last => f.write_str("last"),
            Self::Top => f.write_str("top"),
            Self::Bottom => f.write_str("bottom"),
            Self::LineToFace => f.write_str("line-to-face"),
        }
    }
}

/// Derives the tag that `group` assigns to `tag` under `key`.
///
/// Pure and deterministic: the same inputs always produce the same tag.
#[must_use]
pub fn remap(group: GroupHandle, tag: &FaceTag, key: RemapKey) -> FaceTag {
    FaceTag::Remapped {
        group,
        source: Box::new(tag.clone()),
        key,
    }
}

impl FaceTag {
    #[must_use]
    pub fn is_tagged(&self) -> bool {
        !matches!(self, Self::NoEntity)
    }

    /// The sketch entity this tag ultimately derives from, if any.
    ///
    /// Cap tags have no originating entity.
    #[must_use]
    pub fn origin_entity(&self) -> Option<EntityId> {
        let mut tag = self;
        loop {
            match tag {
                Self::NoEntity => return None,
                Self::Entity(id) => return Some(*id),
                Self::Remapped { source, .. } => tag = source.as_ref(),
            }
        }
    }

    /// The group that assigned this tag, if it was remapped.
    #[must_use]
    pub fn assigned_by(&self) -> Option<GroupHandle> {
        match self {
            Self::Remapped { group, .. } => Some(*group),
            _ => None,
        }
    }
}

/// Rewrites every tagged face of a solid through [`remap`].
///
/// Untagged faces are left alone.
pub trait RemapFaces {
    fn remap_faces(&mut self, group: GroupHandle, key: RemapKey);
}

impl RemapFaces for Shell {
    fn remap_faces(&mut self, group: GroupHandle, key: RemapKey) {
        for face in &mut self.faces {
            if face.tag.is_tagged() {
                face.tag = remap(group, &face.tag, key);
            }
        }
    }
}

impl RemapFaces for Mesh {
    fn remap_faces(&mut self, group: GroupHandle, key: RemapKey) {
        for tri in &mut self.triangles {
            if tri.tag.is_tagged() {
                tri.tag = remap(group, &tri.tag, key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn entity() -> EntityId {
        let mut map: SlotMap<EntityId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn remap_is_deterministic() {
        let e = FaceTag::Entity(entity());
        let a = remap(GroupHandle(3), &e, RemapKey::Copy(2));
        let b = remap(GroupHandle(3), &e, RemapKey::Copy(2));
        assert_eq!(a, b);
        assert_ne!(a, remap(GroupHandle(3), &e, RemapKey::Last));
        assert_ne!(a, remap(GroupHandle(4), &e, RemapKey::Copy(2)));
    }

    #[test]
    fn origin_entity_follows_chain() {
        let id = entity();
        let tag = remap(
            GroupHandle(5),
            &remap(GroupHandle(2), &FaceTag::Entity(id), RemapKey::LineToFace),
            RemapKey::Last,
        );
        assert_eq!(tag.origin_entity(), Some(id));
        assert_eq!(tag.assigned_by(), Some(GroupHandle(5)));

        let cap = remap(GroupHandle(2), &FaceTag::NoEntity, RemapKey::Top);
        assert!(cap.is_tagged());
        assert_eq!(cap.origin_entity(), None);
    }

    #[test]
    fn last_key_for_final_iteration() {
        assert_eq!(RemapKey::for_iteration(0, 3), RemapKey::Copy(0));
        assert_eq!(RemapKey::for_iteration(2, 3), RemapKey::Last);
    }

    #[test]
    fn untagged_triangles_stay_untagged() {
        use crate::math::Point3;
        use crate::mesh::Triangle;

        let id = entity();
        let mut mesh = Mesh::default();
        mesh.triangles.push(Triangle::new(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            FaceTag::NoEntity,
        ));
        mesh.triangles.push(Triangle::new(
            Point3::origin(),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            FaceTag::Entity(id),
        ));
        mesh.remap_faces(GroupHandle(7), RemapKey::Copy(0));
        assert_eq!(mesh.triangles[0].tag, FaceTag::NoEntity);
        assert_eq!(
            mesh.triangles[1].tag,
            remap(GroupHandle(7), &FaceTag::Entity(id), RemapKey::Copy(0))
        );
    }
}
