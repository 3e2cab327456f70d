use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::EvalConfig;
use crate::identity::FaceTag;
use crate::math::{Point3, Vector3};
use crate::mesh::{point_key, Mesh};
use crate::solid::Solid;
use crate::tessellation::TessellateShell;

use super::Group;

/// Triangles and edges derived from a group's running solid for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayCache {
    pub mesh: Mesh,
    /// One flat normal per triangle of `mesh`; zero for slivers.
    pub normals: Vec<Vector3>,
    pub edges: Vec<(Point3, Point3)>,
}

impl DisplayCache {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Group {
    /// Rebuilds the display cache if the running solid changed since the
    /// last call, then clears the dirty flag. Returns `true` if it rebuilt.
    pub fn generate_display_items(&mut self, config: &EvalConfig) -> bool {
        if !self.display_dirty {
            return false;
        }
        self.display.clear();

        match &self.running {
            Solid::Shell(shell) => {
                if let Err(e) = TessellateShell::new(config.tessellation)
                    .execute_into(shell, &mut self.display.mesh)
                {
                    warn!(group = %self.handle, error = %e, "display tessellation failed");
                }
                if config.show_edges {
                    self.display.edges = shell.edges(&config.tessellation);
                }
            }
            Solid::Mesh(mesh) => self.display.mesh.merge(mesh),
        }
        self.display.normals = self
            .display
            .mesh
            .triangles
            .iter()
            .map(|t| t.normal().unwrap_or_else(Vector3::zeros))
            .collect();
        if config.show_edges {
            let emphasized = emphasized_edges(&self.display.mesh);
            self.display.edges.extend(emphasized);
        }

        debug!(
            group = %self.handle,
            triangles = self.display.mesh.len(),
            edges = self.display.edges.len(),
            "display items rebuilt"
        );
        self.display_dirty = false;
        true
    }
}

/// Mesh edges worth drawing: those with no partner triangle, more than
/// one, or a partner from a different face.
fn emphasized_edges(mesh: &Mesh) -> Vec<(Point3, Point3)> {
    type Key = ([u64; 3], [u64; 3]);
    let mut uses: HashMap<Key, Vec<&FaceTag>> = HashMap::new();
    let mut order: Vec<(Key, Point3, Point3)> = Vec::new();

    for tri in &mesh.triangles {
        let v = tri.vertices();
        for i in 0..3 {
            let (a, b) = (v[i], v[(i + 1) % 3]);
            let (ka, kb) = (point_key(&a), point_key(&b));
            let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
            let entry = uses.entry(key).or_default();
            if entry.is_empty() {
                order.push((key, a, b));
            }
            entry.push(&tri.tag);
        }
    }

    order
        .into_iter()
        .filter(|(key, _, _)| {
            uses.get(key)
                .is_some_and(|tags| tags.len() != 2 || tags[0] != tags[1])
        })
        .map(|(_, a, b)| (a, b))
        .collect()
}
