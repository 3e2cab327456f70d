use crate::error::Result;
use crate::mesh::Mesh;
use crate::topology::Shell;

use super::{TessellateFace, TessellationParams};

/// Tessellates all faces of a shell into one triangle mesh.
pub struct TessellateShell {
    params: TessellationParams,
}

impl TessellateShell {
    /// Creates a new `TessellateShell` operation.
    #[must_use]
    pub fn new(params: TessellationParams) -> Self {
        Self { params }
    }

    /// Executes the tessellation, returning a combined triangle mesh whose
    /// triangles carry their face's tag.
    ///
    /// # Errors
    ///
    /// Returns an error if any face cannot be tessellated.
    pub fn execute(&self, shell: &Shell) -> Result<Mesh> {
        let mut combined = Mesh::default();
        let op = TessellateFace::new(self.params);
        for face in &shell.faces {
            combined.merge(&op.execute(face)?);
        }
        Ok(combined)
    }

    /// Tessellates `shell` and appends the result to `mesh`.
    ///
    /// # Errors
    ///
    /// Returns an error if any face cannot be tessellated.
    pub fn execute_into(&self, shell: &Shell, mesh: &mut Mesh) -> Result<()> {
        mesh.merge(&self.execute(shell)?);
        Ok(())
    }
}
