mod tessellate_face;
mod tessellate_shell;

pub use tessellate_face::TessellateFace;
pub use tessellate_shell::TessellateShell;

/// Parameters controlling tessellation quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationParams {
    /// Maximum allowed deviation from the true geometry.
    pub tolerance: f64,
    /// Minimum number of segments for a curved span.
    pub min_segments: usize,
    /// Maximum number of segments for a curved span.
    pub max_segments: usize,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            min_segments: 4,
            max_segments: 256,
        }
    }
}
