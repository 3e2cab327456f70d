use crate::error::ConfigError;
use crate::math::LENGTH_EPS;
use crate::tessellation::TessellationParams;

/// Settings shared by every group evaluated in a chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalConfig {
    /// Distance below which two points are considered coincident.
    pub length_eps: f64,
    /// Weld radius used when reconciling a mesh after a boolean fold.
    pub snap_tolerance: f64,
    /// Maximum number of triangles held in one kd-tree leaf.
    pub kd_leaf_size: usize,
    /// Curve and surface subdivision settings.
    pub tessellation: TessellationParams,
    /// Whether display caches carry edge lines.
    pub show_edges: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            length_eps: LENGTH_EPS,
            snap_tolerance: 1e-5,
            kd_leaf_size: 12,
            tessellation: TessellationParams::default(),
            show_edges: true,
        }
    }
}

impl EvalConfig {
    /// Checks that every field holds a usable value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("length_eps", self.length_eps)?;
        positive("snap_tolerance", self.snap_tolerance)?;
        positive("tessellation.tolerance", self.tessellation.tolerance)?;
        if self.kd_leaf_size == 0 {
            return Err(ConfigError::EmptyLeaf);
        }
        let TessellationParams {
            min_segments,
            max_segments,
            ..
        } = self.tessellation;
        if min_segments == 0 || min_segments > max_segments {
            return Err(ConfigError::InvertedSegments {
                min: min_segments,
                max: max_segments,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(EvalConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let config = EvalConfig {
            snap_tolerance: 0.0,
            ..EvalConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "snap_tolerance",
                value: 0.0
            })
        );

        let config = EvalConfig {
            length_eps: f64::NAN,
            ..EvalConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "length_eps",
                ..
            })
        ));
    }

    #[test]
    fn rejects_inverted_segments() {
        let mut config = EvalConfig::default();
        config.tessellation.min_segments = 10;
        config.tessellation.max_segments = 2;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedSegments { min: 10, max: 2 })
        );
    }

    #[test]
    fn rejects_empty_leaf() {
        let config = EvalConfig {
            kd_leaf_size: 0,
            ..EvalConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyLeaf));
    }
}
