use thiserror::Error;

/// Top-level error type for group evaluation.
#[derive(Debug, Error)]
pub enum GroupSolidError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to modeling operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    /// The operation cannot be carried out exactly on this representation.
    #[error("unsupported by this representation: {0}")]
    Unsupported(String),
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Errors raised while validating an evaluation configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("segment bounds are inverted: min {min} > max {max}")]
    InvertedSegments { min: usize, max: usize },

    #[error("kd-tree leaf size must be at least 1")]
    EmptyLeaf,
}

/// Convenience type alias for results using [`GroupSolidError`].
pub type Result<T> = std::result::Result<T, GroupSolidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unsupported_operations_are_representation_limits() {
        let errors = [
            OperationError::InvalidInput("axis".into()),
            OperationError::NotFound("group g001".into()),
            OperationError::Unsupported("curved surface patch".into()),
        ];
        for e in errors {
            let limit = match &e {
                OperationError::Unsupported(_) => true,
                OperationError::InvalidInput(_) | OperationError::NotFound(_) => false,
            };
            let wrapped = GroupSolidError::from(e);
            assert_eq!(
                limit,
                matches!(wrapped, GroupSolidError::Operation(OperationError::Unsupported(_)))
            );
            assert!(!wrapped.to_string().is_empty());
        }
    }

    #[test]
    fn tessellation_failure_reads_as_failure() {
        let e = GroupSolidError::from(TessellationError::Failed("CDT insert".into()));
        assert_eq!(e.to_string(), "tessellation failed: CDT insert");
    }
}
