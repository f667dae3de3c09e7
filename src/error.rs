use thiserror::Error;

/// Errors that can occur when using the projection index.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("dimension must be greater than 0")]
    ZeroDimension,

    /// Every random draw for an axis normalized to the zero vector.
    #[error("could not draw a non-degenerate projection axis after {attempts} attempts")]
    DegenerateAxis { attempts: usize },

    /// A removal touched only some of the per-axis projections. The index
    /// no longer satisfies its invariants and must be discarded.
    #[error("internal inconsistency: removed entry from {removed} of {expected} projections")]
    InternalInconsistency { removed: usize, expected: usize },

    #[error("corrupt index: {0}")]
    CorruptIndex(String),
}

impl ProjectionError {
    /// True for errors that leave the index in an unusable state.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProjectionError::InternalInconsistency { .. } | ProjectionError::CorruptIndex(_)
        )
    }
}

/// A specialized Result type for projection index operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
