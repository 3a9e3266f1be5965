//! Inference Layer Errors

/// Errors from backend init and step.
///
/// Init errors leave the backend disabled. Step errors only cost the
/// current frame's glint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NpuError {
    /// Inference is gated off by configuration.
    #[error("NPU inference disabled")]
    InferenceDisabled,

    /// Backend has not completed init (or init failed).
    #[error("backend not ready")]
    NotReady,

    /// Model bytes could not be parsed.
    #[error("invalid model: {0}")]
    ModelInvalid(String),

    /// Model schema version differs from the runtime's.
    #[error("model schema version {found} does not match runtime version {expected}")]
    SchemaVersionMismatch {
        /// Version the runtime understands
        expected: u32,
        /// Version found in the model
        found: u32,
    },

    /// Tensors do not fit the scratch arena.
    #[error("tensor arena too small: need {required} bytes, have {available}")]
    ArenaTooSmall {
        /// Bytes the tensors need
        required: usize,
        /// Bytes in the arena
        available: usize,
    },

    /// Model asks for more scratch memory than the backend may reserve.
    #[error("model requests {requested} byte arena, limit is {limit}")]
    ArenaLimitExceeded {
        /// Declared arena size
        requested: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// Runtime has no tensor at the requested index.
    #[error("missing {role} tensor {index}")]
    MissingTensor {
        /// "input" or "output"
        role: &'static str,
        /// Tensor index
        index: usize,
    },

    /// Tensor rank exceeds the supported maximum.
    #[error("tensor rank {rank} exceeds maximum of 4")]
    InvalidShape {
        /// Offending rank
        rank: usize,
    },

    /// Runtime invocation failed.
    #[error("inference invoke failed: {0}")]
    InvokeFailed(String),
}

impl NpuError {
    /// Check if this error came from a per-frame condition rather than init.
    pub fn is_transient(&self) -> bool {
        matches!(self, NpuError::InvokeFailed(_))
    }
}
