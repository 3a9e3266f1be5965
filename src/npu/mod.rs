//! Glint Inference Layer
//!
//! Turns the ball's motion into a glint intensity through one of two
//! interchangeable backends:
//!
//! - `stub`: procedural, pure function of speed
//! - `neutron`: tensor-graph model behind a [`runtime::ModelRuntime`]
//!
//! [`router::BackendRouter`] owns exactly one backend chosen at startup
//! and gates every call on its state and the inference-enabled flag.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{abs_i32, fixed_to_int};
use crate::core::vec2::FixedVec2;

pub mod error;
pub mod tensor;
pub mod runtime;
pub mod reference;
pub mod stub;
pub mod neutron;
pub mod router;

pub use error::NpuError;
pub use neutron::NeutronBackend;
pub use router::{BackendRouter, NpuConfig};
pub use runtime::ModelRuntime;
pub use stub::StubBackend;

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Which backend implementation is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Procedural glint from speed
    #[default]
    Stub,
    /// Model inference
    Neutron,
}

impl BackendKind {
    /// One-character tag for the status line.
    pub const fn tag(self) -> char {
        match self {
            BackendKind::Stub => 'S',
            BackendKind::Neutron => 'N',
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Stub => f.write_str("stub"),
            BackendKind::Neutron => f.write_str("neutron"),
        }
    }
}

/// Unrecognized backend name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown NPU backend: {0:?}")]
pub struct ParseBackendError(pub String);

impl FromStr for BackendKind {
    type Err = ParseBackendError;

    /// Accepts `stub`/`neutron`, their tags, or the numeric ids `0`/`1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stub" | "s" | "0" => Ok(BackendKind::Stub),
            "neutron" | "n" | "1" => Ok(BackendKind::Neutron),
            _ => Err(ParseBackendError(s.to_string())),
        }
    }
}

// =============================================================================
// BACKEND STATE
// =============================================================================

/// Lifecycle of a backend. Only `Ready` permits `step`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BackendState {
    /// Init not attempted (or skipped)
    #[default]
    Uninitialized,
    /// Init succeeded
    Ready,
    /// Init failed; stays disabled
    Failed,
}

// =============================================================================
// MOTION SAMPLE
// =============================================================================

/// Integer absolute speeds handed to a backend each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionSample {
    /// |vx| in px/s
    pub speed_x: i32,
    /// |vy| in px/s
    pub speed_y: i32,
}

impl MotionSample {
    /// Create from integer speeds.
    pub const fn new(speed_x: i32, speed_y: i32) -> Self {
        Self { speed_x, speed_y }
    }

    /// Truncate a Q16.16 velocity (arithmetic shift), then take magnitudes.
    pub fn from_velocity(velocity: FixedVec2) -> Self {
        Self {
            speed_x: abs_i32(fixed_to_int(velocity.x)),
            speed_y: abs_i32(fixed_to_int(velocity.y)),
        }
    }
}

// =============================================================================
// BACKEND TRAIT
// =============================================================================

/// "Compute glint from motion."
pub trait InferenceBackend: Send {
    /// Which implementation this is.
    fn kind(&self) -> BackendKind;

    /// Bring the backend to `Ready`. Failure leaves it disabled.
    fn init(&mut self) -> Result<(), NpuError>;

    /// Produce this frame's glint. Fails unless `Ready`.
    fn step(&mut self, motion: &MotionSample) -> Result<u8, NpuError>;

    /// Current lifecycle state.
    fn state(&self) -> BackendState;
}
