//! Core deterministic primitives.
//!
//! Integer-only building blocks shared by the simulation and the
//! inference layer.

pub mod fixed;
pub mod vec2;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, Q15, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use hash::{compute_state_hash, StateHash};
