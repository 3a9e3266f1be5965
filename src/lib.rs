//! # EdgeAI Sand
//!
//! Tilt-driven ball simulation for a small embedded display, with a
//! per-frame "glint" computed procedurally or by on-device inference.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       EDGEAI SAND                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 / Q15 fixed-point arithmetic       │
//! │  ├── vec2.rs     - 2D vector with fixed-point                │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  sim/            - Ball simulation (deterministic)           │
//! │  ├── input.rs    - Accelerometer normalization               │
//! │  ├── state.rs    - Ball, params and world                    │
//! │  ├── physics.rs  - Integrator, wall bounce, replay           │
//! │  ├── frame.rs    - Per-frame orchestration                   │
//! │  └── render.rs   - Ball sprite and scanline blit             │
//! │                                                              │
//! │  npu/            - Glint inference                           │
//! │  ├── stub.rs     - Procedural backend                        │
//! │  ├── neutron.rs  - Model backend                             │
//! │  ├── router.rs   - Backend selection and gating              │
//! │  └── runtime.rs  - Tensor runtime capability                 │
//! │                                                              │
//! │  platform.rs     - Sensor and display capabilities           │
//! │  config.rs       - Host configuration                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `sim/` physics are integer-only:
//! - No floating-point arithmetic in the step
//! - Every fixed-point product is formed in i64
//! - No time or environment dependencies
//!
//! Given identical inputs and parameters, the ball follows an
//! **identical trajectory** on any target.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod sim;
pub mod npu;
pub mod platform;
pub mod config;

// Re-export commonly used types
pub use core::fixed::{Fixed, Q15, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use sim::{Ball, SimInput, SimParams, World, FrameDriver};
pub use npu::{BackendRouter, InferenceBackend, NpuConfig, NpuError};
pub use config::EdgeAiConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Display width (px)
pub const LCD_WIDTH: i32 = 480;

/// Display height (px)
pub const LCD_HEIGHT: i32 = 320;

/// Frame rate (Hz)
pub const TICK_RATE: u32 = 60;
