//! Ball Simulation
//!
//! Deterministic fixed-point physics for a single ball in a walled arena,
//! plus the per-frame driver that pairs each physics tick with a glint
//! backend call and the sprite the renderer draws.

pub mod input;
pub mod state;
pub mod physics;
pub mod frame;
pub mod render;

pub use input::{AccelCounts, SimInput};
pub use state::{ArenaBounds, Ball, SimParams, World};
pub use physics::{Bounces, Wall};
pub use frame::{FrameDriver, FrameOutput};
pub use render::{BallSprite, draw_ball};
