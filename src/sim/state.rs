//! Simulation State Definitions
//!
//! The ball, its tunable parameters, and the world that owns it.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIXED_ONE, int_to_fixed};
use crate::core::vec2::FixedVec2;
use crate::core::hash::{StateHash, compute_state_hash};
use crate::sim::input::SimInput;
use crate::sim::physics::{self, Bounces};

// =============================================================================
// DEFAULT TUNING (device build)
// =============================================================================

/// Acceleration at 1g tilt: 600 px/s²
pub const DEFAULT_ACCEL_PX_S2: i32 = 600;

/// Step length: 1/60 s = round(65536/60) = 1092
pub const DEFAULT_STEP_Q16: Fixed = 1092;

/// Damping per step: ~0.996 = 65274
pub const DEFAULT_DAMP_Q16: Fixed = 65274;

// =============================================================================
// BALL
// =============================================================================

/// The simulated ball.
///
/// Position is always inside the arena bounds once a step completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ball {
    /// Position in pixels (Q16.16)
    pub position: FixedVec2,
    /// Velocity in pixels/second (Q16.16)
    pub velocity: FixedVec2,
    /// Render intensity 0..=255, written by the frame driver
    pub glint: u8,
}

impl Ball {
    /// Ball at rest at the given integer pixel position.
    pub const fn at_rest(x: i32, y: i32) -> Self {
        Self {
            position: FixedVec2::from_ints(x, y),
            velocity: FixedVec2::ZERO,
            glint: 0,
        }
    }

    /// Integer pixel coordinates (floor of Q16.16 position).
    #[inline]
    pub fn pixel(&self) -> (i32, i32) {
        self.position.to_ints()
    }
}

// =============================================================================
// SIM PARAMETERS
// =============================================================================

/// Inclusive arena bounds in integer pixels.
///
/// Callers keep `min_x <= max_x` and `min_y <= max_y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaBounds {
    /// Left edge
    pub min_x: i32,
    /// Right edge
    pub max_x: i32,
    /// Top edge
    pub min_y: i32,
    /// Bottom edge
    pub max_y: i32,
}

impl ArenaBounds {
    /// Bounds `[0, width-1] x [0, height-1]`.
    pub const fn for_display(width: i32, height: i32) -> Self {
        Self {
            min_x: 0,
            max_x: width - 1,
            min_y: 0,
            max_y: height - 1,
        }
    }

    /// Check the ordering invariant on both axes.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Check if an integer pixel lies within the bounds.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self::for_display(crate::LCD_WIDTH, crate::LCD_HEIGHT)
    }
}

/// Tunable simulation constants. Immutable for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// X acceleration at 1g, px/s²
    pub accel_x_px_s2: i32,
    /// Y acceleration at 1g, px/s²
    pub accel_y_px_s2: i32,
    /// Step length in seconds (Q16.16)
    pub step_q16: Fixed,
    /// Velocity multiplier per step (Q16.16, expected in (0, 1.0])
    pub damp_q16: Fixed,
    /// Arena bounds
    pub bounds: ArenaBounds,
}

impl SimParams {
    /// Same acceleration scale on both axes.
    pub fn with_accel(mut self, px_s2: i32) -> Self {
        self.accel_x_px_s2 = px_s2;
        self.accel_y_px_s2 = px_s2;
        self
    }

    /// Replace the arena bounds.
    pub fn with_bounds(mut self, bounds: ArenaBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Check that the damping factor lies in (0, 1.0].
    pub fn damping_is_valid(&self) -> bool {
        self.damp_q16 > 0 && self.damp_q16 <= FIXED_ONE
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            accel_x_px_s2: DEFAULT_ACCEL_PX_S2,
            accel_y_px_s2: DEFAULT_ACCEL_PX_S2,
            step_q16: DEFAULT_STEP_Q16,
            damp_q16: DEFAULT_DAMP_Q16,
            bounds: ArenaBounds::default(),
        }
    }
}

// =============================================================================
// WORLD
// =============================================================================

/// Owns the ball for the whole run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    /// The ball
    pub ball: Ball,
    /// Steps taken since init
    pub steps: u64,
    /// Bounces from the most recent step
    #[serde(skip)]
    pub last_bounces: Bounces,
}

impl World {
    /// Create a world with the ball at rest in the arena center.
    pub fn new(width: i32, height: i32) -> Self {
        let mut world = Self {
            ball: Ball::default(),
            steps: 0,
            last_bounces: Bounces::default(),
        };
        world.init(width, height);
        world
    }

    /// Reset the ball to the arena center with zero velocity and glint.
    pub fn init(&mut self, width: i32, height: i32) {
        self.ball = Ball {
            position: FixedVec2::new(int_to_fixed(width / 2), int_to_fixed(height / 2)),
            velocity: FixedVec2::ZERO,
            glint: 0,
        };
        self.steps = 0;
        self.last_bounces = Bounces::default();
    }

    /// Advance one tick. Never fails.
    pub fn step(&mut self, input: &SimInput, params: &SimParams) -> Ball {
        self.last_bounces = physics::step(&mut self.ball, input, params);
        self.steps += 1;
        self.ball
    }

    /// Compute hash of the kinematic state for replay verification.
    ///
    /// Glint is derived per frame by the inference layer and is not hashed.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.steps, |h| {
            h.update_vec2(self.ball.position);
            h.update_vec2(self.ball.velocity);
        })
    }
}
