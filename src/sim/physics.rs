//! Fixed-Point Ball Integrator
//!
//! One call to [`step`] advances the ball by one tick. The order of the
//! stages is fixed:
//!
//! 1. tilt → acceleration (Q15 × px/s² → Q16.16)
//! 2. velocity += acceleration × dt
//! 3. velocity ×= damping
//! 4. position += velocity × dt
//! 5. per-axis wall clamp with 3/4 restitution
//!
//! Damping runs after the acceleration is added so it also bleeds off the
//! contribution from this tick.
//!
//! # Determinism
//!
//! Integer arithmetic only. Every product of two fixed-point operands is
//! formed in i64 before shifting back to 32 bits.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed,
    bounce_velocity, fixed_mul, fixed_to_int, int_to_fixed, q15_scale_to_fixed,
};
use crate::core::hash::StateHash;
use crate::sim::input::SimInput;
use crate::sim::state::{Ball, SimParams, World};

/// Which wall of an axis the ball hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wall {
    /// `min_x` or `min_y`
    Min,
    /// `max_x` or `max_y`
    Max,
}

/// Walls hit during one step. Both axes can bounce in the same step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounces {
    /// X-axis wall, if any
    pub x: Option<Wall>,
    /// Y-axis wall, if any
    pub y: Option<Wall>,
}

impl Bounces {
    /// Check if any wall was hit.
    pub fn any(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

/// Integrate one axis. Returns (velocity, position) before collision.
#[inline]
fn integrate_axis(
    velocity: Fixed,
    position: Fixed,
    accel: Fixed,
    params: &SimParams,
) -> (Fixed, Fixed) {
    let v = velocity.wrapping_add(fixed_mul(accel, params.step_q16));
    let v = fixed_mul(v, params.damp_q16);
    let p = position.wrapping_add(fixed_mul(v, params.step_q16));
    (v, p)
}

/// Clamp one axis to `[min, max]`, bouncing the velocity on contact.
///
/// The clamped position drops its fractional part.
#[inline]
fn collide_axis(position: &mut Fixed, velocity: &mut Fixed, min: i32, max: i32) -> Option<Wall> {
    let cell = fixed_to_int(*position);
    let wall = if cell < min {
        *position = int_to_fixed(min);
        Wall::Min
    } else if cell > max {
        *position = int_to_fixed(max);
        Wall::Max
    } else {
        return None;
    };
    *velocity = bounce_velocity(*velocity);
    Some(wall)
}

/// Advance the ball by one tick.
///
/// Never fails. A zero or negative step length is computed as given.
pub fn step(ball: &mut Ball, input: &SimInput, params: &SimParams) -> Bounces {
    let ax = q15_scale_to_fixed(input.ax_q15, params.accel_x_px_s2);
    let ay = q15_scale_to_fixed(input.ay_q15, params.accel_y_px_s2);

    let (vx, x) = integrate_axis(ball.velocity.x, ball.position.x, ax, params);
    let (vy, y) = integrate_axis(ball.velocity.y, ball.position.y, ay, params);

    ball.velocity.x = vx;
    ball.velocity.y = vy;
    ball.position.x = x;
    ball.position.y = y;

    let bounds = &params.bounds;
    let bounces = Bounces {
        x: collide_axis(&mut ball.position.x, &mut ball.velocity.x, bounds.min_x, bounds.max_x),
        y: collide_axis(&mut ball.position.y, &mut ball.velocity.y, bounds.min_y, bounds.max_y),
    };

    #[cfg(feature = "debug-tracing")]
    if bounces.any() {
        tracing::trace!(?bounces, pixel = ?ball.pixel(), "ball bounced");
    }

    bounces
}

/// Replay a recorded input sequence from a fresh world.
///
/// Returns the final world and its state hash.
pub fn replay(
    width: i32,
    height: i32,
    inputs: &[SimInput],
    params: &SimParams,
) -> (World, StateHash) {
    let mut world = World::new(width, height);
    for input in inputs {
        world.step(input, params);
    }
    let hash = world.compute_hash();
    (world, hash)
}
