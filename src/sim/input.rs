//! Accelerometer Input and Normalization
//!
//! Raw sensor counts are mapped to Q15 tilt samples before they reach the
//! physics step. The FXLS8974 in its default mode reports roughly 512
//! counts per 1g.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Q15, Q15_ONE, Q15_MAX, clamp_sym_i32};

/// Counts per 1g for the on-board accelerometer.
pub const DEFAULT_ACCEL_MAP_DENOM: i32 = 512;

/// Raw accelerometer reading in sensor counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccelCounts {
    /// X axis counts
    pub x: i16,
    /// Y axis counts
    pub y: i16,
    /// Z axis counts (unused by the 2D simulation)
    pub z: i16,
}

impl AccelCounts {
    /// Create a reading.
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

/// One frame's normalized tilt, Q15 per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimInput {
    /// X tilt (Q15, roughly -1.0..=1.0)
    pub ax_q15: Q15,
    /// Y tilt (Q15, roughly -1.0..=1.0)
    pub ay_q15: Q15,
}

impl SimInput {
    /// No tilt.
    pub const ZERO: Self = Self { ax_q15: 0, ay_q15: 0 };

    /// Create from Q15 samples.
    pub const fn new(ax_q15: Q15, ay_q15: Q15) -> Self {
        Self { ax_q15, ay_q15 }
    }

    /// Normalize raw counts.
    ///
    /// A non-positive `map_denom` yields zero tilt.
    pub fn from_counts(counts: AccelCounts, map_denom: i32) -> Self {
        Self {
            ax_q15: normalize_axis(counts.x, map_denom),
            ay_q15: normalize_axis(counts.y, map_denom),
        }
    }
}

/// Map sensor counts to Q15, clamped to `±Q15_MAX`.
#[inline]
pub fn normalize_axis(counts: i16, map_denom: i32) -> Q15 {
    if map_denom <= 0 {
        return 0;
    }
    // |counts| * 32768 fits i32 for any i16 input
    let scaled = (counts as i32) * Q15_ONE / map_denom;
    clamp_sym_i32(scaled, Q15_MAX)
}
