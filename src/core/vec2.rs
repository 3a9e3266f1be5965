//! Fixed-Point 2D Vector
//!
//! Position and velocity pairs for the ball. Components are Q16.16.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, FIXED_SCALE, fixed_to_int, to_float};

/// 2D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec2 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component (Q16.16 fixed-point)
    pub y: Fixed,
}

impl FixedVec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
        }
    }

    /// Integer parts of both components (floor).
    #[inline]
    pub const fn to_ints(self) -> (i32, i32) {
        (fixed_to_int(self.x), fixed_to_int(self.y))
    }

    /// Convert to floats for display.
    #[inline]
    pub fn to_floats(self) -> (f32, f32) {
        (to_float(self.x), to_float(self.y))
    }

    /// Check if both components are zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl fmt::Debug for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.to_floats();
        write!(f, "Vec2({:.4}, {:.4})", x, y)
    }
}
