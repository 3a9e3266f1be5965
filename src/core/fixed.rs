//! Q16.16 / Q15 Fixed-Point Arithmetic
//!
//! Integer-only math for the ball simulation. Every multiply between two
//! fixed-point operands widens to i64 before shifting back.
//!
//! ## Formats
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Q16.16 (i32): [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]      │
//! │                 value = raw / 65536                         │
//! │                                                             │
//! │  Q15 (i32):    normalized accelerometer sample              │
//! │                 value = raw / 32768, |value| <= ~1.0        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Positions are pixels, velocities pixels/second, accelerations
//! pixels/second². Integer pixel coordinates are `raw >> 16` (floor).

/// Q16.16 fixed-point number stored as i32.
pub type Fixed = i32;

/// Q15 fixed-point sample stored as i32.
pub type Q15 = i32;

/// Number of fractional bits in Q16.16 (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in Q16.16 (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE;

/// 0.5 in Q16.16 (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1;

/// Number of fractional bits in Q15 (15)
pub const Q15_SCALE: i32 = 15;

/// 1.0 in Q15 (32768). Not representable in i16, so samples live in i32.
pub const Q15_ONE: Q15 = 1 << Q15_SCALE;

/// Largest Q15 magnitude produced by normalization (0.99997)
pub const Q15_MAX: Q15 = Q15_ONE - 1;

// =============================================================================
// CLAMPING PRIMITIVES
// =============================================================================

/// Absolute value.
///
/// `i32::MIN` wraps to itself rather than panicking.
#[inline]
pub fn abs_i32(v: i32) -> i32 {
    if v < 0 { v.wrapping_neg() } else { v }
}

/// Clamp `v` to `[lo, hi]`.
///
/// Callers guarantee `lo <= hi`; this is checked in debug builds only.
#[inline]
pub fn clamp_i32(v: i32, lo: i32, hi: i32) -> i32 {
    debug_assert!(lo <= hi, "clamp_i32 called with lo > hi");
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

/// Clamp `v` to `[-limit, limit]`.
#[inline]
pub fn clamp_sym_i32(v: i32, limit: i32) -> i32 {
    if v > limit {
        limit
    } else if v < -limit {
        -limit
    } else {
        v
    }
}

// =============================================================================
// WIDENING OPERATIONS
// =============================================================================

/// Convert a compile-time float to Q16.16.
///
/// # Warning
/// Only use for constants and test fixtures. NEVER in the step loop.
///
/// # Example
/// ```
/// use edgeai_sand::core::fixed::{to_fixed, FIXED_ONE};
/// const DAMP: i32 = to_fixed(0.5);
/// assert_eq!(DAMP, FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert Q16.16 to float for display.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Integer part of a Q16.16 value (arithmetic shift, rounds toward -inf).
#[inline]
pub const fn fixed_to_int(f: Fixed) -> i32 {
    f >> FIXED_SCALE
}

/// Integer to Q16.16. Fractional part is zero.
#[inline]
pub const fn int_to_fixed(i: i32) -> Fixed {
    i << FIXED_SCALE
}

/// Multiply two Q16.16 numbers.
///
/// Uses an i64 intermediate, then an arithmetic shift (floor).
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Scale a Q15 sample by an integer gain, producing Q16.16.
///
/// `sample * gain` is Q15 in the gain's unit; one extra left shift aligns
/// it to 16 fractional bits.
#[inline]
pub fn q15_scale_to_fixed(sample: Q15, gain: i32) -> Fixed {
    let wide = (sample as i64) * (gain as i64);
    (wide << (FIXED_SCALE - Q15_SCALE)) as Fixed
}

/// Scale a velocity by the restitution factor 3/4 and reverse it.
///
/// Division truncates toward zero.
#[inline]
pub fn bounce_velocity(v: Fixed) -> Fixed {
    (-((v as i64) * 3) / 4) as Fixed
}
