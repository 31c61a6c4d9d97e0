//! Q16.16 signed fixed-point arithmetic.
//!
//! The entire streaming path runs on [`Fixed`] values: a real number scaled
//! by 2^16 and stored in an `i32`. Floating point appears only at the
//! configuration boundary (learning rates, thresholds) and in diagnostics.
//!
//! # Key Insight
//!
//! Every product and quotient goes through a 64-bit intermediate before
//! shifting back down, so multiplication never loses more than the
//! fixed-point resolution itself. Overflow of the 64-bit intermediate is out
//! of scope: feature values are assumed bounded to a sane physical range
//! (roughly ±32,768 in real units).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Number of fractional bits in the Q16.16 representation.
pub const FRACTIONAL_BITS: u32 = 16;

/// A Q16.16 signed fixed-point number.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(i32);

impl Fixed {
    /// Zero.
    pub const ZERO: Fixed = Fixed(0);

    /// One (raw value `1 << 16`).
    pub const ONE: Fixed = Fixed(1 << FRACTIONAL_BITS);

    /// Construct from a raw Q16.16 bit pattern.
    pub const fn from_raw(raw: i32) -> Self {
        Fixed(raw)
    }

    /// The raw Q16.16 bit pattern.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Convert from `f32` (configuration boundary only).
    pub fn from_f32(value: f32) -> Self {
        Fixed((value * (1 << FRACTIONAL_BITS) as f32) as i32)
    }

    /// Convert to `f32` (diagnostics only).
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / (1 << FRACTIONAL_BITS) as f32
    }

    /// Fixed-point multiply via a 64-bit intermediate.
    pub fn mul(self, other: Fixed) -> Fixed {
        Fixed(((self.0 as i64 * other.0 as i64) >> FRACTIONAL_BITS) as i32)
    }

    /// Fixed-point divide via a 64-bit intermediate.
    ///
    /// # Panics
    ///
    /// Panics if `other` is zero. Internal callers divide only by values
    /// strictly greater than one.
    pub fn div(self, other: Fixed) -> Fixed {
        Fixed((((self.0 as i64) << FRACTIONAL_BITS) / other.0 as i64) as i32)
    }

    /// Absolute value.
    pub fn abs(self) -> Fixed {
        Fixed(self.0.abs())
    }

    /// True if the value is strictly positive.
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f32())
    }
}

/// Convert a float slice to fixed-point (test and ingest helper).
pub fn to_fixed_vec(values: &[f32]) -> Vec<Fixed> {
    values.iter().map(|&v| Fixed::from_f32(v)).collect()
}
