use std::fmt;

use crate::{fixed_to_float, float_to_fixed};

pub const FRACBITS: i32 = 16;
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// A Doom style `fixed_t`: 16 bits of integer and 16 bits of fraction packed
/// in to an `i32`.
///
/// | Bits  | Content         |
/// |-------|-----------------|
/// | 31    | Sign            |
/// | 30-16 | Integer part    |
/// | 15-0  | Fractional part |
///
/// Addition and subtraction saturate. Multiplication saturates, and division
/// clamps to `i32::MAX`/`i32::MIN` (with the sign of the result) when the
/// quotient would not fit.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(i32);

impl FixedPoint {
    /// Wrap an already fixed-point raw value
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn unit() -> Self {
        Self(FRACUNIT)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn min() -> Self {
        Self(i32::MIN)
    }

    pub const fn max() -> Self {
        Self(i32::MAX)
    }

    /// Convert a whole map unit to fixed point. Values outside of the 16 bit
    /// integer range wrap, as they do in every Doom engine.
    pub const fn from_int(value: i32) -> Self {
        Self(value.wrapping_shl(FRACBITS as u32))
    }

    /// Truncate to whole map units, rounding toward negative infinity
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedPoint({})", fixed_to_float(self.0))
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", fixed_to_float(self.0))
    }
}

impl From<i16> for FixedPoint {
    fn from(value: i16) -> Self {
        Self((value as i32) << FRACBITS)
    }
}

impl From<f32> for FixedPoint {
    fn from(value: f32) -> Self {
        Self(float_to_fixed(value))
    }
}

impl From<FixedPoint> for f32 {
    fn from(value: FixedPoint) -> Self {
        fixed_to_float(value.0)
    }
}

impl From<FixedPoint> for i32 {
    fn from(value: FixedPoint) -> Self {
        value.to_int()
    }
}

impl std::ops::Add for FixedPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for FixedPoint {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for FixedPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::SubAssign for FixedPoint {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<FixedPoint> for FixedPoint {
    type Output = Self;

    fn mul(self, rhs: FixedPoint) -> Self::Output {
        // Use i64 to avoid overflow during multiplication
        let result = (self.0 as i64 * rhs.0 as i64) >> FRACBITS;

        if result > i32::MAX as i64 {
            Self(i32::MAX)
        } else if result < i32::MIN as i64 {
            Self(i32::MIN)
        } else {
            Self(result as i32)
        }
    }
}

impl std::ops::Div<FixedPoint> for FixedPoint {
    type Output = Self;

    /// `FixedDiv`. Division by zero, or any quotient of 2^15 or more, clamps
    /// to the largest value carrying the sign of the result.
    fn div(self, rhs: FixedPoint) -> Self::Output {
        let (a, b) = (self.0, rhs.0);
        if (a.unsigned_abs() >> 14) >= b.unsigned_abs() {
            Self(((a ^ b) >> 31) ^ i32::MAX)
        } else {
            Self((((a as i64) << FRACBITS) / b as i64) as i32)
        }
    }
}

impl std::ops::Rem<FixedPoint> for FixedPoint {
    type Output = Self;

    /// Power of two divisors are masked. Anything else is a remainder that is
    /// pushed back above zero when negative.
    fn rem(self, rhs: FixedPoint) -> Self::Output {
        let (a, b) = (self.0, rhs.0);
        if b & b.wrapping_sub(1) != 0 {
            let r = a.wrapping_rem(b);
            if r < 0 { Self(r.wrapping_add(b)) } else { Self(r) }
        } else {
            Self(a & b.wrapping_sub(1))
        }
    }
}
