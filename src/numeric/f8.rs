//! Custom quarter-precision (8-bit) float, software-emulated.
//!
//! Layout follows the OCP E4M3FN convention: 1 sign bit, 4 exponent bits
//! (bias 7), 3 mantissa bits, no infinities — values that would overflow
//! saturate to the largest finite magnitude (`±448.0`), and there is a
//! single NaN bit pattern rather than a whole family.

use core::fmt;

const MANT_BITS: u32 = 3;
const BIAS: i32 = 7;
const MAX_BIASED_EXP: i32 = 14;
const DROP_BITS: u32 = 23 - MANT_BITS;
const NAN_BITS: u8 = 0x7F;
const MAX_FINITE_BITS: u8 = 0x7E;
/// Largest finite magnitude representable by [`F8`].
pub const MAX_VALUE: f32 = 448.0;

/// A custom 8-bit float (E4M3-style), used where IEEE half precision is too
/// wide — primarily for testing quantization-aware code paths.
#[derive(Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct F8(u8);

impl F8 {
    /// The additive identity.
    pub const ZERO: Self = Self(0);
    /// The multiplicative identity.
    pub const ONE: Self = Self(0b0_0111_000);

    /// Wraps a raw bit pattern without validation.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw bit pattern.
    #[must_use]
    pub const fn to_bits(self) -> u8 {
        self.0
    }

    /// Converts from `f32`, rounding to nearest, ties-to-even, and saturating
    /// on overflow.
    #[must_use]
    pub fn from_f32(value: f32) -> Self {
        if value == 0.0 {
            return Self(u8::from(value.is_sign_negative()) << 7);
        }
        if value.is_nan() {
            return Self(NAN_BITS);
        }

        let sign: u8 = u8::from(value.is_sign_negative());
        let magnitude = value.abs();

        if !magnitude.is_finite() || magnitude >= MAX_VALUE * 1.0625 {
            return Self((sign << 7) | MAX_FINITE_BITS);
        }

        let bits = magnitude.to_bits();
        let exp8 = i32::try_from((bits >> 23) & 0xFF).unwrap_or(0);
        let mant23 = bits & 0x007F_FFFF;
        let unbiased = exp8 - 127;
        let biased = unbiased + BIAS;
        let significand = 0x0080_0000 | mant23;

        if biased > MAX_BIASED_EXP {
            return Self((sign << 7) | MAX_FINITE_BITS);
        }

        if biased < 1 {
            let extra = u32::try_from(1 - biased).unwrap_or(24);
            let shift = DROP_BITS + extra;
            if shift >= 24 + MANT_BITS {
                return Self(sign << 7);
            }
            let (result, _) = round_shift(significand, shift);
            if result == 0 {
                return Self(sign << 7);
            }
            if result > 0x7 {
                // rounded up into the smallest normal value.
                return Self((sign << 7) | (1 << MANT_BITS));
            }
            return Self((sign << 7) | (result as u8));
        }

        let (result, _) = round_shift(significand, DROP_BITS);
        let (exp_field, mantissa) = if result > 0xF {
            (biased + 1, 0u32)
        } else {
            (biased, result & 0x7)
        };

        if exp_field > MAX_BIASED_EXP {
            return Self((sign << 7) | MAX_FINITE_BITS);
        }

        Self((sign << 7) | ((exp_field as u8) << MANT_BITS) | (mantissa as u8))
    }

    /// Converts to `f32` exactly (every `F8` value has an exact `f32`
    /// representation).
    #[must_use]
    pub fn to_f32(self) -> f32 {
        let bits = self.0;
        let sign = if bits & 0x80 != 0 { -1.0f32 } else { 1.0f32 };
        let exp_field = i32::from((bits >> MANT_BITS) & 0xF);
        let mantissa = f32::from(bits & 0x7);

        if exp_field == 0 {
            if mantissa == 0.0 {
                return sign * 0.0;
            }
            // subnormal: value = mantissa/8 * 2^(1-bias)
            return sign * (mantissa / 8.0) * 2f32.powi(1 - BIAS);
        }

        if exp_field == 0xF && bits & 0x7 == 0x7 {
            return f32::NAN;
        }

        let frac = 1.0 + mantissa / 8.0;
        sign * frac * 2f32.powi(exp_field - BIAS)
    }
}

/// Rounds `value` right by `shift` bits, round-to-nearest ties-to-even.
fn round_shift(value: u32, shift: u32) -> (u32, bool) {
    if shift == 0 {
        return (value, false);
    }
    if shift >= 32 {
        return (0, false);
    }
    let half = 1u32 << (shift - 1);
    let mask = (1u32 << shift) - 1;
    let remainder = value & mask;
    let mut result = value >> shift;
    let round_up = remainder > half || (remainder == half && (result & 1) == 1);
    if round_up {
        result += 1;
    }
    (result, round_up)
}

impl fmt::Debug for F8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F8({})", self.to_f32())
    }
}

impl fmt::Display for F8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl From<f32> for F8 {
    fn from(value: f32) -> Self {
        Self::from_f32(value)
    }
}

impl From<F8> for f32 {
    fn from(value: F8) -> Self {
        value.to_f32()
    }
}
