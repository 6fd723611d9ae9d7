//! Scalar numeric abstraction consumed by the engine and tensor layers.
//!
//! [`Numeric`] is implemented once per supported scalar type (`half::f16`,
//! `f32`, `f64`, the crate's own [`F8`], and the signed integers `i8`, `i32`,
//! `i64`) so a single generic implementation of every engine operation
//! covers all of them.

mod f8;

pub use f8::F8;

use core::fmt::Debug;

/// Scalar element type usable in a [`Tensor`](crate::Tensor) and operated on
/// by an [`Engine`](crate::Engine).
///
/// Every method is total: none of them can fail. Integer division by zero is
/// handled by the engine, not by this trait (see
/// [`Engine::div`](crate::Engine::div)) — [`Numeric::div`] on an integer type
/// returns zero for a zero divisor rather than panicking, so callers that
/// bypass the engine's explicit check still get deterministic behavior.
pub trait Numeric: Copy + Clone + PartialEq + Debug + Send + Sync + 'static {
    /// `true` for signed-integer scalar types. The engine uses this to
    /// decide whether a division needs a zero-divisor check.
    const IS_INTEGER: bool;

    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Returns `true` if `self` is the additive identity. Used by the engine
    /// to detect integer divide-by-zero.
    fn is_zero(self) -> bool;

    /// Constructs a value from an `f64`, used for constant folding (e.g.
    /// scale factors) regardless of the target scalar type.
    fn from_f64(value: f64) -> Self;

    /// Constructs a value from an `f32`, used for constant folding.
    fn from_f32(value: f32) -> Self;

    /// Widens `self` to `f64`. Used internally for transcendental functions
    /// on integer scalar types and for RNG range scaling.
    fn to_f64(self) -> f64;

    /// `self + rhs`.
    fn add(self, rhs: Self) -> Self;
    /// `self - rhs`.
    fn sub(self, rhs: Self) -> Self;
    /// `self * rhs`.
    fn mul(self, rhs: Self) -> Self;
    /// `self / rhs`. Returns zero for an integer zero divisor; see the trait
    /// docs above.
    fn div(self, rhs: Self) -> Self;

    /// `e^self`.
    fn exp(self) -> Self;
    /// `ln(self)`.
    fn log(self) -> Self;
    /// `sqrt(self)`.
    fn sqrt(self) -> Self;
    /// `tanh(self)`.
    fn tanh(self) -> Self;
    /// `1 / (1 + e^-self)`.
    fn sigmoid(self) -> Self;
    /// `self ^ exponent`.
    fn pow(self, exponent: Self) -> Self;

    /// `max(self, 0)`.
    fn relu(self) -> Self;
    /// `self > 0 ? self : alpha * self`.
    fn leaky_relu(self, alpha: Self) -> Self;

    /// Derivative of [`Numeric::relu`] at `self`: `1` if `self > 0`, else `0`.
    fn relu_grad(self) -> Self;
    /// Derivative of [`Numeric::leaky_relu`] at `self`.
    fn leaky_relu_grad(self, alpha: Self) -> Self;
    /// Derivative of [`Numeric::sigmoid`] at `self`: `sigmoid(self) * (1 - sigmoid(self))`.
    fn sigmoid_grad(self) -> Self;
    /// Derivative of [`Numeric::tanh`] at `self`: `1 - tanh(self)^2`.
    fn tanh_grad(self) -> Self;

    /// Strict greater-than. For floating-point types, NaN is never greater
    /// than anything (including another NaN) — this is a deliberate policy
    /// choice, not an accident of IEEE comparison semantics.
    fn greater_than(self, rhs: Self) -> bool;
}

macro_rules! impl_numeric_float {
    ($ty:ty) => {
        impl Numeric for $ty {
            const IS_INTEGER: bool = false;

            fn zero() -> Self {
                0.0
            }
            fn one() -> Self {
                1.0
            }
            fn is_zero(self) -> bool {
                self == 0.0
            }
            fn from_f64(value: f64) -> Self {
                value as Self
            }
            fn from_f32(value: f32) -> Self {
                value as Self
            }
            fn to_f64(self) -> f64 {
                self as f64
            }
            fn add(self, rhs: Self) -> Self {
                self + rhs
            }
            fn sub(self, rhs: Self) -> Self {
                self - rhs
            }
            fn mul(self, rhs: Self) -> Self {
                self * rhs
            }
            fn div(self, rhs: Self) -> Self {
                self / rhs
            }
            fn exp(self) -> Self {
                self.exp()
            }
            fn log(self) -> Self {
                self.ln()
            }
            fn sqrt(self) -> Self {
                self.sqrt()
            }
            fn tanh(self) -> Self {
                self.tanh()
            }
            fn sigmoid(self) -> Self {
                1.0 / (1.0 + (-self).exp())
            }
            fn pow(self, exponent: Self) -> Self {
                self.powf(exponent)
            }
            fn relu(self) -> Self {
                self.max(0.0)
            }
            fn leaky_relu(self, alpha: Self) -> Self {
                if self > 0.0 { self } else { alpha * self }
            }
            fn relu_grad(self) -> Self {
                if self > 0.0 { 1.0 } else { 0.0 }
            }
            fn leaky_relu_grad(self, alpha: Self) -> Self {
                if self > 0.0 { 1.0 } else { alpha }
            }
            fn sigmoid_grad(self) -> Self {
                let s = Numeric::sigmoid(self);
                s * (1.0 - s)
            }
            fn tanh_grad(self) -> Self {
                let t = self.tanh();
                1.0 - t * t
            }
            fn greater_than(self, rhs: Self) -> bool {
                self > rhs
            }
        }
    };
}

impl_numeric_float!(f32);
impl_numeric_float!(f64);

impl Numeric for half::f16 {
    const IS_INTEGER: bool = false;

    fn zero() -> Self {
        half::f16::from_f32(0.0)
    }
    fn one() -> Self {
        half::f16::from_f32(1.0)
    }
    fn is_zero(self) -> bool {
        self.to_f32() == 0.0
    }
    fn from_f64(value: f64) -> Self {
        half::f16::from_f64(value)
    }
    fn from_f32(value: f32) -> Self {
        half::f16::from_f32(value)
    }
    fn to_f64(self) -> f64 {
        f64::from(self.to_f32())
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
    fn div(self, rhs: Self) -> Self {
        self / rhs
    }
    fn exp(self) -> Self {
        half::f16::from_f32(self.to_f32().exp())
    }
    fn log(self) -> Self {
        half::f16::from_f32(self.to_f32().ln())
    }
    fn sqrt(self) -> Self {
        half::f16::from_f32(self.to_f32().sqrt())
    }
    fn tanh(self) -> Self {
        half::f16::from_f32(self.to_f32().tanh())
    }
    fn sigmoid(self) -> Self {
        half::f16::from_f32(1.0 / (1.0 + (-self.to_f32()).exp()))
    }
    fn pow(self, exponent: Self) -> Self {
        half::f16::from_f32(self.to_f32().powf(exponent.to_f32()))
    }
    fn relu(self) -> Self {
        half::f16::from_f32(self.to_f32().max(0.0))
    }
    fn leaky_relu(self, alpha: Self) -> Self {
        let x = self.to_f32();
        half::f16::from_f32(if x > 0.0 { x } else { alpha.to_f32() * x })
    }
    fn relu_grad(self) -> Self {
        half::f16::from_f32(if self.to_f32() > 0.0 { 1.0 } else { 0.0 })
    }
    fn leaky_relu_grad(self, alpha: Self) -> Self {
        half::f16::from_f32(if self.to_f32() > 0.0 { 1.0 } else { alpha.to_f32() })
    }
    fn sigmoid_grad(self) -> Self {
        let s = Numeric::sigmoid(self).to_f32();
        half::f16::from_f32(s * (1.0 - s))
    }
    fn tanh_grad(self) -> Self {
        let t = self.to_f32().tanh();
        half::f16::from_f32(1.0 - t * t)
    }
    fn greater_than(self, rhs: Self) -> bool {
        self.to_f32() > rhs.to_f32()
    }
}

impl Numeric for F8 {
    const IS_INTEGER: bool = false;

    fn zero() -> Self {
        F8::ZERO
    }
    fn one() -> Self {
        F8::ONE
    }
    fn is_zero(self) -> bool {
        self.to_f32() == 0.0
    }
    fn from_f64(value: f64) -> Self {
        F8::from_f32(value as f32)
    }
    fn from_f32(value: f32) -> Self {
        F8::from_f32(value)
    }
    fn to_f64(self) -> f64 {
        f64::from(self.to_f32())
    }
    fn add(self, rhs: Self) -> Self {
        F8::from_f32(self.to_f32() + rhs.to_f32())
    }
    fn sub(self, rhs: Self) -> Self {
        F8::from_f32(self.to_f32() - rhs.to_f32())
    }
    fn mul(self, rhs: Self) -> Self {
        F8::from_f32(self.to_f32() * rhs.to_f32())
    }
    fn div(self, rhs: Self) -> Self {
        F8::from_f32(self.to_f32() / rhs.to_f32())
    }
    fn exp(self) -> Self {
        F8::from_f32(self.to_f32().exp())
    }
    fn log(self) -> Self {
        F8::from_f32(self.to_f32().ln())
    }
    fn sqrt(self) -> Self {
        F8::from_f32(self.to_f32().sqrt())
    }
    fn tanh(self) -> Self {
        F8::from_f32(self.to_f32().tanh())
    }
    fn sigmoid(self) -> Self {
        F8::from_f32(1.0 / (1.0 + (-self.to_f32()).exp()))
    }
    fn pow(self, exponent: Self) -> Self {
        F8::from_f32(self.to_f32().powf(exponent.to_f32()))
    }
    fn relu(self) -> Self {
        F8::from_f32(self.to_f32().max(0.0))
    }
    fn leaky_relu(self, alpha: Self) -> Self {
        let x = self.to_f32();
        F8::from_f32(if x > 0.0 { x } else { alpha.to_f32() * x })
    }
    fn relu_grad(self) -> Self {
        F8::from_f32(if self.to_f32() > 0.0 { 1.0 } else { 0.0 })
    }
    fn leaky_relu_grad(self, alpha: Self) -> Self {
        F8::from_f32(if self.to_f32() > 0.0 { 1.0 } else { alpha.to_f32() })
    }
    fn sigmoid_grad(self) -> Self {
        let s = Numeric::sigmoid(self).to_f32();
        F8::from_f32(s * (1.0 - s))
    }
    fn tanh_grad(self) -> Self {
        let t = self.to_f32().tanh();
        F8::from_f32(1.0 - t * t)
    }
    fn greater_than(self, rhs: Self) -> bool {
        self.to_f32() > rhs.to_f32()
    }
}

macro_rules! impl_numeric_integer {
    ($ty:ty) => {
        impl Numeric for $ty {
            const IS_INTEGER: bool = true;

            fn zero() -> Self {
                0
            }
            fn one() -> Self {
                1
            }
            fn is_zero(self) -> bool {
                self == 0
            }
            fn from_f64(value: f64) -> Self {
                value as Self
            }
            fn from_f32(value: f32) -> Self {
                value as Self
            }
            fn to_f64(self) -> f64 {
                self as f64
            }
            fn add(self, rhs: Self) -> Self {
                self + rhs
            }
            fn sub(self, rhs: Self) -> Self {
                self - rhs
            }
            fn mul(self, rhs: Self) -> Self {
                self * rhs
            }
            fn div(self, rhs: Self) -> Self {
                self.checked_div(rhs).unwrap_or(0)
            }
            fn exp(self) -> Self {
                Self::from_f64((self as f64).exp().round())
            }
            fn log(self) -> Self {
                Self::from_f64((self as f64).ln().round())
            }
            fn sqrt(self) -> Self {
                Self::from_f64((self as f64).sqrt().round())
            }
            fn tanh(self) -> Self {
                Self::from_f64((self as f64).tanh().round())
            }
            fn sigmoid(self) -> Self {
                Self::from_f64((1.0 / (1.0 + (-(self as f64)).exp())).round())
            }
            fn pow(self, exponent: Self) -> Self {
                if exponent >= 0 {
                    self.checked_pow(exponent as u32).unwrap_or(Self::MAX)
                } else {
                    0
                }
            }
            fn relu(self) -> Self {
                self.max(0)
            }
            fn leaky_relu(self, alpha: Self) -> Self {
                if self > 0 { self } else { alpha * self }
            }
            fn relu_grad(self) -> Self {
                if self > 0 { 1 } else { 0 }
            }
            fn leaky_relu_grad(self, alpha: Self) -> Self {
                if self > 0 { 1 } else { alpha }
            }
            fn sigmoid_grad(self) -> Self {
                let s = Numeric::sigmoid(self) as f64;
                Self::from_f64((s * (1.0 - s)).round())
            }
            fn tanh_grad(self) -> Self {
                let t = (self as f64).tanh();
                Self::from_f64((1.0 - t * t).round())
            }
            fn greater_than(self, rhs: Self) -> bool {
                self > rhs
            }
        }
    };
}

impl_numeric_integer!(i8);
impl_numeric_integer!(i32);
impl_numeric_integer!(i64);
