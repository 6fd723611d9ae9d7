//! Element-wise unary, binary (broadcasting), and scalar operations.

use alloc::format;
use alloc::vec::Vec;

use crate::device::Context;
use crate::error::{Error, TensorError};
use crate::numeric::Numeric;
use crate::parallel;
use crate::tensor::Tensor;

use super::{Engine, check_destination_shape, decode_offset};

impl<S: Numeric> Engine<S> {
    /// Applies `op` element-wise, returning a fresh tensor of `a`'s shape.
    ///
    /// `op` must be pure and thread-safe: above [`parallel::PARALLEL_THRESHOLD`]
    /// elements, it runs concurrently across chunks of the flat range.
    pub fn unary(&self, ctx: &Context, a: &Tensor<S>, op: impl Fn(S) -> S + Sync) -> Tensor<S> {
        let mut dst = Tensor::zeros(a.shape()).expect("a.shape() is already valid");
        self.unary_into(ctx, a, op, &mut dst)
            .expect("destination shape matches by construction");
        dst
    }

    /// Applies `op` element-wise, writing into `dst`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `dst.shape() != a.shape()`.
    pub fn unary_into(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        op: impl Fn(S) -> S + Sync,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        check_destination_shape("Engine::unary", a.shape(), dst)?;

        let src = a.data();
        parallel::parallel_chunks_mut(dst.data_mut(), ctx.workers(), 1, |start, chunk| {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                *slot = op(src[start + offset]);
            }
        });

        Ok(())
    }

    /// Applies `op` element-wise with NumPy-style broadcasting between `a`
    /// and `b`, returning a fresh tensor of the broadcast shape.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `a` and `b` are not broadcast-compatible.
    pub fn binary(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        b: &Tensor<S>,
        op: impl Fn(S, S) -> S + Sync,
    ) -> Result<Tensor<S>, Error> {
        let out_shape = broadcast_shape("Engine::binary", a.shape(), b.shape())?;
        let mut dst = Tensor::zeros(&out_shape)?;
        self.binary_into(ctx, a, b, op, &mut dst)?;
        Ok(dst)
    }

    /// Applies `op` element-wise with broadcasting, writing into `dst`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `a` and `b` are not broadcast-compatible,
    ///   or if `dst`'s shape does not match the broadcast output shape.
    pub fn binary_into(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        b: &Tensor<S>,
        op: impl Fn(S, S) -> S + Sync,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let out_shape = broadcast_shape("Engine::binary", a.shape(), b.shape())?;
        check_destination_shape("Engine::binary", &out_shape, dst)?;

        let a_strides = a.layout().broadcast_strides(&out_shape);
        let b_strides = b.layout().broadcast_strides(&out_shape);
        let a_data = a.data();
        let b_data = b.data();

        parallel::parallel_chunks_mut(dst.data_mut(), ctx.workers(), 1, |start, chunk| {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let i = start + offset;
                let a_off = decode_offset(&out_shape, &a_strides, i);
                let b_off = decode_offset(&out_shape, &b_strides, i);
                *slot = op(a_data[a_off], b_data[b_off]);
            }
        });

        Ok(())
    }

    /// Element-wise addition with broadcasting.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if shapes are not broadcast-compatible.
    pub fn add(&self, ctx: &Context, a: &Tensor<S>, b: &Tensor<S>) -> Result<Tensor<S>, Error> {
        self.binary(ctx, a, b, Numeric::add)
    }

    /// Element-wise subtraction with broadcasting.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if shapes are not broadcast-compatible.
    pub fn sub(&self, ctx: &Context, a: &Tensor<S>, b: &Tensor<S>) -> Result<Tensor<S>, Error> {
        self.binary(ctx, a, b, Numeric::sub)
    }

    /// Element-wise multiplication with broadcasting.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if shapes are not broadcast-compatible.
    pub fn mul(&self, ctx: &Context, a: &Tensor<S>, b: &Tensor<S>) -> Result<Tensor<S>, Error> {
        self.binary(ctx, a, b, Numeric::mul)
    }

    /// Element-wise exponentiation with broadcasting: `a[i] ^ b[i]`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if shapes are not broadcast-compatible.
    pub fn pow(&self, ctx: &Context, a: &Tensor<S>, b: &Tensor<S>) -> Result<Tensor<S>, Error> {
        self.binary(ctx, a, b, Numeric::pow)
    }

    /// Element-wise maximum with broadcasting.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if shapes are not broadcast-compatible.
    pub fn max(&self, ctx: &Context, a: &Tensor<S>, b: &Tensor<S>) -> Result<Tensor<S>, Error> {
        self.binary(ctx, a, b, |x, y| if x.greater_than(y) { x } else { y })
    }

    /// Element-wise minimum with broadcasting.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if shapes are not broadcast-compatible.
    pub fn min(&self, ctx: &Context, a: &Tensor<S>, b: &Tensor<S>) -> Result<Tensor<S>, Error> {
        self.binary(ctx, a, b, |x, y| if x.greater_than(y) { y } else { x })
    }

    /// Element-wise division with broadcasting.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if shapes are not broadcast-compatible.
    /// - [`TensorError::DivideByZero`] if `S::IS_INTEGER` and any broadcast
    ///   pairing divides by zero. The output is left in an undefined state
    ///   in that case, per the engine's parallel-detection contract.
    pub fn div(&self, ctx: &Context, a: &Tensor<S>, b: &Tensor<S>) -> Result<Tensor<S>, Error> {
        let out_shape = broadcast_shape("Engine::div", a.shape(), b.shape())?;
        let mut dst = Tensor::zeros(&out_shape)?;
        self.div_into(ctx, a, b, &mut dst)?;
        Ok(dst)
    }

    /// Element-wise division with broadcasting, writing into `dst`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if shapes are not broadcast-compatible or
    ///   `dst`'s shape mismatches.
    /// - [`TensorError::DivideByZero`] if `S::IS_INTEGER` and any pairing
    ///   divides by zero.
    pub fn div_into(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        b: &Tensor<S>,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let out_shape = broadcast_shape("Engine::div", a.shape(), b.shape())?;
        check_destination_shape("Engine::div", &out_shape, dst)?;

        if !S::IS_INTEGER {
            self.binary_into(ctx, a, b, Numeric::div, dst)?;
            return Ok(());
        }

        let a_strides = a.layout().broadcast_strides(&out_shape);
        let b_strides = b.layout().broadcast_strides(&out_shape);
        let a_data = a.data();
        let b_data = b.data();

        let found_zero_divisor =
            parallel::parallel_chunks_mut_checked(dst.data_mut(), ctx.workers(), 1, |start, chunk| {
                let mut saw_zero = false;
                for (offset, slot) in chunk.iter_mut().enumerate() {
                    let i = start + offset;
                    let a_off = decode_offset(&out_shape, &a_strides, i);
                    let b_off = decode_offset(&out_shape, &b_strides, i);
                    let divisor = b_data[b_off];
                    if divisor.is_zero() {
                        saw_zero = true;
                    }
                    *slot = a_data[a_off].div(divisor);
                }
                saw_zero
            });

        if found_zero_divisor {
            return Err(TensorError::DivideByZero("Engine::div".into()).into());
        }

        Ok(())
    }

    /// Adds a scalar to every element.
    #[must_use]
    pub fn add_scalar(&self, ctx: &Context, a: &Tensor<S>, scalar: S) -> Tensor<S> {
        self.unary(ctx, a, move |x| x.add(scalar))
    }

    /// Adds a scalar to every element, writing into `dst`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `dst.shape() != a.shape()`.
    pub fn add_scalar_into(&self, ctx: &Context, a: &Tensor<S>, scalar: S, dst: &mut Tensor<S>) -> Result<(), Error> {
        self.unary_into(ctx, a, move |x| x.add(scalar), dst)
    }

    /// Multiplies every element by a scalar.
    #[must_use]
    pub fn mul_scalar(&self, ctx: &Context, a: &Tensor<S>, scalar: S) -> Tensor<S> {
        self.unary(ctx, a, move |x| x.mul(scalar))
    }

    /// Multiplies every element by a scalar, writing into `dst`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `dst.shape() != a.shape()`.
    pub fn mul_scalar_into(&self, ctx: &Context, a: &Tensor<S>, scalar: S, dst: &mut Tensor<S>) -> Result<(), Error> {
        self.unary_into(ctx, a, move |x| x.mul(scalar), dst)
    }

    /// Divides every element by a scalar.
    ///
    /// # Errors
    ///
    /// - [`TensorError::DivideByZero`] if `S::IS_INTEGER` and `scalar` is zero.
    pub fn div_scalar(&self, ctx: &Context, a: &Tensor<S>, scalar: S) -> Result<Tensor<S>, Error> {
        if S::IS_INTEGER && scalar.is_zero() {
            return Err(TensorError::DivideByZero("Engine::div_scalar".into()).into());
        }
        Ok(self.unary(ctx, a, move |x| x.div(scalar)))
    }

    /// Divides every element by a scalar, writing into `dst`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::DivideByZero`] if `S::IS_INTEGER` and `scalar` is zero.
    /// - [`TensorError::Shape`] if `dst.shape() != a.shape()`.
    pub fn div_scalar_into(&self, ctx: &Context, a: &Tensor<S>, scalar: S, dst: &mut Tensor<S>) -> Result<(), Error> {
        if S::IS_INTEGER && scalar.is_zero() {
            return Err(TensorError::DivideByZero("Engine::div_scalar".into()).into());
        }
        self.unary_into(ctx, a, move |x| x.div(scalar), dst)
    }

    /// Rectified linear unit: `max(x, 0)`, element-wise.
    #[must_use]
    pub fn relu(&self, ctx: &Context, a: &Tensor<S>) -> Tensor<S> {
        self.unary(ctx, a, Numeric::relu)
    }

    /// Leaky rectified linear unit with slope `alpha` for negative inputs.
    #[must_use]
    pub fn leaky_relu(&self, ctx: &Context, a: &Tensor<S>, alpha: S) -> Tensor<S> {
        self.unary(ctx, a, move |x| x.leaky_relu(alpha))
    }

    /// Logistic sigmoid, element-wise.
    #[must_use]
    pub fn sigmoid(&self, ctx: &Context, a: &Tensor<S>) -> Tensor<S> {
        self.unary(ctx, a, Numeric::sigmoid)
    }

    /// Hyperbolic tangent, element-wise.
    #[must_use]
    pub fn tanh_op(&self, ctx: &Context, a: &Tensor<S>) -> Tensor<S> {
        self.unary(ctx, a, Numeric::tanh)
    }
}

/// Computes the NumPy-style broadcast output shape of `a` and `b`.
pub(crate) fn broadcast_shape(op: &str, a: &[usize], b: &[usize]) -> Result<Vec<usize>, Error> {
    let rank = a.len().max(b.len());
    let mut out = Vec::with_capacity(rank);

    for i in 0..rank {
        let da = *a.get(a.len().wrapping_sub(rank - i)).unwrap_or(&1);
        let db = *b.get(b.len().wrapping_sub(rank - i)).unwrap_or(&1);
        let dim = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => {
                return Err(TensorError::shape(
                    op,
                    format!("dimensions {a:?} and {b:?} are not broadcast-compatible"),
                )
                .into());
            }
        };
        out.push(dim);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Context;
    use crate::engine::Engine;

    #[test]
    fn test_unary_exp_matches_scalar() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[3], &[0.0, 1.0, 2.0]).unwrap();
        let out = engine.unary(&ctx, &a, Numeric::exp);
        for (got, &x) in out.data().iter().zip(a.data()) {
            assert!((got - x.exp()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_binary_add_with_broadcast() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Tensor::from_shape_slice(&[3], &[10.0, 20.0, 30.0]).unwrap();
        let out = engine.add(&ctx, &a, &b).unwrap();
        assert_eq!(out.shape(), &[2, 3]);
        assert_eq!(out.data(), &[11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    }

    #[test]
    fn test_binary_incompatible_shapes() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::<f32>::zeros(&[3]).unwrap();
        let b = Tensor::<f32>::zeros(&[4]).unwrap();
        assert!(engine.add(&ctx, &a, &b).is_err());
    }

    #[test]
    fn test_integer_divide_by_zero() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<i32>::new();
        let a = Tensor::from_shape_slice(&[4], &[10, 12, 14, 16]).unwrap();
        let b = Tensor::from_shape_slice(&[4], &[2, 0, 2, 4]).unwrap();
        assert!(engine.div(&ctx, &a, &b).is_err());
    }

    #[test]
    fn test_float_division_ok() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2], &[10.0, 4.0]).unwrap();
        let b = Tensor::from_shape_slice(&[2], &[2.0, 0.0]).unwrap();
        let out = engine.div(&ctx, &a, &b).unwrap();
        assert_eq!(out.data()[0], 5.0);
        assert!(out.data()[1].is_infinite());
    }

    #[test]
    fn test_destination_shape_mismatch() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::<f32>::zeros(&[2, 3]).unwrap();
        let b = Tensor::<f32>::zeros(&[2, 3]).unwrap();
        let mut dst = Tensor::<f32>::zeros(&[3, 3]).unwrap();
        assert!(
            engine
                .binary_into(&ctx, &a, &b, Numeric::add, &mut dst)
                .is_err()
        );
    }

    #[test]
    fn test_relu_and_sigmoid() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2], &[-1.0, 2.0]).unwrap();
        let relu = engine.relu(&ctx, &a);
        assert_eq!(relu.data(), &[0.0, 2.0]);
        let sig = engine.sigmoid(&ctx, &a);
        assert!(sig.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
