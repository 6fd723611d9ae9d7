//! Axis reductions (`sum`, `reduce_mean`, `reduce_max`) and `softmax`.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use crate::device::Context;
use crate::error::{Error, TensorError};
use crate::numeric::Numeric;
use crate::parallel;
use crate::tensor::Tensor;

use super::{Engine, check_destination_shape};

/// Resolves `sum`/`reduce_mean`/`reduce_max`'s axis convention: negative
/// means "reduce over every axis", distinct from softmax's "relative to the
/// last axis" convention.
fn resolve_reduce_axis(op: &str, axis: i64, rank: usize) -> Result<Option<usize>, Error> {
    if axis < 0 {
        return Ok(None);
    }
    let axis = usize::try_from(axis).unwrap_or(usize::MAX);
    if axis >= rank {
        return Err(TensorError::axis(op, format!("axis {axis} out of range for rank {rank}")).into());
    }
    Ok(Some(axis))
}

/// Computes `(outer, dim, inner)` stripe dimensions for reducing `shape`
/// along `axis` (`None` reduces the whole tensor).
fn stripe_dims(shape: &[usize], axis: Option<usize>) -> (usize, usize, usize) {
    match axis {
        None => (1, shape.iter().product(), 1),
        Some(ax) => {
            let outer: usize = shape[..ax].iter().product();
            let dim = shape[ax];
            let inner: usize = shape[ax + 1..].iter().product();
            (outer, dim, inner)
        }
    }
}

/// Computes the output shape of a reduction over `axis` (`None` = all axes).
fn reduce_output_shape(shape: &[usize], axis: Option<usize>, keep_dims: bool) -> Vec<usize> {
    match axis {
        None => {
            if keep_dims {
                vec![1; shape.len()]
            } else {
                vec![1]
            }
        }
        Some(ax) => {
            if keep_dims {
                let mut out = shape.to_vec();
                out[ax] = 1;
                out
            } else {
                let mut out: Vec<usize> = shape
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != ax)
                    .map(|(_, &d)| d)
                    .collect();
                if out.is_empty() {
                    out = vec![1];
                }
                out
            }
        }
    }
}

impl<S: Numeric> Engine<S> {
    /// Sums `a` along `axis` (`axis < 0` reduces over every axis).
    ///
    /// # Errors
    ///
    /// - [`TensorError::Axis`] if `axis >= a.rank()`.
    pub fn sum(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        axis: i64,
        keep_dims: bool,
    ) -> Result<Tensor<S>, Error> {
        let resolved = resolve_reduce_axis("Engine::sum", axis, a.rank())?;
        let out_shape = reduce_output_shape(a.shape(), resolved, keep_dims);
        let mut dst = Tensor::zeros(&out_shape)?;
        self.sum_into(ctx, a, axis, keep_dims, &mut dst)?;
        Ok(dst)
    }

    /// Sums `a` along `axis`, writing into `dst`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Axis`] if `axis >= a.rank()`.
    /// - [`TensorError::Shape`] if `dst`'s shape does not match the computed
    ///   output shape.
    pub fn sum_into(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        axis: i64,
        keep_dims: bool,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let resolved = resolve_reduce_axis("Engine::sum", axis, a.rank())?;
        let out_shape = reduce_output_shape(a.shape(), resolved, keep_dims);
        check_destination_shape("Engine::sum", &out_shape, dst)?;

        let (_, dim, inner) = stripe_dims(a.shape(), resolved);
        let src = a.data();

        parallel::parallel_chunks_mut(dst.data_mut(), ctx.workers(), inner, |start, chunk| {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let flat = start + offset;
                let o = flat / inner;
                let i = flat % inner;
                let mut acc = S::zero();
                for k in 0..dim {
                    acc = acc.add(src[o * dim * inner + k * inner + i]);
                }
                *slot = acc;
            }
        });

        Ok(())
    }

    /// Mean of `a` along `axis`; composes [`Engine::sum`] with a division by
    /// the reduced dimension's size.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Axis`] if `axis >= a.rank()`.
    pub fn reduce_mean(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        axis: i64,
        keep_dims: bool,
    ) -> Result<Tensor<S>, Error> {
        let resolved = resolve_reduce_axis("Engine::reduce_mean", axis, a.rank())?;
        let out_shape = reduce_output_shape(a.shape(), resolved, keep_dims);
        let mut dst = Tensor::zeros(&out_shape)?;
        self.reduce_mean_into(ctx, a, axis, keep_dims, &mut dst)?;
        Ok(dst)
    }

    /// Mean of `a` along `axis`, writing into `dst`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Axis`] if `axis >= a.rank()`.
    /// - [`TensorError::Shape`] if `dst`'s shape does not match the computed
    ///   output shape.
    pub fn reduce_mean_into(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        axis: i64,
        keep_dims: bool,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let resolved = resolve_reduce_axis("Engine::reduce_mean", axis, a.rank())?;
        let (_, dim, _) = stripe_dims(a.shape(), resolved);
        self.sum_into(ctx, a, axis, keep_dims, dst)?;
        let divisor = S::from_f64(dim as f64);
        for value in dst.data_mut() {
            *value = value.div(divisor);
        }
        Ok(())
    }

    /// Maximum of `a` along `axis` (`axis < 0` reduces over every axis).
    ///
    /// # Errors
    ///
    /// - [`TensorError::Axis`] if `axis >= a.rank()`.
    /// - [`TensorError::Shape`] if the reduced axis (or, for `axis < 0`, any
    ///   axis) has length 0 — unlike `sum`, the maximum of an empty stripe
    ///   has no value.
    pub fn reduce_max(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        axis: i64,
        keep_dims: bool,
    ) -> Result<Tensor<S>, Error> {
        let resolved = resolve_reduce_axis("Engine::reduce_max", axis, a.rank())?;
        let out_shape = reduce_output_shape(a.shape(), resolved, keep_dims);
        let mut dst = Tensor::zeros(&out_shape)?;

        let (_, dim, inner) = stripe_dims(a.shape(), resolved);
        if dim == 0 {
            return Err(TensorError::shape(
                "Engine::reduce_max",
                "cannot take the maximum over a zero-length axis",
            )
            .into());
        }
        let src = a.data();

        parallel::parallel_chunks_mut(dst.data_mut(), ctx.workers(), inner, |start, chunk| {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let flat = start + offset;
                let o = flat / inner;
                let i = flat % inner;
                let mut acc = src[o * dim * inner + i];
                for k in 1..dim {
                    let candidate = src[o * dim * inner + k * inner + i];
                    if candidate.greater_than(acc) {
                        acc = candidate;
                    }
                }
                *slot = acc;
            }
        });

        Ok(dst)
    }

    /// Numerically stable softmax along `axis` (`axis < 0` interpreted
    /// relative to the last axis). A rank-0 input writes `1` into the
    /// single output cell.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Axis`] if `axis` is out of range for `a.rank() > 0`.
    pub fn softmax(&self, ctx: &Context, a: &Tensor<S>, axis: i64) -> Result<Tensor<S>, Error> {
        let mut dst = Tensor::zeros(a.shape())?;
        self.softmax_into(ctx, a, axis, &mut dst)?;
        Ok(dst)
    }

    /// Numerically stable softmax along `axis`, writing into `dst`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Axis`] if `axis` is out of range for `a.rank() > 0`.
    /// - [`TensorError::Shape`] if `dst.shape() != a.shape()`, or if the
    ///   softmax axis has length 0 (no stripe to normalize).
    pub fn softmax_into(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        axis: i64,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        check_destination_shape("Engine::softmax", a.shape(), dst)?;

        if a.rank() == 0 {
            dst.data_mut()[0] = S::one();
            return Ok(());
        }

        let axis = super::resolve_axis("Engine::softmax", axis, a.rank())?;
        let outer: usize = a.shape()[..axis].iter().product();
        let dim = a.shape()[axis];
        let inner: usize = a.shape()[axis + 1..].iter().product();
        if dim == 0 {
            return Err(TensorError::shape(
                "Engine::softmax",
                "cannot normalize a zero-length axis",
            )
            .into());
        }
        let stripe_block = dim * inner;
        let src = a.data();

        parallel::parallel_chunks_mut(dst.data_mut(), ctx.workers(), stripe_block, |start, chunk| {
            let first_outer = start / stripe_block;
            for (local_outer, stripe) in chunk.chunks_mut(stripe_block).enumerate() {
                let o = first_outer + local_outer;
                for i in 0..inner {
                    let mut max = src[o * stripe_block + i];
                    for k in 1..dim {
                        let candidate = src[o * stripe_block + k * inner + i];
                        if candidate.greater_than(max) {
                            max = candidate;
                        }
                    }

                    let mut sum = S::zero();
                    for k in 0..dim {
                        let e = src[o * stripe_block + k * inner + i].sub(max).exp();
                        stripe[k * inner + i] = e;
                        sum = sum.add(e);
                    }
                    for k in 0..dim {
                        stripe[k * inner + i] = stripe[k * inner + i].div(sum);
                    }
                }
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    #[test]
    fn test_sum_middle_axis_no_keep_dims() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(
            &[2, 3, 2],
            &[1., 2., 3., 4., 5., 6., 7., 8., 9., 10., 11., 12.],
        )
        .unwrap();
        let out = engine.sum(&ctx, &a, 1, false).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out.data(), &[9.0, 12.0, 27.0, 30.0]);
    }

    #[test]
    fn test_sum_ones_equals_size() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_vec(&[4, 5], vec![1.0f32; 20]).unwrap();
        let out = engine.sum(&ctx, &a, -1, false).unwrap();
        assert_eq!(out.data(), &[20.0]);
    }

    #[test]
    fn test_sum_keep_dims_negative_axis_is_all_ones_rank() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::<f32>::zeros(&[2, 3, 4]).unwrap();
        let out = engine.sum(&ctx, &a, -1, true).unwrap();
        assert_eq!(out.shape(), &[1, 1, 1]);
    }

    #[test]
    fn test_reduce_mean() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2, 2], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let out = engine.reduce_mean(&ctx, &a, 1, false).unwrap();
        assert_eq!(out.data(), &[1.5, 3.5]);
    }

    #[test]
    fn test_reduce_max() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2, 2], &[1.0, 5.0, 3.0, 2.0]).unwrap();
        let out = engine.reduce_max(&ctx, &a, 1, false).unwrap();
        assert_eq!(out.data(), &[5.0, 3.0]);
    }

    #[test]
    fn test_softmax_numerical_stability() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[3], &[1000.0, 1001.0, 1002.0]).unwrap();
        let out = engine.softmax(&ctx, &a, -1).unwrap();
        assert!(out.data().iter().all(|v| v.is_finite()));
        let sum: f32 = out.data().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!((out.data()[0] - 0.0900).abs() < 1e-3);
        assert!((out.data()[1] - 0.2447).abs() < 1e-3);
        assert!((out.data()[2] - 0.6652).abs() < 1e-3);
    }

    #[test]
    fn test_softmax_rank0() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[], &[5.0]).unwrap();
        let out = engine.softmax(&ctx, &a, 0).unwrap();
        assert_eq!(out.data(), &[1.0]);
    }

    #[test]
    fn test_softmax_each_stripe_sums_to_one() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2, 3], &[1.0, 2.0, 3.0, 1.0, 1.0, 1.0]).unwrap();
        let out = engine.softmax(&ctx, &a, 1).unwrap();
        for row in out.data().chunks(3) {
            let s: f32 = row.iter().sum();
            assert!((s - 1.0).abs() < 1e-6);
        }
    }
}
