//! Batched matrix multiplication and the pluggable GEMM seam.

use alloc::format;
use alloc::vec::Vec;

use crate::device::Context;
use crate::error::{Error, TensorError};
use crate::numeric::Numeric;
use crate::parallel;
use crate::tensor::Tensor;

use super::{Engine, check_destination_shape};

/// A single-batch general matrix multiply: `c[m,n] = a[m,k] @ b[k,n]`, all
/// three buffers contiguous row-major slices of exactly `m*k`, `k*n`, and
/// `m*n` elements.
///
/// Implementations may specialize on `S` (e.g. a vendor BLAS binding); the
/// engine always has [`NaiveGemm`] available as a fallback for any scalar
/// type without one.
pub trait GemmKernel<S: Numeric>: Send + Sync {
    /// Computes `c = a @ b` for one `(m, k, n)`-shaped batch slice.
    fn gemm(&self, m: usize, k: usize, n: usize, a: &[S], b: &[S], c: &mut [S]);
}

/// Naive triple-loop GEMM. Deterministic and bit-identical across runs for a
/// given scalar type, since it performs the same sequence of `mul`/`add`
/// calls in the same order regardless of thread count.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveGemm;

impl<S: Numeric> GemmKernel<S> for NaiveGemm {
    fn gemm(&self, m: usize, k: usize, n: usize, a: &[S], b: &[S], c: &mut [S]) {
        for i in 0..m {
            for j in 0..n {
                let mut acc = S::zero();
                for p in 0..k {
                    acc = acc.add(a[i * k + p].mul(b[p * n + j]));
                }
                c[i * n + j] = acc;
            }
        }
    }
}

/// Resolved shape plan for a batched matmul.
struct MatmulPlan {
    batch: Vec<usize>,
    m: usize,
    k: usize,
    n: usize,
    /// `true` when `b` is a single 2-D matrix broadcast across every batch
    /// of `a` (`rank(a) > rank(b)`).
    broadcast_b: bool,
}

fn plan_matmul(op: &str, a_shape: &[usize], b_shape: &[usize]) -> Result<MatmulPlan, Error> {
    if a_shape.len() < 2 || b_shape.len() < 2 {
        return Err(TensorError::shape(
            op,
            format!(
                "matmul requires rank >= 2 operands, got {} and {}",
                a_shape.len(),
                b_shape.len()
            ),
        )
        .into());
    }

    let m = a_shape[a_shape.len() - 2];
    let k_a = a_shape[a_shape.len() - 1];
    let k_b = b_shape[b_shape.len() - 2];
    let n = b_shape[b_shape.len() - 1];

    if k_a != k_b {
        return Err(TensorError::shape(
            op,
            format!("inner dimensions disagree: {k_a} (from a) != {k_b} (from b)"),
        )
        .into());
    }

    if k_a == 0 {
        return Err(TensorError::shape(op, "matmul inner dimension must be non-zero").into());
    }

    let (batch, broadcast_b) = if a_shape.len() == b_shape.len() {
        let a_batch = &a_shape[..a_shape.len() - 2];
        let b_batch = &b_shape[..b_shape.len() - 2];
        if a_batch != b_batch {
            return Err(TensorError::shape(
                op,
                format!("batch dimensions disagree: {a_batch:?} != {b_batch:?}"),
            )
            .into());
        }
        (a_batch.to_vec(), false)
    } else if a_shape.len() > b_shape.len() {
        if b_shape.len() != 2 {
            return Err(TensorError::shape(
                op,
                format!(
                    "b must be 2-D to broadcast across a's batches, got rank {}",
                    b_shape.len()
                ),
            )
            .into());
        }
        (a_shape[..a_shape.len() - 2].to_vec(), true)
    } else {
        return Err(TensorError::shape(
            op,
            "rank(b) > rank(a) batch broadcasting is not supported",
        )
        .into());
    };

    Ok(MatmulPlan {
        batch,
        m,
        k: k_a,
        n,
        broadcast_b,
    })
}

fn matmul_output_shape(plan: &MatmulPlan) -> Vec<usize> {
    let mut shape = plan.batch.clone();
    shape.push(plan.m);
    shape.push(plan.n);
    shape
}

impl<S: Numeric> Engine<S> {
    /// Batched matmul using the naive fallback GEMM. See
    /// [`Engine::matmul_with`] to supply a specialized kernel.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if either operand has rank < 2, the inner
    ///   dimensions disagree, the shared inner dimension is 0, or the batch
    ///   dimensions are incompatible.
    pub fn matmul(&self, ctx: &Context, a: &Tensor<S>, b: &Tensor<S>) -> Result<Tensor<S>, Error> {
        self.matmul_with(ctx, a, b, &NaiveGemm)
    }

    /// Batched matmul writing into `dst`, using the naive fallback GEMM.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::matmul`], plus [`TensorError::Shape`] if `dst`'s
    /// shape does not match the computed output shape.
    pub fn matmul_into(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        b: &Tensor<S>,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        self.matmul_into_with(ctx, a, b, &NaiveGemm, dst)
    }

    /// Batched matmul using a caller-supplied [`GemmKernel`].
    ///
    /// # Errors
    ///
    /// Same as [`Engine::matmul`].
    pub fn matmul_with<G: GemmKernel<S>>(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        b: &Tensor<S>,
        gemm: &G,
    ) -> Result<Tensor<S>, Error> {
        let plan = plan_matmul("Engine::matmul", a.shape(), b.shape())?;
        let out_shape = matmul_output_shape(&plan);
        let mut dst = Tensor::zeros(&out_shape)?;
        self.matmul_into_with(ctx, a, b, gemm, &mut dst)?;
        Ok(dst)
    }

    /// Batched matmul using a caller-supplied [`GemmKernel`], writing into
    /// `dst`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::matmul`], plus [`TensorError::Shape`] if `dst`'s
    /// shape does not match the computed output shape.
    pub fn matmul_into_with<G: GemmKernel<S>>(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        b: &Tensor<S>,
        gemm: &G,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let plan = plan_matmul("Engine::matmul", a.shape(), b.shape())?;
        let out_shape = matmul_output_shape(&plan);
        check_destination_shape("Engine::matmul", &out_shape, dst)?;

        let MatmulPlan {
            m, k, n, broadcast_b, ..
        } = plan;
        let batch_size = out_shape[..out_shape.len() - 2].iter().product::<usize>().max(1);
        let block = m * n;
        let a_data = a.data();
        let b_data = b.data();

        parallel::parallel_chunks_mut(dst.data_mut(), ctx.workers(), block, |start, chunk| {
            let first_batch = start / block;
            for (local, c_block) in chunk.chunks_mut(block).enumerate() {
                let batch = first_batch + local;
                let a_slice = &a_data[batch * m * k..batch * m * k + m * k];
                let b_slice = if broadcast_b {
                    &b_data[..k * n]
                } else {
                    &b_data[batch * k * n..batch * k * n + k * n]
                };
                gemm.gemm(m, k, n, a_slice, b_slice, c_block);
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
    fn test_matmul_basic_2d() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2, 3], &[1., 2., 3., 4., 5., 6.]).unwrap();
        let b = Tensor::from_shape_slice(&[3, 2], &[7., 8., 9., 10., 11., 12.]).unwrap();
        let out = engine.matmul(&ctx, &a, &b).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out.data(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matmul_inner_dim_mismatch() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::<f32>::zeros(&[2, 3]).unwrap();
        let b = Tensor::<f32>::zeros(&[4, 2]).unwrap();
        assert!(engine.matmul(&ctx, &a, &b).is_err());
    }

    #[test]
    fn test_matmul_rank1_is_error() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::<f32>::zeros(&[3]).unwrap();
        let b = Tensor::<f32>::zeros(&[3, 2]).unwrap();
        assert!(engine.matmul(&ctx, &a, &b).is_err());
    }

    #[test]
    fn test_matmul_batched_equal_rank() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(
            &[2, 2, 2],
            &[1., 0., 0., 1., 2., 0., 0., 2.],
        )
        .unwrap();
        let b = Tensor::from_shape_slice(
            &[2, 2, 2],
            &[1., 2., 3., 4., 1., 2., 3., 4.],
        )
        .unwrap();
        let out = engine.matmul(&ctx, &a, &b).unwrap();
        assert_eq!(out.shape(), &[2, 2, 2]);
        assert_eq!(out.data(), &[1.0, 2.0, 3.0, 4.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_matmul_broadcast_2d_b_across_batches() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2, 2, 2], &[1., 0., 0., 1., 2., 0., 0., 2.]).unwrap();
        let b = Tensor::from_shape_slice(&[2, 2], &[1., 2., 3., 4.]).unwrap();
        let out = engine.matmul(&ctx, &a, &b).unwrap();
        assert_eq!(out.shape(), &[2, 2, 2]);
        assert_eq!(out.data(), &[1.0, 2.0, 3.0, 4.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_matmul_rank_b_greater_than_a_is_error() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::<f32>::zeros(&[2, 2]).unwrap();
        let b = Tensor::<f32>::zeros(&[2, 2, 2]).unwrap();
        assert!(engine.matmul(&ctx, &a, &b).is_err());
    }

    #[test]
    fn test_matmul_destination_shape_mismatch() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::<f32>::zeros(&[2, 3]).unwrap();
        let b = Tensor::<f32>::zeros(&[3, 2]).unwrap();
        let mut dst = Tensor::<f32>::zeros(&[3, 3]).unwrap();
        assert!(engine.matmul_into(&ctx, &a, &b, &mut dst).is_err());
    }
}
