//! Shape manipulation: transpose, concat, split, repeat, reshape, one-hot,
//! gather, and scatter-add.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use crate::device::Context;
use crate::error::{Error, TensorError};
use crate::numeric::Numeric;
use crate::parallel;
use crate::tensor::Tensor;

use super::{Engine, check_destination_shape};

fn default_transpose_axes(op: &str, rank: usize) -> Result<Vec<usize>, Error> {
    if rank != 2 {
        return Err(TensorError::shape(
            op,
            format!("default axes {{1, 0}} require rank 2, got rank {rank}; pass axes explicitly"),
        )
        .into());
    }
    Ok(vec![1, 0])
}

fn validate_axes(op: &str, axes: &[usize], rank: usize) -> Result<(), Error> {
    if axes.len() != rank {
        return Err(TensorError::shape(
            op,
            format!("expected {rank} axes, got {}", axes.len()),
        )
        .into());
    }
    let mut seen = vec![false; rank];
    for &axis in axes {
        if axis >= rank || seen[axis] {
            return Err(TensorError::axis(op, format!("invalid or repeated axis {axis}")).into());
        }
        seen[axis] = true;
    }
    Ok(())
}

fn transposed_offset(out_dims: &[usize], a_strides: &[usize], axes: &[usize], mut linear: usize) -> usize {
    let rank = out_dims.len();
    let mut coords = vec![0usize; rank];
    for axis in (0..rank).rev() {
        let dim = out_dims[axis].max(1);
        coords[axis] = linear % dim;
        linear /= dim;
    }
    let mut offset = 0;
    for (j, &coord) in coords.iter().enumerate() {
        offset += coord * a_strides[axes[j]];
    }
    offset
}

impl<S: Numeric> Engine<S> {
    /// Permutes `a`'s axes. `axes` defaults to `{1, 0}` (requires rank 2)
    /// when `None`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `axes` is `None` and `a.rank() != 2`, or
    ///   `axes.len() != a.rank()`.
    /// - [`TensorError::Axis`] if `axes` is not a permutation of `0..rank`.
    pub fn transpose(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        axes: Option<&[usize]>,
    ) -> Result<Tensor<S>, Error> {
        let axes = match axes {
            Some(axes) => axes.to_vec(),
            None => default_transpose_axes("Engine::transpose", a.rank())?,
        };
        validate_axes("Engine::transpose", &axes, a.rank())?;
        let out_shape: Vec<usize> = axes.iter().map(|&axis| a.shape()[axis]).collect();
        let mut dst = Tensor::zeros(&out_shape)?;
        self.transpose_into(ctx, a, Some(&axes), &mut dst)?;
        Ok(dst)
    }

    /// Permutes `a`'s axes, writing into `dst`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::transpose`], plus [`TensorError::Shape`] if `dst`'s
    /// shape does not match the computed output shape.
    pub fn transpose_into(
        &self,
        ctx: &Context,
        a: &Tensor<S>,
        axes: Option<&[usize]>,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let axes = match axes {
            Some(axes) => axes.to_vec(),
            None => default_transpose_axes("Engine::transpose", a.rank())?,
        };
        validate_axes("Engine::transpose", &axes, a.rank())?;
        let out_shape: Vec<usize> = axes.iter().map(|&axis| a.shape()[axis]).collect();
        check_destination_shape("Engine::transpose", &out_shape, dst)?;

        let a_strides = a.strides().to_vec();
        let src = a.data();

        parallel::parallel_chunks_mut(dst.data_mut(), ctx.workers(), 1, |start, chunk| {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let linear = start + offset;
                let src_offset = transposed_offset(&out_shape, &a_strides, &axes, linear);
                *slot = src[src_offset];
            }
        });

        Ok(())
    }

    /// Concatenates `tensors` along `axis`. Every tensor must share the same
    /// rank and agree on every dimension except `axis`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `tensors` is empty or shapes disagree
    ///   outside `axis`.
    /// - [`TensorError::Axis`] if `axis >= rank`.
    pub fn concat(&self, ctx: &Context, tensors: &[&Tensor<S>], axis: usize) -> Result<Tensor<S>, Error> {
        let out_shape = concat_output_shape("Engine::concat", tensors, axis)?;
        let mut dst = Tensor::zeros(&out_shape)?;
        self.concat_into(ctx, tensors, axis, &mut dst)?;
        Ok(dst)
    }

    /// Concatenates `tensors` along `axis`, writing into `dst`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::concat`], plus [`TensorError::Shape`] if `dst`'s
    /// shape does not match the computed output shape.
    pub fn concat_into(
        &self,
        _ctx: &Context,
        tensors: &[&Tensor<S>],
        axis: usize,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let out_shape = concat_output_shape("Engine::concat", tensors, axis)?;
        check_destination_shape("Engine::concat", &out_shape, dst)?;

        let outer: usize = out_shape[..axis].iter().product();
        let inner: usize = out_shape[axis + 1..].iter().product();
        let total_dim = out_shape[axis];
        let data = dst.data_mut();

        for o in 0..outer {
            let mut axis_cursor = 0;
            for tensor in tensors {
                let dim = tensor.shape()[axis];
                let src = tensor.data();
                for k in 0..dim {
                    for i in 0..inner {
                        let dst_index = o * total_dim * inner + (axis_cursor + k) * inner + i;
                        let src_index = o * dim * inner + k * inner + i;
                        data[dst_index] = src[src_index];
                    }
                }
                axis_cursor += dim;
            }
        }

        Ok(())
    }

    /// Splits `a` along `axis` into `n` equal-sized consecutive pieces.
    /// `a.shape()[axis]` must be evenly divisible by `n` — this is the exact
    /// inverse of [`Engine::concat`] over the pieces it returns.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `a.shape()[axis]` is not divisible by `n`.
    /// - [`TensorError::Axis`] if `axis >= a.rank()`.
    /// - [`TensorError::Config`] if `n == 0`.
    pub fn split(&self, _ctx: &Context, a: &Tensor<S>, n: usize, axis: usize) -> Result<Vec<Tensor<S>>, Error> {
        if axis >= a.rank() {
            return Err(TensorError::axis("Engine::split", format!("axis {axis} out of range for rank {}", a.rank())).into());
        }
        if n == 0 {
            return Err(TensorError::config("Engine::split", "n must be non-zero").into());
        }
        let dim = a.shape()[axis];
        if dim % n != 0 {
            return Err(TensorError::shape(
                "Engine::split",
                format!("axis {axis} of size {dim} is not evenly divisible by n={n}"),
            )
            .into());
        }
        let size = dim / n;

        let outer: usize = a.shape()[..axis].iter().product();
        let inner: usize = a.shape()[axis + 1..].iter().product();
        let src = a.data();

        let mut pieces = Vec::with_capacity(n);
        for piece in 0..n {
            let mut out_shape = a.shape().to_vec();
            out_shape[axis] = size;
            let mut data = vec![S::zero(); outer * size * inner];
            let axis_cursor = piece * size;
            for o in 0..outer {
                for k in 0..size {
                    for i in 0..inner {
                        let src_index = o * dim * inner + (axis_cursor + k) * inner + i;
                        let dst_index = o * size * inner + k * inner + i;
                        data[dst_index] = src[src_index];
                    }
                }
            }
            pieces.push(Tensor::from_shape_vec(&out_shape, data)?);
        }

        Ok(pieces)
    }

    /// Tiles `a` `count` times along `axis` (the whole tensor is repeated,
    /// not each element).
    ///
    /// # Errors
    ///
    /// - [`TensorError::Axis`] if `axis >= a.rank()`.
    /// - [`TensorError::Config`] if `count == 0`.
    pub fn repeat(&self, ctx: &Context, a: &Tensor<S>, axis: usize, count: usize) -> Result<Tensor<S>, Error> {
        let mut dst = Tensor::zeros(&repeat_shape("Engine::repeat", a.shape(), axis, count)?)?;
        self.repeat_into(ctx, a, axis, count, &mut dst)?;
        Ok(dst)
    }

    /// Tiles `a` `count` times along `axis`, writing into `dst`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::repeat`], plus [`TensorError::Shape`] if `dst`'s
    /// shape does not match the computed output shape.
    pub fn repeat_into(
        &self,
        _ctx: &Context,
        a: &Tensor<S>,
        axis: usize,
        count: usize,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let out_shape = repeat_shape("Engine::repeat", a.shape(), axis, count)?;
        check_destination_shape("Engine::repeat", &out_shape, dst)?;

        let outer: usize = a.shape()[..axis].iter().product();
        let inner: usize = a.shape()[axis + 1..].iter().product();
        let dim = a.shape()[axis];
        let src = a.data();
        let dst_data = dst.data_mut();

        for o in 0..outer {
            for c in 0..count {
                for k in 0..dim {
                    for i in 0..inner {
                        let src_index = o * dim * inner + k * inner + i;
                        let dst_index = o * (dim * count) * inner + (c * dim + k) * inner + i;
                        dst_data[dst_index] = src[src_index];
                    }
                }
            }
        }

        Ok(())
    }

    /// Reshapes `a`, preserving element order. Delegates to
    /// [`Tensor::reshape`]; present on the engine so reshape composes with
    /// the rest of the `op`/`op_into` surface.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if the resolved shape's volume does not
    ///   equal `a.size()`.
    pub fn reshape(&self, _ctx: &Context, a: &Tensor<S>, new_shape: &[i64]) -> Result<Tensor<S>, Error> {
        a.reshape(new_shape)
    }

    /// Reshapes `dst` in place (aliasing its own buffer), without copying
    /// data.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `new_shape`'s volume does not equal
    ///   `dst.size()`.
    pub fn reshape_in_place(&self, _ctx: &Context, dst: &mut Tensor<S>, new_shape: &[usize]) -> Result<(), Error> {
        let volume = new_shape.iter().product::<usize>();
        if volume != dst.size() {
            return Err(TensorError::shape(
                "Engine::reshape_in_place",
                format!("new shape volume {volume} does not match {}", dst.size()),
            )
            .into());
        }
        dst.set_shape(new_shape)
    }

    /// One-hot encodes `indices` (each entry rounded to the nearest
    /// non-negative integer) into a trailing axis of size `depth`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Index`] if any index rounds to a value `>= depth`.
    pub fn one_hot(&self, ctx: &Context, indices: &Tensor<S>, depth: usize) -> Result<Tensor<S>, Error> {
        let mut out_shape = indices.shape().to_vec();
        out_shape.push(depth);
        let mut dst = Tensor::zeros(&out_shape)?;
        self.one_hot_into(ctx, indices, depth, &mut dst)?;
        Ok(dst)
    }

    /// One-hot encodes `indices` into a trailing axis of size `depth`,
    /// writing into `dst`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::one_hot`], plus [`TensorError::Shape`] if `dst`'s
    /// shape does not match `indices.shape() ⧺ [depth]`.
    pub fn one_hot_into(
        &self,
        _ctx: &Context,
        indices: &Tensor<S>,
        depth: usize,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let mut out_shape = indices.shape().to_vec();
        out_shape.push(depth);
        check_destination_shape("Engine::one_hot", &out_shape, dst)?;

        for value in dst.data_mut() {
            *value = S::zero();
        }

        for (row, &value) in indices.data().iter().enumerate() {
            let index = value.to_f64().round();
            if index < 0.0 || index >= depth as f64 {
                return Err(TensorError::index(
                    "Engine::one_hot",
                    format!("index {index} out of range for depth {depth}"),
                )
                .into());
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let column = index as usize;
            dst.data_mut()[row * depth + column] = S::one();
        }

        Ok(())
    }

    /// Gathers rows of a 2-D `params` tensor (`[V, D]`) by `indices`, which
    /// may be rank 1 (`[N]`) or rank 2 (`[B, S]`). Output shape is
    /// `indices.shape() ⧺ [D]`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `params.rank() != 2` or `indices.rank()`
    ///   is neither 1 nor 2.
    /// - [`TensorError::Index`] if any index is out of range for
    ///   `params.shape()[0]`.
    pub fn gather(&self, ctx: &Context, params: &Tensor<S>, indices: &Tensor<S>) -> Result<Tensor<S>, Error> {
        let out_shape = gather_output_shape("Engine::gather", params.shape(), indices.shape())?;
        let mut dst = Tensor::zeros(&out_shape)?;
        self.gather_into(ctx, params, indices, &mut dst)?;
        Ok(dst)
    }

    /// Gathers rows of `params` by `indices`, writing into `dst`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::gather`], plus [`TensorError::Shape`] if `dst`'s
    /// shape does not match `indices.shape() ⧺ [params.shape()[1]]`.
    pub fn gather_into(
        &self,
        _ctx: &Context,
        params: &Tensor<S>,
        indices: &Tensor<S>,
        dst: &mut Tensor<S>,
    ) -> Result<(), Error> {
        let out_shape = gather_output_shape("Engine::gather", params.shape(), indices.shape())?;
        check_destination_shape("Engine::gather", &out_shape, dst)?;

        let rows = params.shape()[0];
        let cols = params.shape()[1];
        let dst_data = dst.data_mut();

        for (out_row, &raw_index) in indices.data().iter().enumerate() {
            let index = raw_index.to_f64().round();
            if index < 0.0 || index >= rows as f64 {
                return Err(TensorError::index(
                    "Engine::gather",
                    format!("index {index} out of range for {rows} rows"),
                )
                .into());
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let row = index as usize;
            dst_data[out_row * cols..(out_row + 1) * cols]
                .copy_from_slice(&params.data()[row * cols..(row + 1) * cols]);
        }

        Ok(())
    }

    /// Accumulates `updates` rows into `table` at the rows named by
    /// `indices`, in place: `table[indices[n], :] += updates[n, :]`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `table.rank() != 2`, `indices.rank() != 1`,
    ///   or `updates.shape() != [indices.size(), table.shape()[1]]`.
    /// - [`TensorError::Index`] if any index is out of range for
    ///   `table.shape()[0]`.
    pub fn scatter_add(
        &self,
        _ctx: &Context,
        table: &mut Tensor<S>,
        indices: &Tensor<S>,
        updates: &Tensor<S>,
    ) -> Result<(), Error> {
        if table.rank() != 2 {
            return Err(TensorError::shape("Engine::scatter_add", "table must be rank 2").into());
        }
        if indices.rank() != 1 {
            return Err(TensorError::shape("Engine::scatter_add", "indices must be rank 1").into());
        }
        let rows = table.shape()[0];
        let cols = table.shape()[1];
        let n = indices.shape()[0];
        if updates.shape() != [n, cols] {
            return Err(TensorError::shape(
                "Engine::scatter_add",
                format!("updates shape {:?} does not match [{n}, {cols}]", updates.shape()),
            )
            .into());
        }

        for (update_row, &raw_index) in indices.data().iter().enumerate() {
            let index = raw_index.to_f64().round();
            if index < 0.0 || index >= rows as f64 {
                return Err(TensorError::index(
                    "Engine::scatter_add",
                    format!("index {index} out of range for {rows} rows"),
                )
                .into());
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let row = index as usize;
            for col in 0..cols {
                let updated = table.data()[row * cols + col].add(updates.data()[update_row * cols + col]);
                table.data_mut()[row * cols + col] = updated;
            }
        }

        Ok(())
    }
}

/// Computes concat's output shape, validating every tensor shares the
/// source rank and agrees on every dimension except `axis`.
fn concat_output_shape(op: &str, tensors: &[&Tensor<impl Numeric>], axis: usize) -> Result<Vec<usize>, Error> {
    let Some(first) = tensors.first() else {
        return Err(TensorError::shape(op, "cannot concatenate zero tensors").into());
    };
    let rank = first.rank();
    if axis >= rank {
        return Err(TensorError::axis(op, format!("axis {axis} out of range for rank {rank}")).into());
    }

    let mut out_shape = first.shape().to_vec();
    let mut total_dim = 0;
    for tensor in tensors {
        if tensor.rank() != rank {
            return Err(TensorError::shape(op, "all tensors must share the same rank").into());
        }
        for (i, (&a, &b)) in tensor.shape().iter().zip(first.shape().iter()).enumerate() {
            if i != axis && a != b {
                return Err(TensorError::shape(
                    op,
                    format!("shapes disagree outside axis {axis}: {a} != {b} at dim {i}"),
                )
                .into());
            }
        }
        total_dim += tensor.shape()[axis];
    }
    out_shape[axis] = total_dim;
    Ok(out_shape)
}

/// Computes gather's output shape (`indices.shape() ⧺ [D]`) after
/// validating `params` is rank 2 and `indices` is rank 1 or 2.
fn gather_output_shape(op: &str, params_shape: &[usize], indices_shape: &[usize]) -> Result<Vec<usize>, Error> {
    if params_shape.len() != 2 {
        return Err(TensorError::shape(op, "params must be rank 2").into());
    }
    if indices_shape.is_empty() || indices_shape.len() > 2 {
        return Err(TensorError::shape(
            op,
            format!("indices must be rank 1 or rank 2, got rank {}", indices_shape.len()),
        )
        .into());
    }
    let mut out_shape = indices_shape.to_vec();
    out_shape.push(params_shape[1]);
    Ok(out_shape)
}

fn repeat_shape(op: &str, shape: &[usize], axis: usize, count: usize) -> Result<Vec<usize>, Error> {
    if axis >= shape.len() {
        return Err(TensorError::axis(op, format!("axis {axis} out of range for rank {}", shape.len())).into());
    }
    if count == 0 {
        return Err(TensorError::config(op, "count must be non-zero").into());
    }
    let mut out = shape.to_vec();
    out[axis] *= count;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    #[test]
    fn test_transpose_default_2d() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2, 3], &[1., 2., 3., 4., 5., 6.]).unwrap();
        let out = engine.transpose(&ctx, &a, None).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        assert_eq!(out.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_transpose_explicit_axes_3d() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[2, 3, 4], &(0..24).map(|v| v as f32).collect::<Vec<_>>()).unwrap();
        let out = engine.transpose(&ctx, &a, Some(&[2, 0, 1])).unwrap();
        assert_eq!(out.shape(), &[4, 2, 3]);
        assert_eq!(out.at(&[0, 0, 0]).unwrap(), a.at(&[0, 0, 0]).unwrap());
        assert_eq!(out.at(&[1, 1, 2]).unwrap(), a.at(&[1, 2, 1]).unwrap());
    }

    #[test]
    fn test_concat_axis0() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[1, 2], &[1.0, 2.0]).unwrap();
        let b = Tensor::from_shape_slice(&[2, 2], &[3.0, 4.0, 5.0, 6.0]).unwrap();
        let out = engine.concat(&ctx, &[&a, &b], 0).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        assert_eq!(out.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_split_inverts_concat() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[4, 2], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        let pieces = engine.split(&ctx, &a, 2, 0).unwrap();
        assert_eq!(pieces[0].shape(), &[2, 2]);
        assert_eq!(pieces[1].shape(), &[2, 2]);
        assert_eq!(pieces[0].data(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(pieces[1].data(), &[5.0, 6.0, 7.0, 8.0]);

        let refs: Vec<&Tensor<f32>> = pieces.iter().collect();
        let joined = engine.concat(&ctx, &refs, 0).unwrap();
        assert_eq!(joined, a);
    }

    #[test]
    fn test_split_uneven_axis_is_error() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::<f32>::zeros(&[3, 2]).unwrap();
        assert!(engine.split(&ctx, &a, 2, 0).is_err());
    }

    #[test]
    fn test_split_zero_n_is_error() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::<f32>::zeros(&[4, 2]).unwrap();
        assert!(engine.split(&ctx, &a, 0, 0).is_err());
    }

    #[test]
    fn test_repeat_tiles_whole_tensor() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let a = Tensor::from_shape_slice(&[1, 2], &[1.0, 2.0]).unwrap();
        let out = engine.repeat(&ctx, &a, 0, 3).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        assert_eq!(out.data(), &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_one_hot() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let indices = Tensor::from_shape_slice(&[3], &[0.0, 2.0, 1.0]).unwrap();
        let out = engine.one_hot(&ctx, &indices, 3).unwrap();
        assert_eq!(out.shape(), &[3, 3]);
        assert_eq!(out.data(), &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_gather_1d_indices() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let params = Tensor::from_shape_slice(&[3, 2], &[10.0, 11.0, 20.0, 21.0, 30.0, 31.0]).unwrap();
        let indices = Tensor::from_shape_slice(&[2], &[2.0, 0.0]).unwrap();
        let out = engine.gather(&ctx, &params, &indices).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out.data(), &[30.0, 31.0, 10.0, 11.0]);
    }

    #[test]
    fn test_gather_2d_indices() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let params = Tensor::from_shape_slice(
            &[4, 3],
            &[
                0.1, 0.2, 0.3, 1.0, 1.1, 1.2, 2.0, 2.1, 2.2, 3.0, 3.1, 3.2,
            ],
        )
        .unwrap();
        let indices = Tensor::from_shape_slice(&[2, 2], &[2.0, 0.0, 3.0, 1.0]).unwrap();
        let out = engine.gather(&ctx, &params, &indices).unwrap();
        assert_eq!(out.shape(), &[2, 2, 3]);
        assert_eq!(
            out.data(),
            &[2.0, 2.1, 2.2, 0.1, 0.2, 0.3, 3.0, 3.1, 3.2, 1.0, 1.1, 1.2]
        );
    }

    #[test]
    fn test_gather_out_of_range_is_error() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let params = Tensor::<f32>::zeros(&[2, 2]).unwrap();
        let indices = Tensor::from_shape_slice(&[1], &[5.0]).unwrap();
        assert!(engine.gather(&ctx, &params, &indices).is_err());
    }

    #[test]
    fn test_scatter_add_accumulates() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let mut table = Tensor::<f32>::zeros(&[3, 2]).unwrap();
        let indices = Tensor::from_shape_slice(&[2], &[1.0, 1.0]).unwrap();
        let updates = Tensor::from_shape_slice(&[2, 2], &[1.0, 1.0, 2.0, 2.0]).unwrap();
        engine.scatter_add(&ctx, &mut table, &indices, &updates).unwrap();
        assert_eq!(table.data(), &[0.0, 0.0, 3.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_reshape_in_place() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let mut a = Tensor::from_shape_slice(&[2, 3], &[1., 2., 3., 4., 5., 6.]).unwrap();
        engine.reshape_in_place(&ctx, &mut a, &[3, 2]).unwrap();
        assert_eq!(a.shape(), &[3, 2]);
        assert_eq!(a.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
