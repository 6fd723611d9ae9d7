//! The operator surface consumed by neural-network layers.
//!
//! [`Engine`] is stateless: it holds no tensors and no device resources.
//! Every method takes a [`Context`](crate::Context) handle, immutable tensor
//! inputs, and either returns a fresh [`Tensor`](crate::Tensor) or writes
//! into a caller-supplied destination (the `op`/`op_into` pair, per the
//! destination protocol). Engine methods never retain a reference to a
//! caller's tensor past the call.

mod elementwise;
mod matmul;
mod memory;
mod reduce;
mod shape;

pub use matmul::{GemmKernel, NaiveGemm};

use core::marker::PhantomData;

use crate::error::{Error, TensorError};
use crate::numeric::Numeric;
use crate::tensor::Tensor;

/// The ≈30-operation surface over tensors of scalar type `S`.
///
/// Construct one per scalar type with [`Engine::new`]; it carries no state
/// of its own, so constructing many is free.
pub struct Engine<S: Numeric> {
    _scalar: PhantomData<fn() -> S>,
}

impl<S: Numeric> Engine<S> {
    /// Creates a new engine handle for scalar type `S`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _scalar: PhantomData,
        }
    }
}

impl<S: Numeric> Default for Engine<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Numeric> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<S: Numeric> core::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

/// Decodes a row-major flat index against `dims` into a buffer offset using
/// `strides` — `strides` may contain zeros for broadcast dimensions, so this
/// doubles as the broadcast-projection helper used by every elementwise op.
pub(crate) fn decode_offset(dims: &[usize], strides: &[usize], mut linear: usize) -> usize {
    let mut offset = 0;
    for axis in (0..dims.len()).rev() {
        let dim = dims[axis].max(1);
        let coord = linear % dim;
        linear /= dim;
        offset += coord * strides[axis];
    }
    offset
}

/// Validates that `dst`'s shape equals `expected`, per the destination
/// protocol: a mismatch is a fatal shape error and must be detected before
/// any write.
pub(crate) fn check_destination_shape(
    op: &str,
    expected: &[usize],
    dst: &Tensor<impl Numeric>,
) -> Result<(), Error> {
    if dst.shape() != expected {
        return Err(TensorError::shape(
            op,
            alloc::format!(
                "destination shape {:?} does not match computed output shape {expected:?}",
                dst.shape()
            ),
        )
        .into());
    }
    Ok(())
}

/// Resolves a possibly-negative axis against `rank`, per the engine's
/// "`axis < 0` means relative to the end / all axes" convention used by
/// `sum` and `softmax`.
pub(crate) fn resolve_axis(op: &str, axis: i64, rank: usize) -> Result<usize, Error> {
    if axis >= 0 {
        let resolved = usize::try_from(axis).unwrap_or(usize::MAX);
        if resolved >= rank {
            return Err(TensorError::axis(
                op,
                alloc::format!("axis {axis} out of range for rank {rank}"),
            )
            .into());
        }
        Ok(resolved)
    } else {
        let rank = i64::try_from(rank).unwrap_or(i64::MAX);
        let from_end = rank + axis;
        if from_end < 0 {
            return Err(TensorError::axis(op, alloc::format!("axis {axis} out of range")).into());
        }
        Ok(usize::try_from(from_end).unwrap_or(usize::MAX))
    }
}
