//! A generic, shape-aware, broadcasting-capable CPU tensor engine for
//! neural-network compute.
//!
//! This library provides a dense, strided tensor type and a stateless
//! operator surface ([`Engine`]) covering element-wise arithmetic,
//! broadcasting, reductions, softmax, batched matmul, and shape
//! manipulation, parallelized across CPU cores above a size threshold.
//!
//! # Types
//!
//! - [`Tensor`] — owning, dense, row-major n-dimensional array.
//! - [`TensorView`] — non-owning, borrow-checked view produced by
//!   [`Tensor::slice`].
//! - [`Numeric`] — scalar element trait implemented for `f16`, `f32`, `f64`,
//!   [`F8`], `i8`, `i32`, and `i64`.
//! - [`Engine`] — the stateless operator surface over tensors of a given
//!   scalar type.
//! - [`Context`] — execution context threaded through every [`Engine`] call:
//!   parallelism and cooperative cancellation.
//! - [`GemmKernel`] / [`NaiveGemm`] — the pluggable matmul seam and its
//!   always-available fallback.
//! - [`Error`] / [`error::TensorError`] — the crate's error taxonomy.

#![warn(missing_docs)]

extern crate alloc;

pub mod error;

mod device;
mod engine;
mod numeric;
mod parallel;
mod tensor;

pub use device::Context;
pub use engine::{Engine, GemmKernel, NaiveGemm};
pub use error::Error;
pub use numeric::{F8, Numeric};
pub use tensor::{Tensor, TensorView};
