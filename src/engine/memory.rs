//! In-place buffer operations: zeroing, filling, random initialization, and
//! copying.

use alloc::vec;

use rand_core::SeedableRng;
use rand_distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::device::Context;
use crate::error::{Error, TensorError};
use crate::numeric::Numeric;
use crate::tensor::Tensor;

use super::Engine;

impl<S: Numeric> Engine<S> {
    /// Zeroes `dst` in place, preserving its shape.
    pub fn zero(&self, _ctx: &Context, dst: &mut Tensor<S>) {
        for value in dst.data_mut() {
            *value = S::zero();
        }
    }

    /// Reallocates `dst` to `shape`, zero-initialized, replacing its buffer
    /// wholesale. A zero-length dimension is legal and yields a tensor of
    /// size 0.
    ///
    /// # Errors
    ///
    /// Currently infallible; returns `Result` for symmetry with the rest of
    /// the destination-protocol ops.
    pub fn zeros(&self, _ctx: &Context, shape: &[usize], dst: &mut Tensor<S>) -> Result<(), Error> {
        let volume: usize = shape.iter().product();
        dst.set_shape(shape)?;
        dst.set_data(vec![S::zero(); volume]);
        Ok(())
    }

    /// Fills every element of `dst` with `value`.
    pub fn fill(&self, _ctx: &Context, dst: &mut Tensor<S>, value: S) {
        for slot in dst.data_mut() {
            *slot = value;
        }
    }

    /// Fills `dst` with independent draws from `Uniform(low, high)`, using an
    /// explicitly seeded RNG so results are reproducible across runs given
    /// the same seed.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Config`] if `low >= high`.
    pub fn random_uniform(&self, _ctx: &Context, dst: &mut Tensor<S>, low: f64, high: f64, seed: u64) -> Result<(), Error> {
        if !(low < high) {
            return Err(TensorError::config(
                "Engine::random_uniform",
                alloc::format!("low ({low}) must be strictly less than high ({high})"),
            )
            .into());
        }

        let distribution = Uniform::new(low, high).map_err(|e| {
            Error::from(TensorError::config("Engine::random_uniform", alloc::format!("{e}")))
        })?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        for slot in dst.data_mut() {
            let sample: f64 = distribution.sample(&mut rng);
            *slot = S::from_f64(sample);
        }
        Ok(())
    }

    /// Copies `src` into `dst`. Both must share the same shape.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `src.shape() != dst.shape()`.
    pub fn copy(&self, _ctx: &Context, src: &Tensor<S>, dst: &mut Tensor<S>) -> Result<(), Error> {
        super::check_destination_shape("Engine::copy", src.shape(), dst)?;
        dst.data_mut().copy_from_slice(src.data());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    #[test]
    fn test_zero() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let mut t = Tensor::from_shape_slice(&[2, 2], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        engine.zero(&ctx, &mut t);
        assert_eq!(t.data(), &[0.0; 4]);
    }

    #[test]
    fn test_zeros_reallocates_shape() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let mut t = Tensor::from_shape_slice(&[2, 2], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        engine.zeros(&ctx, &[3], &mut t).unwrap();
        assert_eq!(t.shape(), &[3]);
        assert_eq!(t.data(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fill() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let mut t = Tensor::<f32>::zeros(&[3]).unwrap();
        engine.fill(&ctx, &mut t, 7.0);
        assert_eq!(t.data(), &[7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_random_uniform_is_deterministic_for_seed() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let mut a = Tensor::<f32>::zeros(&[100]).unwrap();
        let mut b = Tensor::<f32>::zeros(&[100]).unwrap();
        engine.random_uniform(&ctx, &mut a, 0.0, 1.0, 42).unwrap();
        engine.random_uniform(&ctx, &mut b, 0.0, 1.0, 42).unwrap();
        assert_eq!(a.data(), b.data());
        assert!(a.data().iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_random_uniform_rejects_empty_range() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let mut a = Tensor::<f32>::zeros(&[4]).unwrap();
        assert!(engine.random_uniform(&ctx, &mut a, 1.0, 1.0, 0).is_err());
    }

    #[test]
    fn test_copy() {
        let ctx = Context::with_parallelism(1);
        let engine = Engine::<f32>::new();
        let src = Tensor::from_shape_slice(&[2], &[1.0, 2.0]).unwrap();
        let mut dst = Tensor::<f32>::zeros(&[2]).unwrap();
        engine.copy(&ctx, &src, &mut dst).unwrap();
        assert_eq!(dst.data(), &[1.0, 2.0]);
    }
}
