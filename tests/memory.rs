//! Memory-op tests: zero, fill, random_uniform determinism, copy.

use tensorcore::{Context, Engine, Tensor};

#[test]
fn zero_clears_existing_data() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let mut dst = Tensor::from_shape_slice(&[3], &[1.0, 2.0, 3.0]).unwrap();

    engine.zero(&ctx, &mut dst);

    assert_eq!(dst.data(), &[0.0, 0.0, 0.0]);
}

#[test]
fn zeros_reallocates_to_new_shape() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let mut dst = Tensor::from_shape_slice(&[3], &[1.0, 2.0, 3.0]).unwrap();

    engine.zeros(&ctx, &[2, 2], &mut dst).unwrap();

    assert_eq!(dst.shape(), &[2, 2]);
    assert_eq!(dst.data(), &[0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn fill_sets_every_element() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let mut dst = Tensor::zeros(&[4]).unwrap();

    engine.fill(&ctx, &mut dst, 7.0);

    assert_eq!(dst.data(), &[7.0, 7.0, 7.0, 7.0]);
}

#[test]
fn random_uniform_is_deterministic_for_same_seed() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let mut a = Tensor::zeros(&[100]).unwrap();
    let mut b = Tensor::zeros(&[100]).unwrap();

    engine.random_uniform(&ctx, &mut a, 0.0, 1.0, 42).unwrap();
    engine.random_uniform(&ctx, &mut b, 0.0, 1.0, 42).unwrap();

    assert_eq!(a.data(), b.data());
    assert!(a.data().iter().all(|&v| (0.0..1.0).contains(&v)));
}

#[test]
fn random_uniform_rejects_empty_range() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let mut dst = Tensor::zeros(&[4]).unwrap();

    assert!(engine.random_uniform(&ctx, &mut dst, 1.0, 1.0, 0).is_err());
}

#[test]
fn copy_duplicates_source_data() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let src = Tensor::from_shape_slice(&[3], &[1.0, 2.0, 3.0]).unwrap();
    let mut dst = Tensor::zeros(&[3]).unwrap();

    engine.copy(&ctx, &src, &mut dst).unwrap();

    assert_eq!(dst, src);
}
