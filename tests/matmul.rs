//! Matmul shape-planning and error-path tests.

use tensorcore::{Context, Engine, Tensor};

#[test]
fn matmul_plain_2d() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let a = Tensor::from_shape_slice(&[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let b = Tensor::from_shape_slice(&[3, 2], &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();

    let out = engine.matmul(&ctx, &a, &b).unwrap();

    assert_eq!(out.shape(), &[2, 2]);
    assert_eq!(out.data(), &[58.0, 64.0, 139.0, 154.0]);
}

#[test]
fn matmul_batched_equal_rank() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let a = Tensor::from_shape_slice(&[2, 2, 2], &[1.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0, 2.0]).unwrap();
    let b = Tensor::from_shape_slice(&[2, 2, 2], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();

    let out = engine.matmul(&ctx, &a, &b).unwrap();

    assert_eq!(out.shape(), &[2, 2, 2]);
    assert_eq!(out.data(), &[1.0, 2.0, 3.0, 4.0, 10.0, 12.0, 14.0, 16.0]);
}

#[test]
fn matmul_rejects_mismatched_inner_dims() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let a = Tensor::from_shape_slice(&[2, 3], &[1.0; 6]).unwrap();
    let b = Tensor::from_shape_slice(&[4, 2], &[1.0; 8]).unwrap();

    assert!(engine.matmul(&ctx, &a, &b).is_err());
}

#[test]
fn matmul_rejects_rank_below_two() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let a = Tensor::from_shape_slice(&[3], &[1.0, 2.0, 3.0]).unwrap();
    let b = Tensor::from_shape_slice(&[3, 2], &[1.0; 6]).unwrap();

    assert!(engine.matmul(&ctx, &a, &b).is_err());
}

#[test]
fn matmul_rejects_b_with_higher_rank_than_a() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let a = Tensor::from_shape_slice(&[3, 2], &[1.0; 6]).unwrap();
    let b = Tensor::from_shape_slice(&[2, 2, 2], &[1.0; 8]).unwrap();

    assert!(engine.matmul(&ctx, &a, &b).is_err());
}

#[test]
fn matmul_rejects_zero_inner_dimension() {
    let ctx = Context::with_parallelism(1);
    let engine = Engine::<f32>::new();
    let a = Tensor::<f32>::zeros(&[2, 0]).unwrap();
    let b = Tensor::<f32>::zeros(&[0, 2]).unwrap();

    assert!(engine.matmul(&ctx, &a, &b).is_err());
}
