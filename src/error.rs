//! Error types for tensor and engine operations.
//!
//! - [`Error`] — top-level error type.
//! - [`TensorError`] — tensor and engine operation errors.

/// Top-level error type for tensor and engine operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Tensor or engine operation error.
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// Backing allocator could not produce a buffer.
    #[error("allocation failed: {0}")]
    Allocation(String),
}

/// Errors from tensor and engine operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TensorError {
    /// A required tensor operand was not supplied.
    #[error("null input: {0}")]
    NullInput(String),

    /// Shapes are incompatible for the operation.
    #[error("invalid shape: {0}")]
    Shape(String),

    /// Axis index out of range for the operand's rank.
    #[error("invalid axis: {0}")]
    Axis(String),

    /// An index is out of its declared range.
    #[error("invalid index: {0}")]
    Index(String),

    /// Integer scalar type encountered a zero divisor.
    #[error("divide by zero in {0}")]
    DivideByZero(String),

    /// Invalid construction parameters.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TensorError {
    /// Builds a [`TensorError::Shape`] naming the operation and offending shapes.
    pub(crate) fn shape(op: &str, detail: impl core::fmt::Display) -> Self {
        Self::Shape(format!("{op}: {detail}"))
    }

    /// Builds a [`TensorError::Axis`] naming the operation and offending axis.
    pub(crate) fn axis(op: &str, detail: impl core::fmt::Display) -> Self {
        Self::Axis(format!("{op}: {detail}"))
    }

    /// Builds a [`TensorError::Index`] naming the operation and offending index.
    pub(crate) fn index(op: &str, detail: impl core::fmt::Display) -> Self {
        Self::Index(format!("{op}: {detail}"))
    }

    /// Builds a [`TensorError::Config`] naming the operation and offending value.
    pub(crate) fn config(op: &str, detail: impl core::fmt::Display) -> Self {
        Self::Config(format!("{op}: {detail}"))
    }
}
