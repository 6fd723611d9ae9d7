//! N-dimensional tensor with system-allocator-backed storage.

mod layout;

use alloc::boxed::Box;
use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use crate::error::{Error, TensorError};
use crate::numeric::Numeric;
use layout::Layout;

/// Dense, row-major, strided n-dimensional array over a [`Numeric`] scalar
/// type. Always owns its backing buffer; non-owning aliases are represented
/// by [`TensorView`].
pub struct Tensor<S: Numeric> {
    layout: Layout,
    data: Vec<S>,
}

impl<S: Numeric> Tensor<S> {
    /// Creates a zero-initialized tensor with the given shape. A zero-length
    /// dimension is legal and yields a tensor of size 0.
    ///
    /// # Errors
    ///
    /// Currently infallible; returns `Result` for symmetry with the other
    /// constructors and to leave room for future layout validation.
    pub fn zeros(shape: &[usize]) -> Result<Self, Error> {
        let layout = Layout::from_dimensions(shape)?;
        let data = vec![S::zero(); layout.size()];
        Ok(Self { layout, data })
    }

    /// Creates a tensor from shape and owned data. A zero-length dimension is
    /// legal and requires an empty `data`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `data.len()` does not equal the shape's
    ///   volume.
    pub fn from_shape_vec(shape: &[usize], data: Vec<S>) -> Result<Self, Error> {
        let layout = Layout::from_dimensions(shape)?;
        if data.len() != layout.size() {
            return Err(TensorError::shape(
                "Tensor::new",
                format!(
                    "data length {} does not match shape volume {}",
                    data.len(),
                    layout.size()
                ),
            )
            .into());
        }
        Ok(Self { layout, data })
    }

    /// Creates a tensor from shape and a data slice, copying it.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `data.len()` does not equal the shape's
    ///   volume.
    pub fn from_shape_slice(shape: &[usize], data: &[S]) -> Result<Self, Error> {
        Self::from_shape_vec(shape, data.to_vec())
    }

    /// Creates a 1-D tensor from a data slice. An empty slice yields a
    /// zero-length tensor.
    ///
    /// # Errors
    ///
    /// Currently infallible; returns `Result` for symmetry with
    /// [`Tensor::from_shape_slice`].
    pub fn from_slice(data: &[S]) -> Result<Self, Error> {
        Self::from_shape_slice(&[data.len()], data)
    }

    /// Creates a copy of this tensor, canonical regardless of the source's
    /// strides.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            layout: self.layout.clone(),
            data: self.data.clone(),
        }
    }

    /// Returns the tensor shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.layout.dimensions()
    }

    /// Returns the tensor strides.
    #[must_use]
    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    /// Returns the total number of elements.
    #[must_use]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Returns the rank (number of dimensions).
    #[must_use]
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Returns `true` if the tensor holds no elements (rank-0 tensors are
    /// never empty — they hold exactly one element).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the backing data as an immutable slice, in canonical
    /// (row-major) order.
    #[must_use]
    pub fn data(&self) -> &[S] {
        &self.data
    }

    /// Returns the backing data as a mutable slice.
    pub fn data_mut(&mut self) -> &mut [S] {
        &mut self.data
    }

    /// Returns the element at `indices`, bounds-checked.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Index`] if `indices` has the wrong length or any
    ///   component is out of bounds.
    pub fn at(&self, indices: &[usize]) -> Result<S, Error> {
        let position = self.layout.linear_index("Tensor::at", indices)?;
        Ok(self.data[position])
    }

    /// Sets the element at `indices`, bounds-checked.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Index`] if `indices` has the wrong length or any
    ///   component is out of bounds.
    pub fn set(&mut self, indices: &[usize], value: S) -> Result<(), Error> {
        let position = self.layout.linear_index("Tensor::set", indices)?;
        self.data[position] = value;
        Ok(())
    }

    /// Reshapes into a new canonical tensor with `new_shape`, preserving
    /// element order. A single `-1` entry is inferred from the remaining
    /// dimensions and the tensor's size.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if more than one dimension is `-1`, or if the
    ///   resolved shape's volume does not equal `self.size()`.
    pub fn reshape(&self, new_shape: &[i64]) -> Result<Self, Error> {
        let resolved = resolve_reshape(new_shape, self.size())?;
        Self::from_shape_vec(&resolved, self.data.clone())
    }

    /// Produces a non-owning view over `ranges`, one half-open range per
    /// dimension.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Shape`] if `ranges.len() != self.rank()`.
    /// - [`TensorError::Index`] if any range exceeds its dimension's bound.
    pub fn slice(&self, ranges: &[Range<usize>]) -> Result<TensorView<'_, S>, Error> {
        if ranges.len() != self.rank() {
            return Err(TensorError::shape(
                "Tensor::slice",
                format!(
                    "expected {} ranges, got {}",
                    self.rank(),
                    ranges.len()
                ),
            )
            .into());
        }

        let dimensions = self.layout.dimensions();
        let strides = self.layout.strides();
        let mut offset = self.layout.offset();
        let mut out_dims = Vec::with_capacity(ranges.len());

        for (axis, (range, (&dim, &stride))) in ranges
            .iter()
            .zip(dimensions.iter().zip(strides.iter()))
            .enumerate()
        {
            if range.start > range.end || range.end > dim {
                return Err(TensorError::index(
                    "Tensor::slice",
                    format!("range {range:?} out of bounds for axis {axis} of size {dim}"),
                )
                .into());
            }
            offset += range.start * stride;
            out_dims.push(range.end - range.start);
        }

        Ok(TensorView {
            layout: Layout::from_view(out_dims.into_boxed_slice(), strides.into(), offset),
            data: &self.data,
        })
    }

    /// Returns the underlying [`Layout`], for engine-internal use.
    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Privileged: overwrites shape and strides in place without touching
    /// the data buffer. Used by the engine (e.g. `reshape` aliasing its own
    /// destination, `zeros` reallocating in place).
    pub(crate) fn set_shape(&mut self, shape: &[usize]) -> Result<(), Error> {
        self.layout = Layout::from_dimensions(shape)?;
        Ok(())
    }

    /// Privileged: overwrites the data buffer in place, re-deriving a
    /// canonical layout of the same size. Used by the engine.
    pub(crate) fn set_data(&mut self, data: Vec<S>) {
        self.data = data;
    }
}

impl<S: Numeric> Clone for Tensor<S> {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl<S: Numeric> core::fmt::Debug for Tensor<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .finish_non_exhaustive()
    }
}

impl<S: Numeric> PartialEq for Tensor<S> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.data == other.data
    }
}

/// Non-owning, borrow-checked view over a parent [`Tensor`]'s buffer.
///
/// Produced only by [`Tensor::slice`]. Read-only: engine operations accept
/// views as inputs but never as a destination.
pub struct TensorView<'a, S: Numeric> {
    layout: Layout,
    data: &'a [S],
}

impl<'a, S: Numeric> TensorView<'a, S> {
    /// Returns the view's shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.layout.dimensions()
    }

    /// Returns the view's strides.
    #[must_use]
    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    /// Returns the total number of elements visible through the view.
    #[must_use]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Returns the rank (number of dimensions).
    #[must_use]
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Returns the element at `indices`, bounds-checked.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Index`] if `indices` has the wrong length or any
    ///   component is out of bounds.
    pub fn at(&self, indices: &[usize]) -> Result<S, Error> {
        let position = self.layout.linear_index("TensorView::at", indices)?;
        Ok(self.data[position])
    }

    /// Materializes the view into a fresh, canonical, owned [`Tensor`].
    #[must_use]
    pub fn to_owned_tensor(&self) -> Tensor<S> {
        let dims = self.layout.dimensions();
        let strides = self.layout.strides();
        let offset = self.layout.offset();
        let mut data = Vec::with_capacity(self.size());

        if dims.is_empty() {
            data.push(self.data[offset]);
        } else {
            let mut indices = vec![0usize; dims.len()];
            loop {
                let mut position = offset;
                for (&index, &stride) in indices.iter().zip(strides.iter()) {
                    position += index * stride;
                }
                data.push(self.data[position]);

                let mut axis = dims.len();
                loop {
                    if axis == 0 {
                        return Tensor::from_shape_vec(dims, data)
                            .expect("materialized view has valid shape/data length");
                    }
                    axis -= 1;
                    indices[axis] += 1;
                    if indices[axis] < dims[axis] {
                        break;
                    }
                    indices[axis] = 0;
                }
            }
        }

        Tensor::from_shape_vec(dims, data)
            .expect("materialized view has valid shape/data length")
    }

    /// Returns the view's [`Layout`], for engine-internal use.
    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the parent buffer this view borrows from, for engine-internal
    /// use (e.g. broadcasting against the view directly without
    /// materializing).
    pub(crate) fn data(&self) -> &'a [S] {
        self.data
    }
}

impl<S: Numeric> core::fmt::Debug for TensorView<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TensorView")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .finish_non_exhaustive()
    }
}

/// Resolves a `reshape` target shape, inferring a single `-1` entry.
fn resolve_reshape(new_shape: &[i64], size: usize) -> Result<Vec<usize>, Error> {
    let mut infer_axis = None;
    let mut known_product: usize = 1;

    for (axis, &dim) in new_shape.iter().enumerate() {
        if dim == -1 {
            if infer_axis.is_some() {
                return Err(TensorError::shape(
                    "Tensor::reshape",
                    "at most one dimension may be -1",
                )
                .into());
            }
            infer_axis = Some(axis);
        } else if dim < 0 {
            return Err(TensorError::shape(
                "Tensor::reshape",
                format!("negative dimension {dim} is invalid (only -1 is accepted)"),
            )
            .into());
        } else {
            let dim = usize::try_from(dim).unwrap_or(usize::MAX);
            known_product = known_product.saturating_mul(dim);
        }
    }

    let mut resolved: Vec<usize> = new_shape
        .iter()
        .map(|&dim| {
            if dim == -1 {
                0
            } else {
                usize::try_from(dim).unwrap_or(usize::MAX)
            }
        })
        .collect();

    if let Some(axis) = infer_axis {
        if known_product == 0 || size % known_product != 0 {
            return Err(TensorError::shape(
                "Tensor::reshape",
                format!("cannot infer -1 dimension: size {size} not divisible by {known_product}"),
            )
            .into());
        }
        resolved[axis] = size / known_product;
    } else if known_product != size {
        return Err(TensorError::shape(
            "Tensor::reshape",
            format!("reshape size mismatch: {known_product} != {size}"),
        )
        .into());
    }

    Ok(resolved)
}
