//! Tensor memory layout with dimensions, strides, and offset.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use crate::Error;
use crate::error::TensorError;

/// Tensor memory layout descriptor.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    dimensions: Box<[usize]>,
    strides: Box<[usize]>,
    offset: usize,
}

impl Layout {
    /// Creates a new contiguous layout from dimensions.
    ///
    /// A zero-length dimension is legal (the layout's `size()` is 0); it is
    /// only rejected by operations that document it as such (e.g. matmul's
    /// inner dimension).
    pub(crate) fn from_dimensions(dimensions: &[usize]) -> Result<Self, Error> {
        Ok(Self {
            dimensions: dimensions.into(),
            strides: Self::compute_strides(dimensions),
            offset: 0,
        })
    }

    /// Returns the dimensions as a slice.
    pub(crate) fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    /// Returns the strides as a slice.
    pub(crate) fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Returns the memory offset.
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the rank (number of dimensions).
    pub(crate) fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Creates a layout with an explicit offset and strides, used for views.
    pub(crate) fn from_view(dimensions: Box<[usize]>, strides: Box<[usize]>, offset: usize) -> Self {
        Self {
            dimensions,
            strides,
            offset,
        }
    }

    /// Resolves a multi-index to a linear position in the backing buffer.
    ///
    /// # Errors
    ///
    /// - [`TensorError::Index`] if `indices` has the wrong length or any
    ///   component is out of bounds for its dimension.
    pub(crate) fn linear_index(&self, op: &str, indices: &[usize]) -> Result<usize, Error> {
        if indices.len() != self.dimensions.len() {
            return Err(TensorError::index(
                op,
                alloc::format!(
                    "expected {} indices, got {}",
                    self.dimensions.len(),
                    indices.len()
                ),
            )
            .into());
        }

        let mut position = self.offset;
        for ((&index, &dim), &stride) in indices
            .iter()
            .zip(self.dimensions.iter())
            .zip(self.strides.iter())
        {
            if index >= dim {
                return Err(TensorError::index(
                    op,
                    alloc::format!("index {index} out of bounds for dimension of size {dim}"),
                )
                .into());
            }
            position += index * stride;
        }

        Ok(position)
    }

    /// Returns the total number of elements.
    ///
    /// Returns 1 for scalars (the empty product); 0 if any dimension is 0.
    pub(crate) fn size(&self) -> usize {
        self.dimensions.iter().product()
    }

    /// Computes broadcast dimensions and strides for multiple layouts.
    ///
    /// Returns output dimensions and strides for each input layout,
    /// or `None` if layouts are not broadcast-compatible.
    #[allow(clippy::type_complexity)]
    pub(crate) fn broadcast(layouts: &[&Layout]) -> Option<(Box<[usize]>, Vec<Box<[usize]>>)> {
        if layouts.is_empty() {
            return Some((Box::new([]), Vec::new()));
        }

        if layouts.len() == 1 {
            return Some((
                layouts[0].dimensions.clone(),
                vec![layouts[0].strides.clone()],
            ));
        }

        let mut out_dims = layouts[0].dimensions.clone();
        for layout in &layouts[1..] {
            out_dims = Self::broadcast_dimensions(&out_dims, &layout.dimensions)?;
        }

        let strides = layouts
            .iter()
            .map(|l| l.broadcast_strides(&out_dims))
            .collect();

        Some((out_dims, strides))
    }

    /// Computes broadcast dimensions for two dimension slices.
    fn broadcast_dimensions(a: &[usize], b: &[usize]) -> Option<Box<[usize]>> {
        let mut result: Vec<usize> = a
            .iter()
            .rev()
            .copied()
            .chain(core::iter::repeat(1))
            .zip(b.iter().rev().copied().chain(core::iter::repeat(1)))
            .take(a.len().max(b.len()))
            .map(|(a, b)| match (a, b) {
                (a, b) if a == b => Some(a),
                (1, b) => Some(b),
                (a, 1) => Some(a),
                _ => None,
            })
            .collect::<Option<_>>()?;

        result.reverse();

        Some(result.into_boxed_slice())
    }

    /// Computes strides for broadcasting this layout to target shape.
    ///
    /// Broadcast dimensions have stride 0.
    pub(crate) fn broadcast_strides(&self, target: &[usize]) -> Box<[usize]> {
        let dimensions = &self.dimensions;
        let strides = &self.strides;

        let mut result: Vec<usize> =
            core::iter::repeat_n(0, target.len().saturating_sub(dimensions.len()))
                .chain(
                    dimensions
                        .iter()
                        .zip(strides)
                        .zip(
                            target
                                .iter()
                                .skip(target.len().saturating_sub(dimensions.len())),
                        )
                        .map(|((&dim, &stride), &t)| if dim == t { stride } else { 0 }),
                )
                .collect();

        if result.len() < target.len() {
            result.resize(target.len(), 0);
        }

        result.into_boxed_slice()
    }

    /// Computes row-major (C-contiguous) strides for the given dimensions.
    fn compute_strides(dimensions: &[usize]) -> Box<[usize]> {
        let mut strides = vec![1; dimensions.len()];
        for i in (0..dimensions.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * dimensions[i + 1];
        }
        strides.into_boxed_slice()
    }
}
