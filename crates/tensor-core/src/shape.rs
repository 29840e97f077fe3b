// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use crate::TensorError;
use std::fmt;

/// Describes the dimensionality of a [`crate::Tensor`].
///
/// Shapes are immutable once created and provide convenience methods for
/// computing strides and total element counts. The textual form used by
/// signatures and input entries is `x`-separated (`2x3x4`); the rank-0
/// shape has an empty textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Parses an `x`-separated dimension list such as `"2x2"`.
    ///
    /// The empty string parses as the scalar shape.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// assert_eq!(Shape::parse("2x3").unwrap(), Shape::matrix(2, 3));
    /// assert_eq!(Shape::parse("").unwrap(), Shape::scalar());
    /// ```
    pub fn parse(text: &str) -> Result<Self, TensorError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::scalar());
        }
        let dims = text
            .split('x')
            .map(|d| {
                d.trim().parse::<usize>().map_err(|_| TensorError::Parse {
                    what: "dimension",
                    text: d.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { dims })
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For a scalar shape (rank 0), returns 1.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the total number of elements, or `None` if the product of
    /// the dimensions does not fit in `usize`.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Computes the memory footprint in bytes for a given [`crate::DType`].
    ///
    /// Only meaningful for shapes already known to be addressable; use
    /// [`Shape::checked_size_bytes`] for shapes that come from user input.
    pub fn size_bytes(&self, dtype: super::DType) -> usize {
        self.num_elements() * dtype.size_bytes()
    }

    /// Memory footprint in bytes, or `None` on overflow.
    pub fn checked_size_bytes(&self, dtype: super::DType) -> Option<usize> {
        self.checked_num_elements()?.checked_mul(dtype.size_bytes())
    }

    /// Computes row-major (C-order) strides for this shape.
    ///
    /// The stride for dimension `i` is the number of elements to skip
    /// in the flat buffer to advance one step along that dimension.
    pub fn strides(&self) -> Vec<usize> {
        let rank = self.dims.len();
        if rank == 0 {
            return vec![];
        }
        let mut strides = vec![0usize; rank];
        strides[rank - 1] = 1;
        for i in (0..rank - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Returns `true` if the shapes are compatible for a matrix multiply:
    /// `self` is `[M, K]` and `other` is `[K, N]`.
    pub fn is_matmul_compatible(&self, other: &Shape) -> bool {
        if self.rank() != 2 || other.rank() != 2 {
            return false;
        }
        self.dims[1] == other.dims[0]
    }

    /// Returns the `x`-separated textual form (`"2x2"`, `""` for scalars).
    pub fn to_dims_string(&self) -> String {
        self.dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("x")
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![2, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[2, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}
