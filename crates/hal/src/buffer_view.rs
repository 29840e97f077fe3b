// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Typed, shaped view over a device buffer.

use crate::{Buffer, HalError};
use tensor_core::{DType, Element, Shape, Tensor, TensorError, TensorView};

/// An immutable `(buffer, shape, dtype)` triple.
///
/// Once constructed a buffer view never changes; kernels read from views
/// and write into newly allocated buffers. This is what lets the benchmark
/// harness share one input list across every invocation.
pub struct BufferView {
    buffer: Buffer,
    shape: Shape,
    dtype: DType,
}

impl BufferView {
    /// Wraps `buffer` as `shape` × `dtype`.
    ///
    /// # Errors
    /// [`TensorError::BufferSizeMismatch`] if the buffer is not exactly
    /// `shape.size_bytes(dtype)` long.
    pub fn new(buffer: Buffer, shape: Shape, dtype: DType) -> Result<Self, HalError> {
        let expected = shape
            .checked_size_bytes(dtype)
            .ok_or_else(|| TensorError::SizeOverflow {
                shape: shape.clone(),
                dtype,
            })?;
        if buffer.size_bytes() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: buffer.size_bytes(),
            }
            .into());
        }
        Ok(Self {
            buffer,
            shape,
            dtype,
        })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    pub fn size_bytes(&self) -> usize {
        self.buffer.size_bytes()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Borrows the contents as a kernel operand.
    pub fn view(&self) -> Result<TensorView<'_>, TensorError> {
        TensorView::from_parts(&self.shape, self.dtype, self.buffer.as_slice())
    }

    /// Copies the contents back to a host tensor.
    pub fn to_tensor(&self) -> Result<Tensor, TensorError> {
        Tensor::from_bytes(self.shape.clone(), self.dtype, self.as_bytes().to_vec())
    }

    /// Copies the elements out as native values.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, TensorError> {
        self.view()?.to_vec()
    }

    /// `2x2xi32` style descriptor of this view.
    pub fn descriptor(&self) -> String {
        if self.shape.rank() == 0 {
            self.dtype.to_string()
        } else {
            format!("{}x{}", self.shape.to_dims_string(), self.dtype)
        }
    }
}

impl std::fmt::Debug for BufferView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferView")
            .field("shape", &self.shape)
            .field("dtype", &self.dtype)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Allocator, MemoryBudget};

    #[test]
    fn test_size_checked() {
        let allocator = Allocator::new(MemoryBudget::unlimited());
        let buffer = allocator.allocate_buffer(12).unwrap();
        let result = BufferView::new(buffer, Shape::matrix(2, 2), DType::I32);
        assert!(matches!(
            result,
            Err(HalError::Kernel(TensorError::BufferSizeMismatch {
                expected: 16,
                actual: 12
            }))
        ));
    }

    #[test]
    fn test_descriptor() {
        let allocator = Allocator::new(MemoryBudget::unlimited());
        let matrix = allocator
            .allocate_buffer_view(Shape::matrix(2, 3), DType::F32)
            .unwrap();
        assert_eq!(matrix.descriptor(), "2x3xf32");
        let scalar = allocator
            .allocate_buffer_view(Shape::scalar(), DType::I64)
            .unwrap();
        assert_eq!(scalar.descriptor(), "i64");
    }

    #[test]
    fn test_to_tensor() {
        let allocator = Allocator::new(MemoryBudget::unlimited());
        let tensor = Tensor::from_values(Shape::vector(2), &[1.5f64, -2.0]).unwrap();
        let view = allocator.wrap_tensor(&tensor).unwrap();
        assert_eq!(view.to_tensor().unwrap(), tensor);
        assert!(view.to_vec::<f32>().is_err());
    }
}
