// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type and view abstractions.

use crate::{DType, Element, Shape, TensorError};

/// An owned, n-dimensional tensor stored in contiguous memory.
///
/// # Memory Layout
/// Data is stored in row-major (C) order as a flat byte buffer in native
/// endianness. Typed access goes through [`Tensor::to_vec`], which copies
/// into a correctly aligned `Vec<T>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    data: Vec<u8>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape, DType};
    /// let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32);
    /// assert_eq!(t.size_bytes(), 24); // 2 * 3 * 4 bytes
    /// ```
    ///
    /// # Panics
    /// If the byte size of `shape` overflows `usize`. Check untrusted shapes
    /// with [`Shape::checked_size_bytes`] first.
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        let size = shape.size_bytes(dtype);
        Self {
            shape,
            dtype,
            data: vec![0u8; size],
        }
    }

    /// Creates a tensor from raw bytes.
    ///
    /// Returns an error if the buffer size does not match `shape.size_bytes(dtype)`.
    pub fn from_bytes(shape: Shape, dtype: DType, data: Vec<u8>) -> Result<Self, TensorError> {
        let expected = checked_size(&shape, dtype)?;
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Creates a tensor from a slice of native values.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_values(Shape::vector(3), &[1i32, 2, 3]).unwrap();
    /// assert_eq!(t.to_vec::<i32>().unwrap(), vec![1, 2, 3]);
    /// ```
    pub fn from_values<T: Element>(shape: Shape, values: &[T]) -> Result<Self, TensorError> {
        let expected = checked_size(&shape, T::DTYPE)? / T::DTYPE.size_bytes();
        if values.len() != expected {
            return Err(TensorError::ValueCountMismatch {
                shape,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            shape,
            dtype: T::DTYPE,
            data: bytemuck::cast_slice(values).to_vec(),
        })
    }

    /// Parses textual element values into a tensor of the given shape and dtype.
    ///
    /// A single value is broadcast to every element; otherwise the number of
    /// tokens must equal the element count.
    pub fn parse_values(shape: Shape, dtype: DType, tokens: &[&str]) -> Result<Self, TensorError> {
        let size = checked_size(&shape, dtype)?;
        check_token_count(&shape, size / dtype.size_bytes(), tokens.len())?;
        let mut data = vec![0u8; size];
        parse_values_into(&shape, dtype, tokens, &mut data)?;
        Ok(Self { shape, dtype, data })
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the number of elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns an immutable view over this tensor's data.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: &self.shape,
            dtype: self.dtype,
            data: &self.data,
        }
    }

    /// Returns the raw byte slice backing this tensor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the tensor and returns its byte storage.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Copies the elements out as native values.
    ///
    /// Returns [`TensorError::UnsupportedDType`] if `T` does not match the dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, TensorError> {
        self.view().to_vec()
    }

    /// Renders the elements as space-separated text in row-major order.
    pub fn format_values(&self) -> String {
        self.view().format_values()
    }
}

/// Parses textual element values straight into `out`, which must be exactly
/// the byte size of `shape` × `dtype`.
///
/// Same grammar as [`Tensor::parse_values`]: one token splats, otherwise
/// there is one token per element. On error `out` may be partially written.
pub fn parse_values_into(
    shape: &Shape,
    dtype: DType,
    tokens: &[&str],
    out: &mut [u8],
) -> Result<(), TensorError> {
    let expected = checked_size(shape, dtype)?;
    if out.len() != expected {
        return Err(TensorError::BufferSizeMismatch {
            expected,
            actual: out.len(),
        });
    }
    check_token_count(shape, expected / dtype.size_bytes(), tokens.len())?;

    dispatch_dtype!(dtype, T => {
        let parse = |tok: &str| {
            tok.parse::<T>().map_err(|_| TensorError::Parse {
                what: dtype.as_str(),
                text: tok.to_string(),
            })
        };
        let width = std::mem::size_of::<T>();
        if let [only] = tokens {
            let value = parse(*only)?;
            for chunk in out.chunks_exact_mut(width) {
                chunk.copy_from_slice(bytemuck::bytes_of(&value));
            }
        } else {
            for (tok, chunk) in tokens.iter().copied().zip(out.chunks_exact_mut(width)) {
                chunk.copy_from_slice(bytemuck::bytes_of(&parse(tok)?));
            }
        }
    });
    Ok(())
}

fn checked_size(shape: &Shape, dtype: DType) -> Result<usize, TensorError> {
    shape
        .checked_size_bytes(dtype)
        .ok_or_else(|| TensorError::SizeOverflow {
            shape: shape.clone(),
            dtype,
        })
}

fn check_token_count(shape: &Shape, elements: usize, tokens: usize) -> Result<(), TensorError> {
    if tokens == 1 || tokens == elements {
        return Ok(());
    }
    Err(TensorError::ValueCountMismatch {
        shape: shape.clone(),
        expected: elements,
        actual: tokens,
    })
}

/// A borrowed, read-only view over tensor-shaped bytes.
///
/// Views are zero-copy and tied to the lifetime of the source storage,
/// enforced by the borrow checker.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a> {
    shape: &'a Shape,
    dtype: DType,
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Creates a view from raw parts.
    ///
    /// Returns an error if `data` is not exactly `shape.size_bytes(dtype)` long.
    pub fn from_parts(shape: &'a Shape, dtype: DType, data: &'a [u8]) -> Result<Self, TensorError> {
        let expected = checked_size(shape, dtype)?;
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &'a Shape {
        self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the raw byte slice.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Copies the elements out as native values.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, TensorError> {
        if T::DTYPE != self.dtype {
            return Err(TensorError::UnsupportedDType {
                op: "to_vec",
                dtype: self.dtype,
            });
        }
        Ok(bytemuck::pod_collect_to_vec::<u8, T>(self.data))
    }

    /// Renders the elements as space-separated text in row-major order.
    pub fn format_values(&self) -> String {
        dispatch_dtype!(self.dtype, T => {
            bytemuck::pod_collect_to_vec::<u8, T>(self.data)
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    /// Copies the viewed bytes into an owned tensor.
    pub fn to_tensor(&self) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            dtype: self.dtype,
            data: self.data.to_vec(),
        }
    }
}
