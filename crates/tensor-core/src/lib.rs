// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Element types, shapes and host-side tensors shared by the HAL and the
//! virtual machine.
//!
//! This crate provides:
//! - [`DType`] — the element types a buffer may hold (`i8` … `f64`).
//! - [`Shape`] — row-major dimension descriptors with `2x3x4` text form.
//! - [`Element`] — the bridge between a [`DType`] and its native Rust type.
//! - [`Tensor`] — an owned, row-major byte buffer tagged with shape and dtype.
//! - Reference kernels: element-wise binary/unary arithmetic and `matmul`.
//!
//! # Design Goals
//! - One storage representation (bytes) for every dtype.
//! - Typed access through `bytemuck`, never through pointer casts.
//! - Clean error types via `thiserror`.

#[macro_use]
mod dtype;
mod element;
mod error;
mod ops;
mod shape;
mod tensor;

pub use dtype::DType;
pub use element::Element;
pub use error::TensorError;
pub use ops::{binary, matmul, unary, BinaryOp, UnaryOp};
pub use shape::Shape;
pub use tensor::{parse_values_into, Tensor, TensorView};
