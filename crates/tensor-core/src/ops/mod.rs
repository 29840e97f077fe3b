// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference tensor kernels.
//!
//! Each operation writes into a pre-allocated output byte buffer so that
//! callers (the HAL executors) decide where result memory comes from.

mod elementwise_op;
mod matmul_op;

pub use elementwise_op::{binary, unary, BinaryOp, UnaryOp};
pub use matmul_op::matmul;
