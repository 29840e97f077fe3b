// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Synchronous executor: runs every kernel on the calling thread.

use super::Executor;
use tensor_core::{BinaryOp, Shape, TensorError, TensorView, UnaryOp};

/// Executor backing the `vmla` driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn concurrency(&self) -> usize {
        1
    }

    fn binary(
        &self,
        op: BinaryOp,
        lhs: &TensorView<'_>,
        rhs: &TensorView<'_>,
        out: &mut [u8],
    ) -> Result<(), TensorError> {
        tensor_core::binary(op, lhs, rhs, out)
    }

    fn unary(&self, op: UnaryOp, input: &TensorView<'_>, out: &mut [u8]) -> Result<(), TensorError> {
        tensor_core::unary(op, input, out)
    }

    fn matmul(
        &self,
        lhs: &TensorView<'_>,
        rhs: &TensorView<'_>,
        out: &mut [u8],
    ) -> Result<Shape, TensorError> {
        tensor_core::matmul(lhs, rhs, out)
    }
}
