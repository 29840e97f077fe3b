// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Kernel executors.
//!
//! An [`Executor`] is the part of a device that actually runs kernels. The
//! device owns allocation; the executor only ever writes into an output
//! slice it is handed, so both implementations share the same contract as
//! the reference kernels in `tensor-core`.

mod inline;
mod task;

pub use inline::InlineExecutor;
pub use task::TaskExecutor;

use tensor_core::{BinaryOp, Shape, TensorError, TensorView, UnaryOp};

/// Runs kernels for a [`Device`](crate::Device).
pub trait Executor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Number of worker threads this executor may use.
    fn concurrency(&self) -> usize;

    fn binary(
        &self,
        op: BinaryOp,
        lhs: &TensorView<'_>,
        rhs: &TensorView<'_>,
        out: &mut [u8],
    ) -> Result<(), TensorError>;

    fn unary(&self, op: UnaryOp, input: &TensorView<'_>, out: &mut [u8]) -> Result<(), TensorError>;

    /// Writes `lhs @ rhs` into `out` and returns the result shape.
    fn matmul(
        &self,
        lhs: &TensorView<'_>,
        rhs: &TensorView<'_>,
        out: &mut [u8],
    ) -> Result<Shape, TensorError>;
}
