// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution device.

use crate::{Allocator, BufferView, Executor, HalError};
use tensor_core::{BinaryOp, Shape, TensorError, UnaryOp};

/// A named execution target: the allocator all its buffers come from and
/// the executor that runs its kernels.
///
/// Every kernel entry point allocates a fresh output buffer view from the
/// device allocator; inputs are never written.
pub struct Device {
    driver: String,
    allocator: Allocator,
    executor: Box<dyn Executor>,
}

impl Device {
    pub fn new(driver: impl Into<String>, allocator: Allocator, executor: Box<dyn Executor>) -> Self {
        Self {
            driver: driver.into(),
            allocator,
            executor,
        }
    }

    /// Name of the driver that created this device.
    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    pub fn binary(
        &self,
        op: BinaryOp,
        lhs: &BufferView,
        rhs: &BufferView,
    ) -> Result<BufferView, HalError> {
        let mut out = self.allocator.allocate_buffer(lhs.size_bytes())?;
        self.executor
            .binary(op, &lhs.view()?, &rhs.view()?, out.as_mut_slice())?;
        BufferView::new(out, lhs.shape().clone(), lhs.dtype())
    }

    pub fn unary(&self, op: UnaryOp, input: &BufferView) -> Result<BufferView, HalError> {
        let mut out = self.allocator.allocate_buffer(input.size_bytes())?;
        self.executor.unary(op, &input.view()?, out.as_mut_slice())?;
        BufferView::new(out, input.shape().clone(), input.dtype())
    }

    pub fn matmul(&self, lhs: &BufferView, rhs: &BufferView) -> Result<BufferView, HalError> {
        if !lhs.shape().is_matmul_compatible(rhs.shape()) {
            return Err(TensorError::ShapeMismatch {
                op: "matmul",
                lhs: lhs.shape().clone(),
                rhs: rhs.shape().clone(),
            }
            .into());
        }
        let out_shape = Shape::matrix(lhs.shape().dims()[0], rhs.shape().dims()[1]);
        let mut out = self
            .allocator
            .allocate_buffer(out_shape.size_bytes(lhs.dtype()))?;
        let shape = self
            .executor
            .matmul(&lhs.view()?, &rhs.view()?, out.as_mut_slice())?;
        BufferView::new(out, shape, lhs.dtype())
    }

    /// Copies `input` into a new buffer view.
    pub fn copy(&self, input: &BufferView) -> Result<BufferView, HalError> {
        let mut out = self.allocator.allocate_buffer(input.size_bytes())?;
        out.as_mut_slice().copy_from_slice(input.as_bytes());
        BufferView::new(out, input.shape().clone(), input.dtype())
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("driver", &self.driver)
            .field("executor", &self.executor.name())
            .field("allocator", &self.allocator)
            .finish()
    }
}
