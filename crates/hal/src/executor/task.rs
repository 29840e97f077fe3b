// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Multi-threaded executor backed by a dedicated rayon pool.
//!
//! Element-wise kernels are split into contiguous element ranges and
//! matmul into contiguous row ranges; each range is handed to the
//! reference kernel in `tensor-core`. Results are bit-identical to the
//! inline executor because every output element is computed by the same
//! scalar code, only on a different thread.
//!
//! Operands that fail validation (mismatched dtype or shape, wrong output
//! length) take the serial path so the reference kernel reports the error.

use super::Executor;
use rayon::prelude::*;
use tensor_core::{BinaryOp, Shape, TensorError, TensorView, UnaryOp};

/// Workloads at or below this many elements run on the calling thread.
const SERIAL_THRESHOLD: usize = 4096;

/// Executor backing the `local-task` driver.
pub struct TaskExecutor {
    pool: rayon::ThreadPool,
}

impl TaskExecutor {
    /// Builds a pool with `threads` workers (`0` picks the rayon default).
    pub fn new(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("local-task-{i}"))
            .build()?;
        tracing::debug!(threads = pool.current_num_threads(), "local-task pool ready");
        Ok(Self { pool })
    }

    /// Elements per parallel chunk: 4 chunks per worker.
    fn chunk_elements(&self, total: usize) -> usize {
        let chunks = self.pool.current_num_threads().max(1) * 4;
        total.div_ceil(chunks).max(1)
    }
}

impl Executor for TaskExecutor {
    fn name(&self) -> &'static str {
        "task"
    }

    fn concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn binary(
        &self,
        op: BinaryOp,
        lhs: &TensorView<'_>,
        rhs: &TensorView<'_>,
        out: &mut [u8],
    ) -> Result<(), TensorError> {
        let n = lhs.shape().num_elements();
        let well_formed = lhs.dtype() == rhs.dtype()
            && lhs.shape() == rhs.shape()
            && out.len() == lhs.as_bytes().len();
        if !well_formed || n <= SERIAL_THRESHOLD {
            return tensor_core::binary(op, lhs, rhs, out);
        }

        let dtype = lhs.dtype();
        let chunk_bytes = self.chunk_elements(n) * dtype.size_bytes();
        let (a, b) = (lhs.as_bytes(), rhs.as_bytes());
        self.pool.install(|| {
            out.par_chunks_mut(chunk_bytes)
                .enumerate()
                .try_for_each(|(i, out_chunk)| {
                    let range = i * chunk_bytes..i * chunk_bytes + out_chunk.len();
                    let shape = Shape::vector(out_chunk.len() / dtype.size_bytes());
                    let l = TensorView::from_parts(&shape, dtype, &a[range.clone()])?;
                    let r = TensorView::from_parts(&shape, dtype, &b[range])?;
                    tensor_core::binary(op, &l, &r, out_chunk)
                })
        })
    }

    fn unary(&self, op: UnaryOp, input: &TensorView<'_>, out: &mut [u8]) -> Result<(), TensorError> {
        let n = input.shape().num_elements();
        if out.len() != input.as_bytes().len() || n <= SERIAL_THRESHOLD {
            return tensor_core::unary(op, input, out);
        }

        let dtype = input.dtype();
        let chunk_bytes = self.chunk_elements(n) * dtype.size_bytes();
        let a = input.as_bytes();
        self.pool.install(|| {
            out.par_chunks_mut(chunk_bytes)
                .enumerate()
                .try_for_each(|(i, out_chunk)| {
                    let start = i * chunk_bytes;
                    let shape = Shape::vector(out_chunk.len() / dtype.size_bytes());
                    let view =
                        TensorView::from_parts(&shape, dtype, &a[start..start + out_chunk.len()])?;
                    tensor_core::unary(op, &view, out_chunk)
                })
        })
    }

    fn matmul(
        &self,
        lhs: &TensorView<'_>,
        rhs: &TensorView<'_>,
        out: &mut [u8],
    ) -> Result<Shape, TensorError> {
        if lhs.dtype() != rhs.dtype() || !lhs.shape().is_matmul_compatible(rhs.shape()) {
            return tensor_core::matmul(lhs, rhs, out);
        }
        let (m, k, n) = (lhs.shape().dims()[0], lhs.shape().dims()[1], rhs.shape().dims()[1]);
        let dtype = lhs.dtype();
        let out_shape = Shape::matrix(m, n);
        if out.len() != out_shape.size_bytes(dtype) || m * n <= SERIAL_THRESHOLD || n == 0 {
            return tensor_core::matmul(lhs, rhs, out);
        }

        let rows_per_chunk = self.chunk_elements(m);
        let out_row_bytes = n * dtype.size_bytes();
        let lhs_row_bytes = k * dtype.size_bytes();
        let a = lhs.as_bytes();
        self.pool.install(|| {
            out.par_chunks_mut(rows_per_chunk * out_row_bytes)
                .enumerate()
                .try_for_each(|(i, out_chunk)| {
                    let first_row = i * rows_per_chunk;
                    let rows = out_chunk.len() / out_row_bytes;
                    let shape = Shape::matrix(rows, k);
                    let rows_bytes =
                        &a[first_row * lhs_row_bytes..(first_row + rows) * lhs_row_bytes];
                    let block = TensorView::from_parts(&shape, dtype, rows_bytes)?;
                    tensor_core::matmul(&block, rhs, out_chunk).map(|_| ())
                })
        })?;
        Ok(out_shape)
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}
