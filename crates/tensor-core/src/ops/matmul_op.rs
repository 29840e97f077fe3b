// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Matrix multiplication operation.

use crate::{Element, Shape, TensorError, TensorView};

/// Performs matrix multiplication: `out = lhs @ rhs`.
///
/// Both inputs must be 2-D tensors of the same dtype with compatible inner
/// dimensions: `lhs` is `[M, K]`, `rhs` is `[K, N]`. Returns the `[M, N]`
/// result shape after writing `M * N` elements into `out`.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if dimensions are incompatible or
/// `out` has the wrong length.
pub fn matmul(
    lhs: &TensorView<'_>,
    rhs: &TensorView<'_>,
    out: &mut [u8],
) -> Result<Shape, TensorError> {
    if lhs.dtype() != rhs.dtype() {
        return Err(TensorError::DTypeMismatch {
            op: "matmul",
            lhs: lhs.dtype(),
            rhs: rhs.dtype(),
        });
    }

    if !lhs.shape().is_matmul_compatible(rhs.shape()) {
        return Err(TensorError::ShapeMismatch {
            op: "matmul",
            lhs: lhs.shape().clone(),
            rhs: rhs.shape().clone(),
        });
    }

    let m = lhs.shape().dims()[0];
    let k = lhs.shape().dims()[1];
    let n = rhs.shape().dims()[1];

    let out_shape = Shape::matrix(m, n);
    let expected = out_shape.size_bytes(lhs.dtype());
    if out.len() != expected {
        return Err(TensorError::BufferSizeMismatch {
            expected,
            actual: out.len(),
        });
    }

    dispatch_dtype!(lhs.dtype(), T => {
        let a = lhs.to_vec::<T>()?;
        let b = rhs.to_vec::<T>()?;
        let c = matmul_generic(&a, &b, m, k, n);
        out.copy_from_slice(bytemuck::cast_slice(&c));
    });

    Ok(out_shape)
}

/// Portable matrix multiplication.
///
/// Uses an ikj loop order so the inner loop walks a row of `b` and a row
/// of `c` sequentially.
fn matmul_generic<T: Element>(a: &[T], b: &[T], m: usize, k: usize, n: usize) -> Vec<T> {
    let mut c = vec![T::zero(); m * n];
    for i in 0..m {
        for p in 0..k {
            let a_ip = a[i * k + p];
            let c_row = &mut c[i * n..(i + 1) * n];
            let b_row = &b[p * n..(p + 1) * n];
            for j in 0..n {
                c_row[j] = c_row[j].add(a_ip.mul(b_row[j]));
            }
        }
    }
    c
}
