// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise binary and unary arithmetic.

use crate::{Element, TensorError, TensorView};

/// Binary element-wise operations. Both operands must share shape and dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Max,
    Min,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Max => "max",
            BinaryOp::Min => "min",
        }
    }
}

/// Unary element-wise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Abs,
    Neg,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Abs => "abs",
            UnaryOp::Neg => "neg",
        }
    }
}

/// Computes `out[i] = lhs[i] <op> rhs[i]`.
///
/// `out` must be exactly as long as either operand's byte storage.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] or [`TensorError::DTypeMismatch`]
/// if the operands disagree, [`TensorError::Numeric`] on integer division
/// by zero.
pub fn binary(
    op: BinaryOp,
    lhs: &TensorView<'_>,
    rhs: &TensorView<'_>,
    out: &mut [u8],
) -> Result<(), TensorError> {
    if lhs.dtype() != rhs.dtype() {
        return Err(TensorError::DTypeMismatch {
            op: op.as_str(),
            lhs: lhs.dtype(),
            rhs: rhs.dtype(),
        });
    }
    if lhs.shape() != rhs.shape() {
        return Err(TensorError::ShapeMismatch {
            op: op.as_str(),
            lhs: lhs.shape().clone(),
            rhs: rhs.shape().clone(),
        });
    }
    check_output_len(lhs, out)?;

    dispatch_dtype!(lhs.dtype(), T => {
        let a = lhs.to_vec::<T>()?;
        let b = rhs.to_vec::<T>()?;
        let result = binary_generic(op, &a, &b)?;
        out.copy_from_slice(bytemuck::cast_slice(&result));
    });
    Ok(())
}

/// Computes `out[i] = <op>(input[i])`.
pub fn unary(op: UnaryOp, input: &TensorView<'_>, out: &mut [u8]) -> Result<(), TensorError> {
    check_output_len(input, out)?;

    dispatch_dtype!(input.dtype(), T => {
        let a = input.to_vec::<T>()?;
        let result: Vec<T> = match op {
            UnaryOp::Abs => a.into_iter().map(Element::abs).collect(),
            UnaryOp::Neg => a.into_iter().map(Element::neg).collect(),
        };
        out.copy_from_slice(bytemuck::cast_slice(&result));
    });
    Ok(())
}

fn check_output_len(input: &TensorView<'_>, out: &[u8]) -> Result<(), TensorError> {
    if out.len() != input.as_bytes().len() {
        return Err(TensorError::BufferSizeMismatch {
            expected: input.as_bytes().len(),
            actual: out.len(),
        });
    }
    Ok(())
}

fn binary_generic<T: Element>(op: BinaryOp, a: &[T], b: &[T]) -> Result<Vec<T>, TensorError> {
    let pairs = a.iter().copied().zip(b.iter().copied());
    let out: Vec<T> = match op {
        BinaryOp::Add => pairs.map(|(x, y)| x.add(y)).collect(),
        BinaryOp::Sub => pairs.map(|(x, y)| x.sub(y)).collect(),
        BinaryOp::Mul => pairs.map(|(x, y)| x.mul(y)).collect(),
        BinaryOp::Max => pairs.map(|(x, y)| Element::max(x, y)).collect(),
        BinaryOp::Min => pairs.map(|(x, y)| Element::min(x, y)).collect(),
        BinaryOp::Div => pairs
            .map(|(x, y)| {
                x.checked_div(y).ok_or_else(|| TensorError::Numeric {
                    op: "div",
                    detail: format!("integer division {x} / {y}"),
                })
            })
            .collect::<Result<Vec<T>, _>>()?,
    };
    Ok(out)
}
