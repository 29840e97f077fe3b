// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Native element types and the arithmetic the reference kernels need.

use crate::DType;
use std::fmt;
use std::str::FromStr;

/// A native Rust type that backs one [`DType`].
///
/// Integer arithmetic wraps on overflow; integer division by zero is
/// reported as `None` by [`Element::checked_div`].
pub trait Element:
    bytemuck::Pod + FromStr + fmt::Display + PartialOrd + Send + Sync + 'static
{
    /// The dtype tag for this type.
    const DTYPE: DType;

    fn zero() -> Self;
    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn checked_div(self, rhs: Self) -> Option<Self>;
    fn abs(self) -> Self;
    fn neg(self) -> Self;

    fn max(self, rhs: Self) -> Self {
        if rhs > self {
            rhs
        } else {
            self
        }
    }

    fn min(self, rhs: Self) -> Self {
        if rhs < self {
            rhs
        } else {
            self
        }
    }
}

macro_rules! impl_signed {
    ($($t:ty => $d:ident),*) => {$(
        impl Element for $t {
            const DTYPE: DType = DType::$d;
            fn zero() -> Self { 0 }
            fn add(self, rhs: Self) -> Self { self.wrapping_add(rhs) }
            fn sub(self, rhs: Self) -> Self { self.wrapping_sub(rhs) }
            fn mul(self, rhs: Self) -> Self { self.wrapping_mul(rhs) }
            fn checked_div(self, rhs: Self) -> Option<Self> { <$t>::checked_div(self, rhs) }
            fn abs(self) -> Self { self.wrapping_abs() }
            fn neg(self) -> Self { self.wrapping_neg() }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($t:ty => $d:ident),*) => {$(
        impl Element for $t {
            const DTYPE: DType = DType::$d;
            fn zero() -> Self { 0 }
            fn add(self, rhs: Self) -> Self { self.wrapping_add(rhs) }
            fn sub(self, rhs: Self) -> Self { self.wrapping_sub(rhs) }
            fn mul(self, rhs: Self) -> Self { self.wrapping_mul(rhs) }
            fn checked_div(self, rhs: Self) -> Option<Self> { <$t>::checked_div(self, rhs) }
            fn abs(self) -> Self { self }
            fn neg(self) -> Self { self.wrapping_neg() }
        }
    )*};
}

macro_rules! impl_float {
    ($($t:ty => $d:ident),*) => {$(
        impl Element for $t {
            const DTYPE: DType = DType::$d;
            fn zero() -> Self { 0.0 }
            fn add(self, rhs: Self) -> Self { self + rhs }
            fn sub(self, rhs: Self) -> Self { self - rhs }
            fn mul(self, rhs: Self) -> Self { self * rhs }
            fn checked_div(self, rhs: Self) -> Option<Self> { Some(self / rhs) }
            fn abs(self) -> Self { <$t>::abs(self) }
            fn neg(self) -> Self { -self }
        }
    )*};
}

impl_signed!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);
impl_unsigned!(u8 => U8, u32 => U32);
impl_float!(f32 => F32, f64 => F64);
