// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! VM values and variant lists.

use crate::{Ref, RefType, VmError};
use std::fmt;

/// A single VM value: a primitive or a ref to a native object.
#[derive(Debug, Clone)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Ref(Ref),
}

impl Value {
    /// Type name used in diagnostics (`"i32"`, `"hal.buffer_view"`, …).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Ref(r) => r.ref_type().name(),
        }
    }

    pub fn as_ref_value(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32={v}"),
            Value::I64(v) => write!(f, "i64={v}"),
            Value::F32(v) => write!(f, "f32={v}"),
            Value::F64(v) => write!(f, "f64={v}"),
            Value::Ref(r) => write!(f, "{r:?}"),
        }
    }
}

/// An ordered list of values, optionally restricted to one ref type.
///
/// Used for function arguments and results. The capacity is a sizing hint;
/// the list grows past it if needed.
#[derive(Debug, Clone, Default)]
pub struct VariantList {
    values: Vec<Value>,
    element_type: Option<RefType>,
}

impl VariantList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            element_type: None,
        }
    }

    /// A list that only accepts refs of type `element_type`.
    pub fn of_type(element_type: RefType, capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            element_type: Some(element_type),
        }
    }

    pub fn element_type(&self) -> Option<RefType> {
        self.element_type
    }

    /// Appends `value`.
    ///
    /// # Errors
    /// [`VmError::TypeMismatch`] if the list is typed and `value` is not a
    /// ref of that type.
    pub fn push(&mut self, value: Value) -> Result<(), VmError> {
        if let Some(expected) = self.element_type {
            let matches = matches!(&value, Value::Ref(r) if r.ref_type() == expected);
            if !matches {
                return Err(VmError::TypeMismatch {
                    expected: expected.name().to_string(),
                    actual: value.type_name().to_string(),
                });
            }
        }
        self.values.push(value);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

impl<'a> IntoIterator for &'a VariantList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
