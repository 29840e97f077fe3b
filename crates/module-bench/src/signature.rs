// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Function signatures and calling-convention checks.
//!
//! Exported functions describe themselves through reflection attributes:
//!
//! | key       | example             | meaning                         |
//! |-----------|---------------------|---------------------------------|
//! | `fv`      | `1`                 | calling-convention version      |
//! | `inputs`  | `2x2xi32;2x2xi32`   | `;`-separated input descriptors |
//! | `outputs` | `2x2xi32`           | `;`-separated output descriptors|
//!
//! A descriptor is `<dims>x<type>`, or just `<type>` for a scalar.

use crate::BenchmarkError;
use std::fmt;
use std::str::FromStr;
use tensor_core::{DType, Shape};
use vm::Function;

/// Reflection key holding the calling-convention version.
pub const ABI_VERSION_ATTR: &str = "fv";
/// The only calling-convention version this harness can drive.
pub const SUPPORTED_ABI_VERSION: &str = "1";
pub const INPUTS_ATTR: &str = "inputs";
pub const OUTPUTS_ATTR: &str = "outputs";

const SIGNATURE_SEPARATOR: char = ';';

/// Shape and element type of one function argument or result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Descriptor {
    pub shape: Shape,
    pub dtype: DType,
}

impl Descriptor {
    pub fn new(shape: Shape, dtype: DType) -> Self {
        Self { shape, dtype }
    }

    pub fn scalar(dtype: DType) -> Self {
        Self::new(Shape::scalar(), dtype)
    }

    /// Element count, or `None` if it does not fit in `usize`.
    pub fn num_elements(&self) -> Option<usize> {
        self.shape.checked_num_elements()
    }

    /// Byte size, or `None` if it does not fit in `usize`.
    pub fn size_bytes(&self) -> Option<usize> {
        self.shape.checked_size_bytes(self.dtype)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.rank() == 0 {
            write!(f, "{}", self.dtype.as_str())
        } else {
            write!(f, "{}x{}", self.shape.to_dims_string(), self.dtype.as_str())
        }
    }
}

impl FromStr for Descriptor {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_descriptor(s)
    }
}

/// Parses `"2x2xi32"` or `"f32"`.
///
/// # Examples
/// ```
/// use module_bench::signature::parse_descriptor;
/// use tensor_core::{DType, Shape};
///
/// let d = parse_descriptor("2x3xf32").unwrap();
/// assert_eq!(d.shape, Shape::matrix(2, 3));
/// assert_eq!(d.dtype, DType::F32);
/// assert_eq!(parse_descriptor("i64").unwrap().shape.rank(), 0);
/// ```
pub fn parse_descriptor(text: &str) -> Result<Descriptor, BenchmarkError> {
    let text = text.trim();
    let invalid = |detail: &str| {
        BenchmarkError::InvalidArgument(format!("invalid descriptor '{text}': {detail}"))
    };
    if text.is_empty() {
        return Err(invalid("empty"));
    }
    let (dims, ty) = match text.rsplit_once('x') {
        Some((dims, _)) if dims.trim().is_empty() => return Err(invalid("missing dimensions")),
        Some((dims, ty)) => (Some(dims), ty),
        None => (None, text),
    };
    let dtype = DType::parse(ty).ok_or_else(|| invalid(&format!("unknown element type '{ty}'")))?;
    let shape = match dims {
        Some(dims) => Shape::parse(dims).map_err(|e| invalid(&e.to_string()))?,
        None => Shape::scalar(),
    };
    Ok(Descriptor::new(shape, dtype))
}

/// Parses a `;`-separated descriptor list. Blank text is an empty list.
pub fn parse_signature(text: &str) -> Result<Vec<Descriptor>, BenchmarkError> {
    text.split(SIGNATURE_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_descriptor)
        .collect()
}

/// Checks that `function` uses the calling convention this harness drives.
///
/// # Errors
/// - [`BenchmarkError::InvalidArgument`] if the function carries no `fv`
///   reflection attribute.
/// - [`BenchmarkError::Unimplemented`] for any version other than `"1"`.
pub fn validate_function_abi(function: &Function) -> Result<(), BenchmarkError> {
    match function.reflection_attr(ABI_VERSION_ATTR) {
        None => Err(BenchmarkError::InvalidArgument(format!(
            "function '{}' has no ABI version reflection ('{ABI_VERSION_ATTR}')",
            function.qualified_name()
        ))),
        Some(SUPPORTED_ABI_VERSION) => Ok(()),
        Some(version) => Err(BenchmarkError::Unimplemented(format!(
            "function '{}' uses ABI version '{version}'; only '{SUPPORTED_ABI_VERSION}' is supported",
            function.qualified_name()
        ))),
    }
}

pub fn parse_input_signature(function: &Function) -> Result<Vec<Descriptor>, BenchmarkError> {
    signature_attr(function, INPUTS_ATTR)
}

pub fn parse_output_signature(function: &Function) -> Result<Vec<Descriptor>, BenchmarkError> {
    signature_attr(function, OUTPUTS_ATTR)
}

fn signature_attr(function: &Function, key: &str) -> Result<Vec<Descriptor>, BenchmarkError> {
    let text = function.reflection_attr(key).unwrap_or_default();
    parse_signature(text).map_err(|e| {
        BenchmarkError::InvalidArgument(format!(
            "{key} signature of '{}': {e}",
            function.qualified_name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusCode;
    use std::sync::Arc;
    use vm::{BytecodeModule, Linkage, Module};

    fn function(reflection: &str) -> Function {
        let doc = format!(
            r#"{{
                "name": "sig",
                "functions": [{{
                    "name": "f", "export": true, "reflection": {reflection},
                    "num_registers": 1, "num_args": 1,
                    "body": [{{"op": "return", "values": [0]}}]
                }}]
            }}"#
        );
        let module: Arc<dyn Module> = Arc::new(BytecodeModule::from_bytes(doc.as_bytes()).unwrap());
        Function::lookup(&module, Linkage::Export, "f").unwrap()
    }

    #[test]
    fn test_parse_descriptor() {
        let d = parse_descriptor(" 2x2xi32 ").unwrap();
        assert_eq!(d, Descriptor::new(Shape::matrix(2, 2), DType::I32));
        assert_eq!(d.to_string(), "2x2xi32");
        assert_eq!(d.size_bytes(), Some(16));

        let s = parse_descriptor("f64").unwrap();
        assert_eq!(s, Descriptor::scalar(DType::F64));
        assert_eq!(s.to_string(), "f64");
        assert_eq!(s.num_elements(), Some(1));
        assert_eq!(parse_descriptor("4294967296x4294967296x2xi32").unwrap().size_bytes(), None);
    }

    #[test]
    fn test_parse_descriptor_errors() {
        for bad in ["", "xi32", "2x2xq7", "2xbx i32", "2x2"] {
            let err = parse_descriptor(bad).unwrap_err();
            assert_eq!(err.code(), StatusCode::InvalidArgument, "{bad}");
        }
    }

    #[test]
    fn test_parse_signature() {
        let sig = parse_signature("2x2xi32; 4xf32 ;i64").unwrap();
        assert_eq!(sig.len(), 3);
        assert_eq!(sig[1], Descriptor::new(Shape::vector(4), DType::F32));
        assert!(parse_signature("").unwrap().is_empty());
        assert!(parse_signature(" ; ").unwrap().is_empty());
    }

    #[test]
    fn test_abi_version() {
        assert!(validate_function_abi(&function(r#"{"fv": "1"}"#)).is_ok());

        let missing = validate_function_abi(&function("{}")).unwrap_err();
        assert_eq!(missing.code(), StatusCode::InvalidArgument);

        let newer = validate_function_abi(&function(r#"{"fv": "2"}"#)).unwrap_err();
        assert_eq!(newer.code(), StatusCode::Unimplemented);
        assert!(newer.to_string().contains("'2'"));
    }

    #[test]
    fn test_function_signatures() {
        let f = function(r#"{"fv": "1", "inputs": "3xf32", "outputs": "3xf32;i32"}"#);
        assert_eq!(parse_input_signature(&f).unwrap().len(), 1);
        let outputs = parse_output_signature(&f).unwrap();
        assert_eq!(outputs[1], Descriptor::scalar(DType::I32));

        let none = function(r#"{"fv": "1"}"#);
        assert!(parse_input_signature(&none).unwrap().is_empty());

        let bad = function(r#"{"fv": "1", "inputs": "2x?"}"#);
        let err = parse_input_signature(&bad).unwrap_err();
        assert!(err.to_string().contains("inputs signature of 'sig.f'"));
    }
}
