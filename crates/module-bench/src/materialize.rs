// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Turns textual tensor entries into device buffers.
//!
//! # Entry grammar
//! ```text
//! 2x2xi32=1 2 3 4          shaped, explicit values (row-major)
//! 2x2xi32=[[1 2][3 4]]     brackets are stripped and carry no meaning
//! 4xf32=0.5                a single value fills every element
//! 2x3xf32                  no values: zero-filled
//! i32=7                    scalar
//! ```
//!
//! Inline entries arrive already split on `,`. An inputs file holds one
//! entry per line; blank lines and lines starting with `#` are skipped.

use crate::signature::{parse_descriptor, Descriptor};
use crate::BenchmarkError;
use hal::{Allocator, BufferView};
use std::path::Path;
use tensor_core::TensorError;
use vm::VariantList;

/// Where input entries come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource<'a> {
    Inline(&'a [String]),
    File(&'a Path),
}

impl<'a> InputSource<'a> {
    /// Picks the single configured source.
    ///
    /// Both sources set is always an error. Neither set is an error only
    /// when the function takes inputs; otherwise `None` is returned.
    pub fn select(
        inline: &'a [String],
        file: Option<&'a Path>,
        num_inputs: usize,
    ) -> Result<Option<Self>, BenchmarkError> {
        let has_inline = inline.iter().any(|e| !e.trim().is_empty());
        match (has_inline, file) {
            (true, Some(_)) => Err(BenchmarkError::InvalidArgument(
                "expected only one of inputs and inputs_file to be set".into(),
            )),
            (true, None) => Ok(Some(InputSource::Inline(inline))),
            (false, Some(path)) => Ok(Some(InputSource::File(path))),
            (false, None) if num_inputs > 0 => Err(BenchmarkError::InvalidArgument(format!(
                "function takes {num_inputs} input(s) but neither inputs nor inputs_file is set"
            ))),
            (false, None) => Ok(None),
        }
    }

    /// Reads and parses every entry of this source.
    pub fn entries(&self) -> Result<Vec<InputEntry>, BenchmarkError> {
        match self {
            InputSource::Inline(entries) => entries
                .iter()
                .map(|e| e.trim())
                .filter(|e| !e.is_empty())
                .map(parse_entry)
                .collect(),
            InputSource::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    BenchmarkError::InvalidArgument(format!(
                        "cannot read inputs file '{}': {e}",
                        path.display()
                    ))
                })?;
                parse_entries_file(&text)
            }
        }
    }
}

/// One parsed entry. `values` is `None` when the entry had no `=` part.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEntry {
    pub descriptor: Descriptor,
    pub values: Option<Vec<String>>,
}

impl InputEntry {
    /// Writes this entry's elements into `out`, which must be exactly the
    /// descriptor's byte size. Entries without values zero `out`.
    pub fn fill(&self, out: &mut [u8]) -> Result<(), TensorError> {
        match &self.values {
            Some(values) if !values.is_empty() => {
                let tokens: Vec<&str> = values.iter().map(String::as_str).collect();
                let Descriptor { shape, dtype } = &self.descriptor;
                tensor_core::parse_values_into(shape, *dtype, &tokens, out)
            }
            _ => {
                out.fill(0);
                Ok(())
            }
        }
    }
}

/// Parses one `<descriptor>[=<values>]` entry.
pub fn parse_entry(text: &str) -> Result<InputEntry, BenchmarkError> {
    let (head, values) = match text.split_once('=') {
        Some((head, values)) => (head, Some(values)),
        None => (text, None),
    };
    let descriptor = parse_descriptor(head)?;
    let values = values.map(|v| {
        v.replace(['[', ']'], " ")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    });
    Ok(InputEntry { descriptor, values })
}

/// Parses the contents of an inputs file.
pub fn parse_entries_file(text: &str) -> Result<Vec<InputEntry>, BenchmarkError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_entry)
        .collect()
}

/// Allocates one buffer view per descriptor and fills it from `entries`.
///
/// Every entry must match its descriptor exactly; no shape or type
/// coercion is attempted. Each device buffer is reserved against the
/// allocator's budget before any value is parsed into it, so an oversized
/// entry fails with `ResourceExhausted` without a host-side copy.
pub fn materialize(
    descriptors: &[Descriptor],
    entries: &[InputEntry],
    allocator: &Allocator,
) -> Result<VariantList, BenchmarkError> {
    if entries.len() != descriptors.len() {
        return Err(BenchmarkError::InvalidArgument(format!(
            "function expects {} input(s) but {} were provided",
            descriptors.len(),
            entries.len()
        )));
    }
    let element_type = hal_module::register_hal_types()?;
    let mut list = VariantList::of_type(element_type, descriptors.len());
    for (index, (expected, entry)) in descriptors.iter().zip(entries).enumerate() {
        if &entry.descriptor != expected {
            return Err(BenchmarkError::InvalidArgument(format!(
                "input {index}: expected {expected}, got {}",
                entry.descriptor
            )));
        }
        let size = expected.size_bytes().ok_or_else(|| {
            BenchmarkError::InvalidArgument(format!(
                "input {index} ({expected}) is too large to address"
            ))
        })?;
        let mut buffer = allocator.allocate_buffer(size)?;
        entry.fill(buffer.as_mut_slice()).map_err(|e| {
            BenchmarkError::InvalidArgument(format!("input {index} ({expected}): {e}"))
        })?;
        let view = BufferView::new(buffer, expected.shape.clone(), expected.dtype)?;
        list.push(hal_module::buffer_view_value(view)?)?;
    }
    tracing::debug!(count = list.len(), "inputs materialized");
    Ok(list)
}

/// Selects the configured source, parses it and materializes the inputs.
pub fn materialize_inputs(
    descriptors: &[Descriptor],
    inline: &[String],
    inputs_file: Option<&Path>,
    allocator: &Allocator,
) -> Result<VariantList, BenchmarkError> {
    let entries = match InputSource::select(inline, inputs_file, descriptors.len())? {
        Some(source) => source.entries()?,
        None => Vec::new(),
    };
    materialize(descriptors, &entries, allocator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusCode;
    use hal::MemoryBudget;
    use hal_module::as_buffer_view;
    use tensor_core::{DType, Shape};

    fn allocator() -> Allocator {
        Allocator::new(MemoryBudget::unlimited())
    }

    fn descs(text: &str) -> Vec<Descriptor> {
        crate::signature::parse_signature(text).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_entry_forms() {
        let e = parse_entry("2x2xi32=[[1 2][3 4]]").unwrap();
        assert_eq!(e.descriptor, Descriptor::new(Shape::matrix(2, 2), DType::I32));
        assert_eq!(e.values, Some(strings(&["1", "2", "3", "4"])));

        let z = parse_entry("3xf32").unwrap();
        assert_eq!(z.values, None);

        let s = parse_entry("i64=-9").unwrap();
        assert_eq!(s.descriptor, Descriptor::scalar(DType::I64));
    }

    #[test]
    fn test_materialize_inline_row_major() {
        let list = materialize_inputs(
            &descs("2x2xi32;2x2xi32"),
            &strings(&["2x2xi32=1 2 3 4", " 2x2xi32=5 6 7 8"]),
            None,
            &allocator(),
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        let a = as_buffer_view(list.get(0).unwrap()).unwrap();
        let b = as_buffer_view(list.get(1).unwrap()).unwrap();
        assert_eq!(a.to_vec::<i32>().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(b.to_vec::<i32>().unwrap(), vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_splat_and_zero_fill() {
        let list = materialize_inputs(
            &descs("4xf32;2x3xi8"),
            &strings(&["4xf32=0.5", "2x3xi8"]),
            None,
            &allocator(),
        )
        .unwrap();
        let splat = as_buffer_view(list.get(0).unwrap()).unwrap();
        assert_eq!(splat.to_vec::<f32>().unwrap(), vec![0.5; 4]);
        let zeros = as_buffer_view(list.get(1).unwrap()).unwrap();
        assert_eq!(zeros.to_vec::<i8>().unwrap(), vec![0; 6]);
    }

    #[test]
    fn test_both_sources_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.txt");
        std::fs::write(&path, "i32=1\n").unwrap();

        for descriptors in [descs("i32"), Vec::new()] {
            let err = materialize_inputs(
                &descriptors,
                &strings(&["i32=1"]),
                Some(&path),
                &allocator(),
            )
            .unwrap_err();
            assert_eq!(err.code(), StatusCode::InvalidArgument);
        }
    }

    #[test]
    fn test_no_source() {
        let err = materialize_inputs(&descs("i32"), &[], None, &allocator()).unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);

        let empty = materialize_inputs(&[], &strings(&[""]), None, &allocator()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.txt");
        std::fs::write(
            &path,
            "# lhs\n2xi32=[1 2]\n\n   # rhs\n2xi32=3 4\n",
        )
        .unwrap();
        let list = materialize_inputs(&descs("2xi32;2xi32"), &[], Some(&path), &allocator()).unwrap();
        let rhs = as_buffer_view(list.get(1).unwrap()).unwrap();
        assert_eq!(rhs.to_vec::<i32>().unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_mismatches_are_hard_failures() {
        let cases: [(&str, &[&str]); 4] = [
            ("2x2xi32", &["2x2xf32=1 2 3 4"]),
            ("2x2xi32", &["4xi32=1 2 3 4"]),
            ("2x2xi32", &["2x2xi32=1 2 3"]),
            ("2x2xi32;i32", &["2x2xi32=1 2 3 4"]),
        ];
        for (sig, entries) in cases {
            let err = materialize_inputs(&descs(sig), &strings(entries), None, &allocator())
                .unwrap_err();
            assert_eq!(err.code(), StatusCode::InvalidArgument, "{sig} {entries:?}");
        }
    }

    #[test]
    fn test_unparseable_value() {
        let err = materialize_inputs(&descs("2xi32"), &strings(&["2xi32=1 x"]), None, &allocator())
            .unwrap_err();
        assert!(err.to_string().contains("input 0"));
    }

    #[test]
    fn test_unaddressable_shape_is_invalid_argument() {
        let sig = "4294967296x4294967296x2xi32";
        for entry in [sig.to_string(), format!("{sig}=1")] {
            let alloc = allocator();
            let err = materialize_inputs(&descs(sig), &[entry], None, &alloc).unwrap_err();
            assert_eq!(err.code(), StatusCode::InvalidArgument);
            assert!(err.to_string().contains("too large"));
            assert_eq!(alloc.live_bytes(), 0);
        }
    }

    #[test]
    fn test_budget_checked_before_values_are_built() {
        let alloc = Allocator::new(MemoryBudget::from_bytes(1024));
        for entry in ["268435456xi8=7", "268435456xi8"] {
            let err = materialize_inputs(&descs("268435456xi8"), &strings(&[entry]), None, &alloc)
                .unwrap_err();
            assert_eq!(err.code(), StatusCode::ResourceExhausted, "{entry}");
        }
        let stats = alloc.stats();
        assert_eq!(stats.oom_count, 2);
        assert_eq!(stats.fresh, 0);
        assert_eq!(alloc.live_bytes(), 0);
    }

    #[test]
    fn test_failed_fill_releases_buffer() {
        let alloc = allocator();
        let err = materialize_inputs(
            &descs("4xi32;4xi32"),
            &strings(&["4xi32=1", "4xi32=1 2 x 4"]),
            None,
            &alloc,
        )
        .unwrap_err();
        assert!(err.to_string().contains("input 1"));
        assert_eq!(alloc.live_bytes(), 0);
    }

    #[test]
    fn test_buffers_come_from_allocator() {
        let alloc = allocator();
        let list = materialize_inputs(&descs("8xf64"), &strings(&["8xf64=1"]), None, &alloc).unwrap();
        assert_eq!(alloc.live_bytes(), 64);
        drop(list);
        assert_eq!(alloc.live_bytes(), 0);
    }
}
