// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Module definition with compile-time verification state.
//!
//! # Type-State Pattern
//!
//! ```text
//! BytecodeModuleDef<Parsed>    — document decoded, not yet checked.
//!       │  .validate()
//!       ▼
//! BytecodeModuleDef<Verified>  — safe to interpret.
//! ```
//!
//! The interpreter in the `vm` crate only accepts the `Verified` state, so
//! it never has to bounds-check a register or import index at run time.

use crate::{BytecodeError, FunctionDoc, Instruction, ModuleDoc};
use std::collections::HashSet;
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: document decoded but not verified.
#[derive(Debug, Clone)]
pub struct Parsed;

/// Marker: structure verified.
#[derive(Debug, Clone)]
pub struct Verified;

/// Sealed trait for module definition states.
pub trait DefState: fmt::Debug + Clone {}
impl DefState for Parsed {}
impl DefState for Verified {}

// ── BytecodeModuleDef ──────────────────────────────────────────────

/// A module definition. The generic parameter `S` encodes whether it has
/// passed [`validate`](BytecodeModuleDef::validate).
#[derive(Debug, Clone)]
pub struct BytecodeModuleDef<S: DefState = Parsed> {
    doc: ModuleDoc,
    _state: std::marker::PhantomData<S>,
}

impl BytecodeModuleDef<Parsed> {
    /// Wraps a decoded document in the `Parsed` state.
    pub fn new(doc: ModuleDoc) -> Self {
        Self {
            doc,
            _state: std::marker::PhantomData,
        }
    }

    /// Verifies the module structure and transitions to `Verified`.
    ///
    /// # Checks
    /// - The module name is non-empty and contains no `.`.
    /// - Every import is qualified as `module.function`.
    /// - Function names are unique.
    /// - `num_args <= num_registers` and every register index is in range.
    /// - `call_import` / `call` targets exist.
    /// - Every body is non-empty and ends with `return`.
    pub fn validate(self) -> Result<BytecodeModuleDef<Verified>, BytecodeError> {
        let doc = &self.doc;
        if doc.name.is_empty() || doc.name.contains('.') {
            return Err(BytecodeError::InvalidModule {
                module: doc.name.clone(),
                detail: "module name must be non-empty and unqualified".into(),
            });
        }

        for import in &doc.imports {
            if split_qualified(import).is_none() {
                return Err(BytecodeError::InvalidModule {
                    module: doc.name.clone(),
                    detail: format!("import '{import}' is not of the form 'module.function'"),
                });
            }
        }

        let mut seen = HashSet::new();
        for function in &doc.functions {
            if !seen.insert(function.name.as_str()) {
                return Err(BytecodeError::InvalidModule {
                    module: doc.name.clone(),
                    detail: format!("duplicate function '{}'", function.name),
                });
            }
            verify_function(function, doc.imports.len(), doc.functions.len())?;
        }

        tracing::debug!(
            module = %doc.name,
            functions = doc.functions.len(),
            imports = doc.imports.len(),
            "module verified"
        );

        Ok(BytecodeModuleDef {
            doc: self.doc,
            _state: std::marker::PhantomData,
        })
    }
}

fn verify_function(
    function: &FunctionDoc,
    num_imports: usize,
    num_functions: usize,
) -> Result<(), BytecodeError> {
    let invalid = |detail: String| BytecodeError::InvalidFunction {
        function: function.name.clone(),
        detail,
    };

    if function.num_args > function.num_registers {
        return Err(invalid(format!(
            "{} arguments do not fit in {} registers",
            function.num_args, function.num_registers
        )));
    }

    match function.body.last() {
        Some(last) if last.is_terminator() => {}
        _ => return Err(invalid("body must end with 'return'".into())),
    }

    for (pc, inst) in function.body.iter().enumerate() {
        if let Some(reg) = inst
            .registers()
            .into_iter()
            .find(|&r| r >= function.num_registers)
        {
            return Err(invalid(format!(
                "instruction {pc} ({}) uses register {reg} of {}",
                inst.opcode(),
                function.num_registers
            )));
        }
        match inst {
            Instruction::CallImport { import, .. } if *import >= num_imports => {
                return Err(invalid(format!(
                    "instruction {pc} calls import {import} of {num_imports}"
                )));
            }
            Instruction::Call { function: target, .. } if *target >= num_functions => {
                return Err(invalid(format!(
                    "instruction {pc} calls function {target} of {num_functions}"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Splits `"module.function"` into its two non-empty halves.
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    let (module, function) = name.split_once('.')?;
    if module.is_empty() || function.is_empty() {
        return None;
    }
    Some((module, function))
}

// ── Verified state ─────────────────────────────────────────────────

impl BytecodeModuleDef<Verified> {
    pub fn name(&self) -> &str {
        &self.doc.name
    }

    pub fn imports(&self) -> &[String] {
        &self.doc.imports
    }

    pub fn functions(&self) -> &[FunctionDoc] {
        &self.doc.functions
    }

    /// Returns the function at `ordinal`.
    pub fn function(&self, ordinal: usize) -> Option<&FunctionDoc> {
        self.doc.functions.get(ordinal)
    }

    /// Returns the ordinal of the function named `name`.
    pub fn find_function(&self, name: &str) -> Option<usize> {
        self.doc.functions.iter().position(|f| f.name == name)
    }

    /// Iterates over `(ordinal, function)` for exported functions.
    pub fn exports(&self) -> impl Iterator<Item = (usize, &FunctionDoc)> {
        self.doc
            .functions
            .iter()
            .enumerate()
            .filter(|(_, f)| f.export)
    }

    /// Returns the underlying document.
    pub fn doc(&self) -> &ModuleDoc {
        &self.doc
    }

    /// Returns a one-line summary of the module.
    pub fn summary(&self) -> String {
        format!(
            "Module '{}': {} functions ({} exported), {} imports",
            self.doc.name,
            self.doc.functions.len(),
            self.exports().count(),
            self.doc.imports.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str, num_registers: usize, body: Vec<Instruction>) -> FunctionDoc {
        FunctionDoc {
            name: name.into(),
            export: true,
            reflection: Default::default(),
            num_registers,
            num_args: 0,
            body,
        }
    }

    fn module(imports: &[&str], functions: Vec<FunctionDoc>) -> BytecodeModuleDef<Parsed> {
        BytecodeModuleDef::new(ModuleDoc {
            name: "m".into(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            functions,
        })
    }

    fn ret(values: Vec<usize>) -> Instruction {
        Instruction::Return { values }
    }

    #[test]
    fn test_valid_module() {
        let def = module(
            &["hal.add"],
            vec![function(
                "add",
                3,
                vec![
                    Instruction::CallImport {
                        import: 0,
                        args: vec![0, 1],
                        results: vec![2],
                    },
                    ret(vec![2]),
                ],
            )],
        )
        .validate()
        .unwrap();
        assert_eq!(def.find_function("add"), Some(0));
        assert_eq!(def.find_function("sub"), None);
        assert_eq!(def.exports().count(), 1);
    }

    #[test]
    fn test_missing_return() {
        let def = module(&[], vec![function("f", 2, vec![Instruction::Move { from: 0, to: 1 }])]);
        assert!(matches!(
            def.validate(),
            Err(BytecodeError::InvalidFunction { .. })
        ));

        let empty = module(&[], vec![function("f", 0, vec![])]);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_register_out_of_range() {
        let def = module(&[], vec![function("f", 1, vec![ret(vec![1])])]);
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("register 1"));
    }

    #[test]
    fn test_import_index_out_of_range() {
        let def = module(
            &[],
            vec![function(
                "f",
                1,
                vec![
                    Instruction::CallImport {
                        import: 0,
                        args: vec![],
                        results: vec![0],
                    },
                    ret(vec![0]),
                ],
            )],
        );
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_call_target_out_of_range() {
        let def = module(
            &[],
            vec![function(
                "f",
                1,
                vec![
                    Instruction::Call {
                        function: 4,
                        args: vec![],
                        results: vec![0],
                    },
                    ret(vec![0]),
                ],
            )],
        );
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_duplicate_function_names() {
        let def = module(
            &[],
            vec![
                function("f", 0, vec![ret(vec![])]),
                function("f", 0, vec![ret(vec![])]),
            ],
        );
        assert!(matches!(
            def.validate(),
            Err(BytecodeError::InvalidModule { .. })
        ));
    }

    #[test]
    fn test_unqualified_import() {
        let def = module(&["add"], vec![]);
        assert!(def.validate().is_err());
        let def = module(&["hal."], vec![]);
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_args_exceed_registers() {
        let mut f = function("f", 1, vec![ret(vec![])]);
        f.num_args = 2;
        assert!(module(&[], vec![f]).validate().is_err());
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("hal.add"), Some(("hal", "add")));
        assert_eq!(split_qualified("add"), None);
        assert_eq!(split_qualified(".add"), None);
    }
}
