// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Interpreter for verified bytecode modules.

use crate::{ImportScope, Linkage, Module, Value, VmError};
use vm_bytecode::{BytecodeLoader, BytecodeModuleDef, FunctionDoc, Instruction, Verified};

/// Maximum nesting of internal `call` instructions.
const MAX_CALL_DEPTH: usize = 128;

/// A [`Module`] backed by a verified bytecode definition.
#[derive(Debug)]
pub struct BytecodeModule {
    def: BytecodeModuleDef<Verified>,
}

impl BytecodeModule {
    pub fn new(def: BytecodeModuleDef<Verified>) -> Self {
        Self { def }
    }

    /// Decodes, verifies and wraps serialized module bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VmError> {
        let def = BytecodeLoader::from_bytes(bytes)?;
        tracing::debug!("{}", def.summary());
        Ok(Self::new(def))
    }

    pub fn definition(&self) -> &BytecodeModuleDef<Verified> {
        &self.def
    }

    fn function_doc(&self, ordinal: usize) -> Result<&FunctionDoc, VmError> {
        self.def
            .function(ordinal)
            .ok_or_else(|| VmError::FunctionNotFound {
                module: self.def.name().to_string(),
                function: format!("#{ordinal}"),
            })
    }

    fn execute(
        &self,
        ordinal: usize,
        args: &[Value],
        imports: &ImportScope<'_>,
        depth: usize,
    ) -> Result<Vec<Value>, VmError> {
        if depth > MAX_CALL_DEPTH {
            return Err(VmError::CallDepthExceeded(MAX_CALL_DEPTH));
        }
        let function = self.function_doc(ordinal)?;
        if args.len() != function.num_args {
            return Err(VmError::ArityMismatch {
                function: function.name.clone(),
                what: "arguments",
                expected: function.num_args,
                actual: args.len(),
            });
        }

        let mut registers: Vec<Option<Value>> = vec![None; function.num_registers];
        for (slot, arg) in registers.iter_mut().zip(args) {
            *slot = Some(arg.clone());
        }

        let read = |registers: &[Option<Value>], which: &[usize]| -> Result<Vec<Value>, VmError> {
            which
                .iter()
                .map(|&r| {
                    registers[r]
                        .clone()
                        .ok_or_else(|| VmError::UninitializedRegister {
                            function: function.name.clone(),
                            register: r,
                        })
                })
                .collect()
        };
        let write = |registers: &mut [Option<Value>],
                     targets: &[usize],
                     values: Vec<Value>|
         -> Result<(), VmError> {
            if values.len() != targets.len() {
                return Err(VmError::ArityMismatch {
                    function: function.name.clone(),
                    what: "results",
                    expected: targets.len(),
                    actual: values.len(),
                });
            }
            for (&r, value) in targets.iter().zip(values) {
                registers[r] = Some(value);
            }
            Ok(())
        };

        for inst in &function.body {
            match inst {
                Instruction::CallImport {
                    import,
                    args,
                    results,
                } => {
                    let values = read(&registers, args)?;
                    let out = imports.call(*import, &values)?;
                    write(&mut registers, results, out)?;
                }
                Instruction::Call {
                    function: callee,
                    args,
                    results,
                } => {
                    let values = read(&registers, args)?;
                    let out = self.execute(*callee, &values, imports, depth + 1)?;
                    write(&mut registers, results, out)?;
                }
                Instruction::Move { from, to } => {
                    let value = read(&registers, std::slice::from_ref(from))?;
                    write(&mut registers, std::slice::from_ref(to), value)?;
                }
                Instruction::Return { values } => return read(&registers, values),
            }
        }

        // Verification guarantees a trailing `return`.
        Err(VmError::FunctionNotFound {
            module: self.def.name().to_string(),
            function: format!("{} (fell off the end)", function.name),
        })
    }
}

impl Module for BytecodeModule {
    fn name(&self) -> &str {
        self.def.name()
    }

    fn imports(&self) -> &[String] {
        self.def.imports()
    }

    fn function_count(&self) -> usize {
        self.def.functions().len()
    }

    fn lookup_function(&self, linkage: Linkage, name: &str) -> Option<usize> {
        let ordinal = self.def.find_function(name)?;
        match linkage {
            Linkage::Internal => Some(ordinal),
            Linkage::Export => self.def.function(ordinal).filter(|f| f.export).map(|_| ordinal),
        }
    }

    fn function_name(&self, ordinal: usize) -> Option<&str> {
        self.def.function(ordinal).map(|f| f.name.as_str())
    }

    fn reflection_attr(&self, ordinal: usize, key: &str) -> Option<&str> {
        self.def
            .function(ordinal)
            .and_then(|f| f.reflection.get(key))
            .map(String::as_str)
    }

    fn invoke(
        &self,
        ordinal: usize,
        args: &[Value],
        imports: &ImportScope<'_>,
    ) -> Result<Vec<Value>, VmError> {
        self.execute(ordinal, args, imports, 0)
    }
}
