// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Instruction set of the register machine.
//!
//! Every function owns a flat register file of `num_registers` slots.
//! Arguments arrive in registers `0..num_args`; all other registers start
//! empty and are written by `call_import`, `call` or `move`.

/// A single bytecode instruction.
///
/// Serialized as an internally tagged JSON object, e.g.
/// `{"op": "move", "from": 0, "to": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Calls the imported function at `import` with the values held in
    /// `args`, writing its results into `results`.
    CallImport {
        import: usize,
        args: Vec<usize>,
        results: Vec<usize>,
    },

    /// Calls another function of the same module by ordinal.
    Call {
        function: usize,
        args: Vec<usize>,
        results: Vec<usize>,
    },

    /// Copies the value of register `from` into register `to`.
    Move { from: usize, to: usize },

    /// Returns the values of `values` to the caller.
    Return { values: Vec<usize> },
}

impl Instruction {
    /// Short opcode name, as it appears in the `op` tag.
    pub fn opcode(&self) -> &'static str {
        match self {
            Instruction::CallImport { .. } => "call_import",
            Instruction::Call { .. } => "call",
            Instruction::Move { .. } => "move",
            Instruction::Return { .. } => "return",
        }
    }

    /// Every register this instruction reads or writes.
    pub fn registers(&self) -> Vec<usize> {
        match self {
            Instruction::CallImport { args, results, .. }
            | Instruction::Call { args, results, .. } => {
                args.iter().chain(results.iter()).copied().collect()
            }
            Instruction::Move { from, to } => vec![*from, *to],
            Instruction::Return { values } => values.clone(),
        }
    }

    /// Returns `true` if this instruction ends execution of the function.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Return { .. })
    }
}
