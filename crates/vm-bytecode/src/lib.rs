// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # vm-bytecode
//!
//! The serialized form of a program module and its structural verifier.
//!
//! A module file is a JSON document (see [`ModuleDoc`]) that declares:
//!
//! - the functions it imports from other modules (`"hal.add"`, …),
//! - its functions, each with a register count, an argument count, an
//!   optional export flag, reflection attributes, and a body of
//!   [`Instruction`]s.
//!
//! Loading goes through a **type-state** transition:
//!
//! ```text
//! BytecodeModuleDef<Parsed>   — JSON decoded, nothing checked.
//!       │  .validate()
//!       ▼
//! BytecodeModuleDef<Verified> — register/import/function indices in range,
//!                               names unique, every body terminated.
//! ```
//!
//! Only a verified definition can be handed to the VM interpreter.
//!
//! # Example
//! ```
//! use vm_bytecode::BytecodeLoader;
//!
//! let bytes = br#"{
//!     "name": "simple",
//!     "imports": ["hal.add"],
//!     "functions": [{
//!         "name": "add",
//!         "export": true,
//!         "reflection": {"fv": "1", "inputs": "2x2xi32;2x2xi32", "outputs": "2x2xi32"},
//!         "num_registers": 3,
//!         "num_args": 2,
//!         "body": [
//!             {"op": "call_import", "import": 0, "args": [0, 1], "results": [2]},
//!             {"op": "return", "values": [2]}
//!         ]
//!     }]
//! }"#;
//! let module = BytecodeLoader::from_bytes(bytes).unwrap();
//! assert_eq!(module.summary(), "Module 'simple': 1 functions (1 exported), 1 imports");
//! ```

mod error;
mod format;
mod instruction;
mod loader;
pub mod module;

pub use error::BytecodeError;
pub use format::{FunctionDoc, ModuleDoc};
pub use instruction::Instruction;
pub use loader::BytecodeLoader;
pub use module::{BytecodeModuleDef, Parsed, Verified};
