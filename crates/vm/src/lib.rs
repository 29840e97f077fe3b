// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # vm
//!
//! A small register virtual machine that links modules together and
//! invokes their functions.
//!
//! # Key Components
//!
//! - [`register_type`] / [`Ref`] — the process-wide ref type registry and
//!   type-tagged handles to native objects.
//! - [`Value`] / [`VariantList`] — function arguments and results.
//! - [`Module`] — the interface implemented by [`BytecodeModule`] and by
//!   native modules such as the HAL adapter.
//! - [`Instance`] / [`Context`] — an ordered module list with imports
//!   resolved against earlier modules.
//! - [`invoke`] — runs a [`Function`] inside a context.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use vm::{BytecodeModule, Context, Function, Instance, Linkage, Module, Value, VariantList};
//!
//! let program: Arc<dyn Module> = Arc::new(BytecodeModule::from_bytes(br#"{
//!     "name": "echo",
//!     "functions": [{"name": "id", "export": true, "num_registers": 1, "num_args": 1,
//!                    "body": [{"op": "return", "values": [0]}]}]
//! }"#).unwrap());
//!
//! let instance = Instance::new();
//! let context = Context::with_modules(&instance, &[program.clone()]).unwrap();
//! let id = Function::lookup(&program, Linkage::Export, "id").unwrap();
//!
//! let mut inputs = VariantList::with_capacity(1);
//! inputs.push(Value::I64(42)).unwrap();
//! let mut outputs = VariantList::with_capacity(1);
//! vm::invoke(&context, &id, &inputs, &mut outputs).unwrap();
//! assert!(matches!(outputs.get(0), Some(Value::I64(42))));
//! ```

mod bytecode;
mod context;
mod error;
mod module;
mod types;
mod value;

pub use bytecode::BytecodeModule;
pub use context::{invoke, Context, ImportScope, Instance};
pub use error::VmError;
pub use module::{Function, Linkage, Module};
pub use types::{lookup_type, lookup_type_of, register_type, Ref, RefType};
pub use value::{Value, VariantList};
