// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the VM.

use vm_bytecode::BytecodeError;

/// Errors raised while registering types, assembling contexts or invoking
/// functions.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// A ref type name or Rust type is already registered differently.
    #[error("ref type '{name}' conflicts with an existing registration: {detail}")]
    TypeConflict { name: String, detail: String },

    /// A ref was created for a Rust type that was never registered.
    #[error("type '{0}' is not registered with the VM")]
    UnregisteredType(&'static str),

    /// A value did not have the expected type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// The module bytes could not be loaded.
    #[error(transparent)]
    Bytecode(#[from] BytecodeError),

    /// Two modules with the same name were registered in one context.
    #[error("module '{0}' is already registered in this context")]
    DuplicateModule(String),

    /// An import could not be satisfied by any previously registered module.
    #[error("module '{module}' imports '{import}', which no earlier module exports")]
    UnresolvedImport { module: String, import: String },

    /// No function with this name or ordinal.
    #[error("function '{function}' not found in module '{module}'")]
    FunctionNotFound { module: String, function: String },

    /// The function belongs to a module that is not part of the context.
    #[error("module '{0}' is not registered in this context")]
    ModuleNotInContext(String),

    /// Wrong number of arguments or results.
    #[error("'{function}': expected {expected} {what}, got {actual}")]
    ArityMismatch {
        function: String,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A register was read before anything was written to it.
    #[error("'{function}': register {register} read before assignment")]
    UninitializedRegister { function: String, register: usize },

    /// Internal calls nested deeper than the interpreter allows.
    #[error("call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),

    /// A native function failed.
    #[error("'{function}' failed: {source}")]
    Native {
        function: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
