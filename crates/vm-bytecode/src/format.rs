// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON module document.
//!
//! # Format
//! ```json
//! {
//!   "name": "simple",
//!   "imports": ["hal.add"],
//!   "functions": [
//!     {
//!       "name": "add",
//!       "export": true,
//!       "reflection": {"fv": "1", "inputs": "2x2xi32;2x2xi32", "outputs": "2x2xi32"},
//!       "num_registers": 3,
//!       "num_args": 2,
//!       "body": [ ... ]
//!     }
//!   ]
//! }
//! ```

use crate::{BytecodeError, Instruction};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level module document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModuleDoc {
    /// Module name; other modules import its functions as `"<name>.<fn>"`.
    pub name: String,
    /// Fully qualified names of imported functions, addressed by index.
    #[serde(default)]
    pub imports: Vec<String>,
    /// Functions defined by this module, addressed by ordinal.
    #[serde(default)]
    pub functions: Vec<FunctionDoc>,
}

/// A single function definition.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionDoc {
    pub name: String,
    /// Whether the function is visible to callers outside the module.
    #[serde(default)]
    pub export: bool,
    /// Free-form reflection attributes (`fv`, `inputs`, `outputs`, …).
    #[serde(default)]
    pub reflection: BTreeMap<String, String>,
    pub num_registers: usize,
    pub num_args: usize,
    pub body: Vec<Instruction>,
}

impl ModuleDoc {
    /// Loads a module document from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, BytecodeError> {
        let content = std::fs::read(path)?;
        Self::from_slice(&content)
    }

    /// Parses a module document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BytecodeError> {
        if bytes.is_empty() {
            return Err(BytecodeError::Empty);
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parses a module document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, BytecodeError> {
        Self::from_slice(json.as_bytes())
    }

    /// Serializes the document to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, BytecodeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
