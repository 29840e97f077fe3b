// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Module loading from bytes or files.
//!
//! The loader decodes a [`ModuleDoc`] and immediately verifies it, so every
//! successful load yields a [`BytecodeModuleDef<Verified>`]. Callers that
//! map the file themselves (the benchmark harness memory-maps it) use
//! [`BytecodeLoader::from_bytes`].

use crate::module::Verified;
use crate::{BytecodeError, BytecodeModuleDef, ModuleDoc};
use std::path::Path;

/// Loads and verifies modules.
///
/// # Example
/// ```no_run
/// use vm_bytecode::BytecodeLoader;
/// use std::path::Path;
///
/// let module = BytecodeLoader::from_file(Path::new("simple_add.json")).unwrap();
/// println!("{}", module.summary());
/// ```
pub struct BytecodeLoader;

impl BytecodeLoader {
    /// Decodes and verifies a module from its serialized bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<BytecodeModuleDef<Verified>, BytecodeError> {
        let doc = ModuleDoc::from_slice(bytes)?;
        BytecodeModuleDef::new(doc).validate()
    }

    /// Reads, decodes and verifies a module file.
    pub fn from_file(path: &Path) -> Result<BytecodeModuleDef<Verified>, BytecodeError> {
        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read module file");
        Self::from_bytes(&bytes)
    }

    /// Serializes a verified module back to bytes.
    pub fn to_bytes(module: &BytecodeModuleDef<Verified>) -> Result<Vec<u8>, BytecodeError> {
        Ok(serde_json::to_vec_pretty(module.doc())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SIMPLE: &str = r#"{
        "name": "simple",
        "imports": ["hal.add"],
        "functions": [{
            "name": "add",
            "export": true,
            "reflection": {"fv": "1", "inputs": "2x2xi32;2x2xi32", "outputs": "2x2xi32"},
            "num_registers": 3,
            "num_args": 2,
            "body": [
                {"op": "call_import", "import": 0, "args": [0, 1], "results": [2]},
                {"op": "return", "values": [2]}
            ]
        }]
    }"#;

    #[test]
    fn test_from_bytes() {
        let module = BytecodeLoader::from_bytes(SIMPLE.as_bytes()).unwrap();
        assert_eq!(module.name(), "simple");
        assert_eq!(module.imports(), &["hal.add".to_string()]);
        let add = module.function(0).unwrap();
        assert_eq!(add.reflection.get("fv").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SIMPLE.as_bytes()).unwrap();
        let module = BytecodeLoader::from_file(file.path()).unwrap();
        assert_eq!(
            module.summary(),
            "Module 'simple': 1 functions (1 exported), 1 imports"
        );
    }

    #[test]
    fn test_missing_file() {
        let result = BytecodeLoader::from_file(Path::new("/nonexistent/module.json"));
        assert!(matches!(result, Err(BytecodeError::Read(_))));
    }

    #[test]
    fn test_to_bytes_reloads() {
        let module = BytecodeLoader::from_bytes(SIMPLE.as_bytes()).unwrap();
        let bytes = BytecodeLoader::to_bytes(&module).unwrap();
        let again = BytecodeLoader::from_bytes(&bytes).unwrap();
        assert_eq!(again.doc(), module.doc());
    }
}
