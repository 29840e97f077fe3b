// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Summaries of a module's exports for the `inspect` command.

use crate::assembler::map_module_file;
use crate::error::ResultExt;
use crate::signature::{ABI_VERSION_ATTR, INPUTS_ATTR, OUTPUTS_ATTR};
use crate::BenchmarkError;
use std::path::Path;
use vm::{BytecodeModule, Linkage, Module};

/// One exported function and its reflected signature.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExportInfo {
    pub name: String,
    pub abi_version: Option<String>,
    pub inputs: String,
    pub outputs: String,
}

/// Everything `inspect` prints about a module.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub imports: Vec<String>,
    pub exports: Vec<ExportInfo>,
}

/// Describes the exports of any module.
pub fn describe(module: &dyn Module) -> ModuleInfo {
    let exports = module
        .exports()
        .into_iter()
        .filter_map(|name| {
            let ordinal = module.lookup_function(Linkage::Export, &name)?;
            let attr = |key: &str| module.reflection_attr(ordinal, key).map(str::to_string);
            Some(ExportInfo {
                abi_version: attr(ABI_VERSION_ATTR),
                inputs: attr(INPUTS_ATTR).unwrap_or_default(),
                outputs: attr(OUTPUTS_ATTR).unwrap_or_default(),
                name,
            })
        })
        .collect();
    ModuleInfo {
        name: module.name().to_string(),
        imports: module.imports().to_vec(),
        exports,
    }
}

/// Loads the module file at `path` and describes it.
pub fn inspect_module(path: &Path) -> Result<ModuleInfo, BenchmarkError> {
    let bytes = map_module_file(path)
        .with_context(|| format!("reading module file '{}'", path.display()))?;
    let module = BytecodeModule::from_bytes(&bytes).context("loading module")?;
    Ok(describe(&module))
}
