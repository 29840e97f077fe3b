// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `benchmark-module inspect`: list a module's exports and signatures.

use module_bench::{inspect_module, BenchmarkConfig, ModuleInfo};
use std::path::PathBuf;

pub fn execute(
    input_file: Option<PathBuf>,
    config_path: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let path = match (input_file, config_path) {
        (Some(path), _) => path,
        (None, Some(config)) => BenchmarkConfig::from_file(&config)
            .map_err(|e| anyhow::anyhow!("{}: {e}", e.code()))?
            .input_file
            .ok_or_else(|| anyhow::anyhow!("config '{}' has no input_file", config.display()))?,
        (None, None) => anyhow::bail!("no module given; pass a path or --config"),
    };

    let info = inspect_module(&path).map_err(|e| anyhow::anyhow!("{}: {e}", e.code()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", render(&info));
    }
    Ok(())
}

fn render(info: &ModuleInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Module:  {}\n", info.name));
    out.push_str(&format!("  Imports: {}\n", info.imports.join(", ")));
    out.push('\n');

    // ── Exports ────────────────────────────────────────────────
    out.push_str(&format!(
        "  {:<24} {:<4} {:<32} {:<24}\n",
        "Function", "ABI", "Inputs", "Outputs"
    ));
    out.push_str(&format!("  {}\n", "-".repeat(86)));
    for export in &info.exports {
        out.push_str(&format!(
            "  {:<24} {:<4} {:<32} {:<24}\n",
            export.name,
            export.abi_version.as_deref().unwrap_or("-"),
            export.inputs,
            export.outputs,
        ));
    }
    out
}
