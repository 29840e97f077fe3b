// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Harness configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! input_file = "./testdata/simple_add.json"
//! entry_function = "add"
//! driver = "local-task"
//! inputs = ["2x2xi32=1 2 3 4", "2x2xi32=5 6 7 8"]
//! device_memory_budget = "64M"
//! min_time_ms = 500
//! repetitions = 3
//! ```
//!
//! Command-line flags override values read from the file.

use crate::BenchmarkError;
use hal::MemoryBudget;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for one benchmark run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Module file to load. Required; must be a regular file.
    pub input_file: Option<PathBuf>,
    /// Exported function to benchmark.
    pub entry_function: String,
    /// Execution driver (`"vmla"`, `"local-task"`, ...).
    pub driver: String,
    /// Inline input entries, one per function input.
    pub inputs: Vec<String>,
    /// File holding input entries, one per line.
    pub inputs_file: Option<PathBuf>,
    /// Device memory ceiling (`"512M"`); unlimited when absent.
    pub device_memory_budget: Option<String>,
    /// Minimum measured wall time per repetition, in milliseconds.
    pub min_time_ms: u64,
    pub repetitions: u32,
}

impl BenchmarkConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, BenchmarkError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchmarkError::InvalidArgument(format!(
                "cannot read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, BenchmarkError> {
        toml::from_str(toml_str)
            .map_err(|e| BenchmarkError::InvalidArgument(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, BenchmarkError> {
        toml::to_string_pretty(self)
            .map_err(|e| BenchmarkError::InvalidArgument(format!("TOML serialise error: {e}")))
    }

    /// Checks the fields every run needs. Input source exclusivity is
    /// checked later, once the function's signature is known.
    pub fn validate(&self) -> Result<(), BenchmarkError> {
        if self.input_file.as_ref().map_or(true, |p| p.as_os_str().is_empty()) {
            return Err(BenchmarkError::InvalidArgument(
                "input_file must be specified".into(),
            ));
        }
        if self.entry_function.is_empty() {
            return Err(BenchmarkError::InvalidArgument(
                "entry_function must be specified".into(),
            ));
        }
        if self.driver.is_empty() {
            return Err(BenchmarkError::InvalidArgument(
                "driver must not be empty".into(),
            ));
        }
        if self.repetitions == 0 {
            return Err(BenchmarkError::InvalidArgument(
                "repetitions must be at least 1".into(),
            ));
        }
        if self.min_time_ms == 0 {
            return Err(BenchmarkError::InvalidArgument(
                "min_time_ms must be positive".into(),
            ));
        }
        self.parse_budget()?;
        Ok(())
    }

    /// Parses the device memory budget.
    pub fn parse_budget(&self) -> Result<MemoryBudget, BenchmarkError> {
        match &self.device_memory_budget {
            Some(text) => Ok(MemoryBudget::parse(text)?),
            None => Ok(MemoryBudget::unlimited()),
        }
    }

    pub fn min_time(&self) -> Duration {
        Duration::from_millis(self.min_time_ms)
    }

    /// Input file path, with empty paths treated as unset.
    pub fn inputs_file(&self) -> Option<&Path> {
        self.inputs_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            input_file: None,
            entry_function: String::new(),
            driver: "vmla".to_string(),
            inputs: Vec::new(),
            inputs_file: None,
            device_memory_budget: None,
            min_time_ms: 500,
            repetitions: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusCode;

    fn valid() -> BenchmarkConfig {
        BenchmarkConfig {
            input_file: Some(PathBuf::from("module.json")),
            entry_function: "add".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default() {
        let c = BenchmarkConfig::default();
        assert_eq!(c.driver, "vmla");
        assert!(c.inputs.is_empty());
        assert!(c.input_file.is_none());
        assert_eq!(c.repetitions, 1);
        assert!(c.parse_budget().unwrap().is_unlimited());
    }

    #[test]
    fn test_validate_requires_input_file() {
        let err = BenchmarkConfig::default().validate().unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
        assert!(err.to_string().contains("input_file"));

        let empty = BenchmarkConfig {
            input_file: Some(PathBuf::new()),
            ..valid()
        };
        assert!(empty.validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_budget() {
        let c = BenchmarkConfig {
            device_memory_budget: Some("lots".into()),
            ..valid()
        };
        assert_eq!(c.validate().unwrap_err().code(), StatusCode::InvalidArgument);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
input_file = "/tmp/m.json"
entry_function = "add"
driver = "local-task"
inputs = ["2x2xi32=1 2 3 4", "2x2xi32=5 6 7 8"]
device_memory_budget = "64M"
"#;
        let c = BenchmarkConfig::from_toml(toml).unwrap();
        assert_eq!(c.input_file, Some(PathBuf::from("/tmp/m.json")));
        assert_eq!(c.driver, "local-task");
        assert_eq!(c.inputs.len(), 2);
        assert_eq!(c.parse_budget().unwrap().as_mb(), 64);
        assert_eq!(c.min_time_ms, 500);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = BenchmarkConfig {
            inputs: vec!["i32=3".into()],
            ..valid()
        };
        let back = BenchmarkConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_empty_inputs_file_is_unset() {
        let c = BenchmarkConfig {
            inputs_file: Some(PathBuf::new()),
            ..valid()
        };
        assert!(c.inputs_file().is_none());
    }
}
