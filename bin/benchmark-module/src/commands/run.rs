// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Default action: benchmark one exported function.
//!
//! Flags are merged over the `--config` file (or the defaults), validated,
//! and handed to the harness. Setup failures come back as a status code
//! plus the step that failed, e.g.
//! `NOT_FOUND: creating device: HAL error: driver 'tpu' not found (...)`.

use microbench::ReportFormat;
use module_bench::BenchmarkConfig;
use std::path::{Path, PathBuf};

#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Module file to load (must be a regular file).
    #[arg(long = "input_file", value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Name of the exported function to benchmark.
    #[arg(long = "entry_function", value_name = "NAME")]
    pub entry_function: Option<String>,

    /// Execution driver: vmla, local-task, ... [default: vmla]
    #[arg(long)]
    pub driver: Option<String>,

    /// Inline input entries, comma-separated (e.g. "2x2xi32=1 2 3 4,i32=7").
    #[arg(long, value_delimiter = ',', value_name = "ENTRY")]
    pub inputs: Vec<String>,

    /// File with one input entry per line. Mutually exclusive with --inputs.
    #[arg(long = "inputs_file", value_name = "PATH")]
    pub inputs_file: Option<PathBuf>,

    /// Device memory budget (e.g. "512M", "1G"). Unlimited by default.
    #[arg(long = "device_memory_budget", value_name = "SIZE")]
    pub device_memory_budget: Option<String>,

    /// Minimum measured time per repetition, in seconds [default: 0.5]
    #[arg(long = "benchmark_min_time", value_name = "SECONDS")]
    pub benchmark_min_time: Option<f64>,

    /// Number of repetitions; aggregates are reported when greater than 1.
    #[arg(long = "benchmark_repetitions", value_name = "N")]
    pub benchmark_repetitions: Option<u32>,

    /// Output format: console or json.
    #[arg(long = "benchmark_format", default_value = "console", value_name = "FORMAT")]
    pub benchmark_format: ReportFormat,
}

impl RunArgs {
    /// Builds the run configuration: file values first, then flags.
    pub fn resolve(&self, config_path: Option<&Path>) -> anyhow::Result<BenchmarkConfig> {
        let mut config = match config_path {
            Some(path) => BenchmarkConfig::from_file(path)
                .map_err(|e| anyhow::anyhow!("{}: {e}", e.code()))?,
            None => BenchmarkConfig::default(),
        };

        if let Some(path) = &self.input_file {
            config.input_file = Some(path.clone());
        }
        if let Some(name) = &self.entry_function {
            config.entry_function = name.clone();
        }
        if let Some(driver) = &self.driver {
            config.driver = driver.clone();
        }
        if !self.inputs.is_empty() {
            config.inputs = self.inputs.clone();
        }
        if let Some(path) = &self.inputs_file {
            config.inputs_file = Some(path.clone());
        }
        if let Some(budget) = &self.device_memory_budget {
            config.device_memory_budget = Some(budget.clone());
        }
        if let Some(seconds) = self.benchmark_min_time {
            if !seconds.is_finite() || seconds <= 0.0 {
                anyhow::bail!("--benchmark_min_time must be a positive number of seconds");
            }
            config.min_time_ms = ((seconds * 1000.0).round() as u64).max(1);
        }
        if let Some(repetitions) = self.benchmark_repetitions {
            config.repetitions = repetitions;
        }
        Ok(config)
    }
}

pub fn execute(args: RunArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = args.resolve(config_path.as_deref())?;
    tracing::debug!(?config, "resolved configuration");

    let mut reporter = args.benchmark_format.reporter(std::io::stdout());
    module_bench::run(&config, reporter.as_mut())
        .map_err(|e| anyhow::anyhow!("{}: {e}", e.code()))?;
    Ok(())
}
