// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Run records and the console/JSON reporters.
//!
//! Console output is a fixed-width table:
//!
//! ```text
//! ----------------------------------------------------------------------------
//! Benchmark                                  Time             CPU   Iterations
//! ----------------------------------------------------------------------------
//! BM_RunModule/process_time/real_time    0.012 ms        0.011 ms        41235
//! ```

use crate::{Aggregate, BenchError, TimeUnit};
use std::io::Write;
use std::str::FromStr;

/// Whether a record is one repetition or a statistic over repetitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Iteration,
    Aggregate,
}

/// One reported line.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RunReport {
    pub name: String,
    pub run_name: String,
    pub run_type: RunType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_index: Option<u32>,
    pub repetitions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_name: Option<Aggregate>,
    pub iterations: u64,
    /// Wall time per iteration, in `time_unit`.
    pub real_time: f64,
    /// CPU time per iteration, in `time_unit`.
    pub cpu_time: f64,
    pub time_unit: TimeUnit,
}

/// Host information printed before the results.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReportContext {
    pub executable: String,
    pub num_cpus: usize,
    pub library_version: &'static str,
}

impl ReportContext {
    pub fn detect() -> Self {
        Self {
            executable: std::env::args().next().unwrap_or_default(),
            num_cpus: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            library_version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Receives benchmark results as they are produced.
pub trait Reporter {
    fn report_context(&mut self, context: &ReportContext) -> Result<(), BenchError>;

    fn report_runs(&mut self, runs: &[RunReport]) -> Result<(), BenchError>;

    /// Called once after the last benchmark.
    fn finalize(&mut self) -> Result<(), BenchError> {
        Ok(())
    }
}

/// Output format selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Console,
    Json,
}

impl ReportFormat {
    pub fn reporter<W: Write + 'static>(self, out: W) -> Box<dyn Reporter> {
        match self {
            ReportFormat::Console => Box::new(ConsoleReporter::new(out)),
            ReportFormat::Json => Box::new(JsonReporter::new(out)),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(ReportFormat::Console),
            "json" => Ok(ReportFormat::Json),
            other => Err(BenchError::InvalidSetting(format!(
                "unknown report format '{other}'; expected 'console' or 'json'"
            ))),
        }
    }
}

/// Human-readable table.
pub struct ConsoleReporter<W> {
    out: W,
    name_width: usize,
    header_printed: bool,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            name_width: 10,
            header_printed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_header(&mut self) -> Result<(), BenchError> {
        let header = format!(
            "{:<width$} {:>15} {:>15} {:>12}",
            "Benchmark",
            "Time",
            "CPU",
            "Iterations",
            width = self.name_width
        );
        let rule = "-".repeat(header.len());
        writeln!(self.out, "{rule}\n{header}\n{rule}")?;
        self.header_printed = true;
        Ok(())
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report_context(&mut self, context: &ReportContext) -> Result<(), BenchError> {
        writeln!(
            self.out,
            "Running {}\nRun on ({} X CPU s)",
            context.executable, context.num_cpus
        )?;
        Ok(())
    }

    fn report_runs(&mut self, runs: &[RunReport]) -> Result<(), BenchError> {
        if !self.header_printed {
            let longest = runs.iter().map(|r| r.name.len()).max().unwrap_or(0);
            self.name_width = self.name_width.max(longest);
            self.print_header()?;
        }
        for run in runs {
            let unit = run.time_unit.suffix();
            let iterations = match run.run_type {
                RunType::Iteration => run.iterations.to_string(),
                RunType::Aggregate => String::new(),
            };
            writeln!(
                self.out,
                "{:<width$} {:>12.3} {:<2} {:>12.3} {:<2} {:>12}",
                run.name,
                run.real_time,
                unit,
                run.cpu_time,
                unit,
                iterations,
                width = self.name_width
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct JsonDocument<'a> {
    context: &'a Option<ReportContext>,
    benchmarks: &'a [RunReport],
}

/// Collects every run and writes a single JSON document on finalize.
pub struct JsonReporter<W> {
    out: W,
    context: Option<ReportContext>,
    runs: Vec<RunReport>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            context: None,
            runs: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report_context(&mut self, context: &ReportContext) -> Result<(), BenchError> {
        self.context = Some(context.clone());
        Ok(())
    }

    fn report_runs(&mut self, runs: &[RunReport]) -> Result<(), BenchError> {
        self.runs.extend_from_slice(runs);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), BenchError> {
        let doc = JsonDocument {
            context: &self.context,
            benchmarks: &self.runs,
        };
        serde_json::to_writer_pretty(&mut self.out, &doc)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
