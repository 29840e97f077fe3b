// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Iteration-count search, repetitions and aggregation.
//!
//! Each repetition calls the body with a growing iteration budget until a
//! single call lasts at least `min_time`. Growth is predicted from the last
//! call: when it was a meaningful fraction of the target the budget is
//! scaled to overshoot by 40%, otherwise it grows tenfold. The budget found
//! by one repetition seeds the next.

use crate::benchmark::Measurement;
use crate::report::{ReportContext, Reporter, RunReport, RunType};
use crate::{Aggregate, BenchError, Benchmark};
use std::time::Duration;

/// Hard ceiling on the iterations of a single body call.
pub const MAX_ITERATIONS: u64 = 1_000_000_000;

/// Predicts the iteration budget for the next attempt.
pub fn next_iterations(iterations: u64, measured: Duration, min_time: Duration) -> u64 {
    let seconds = measured.as_secs_f64();
    let target = min_time.as_secs_f64();
    let multiplier = if seconds / target > 0.1 {
        target * 1.4 / seconds.max(1e-9)
    } else {
        10.0
    };
    let next = (multiplier * iterations as f64).round().max(iterations as f64 + 1.0);
    (next as u64).min(MAX_ITERATIONS)
}

/// Runs every repetition of `bench` and returns its report lines: one per
/// repetition, followed by mean/median/stddev when there is more than one.
pub fn run_benchmark(bench: &mut Benchmark) -> Result<Vec<RunReport>, BenchError> {
    bench.settings().validate()?;
    let settings = bench.settings().clone();
    let run_name = bench.display_name();
    let mut iterations = settings.fixed_iterations.unwrap_or(1);
    let mut reports = Vec::with_capacity(settings.repetitions as usize + Aggregate::ALL.len());

    for repetition in 0..settings.repetitions {
        let measurement = loop {
            let m = bench.run_once(iterations)?;
            let measured = if settings.use_real_time {
                m.real_time
            } else {
                m.cpu_time
            };
            tracing::debug!(
                benchmark = %run_name,
                iterations,
                measured_ms = measured.as_secs_f64() * 1000.0,
                "trial finished"
            );
            if settings.fixed_iterations.is_some()
                || iterations >= MAX_ITERATIONS
                || measured >= settings.min_time
            {
                break m;
            }
            iterations = next_iterations(iterations, measured, settings.min_time);
        };
        reports.push(iteration_report(
            &run_name,
            &settings,
            repetition,
            &measurement,
        ));
    }

    if settings.repetitions > 1 {
        let real: Vec<f64> = reports.iter().map(|r| r.real_time).collect();
        let cpu: Vec<f64> = reports.iter().map(|r| r.cpu_time).collect();
        let total_iterations = reports.iter().map(|r| r.iterations).sum::<u64>();
        for aggregate in Aggregate::ALL {
            reports.push(RunReport {
                name: format!("{run_name}_{}", aggregate.as_str()),
                run_name: run_name.clone(),
                run_type: RunType::Aggregate,
                repetition_index: None,
                repetitions: settings.repetitions,
                aggregate_name: Some(aggregate),
                iterations: total_iterations,
                real_time: aggregate.compute(&real),
                cpu_time: aggregate.compute(&cpu),
                time_unit: settings.unit,
            });
        }
    }
    Ok(reports)
}

fn iteration_report(
    run_name: &str,
    settings: &crate::Settings,
    repetition: u32,
    m: &Measurement,
) -> RunReport {
    let per_iteration = |d: Duration| settings.unit.convert(d) / m.iterations.max(1) as f64;
    RunReport {
        name: run_name.to_string(),
        run_name: run_name.to_string(),
        run_type: RunType::Iteration,
        repetition_index: Some(repetition),
        repetitions: settings.repetitions,
        aggregate_name: None,
        iterations: m.iterations,
        real_time: per_iteration(m.real_time),
        cpu_time: per_iteration(m.cpu_time),
        time_unit: settings.unit,
    }
}

/// An ordered set of registered benchmarks.
#[derive(Debug, Default)]
pub struct Runner {
    benchmarks: Vec<Benchmark>,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, benchmark: Benchmark) -> &mut Self {
        self.benchmarks.push(benchmark);
        self
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Runs every benchmark in registration order, streaming results to
    /// `reporter`. Stops at the first failing benchmark.
    pub fn run(&mut self, reporter: &mut dyn Reporter) -> Result<Vec<RunReport>, BenchError> {
        reporter.report_context(&ReportContext::detect())?;
        let mut all = Vec::new();
        for bench in &mut self.benchmarks {
            tracing::info!(benchmark = bench.name(), "running benchmark");
            let reports = run_benchmark(bench)?;
            reporter.report_runs(&reports)?;
            all.extend(reports);
        }
        reporter.finalize()?;
        Ok(all)
    }
}
