// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Registers the harness with the timing framework.

use crate::{BenchmarkConfig, BenchmarkError, Invocation, Session};
use microbench::{BenchError, Benchmark, Reporter, RunReport, Runner, State, TimeUnit};

/// Name the benchmark is reported under.
pub const BENCHMARK_NAME: &str = "BM_RunModule";

/// One complete benchmark body: untimed setup, warm-up, then the timed
/// loop driven by `state`. Everything is torn down before returning.
pub fn run_module(config: &BenchmarkConfig, state: &mut State) -> Result<(), BenchmarkError> {
    let session = Session::open(config)?;
    let mut invocation = Invocation::prepare(&session, config)?.warm_up()?;
    invocation.run_timed(state)?;
    tracing::debug!(
        iterations = invocation.timed_calls(),
        real_ms = state.real_time().as_secs_f64() * 1000.0,
        "timed loop finished"
    );
    Ok(())
}

/// Builds the `BM_RunModule` benchmark for `config`.
///
/// CPU time covers every thread of the process, since backends such as
/// `local-task` run kernels on a worker pool. The iteration count is driven
/// by wall time so single- and multi-threaded drivers stay comparable.
pub fn module_benchmark(config: BenchmarkConfig) -> Benchmark {
    let min_time = config.min_time();
    let repetitions = config.repetitions;
    Benchmark::new(BENCHMARK_NAME, move |state| run_module(&config, state))
        .measure_process_cpu_time()
        .use_real_time()
        .unit(TimeUnit::Millisecond)
        .min_time(min_time)
        .repetitions(repetitions)
}

/// Validates `config`, runs the benchmark and streams results to `reporter`.
pub fn run(
    config: &BenchmarkConfig,
    reporter: &mut dyn Reporter,
) -> Result<Vec<RunReport>, BenchmarkError> {
    config.validate()?;
    tracing::info!(
        module = %config.input_file.as_deref().unwrap_or_else(|| std::path::Path::new("")).display(),
        function = %config.entry_function,
        driver = %config.driver,
        "starting benchmark"
    );
    let mut runner = Runner::new();
    runner.register(module_benchmark(config.clone()));
    runner.run(reporter).map_err(unwrap_body_error)
}

/// Surfaces the harness error a failed body returned, keeping its step.
fn unwrap_body_error(err: BenchError) -> BenchmarkError {
    match err {
        BenchError::Body { name, source } => match source.downcast::<BenchmarkError>() {
            Ok(inner) => *inner,
            Err(source) => BenchmarkError::Framework(BenchError::Body { name, source }),
        },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusCode;
    use microbench::{CpuClock, JsonReporter};
    use std::path::PathBuf;

    #[test]
    fn test_benchmark_settings() {
        let bench = module_benchmark(BenchmarkConfig {
            repetitions: 3,
            min_time_ms: 50,
            ..Default::default()
        });
        assert_eq!(bench.name(), BENCHMARK_NAME);
        let s = bench.settings();
        assert!(s.measure_process_cpu_time);
        assert!(s.use_real_time);
        assert_eq!(s.unit, TimeUnit::Millisecond);
        assert_eq!(s.repetitions, 3);
        assert_eq!(s.min_time.as_millis(), 50);
        assert_eq!(
            bench.display_name(),
            "BM_RunModule/repeats:3/process_time/real_time"
        );
    }

    #[test]
    fn test_unset_input_file_fails_before_setup() {
        let mut reporter = JsonReporter::new(Vec::new());
        let err = run(&BenchmarkConfig::default(), &mut reporter).unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
        assert!(err.to_string().contains("input_file"));
    }

    #[test]
    fn test_body_error_is_unwrapped() {
        let config = BenchmarkConfig {
            input_file: Some(PathBuf::from("/nonexistent/module.json")),
            entry_function: "add".into(),
            ..Default::default()
        };
        let mut reporter = JsonReporter::new(Vec::new());
        let err = run(&config, &mut reporter).unwrap_err();
        assert_eq!(err.code(), StatusCode::NotFound);
        assert!(err.step().unwrap_or_default().starts_with("reading module file"));
    }

    #[test]
    fn test_run_module_reports_setup_failure() {
        let mut state = State::new(1, CpuClock::Process);
        let err = run_module(&BenchmarkConfig::default(), &mut state).unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
        assert!(!state.started());
    }
}
