// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmark registration and settings.

use crate::clock::CpuClock;
use crate::{BenchError, State, TimeUnit};
use std::error::Error;
use std::time::Duration;

type BoxError = Box<dyn Error + Send + Sync>;
type Body = Box<dyn FnMut(&mut State) -> Result<(), BoxError>>;

/// How a benchmark is measured and reported.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Settings {
    /// Charge CPU time of every thread in the process, not just the caller.
    pub measure_process_cpu_time: bool,
    /// Use wall time to decide when enough iterations have run.
    pub use_real_time: bool,
    pub unit: TimeUnit,
    /// Minimum measured time per repetition.
    pub min_time: Duration,
    pub repetitions: u32,
    /// Skip iteration growth and always run exactly this many iterations.
    pub fixed_iterations: Option<u64>,
}

impl Settings {
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.repetitions == 0 {
            return Err(BenchError::InvalidSetting(
                "repetitions must be at least 1".into(),
            ));
        }
        if self.fixed_iterations == Some(0) {
            return Err(BenchError::InvalidSetting(
                "iterations must be at least 1".into(),
            ));
        }
        if self.fixed_iterations.is_none() && self.min_time.is_zero() {
            return Err(BenchError::InvalidSetting(
                "min_time must be positive".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn cpu_clock(&self) -> CpuClock {
        if self.measure_process_cpu_time {
            CpuClock::Process
        } else {
            CpuClock::Thread
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            measure_process_cpu_time: false,
            use_real_time: false,
            unit: TimeUnit::Nanosecond,
            min_time: Duration::from_millis(500),
            repetitions: 1,
            fixed_iterations: None,
        }
    }
}

/// One measurement of a body call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub iterations: u64,
    pub real_time: Duration,
    pub cpu_time: Duration,
}

/// A named benchmark body plus its settings.
///
/// ```
/// use microbench::{Benchmark, TimeUnit};
///
/// let bench = Benchmark::new("BM_Sum", |state| {
///     let data: Vec<u64> = (0..1024).collect();
///     for _ in state.iter() {
///         std::hint::black_box(data.iter().sum::<u64>());
///     }
///     Ok::<_, std::io::Error>(())
/// })
/// .measure_process_cpu_time()
/// .use_real_time()
/// .unit(TimeUnit::Microsecond);
///
/// assert_eq!(bench.display_name(), "BM_Sum/process_time/real_time");
/// ```
pub struct Benchmark {
    name: String,
    settings: Settings,
    body: Body,
}

impl Benchmark {
    pub fn new<F, E>(name: impl Into<String>, mut body: F) -> Self
    where
        F: FnMut(&mut State) -> Result<(), E> + 'static,
        E: Into<BoxError>,
    {
        Self {
            name: name.into(),
            settings: Settings::default(),
            body: Box::new(move |state| body(state).map_err(Into::into)),
        }
    }

    pub fn measure_process_cpu_time(mut self) -> Self {
        self.settings.measure_process_cpu_time = true;
        self
    }

    pub fn use_real_time(mut self) -> Self {
        self.settings.use_real_time = true;
        self
    }

    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.settings.unit = unit;
        self
    }

    pub fn min_time(mut self, min_time: Duration) -> Self {
        self.settings.min_time = min_time;
        self
    }

    pub fn repetitions(mut self, repetitions: u32) -> Self {
        self.settings.repetitions = repetitions;
        self
    }

    pub fn iterations(mut self, iterations: u64) -> Self {
        self.settings.fixed_iterations = Some(iterations);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with the measurement-mode suffixes used in reports.
    pub fn display_name(&self) -> String {
        let mut name = self.name.clone();
        if let Some(iterations) = self.settings.fixed_iterations {
            name.push_str(&format!("/iterations:{iterations}"));
        }
        if self.settings.repetitions > 1 {
            name.push_str(&format!("/repeats:{}", self.settings.repetitions));
        }
        if self.settings.measure_process_cpu_time {
            name.push_str("/process_time");
        }
        if self.settings.use_real_time {
            name.push_str("/real_time");
        }
        name
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Calls the body once with a budget of `iterations`.
    pub(crate) fn run_once(&mut self, iterations: u64) -> Result<Measurement, BenchError> {
        let mut state = State::new(iterations, self.settings.cpu_clock());
        let outcome = (self.body)(&mut state);
        state.finish();
        outcome.map_err(|source| BenchError::Body {
            name: self.name.clone(),
            source,
        })?;
        if !state.started() {
            return Err(BenchError::LoopNotRun(self.name.clone()));
        }
        Ok(Measurement {
            iterations: state.iterations(),
            real_time: state.real_time(),
            cpu_time: state.cpu_time(),
        })
    }
}

impl std::fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Benchmark {
        Benchmark::new("BM_Noop", |state| {
            for _ in state.iter() {}
            Ok::<_, BoxError>(())
        })
    }

    #[test]
    fn test_display_name_suffixes() {
        assert_eq!(noop().display_name(), "BM_Noop");
        let b = noop().measure_process_cpu_time().use_real_time();
        assert_eq!(b.display_name(), "BM_Noop/process_time/real_time");
        assert_eq!(noop().repetitions(3).display_name(), "BM_Noop/repeats:3");
    }

    #[test]
    fn test_builder_sets_fields() {
        let b = noop()
            .unit(TimeUnit::Millisecond)
            .min_time(Duration::from_millis(20))
            .repetitions(2);
        let s = b.settings();
        assert_eq!(s.unit, TimeUnit::Millisecond);
        assert_eq!(s.min_time, Duration::from_millis(20));
        assert_eq!(s.repetitions, 2);
        assert_eq!(s.cpu_clock(), CpuClock::Thread);
    }

    #[test]
    fn test_validate() {
        assert!(Settings::default().validate().is_ok());
        assert!(noop().repetitions(0).settings().validate().is_err());
        assert!(noop().iterations(0).settings().validate().is_err());
        assert!(noop().min_time(Duration::ZERO).settings().validate().is_err());
        assert!(noop()
            .min_time(Duration::ZERO)
            .iterations(5)
            .settings()
            .validate()
            .is_ok());
    }

    #[test]
    fn test_run_once_measures_loop() {
        let m = noop().run_once(10).unwrap();
        assert_eq!(m.iterations, 10);
    }

    #[test]
    fn test_body_error_is_named() {
        let mut b = Benchmark::new("BM_Fail", |_state| {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "setup broke"))
        });
        let err = b.run_once(1).unwrap_err();
        assert!(matches!(err, BenchError::Body { ref name, .. } if name == "BM_Fail"));
        assert!(err.to_string().contains("setup broke"));
    }

    #[test]
    fn test_skipped_loop_is_error() {
        let mut b = Benchmark::new("BM_Lazy", |_state| Ok::<_, BoxError>(()));
        assert!(matches!(b.run_once(1), Err(BenchError::LoopNotRun(_))));
    }
}
