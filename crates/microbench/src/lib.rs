// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # microbench
//!
//! A small iteration-driven benchmark framework.
//!
//! A [`Benchmark`] wraps a body closure that performs untimed setup and
//! then drives a timed loop through [`State`]. The [`Runner`] calls the
//! body with growing iteration budgets until one call lasts `min_time`,
//! repeats that `repetitions` times, and hands the per-iteration times to
//! a [`Reporter`].
//!
//! Wall time comes from [`std::time::Instant`]. CPU time is either the
//! calling thread's or, with [`Benchmark::measure_process_cpu_time`], the
//! whole process's (`getrusage`), which is what a multi-threaded backend
//! needs.
//!
//! # Example
//! ```
//! use microbench::{Benchmark, JsonReporter, Runner, TimeUnit};
//!
//! let mut runner = Runner::new();
//! runner.register(
//!     Benchmark::new("BM_Fill", |state| {
//!         let mut buf = vec![0u8; 4096];
//!         for i in state.iter() {
//!             buf.fill(i as u8);
//!         }
//!         Ok::<_, std::io::Error>(())
//!     })
//!     .iterations(100)
//!     .unit(TimeUnit::Microsecond),
//! );
//!
//! let mut reporter = JsonReporter::new(Vec::new());
//! let reports = runner.run(&mut reporter).unwrap();
//! assert_eq!(reports[0].iterations, 100);
//! ```

mod benchmark;
pub mod clock;
mod error;
mod report;
pub mod runner;
mod state;
pub mod stats;
mod unit;

pub use benchmark::{Benchmark, Measurement, Settings};
pub use clock::CpuClock;
pub use error::BenchError;
pub use report::{
    ConsoleReporter, JsonReporter, ReportContext, ReportFormat, Reporter, RunReport, RunType,
};
pub use runner::{run_benchmark, Runner};
pub use state::{Iterations, State};
pub use stats::Aggregate;
pub use unit::TimeUnit;
