// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # module-bench
//!
//! Measures the steady-state latency of one exported function of a
//! bytecode module running on a HAL device.
//!
//! The harness:
//! 1. assembles a [`Session`]: VM instance, program module, device, HAL
//!    module and a context ordered `[hal, program]`;
//! 2. resolves the entry function, checks its calling convention and
//!    materializes its inputs from text ([`materialize`]);
//! 3. makes one untimed warm-up call ([`Invocation::warm_up`]);
//! 4. makes timed calls under the [`microbench`] framework, each with a
//!    fresh output list, and verifies the inputs were left untouched.
//!
//! # Example
//! ```no_run
//! use module_bench::BenchmarkConfig;
//! use microbench::ConsoleReporter;
//!
//! let config = BenchmarkConfig {
//!     input_file: Some("testdata/simple_add.json".into()),
//!     entry_function: "add".into(),
//!     inputs: vec!["2x2xi32=1 2 3 4".into(), "2x2xi32=5 6 7 8".into()],
//!     ..Default::default()
//! };
//! let mut reporter = ConsoleReporter::new(std::io::stdout());
//! module_bench::run(&config, &mut reporter)?;
//! # Ok::<(), module_bench::BenchmarkError>(())
//! ```

pub mod assembler;
mod config;
mod driver;
mod error;
pub mod inspect;
pub mod invocation;
pub mod materialize;
pub mod signature;

pub use assembler::Session;
pub use config::BenchmarkConfig;
pub use driver::{module_benchmark, run, run_module, BENCHMARK_NAME};
pub use error::{BenchmarkError, ResultExt, StatusCode};
pub use inspect::{inspect_module, ExportInfo, ModuleInfo};
pub use invocation::{input_checksum, Cold, Invocation, InvocationState, Warm};
pub use signature::Descriptor;
