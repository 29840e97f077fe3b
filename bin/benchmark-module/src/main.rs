// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # benchmark-module
//!
//! Times one exported function of a bytecode module on a HAL device.
//!
//! ## Usage
//! ```bash
//! # Benchmark `add` on the reference CPU driver
//! benchmark-module --input_file testdata/simple_add.json --entry_function add \
//!     --inputs "2x2xi32=1 2 3 4,2x2xi32=5 6 7 8"
//!
//! # Same module on the worker-pool driver, JSON results
//! benchmark-module --config testdata/benchmark.toml --driver local-task \
//!     --benchmark_format json
//!
//! # List a module's exports and signatures
//! benchmark-module inspect testdata/simple_add.json
//!
//! # List known drivers
//! benchmark-module drivers
//! ```

mod commands;

use clap::{Parser, Subcommand};
use commands::run::RunArgs;

#[derive(Parser)]
#[command(
    name = "benchmark-module",
    about = "Benchmarks an exported function of a bytecode module on a HAL device",
    version,
    author,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Path to a TOML configuration file (CLI flags override its values).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List a module's exported functions with their ABI version and signatures.
    Inspect {
        /// Module file; defaults to `input_file` from `--config`.
        input_file: Option<std::path::PathBuf>,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the HAL drivers known to this build and whether they are available.
    Drivers,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        None => commands::run::execute(cli.run, cli.config),
        Some(Commands::Inspect { input_file, json }) => {
            commands::inspect::execute(input_file, cli.config, json)
        }
        Some(Commands::Drivers) => commands::drivers::execute(),
    }
}
