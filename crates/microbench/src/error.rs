// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the benchmark runner.

/// Errors that can occur while running or reporting benchmarks.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// The benchmark body returned an error.
    #[error("benchmark '{name}' failed: {source}")]
    Body {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The body returned without driving the iteration loop.
    #[error("benchmark '{0}' never ran its timed loop")]
    LoopNotRun(String),

    /// A setting is out of range.
    #[error("invalid benchmark setting: {0}")]
    InvalidSetting(String),

    /// Writing a report failed.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a JSON report failed.
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}
