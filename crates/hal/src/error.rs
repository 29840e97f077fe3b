// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the hardware abstraction layer.

use tensor_core::TensorError;

/// Errors that can occur while creating devices, allocating device memory
/// or running kernels.
#[derive(Debug, thiserror::Error)]
pub enum HalError {
    /// The requested allocation would exceed the device memory budget.
    #[error("out of device memory: requested {requested_bytes} bytes, but only {available_bytes} available (budget: {budget_bytes})")]
    OutOfMemory {
        requested_bytes: usize,
        available_bytes: usize,
        budget_bytes: usize,
    },

    /// A memory budget string could not be parsed.
    #[error("invalid memory budget '{0}': expected a number followed by an optional suffix (K, M, G)")]
    InvalidBudget(String),

    /// No driver is registered under this name.
    #[error("driver '{name}' not found (known drivers: {known})")]
    DriverNotFound { name: String, known: String },

    /// The driver is known but cannot create a device in this process.
    #[error("driver '{name}' is unavailable: {reason}")]
    DriverUnavailable { name: String, reason: String },

    /// A kernel rejected its operands.
    #[error(transparent)]
    Kernel(#[from] TensorError),
}
