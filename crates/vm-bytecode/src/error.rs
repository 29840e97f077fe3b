// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for module decoding and verification.

/// Errors that can occur when reading or verifying a module.
#[derive(Debug, thiserror::Error)]
pub enum BytecodeError {
    /// The module file could not be read.
    #[error("failed to read module: {0}")]
    Read(#[from] std::io::Error),

    /// The module bytes are not a well-formed module document.
    #[error("malformed module: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The byte buffer is empty.
    #[error("module contents are empty")]
    Empty,

    /// A module-level structural check failed.
    #[error("invalid module '{module}': {detail}")]
    InvalidModule { module: String, detail: String },

    /// A function failed verification.
    #[error("invalid function '{function}': {detail}")]
    InvalidFunction { function: String, detail: String },
}
