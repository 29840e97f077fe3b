// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the benchmark harness.
//!
//! Every failure maps to a [`StatusCode`]. Errors raised by collaborator
//! crates keep their source and are classified on demand by
//! [`BenchmarkError::code`]. Setup steps wrap their failures with
//! [`ResultExt::context`] so the diagnostic names the step:
//!
//! ```text
//! creating device: HAL error: driver 'vlk' not found (known drivers: vmla, local-task, ...)
//! ```

use hal::HalError;
use microbench::BenchError;
use tensor_core::TensorError;
use vm::VmError;
use vm_bytecode::BytecodeError;

/// Status classification of a [`BenchmarkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    InvalidArgument,
    NotFound,
    Unavailable,
    Unimplemented,
    FailedPrecondition,
    ResourceExhausted,
    Internal,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::Unavailable => "UNAVAILABLE",
            StatusCode::Unimplemented => "UNIMPLEMENTED",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            StatusCode::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while assembling or running a benchmark.
#[derive(Debug, thiserror::Error)]
pub enum BenchmarkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("unimplemented: {0}")]
    Unimplemented(String),

    /// Raised when invocation mutated the shared input list.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("VM error: {0}")]
    Vm(#[from] VmError),

    #[error("HAL error: {0}")]
    Hal(#[from] HalError),

    #[error("bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),

    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("benchmark framework error: {0}")]
    Framework(#[from] BenchError),

    /// A failure annotated with the setup step that produced it.
    #[error("{step}: {source}")]
    Context {
        step: String,
        #[source]
        source: Box<BenchmarkError>,
    },
}

impl BenchmarkError {
    /// Classifies this error.
    pub fn code(&self) -> StatusCode {
        match self {
            BenchmarkError::InvalidArgument(_) => StatusCode::InvalidArgument,
            BenchmarkError::NotFound(_) => StatusCode::NotFound,
            BenchmarkError::Unavailable(_) => StatusCode::Unavailable,
            BenchmarkError::Unimplemented(_) => StatusCode::Unimplemented,
            BenchmarkError::FailedPrecondition(_) => StatusCode::FailedPrecondition,
            BenchmarkError::ResourceExhausted(_) => StatusCode::ResourceExhausted,
            BenchmarkError::Vm(e) => vm_code(e),
            BenchmarkError::Hal(e) => hal_code(e),
            BenchmarkError::Bytecode(_) | BenchmarkError::Tensor(_) => StatusCode::InvalidArgument,
            BenchmarkError::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => StatusCode::NotFound,
                _ => StatusCode::InvalidArgument,
            },
            BenchmarkError::Framework(e) => match e {
                BenchError::Body { source, .. } => source
                    .downcast_ref::<BenchmarkError>()
                    .map_or(StatusCode::Internal, BenchmarkError::code),
                BenchError::InvalidSetting(_) => StatusCode::InvalidArgument,
                _ => StatusCode::Internal,
            },
            BenchmarkError::Context { source, .. } => source.code(),
        }
    }

    /// The setup step this error was raised in, if any.
    pub fn step(&self) -> Option<&str> {
        match self {
            BenchmarkError::Context { step, .. } => Some(step),
            _ => None,
        }
    }
}

fn hal_code(e: &HalError) -> StatusCode {
    match e {
        HalError::OutOfMemory { .. } => StatusCode::ResourceExhausted,
        HalError::InvalidBudget(_) | HalError::Kernel(_) => StatusCode::InvalidArgument,
        HalError::DriverNotFound { .. } => StatusCode::NotFound,
        HalError::DriverUnavailable { .. } => StatusCode::Unavailable,
    }
}

fn vm_code(e: &VmError) -> StatusCode {
    match e {
        VmError::Bytecode(_)
        | VmError::TypeMismatch { .. }
        | VmError::ArityMismatch { .. }
        | VmError::DuplicateModule(_) => StatusCode::InvalidArgument,
        VmError::UnresolvedImport { .. }
        | VmError::FunctionNotFound { .. }
        | VmError::ModuleNotInContext(_) => StatusCode::NotFound,
        VmError::TypeConflict { .. } | VmError::UnregisteredType(_) => {
            StatusCode::FailedPrecondition
        }
        VmError::CallDepthExceeded(_) => StatusCode::ResourceExhausted,
        VmError::UninitializedRegister { .. } => StatusCode::Internal,
        VmError::Native { source, .. } => source
            .downcast_ref::<HalError>()
            .map_or(StatusCode::Internal, hal_code),
    }
}

/// Attaches the failing setup step to an error.
pub trait ResultExt<T> {
    fn context(self, step: impl Into<String>) -> Result<T, BenchmarkError>;

    fn with_context<F: FnOnce() -> String>(self, step: F) -> Result<T, BenchmarkError>;
}

impl<T, E: Into<BenchmarkError>> ResultExt<T> for Result<T, E> {
    fn context(self, step: impl Into<String>) -> Result<T, BenchmarkError> {
        self.map_err(|e| BenchmarkError::Context {
            step: step.into(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, step: F) -> Result<T, BenchmarkError> {
        self.map_err(|e| BenchmarkError::Context {
            step: step(),
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_classification() {
        let e: BenchmarkError = HalError::DriverNotFound {
            name: "vlk".into(),
            known: "vmla".into(),
        }
        .into();
        assert_eq!(e.code(), StatusCode::NotFound);

        let e: BenchmarkError = HalError::DriverUnavailable {
            name: "cuda".into(),
            reason: "not built".into(),
        }
        .into();
        assert_eq!(e.code(), StatusCode::Unavailable);
    }

    #[test]
    fn test_native_source_is_classified() {
        let e: BenchmarkError = VmError::Native {
            function: "hal.add".into(),
            source: Box::new(HalError::OutOfMemory {
                requested_bytes: 16,
                available_bytes: 0,
                budget_bytes: 0,
            }),
        }
        .into();
        assert_eq!(e.code(), StatusCode::ResourceExhausted);
    }

    #[test]
    fn test_io_classification() {
        let missing: BenchmarkError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(missing.code(), StatusCode::NotFound);
        let denied: BenchmarkError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no").into();
        assert_eq!(denied.code(), StatusCode::InvalidArgument);
    }

    #[test]
    fn test_context_keeps_code_and_names_step() {
        let r: Result<(), VmError> = Err(VmError::UnresolvedImport {
            module: "simple".into(),
            import: "hal.add".into(),
        });
        let e = r.context("creating context").unwrap_err();
        assert_eq!(e.code(), StatusCode::NotFound);
        assert_eq!(e.step(), Some("creating context"));
        assert!(e.to_string().starts_with("creating context: "));
    }

    #[test]
    fn test_framework_body_error_keeps_code() {
        let inner = BenchmarkError::Unimplemented("fv=2".into());
        let e: BenchmarkError = BenchError::Body {
            name: "BM_RunModule".into(),
            source: Box::new(inner),
        }
        .into();
        assert_eq!(e.code(), StatusCode::Unimplemented);
    }

    #[test]
    fn test_status_code_display() {
        assert_eq!(StatusCode::FailedPrecondition.to_string(), "FAILED_PRECONDITION");
    }
}
