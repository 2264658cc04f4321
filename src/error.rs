//! Structured error handling and exit codes.

use serde::Serialize;

use crate::registration::ValidationErrors;
use crate::scanner::AcquisitionError;

/// Exit codes for the rollcall application.
///
/// - 0: Success
/// - 1: General error (network, I/O, configuration)
/// - 2: Camera acquisition failed
/// - 3: Registration form failed validation
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// The camera could not be acquired.
    CameraUnavailable = 2,
    /// A registration form was rejected before submission.
    InvalidInput = 3,
    /// Interrupted: the command was interrupted by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RC000",
            Self::GeneralError => "RC001",
            Self::CameraUnavailable => "RC002",
            Self::InvalidInput => "RC003",
            Self::Interrupted => "RC130",
        }
    }

    /// Pick the exit code for an error that reached `main`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<AcquisitionError>().is_some() {
            Self::CameraUnavailable
        } else if err.downcast_ref::<ValidationErrors>().is_some() {
            Self::InvalidInput
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "RC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
