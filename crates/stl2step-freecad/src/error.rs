//! Unified error type for the FreeCAD backend.
//!
//! Discovery, scripting and process errors are consolidated into
//! `FreeCadError`, which maps onto `stl2step_core::AppError`.

use std::path::PathBuf;
use std::time::Duration;

use stl2step_core::error::{AppError, ErrorKind};
use thiserror::Error;

use crate::discovery::DiscoveryError;

/// Unified error type for all FreeCAD backend operations.
#[derive(Debug, Error)]
pub enum FreeCadError {
    /// No usable `freecadcmd` could be located.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// `freecadcmd` is not present at the resolved path.
    #[error("freecadcmd not found: {path}")]
    ExecutableNotFound {
        /// The path that doesn't exist.
        path: PathBuf,
    },

    /// The conversion script raised inside FreeCAD.
    #[error("{message}")]
    ScriptFailed {
        /// The Python exception message.
        message: String,
    },

    /// The interpreter exited with a non-zero status.
    #[error("freecadcmd exited with code {code}: {stderr}")]
    ProcessFailed {
        /// The exit code.
        code: i32,
        /// Captured stderr output.
        stderr: String,
        /// Captured stdout output.
        stdout: String,
    },

    /// The interpreter was terminated by a signal.
    #[error("freecadcmd was killed (signal termination)")]
    ProcessKilled,

    /// The interpreter did not finish in time.
    #[error("freecadcmd timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The script finished without writing its status file.
    #[error("Conversion script did not report a status (expected {path})")]
    MissingStatus {
        /// Expected status file path.
        path: PathBuf,
    },

    /// The status file could not be parsed.
    #[error("Malformed conversion status: {0}")]
    InvalidStatus(#[from] serde_json::Error),

    /// Output file was not created although the script reported success.
    #[error("Output file not created: {path}")]
    OutputNotCreated {
        /// Expected output path.
        path: PathBuf,
    },

    /// Output file is smaller than the configured minimum.
    #[error("Output file is too small ({size} bytes): {path}")]
    OutputTooSmall {
        /// Path to the output file.
        path: PathBuf,
        /// Actual size in bytes.
        size: u64,
    },

    /// Path contains invalid UTF-8 and cannot be passed to the interpreter.
    #[error("Path is not valid UTF-8: {path}")]
    InvalidUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FreeCadError> for AppError {
    fn from(err: FreeCadError) -> Self {
        let kind = match &err {
            FreeCadError::Discovery(_) | FreeCadError::ExecutableNotFound { .. } => {
                ErrorKind::NotFound
            }
            FreeCadError::ScriptFailed { .. }
            | FreeCadError::OutputNotCreated { .. }
            | FreeCadError::OutputTooSmall { .. } => ErrorKind::Conversion,
            FreeCadError::ProcessFailed { .. }
            | FreeCadError::ProcessKilled
            | FreeCadError::MissingStatus { .. } => ErrorKind::ExternalService,
            FreeCadError::Timeout { .. } => ErrorKind::Timeout,
            FreeCadError::InvalidStatus(_) => ErrorKind::Serialization,
            FreeCadError::InvalidUtf8Path { .. } => ErrorKind::Validation,
            FreeCadError::Io(_) => ErrorKind::Storage,
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}
