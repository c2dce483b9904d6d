//! Unified application error types for stl2step.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested file or executable was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// A filesystem I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// The external CAD process misbehaved (crashed, non-zero exit).
    ExternalService,
    /// The CAD kernel rejected the mesh or failed to build a solid.
    Conversion,
    /// The external CAD process did not finish in time.
    Timeout,
}

impl ErrorKind {
    /// Stable upper-case code, as shown in error messages.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::Storage => "STORAGE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::ExternalService => "EXTERNAL_SERVICE",
            Self::Conversion => "CONVERSION",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The unified application error used throughout stl2step.
///
/// Crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conversion, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Whether this error came from a timed-out external process.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Invalid configuration: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::conversion("mesh has no facets");
        assert_eq!(err.to_string(), "CONVERSION: mesh has no facets");
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AppError = io.into();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.message.contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("boom");
        let err: AppError = io.into();
        let cloned = err.clone();
        assert_eq!(cloned.kind, err.kind);
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_is_timeout() {
        assert!(AppError::timeout("slow").is_timeout());
        assert!(!AppError::conversion("bad").is_timeout());
    }
}
