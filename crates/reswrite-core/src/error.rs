//! Error types and error code constants for reswrite.
//!
//! This module provides a unified error type (`ReswriteError`) that bridges
//! domain-specific errors from different subsystems (configuration, filters,
//! workspace loading, output) into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flags, bad or incomplete configuration)
//! - `3`: Resolution errors (solution or project file not found)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! Per-document failures, including failed writes, never reach this type:
//! the runner logs them and moves on to the next document. Only run-level
//! failures are converted.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::filter::FilterError;
use crate::workspace::WorkspaceError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad flags, missing configuration).
    InvalidArguments = 2,
    /// Resolution errors (solution or project not found).
    ResolutionError = 3,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum ReswriteError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Solution or project file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&ReswriteError> for OutputErrorCode {
    fn from(err: &ReswriteError) -> Self {
        match err {
            ReswriteError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            ReswriteError::Configuration { .. } => OutputErrorCode::InvalidArguments,
            ReswriteError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            ReswriteError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<ReswriteError> for OutputErrorCode {
    fn from(err: ReswriteError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<ConfigError> for ReswriteError {
    fn from(err: ConfigError) -> Self {
        ReswriteError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<FilterError> for ReswriteError {
    fn from(err: FilterError) -> Self {
        ReswriteError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<WorkspaceError> for ReswriteError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::NotFound { path } => ReswriteError::FileNotFound {
                path: path.display().to_string(),
            },
            WorkspaceError::UnsupportedFile { path } => ReswriteError::InvalidArguments {
                message: format!(
                    "'{}' is neither a .sln nor a .csproj file",
                    path.display()
                ),
            },
            WorkspaceError::Io { path, source } => ReswriteError::InternalError {
                message: format!("IO error reading {}: {}", path.display(), source),
            },
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl ReswriteError {
    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ReswriteError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
