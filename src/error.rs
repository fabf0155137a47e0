//! Error types for the transpiler.
//!
//! This module defines the structured error decoded from LibSass's JSON error
//! payload, error codes for metrics, and the main error type returned by
//! transpilation.

use serde::{Deserialize, Serialize};

/// Message used when the native error payload cannot be decoded
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Error codes for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Invalid options
    Configuration,
    /// The native compiler reported an error
    Compilation,
    /// Source text cannot be handed to the native engine
    InvalidInput,
    /// The native engine failed to allocate a resource
    NativeResource,
    /// A session was driven out of order
    InvalidState,
    /// Reading the source or writing the CSS failed
    Io,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Configuration => write!(f, "CONFIGURATION"),
            ErrorCode::Compilation => write!(f, "COMPILATION"),
            ErrorCode::InvalidInput => write!(f, "INVALID_INPUT"),
            ErrorCode::NativeResource => write!(f, "NATIVE_RESOURCE"),
            ErrorCode::InvalidState => write!(f, "INVALID_STATE"),
            ErrorCode::Io => write!(f, "IO"),
        }
    }
}

/// A compilation error reported by LibSass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SassError {
    /// Native error status (non-zero)
    #[serde(default)]
    pub status: i32,
    /// Column number (1-indexed)
    #[serde(default)]
    pub column: u32,
    /// File the error originated in (`stdin` for the main source)
    #[serde(default)]
    pub file: String,
    /// Line number (1-indexed)
    #[serde(default)]
    pub line: u32,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

impl SassError {
    /// Decode an error from LibSass's JSON payload.
    ///
    /// Never fails: a malformed payload produces [`UNKNOWN_ERROR_MESSAGE`].
    pub fn from_json(json: &str) -> Self {
        Self::from_json_with_status(json, 0)
    }

    /// Decode an error, using `status` when the payload does not carry one.
    pub fn from_json_with_status(json: &str, status: i32) -> Self {
        let mut error = match serde_json::from_str::<SassError>(json) {
            Ok(error) => error,
            Err(e) => {
                tracing::debug!(error = %e, "Malformed native error payload");
                SassError::default()
            }
        };

        if error.status == 0 {
            error.status = status;
        }
        if error.message.is_empty() {
            error.message = UNKNOWN_ERROR_MESSAGE.to_string();
        }
        error
    }
}

impl std::fmt::Display for SassError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "file {:?}, line {}, col {}: {} ",
            self.file, self.line, self.column, self.message
        )
    }
}

impl std::error::Error for SassError {}

/// Main error type for transpilation
#[derive(Debug, thiserror::Error)]
pub enum TranspileError {
    /// Compilation error reported by LibSass
    #[error(transparent)]
    Sass(#[from] SassError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Input that cannot cross the native boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Native allocation failure
    #[error("Native resource error: {0}")]
    NativeResource(String),

    /// Invalid session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranspileError {
    /// The error code used for metrics
    pub fn code(&self) -> ErrorCode {
        match self {
            TranspileError::Sass(_) => ErrorCode::Compilation,
            TranspileError::Config(_) => ErrorCode::Configuration,
            TranspileError::InvalidInput(_) => ErrorCode::InvalidInput,
            TranspileError::NativeResource(_) => ErrorCode::NativeResource,
            TranspileError::InvalidState(_) => ErrorCode::InvalidState,
            TranspileError::Io(_) => ErrorCode::Io,
        }
    }

    /// The structured compilation error, if this is one
    pub fn sass_error(&self) -> Option<&SassError> {
        match self {
            TranspileError::Sass(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for transpilation
pub type Result<T> = std::result::Result<T, TranspileError>;

#[cfg(test)]
mod tests {
    use super::*;

    const UNDEFINED_VARIABLE: &str = r#"{"status":1,"column":14,"file":"stdin","line":3,"message":"Undefined variable: \"$blue\"."}"#;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::Compilation.to_string(), "COMPILATION");
        assert_eq!(ErrorCode::NativeResource.to_string(), "NATIVE_RESOURCE");
    }

    #[test]
    fn test_decode_error_json() {
        let err = SassError::from_json(UNDEFINED_VARIABLE);
        assert_eq!(err.status, 1);
        assert_eq!(err.column, 14);
        assert_eq!(err.file, "stdin");
        assert_eq!(err.line, 3);
        assert_eq!(err.message, "Undefined variable: \"$blue\".");
        assert_eq!(
            err.to_string(),
            "file \"stdin\", line 3, col 14: Undefined variable: \"$blue\". "
        );
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let json = r#"{"status":1,"file":"a.scss","line":1,"column":2,"message":"boom","formatted":"Error: boom"}"#;
        let err = SassError::from_json(json);
        assert_eq!(err.file, "a.scss");
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn test_decode_malformed_json() {
        let err = SassError::from_json("{ this is not json");
        assert_eq!(err.message, UNKNOWN_ERROR_MESSAGE);

        let err = SassError::from_json_with_status("", 3);
        assert_eq!(err.status, 3);
        assert_eq!(err.message, UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn test_decode_missing_message() {
        let err = SassError::from_json_with_status(r#"{"line":4}"#, 1);
        assert_eq!(err.status, 1);
        assert_eq!(err.line, 4);
        assert_eq!(err.message, UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn test_transpile_error_code() {
        let err = TranspileError::from(SassError::from_json(UNDEFINED_VARIABLE));
        assert_eq!(err.code(), ErrorCode::Compilation);
        assert_eq!(err.sass_error().map(|e| e.line), Some(3));
        assert!(err.to_string().starts_with("file \"stdin\""));

        let err = TranspileError::InvalidInput("NUL byte".into());
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert!(err.sass_error().is_none());
    }
}
