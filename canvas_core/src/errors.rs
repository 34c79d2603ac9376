//! # Error Types
//!
//! Structured error types for canvas_core. Every variant carries enough
//! context to be shown to the user as-is and to be handled programmatically
//! through [`CanvasError::error_code`].
//!
//! Navigation to an unregistered module is deliberately *not* an error: the
//! shell records the unknown selection and renders an empty panel. Only
//! explicit lookups (CLI arguments, project files) produce
//! [`CanvasError::UnknownModule`].
//!
//! ## Example
//!
//! ```rust
//! use canvas_core::errors::{CanvasError, CanvasResult};
//!
//! fn validate_span(span_mm: f64) -> CanvasResult<()> {
//!     if span_mm <= 0.0 {
//!         return Err(CanvasError::invalid_parameter(
//!             "lintel",
//!             "span",
//!             span_mm.to_string(),
//!             "Span must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for canvas_core operations
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Structured error type for design, export and file operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CanvasError {
    /// A parameter value is non-numeric, out of range, or inconsistent with
    /// another parameter
    #[error("Invalid value for '{field}' in {module}: {value} - {reason}")]
    InvalidParameter {
        module: String,
        field: String,
        value: String,
        reason: String,
    },

    /// The parameter name is not part of the module's schema
    #[error("Unknown parameter '{field}' for module {module}")]
    UnknownParameter { module: String, field: String },

    /// A parameter required by a design generator could not be resolved
    #[error("Missing required parameter: {field}")]
    MissingParameter { field: String },

    /// Explicit lookup of a module id that is not registered
    #[error("Unknown module: {id}")]
    UnknownModule { id: String },

    /// The design generator could not produce geometry from the parameters
    #[error("Cannot draw {module}: {reason}")]
    RenderFailed { module: String, reason: String },

    /// Export requested before any parameters were entered
    #[error("Nothing to export: {module} has no parameters entered")]
    NothingToExport { module: String },

    /// DXF, SVG or PDF generation failed
    #[error("{format} export failed: {reason}")]
    ExportFailed { format: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CanvasError {
    /// Create an InvalidParameter error
    pub fn invalid_parameter(
        module: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CanvasError::InvalidParameter {
            module: module.into(),
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownParameter error
    pub fn unknown_parameter(module: impl Into<String>, field: impl Into<String>) -> Self {
        CanvasError::UnknownParameter {
            module: module.into(),
            field: field.into(),
        }
    }

    /// Create a MissingParameter error
    pub fn missing_parameter(field: impl Into<String>) -> Self {
        CanvasError::MissingParameter {
            field: field.into(),
        }
    }

    /// Create an UnknownModule error
    pub fn unknown_module(id: impl Into<String>) -> Self {
        CanvasError::UnknownModule { id: id.into() }
    }

    /// Create a RenderFailed error
    pub fn render_failed(module: impl Into<String>, reason: impl Into<String>) -> Self {
        CanvasError::RenderFailed {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Create a NothingToExport error
    pub fn nothing_to_export(module: impl Into<String>) -> Self {
        CanvasError::NothingToExport {
            module: module.into(),
        }
    }

    /// Create an ExportFailed error
    pub fn export_failed(format: impl Into<String>, reason: impl Into<String>) -> Self {
        CanvasError::ExportFailed {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CanvasError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the user can fix this by editing parameters or retrying.
    ///
    /// Recoverable errors leave the shell and the active session untouched;
    /// the GUI shows them inline and keeps running.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            CanvasError::MissingParameter { .. } | CanvasError::Internal { .. }
        )
    }

    /// Whether this error concerns a parameter value the user typed
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            CanvasError::InvalidParameter { .. } | CanvasError::UnknownParameter { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CanvasError::InvalidParameter { .. } => "INVALID_PARAMETER",
            CanvasError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            CanvasError::MissingParameter { .. } => "MISSING_PARAMETER",
            CanvasError::UnknownModule { .. } => "UNKNOWN_MODULE",
            CanvasError::RenderFailed { .. } => "RENDER_FAILED",
            CanvasError::NothingToExport { .. } => "NOTHING_TO_EXPORT",
            CanvasError::ExportFailed { .. } => "EXPORT_FAILED",
            CanvasError::FileError { .. } => "FILE_ERROR",
            CanvasError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CanvasError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CanvasError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CanvasError {
    fn from(e: serde_json::Error) -> Self {
        CanvasError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CanvasError::invalid_parameter("lintel", "span", "-5", "Span must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidParameter\""));
        let roundtrip: CanvasError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CanvasError::missing_parameter("x").error_code(), "MISSING_PARAMETER");
        assert_eq!(CanvasError::nothing_to_export("sunshed").error_code(), "NOTHING_TO_EXPORT");
        assert_eq!(CanvasError::export_failed("PDF", "boom").error_code(), "EXPORT_FAILED");
    }

    #[test]
    fn test_user_facing_errors_are_recoverable() {
        assert!(CanvasError::invalid_parameter("bridge", "nspan", "0", "must be > 0").is_recoverable());
        assert!(CanvasError::render_failed("staircase", "waist too thin").is_recoverable());
        assert!(CanvasError::export_failed("DXF", "disk full").is_recoverable());
        assert!(!CanvasError::Internal { message: "bug".into() }.is_recoverable());
    }

    #[test]
    fn test_parameter_errors_are_distinct_from_export_errors() {
        assert!(CanvasError::unknown_parameter("lintel", "colour").is_parameter_error());
        assert!(!CanvasError::export_failed("PDF", "typst").is_parameter_error());
        assert!(!CanvasError::nothing_to_export("lintel").is_parameter_error());
    }

    #[test]
    fn test_display_includes_context() {
        let msg = CanvasError::invalid_parameter("bridge", "rtl", "100", "must exceed soffit").to_string();
        assert!(msg.contains("rtl"));
        assert!(msg.contains("bridge"));
        assert!(msg.contains("must exceed soffit"));
    }
}
