//! Error types for the fileshift library.
//!
//! A single error type, [`ConvertError`], covers every way a conversion can
//! fail. The first five variants are the conversion taxonomy callers usually
//! branch on:
//!
//! * [`ConvertError::Decode`]: the source bytes are not valid for the format
//!   their extension claims.
//! * [`ConvertError::UnsupportedConversion`]: the category is known but the
//!   extension → target pair is not implemented.
//! * [`ConvertError::UnsupportedFileType`]: the extension maps to no category.
//! * [`ConvertError::InvalidInput`]: the payload parsed but has the wrong
//!   shape (e.g. a JSON object where an array is required).
//! * [`ConvertError::UnsupportedTarget`]: the converter has no encoder for the
//!   requested target.
//!
//! The remaining variants are I/O and plumbing failures. None of them is
//! fatal to the process: a failure only affects the one conversion attempt,
//! and retrying simply re-runs the same side-effect-free computation.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the fileshift library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Conversion taxonomy ───────────────────────────────────────────────
    /// Source bytes could not be decoded as the claimed format.
    #[error("Could not decode {format} data: {detail}")]
    Decode { format: String, detail: String },

    /// The category is recognised but this extension → target pair is not.
    #[error("Unsupported conversion: {from} → {to}")]
    UnsupportedConversion { from: String, to: String },

    /// The extension does not belong to any category.
    #[error("Unsupported file type: .{extension}")]
    UnsupportedFileType { extension: String },

    /// The payload is structurally wrong for the requested conversion.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The target format has no encoder in this category.
    #[error("Unsupported target format: {target}")]
    UnsupportedTarget { target: String },

    // ── Encoding ──────────────────────────────────────────────────────────
    /// The target encoder rejected the decoded content.
    #[error("Failed to encode {format} output: {detail}")]
    Encode { format: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading the input failed for another reason.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub(crate) fn decode(format: impl Into<String>, detail: impl ToString) -> Self {
        ConvertError::Decode {
            format: format.into(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn encode(format: impl Into<String>, detail: impl ToString) -> Self {
        ConvertError::Encode {
            format: format.into(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn unsupported_conversion(from: &str, to: &str) -> Self {
        ConvertError::UnsupportedConversion {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// True for the errors that describe an impossible request rather than
    /// bad data or a broken environment.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            ConvertError::UnsupportedConversion { .. }
                | ConvertError::UnsupportedFileType { .. }
                | ConvertError::UnsupportedTarget { .. }
        )
    }
}

/// Crate-wide result alias.
pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_conversion_display() {
        let e = ConvertError::unsupported_conversion("bmp", "png");
        let msg = e.to_string();
        assert!(msg.contains("bmp"), "got: {msg}");
        assert!(msg.contains("png"), "got: {msg}");
    }

    #[test]
    fn unsupported_file_type_display() {
        let e = ConvertError::UnsupportedFileType {
            extension: "xyz".into(),
        };
        assert_eq!(e.to_string(), "Unsupported file type: .xyz");
    }

    #[test]
    fn invalid_input_display() {
        let e = ConvertError::InvalidInput("JSON must be an array of objects".into());
        assert!(e.to_string().contains("array of objects"));
    }

    #[test]
    fn decode_display_names_format() {
        let e = ConvertError::decode("image", "unexpected EOF");
        assert!(e.to_string().contains("image"));
        assert!(e.to_string().contains("unexpected EOF"));
    }

    #[test]
    fn unsupported_classification() {
        assert!(ConvertError::UnsupportedTarget { target: "gif".into() }.is_unsupported());
        assert!(ConvertError::unsupported_conversion("csv", "txt").is_unsupported());
        assert!(!ConvertError::InvalidInput("x".into()).is_unsupported());
        assert!(!ConvertError::decode("pdf", "bad xref").is_unsupported());
    }
}
