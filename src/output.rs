//! Conversion outputs: the target listing and the produced blob.

use crate::format::Category;
use serde::{Deserialize, Serialize};

/// Legal targets for one source file, and the category that produced them.
///
/// The first target is the default selection. An empty list means the file
/// type is recognised but no conversion exists for it (e.g. `.bmp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub targets: Vec<String>,
    pub category: Category,
}

impl FormatInfo {
    /// The preselected target, if any.
    pub fn default_target(&self) -> Option<&str> {
        self.targets.first().map(String::as_str)
    }

    pub fn is_convertible(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn supports(&self, target: &str) -> bool {
        self.targets.iter().any(|t| t == target)
    }
}

/// The blob produced by one conversion.
///
/// Ownership passes to the caller, who decides whether to keep it (write it
/// out, offer it for download) or drop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    bytes: Vec<u8>,
    content_type: &'static str,
    target: String,
    file_name: String,
}

impl ConversionResult {
    pub(crate) fn new(
        bytes: Vec<u8>,
        content_type: &'static str,
        target: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            content_type,
            target: target.into(),
            file_name: file_name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// MIME type of the blob, e.g. `image/png`.
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Target extension the blob was encoded as.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Suggested download name: the source name with its extension replaced.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
