//! Source files: the bytes a conversion reads, plus the declared name.
//!
//! A [`SourceFile`] is immutable once created. Converters borrow its bytes
//! and never mutate them; the caller owns it for as long as the file stays
//! selected.

use crate::error::ConvertError;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// An accepted input file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    bytes: Arc<[u8]>,
    size: u64,
}

impl SourceFile {
    /// Wrap an in-memory buffer. The declared size is the buffer length.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let size = bytes.len() as u64;
        Self {
            name: name.into(),
            bytes: bytes.into(),
            size,
        }
    }

    /// Override the declared size (e.g. when the caller got it from a
    /// file picker rather than from the buffer).
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Read a whole file from disk. The file name becomes the declared name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ConvertError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap shared handle on the bytes, for moving into blocking tasks.
    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lower-cased suffix after the last `.`; empty when the name has none.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

/// Lower-cased suffix of `name` after its last `.`, or `""`.
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}
