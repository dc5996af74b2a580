//! Per-category converters and the dispatch over them.
//!
//! Each category module exposes the same pair of functions:
//! `legal_targets(extension)` and `transcode(bytes, extension, target, ..)`.
//! Data and text work on small in-memory strings and run inline; image and
//! document work is CPU-heavy and is moved onto the blocking pool.

pub mod data;
pub mod document;
pub mod image;
pub mod text;

use crate::config::ConversionConfig;
use crate::error::Result;
use crate::format::Category;
use std::borrow::Cow;
use std::sync::Arc;

/// Decode input text as UTF-8 (lossily), dropping one leading byte-order mark.
pub(crate) fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(s) => Cow::Borrowed(s.strip_prefix('\u{FEFF}').unwrap_or(s)),
        Cow::Owned(s) => match s.strip_prefix('\u{FEFF}') {
            Some(rest) => Cow::Owned(rest.to_string()),
            None => Cow::Owned(s),
        },
    }
}

impl Category {
    /// Targets this category can produce from `extension`, default first.
    pub fn legal_targets(&self, extension: &str) -> Vec<&'static str> {
        match self {
            Category::Image => image::legal_targets(extension),
            Category::Document => document::legal_targets(extension),
            Category::Data => data::legal_targets(extension),
            Category::Text => text::legal_targets(extension),
        }
    }

    /// Convert `bytes` (a file with `extension`) to `target`.
    pub async fn transcode(
        &self,
        bytes: Arc<[u8]>,
        extension: &str,
        target: &str,
        config: &ConversionConfig,
    ) -> Result<Vec<u8>> {
        match self {
            Category::Image => image::transcode(bytes, extension, target, config).await,
            Category::Document => document::transcode(bytes, extension, target, config).await,
            Category::Data => data::transcode(&bytes, extension, target),
            Category::Text => text::transcode(&bytes, extension, target),
        }
    }
}
