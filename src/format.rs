//! Format classification: file extension → [`Category`].
//!
//! The extension is the only type signal; file contents are never sniffed.
//! Four static, disjoint membership tables decide the category.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];
pub const DOCUMENT_EXTENSIONS: &[&str] = &["docx", "doc", "pdf"];
pub const DATA_EXTENSIONS: &[&str] = &["csv", "json"];
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// The closed set of conversion categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Document,
    Data,
    Text,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Image,
        Category::Document,
        Category::Data,
        Category::Text,
    ];

    /// Extensions belonging to this category.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Image => IMAGE_EXTENSIONS,
            Category::Document => DOCUMENT_EXTENSIONS,
            Category::Data => DATA_EXTENSIONS,
            Category::Text => TEXT_EXTENSIONS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Document => "document",
            Category::Data => "data",
            Category::Text => "text",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a lower-cased extension to its category, or `None` when unsupported.
///
/// Lookup is case-sensitive: callers lower-case first.
pub fn classify(extension: &str) -> Option<Category> {
    Category::ALL
        .into_iter()
        .find(|c| c.extensions().contains(&extension))
}
