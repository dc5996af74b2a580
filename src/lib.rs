//! # fileshift
//!
//! Convert files between formats in-process: images, documents, tabular
//! data and text.
//!
//! ## Supported conversions
//!
//! | Category | Source            | Targets                 |
//! |----------|-------------------|-------------------------|
//! | image    | png, jpg/jpeg, webp | the other two of png, jpg, webp |
//! | image    | bmp, gif          | none (recognised only)  |
//! | document | docx, doc         | pdf                     |
//! | document | pdf               | docx                    |
//! | data     | csv               | json                    |
//! | data     | json              | csv                     |
//! | text     | md, markdown      | txt                     |
//! | text     | txt               | md                      |
//!
//! Word → PDF renders pages to images, so the PDF text is not selectable.
//! PDF → Word extracts plain text, one paragraph per line.
//!
//! ## Pipeline Overview
//!
//! ```text
//! SourceFile (name + bytes)
//!  │
//!  ├─ 1. Classify   extension → Category
//!  ├─ 2. Targets    Category::legal_targets(extension)
//!  ├─ 3. Transcode  Category::transcode (CPU-heavy work on spawn_blocking)
//!  └─ 4. Output     ConversionResult (bytes + content type + file name)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fileshift::{available_targets, convert, ConversionConfig, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = SourceFile::from_path("report.docx").await?;
//!     let info = available_targets(&file).ok_or("unsupported file")?;
//!     let target = info.default_target().ok_or("no conversion available")?;
//!
//!     let result = convert(&file, target, &ConversionConfig::default()).await?;
//!     std::fs::write(result.file_name(), result.bytes())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileshift` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! fileshift = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod converters;
pub mod error;
pub mod format;
pub mod output;
pub mod progress;
pub mod source;
pub mod util;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, DocxOptions, Orientation, PageSize, RenderOptions,
};
pub use convert::{available_targets, content_type, convert, convert_sync, convert_to_file};
pub use error::{ConvertError, Result};
pub use format::{classify, Category};
pub use output::{ConversionResult, FormatInfo};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use source::SourceFile;
