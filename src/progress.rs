//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events while a conversion runs. Only the document converter has
//! meaningful intermediate steps (one per rendered or extracted page); the
//! other categories report just start and completion.
//!
//! # Example
//!
//! ```rust
//! use fileshift::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {}/{}", page_num, total_pages);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     pages: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the converters as a conversion progresses.
///
/// Implementations must be `Send + Sync`: document work runs on the blocking
/// thread pool and calls back from there. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any work on the source bytes starts.
    ///
    /// # Arguments
    /// * `source_name`: declared name of the source file
    /// * `target`: target extension
    fn on_conversion_start(&self, source_name: &str, target: &str) {
        let _ = (source_name, target);
    }

    /// Called once the number of pages is known (document conversions only).
    fn on_pages_known(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after a page has been rendered or its text extracted.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: total pages in the document
    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once with the size of the produced blob.
    fn on_conversion_complete(&self, output_len: usize) {
        let _ = output_len;
    }

    /// Called once when the conversion fails.
    fn on_conversion_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
