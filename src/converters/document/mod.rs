//! Document conversion: Word → PDF and PDF → Word.
//!
//! ## Word → PDF
//!
//! ```text
//! .docx ──▶ docx_reader ──▶ [Block] ──▶ layout ──▶ [PageLayout]
//!                                                        │
//!            write_pdf ◀── [PageImage] ◀── render_page ◀─┘
//! ```
//!
//! The output is an image-only PDF: every page is a JPEG of the rendered
//! page, so text is not selectable.
//!
//! ## PDF → Word
//!
//! ```text
//! .pdf ──▶ pdf_text::extract_pages ──▶ build_paragraphs ──▶ write_docx
//! ```
//!
//! Both directions are CPU-bound and run inside `spawn_blocking`.

pub mod docx_reader;
pub mod docx_writer;
pub mod fonts;
pub mod layout;
pub mod pdf_encoding;
pub mod pdf_text;
pub mod pdf_writer;
pub mod raster;
pub mod structure;

use crate::config::{quality_percent, ConversionConfig};
use crate::error::{ConvertError, Result};
use crate::progress::ProgressCallback;
use fonts::FontSet;
use pdf_writer::PageImage;
use std::sync::Arc;
use tracing::{debug, info};

pub fn legal_targets(extension: &str) -> Vec<&'static str> {
    match extension {
        "docx" | "doc" => vec!["pdf"],
        "pdf" => vec!["docx"],
        _ => Vec::new(),
    }
}

/// Convert a document between Word and PDF.
pub async fn transcode(
    bytes: Arc<[u8]>,
    extension: &str,
    target: &str,
    config: &ConversionConfig,
) -> Result<Vec<u8>> {
    let direction = match (extension, target) {
        ("docx" | "doc", "pdf") => Direction::WordToPdf,
        ("pdf", "docx") => Direction::PdfToWord,
        _ => return Err(ConvertError::unsupported_conversion(extension, target)),
    };

    let config = config.clone();
    let input_len = bytes.len();
    let out = tokio::task::spawn_blocking(move || match direction {
        Direction::WordToPdf => docx_to_pdf(&bytes, &config),
        Direction::PdfToWord => pdf_to_docx(&bytes, &config),
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("document task panicked: {e}")))??;

    info!(
        "Converted {} → {} ({} → {} bytes)",
        extension,
        target,
        input_len,
        out.len()
    );
    Ok(out)
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    WordToPdf,
    PdfToWord,
}

/// Render a Word package to an image-only PDF.
pub fn docx_to_pdf(bytes: &[u8], config: &ConversionConfig) -> Result<Vec<u8>> {
    let options = &config.render;
    let blocks = docx_reader::read_docx(bytes)?;
    let fonts = FontSet::global();
    let pages = layout::layout(&blocks, options, fonts);
    let total = pages.len();
    debug!("Laid out {} blocks on {} pages", blocks.len(), total);
    notify(&config.progress_callback, |cb| cb.on_pages_known(total));

    let (width, height) = (options.canvas_width_px(), options.page_slice_height_px());
    let quality = quality_percent(options.jpeg_quality);
    let mut images = Vec::with_capacity(total);
    for (i, page) in pages.iter().enumerate() {
        let jpeg = raster::render_page(page, width, height, options.scale, quality, fonts)?;
        debug!("Page {}/{}: {} byte JPEG", i + 1, total, jpeg.len());
        images.push(PageImage {
            jpeg,
            width_px: width,
            height_px: height,
        });
        notify(&config.progress_callback, |cb| cb.on_page_complete(i + 1, total));
    }
    pdf_writer::write_pdf(&images, options)
}

/// Extract a PDF's text into a Word package, one paragraph per line.
pub fn pdf_to_docx(bytes: &[u8], config: &ConversionConfig) -> Result<Vec<u8>> {
    let pages = pdf_text::extract_pages(bytes, |page, total| {
        if page == 1 {
            notify(&config.progress_callback, |cb| cb.on_pages_known(total));
        }
        notify(&config.progress_callback, |cb| cb.on_page_complete(page, total));
    })?;
    let paragraphs = pdf_text::build_paragraphs(&pages);
    debug!("Extracted {} paragraphs from {} pages", paragraphs.len(), pages.len());
    docx_writer::write_docx(&paragraphs, &config.docx)
}

fn notify(callback: &Option<ProgressCallback>, event: impl FnOnce(&ProgressCallback)) {
    if let Some(cb) = callback {
        event(cb);
    }
}
