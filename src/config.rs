//! Configuration types for file conversion.
//!
//! Every tunable constant of the converters lives in [`ConversionConfig`],
//! built via [`ConversionConfigBuilder`]. Defaults: JPEG quality 0.92 for
//! images, and an 800 px page container rasterised at 2× into A4 portrait
//! pages with 10 mm margins and JPEG quality 0.98 for documents.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for a single conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use fileshift::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .image_quality(0.8)
///     .docx_font("Arial")
///     .build()
///     .unwrap();
/// assert_eq!(config.docx.font, "Arial");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Quality used by lossy image encoders, 0.0–1.0. Default: 0.92.
    pub image_quality: f32,

    /// Page rendering options for docx → pdf.
    pub render: RenderOptions,

    /// Paragraph styling for pdf → docx.
    pub docx: DocxOptions,

    /// Optional callback receiving page-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            image_quality: 0.92,
            render: RenderOptions::default(),
            docx: DocxOptions::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("image_quality", &self.image_quality)
            .field("render", &self.render)
            .field("docx", &self.docx)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Lossy encoder quality on the 1–100 scale the codecs expect.
    pub(crate) fn image_quality_percent(&self) -> u8 {
        quality_percent(self.image_quality)
    }
}

pub(crate) fn quality_percent(q: f32) -> u8 {
    (q * 100.0).round().clamp(1.0, 100.0) as u8
}

/// How document pages are laid out and rasterised (docx → pdf).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Width of the layout container in CSS pixels. Default: 800.
    pub container_width_px: f32,
    /// Inner padding of the container in CSS pixels. Default: 40.
    pub padding_px: f32,
    /// Body font size in CSS pixels (12 pt). Default: 16.
    pub font_size_px: f32,
    /// Line height as a multiple of the font size. Default: 1.6.
    pub line_height: f32,
    /// Device pixels per CSS pixel when rasterising. Default: 2.0.
    pub scale: f32,
    /// JPEG quality of the page images embedded in the PDF. Default: 0.98.
    pub jpeg_quality: f32,
    /// Page margin on every side, in millimetres. Default: 10.
    pub margin_mm: f32,
    /// Paper size. Default: A4.
    pub page_size: PageSize,
    /// Page orientation. Default: portrait.
    pub orientation: Orientation,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            container_width_px: 800.0,
            padding_px: 40.0,
            font_size_px: 16.0,
            line_height: 1.6,
            scale: 2.0,
            jpeg_quality: 0.98,
            margin_mm: 10.0,
            page_size: PageSize::default(),
            orientation: Orientation::default(),
        }
    }
}

impl RenderOptions {
    /// Page dimensions in millimetres, after applying the orientation.
    pub fn page_dimensions_mm(&self) -> (f32, f32) {
        let (w, h) = self.page_size.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Width of the rendered canvas in device pixels.
    pub fn canvas_width_px(&self) -> u32 {
        (self.container_width_px * self.scale).round() as u32
    }

    /// Height of one page slice in device pixels.
    ///
    /// The canvas width is mapped onto the printable width of the page, so
    /// the printable height converts to pixels with the same ratio.
    pub fn page_slice_height_px(&self) -> u32 {
        let (w, h) = self.page_dimensions_mm();
        let inner_w = w - 2.0 * self.margin_mm;
        let inner_h = h - 2.0 * self.margin_mm;
        ((self.canvas_width_px() as f32) * inner_h / inner_w).floor() as u32
    }
}

/// Paper sizes supported by the PDF writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 210 × 297 mm (default).
    #[default]
    A4,
    /// 215.9 × 279.4 mm.
    Letter,
}

impl PageSize {
    /// Portrait dimensions in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Styling of the paragraphs written by pdf → docx.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocxOptions {
    /// Run font family. Default: "Calibri".
    pub font: String,
    /// Run size in half-points (24 = 12 pt). Default: 24.
    pub font_size_half_points: u32,
}

impl Default for DocxOptions {
    fn default() -> Self {
        Self {
            font: "Calibri".to_string(),
            font_size_half_points: 24,
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn image_quality(mut self, q: f32) -> Self {
        self.config.image_quality = q;
        self
    }

    pub fn render(mut self, options: RenderOptions) -> Self {
        self.config.render = options;
        self
    }

    pub fn jpeg_page_quality(mut self, q: f32) -> Self {
        self.config.render.jpeg_quality = q;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render.scale = scale;
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.render.page_size = size;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.config.render.orientation = orientation;
        self
    }

    pub fn margin_mm(mut self, mm: f32) -> Self {
        self.config.render.margin_mm = mm;
        self
    }

    pub fn docx_font(mut self, font: impl Into<String>) -> Self {
        self.config.docx.font = font.into();
        self
    }

    pub fn docx_font_size_half_points(mut self, size: u32) -> Self {
        self.config.docx.font_size_half_points = size;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.image_quality) || c.image_quality == 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "image quality must be in (0, 1], got {}",
                c.image_quality
            )));
        }
        let r = &c.render;
        if !(0.0..=1.0).contains(&r.jpeg_quality) || r.jpeg_quality == 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "page JPEG quality must be in (0, 1], got {}",
                r.jpeg_quality
            )));
        }
        if !(0.5..=4.0).contains(&r.scale) {
            return Err(ConvertError::InvalidConfig(format!(
                "render scale must be 0.5–4, got {}",
                r.scale
            )));
        }
        if r.container_width_px <= 2.0 * r.padding_px || r.font_size_px <= 0.0 {
            return Err(ConvertError::InvalidConfig(
                "container must be wider than its padding and font size positive".into(),
            ));
        }
        let (w, h) = r.page_dimensions_mm();
        if r.margin_mm < 0.0 || 2.0 * r.margin_mm >= w.min(h) {
            return Err(ConvertError::InvalidConfig(format!(
                "margin {} mm leaves no printable area",
                r.margin_mm
            )));
        }
        if c.docx.font.trim().is_empty() || c.docx.font_size_half_points == 0 {
            return Err(ConvertError::InvalidConfig(
                "docx font and size must be set".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let c = ConversionConfig::default();
        assert_eq!(c.image_quality_percent(), 92);
        assert_eq!(quality_percent(c.render.jpeg_quality), 98);
        assert_eq!(c.render.canvas_width_px(), 1600);
        assert_eq!(c.render.page_dimensions_mm(), (210.0, 297.0));
        assert_eq!(c.docx.font, "Calibri");
        assert_eq!(c.docx.font_size_half_points, 24);
    }

    #[test]
    fn page_slice_follows_printable_ratio() {
        let r = RenderOptions::default();
        // 1600 px over 190 mm → 277 mm is 2332 px
        assert_eq!(r.page_slice_height_px(), 2332);
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let r = RenderOptions {
            orientation: Orientation::Landscape,
            ..Default::default()
        };
        assert_eq!(r.page_dimensions_mm(), (297.0, 210.0));
        assert!(r.page_slice_height_px() < r.canvas_width_px());
    }

    #[test]
    fn builder_rejects_bad_quality() {
        assert!(ConversionConfig::builder().image_quality(0.0).build().is_err());
        assert!(ConversionConfig::builder().image_quality(1.5).build().is_err());
        assert!(ConversionConfig::builder().image_quality(1.0).build().is_ok());
    }

    #[test]
    fn builder_rejects_oversized_margin() {
        let err = ConversionConfig::builder().margin_mm(120.0).build();
        assert!(matches!(err, Err(ConvertError::InvalidConfig(_))));
    }

    #[test]
    fn builder_sets_fields() {
        let c = ConversionConfig::builder()
            .render_scale(1.0)
            .page_size(PageSize::Letter)
            .docx_font_size_half_points(22)
            .build()
            .unwrap();
        assert_eq!(c.render.canvas_width_px(), 800);
        assert_eq!(c.render.page_size, PageSize::Letter);
        assert_eq!(c.docx.font_size_half_points, 22);
    }

    #[test]
    fn render_options_serialise() {
        let json = serde_json::to_string(&RenderOptions::default()).unwrap();
        let back: RenderOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RenderOptions::default());
    }
}
