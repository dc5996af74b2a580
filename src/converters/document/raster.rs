//! Page rasterisation: laid-out pages → JPEG-compressed page images.
//!
//! Each page is drawn on its own [`RenderSurface`], created right before
//! drawing and freed when the guard drops, whether encoding succeeds or not.
//! Only one page bitmap is alive at a time.

use super::fonts::FontSet;
use super::layout::{Drawable, PageLayout};
use crate::error::{ConvertError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use tiny_skia::{Color, IntSize, Paint, Pixmap, PixmapPaint, Rect, Transform};
use tracing::trace;

/// Text colour of the page stylesheet (#1a1a1a).
const INK: (u8, u8, u8) = (0x1a, 0x1a, 0x1a);

/// A white raster surface owned for the duration of one page render.
pub struct RenderSurface {
    pixmap: Pixmap,
    scale: f32,
}

impl RenderSurface {
    /// Allocate a `width` × `height` device-pixel surface filled with white.
    /// `scale` maps layout pixels to device pixels.
    pub fn acquire(width: u32, height: u32, scale: f32) -> Result<Self> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ConvertError::Internal(format!("cannot allocate {width}x{height} render surface"))
        })?;
        pixmap.fill(Color::WHITE);
        trace!("Acquired {}x{} render surface", width, height);
        Ok(Self { pixmap, scale })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Draw every item of `page`.
    pub fn draw(&mut self, page: &PageLayout, fonts: &FontSet) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(INK.0, INK.1, INK.2, 255);
        paint.anti_alias = true;

        for item in &page.items {
            match item {
                Drawable::Text {
                    x,
                    baseline,
                    size,
                    style,
                    text,
                    width,
                } => {
                    fonts.typeface(*style).draw(
                        &mut self.pixmap,
                        text,
                        *x,
                        *baseline,
                        *size,
                        self.scale,
                        &paint,
                    );
                    if style.underline {
                        self.underline(*x, *baseline, *width, *size, &paint);
                    }
                }
                Drawable::Image {
                    x,
                    y,
                    width,
                    height,
                    pixels,
                } => self.image(pixels, *x, *y, *width, *height),
            }
        }
    }

    fn underline(&mut self, x: f32, baseline: f32, width: f32, size: f32, paint: &Paint<'_>) {
        let s = self.scale;
        let thickness = (size / 16.0).max(1.0);
        if let Some(rect) =
            Rect::from_xywh(x * s, (baseline + 0.12 * size) * s, width * s, thickness * s)
        {
            self.pixmap.fill_rect(rect, paint, Transform::identity(), None);
        }
    }

    fn image(&mut self, pixels: &image::RgbaImage, x: f32, y: f32, width: f32, height: f32) {
        let s = self.scale;
        let (dw, dh) = (
            (width * s).round().max(1.0) as u32,
            (height * s).round().max(1.0) as u32,
        );
        let resized = image::imageops::resize(pixels, dw, dh, image::imageops::FilterType::Triangle);
        let Some(source) = premultiplied_pixmap(&resized) else {
            return;
        };
        self.pixmap.draw_pixmap(
            (x * s).round() as i32,
            (y * s).round() as i32,
            source.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Encode the surface as a baseline RGB JPEG.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        // The surface is opaque, so premultiplied RGB equals straight RGB.
        let rgb: Vec<u8> = self
            .pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        let img = RgbImage::from_raw(self.width(), self.height(), rgb)
            .ok_or_else(|| ConvertError::Internal("render surface size mismatch".into()))?;
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
            .map_err(|e| ConvertError::encode("jpeg", e))?;
        Ok(buf)
    }
}

impl Drop for RenderSurface {
    fn drop(&mut self) {
        trace!(
            "Released {}x{} render surface",
            self.pixmap.width(),
            self.pixmap.height()
        );
    }
}

fn premultiplied_pixmap(img: &image::RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let data = img
        .pixels()
        .flat_map(|p| {
            let [r, g, b, a] = p.0;
            let pm = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
            [pm(r), pm(g), pm(b), a]
        })
        .collect();
    Pixmap::from_vec(data, size)
}

/// Rasterise one page and return its JPEG bytes. The surface is released
/// before this returns, on success and on error alike.
pub fn render_page(
    page: &PageLayout,
    width: u32,
    height: u32,
    scale: f32,
    quality: u8,
    fonts: &FontSet,
) -> Result<Vec<u8>> {
    let mut surface = RenderSurface::acquire(width, height, scale)?;
    surface.draw(page, fonts);
    surface.encode_jpeg(quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::structure::RunStyle;
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    #[test]
    fn zero_sized_surface_is_rejected() {
        assert!(matches!(
            RenderSurface::acquire(0, 10, 1.0),
            Err(ConvertError::Internal(_))
        ));
    }

    #[test]
    fn blank_page_encodes_as_white_jpeg() {
        let jpeg = render_page(&PageLayout::default(), 64, 48, 1.0, 90, &FontSet::default())
            .unwrap();
        let img = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (64, 48));
        assert!(img.pixels().all(|p| p.0.iter().all(|&c| c > 245)));
    }

    #[test]
    fn text_and_images_leave_ink() {
        let page = PageLayout {
            items: vec![
                Drawable::Text {
                    x: 2.0,
                    baseline: 14.0,
                    size: 12.0,
                    style: RunStyle {
                        underline: true,
                        ..Default::default()
                    },
                    text: "ab".into(),
                    width: 14.4,
                },
                Drawable::Image {
                    x: 30.0,
                    y: 2.0,
                    width: 10.0,
                    height: 10.0,
                    pixels: Arc::new(RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))),
                },
            ],
        };
        let mut surface = RenderSurface::acquire(48, 24, 1.0).unwrap();
        surface.draw(&page, &FontSet::default());

        let data = surface.pixmap.data();
        let px = |x: usize, y: usize| &data[(y * 48 + x) * 4..(y * 48 + x) * 4 + 3];
        assert_eq!(px(35, 7), &[255, 0, 0]);
        let dark = data.chunks_exact(4).filter(|p| p[0] < 128 && p[1] < 128).count();
        assert!(dark > 0);
    }

    #[test]
    fn premultiplies_alpha() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, 128]));
        let pm = premultiplied_pixmap(&img).unwrap();
        let p = pm.pixels()[0];
        assert_eq!((p.red(), p.green(), p.alpha()), (100, 50, 128));
    }
}
