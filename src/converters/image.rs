//! Raster re-encoding: png, jpeg, webp, bmp and gif in; png, jpg, webp out.
//!
//! Decoding and encoding are CPU-bound, so both run inside
//! `tokio::task::spawn_blocking` and the async runtime stays responsive
//! while large images are processed.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

/// Targets an image can be written as, in preselection order.
const ENCODABLE: [&str; 3] = ["png", "jpg", "webp"];

/// Extensions whose decoded pixels can be re-encoded. bmp and gif are
/// recognised as images but offer no target.
const REENCODABLE_SOURCES: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// `jpeg` and `jpg` are one format.
fn canonical(ext: &str) -> &str {
    if ext == "jpeg" {
        "jpg"
    } else {
        ext
    }
}

/// Every encodable format except the source's own.
///
/// An empty extension excludes nothing and gets all three.
pub fn legal_targets(extension: &str) -> Vec<&'static str> {
    if !extension.is_empty() && !REENCODABLE_SOURCES.contains(&extension) {
        return Vec::new();
    }
    let own = canonical(extension);
    ENCODABLE.into_iter().filter(|f| *f != own).collect()
}

/// Decode `bytes` and re-encode them as `target`.
///
/// Fails with [`ConvertError::UnsupportedTarget`] when no encoder exists for
/// `target`, [`ConvertError::UnsupportedConversion`] when the pair is not
/// offered by [`legal_targets`], and [`ConvertError::Decode`] when the bytes
/// are not an image.
pub async fn transcode(
    bytes: Arc<[u8]>,
    extension: &str,
    target: &str,
    config: &ConversionConfig,
) -> Result<Vec<u8>> {
    let format = TargetFormat::from_extension(target).ok_or_else(|| {
        ConvertError::UnsupportedTarget {
            target: target.to_string(),
        }
    })?;
    let wanted = canonical(target);
    if !legal_targets(extension).iter().any(|t| *t == wanted) {
        return Err(ConvertError::unsupported_conversion(extension, target));
    }

    let quality = config.image_quality_percent();
    let input_len = bytes.len();
    let out = tokio::task::spawn_blocking(move || reencode(&bytes, format, quality))
        .await
        .map_err(|e| ConvertError::Internal(format!("image task panicked: {e}")))??;

    info!(
        "Re-encoded {} image as {} ({} → {} bytes)",
        extension,
        target,
        input_len,
        out.len()
    );
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetFormat {
    Png,
    Jpeg,
    WebP,
}

impl TargetFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
        }
    }
}

/// Decode an image and apply its EXIF orientation, so the pixels come out
/// upright with the displayed width and height.
pub(crate) fn decode_oriented(bytes: &[u8]) -> Result<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ConvertError::decode("image", e))?
        .into_decoder()
        .map_err(|e| ConvertError::decode("image", e))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| ConvertError::decode("image", e))?;
    if orientation != Orientation::NoTransforms {
        debug!("Applying EXIF orientation {:?}", orientation);
        img.apply_orientation(orientation);
    }
    Ok(img)
}

fn reencode(bytes: &[u8], format: TargetFormat, quality: u8) -> Result<Vec<u8>> {
    let img = decode_oriented(bytes)?;
    debug!(
        "Decoded {}x{} image ({:?})",
        img.width(),
        img.height(),
        img.color()
    );

    let mut buf = Vec::new();
    let encoded = match format {
        TargetFormat::Png => img.write_with_encoder(PngEncoder::new(&mut buf)),
        TargetFormat::Jpeg => {
            let flat = DynamicImage::ImageRgb8(flatten_onto_white(&img));
            flat.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        }
        // The WebP encoder is lossless only and takes 8-bit RGB(A).
        TargetFormat::WebP => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(&mut buf)),
    };
    encoded.map_err(|e| ConvertError::encode(format.name(), e))?;
    Ok(buf)
}

/// Composite onto opaque white at full resolution. JPEG has no alpha, and
/// dropping it outright would turn transparent areas black.
pub(crate) fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut rgb = RgbImage::new(w, h);
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        dst.0 = [blend(r, a), blend(g, a), blend(b, a)];
    }
    rgb
}

fn blend(c: u8, a: u8) -> u8 {
    let (c, a) = (c as u32, a as u32);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}
