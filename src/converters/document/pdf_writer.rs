//! Image-only PDF assembly with `lopdf`.
//!
//! Every page carries one DCT-encoded (JPEG) image XObject placed inside the
//! page margins. The JPEG bytes are embedded unchanged.

use crate::config::RenderOptions;
use crate::error::{ConvertError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// A rasterised page: JPEG bytes plus their pixel size.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub jpeg: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// Build a PDF with one page per image.
///
/// The image is scaled to the printable width (page width minus both
/// margins) and anchored at the top-left margin.
pub fn write_pdf(pages: &[PageImage], options: &RenderOptions) -> Result<Vec<u8>> {
    let (page_w_mm, page_h_mm) = options.page_dimensions_mm();
    let page_w = page_w_mm * POINTS_PER_MM;
    let page_h = page_h_mm * POINTS_PER_MM;
    let margin = options.margin_mm * POINTS_PER_MM;
    let printable_w = page_w - 2.0 * margin;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page in pages {
        let draw_w = printable_w;
        let draw_h = printable_w * page.height_px as f32 / page.width_px.max(1) as f32;
        let image_id = doc.add_object(image_xobject(page));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        draw_w.into(),
                        0.into(),
                        0.into(),
                        draw_h.into(),
                        margin.into(),
                        (page_h - margin - draw_h).into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| ConvertError::encode("pdf", e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ConvertError::encode("pdf", e))?;
    debug!("Wrote {}-page PDF ({} bytes)", count, out.len());
    Ok(out)
}

fn image_xobject(page: &PageImage) -> Stream {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => page.width_px as i64,
        "Height" => page.height_px as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    // Already DCT-compressed: keep `compress()` from deflating it again.
    Stream::new(dict, page.jpeg.clone()).with_compression(false)
}
