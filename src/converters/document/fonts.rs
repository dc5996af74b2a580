//! System font discovery, text measurement and glyph drawing.
//!
//! Fonts are looked up once per process through `fontdb` and kept in a
//! read-only [`FontSet`]. Family preference follows the page stylesheet:
//! Inter, Segoe UI, then common sans faces, generic sans-serif and finally
//! serif. Missing bold or italic faces are synthesised (double strike,
//! slant). On a machine without any font, glyphs are drawn as placeholder
//! boxes so layout and pagination still work.

use super::structure::RunStyle;
use fontdb::{Database, Family, Query, Stretch, Style, Weight, ID};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};
use tracing::{debug, warn};

const PREFERRED_FAMILIES: [Family<'static>; 8] = [
    Family::Name("Inter"),
    Family::Name("Segoe UI"),
    Family::Name("DejaVu Sans"),
    Family::Name("Liberation Sans"),
    Family::Name("Noto Sans"),
    Family::Name("Arial"),
    Family::SansSerif,
    Family::Serif,
];

/// Width of a placeholder glyph, in em.
const PLACEHOLDER_ADVANCE_EM: f32 = 0.6;
/// Horizontal slant applied when no italic face exists.
const SYNTHETIC_SLANT: f32 = 0.2;
const TAB_SPACES: f32 = 4.0;

static FONTS: Lazy<FontSet> = Lazy::new(FontSet::discover);

#[derive(Debug)]
struct FaceData {
    data: Vec<u8>,
    index: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    face: Arc<FaceData>,
    synthetic_bold: bool,
    synthetic_italic: bool,
}

/// Regular, bold, italic and bold-italic faces of the body family.
#[derive(Debug, Default)]
pub struct FontSet {
    regular: Option<Slot>,
    bold: Option<Slot>,
    italic: Option<Slot>,
    bold_italic: Option<Slot>,
}

impl FontSet {
    /// The process-wide set, discovered on first use.
    pub fn global() -> &'static FontSet {
        &FONTS
    }

    fn discover() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!("Font database holds {} faces", db.len());

        let mut loaded: Vec<(ID, Arc<FaceData>)> = Vec::new();
        let mut slot = |weight: Weight, style: Style| -> Option<Slot> {
            let id = db
                .query(&Query {
                    families: &PREFERRED_FAMILIES,
                    weight,
                    stretch: Stretch::Normal,
                    style,
                })
                .or_else(|| db.faces().next().map(|f| f.id))?;
            let info = db.face(id)?;
            let synthetic_bold = weight == Weight::BOLD && info.weight.0 < 600;
            let synthetic_italic = style == Style::Italic && info.style == Style::Normal;
            let face = match loaded.iter().find(|(loaded_id, _)| *loaded_id == id) {
                Some((_, f)) => Arc::clone(f),
                None => {
                    let f = Arc::new(db.with_face_data(id, |data, index| FaceData {
                        data: data.to_vec(),
                        index,
                    })?);
                    loaded.push((id, Arc::clone(&f)));
                    f
                }
            };
            Some(Slot {
                face,
                synthetic_bold,
                synthetic_italic,
            })
        };

        let set = FontSet {
            regular: slot(Weight::NORMAL, Style::Normal),
            bold: slot(Weight::BOLD, Style::Normal),
            italic: slot(Weight::NORMAL, Style::Italic),
            bold_italic: slot(Weight::BOLD, Style::Italic),
        };
        if set.regular.is_none() {
            warn!("No system fonts found; text will render as placeholder boxes");
        }
        set
    }

    fn slot(&self, style: RunStyle) -> Option<&Slot> {
        match (style.bold, style.italic) {
            (false, false) => self.regular.as_ref(),
            (true, false) => self.bold.as_ref(),
            (false, true) => self.italic.as_ref(),
            (true, true) => self.bold_italic.as_ref(),
        }
    }

    /// The typeface for `style`, borrowing this set's font data.
    pub fn typeface(&self, style: RunStyle) -> Typeface<'_> {
        let slot = self.slot(style);
        Typeface {
            face: slot.and_then(|s| ttf_parser::Face::parse(&s.face.data, s.face.index).ok()),
            synthetic_bold: slot.map_or(style.bold, |s| s.synthetic_bold),
            synthetic_italic: slot.map_or(style.italic, |s| s.synthetic_italic),
        }
    }
}

/// A parsed face plus the synthesis it needs for the requested style.
/// `face` is `None` when the placeholder renderer is in use.
pub struct Typeface<'a> {
    face: Option<ttf_parser::Face<'a>>,
    synthetic_bold: bool,
    synthetic_italic: bool,
}

impl Typeface<'_> {
    /// Advance width of `c` at `size` px.
    pub fn advance(&self, c: char, size: f32) -> f32 {
        if c == '\t' {
            return self.advance(' ', size) * TAB_SPACES;
        }
        match &self.face {
            Some(face) => {
                let gid = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
                let units = face.glyph_hor_advance(gid).unwrap_or(0) as f32;
                units * size / face.units_per_em() as f32
            }
            None => PLACEHOLDER_ADVANCE_EM * size,
        }
    }

    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.advance(c, size)).sum()
    }

    /// Ascent and descent (both positive) at `size` px.
    pub fn vertical_metrics(&self, size: f32) -> (f32, f32) {
        match &self.face {
            Some(face) => {
                let upem = face.units_per_em() as f32;
                (
                    face.ascender() as f32 * size / upem,
                    -(face.descender() as f32) * size / upem,
                )
            }
            None => (0.8 * size, 0.2 * size),
        }
    }

    /// Fill `text` with its pen starting at (`x`, `baseline`), both in layout
    /// pixels; `scale` converts to device pixels.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        x: f32,
        baseline: f32,
        size: f32,
        scale: f32,
        paint: &Paint<'_>,
    ) {
        let strikes = if self.synthetic_bold { 2 } else { 1 };
        let offset = (size / 32.0).max(0.5);
        for strike in 0..strikes {
            let mut pen = x + strike as f32 * offset;
            for c in text.chars() {
                if !c.is_whitespace() && !c.is_control() {
                    self.draw_glyph(pixmap, c, pen, baseline, size, scale, paint);
                }
                pen += self.advance(c, size);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_glyph(
        &self,
        pixmap: &mut Pixmap,
        c: char,
        pen: f32,
        baseline: f32,
        size: f32,
        scale: f32,
        paint: &Paint<'_>,
    ) {
        let slant = if self.synthetic_italic {
            SYNTHETIC_SLANT
        } else {
            0.0
        };
        let Some(face) = &self.face else {
            // Placeholder box: 0.4 em wide, 0.5 em tall, sitting on the baseline.
            if let Some(rect) = Rect::from_xywh(
                (pen + 0.1 * size) * scale,
                (baseline - 0.5 * size) * scale,
                0.4 * size * scale,
                0.5 * size * scale,
            ) {
                pixmap.fill_rect(rect, paint, Transform::identity(), None);
            }
            return;
        };

        let gid = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
        let mut outline = OutlinePath(PathBuilder::new());
        if face.outline_glyph(gid, &mut outline).is_none() {
            return;
        }
        let Some(path) = outline.0.finish() else {
            return;
        };
        let s = size / face.units_per_em() as f32 * scale;
        let transform = Transform::from_row(s, 0.0, slant * s, -s, pen * scale, baseline * scale);
        pixmap.fill_path(&path, paint, FillRule::Winding, transform, None);
    }
}

struct OutlinePath(PathBuilder);

impl ttf_parser::OutlineBuilder for OutlinePath {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.0.close();
    }
}
