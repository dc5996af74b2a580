//! Page text extraction with `lopdf`.
//!
//! Each page's content stream is walked operator by operator. Text-showing
//! operators (`Tj`, `TJ`, `'`, `"`) produce fragments; text-positioning
//! operators track the baseline so that a fragment followed by text on a
//! different line is marked as ending its line.
//!
//! Strings are decoded through the font's `ToUnicode` CMap when it has one,
//! as UTF-16BE when they carry a byte-order mark, and through the font's
//! single-byte `/Encoding` (WinAnsi when none is named) otherwise.
//! Composite (`Type0`) fonts use two-byte codes.
//!
//! `Do` on a Form XObject walks the form's own content stream with the
//! form's resources, so text placed inside forms is extracted in order.

use super::pdf_encoding::{SimpleEncoding, WIN_ANSI};
use crate::error::{ConvertError, Result};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// `TJ` adjustments more negative than this (in thousandths of an em)
/// read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = -200.0;
/// Baselines closer than this (in text-space units) are the same line.
const SAME_LINE_EPSILON: f32 = 0.5;
/// Nesting limit for Form XObjects drawn inside forms.
const MAX_FORM_DEPTH: usize = 8;

/// One shown string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
    /// The next text on the page starts a new line.
    pub ends_line: bool,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, ends_line: bool) -> Self {
        Self {
            text: text.into(),
            ends_line,
        }
    }
}

/// Load a PDF and return its pages' fragments in page order.
///
/// `on_page` is called with (1-based page, total) after each page.
pub fn extract_pages(
    bytes: &[u8],
    mut on_page: impl FnMut(usize, usize),
) -> Result<Vec<Vec<TextFragment>>> {
    let doc = Document::load_mem(bytes).map_err(|e| ConvertError::decode("pdf", e))?;
    doc.catalog().map_err(|e| ConvertError::decode("pdf", e))?;
    if doc.is_encrypted() {
        return Err(ConvertError::decode("pdf", "document is encrypted"));
    }
    let pages = doc.get_pages();
    let total = pages.len();
    debug!("PDF has {} pages", total);

    let mut out = Vec::with_capacity(total);
    for (idx, (&number, &page_id)) in pages.iter().enumerate() {
        let fragments = match page_fragments(&doc, page_id) {
            Ok(f) => f,
            Err(e) => {
                warn!("Page {}: no extractable text ({})", number, e);
                Vec::new()
            }
        };
        out.push(fragments);
        on_page(idx + 1, total);
    }
    Ok(out)
}

fn page_fragments(doc: &Document, page_id: ObjectId) -> Result<Vec<TextFragment>> {
    let data = doc
        .get_page_content(page_id)
        .map_err(|e| ConvertError::decode("pdf", e))?;
    let resources = inherited_resources(doc, page_id);

    let mut walker = TextWalker::new();
    let mut open_forms = Vec::new();
    walk_content(doc, &data, resources, &mut walker, &mut open_forms)?;
    Ok(walker.fragments)
}

/// Walk one content stream, descending into Form XObjects on `Do`.
///
/// `open_forms` holds the forms currently being walked; a form that draws
/// itself (directly or through another form) is skipped.
fn walk_content(
    doc: &Document,
    data: &[u8],
    resources: Option<&Dictionary>,
    walker: &mut TextWalker,
    open_forms: &mut Vec<ObjectId>,
) -> Result<()> {
    let content = Content::decode(data).map_err(|e| ConvertError::decode("pdf", e))?;
    let fonts = resource_fonts(doc, resources);

    for op in &content.operations {
        if op.operator != "Do" {
            walker.apply(&op.operator, &op.operands, &fonts);
            continue;
        }
        let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) else {
            continue;
        };
        let Some((form_id, form)) = form_xobject(doc, resources, name) else {
            continue;
        };
        if open_forms.len() >= MAX_FORM_DEPTH || open_forms.contains(&form_id) {
            warn!("Skipping nested form {:?}: depth or cycle limit", form_id);
            continue;
        }
        let data = form
            .decompressed_content()
            .unwrap_or_else(|_| form.content.clone());
        let form_resources = form
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve_dict(doc, r))
            .or(resources);

        // The form runs in its own graphics state; the font does not leak out.
        let saved_font = walker.font.clone();
        open_forms.push(form_id);
        let walked = walk_content(doc, &data, form_resources, walker, open_forms);
        open_forms.pop();
        walker.font = saved_font;
        if let Err(e) = walked {
            warn!("Form {:?}: no extractable text ({})", form_id, e);
        }
    }
    Ok(())
}

/// Look up `name` in the `/XObject` resources; only forms are returned.
fn form_xobject<'a>(
    doc: &'a Document,
    resources: Option<&'a Dictionary>,
    name: &[u8],
) -> Option<(ObjectId, &'a lopdf::Stream)> {
    let xobjects = resources?
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(doc, x))?;
    let id = xobjects.get(name).ok()?.as_reference().ok()?;
    let stream = doc.get_object(id).ok()?.as_stream().ok()?;
    let is_form = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|s| s.as_name().ok())
        .is_some_and(|s| s == b"Form");
    is_form.then_some((id, stream))
}

// ── Content-stream walk ──────────────────────────────────────────────────────

type Matrix = [f32; 6];
const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

type FontMap = HashMap<Vec<u8>, Rc<FontDecoder>>;

struct TextWalker {
    font: Option<Rc<FontDecoder>>,
    line_matrix: Matrix,
    leading: f32,
    /// Baseline of the most recently shown text.
    shown_baseline: Option<f32>,
    fragments: Vec<TextFragment>,
}

impl TextWalker {
    fn new() -> Self {
        Self {
            font: None,
            line_matrix: IDENTITY,
            leading: 0.0,
            shown_baseline: None,
            fragments: Vec::new(),
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object], fonts: &FontMap) {
        match operator {
            "BT" => self.line_matrix = IDENTITY,
            "Tf" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    self.font = fonts.get(name).cloned();
                }
            }
            "TL" => self.leading = number(operands.first()),
            "Td" => self.translate(number(operands.first()), number(operands.get(1))),
            "TD" => {
                let ty = number(operands.get(1));
                self.leading = -ty;
                self.translate(number(operands.first()), ty);
            }
            "Tm" if operands.len() == 6 => {
                let mut m = IDENTITY;
                for (slot, o) in m.iter_mut().zip(operands) {
                    *slot = number(Some(o));
                }
                self.line_matrix = m;
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let text = self.decode_array(items);
                    self.show(text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            _ => {}
        }
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line_matrix;
        self.line_matrix = [a, b, c, d, tx * a + ty * c + e, tx * b + ty * d + f];
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    fn baseline(&self) -> f32 {
        self.line_matrix[5]
    }

    fn show(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let baseline = self.baseline();
        if let (Some(prev), Some(last)) = (self.shown_baseline, self.fragments.last_mut()) {
            if (prev - baseline).abs() > SAME_LINE_EPSILON {
                last.ends_line = true;
            }
        }
        self.shown_baseline = Some(baseline);
        self.fragments.push(TextFragment::new(text, false));
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match &self.font {
            Some(font) => font.decode(bytes),
            None => decode_fallback(bytes, false),
        }
    }

    fn decode_array(&self, items: &[Object]) -> String {
        let mut text = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => text.push_str(&self.decode(bytes)),
                Object::Integer(_) | Object::Real(_) => {
                    if number(Some(item)) < TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }
        text
    }
}

fn number(obj: Option<&Object>) -> f32 {
    match obj {
        Some(Object::Integer(i)) => *i as f32,
        Some(Object::Real(r)) => *r,
        _ => 0.0,
    }
}

// ── Fonts and string decoding ────────────────────────────────────────────────

#[derive(Debug, Default)]
struct FontDecoder {
    two_byte: bool,
    to_unicode: Option<CMap>,
    /// Single-byte encoding named by the font's `/Encoding`.
    encoding: Option<SimpleEncoding>,
}

impl FontDecoder {
    fn decode(&self, bytes: &[u8]) -> String {
        let encoding = self.encoding.as_ref().unwrap_or(&WIN_ANSI);
        match (&self.to_unicode, &self.encoding) {
            (Some(cmap), _) => cmap.decode(bytes, self.two_byte, encoding),
            (None, Some(encoding)) if !self.two_byte => encoding.decode(bytes),
            _ => decode_fallback(bytes, self.two_byte),
        }
    }
}

fn decode_fallback(bytes: &[u8], two_byte: bool) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16be(utf16);
    }
    if two_byte {
        // Raw CIDs have no meaning without a ToUnicode map.
        return String::new();
    }
    WIN_ANSI.decode(bytes)
}

fn decode_utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|p| u16::from_be_bytes([p[0], p[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Build decoders for the `/Font` entries of a resource dictionary.
fn resource_fonts(doc: &Document, resources: Option<&Dictionary>) -> FontMap {
    let mut fonts = HashMap::new();
    let Some(font_dict) = resources
        .and_then(|res| res.get(b"Font").ok())
        .and_then(|f| resolve_dict(doc, f))
    else {
        return fonts;
    };
    for (name, value) in font_dict.iter() {
        if let Some(font) = resolve_dict(doc, value) {
            fonts.insert(name.clone(), Rc::new(font_decoder(doc, font)));
        }
    }
    fonts
}

fn inherited_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // Bounded walk: malformed files can contain parent cycles.
    for _ in 0..32 {
        if let Some(res) = node.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r)) {
            return Some(res);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

fn font_decoder(doc: &Document, font: &Dictionary) -> FontDecoder {
    let two_byte = font
        .get(b"Subtype")
        .ok()
        .and_then(|s| s.as_name().ok())
        .is_some_and(|s| s == b"Type0");
    let to_unicode = font
        .get(b"ToUnicode")
        .ok()
        .and_then(|o| match o {
            Object::Reference(id) => doc.get_object(*id).ok(),
            other => Some(other),
        })
        .and_then(|o| o.as_stream().ok())
        .map(|s| s.decompressed_content().unwrap_or_else(|_| s.content.clone()))
        .map(|data| CMap::parse(&String::from_utf8_lossy(&data)))
        .filter(|cmap| !cmap.is_empty());
    let encoding = if two_byte {
        None
    } else {
        font.get(b"Encoding")
            .ok()
            .and_then(|e| simple_encoding(doc, e))
    };
    FontDecoder {
        two_byte,
        to_unicode,
        encoding,
    }
}

/// A simple font's `/Encoding`: a base encoding name, or a dictionary with
/// an optional `/BaseEncoding` and `/Differences`.
fn simple_encoding(doc: &Document, obj: &Object) -> Option<SimpleEncoding> {
    if let Ok(name) = obj.as_name() {
        return SimpleEncoding::from_name(name);
    }
    let dict = resolve_dict(doc, obj)?;
    let mut encoding = dict
        .get(b"BaseEncoding")
        .ok()
        .and_then(|b| b.as_name().ok())
        .and_then(SimpleEncoding::from_name)
        .unwrap_or_else(|| WIN_ANSI.clone());

    let differences: &[Object] = match dict.get(b"Differences") {
        Ok(Object::Array(items)) => items.as_slice(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    // [code name name ... code name ...]: each name takes the next code.
    let mut code: Option<i64> = None;
    for item in differences {
        match item {
            Object::Integer(start) => code = Some(*start),
            Object::Name(glyph) => {
                if let Some(c) = code.filter(|c| (0..=255).contains(c)) {
                    encoding.set_glyph(c as u8, &String::from_utf8_lossy(glyph));
                }
                code = code.map(|c| c + 1);
            }
            _ => {}
        }
    }
    Some(encoding)
}

/// A parsed `ToUnicode` map: character code → Unicode text.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CMap {
    map: HashMap<u32, String>,
    /// Code width in bytes, from the source codes of the map.
    code_bytes: usize,
}

static RE_BFCHAR_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)beginbfchar(.*?)endbfchar").unwrap());
static RE_BFRANGE_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)beginbfrange(.*?)endbfrange").unwrap());
static RE_BFCHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]*)>").unwrap());
static RE_BFRANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*(?:<([0-9A-Fa-f]*)>|\[([^\]]*)\])").unwrap()
});
static RE_HEX_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([0-9A-Fa-f]*)>").unwrap());

impl CMap {
    pub fn parse(text: &str) -> Self {
        let mut cmap = CMap::default();

        for section in RE_BFCHAR_SECTION.captures_iter(text) {
            for cap in RE_BFCHAR.captures_iter(&section[1]) {
                if let Some(code) = cmap.code(&cap[1]) {
                    cmap.map.insert(code, hex_to_unicode(&cap[2]));
                }
            }
        }

        for section in RE_BFRANGE_SECTION.captures_iter(text) {
            for cap in RE_BFRANGE.captures_iter(&section[1]) {
                let (Some(lo), Some(hi)) = (cmap.code(&cap[1]), cmap.code(&cap[2])) else {
                    continue;
                };
                if hi < lo || hi - lo > 0xFFFF {
                    continue;
                }
                if let Some(dst) = cap.get(3) {
                    let base = hex_units(dst.as_str());
                    for (offset, code) in (lo..=hi).enumerate() {
                        let mut units = base.clone();
                        if let Some(last) = units.last_mut() {
                            *last = last.wrapping_add(offset as u16);
                        }
                        cmap.map.insert(code, String::from_utf16_lossy(&units));
                    }
                } else if let Some(list) = cap.get(4) {
                    let targets = RE_HEX_STRING.captures_iter(list.as_str());
                    for (code, target) in (lo..=hi).zip(targets) {
                        cmap.map.insert(code, hex_to_unicode(&target[1]));
                    }
                }
            }
        }
        cmap
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn code(&mut self, hex: &str) -> Option<u32> {
        if self.code_bytes == 0 {
            self.code_bytes = hex.len().div_ceil(2).clamp(1, 4);
        }
        u32::from_str_radix(hex, 16).ok()
    }

    /// Decode a shown string. Codes missing from the map fall back to
    /// `fallback` for one-byte maps and are dropped for wider ones.
    pub fn decode(&self, bytes: &[u8], two_byte_font: bool, fallback: &SimpleEncoding) -> String {
        let width = if two_byte_font {
            self.code_bytes.max(2)
        } else {
            self.code_bytes.max(1)
        };
        let mut out = String::new();
        for chunk in bytes.chunks(width) {
            let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
            match self.map.get(&code) {
                Some(s) => out.push_str(s),
                None if width == 1 => out.push(fallback.char(code as u8)),
                None => {}
            }
        }
        out
    }
}

fn hex_units(hex: &str) -> Vec<u16> {
    hex.as_bytes()
        .chunks(4)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .filter_map(|c| u16::from_str_radix(c, 16).ok())
        .collect()
}

fn hex_to_unicode(hex: &str) -> String {
    String::from_utf16_lossy(&hex_units(hex))
}

// ── Paragraphs ───────────────────────────────────────────────────────────────

/// Group page fragments into paragraphs.
///
/// A line buffer collects fragments; a fragment that ends its line flushes
/// the buffer into a paragraph. A non-empty remainder at the end of a page
/// becomes one more paragraph. Pages are separated by one empty paragraph
/// (none after the last page).
pub fn build_paragraphs(pages: &[Vec<TextFragment>]) -> Vec<String> {
    let mut paragraphs = Vec::new();
    for (i, fragments) in pages.iter().enumerate() {
        let mut line = String::new();
        for fragment in fragments {
            line.push_str(&fragment.text);
            if fragment.ends_line {
                paragraphs.push(std::mem::take(&mut line));
            }
        }
        if !line.is_empty() {
            paragraphs.push(line);
        }
        if i + 1 < pages.len() {
            paragraphs.push(String::new());
        }
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream, StringFormat};

    fn frag(text: &str, ends_line: bool) -> TextFragment {
        TextFragment::new(text, ends_line)
    }

    #[test]
    fn paragraphs_flush_on_line_end_and_page_end() {
        let pages = vec![
            vec![frag("Hello ", false), frag("world", true), frag("tail", false)],
            vec![frag("Second page", false)],
        ];
        assert_eq!(
            build_paragraphs(&pages),
            vec!["Hello world", "tail", "", "Second page"]
        );
    }

    #[test]
    fn no_separator_after_last_page() {
        let pages = vec![vec![frag("only", true)]];
        assert_eq!(build_paragraphs(&pages), vec!["only"]);
        assert!(build_paragraphs(&[]).is_empty());
    }

    #[test]
    fn empty_pages_still_get_separators() {
        let pages = vec![vec![], vec![], vec![frag("x", false)]];
        assert_eq!(build_paragraphs(&pages), vec!["", "", "x"]);
    }

    #[test]
    fn cmap_bfchar_and_bfrange() {
        let cmap = CMap::parse(
            "1 begincodespacerange <0000> <FFFF> endcodespacerange\n\
             2 beginbfchar\n<0003> <0020>\n<0011> <00410042>\nendbfchar\n\
             2 beginbfrange\n<0024> <0026> <0061>\n<0030> <0031> [<0058> <0059>]\nendbfrange",
        );
        assert_eq!(
            cmap.decode(
                &[0x00, 0x24, 0x00, 0x03, 0x00, 0x26, 0x00, 0x11, 0x00, 0x31],
                true,
                &WIN_ANSI
            ),
            "a cABY"
        );
    }

    #[test]
    fn one_byte_cmap_falls_back_to_font_encoding() {
        let cmap = CMap::parse("beginbfchar <41> <03B1> endbfchar");
        assert_eq!(cmap.decode(b"AB\x93", false, &WIN_ANSI), "αB\u{201C}");
    }

    #[test]
    fn fallback_decoding() {
        assert_eq!(decode_fallback(b"caf\xe9", false), "café");
        assert_eq!(decode_fallback(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69], false), "Hi");
        assert_eq!(decode_fallback(&[0x00, 0x05], true), "");
        assert_eq!(
            decode_fallback(b"\x93Hi\x94 \x96 \x80", false),
            "\u{201C}Hi\u{201D} \u{2013} \u{20AC}"
        );
    }

    fn font_with_encoding(encoding: Object) -> FontDecoder {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => encoding,
        };
        font_decoder(&doc, &font)
    }

    #[test]
    fn named_encodings_decode_high_bytes() {
        let win = font_with_encoding(Object::Name(b"WinAnsiEncoding".to_vec()));
        assert_eq!(win.decode(b"\x93Hi\x94"), "\u{201C}Hi\u{201D}");
        let mac = font_with_encoding(Object::Name(b"MacRomanEncoding".to_vec()));
        assert_eq!(mac.decode(b"caf\x8e"), "café");
    }

    #[test]
    fn differences_override_base_encoding() {
        let font = font_with_encoding(Object::Dictionary(dictionary! {
            "Type" => "Encoding",
            "BaseEncoding" => "MacRomanEncoding",
            "Differences" => vec![
                Object::Integer(65),
                Object::Name(b"bullet".to_vec()),
                Object::Name(b"eacute".to_vec()),
                Object::Integer(200),
                Object::Name(b"Euro".to_vec()),
            ],
        }));
        assert_eq!(font.decode(b"ABC\xc8\x8e"), "\u{2022}éC\u{20AC}é");
    }

    fn walk(ops: Vec<Operation>) -> Vec<TextFragment> {
        let fonts = FontMap::new();
        let mut walker = TextWalker::new();
        for op in &ops {
            walker.apply(&op.operator, &op.operands, &fonts);
        }
        walker.fragments
    }

    fn s(text: &str) -> Object {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    #[test]
    fn line_moves_mark_previous_fragment() {
        let frags = walk(vec![
            Operation::new("BT", vec![]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![s("first ")]),
            Operation::new("Tj", vec![s("line")]),
            Operation::new("T*", vec![]),
            Operation::new("Tj", vec![s("second")]),
            Operation::new("Td", vec![100.into(), 0.into()]),
            Operation::new("Tj", vec![s(" same")]),
            Operation::new("'", vec![s("third")]),
            Operation::new("ET", vec![]),
        ]);
        let marks: Vec<(&str, bool)> = frags.iter().map(|f| (f.text.as_str(), f.ends_line)).collect();
        assert_eq!(
            marks,
            vec![
                ("first ", false),
                ("line", true),
                ("second", false),
                (" same", true),
                ("third", false)
            ]
        );
    }

    #[test]
    fn tj_kerning_gap_becomes_space() {
        let frags = walk(vec![Operation::new(
            "TJ",
            vec![Object::Array(vec![s("Hello"), (-250).into(), s("world"), (-50).into(), s("!")])],
        )]);
        assert_eq!(frags[0].text, "Hello world!");
    }

    #[test]
    fn tm_with_new_baseline_breaks_line() {
        let frags = walk(vec![
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 500.into()]),
            Operation::new("Tj", vec![s("a")]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 90.into(), 500.into()]),
            Operation::new("Tj", vec![s("b")]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 480.into()]),
            Operation::new("Tj", vec![s("c")]),
        ]);
        assert!(!frags[0].ends_line);
        assert!(frags[1].ends_line);
    }

    fn sample_pdf(pages: &[&[&str]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut ops = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("TL", vec![14.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
            ];
            for line in *lines {
                ops.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                ops.push(Operation::new("T*", vec![]));
            }
            ops.push(Operation::new("ET", vec![]));
            let content = Content { operations: ops };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(page_id.into());
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
                "Resources" => resources_id,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn extracts_lines_with_inherited_font_resources() {
        let bytes = sample_pdf(&[&["Hello PDF", "Second line"], &["Page two"]]);
        let mut seen = Vec::new();
        let pages = extract_pages(&bytes, |p, t| seen.push((p, t))).unwrap();
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
        assert_eq!(
            build_paragraphs(&pages),
            vec!["Hello PDF", "Second line", "", "Page two"]
        );
    }

    /// One page drawing `/Fm1`; the form shows `form_text` with its own font
    /// resources and, when `self_referencing`, also tries to draw itself.
    fn pdf_with_form(form_text: &[u8], self_referencing: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let form_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut form_ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(form_text.to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ];
        if self_referencing {
            form_ops.push(Operation::new("Do", vec!["Fm1".into()]));
        }
        let mut form_resources = dictionary! { "Font" => dictionary! { "F1" => font_id } };
        if self_referencing {
            form_resources.set("XObject", dictionary! { "Fm1" => form_id });
        }
        let form_content = Content { operations: form_ops }.encode().unwrap();
        doc.objects.insert(
            form_id,
            Object::Stream(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                    "Resources" => form_resources,
                },
                form_content,
            )),
        );

        let page_ops = vec![
            Operation::new("q", vec![]),
            Operation::new("Do", vec!["Fm1".into()]),
            Operation::new("Q", vec![]),
        ];
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            Content { operations: page_ops }.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => dictionary! { "Fm1" => form_id } },
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn text_inside_form_xobject_is_extracted() {
        let bytes = pdf_with_form(b"Inside form", false);
        let pages = extract_pages(&bytes, |_, _| {}).unwrap();
        assert_eq!(build_paragraphs(&pages), vec!["Inside form"]);
    }

    #[test]
    fn self_drawing_form_is_walked_once() {
        let bytes = pdf_with_form(b"Loop", true);
        let pages = extract_pages(&bytes, |_, _| {}).unwrap();
        assert_eq!(build_paragraphs(&pages), vec!["Loop"]);
    }

    #[test]
    fn form_fonts_use_their_encoding() {
        let bytes = pdf_with_form(b"\x93Hi\x94", false);
        let pages = extract_pages(&bytes, |_, _| {}).unwrap();
        assert_eq!(build_paragraphs(&pages), vec!["\u{201C}Hi\u{201D}"]);
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = extract_pages(b"%PDF-1.4 garbage", |_, _| {}).unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }));
    }
}
