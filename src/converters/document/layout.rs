//! Block layout: structural blocks → positioned text runs and images, cut
//! into page-sized slices.
//!
//! Coordinates are layout pixels inside the page container (800 px wide by
//! default). The container stylesheet is fixed: 16 px sans body text at
//! 1.6 line height, browser-default heading sizes and margins, 40 px list
//! indentation and 40 px padding. Lines are wrapped greedily at spaces and
//! never split across a page boundary.

use super::fonts::{FontSet, Typeface};
use super::structure::{Block, Inline, RunStyle};
use crate::config::RenderOptions;
use image::RgbaImage;
use std::sync::Arc;

/// `h1`–`h6` font sizes relative to the body size.
const HEADING_SCALE: [f32; 6] = [2.0, 1.5, 1.17, 1.0, 0.83, 0.67];
/// `h1`–`h6` vertical margins, in em of the heading's own size.
const HEADING_MARGIN_EM: [f32; 6] = [0.67, 0.83, 1.0, 1.33, 1.67, 2.33];
const LIST_INDENT_PX: f32 = 40.0;
const BULLET: &str = "•";

/// One positioned draw operation. `y`/`baseline` are relative to the top of
/// the page slice the item sits on.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        style: RunStyle,
        text: String,
        width: f32,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        pixels: Arc<RgbaImage>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub items: Vec<Drawable>,
}

/// Lay out `blocks` and cut the result into pages.
///
/// Always returns at least one page, so an empty document still yields a
/// (blank) PDF page.
pub fn layout(blocks: &[Block], options: &RenderOptions, fonts: &FontSet) -> Vec<PageLayout> {
    let mut engine = LayoutEngine::new(options, fonts);
    for block in blocks {
        engine.block(block);
    }
    engine.finish()
}

/// The four typefaces a layout needs, parsed once.
struct Faces<'a>([Typeface<'a>; 4]);

impl<'a> Faces<'a> {
    fn new(fonts: &'a FontSet) -> Self {
        let style = |bold, italic| RunStyle {
            bold,
            italic,
            underline: false,
        };
        Faces([
            fonts.typeface(style(false, false)),
            fonts.typeface(style(true, false)),
            fonts.typeface(style(false, true)),
            fonts.typeface(style(true, true)),
        ])
    }

    fn get(&self, style: RunStyle) -> &Typeface<'a> {
        &self.0[style.bold as usize | (style.italic as usize) << 1]
    }
}

/// A line being filled: styled runs with their widths.
#[derive(Debug, Default)]
struct Line {
    runs: Vec<(String, RunStyle, f32)>,
    width: f32,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    fn push(&mut self, text: &str, style: RunStyle, width: f32) {
        match self.runs.last_mut() {
            Some((t, s, w)) if *s == style => {
                t.push_str(text);
                *w += width;
            }
            _ => self.runs.push((text.to_string(), style, width)),
        }
        self.width += width;
    }
}

/// A wrap unit: consecutive non-space characters, possibly across runs.
#[derive(Debug)]
enum Piece {
    Word(Vec<(String, RunStyle)>),
    Space(RunStyle),
    Break,
}

struct LayoutEngine<'a> {
    faces: Faces<'a>,
    options: &'a RenderOptions,
    page_height: f32,
    /// Top of the next line, in continuous (unpaginated) coordinates.
    cursor: f32,
    /// Bottom margin of the previous block, collapsed with the next top margin.
    pending_margin: f32,
    previous_was_list: bool,
    items: Vec<(usize, Drawable)>,
}

impl<'a> LayoutEngine<'a> {
    fn new(options: &'a RenderOptions, fonts: &'a FontSet) -> Self {
        Self {
            faces: Faces::new(fonts),
            options,
            page_height: options.page_slice_height_px() as f32 / options.scale,
            cursor: options.padding_px,
            pending_margin: 0.0,
            previous_was_list: false,
            items: Vec::new(),
        }
    }

    fn content_left(&self) -> f32 {
        self.options.padding_px
    }

    fn content_width(&self) -> f32 {
        self.options.container_width_px - 2.0 * self.options.padding_px
    }

    fn block(&mut self, block: &Block) {
        let body = self.options.font_size_px;
        match block {
            Block::Heading { level, inlines } => {
                let idx = (*level).clamp(1, 6) as usize - 1;
                let size = body * HEADING_SCALE[idx];
                let margin = size * HEADING_MARGIN_EM[idx];
                self.begin_block(margin, false);
                self.text_block(inlines, size, 0.0, true);
                self.end_block(margin, false);
            }
            Block::Paragraph { inlines } => {
                self.begin_block(body, false);
                self.text_block(inlines, body, 0.0, false);
                self.end_block(body, false);
            }
            Block::ListItem { level, inlines } => {
                // Consecutive items form one list: margins only around it.
                let margin = if self.previous_was_list { 0.0 } else { body };
                self.begin_block(margin, true);
                let indent = LIST_INDENT_PX * (*level as f32 + 1.0);
                if let Some(first_line) = self.text_block(inlines, body, indent, false) {
                    self.bullet(first_line, indent, body);
                }
                self.end_block(body, true);
            }
            Block::Image { pixels } => {
                self.begin_block(body, false);
                self.image(pixels);
                self.end_block(body, false);
            }
        }
    }

    fn begin_block(&mut self, margin_top: f32, is_list: bool) {
        let gap = if is_list && self.previous_was_list {
            0.0
        } else {
            self.pending_margin.max(margin_top)
        };
        self.cursor += gap;
        self.pending_margin = 0.0;
    }

    fn end_block(&mut self, margin_bottom: f32, is_list: bool) {
        self.pending_margin = margin_bottom;
        self.previous_was_list = is_list;
    }

    /// Reserve `height` at the cursor, moving to the next page first when
    /// the slot would straddle a page boundary. Returns (page, top within page).
    fn place(&mut self, height: f32) -> (usize, f32) {
        let page = (self.cursor / self.page_height).floor() as usize;
        let page_end = (page as f32 + 1.0) * self.page_height;
        let page_start = page as f32 * self.page_height;
        let (page, top) = if self.cursor + height > page_end && self.cursor > page_start {
            (page + 1, page_end)
        } else {
            (page, self.cursor)
        };
        self.cursor = top + height;
        (page, top - page as f32 * self.page_height)
    }

    fn pieces(inlines: &[Inline], force_bold: bool) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut word: Vec<(String, RunStyle)> = Vec::new();
        let flush = |word: &mut Vec<(String, RunStyle)>, pieces: &mut Vec<Piece>| {
            if !word.is_empty() {
                pieces.push(Piece::Word(std::mem::take(word)));
            }
        };
        for inline in inlines {
            match inline {
                Inline::Break => {
                    flush(&mut word, &mut pieces);
                    pieces.push(Piece::Break);
                }
                Inline::Text { text, style } => {
                    let mut style = *style;
                    style.bold |= force_bold;
                    for c in text.chars() {
                        if c.is_whitespace() && c != '\t' {
                            flush(&mut word, &mut pieces);
                            if !matches!(pieces.last(), Some(Piece::Space(_)) | None) {
                                pieces.push(Piece::Space(style));
                            }
                            continue;
                        }
                        match word.last_mut() {
                            Some((t, s)) if *s == style => t.push(c),
                            _ => word.push((c.to_string(), style)),
                        }
                    }
                }
            }
        }
        flush(&mut word, &mut pieces);
        pieces
    }

    /// Wrap and place a run of inlines. Returns the page and baseline of the
    /// first line, if any line was placed.
    fn text_block(
        &mut self,
        inlines: &[Inline],
        size: f32,
        indent: f32,
        bold: bool,
    ) -> Option<(usize, f32)> {
        let first_item = self.items.len();
        let max_width = (self.content_width() - indent).max(size);
        let x0 = self.content_left() + indent;
        let mut line = Line::default();
        let mut pending_space: Option<RunStyle> = None;

        for piece in Self::pieces(inlines, bold) {
            match piece {
                Piece::Space(style) => pending_space = Some(style),
                Piece::Break => {
                    self.emit_line(std::mem::take(&mut line), x0, size);
                    pending_space = None;
                }
                Piece::Word(segments) => {
                    let word_width: f32 = segments
                        .iter()
                        .map(|(t, s)| self.faces.get(*s).text_width(t, size))
                        .sum();
                    let space = pending_space
                        .take()
                        .filter(|_| !line.is_empty())
                        .map(|s| (s, self.faces.get(s).advance(' ', size)));
                    let space_width = space.map_or(0.0, |(_, w)| w);

                    if !line.is_empty() && line.width + space_width + word_width > max_width {
                        self.emit_line(std::mem::take(&mut line), x0, size);
                    } else if let Some((style, w)) = space {
                        line.push(" ", style, w);
                    }

                    if line.is_empty() && word_width > max_width {
                        self.split_long_word(&segments, &mut line, x0, size, max_width);
                    } else {
                        for (text, style) in &segments {
                            let w = self.faces.get(*style).text_width(text, size);
                            line.push(text, *style, w);
                        }
                    }
                }
            }
        }
        if !line.is_empty() {
            self.emit_line(line, x0, size);
        }
        self.items[first_item..].iter().find_map(|(page, d)| match d {
            Drawable::Text { baseline, .. } => Some((*page, *baseline)),
            Drawable::Image { .. } => None,
        })
    }

    /// Break a word wider than the line at character boundaries.
    fn split_long_word(
        &mut self,
        segments: &[(String, RunStyle)],
        line: &mut Line,
        x0: f32,
        size: f32,
        max_width: f32,
    ) {
        for (text, style) in segments {
            for c in text.chars() {
                let w = self.faces.get(*style).advance(c, size);
                if !line.is_empty() && line.width + w > max_width {
                    self.emit_line(std::mem::take(line), x0, size);
                }
                let mut buf = [0u8; 4];
                line.push(c.encode_utf8(&mut buf), *style, w);
            }
        }
    }

    fn baseline_offset(&self, size: f32, line_height: f32) -> f32 {
        let (ascent, descent) = self.faces.get(RunStyle::default()).vertical_metrics(size);
        (line_height - (ascent + descent)) / 2.0 + ascent
    }

    /// Place one line; an empty line (from a hard break) still takes height.
    fn emit_line(&mut self, line: Line, x0: f32, size: f32) {
        let line_height = size * self.options.line_height;
        let baseline_offset = self.baseline_offset(size, line_height);
        let (page, top) = self.place(line_height);
        let mut x = x0;
        for (text, style, width) in line.runs {
            self.items.push((
                page,
                Drawable::Text {
                    x,
                    baseline: top + baseline_offset,
                    size,
                    style,
                    text,
                    width,
                },
            ));
            x += width;
        }
    }

    /// Bullet marker left of the first line of a list item.
    fn bullet(&mut self, (page, baseline): (usize, f32), indent: f32, size: f32) {
        let width = self.faces.get(RunStyle::default()).text_width(BULLET, size);
        self.items.push((
            page,
            Drawable::Text {
                x: self.content_left() + indent - width - 0.5 * size,
                baseline,
                size,
                style: RunStyle::default(),
                text: BULLET.to_string(),
                width,
            },
        ));
    }

    fn image(&mut self, pixels: &Arc<RgbaImage>) {
        let (w, h) = pixels.dimensions();
        if w == 0 || h == 0 {
            return;
        }
        let (w, h) = (w as f32, h as f32);
        // Shrink to the content width, then to one page.
        let mut scale = (self.content_width() / w).min(1.0);
        let max_height = self.page_height - self.options.padding_px;
        if h * scale > max_height {
            scale = max_height / h;
        }
        let (width, height) = (w * scale, h * scale);
        let (page, y) = self.place(height);
        self.items.push((
            page,
            Drawable::Image {
                x: self.content_left(),
                y,
                width,
                height,
                pixels: Arc::clone(pixels),
            },
        ));
    }

    fn finish(self) -> Vec<PageLayout> {
        let count = self.items.iter().map(|(p, _)| p + 1).max().unwrap_or(1);
        let mut pages = vec![PageLayout::default(); count];
        for (page, item) in self.items {
            pages[page].items.push(item);
        }
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text {
            text: s.to_string(),
            style: RunStyle::default(),
        }
    }

    fn para(s: &str) -> Block {
        Block::Paragraph {
            inlines: vec![text(s)],
        }
    }

    // An empty set renders with placeholder metrics: every char is 0.6 em.
    fn run(blocks: &[Block]) -> Vec<PageLayout> {
        layout(blocks, &RenderOptions::default(), &FontSet::default())
    }

    fn texts(page: &PageLayout) -> Vec<(&str, f32)> {
        page.items
            .iter()
            .filter_map(|d| match d {
                Drawable::Text { text, baseline, .. } => Some((text.as_str(), *baseline)),
                Drawable::Image { .. } => None,
            })
            .collect()
    }

    #[test]
    fn empty_document_has_one_blank_page() {
        let pages = run(&[]);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].items.is_empty());
    }

    #[test]
    fn short_paragraph_is_one_line() {
        let pages = run(&[para("hello   world")]);
        let t = texts(&pages[0]);
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].0, "hello world");
    }

    #[test]
    fn long_paragraph_wraps_within_content_width() {
        // 720 px content at 9.6 px per char fits 75 chars per line.
        let words = vec!["abcdefghi"; 30].join(" ");
        let pages = run(&[para(&words)]);
        let lines = texts(&pages[0]);
        assert!(lines.len() >= 4, "got {} lines", lines.len());
        for d in &pages[0].items {
            if let Drawable::Text { x, width, .. } = d {
                assert!(x + width <= 760.0 + 1e-3);
            }
        }
        // Baselines step by one line height (16 × 1.6).
        assert!((lines[1].1 - lines[0].1 - 25.6).abs() < 1e-3);
    }

    #[test]
    fn hard_break_starts_new_line() {
        let b = Block::Paragraph {
            inlines: vec![text("a"), Inline::Break, text("b")],
        };
        let pages = run(&[b]);
        let t = texts(&pages[0]).into_iter().map(|(s, _)| s).collect::<Vec<_>>();
        assert_eq!(t, vec!["a", "b"]);
    }

    #[test]
    fn headings_are_bold_and_larger() {
        let pages = run(&[Block::Heading {
            level: 1,
            inlines: vec![text("Title")],
        }]);
        match &pages[0].items[0] {
            Drawable::Text { size, style, .. } => {
                assert_eq!(*size, 32.0);
                assert!(style.bold);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mixed_styles_stay_on_one_line() {
        let b = Block::Paragraph {
            inlines: vec![
                text("plain "),
                Inline::Text {
                    text: "bold".into(),
                    style: RunStyle {
                        bold: true,
                        ..Default::default()
                    },
                },
            ],
        };
        let pages = run(&[b]);
        let t = texts(&pages[0]);
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].1, t[1].1);
    }

    #[test]
    fn list_items_get_bullets() {
        let items: Vec<Block> = (0..3)
            .map(|i| Block::ListItem {
                level: 0,
                inlines: vec![text(&format!("item {i}"))],
            })
            .collect();
        let pages = run(&items);
        let bullets = texts(&pages[0])
            .iter()
            .filter(|(s, _)| *s == BULLET)
            .count();
        assert_eq!(bullets, 3);
    }

    #[test]
    fn many_paragraphs_paginate_without_straddling() {
        let blocks: Vec<Block> = (0..200).map(|i| para(&format!("line {i}"))).collect();
        let options = RenderOptions::default();
        let page_height = options.page_slice_height_px() as f32 / options.scale;
        let pages = run(&blocks);
        assert!(pages.len() > 1);
        for page in &pages {
            for (_, baseline) in texts(page) {
                assert!(baseline > 0.0 && baseline < page_height);
            }
        }
        let total: usize = pages.iter().map(|p| texts(p).len()).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn wide_image_is_scaled_to_content_width() {
        let img = Block::Image {
            pixels: Arc::new(RgbaImage::new(1440, 100)),
        };
        let pages = run(&[img]);
        match &pages[0].items[0] {
            Drawable::Image { width, height, x, .. } => {
                assert_eq!(*x, 40.0);
                assert!((width - 720.0).abs() < 1e-3);
                assert!((height - 50.0).abs() < 1e-3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overlong_word_is_split() {
        let word = "x".repeat(200);
        let pages = run(&[para(&word)]);
        let lines = texts(&pages[0]);
        assert!(lines.len() >= 3);
        let joined: String = lines.iter().map(|(s, _)| *s).collect();
        assert_eq!(joined, word);
    }
}
