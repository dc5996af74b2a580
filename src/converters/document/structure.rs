//! Structural model of a word-processing document.
//!
//! This is the HTML-shaped view the renderer lays out: headings `h1`–`h6`,
//! paragraphs, list items and images, with inline runs carrying
//! bold/italic/underline and hard line breaks. Anything the layout does not
//! draw (tables, fields, section properties) is flattened away when the
//! model is built.

use image::RgbaImage;
use std::sync::Arc;

/// Inline formatting of a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Styled text. Tabs are kept as `\t`.
    Text { text: String, style: RunStyle },
    /// Hard line break (`<br>`).
    Break,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `<h1>`–`<h6>`; `level` is always within 1..=6.
    Heading { level: u8, inlines: Vec<Inline> },
    /// `<p>`
    Paragraph { inlines: Vec<Inline> },
    /// `<li>` inside a bulleted list.
    ListItem { level: u8, inlines: Vec<Inline> },
    /// `<img>` with its decoded pixels.
    Image { pixels: Arc<RgbaImage> },
}

impl Block {
    pub fn inlines(&self) -> &[Inline] {
        match self {
            Block::Heading { inlines, .. }
            | Block::Paragraph { inlines }
            | Block::ListItem { inlines, .. } => inlines,
            Block::Image { .. } => &[],
        }
    }

    /// Concatenated text content, breaks as `\n`.
    pub fn plain_text(&self) -> String {
        self.inlines()
            .iter()
            .map(|i| match i {
                Inline::Text { text, .. } => text.as_str(),
                Inline::Break => "\n",
            })
            .collect()
    }

    /// Heading level for a Word paragraph style id, if it is a heading style.
    ///
    /// `Heading1`..`Heading6` map directly (deeper levels clamp to 6), `Title`
    /// is level 1 and `Subtitle` level 2.
    pub fn heading_level_for_style(style_id: &str) -> Option<u8> {
        let lower = style_id.to_ascii_lowercase();
        match lower.as_str() {
            "title" => return Some(1),
            "subtitle" => return Some(2),
            _ => {}
        }
        let rest = lower.strip_prefix("heading")?.trim_start();
        let level: u8 = rest.parse().ok()?;
        (level >= 1).then_some(level.min(6))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_styles() {
        assert_eq!(Block::heading_level_for_style("Heading1"), Some(1));
        assert_eq!(Block::heading_level_for_style("heading 3"), Some(3));
        assert_eq!(Block::heading_level_for_style("Heading9"), Some(6));
        assert_eq!(Block::heading_level_for_style("Title"), Some(1));
        assert_eq!(Block::heading_level_for_style("Subtitle"), Some(2));
        assert_eq!(Block::heading_level_for_style("Normal"), None);
        assert_eq!(Block::heading_level_for_style("HeadingX"), None);
        assert_eq!(Block::heading_level_for_style("Heading0"), None);
    }

    #[test]
    fn plain_text_joins_runs() {
        let b = Block::Paragraph {
            inlines: vec![
                Inline::Text {
                    text: "a".into(),
                    style: RunStyle::default(),
                },
                Inline::Break,
                Inline::Text {
                    text: "b".into(),
                    style: RunStyle {
                        bold: true,
                        ..Default::default()
                    },
                },
            ],
        };
        assert_eq!(b.plain_text(), "a\nb");
    }
}
