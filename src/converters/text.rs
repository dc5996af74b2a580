//! Plain text ⇄ Markdown.
//!
//! Markdown → text is an ordered list of independent string passes. Order
//! matters: emphasis is unwrapped before links so link text comes out clean,
//! and blank-line collapsing runs after every removal that can leave gaps.
//!
//! Text → Markdown is a line heuristic: short, unpunctuated lines that do
//! not continue a paragraph become level-2 headings. It misfires on short
//! sentences without a full stop; that is accepted behaviour.

use crate::error::{ConvertError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub fn legal_targets(extension: &str) -> Vec<&'static str> {
    match extension {
        "md" | "markdown" => vec!["txt"],
        "txt" => vec!["md"],
        _ => vec![],
    }
}

/// Convert UTF-8 text (decoded lossily, BOM dropped) between the two
/// representations.
pub fn transcode(bytes: &[u8], extension: &str, target: &str) -> Result<Vec<u8>> {
    let text = super::decode_text(bytes);
    let out = match (extension, target) {
        ("md" | "markdown", "txt") => markdown_to_plain_text(&text),
        ("txt", "md") => plain_text_to_markdown(&text),
        _ => return Err(ConvertError::unsupported_conversion(extension, target)),
    };
    debug!(
        "text {} → {}: {} → {} bytes",
        extension,
        target,
        bytes.len(),
        out.len()
    );
    Ok(out.into_bytes())
}

// ── Markdown → plain text ────────────────────────────────────────────────────

type Pass = (&'static str, fn(&str) -> String);

/// The stripping passes, applied strictly in this order.
static STRIP_PASSES: &[Pass] = &[
    ("heading markers", strip_heading_markers),
    ("strong (**)", unwrap_strong_asterisk),
    ("emphasis (*)", unwrap_emphasis_asterisk),
    ("strong (__)", unwrap_strong_underscore),
    ("emphasis (_)", unwrap_emphasis_underscore),
    ("links", unwrap_links),
    ("images", drop_images),
    ("fenced code", drop_fenced_code),
    ("inline code", unwrap_inline_code),
    ("blockquotes", strip_blockquote_markers),
    ("horizontal rules", drop_horizontal_rules),
    ("bullets", replace_bullet_markers),
    ("numbered lists", strip_numbered_markers),
    ("blank lines", collapse_blank_lines),
    ("trim", trim),
];

/// Strip Markdown syntax, keeping the readable text.
pub fn markdown_to_plain_text(md: &str) -> String {
    STRIP_PASSES
        .iter()
        .fold(md.to_string(), |text, (_name, pass)| pass(&text))
}

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());

fn strip_heading_markers(input: &str) -> String {
    RE_HEADING.replace_all(input, "").into_owned()
}

static RE_STRONG_ASTERISK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static RE_EMPHASIS_ASTERISK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static RE_STRONG_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.+?)__").unwrap());
static RE_EMPHASIS_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(.+?)_").unwrap());

fn unwrap_strong_asterisk(input: &str) -> String {
    RE_STRONG_ASTERISK.replace_all(input, "$1").into_owned()
}

fn unwrap_emphasis_asterisk(input: &str) -> String {
    RE_EMPHASIS_ASTERISK.replace_all(input, "$1").into_owned()
}

fn unwrap_strong_underscore(input: &str) -> String {
    RE_STRONG_UNDERSCORE.replace_all(input, "$1").into_owned()
}

fn unwrap_emphasis_underscore(input: &str) -> String {
    RE_EMPHASIS_UNDERSCORE.replace_all(input, "$1").into_owned()
}

// A link is any `[text](url)` not preceded by `!`; images are left for the
// next pass to drop.
static RE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|[^!])\[(.+?)\]\(.+?\)").unwrap());

fn unwrap_links(input: &str) -> String {
    // Adjacent links share the separating character, so one sweep can miss
    // every second one.
    let mut text = input.to_string();
    loop {
        let next = RE_LINK.replace_all(&text, "${1}${2}").into_owned();
        if next == text {
            return text;
        }
        text = next;
    }
}

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[.*?\]\(.+?\)").unwrap());

fn drop_images(input: &str) -> String {
    RE_IMAGE.replace_all(input, "").into_owned()
}

static RE_FENCED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.+?)`").unwrap());

fn drop_fenced_code(input: &str) -> String {
    RE_FENCED_CODE.replace_all(input, "").into_owned()
}

fn unwrap_inline_code(input: &str) -> String {
    RE_INLINE_CODE.replace_all(input, "$1").into_owned()
}

static RE_BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^>\s+").unwrap());

fn strip_blockquote_markers(input: &str) -> String {
    RE_BLOCKQUOTE.replace_all(input, "").into_owned()
}

static RE_HORIZONTAL_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[-*_]{3,}[ \t]*$").unwrap());

fn drop_horizontal_rules(input: &str) -> String {
    RE_HORIZONTAL_RULE.replace_all(input, "").into_owned()
}

static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+").unwrap());
static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d+\.[ \t]+").unwrap());

fn replace_bullet_markers(input: &str) -> String {
    RE_BULLET.replace_all(input, "• ").into_owned()
}

fn strip_numbered_markers(input: &str) -> String {
    RE_NUMBERED.replace_all(input, "").into_owned()
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

fn trim(input: &str) -> String {
    input.trim().to_string()
}

// ── Plain text → Markdown ────────────────────────────────────────────────────

// Counted in Unicode scalar values, so an emoji or other astral-plane
// character counts once rather than as a UTF-16 surrogate pair.
const HEADING_MAX_CHARS: usize = 60;

static RE_LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());

/// Rebuild paragraphs and headings from plain text.
pub fn plain_text_to_markdown(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_paragraph = false;

    for line in RE_LINE_BREAK.split(text) {
        let line = line.trim();
        if line.is_empty() {
            if in_paragraph {
                out.push(String::new());
                in_paragraph = false;
            }
            continue;
        }

        if !in_paragraph && looks_like_heading(line) {
            out.push(format!("## {line}"));
            out.push(String::new());
        } else {
            out.push(line.to_string());
            in_paragraph = true;
        }
    }

    out.join("\n").trim().to_string()
}

fn looks_like_heading(line: &str) -> bool {
    line.chars().count() < HEADING_MAX_CHARS
        && !line.ends_with(['.', ',', ':', ';', '!', '?'])
}
