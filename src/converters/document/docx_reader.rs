//! OOXML (`.docx`) → structural blocks.
//!
//! A `.docx` file is a ZIP package; the body lives in `word/document.xml`.
//! Embedded pictures are referenced by relationship id (`r:embed` on
//! `a:blip`, `r:id` on VML `v:imagedata`) and resolved through
//! `word/_rels/document.xml.rels` to parts under `word/media/`.

use super::structure::{Block, Inline, RunStyle};
use crate::error::{ConvertError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;
use tracing::{debug, warn};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// Parse a Word package into blocks, in document order.
///
/// Empty paragraphs are dropped. Pictures that cannot be found or decoded
/// are skipped with a warning rather than failing the document.
pub fn read_docx(bytes: &[u8]) -> Result<Vec<Block>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ConvertError::decode("docx", format!("not an OOXML package: {e}")))?;

    let xml = read_part_to_string(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
        ConvertError::decode("docx", format!("package has no {DOCUMENT_PART}"))
    })?;
    let rels = match read_part_to_string(&mut archive, DOCUMENT_RELS_PART)? {
        Some(rels_xml) => parse_relationships(&rels_xml)?,
        None => HashMap::new(),
    };

    let pending = parse_document_xml(&xml)?;
    let mut blocks = Vec::with_capacity(pending.len());
    for item in pending {
        match item {
            Pending::Block(b) => blocks.push(b),
            Pending::Image(rel_id) => {
                if let Some(block) = load_image(&mut archive, &rels, &rel_id) {
                    blocks.push(block);
                }
            }
        }
    }
    debug!("Parsed {} blocks from {}", blocks.len(), DOCUMENT_PART);
    Ok(blocks)
}

fn read_part_to_string<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut content = String::new();
            file.read_to_string(&mut content)
                .map_err(|e| ConvertError::decode("docx", format!("failed to read {name}: {e}")))?;
            Ok(Some(content))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(ConvertError::decode("docx", format!("failed to open {name}: {e}"))),
    }
}

/// Relationship id → package path of the target part.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let external = get_attribute(e, "TargetMode").as_deref() == Some("External");
                if let (Some(id), Some(target), false) =
                    (get_attribute(e, "Id"), get_attribute(e, "Target"), external)
                {
                    rels.insert(id, resolve_part_path(&target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConvertError::decode(
                    "docx",
                    format!("malformed {DOCUMENT_RELS_PART}: {e}"),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Targets are relative to `word/` unless absolute within the package.
fn resolve_part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let mut parts: Vec<&str> = vec!["word"];
            for segment in target.split('/') {
                match segment {
                    "" | "." => {}
                    ".." => {
                        parts.pop();
                    }
                    s => parts.push(s),
                }
            }
            parts.join("/")
        }
    }
}

fn load_image<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    rels: &HashMap<String, String>,
    rel_id: &str,
) -> Option<Block> {
    let Some(path) = rels.get(rel_id) else {
        warn!("Picture relationship {} has no target; skipped", rel_id);
        return None;
    };
    let mut data = Vec::new();
    match archive.by_name(path) {
        Ok(mut file) => {
            if let Err(e) = file.read_to_end(&mut data) {
                warn!("Could not read picture {}: {}", path, e);
                return None;
            }
        }
        Err(e) => {
            warn!("Picture part {} missing: {}", path, e);
            return None;
        }
    }
    match crate::converters::image::decode_oriented(&data) {
        Ok(img) => Some(Block::Image {
            pixels: Arc::new(img.to_rgba8()),
        }),
        Err(e) => {
            warn!("Skipping undecodable picture {}: {}", path, e);
            None
        }
    }
}

// ── document.xml ─────────────────────────────────────────────────────────────

/// A block whose picture still has to be fetched from the package.
#[derive(Debug)]
enum Pending {
    Block(Block),
    Image(String),
}

#[derive(Debug)]
enum Item {
    Inline(Inline),
    Image(String),
}

#[derive(Debug, Default)]
struct ParagraphBuilder {
    heading: Option<u8>,
    list_level: Option<u8>,
    items: Vec<Item>,
}

impl ParagraphBuilder {
    fn push_text(&mut self, text: &str, style: RunStyle) {
        if let Some(Item::Inline(Inline::Text { text: last, style: s })) = self.items.last_mut() {
            if *s == style {
                last.push_str(text);
                return;
            }
        }
        self.items.push(Item::Inline(Inline::Text {
            text: text.to_string(),
            style,
        }));
    }

    fn make_block(&self, inlines: Vec<Inline>) -> Block {
        match (self.heading, self.list_level) {
            (Some(level), _) => Block::Heading { level, inlines },
            (None, Some(level)) => Block::ListItem { level, inlines },
            (None, None) => Block::Paragraph { inlines },
        }
    }

    /// Split at pictures; text on either side becomes its own block.
    fn finish(self, out: &mut Vec<Pending>) {
        let mut inlines = Vec::new();
        let flush = |inlines: &mut Vec<Inline>, out: &mut Vec<Pending>| {
            let block = self.make_block(std::mem::take(inlines));
            if !block.plain_text().trim().is_empty() {
                out.push(Pending::Block(block));
            }
        };
        for item in &self.items {
            match item {
                Item::Inline(i) => inlines.push(i.clone()),
                Item::Image(id) => {
                    flush(&mut inlines, out);
                    out.push(Pending::Image(id.clone()));
                }
            }
        }
        flush(&mut inlines, out);
    }
}

#[derive(Debug, Default)]
struct DocumentParser {
    out: Vec<Pending>,
    // Text boxes nest paragraphs inside paragraphs.
    paragraphs: Vec<ParagraphBuilder>,
    in_run: bool,
    in_run_props: bool,
    in_text: bool,
    style: RunStyle,
}

impl DocumentParser {
    fn current(&mut self) -> Option<&mut ParagraphBuilder> {
        self.paragraphs.last_mut()
    }

    fn open(&mut self, e: &BytesStart<'_>) {
        match e.local_name().as_ref() {
            b"p" => self.paragraphs.push(ParagraphBuilder::default()),
            b"r" => {
                self.in_run = true;
                self.style = RunStyle::default();
            }
            b"rPr" if self.in_run => self.in_run_props = true,
            b"t" if self.in_run => self.in_text = true,
            b"b" if self.in_run_props => self.style.bold = toggle_on(e),
            b"i" if self.in_run_props => self.style.italic = toggle_on(e),
            b"u" if self.in_run_props => {
                self.style.underline = get_attribute(e, "val").as_deref() != Some("none")
                    && toggle_on(e);
            }
            b"br" | b"cr" if self.in_run => {
                if let Some(p) = self.current() {
                    p.items.push(Item::Inline(Inline::Break));
                }
            }
            b"tab" if self.in_run => {
                let style = self.style;
                if let Some(p) = self.current() {
                    p.push_text("\t", style);
                }
            }
            b"pStyle" => {
                if let Some(val) = get_attribute(e, "val") {
                    if let Some(p) = self.current() {
                        p.heading = Block::heading_level_for_style(&val);
                    }
                }
            }
            b"numPr" => {
                if let Some(p) = self.current() {
                    p.list_level.get_or_insert(0);
                }
            }
            b"ilvl" => {
                let level = get_attribute(e, "val").and_then(|v| v.parse::<u8>().ok());
                if let (Some(p), Some(level)) = (self.current(), level) {
                    p.list_level = Some(level.min(8));
                }
            }
            b"blip" => self.push_image(get_attribute(e, "embed")),
            b"imagedata" => self.push_image(get_attribute(e, "id")),
            _ => {}
        }
    }

    fn push_image(&mut self, rel_id: Option<String>) {
        if let (Some(p), Some(id)) = (self.paragraphs.last_mut(), rel_id) {
            p.items.push(Item::Image(id));
        }
    }

    fn close(&mut self, local_name: &[u8]) {
        match local_name {
            b"p" => {
                if let Some(p) = self.paragraphs.pop() {
                    p.finish(&mut self.out);
                }
            }
            b"r" => {
                self.in_run = false;
                self.in_run_props = false;
                self.in_text = false;
            }
            b"rPr" => self.in_run_props = false,
            b"t" => self.in_text = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let style = self.style;
        if let Some(p) = self.current() {
            p.push_text(text, style);
        }
    }
}

fn parse_document_xml(xml: &str) -> Result<Vec<Pending>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut parser = DocumentParser::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => parser.open(e),
            Ok(Event::Empty(ref e)) => {
                parser.open(e);
                parser.close(e.local_name().as_ref());
            }
            Ok(Event::End(ref e)) => parser.close(e.local_name().as_ref()),
            Ok(Event::Text(ref e)) if parser.in_text => {
                let text = e.unescape().map_err(|err| {
                    ConvertError::decode("docx", format!("bad text in {DOCUMENT_PART}: {err}"))
                })?;
                parser.text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConvertError::decode(
                    "docx",
                    format!(
                        "malformed {DOCUMENT_PART} at byte {}: {e}",
                        reader.buffer_position()
                    ),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    // Unclosed paragraphs at EOF still carry content.
    while let Some(p) = parser.paragraphs.pop() {
        p.finish(&mut parser.out);
    }
    Ok(parser.out)
}

/// On/off properties are on unless `w:val` says otherwise.
fn toggle_on(e: &BytesStart<'_>) -> bool {
    !matches!(
        get_attribute(e, "val").as_deref(),
        Some("0" | "false" | "off")
    )
}

/// Attribute value by local name (namespace prefix ignored).
fn get_attribute(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#;

    fn body(inner: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:document {W_NS}><w:body>{inner}</w:body></w:document>"#)
    }

    fn blocks(inner: &str) -> Vec<Block> {
        parse_document_xml(&body(inner))
            .unwrap()
            .into_iter()
            .filter_map(|p| match p {
                Pending::Block(b) => Some(b),
                Pending::Image(_) => None,
            })
            .collect()
    }

    fn package(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn headings_and_paragraphs() {
        let b = blocks(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Intro</w:t></w:r></w:p>
               <w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>"#,
        );
        assert_eq!(b.len(), 2);
        assert!(matches!(&b[0], Block::Heading { level: 2, .. }));
        assert_eq!(b[0].plain_text(), "Intro");
        assert!(matches!(&b[1], Block::Paragraph { .. }));
        assert_eq!(b[1].plain_text(), "Hello world");
    }

    #[test]
    fn run_styles_honour_explicit_off() {
        let b = blocks(
            r#"<w:p>
                 <w:r><w:rPr><w:b/><w:i w:val="0"/></w:rPr><w:t>bold</w:t></w:r>
                 <w:r><w:rPr><w:u w:val="single"/><w:b w:val="false"/></w:rPr><w:t>under</w:t></w:r>
                 <w:r><w:rPr><w:u w:val="none"/></w:rPr><w:t>plain</w:t></w:r>
               </w:p>"#,
        );
        let styles: Vec<RunStyle> = b[0]
            .inlines()
            .iter()
            .filter_map(|i| match i {
                Inline::Text { style, .. } => Some(*style),
                Inline::Break => None,
            })
            .collect();
        assert_eq!(
            styles,
            vec![
                RunStyle {
                    bold: true,
                    ..Default::default()
                },
                RunStyle {
                    underline: true,
                    ..Default::default()
                },
                RunStyle::default(),
            ]
        );
    }

    #[test]
    fn paragraph_mark_properties_do_not_leak_into_runs() {
        let b = blocks(
            r#"<w:p><w:pPr><w:rPr><w:b/></w:rPr></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            b[0].inlines()[0],
            Inline::Text {
                text: "x".into(),
                style: RunStyle::default()
            }
        );
    }

    #[test]
    fn breaks_tabs_and_entities() {
        let b = blocks(
            r#"<w:p><w:r><w:t>a&amp;b</w:t><w:tab/><w:t>c</w:t><w:br/><w:t>d</w:t></w:r></w:p>"#,
        );
        assert_eq!(b[0].plain_text(), "a&b\tc\nd");
    }

    #[test]
    fn list_items_and_empty_paragraphs() {
        let b = blocks(
            r#"<w:p/>
               <w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr></w:pPr><w:r><w:t>item</w:t></w:r></w:p>
               <w:p><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p>"#,
        );
        assert_eq!(b.len(), 1);
        assert!(matches!(&b[0], Block::ListItem { level: 1, .. }));
    }

    #[test]
    fn picture_splits_paragraph() {
        let pending = parse_document_xml(&body(
            r#"<w:p><w:r><w:t>before</w:t></w:r><w:r><w:drawing><a:blip r:embed="rId7"/></w:drawing></w:r><w:r><w:t>after</w:t></w:r></w:p>"#,
        ))
        .unwrap();
        assert_eq!(pending.len(), 3);
        assert!(matches!(&pending[1], Pending::Image(id) if id == "rId7"));
    }

    #[test]
    fn relationship_targets_resolve_under_word() {
        assert_eq!(resolve_part_path("media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_part_path("../media/x.png"), "media/x.png");
        assert_eq!(resolve_part_path("/word/media/y.png"), "word/media/y.png");
    }

    #[test]
    fn reads_package_with_picture() {
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(image::RgbaImage::new(3, 2))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let rels = r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/></Relationships>"#;
        let doc = body(
            r#"<w:p><w:r><w:t>Caption</w:t></w:r></w:p><w:p><w:r><w:drawing><a:blip r:embed="rId1"/></w:drawing></w:r></w:p>"#,
        );
        let bytes = package(&[
            (DOCUMENT_PART, doc.as_bytes()),
            (DOCUMENT_RELS_PART, rels.as_bytes()),
            ("word/media/image1.png", png.as_slice()),
        ]);

        let blocks = read_docx(&bytes).unwrap();
        assert_eq!(blocks.len(), 2);
        match &blocks[1] {
            Block::Image { pixels } => assert_eq!(pixels.dimensions(), (3, 2)),
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn missing_picture_is_skipped() {
        let doc = body(r#"<w:p><w:r><w:drawing><a:blip r:embed="rId9"/></w:drawing></w:r></w:p>"#);
        let bytes = package(&[(DOCUMENT_PART, doc.as_bytes())]);
        assert!(read_docx(&bytes).unwrap().is_empty());
    }

    #[test]
    fn non_zip_is_decode_error() {
        let err = read_docx(b"\xD0\xCF\x11\xE0 legacy binary doc").unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }));
    }

    #[test]
    fn package_without_document_part() {
        let bytes = package(&[("hello.txt", &b"hi"[..])]);
        let err = read_docx(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }
}
