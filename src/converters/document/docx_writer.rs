//! Plain paragraphs → minimal OOXML (`.docx`) package.
//!
//! The package holds the three parts Word needs to open a document:
//! `[Content_Types].xml`, `_rels/.rels` and `word/document.xml`. Every
//! paragraph is one run in the configured font and size.

use crate::config::DocxOptions;
use crate::error::{ConvertError, Result};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

/// A4 portrait in twentieths of a point, one-inch margins.
const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

/// Build a `.docx` with one paragraph per entry. Empty strings become empty
/// paragraphs.
pub fn write_docx(paragraphs: &[String], options: &DocxOptions) -> Result<Vec<u8>> {
    let document = document_xml(paragraphs, options);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, file_options)
            .map_err(|e| ConvertError::encode("docx", e))?;
        zip.write_all(body.as_bytes())
            .map_err(|e| ConvertError::encode("docx", e))?;
    }
    let cursor = zip.finish().map_err(|e| ConvertError::encode("docx", e))?;
    Ok(cursor.into_inner())
}

fn document_xml(paragraphs: &[String], options: &DocxOptions) -> String {
    let font = escape(options.font.as_str());
    let size = options.font_size_half_points;
    let run_props = format!(
        r#"<w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr>"#
    );

    let mut xml = String::from(DOCUMENT_HEAD);
    for text in paragraphs {
        let clean = xml_safe(text);
        if clean.is_empty() {
            xml.push_str("<w:p/>");
            continue;
        }
        xml.push_str("<w:p><w:r>");
        xml.push_str(&run_props);
        xml.push_str(r#"<w:t xml:space="preserve">"#);
        xml.push_str(&escape(clean.as_str()));
        xml.push_str("</w:t></w:r></w:p>");
    }
    xml.push_str(SECTION);
    xml.push_str("</w:body></w:document>");
    xml
}

/// Drop characters XML 1.0 cannot carry (C0 controls other than tab,
/// newline and carriage return).
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r') || c as u32 >= 0x7F)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::docx_reader::read_docx;
    use std::io::Read;

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn package_has_required_parts() {
        let bytes = write_docx(&["Hello".into()], &DocxOptions::default()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for required in ["[Content_Types].xml", "_rels/.rels", "word/document.xml"] {
            assert!(names.contains(&required), "missing {required}");
        }
    }

    #[test]
    fn runs_carry_font_and_size() {
        let options = DocxOptions {
            font: "Georgia".into(),
            font_size_half_points: 28,
        };
        let bytes = write_docx(&["x".into()], &options).unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert!(xml.contains(r#"w:ascii="Georgia""#));
        assert!(xml.contains(r#"<w:sz w:val="28"/>"#));
        assert!(xml.contains("<w:pgSz w:w=\"11906\" w:h=\"16838\"/>"));
    }

    #[test]
    fn escapes_markup_and_strips_controls() {
        let bytes = write_docx(
            &["a < b & \"c\"\u{1}".into(), String::new()],
            &DocxOptions::default(),
        )
        .unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert!(xml.contains("a &lt; b &amp; &quot;c&quot;</w:t>"));
        assert!(xml.contains("<w:p/>"));
        assert!(!xml.contains('\u{1}'));
    }

    #[test]
    fn reader_sees_written_paragraphs() {
        let paragraphs = vec!["First line".to_string(), String::new(), "Second".to_string()];
        let bytes = write_docx(&paragraphs, &DocxOptions::default()).unwrap();
        let texts: Vec<String> = read_docx(&bytes)
            .unwrap()
            .iter()
            .map(|b| b.plain_text())
            .collect();
        assert_eq!(texts, vec!["First line", "Second"]);
    }
}
