//! CSV ⇄ JSON.
//!
//! CSV is read with a small line tokenizer rather than a full RFC 4180
//! reader: records never span lines, and every field is trimmed. JSON is
//! written as an array of objects whose keys keep the header order.

use crate::error::{ConvertError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

pub fn legal_targets(extension: &str) -> Vec<&'static str> {
    match extension {
        "csv" => vec!["json"],
        "json" => vec!["csv"],
        _ => vec![],
    }
}

pub fn transcode(bytes: &[u8], extension: &str, target: &str) -> Result<Vec<u8>> {
    let text = super::decode_text(bytes);
    let out = match (extension, target) {
        ("csv", "json") => csv_to_json(&text)?,
        ("json", "csv") => json_to_csv(&text)?,
        _ => return Err(ConvertError::unsupported_conversion(extension, target)),
    };
    debug!(
        "data {} → {}: {} → {} bytes",
        extension,
        target,
        bytes.len(),
        out.len()
    );
    Ok(out.into_bytes())
}

// ── CSV → JSON ───────────────────────────────────────────────────────────────

static RE_LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());

/// Parse CSV into records keyed by the header row.
///
/// Fewer than two lines (no data rows) yields an empty list. Short rows are
/// padded with empty strings; values past the last header are ignored. A
/// repeated header keeps its first position and takes the later value.
pub fn parse_csv(text: &str) -> Vec<Map<String, Value>> {
    let lines: Vec<&str> = RE_LINE_BREAK.split(text.trim()).collect();
    if lines.len() < 2 {
        return Vec::new();
    }

    let headers = tokenize_line(lines[0]);
    lines[1..]
        .iter()
        .map(|line| {
            let mut values = tokenize_line(line).into_iter();
            let mut record = Map::new();
            for header in &headers {
                let value = values.next().unwrap_or_default();
                record.insert(header.clone(), Value::String(value));
            }
            record
        })
        .collect()
}

/// Split one CSV line into trimmed fields.
///
/// Double quotes toggle quoting; `""` inside quotes is a literal quote;
/// commas only separate fields outside quotes.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => current.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current).trim().to_string()),
                _ => current.push(c),
            }
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn csv_to_json(text: &str) -> Result<String> {
    let records = parse_csv(text);
    serde_json::to_string_pretty(&records).map_err(|e| ConvertError::encode("json", e))
}

// ── JSON → CSV ───────────────────────────────────────────────────────────────

fn json_to_csv(text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ConvertError::InvalidInput(format!("not valid JSON: {e}")))?;
    let Value::Array(items) = value else {
        return Err(ConvertError::InvalidInput(
            "JSON must be an array of objects".into(),
        ));
    };
    write_csv(&items)
}

/// Serialise an array of objects as CSV, with headers from the first element.
///
/// Later elements contribute no headers; their missing keys render empty.
/// Header cells are quoted like data cells. Nested arrays and objects
/// render as compact JSON (`[1,2]`), not as their joined elements.
pub fn write_csv(items: &[Value]) -> Result<String> {
    let Some(first) = items.first() else {
        return Ok(String::new());
    };
    let Value::Object(first) = first else {
        return Err(ConvertError::InvalidInput(
            "JSON must be an array of objects".into(),
        ));
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| quote_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for item in items {
        let row = headers
            .iter()
            .map(|h| {
                let cell = item.get(h.as_str()).map(render_value).unwrap_or_default();
                quote_field(&cell)
            })
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }
    Ok(lines.join("\n"))
}

/// Stringify one cell: null is empty, scalars print bare, containers print
/// as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => render_number(n),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

// Integral floats print without a fractional part (`3.0` → `3`).
fn render_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

fn quote_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
