//! Small presentation helpers shared by callers of the registry.

use crate::format::Category;

/// Human-readable byte size with one decimal: `0 B`, `512 B`, `1.5 KB`.
///
/// Whole values drop the decimal (`2 KB`, not `2.0 KB`). Sizes beyond the
/// gigabyte range stay in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut exp = 0usize;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && exp < UNITS.len() - 1 {
        scaled /= 1024.0;
        exp += 1;
    }
    let rounded = (scaled * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[exp])
    } else {
        format!("{:.1} {}", rounded, UNITS[exp])
    }
}

/// Display label for a category.
pub fn category_label(category: Category) -> &'static str {
    match category {
        Category::Image => "Image",
        Category::Document => "Document",
        Category::Data => "Data",
        Category::Text => "Text",
    }
}

const ACCEPTED_FILE_TYPES: &[(&str, &[&str])] = &[
    ("image/png", &[".png"]),
    ("image/jpeg", &[".jpg", ".jpeg"]),
    ("image/webp", &[".webp"]),
    ("image/bmp", &[".bmp"]),
    ("image/gif", &[".gif"]),
    ("application/pdf", &[".pdf"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &[".docx"],
    ),
    ("application/msword", &[".doc"]),
    ("text/csv", &[".csv"]),
    ("application/json", &[".json"]),
    ("text/plain", &[".txt"]),
    ("text/markdown", &[".md"]),
];

/// MIME type → extensions accepted by a file picker.
pub fn accepted_file_types() -> Vec<(&'static str, &'static [&'static str])> {
    ACCEPTED_FILE_TYPES.to_vec()
}

/// Replace the final extension of `original` with `target`.
///
/// Names without an extension get one appended.
pub fn output_file_name(original: &str, target: &str) -> String {
    let base = match original.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => stem,
        _ => original.trim_end_matches('.'),
    };
    format!("{base}.{target}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn labels() {
        assert_eq!(category_label(Category::Data), "Data");
        assert_eq!(category_label(Category::Text), "Text");
    }

    #[test]
    fn output_names() {
        assert_eq!(output_file_name("report.docx", "pdf"), "report.pdf");
        assert_eq!(output_file_name("my.photo.jpeg", "png"), "my.photo.png");
        assert_eq!(output_file_name("README", "md"), "README.md");
    }

    #[test]
    fn picker_covers_every_classified_extension_but_markdown_alias() {
        let listed: Vec<&str> = accepted_file_types()
            .into_iter()
            .flat_map(|(_, exts)| exts.iter().map(|e| e.trim_start_matches('.')))
            .collect();
        for c in Category::ALL {
            for ext in c.extensions() {
                if *ext == "markdown" {
                    continue;
                }
                assert!(listed.contains(ext), "{ext} missing from picker list");
            }
        }
    }
}
