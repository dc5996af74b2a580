//! Conversion entry points: target listing and the conversion itself.
//!
//! A source file is routed by the category its extension belongs to (see
//! [`crate::format::classify`]). Converter errors are passed through
//! unchanged; the registry adds only the `UnsupportedFileType` case.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, Result};
use crate::format::classify;
use crate::output::{ConversionResult, FormatInfo};
use crate::source::SourceFile;
use crate::util::output_file_name;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// List the targets `file` can be converted to, default first.
///
/// Returns `None` when the extension belongs to no category. A recognised
/// file with no conversion (e.g. `.bmp`) yields `Some` with empty targets,
/// not `None`; check [`FormatInfo::is_convertible`] before offering one.
pub fn available_targets(file: &SourceFile) -> Option<FormatInfo> {
    let extension = file.extension();
    let category = classify(&extension)?;
    Some(FormatInfo {
        targets: category
            .legal_targets(&extension)
            .into_iter()
            .map(String::from)
            .collect(),
        category,
    })
}

/// Convert `file` to `target`.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `file`: source bytes and declared name
/// * `target`: target extension, e.g. `"pdf"` (case-insensitive)
/// * `config`: conversion configuration
///
/// # Errors
/// - [`ConvertError::UnsupportedFileType`] when the extension has no category
/// - whatever the category's converter returns, unchanged
pub async fn convert(
    file: &SourceFile,
    target: &str,
    config: &ConversionConfig,
) -> Result<ConversionResult> {
    let start = Instant::now();
    let extension = file.extension();
    let target = target.trim().to_ascii_lowercase();

    let Some(category) = classify(&extension) else {
        let err = ConvertError::UnsupportedFileType { extension };
        report_error(config, &err);
        return Err(err);
    };

    info!(
        "Converting {} ({} {}) to {}",
        file.name(),
        category,
        extension,
        target
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(file.name(), &target);
    }

    let bytes = match category
        .transcode(file.shared_bytes(), &extension, &target, config)
        .await
    {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Conversion of {} failed: {}", file.name(), e);
            report_error(config, &e);
            return Err(e);
        }
    };

    let result = ConversionResult::new(
        bytes,
        content_type(&target),
        target.as_str(),
        output_file_name(file.name(), &target),
    );
    info!(
        "Converted {} → {} ({} bytes in {}ms)",
        file.name(),
        result.file_name(),
        result.len(),
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(result.len());
    }
    Ok(result)
}

fn report_error(config: &ConversionConfig, err: &ConvertError) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_error(&err.to_string());
    }
}

/// Convert `file` and write the result to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    file: &SourceFile,
    target: &str,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionResult> {
    let result = convert(file, target, config).await?;
    let path = output_path.as_ref();
    let write_failed = |source| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension(format!("{}.tmp", result.target()));
    tokio::fs::write(&tmp_path, result.bytes())
        .await
        .map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }
    debug!("Wrote {}", path.display());
    Ok(result)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    file: &SourceFile,
    target: &str,
    config: &ConversionConfig,
) -> Result<ConversionResult> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(file, target, config))
}

/// MIME type of a target extension; `application/octet-stream` when unknown.
pub fn content_type(target: &str) -> &'static str {
    match target {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "json" => "application/json",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Category;
    use crate::progress::ConversionProgressCallback;
    use std::sync::{Arc, Mutex};

    #[test]
    fn targets_for_known_and_unknown_files() {
        let csv = available_targets(&SourceFile::new("a.CSV", "x")).unwrap();
        assert_eq!(csv.targets, vec!["json"]);
        assert_eq!(csv.category, Category::Data);

        let bmp = available_targets(&SourceFile::new("scan.bmp", Vec::<u8>::new())).unwrap();
        assert!(bmp.targets.is_empty());

        assert!(available_targets(&SourceFile::new("archive.zip", Vec::<u8>::new())).is_none());
        assert!(available_targets(&SourceFile::new("README", Vec::<u8>::new())).is_none());
    }

    #[tokio::test]
    async fn unknown_extension_is_unsupported_file_type() {
        let err = convert(
            &SourceFile::new("movie.mp4", vec![1u8, 2, 3]),
            "png",
            &ConversionConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnsupportedFileType { ref extension } if extension == "mp4"
        ));
    }

    #[tokio::test]
    async fn result_carries_name_and_content_type() {
        let file = SourceFile::new("notes.md", "# Hi\n\nSome *text*");
        let result = convert(&file, "TXT", &ConversionConfig::default())
            .await
            .unwrap();
        assert_eq!(result.file_name(), "notes.txt");
        assert_eq!(result.content_type(), "text/plain");
        assert_eq!(result.target(), "txt");
        assert_eq!(result.bytes(), b"Hi\n\nSome text");
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ConversionProgressCallback for Recorder {
        fn on_conversion_start(&self, source_name: &str, target: &str) {
            self.0.lock().unwrap().push(format!("start {source_name} {target}"));
        }
        fn on_conversion_complete(&self, output_len: usize) {
            self.0.lock().unwrap().push(format!("done {output_len}"));
        }
        fn on_conversion_error(&self, _error: &str) {
            self.0.lock().unwrap().push("error".into());
        }
    }

    #[tokio::test]
    async fn progress_events_bracket_the_conversion() {
        let recorder = Arc::new(Recorder::default());
        let config = ConversionConfig::builder()
            .progress_callback(recorder.clone())
            .build()
            .unwrap();

        convert(&SourceFile::new("t.txt", "Title"), "md", &config)
            .await
            .unwrap();
        convert(&SourceFile::new("d.json", "{}"), "csv", &config)
            .await
            .unwrap_err();

        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["start t.txt md", "done 8", "start d.json csv", "error"]
        );
    }

    #[test]
    fn sync_wrapper_converts() {
        let file = SourceFile::new("rows.csv", "a,b\n1,2");
        let result = convert_sync(&file, "json", &ConversionConfig::default()).unwrap();
        assert_eq!(result.content_type(), "application/json");
        let value: serde_json::Value = serde_json::from_slice(result.bytes()).unwrap();
        assert_eq!(value[0]["b"], "2");
    }

    #[tokio::test]
    async fn writes_file_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("data.csv");
        let file = SourceFile::new("data.json", r#"[{"a":1}]"#);
        let result = convert_to_file(&file, "csv", &out, &ConversionConfig::default())
            .await
            .unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), result.bytes());
        assert!(!out.with_extension("csv.tmp").exists());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type("jpeg"), "image/jpeg");
        assert_eq!(content_type("md"), "text/markdown");
        assert_eq!(content_type("xyz"), "application/octet-stream");
    }
}
