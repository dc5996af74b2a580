//! CLI binary for fileshift.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use fileshift::util::{category_label, format_file_size, output_file_name};
use fileshift::{
    available_targets, convert_to_file, ConversionConfig, ConversionProgressCallback,
    ConversionResult, Orientation, PageSize, ProgressCallback, SourceFile,
};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Per-file callback feeding the shared progress bar. Pages only show up in
/// the bar message; finished files are counted by the caller.
struct CliProgressCallback {
    bar: ProgressBar,
    name: String,
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, source_name: &str, target: &str) {
        self.bar.set_message(format!("{source_name} → {target}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        self.bar
            .set_message(format!("{}  page {page_num}/{total_pages}", self.name));
    }

    fn on_conversion_error(&self, error: &str) {
        self.bar
            .println(format!("  {} {}  {}", red("✗"), self.name, red(error)));
    }
}

fn files_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  \
         [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(TICKS);
    bar.set_style(style);
    bar.set_prefix("Converting");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert with the default target (png → jpg, docx → pdf, csv → json, ...)
  fileshift photo.png report.docx table.csv

  # Choose the target format
  fileshift --to webp photo.png

  # Write into another directory, four files at a time
  fileshift --to pdf -o out/ --jobs 4 *.docx

  # Show the available targets without converting
  fileshift --list notes.md scan.bmp

  # Machine-readable results
  fileshift --json data.json

SUPPORTED CONVERSIONS:
  png, jpg/jpeg, webp   → png, jpg, webp (any other than the source)
  docx, doc             → pdf    (pages rendered as images)
  pdf                   → docx   (plain text, one paragraph per line)
  csv ⇄ json
  md/markdown → txt,  txt → md

  bmp and gif are recognised but have no target.
"#;

/// Convert images, documents, tabular data and text between formats.
#[derive(Parser, Debug)]
#[command(
    name = "fileshift",
    version,
    about = "Convert images, documents, tabular data and text between formats",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to convert.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target format (e.g. pdf, jpg, json). Default: first available target.
    #[arg(short, long, env = "FILESHIFT_TO")]
    to: Option<String>,

    /// Directory for converted files. Default: next to each input.
    #[arg(short, long, env = "FILESHIFT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// List available targets and exit.
    #[arg(long)]
    list: bool,

    /// Print results as JSON on stdout.
    #[arg(long, env = "FILESHIFT_JSON")]
    json: bool,

    /// Number of files converted concurrently.
    #[arg(short, long, env = "FILESHIFT_JOBS", default_value_t = 4,
          value_parser = clap::value_parser!(u32).range(1..=64))]
    jobs: u32,

    /// Lossy image quality (0.0–1.0].
    #[arg(long, env = "FILESHIFT_IMAGE_QUALITY", default_value_t = 0.92)]
    image_quality: f32,

    /// Paper size for docx → pdf.
    #[arg(long, env = "FILESHIFT_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Landscape pages for docx → pdf.
    #[arg(long, env = "FILESHIFT_LANDSCAPE")]
    landscape: bool,

    /// Paragraph font for pdf → docx.
    #[arg(long, env = "FILESHIFT_DOCX_FONT", default_value = "Calibri")]
    docx_font: String,

    /// Disable progress bar.
    #[arg(long, env = "FILESHIFT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FILESHIFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FILESHIFT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
        }
    }
}

/// What happened to one input.
struct Outcome {
    input: PathBuf,
    result: Result<(PathBuf, ConversionResult)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.list {
        return list_targets(&cli).await;
    }

    let base_config = build_config(&cli)?;
    let bar = show_progress.then(|| files_bar(cli.inputs.len()));
    let started = Instant::now();

    let outcomes: Vec<Outcome> = stream::iter(cli.inputs.iter().cloned())
        .map(|input| {
            let config = with_progress(&base_config, bar.as_ref(), &input);
            let cli = &cli;
            let bar = bar.clone();
            async move {
                let result = convert_one(cli, &input, &config).await;
                if let Some(bar) = &bar {
                    if let Ok((ref out, _)) = result {
                        bar.println(format!(
                            "  {} {}  →  {}",
                            green("✓"),
                            input.display(),
                            out.display()
                        ));
                    }
                    bar.inc(1);
                }
                Outcome { input, result }
            }
        })
        .buffer_unordered(cli.jobs as usize)
        .collect()
        .await;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if cli.json {
        print_json(&outcomes)?;
    } else if !cli.quiet {
        for o in &outcomes {
            match &o.result {
                Ok((path, result)) if !show_progress => eprintln!(
                    "{} {}  →  {}  {}",
                    green("✔"),
                    o.input.display(),
                    bold(&path.display().to_string()),
                    dim(&format_file_size(result.len() as u64)),
                ),
                Err(e) if !show_progress => {
                    eprintln!("{} {}  {}", red("✘"), o.input.display(), red(&format!("{e:#}")))
                }
                _ => {}
            }
        }
        eprintln!(
            "{}  {}/{} files  {}ms",
            if failed == 0 { green("✔") } else { red("✘") },
            outcomes.len() - failed,
            outcomes.len(),
            started.elapsed().as_millis(),
        );
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} conversions failed", outcomes.len());
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    ConversionConfig::builder()
        .image_quality(cli.image_quality)
        .page_size(cli.page_size.into())
        .orientation(if cli.landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        })
        .docx_font(cli.docx_font.clone())
        .build()
        .context("Invalid configuration")
}

fn with_progress(base: &ConversionConfig, bar: Option<&ProgressBar>, input: &Path) -> ConversionConfig {
    let mut config = base.clone();
    if let Some(bar) = bar {
        let cb: ProgressCallback = Arc::new(CliProgressCallback {
            bar: bar.clone(),
            name: input.display().to_string(),
        });
        config.progress_callback = Some(cb);
    }
    config
}

async fn convert_one(
    cli: &Cli,
    input: &Path,
    config: &ConversionConfig,
) -> Result<(PathBuf, ConversionResult)> {
    let file = SourceFile::from_path(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let target = match &cli.to {
        Some(t) => t.to_ascii_lowercase(),
        None => {
            let info = available_targets(&file)
                .with_context(|| format!("{}: unsupported file type", file.name()))?;
            info.default_target()
                .with_context(|| {
                    format!(
                        "{}: {} files have no conversion target",
                        file.name(),
                        category_label(info.category)
                    )
                })?
                .to_string()
        }
    };

    let dir = match &cli.output_dir {
        Some(d) => d.clone(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let out_path = dir.join(output_file_name(file.name(), &target));

    let result = convert_to_file(&file, &target, &out_path, config)
        .await
        .with_context(|| format!("Conversion of {} failed", input.display()))?;
    Ok((out_path, result))
}

async fn list_targets(cli: &Cli) -> Result<()> {
    let mut rows = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let file = SourceFile::from_path(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;
        rows.push((input, file.size(), available_targets(&file)));
    }

    if cli.json {
        let entries: Vec<_> = rows
            .iter()
            .map(|(input, size, info)| {
                json!({
                    "input": input,
                    "size": size,
                    "category": info.as_ref().map(|i| i.category),
                    "targets": info.as_ref().map(|i| i.targets.clone()).unwrap_or_default(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialise targets")?
        );
        return Ok(());
    }

    for (input, size, info) in rows {
        let detail = match info {
            Some(info) if info.is_convertible() => format!(
                "{}  → {}",
                category_label(info.category),
                info.targets.join(", ")
            ),
            Some(info) => format!("{}  (no targets)", category_label(info.category)),
            None => "unsupported".to_string(),
        };
        println!(
            "{:<40} {:>10}  {}",
            input.display(),
            format_file_size(size),
            detail
        );
    }
    Ok(())
}

fn print_json(outcomes: &[Outcome]) -> Result<()> {
    let entries: Vec<_> = outcomes
        .iter()
        .map(|o| match &o.result {
            Ok((path, result)) => json!({
                "input": o.input,
                "output": path,
                "target": result.target(),
                "content_type": result.content_type(),
                "bytes": result.len(),
            }),
            Err(e) => json!({
                "input": o.input,
                "error": format!("{e:#}"),
            }),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&entries).context("Failed to serialise output")?
    );
    Ok(())
}
