//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`
//! and prints one status line per file.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_md2pdf::{
    convert_batch, plan, BatchConfig, ConversionProgressCallback, FileOrder, FileResult,
    ProgressCallback, ReportPolicy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
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

// ── Status reporting ─────────────────────────────────────────────────────────

type Sink = Mutex<Box<dyn Write + Send>>;

/// The line printed to stdout for each converted file.
fn converted_line(file_name: &str) -> String {
    format!("Converted {file_name}")
}

/// Prints `Converted <name>` to stdout for each converted file and
/// `Failed <name>: <reason>` to stderr for each failure, optionally under an
/// indicatif spinner on stderr.
struct StatusCallback {
    /// `None` when the spinner is disabled.
    bar: Option<ProgressBar>,
    quiet: bool,
    out: Sink,
    err: Sink,
}

impl StatusCallback {
    fn new(show_progress: bool, quiet: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:32.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Converting");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self::with_writers(
            bar,
            quiet,
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        ))
    }

    fn with_writers(
        bar: Option<ProgressBar>,
        quiet: bool,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            bar,
            quiet,
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    /// Write one line without tearing the spinner.
    fn emit(&self, sink: &Sink, line: &str) {
        let write = || {
            if let Ok(mut w) = sink.lock() {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        };
        match self.bar {
            Some(ref bar) => bar.suspend(write),
            None => write(),
        }
    }
}

impl ConversionProgressCallback for StatusCallback {
    fn on_batch_start(&self, total_files: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_length(total_files as u64);
        }
    }

    fn on_file_start(&self, _index: usize, _total: usize, file_name: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(file_name.to_string());
        }
    }

    fn on_file_complete(&self, _index: usize, _total: usize, result: &FileResult) {
        if !self.quiet {
            self.emit(&self.out, &converted_line(&result.file_name));
        }
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn on_file_error(&self, _index: usize, _total: usize, result: &FileResult) {
        let reason = result
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
        self.emit(
            &self.err,
            &format!("{} {}: {}", red("Failed"), result.file_name, reason),
        );
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&self, _total: usize, _success: usize) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every *.md in the current directory into ./generated-pdfs/
  md2pdf

  # Convert a docs folder into a custom output directory
  md2pdf docs -o build/pdf

  # Pass options through to pandoc
  md2pdf --converter-arg=--pdf-engine=xelatex --converter-arg=--toc

  # See what would run without running it
  md2pdf --dry-run

  # Report every attempted file as converted, whatever pandoc's exit status
  md2pdf --optimistic

  # Machine-readable results
  md2pdf --json > results.json

ENVIRONMENT VARIABLES:
  MD2PDF_OUTPUT_DIR   Output directory (default: generated-pdfs)
  MD2PDF_CONVERTER    Converter binary (default: pandoc)
  MD2PDF_PATTERN      Source file pattern (default: *.md)
  RUST_LOG            Override the log filter (e.g. edgequake_md2pdf=debug)

NOTES:
  The converter is called as `<converter> [args...] <file.md> -o <dir>/<file>.pdf`
  and must be on PATH. A relative --output-dir is resolved against SOURCE_DIR.
  Patterns are case-sensitive on every platform; use --ignore-case for *.MD.
"#;

/// Convert Markdown files to PDF with pandoc, one file at a time.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Batch-convert Markdown files to PDF with pandoc",
    long_about = "Convert every Markdown file in a directory (non-recursively) to PDF by \
running an external converter (pandoc by default) once per file. PDFs are collected in a \
single output directory, created if missing.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the Markdown sources.
    #[arg(default_value = ".")]
    source_dir: PathBuf,

    /// Directory receiving the PDFs (relative paths resolve against SOURCE_DIR).
    #[arg(short, long, env = "MD2PDF_OUTPUT_DIR", default_value = "generated-pdfs")]
    output_dir: PathBuf,

    /// Converter binary to invoke.
    #[arg(long, env = "MD2PDF_CONVERTER", default_value = "pandoc")]
    converter: String,

    /// Extra argument passed to the converter before the source path (repeatable).
    #[arg(long = "converter-arg", value_name = "ARG", allow_hyphen_values = true)]
    converter_args: Vec<String>,

    /// Source file pattern (`*` and `?` wildcards).
    #[arg(long, env = "MD2PDF_PATTERN", default_value = "*.md")]
    pattern: String,

    /// Match the pattern case-insensitively.
    #[arg(long)]
    ignore_case: bool,

    /// Convert files in name order instead of directory order.
    #[arg(long)]
    sorted: bool,

    /// Report every attempted file as converted without checking the exit status.
    #[arg(long)]
    optimistic: bool,

    /// Stop at the first file that fails.
    #[arg(long, conflicts_with = "optimistic")]
    fail_fast: bool,

    /// Write through a temporary file so failures never leave a partial PDF.
    #[arg(long)]
    atomic: bool,

    /// Print the converter commands without running them.
    #[arg(long)]
    dry_run: bool,

    /// Output structured JSON (BatchOutput) instead of status lines.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner and status lines carry the user-facing feedback; library
    // INFO logs would only duplicate them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.dry_run;
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

    // ── Build config ─────────────────────────────────────────────────────
    let status_cb: Option<ProgressCallback> = if cli.json {
        None
    } else {
        Some(StatusCallback::new(show_progress, cli.quiet) as Arc<dyn ConversionProgressCallback>)
    };
    let config = build_config(&cli, status_cb)?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.dry_run {
        let jobs = plan(&config).await.context("Failed to list source files")?;
        if cli.json {
            let planned: Vec<_> = jobs
                .iter()
                .map(|j| {
                    serde_json::json!({
                        "source": j.source,
                        "destination": j.destination,
                        "command": j.command_line(&config),
                        "conflicts_with": j.conflicts_with,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&planned).context("Failed to serialise plan")?
            );
        } else {
            for job in &jobs {
                match job.conflicts_with {
                    Some(ref first) => eprintln!(
                        "{} {}: {} is already produced from {}",
                        dim("skip"),
                        job.file_name,
                        job.destination.display(),
                        first
                    ),
                    None => println!("{}", job.command_line(&config)),
                }
            }
        }
        return Ok(());
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let output = convert_batch(&config).await.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    let stats = &output.stats;
    if !cli.quiet && !cli.json && stats.discovered > 0 {
        eprintln!(
            "{}  {}/{} files  {}ms  →  {}",
            if stats.failed == 0 { green("✔") } else { red("✘") },
            stats.converted,
            stats.discovered,
            stats.total_duration_ms,
            bold(&output.output_dir.display().to_string()),
        );
        if config.report == ReportPolicy::Optimistic {
            eprintln!("   {}", dim("exit statuses were not checked (--optimistic)"));
        }
    }

    if stats.failed > 0 {
        anyhow::bail!("{} of {} files failed to convert", stats.failed, stats.discovered);
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let mut builder = BatchConfig::builder()
        .source_dir(&cli.source_dir)
        .output_dir(&cli.output_dir)
        .pattern(&cli.pattern)
        .case_insensitive(cli.ignore_case)
        .converter(&cli.converter)
        .converter_args(cli.converter_args.iter().cloned())
        .report(if cli.optimistic {
            ReportPolicy::Optimistic
        } else {
            ReportPolicy::Verified
        })
        .order(if cli.sorted {
            FileOrder::Name
        } else {
            FileOrder::Filesystem
        })
        .fail_fast(cli.fail_fast)
        .atomic_writes(cli.atomic);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
