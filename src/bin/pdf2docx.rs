//! CLI binary for edgequake-pdf2docx.
//!
//! A thin shim over the library crate: `serve` runs the upload service,
//! `convert` runs the same orchestrator on one local file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdf2docx::{convert_file, start_server, AppState, OcrStatus, ServerConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the upload service on http://127.0.0.1:5000
  pdf2docx serve

  # Listen on all interfaces with a private scratch directory
  pdf2docx serve --addr 0.0.0.0:8080 --upload-dir /var/tmp/pdf2docx

  # Convert one file locally (writes scan.docx next to it)
  pdf2docx convert scan.pdf

  # Convert without OCR, choosing the output path
  pdf2docx --no-ocr convert report.pdf -o out/report.docx

HOST TOOLS:
  pdf2docx     required   pip install pdf2docx
  ocrmypdf     optional   apt install ocrmypdf   (OCR for scanned pages)
  tesseract    optional   installed with ocrmypdf; OCR is skipped without it

ENVIRONMENT VARIABLES:
  PDF2DOCX_ADDR            Bind address for `serve`
  PDF2DOCX_UPLOAD_DIR      Scratch directory (default: system temp dir)
  PDF2DOCX_MAX_UPLOAD_MB   Request body cap for `serve`
  PDF2DOCX_NO_OCR          Disable OCR preprocessing
  PDF2DOCX_OCR_PROGRAM     OCR executable (default: ocrmypdf)
  PDF2DOCX_OCR_LANGUAGE    Tesseract language(s) for OCR
  PDF2DOCX_CONVERTER       Conversion executable (default: pdf2docx)
  RUST_LOG                 Override log filter (e.g. edgequake_pdf2docx=debug)
"#;

/// Convert PDF documents to Word, over HTTP or from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2docx",
    version,
    about = "Convert PDF documents to Word (.docx), with OCR for scanned pages",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    engine: EngineArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2DOCX_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Scratch directory for uploads and produced documents.
    #[arg(long, global = true, env = "PDF2DOCX_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Skip OCR preprocessing entirely.
    #[arg(long, global = true, env = "PDF2DOCX_NO_OCR")]
    no_ocr: bool,

    /// OCR executable.
    #[arg(long, global = true, env = "PDF2DOCX_OCR_PROGRAM", default_value = "ocrmypdf")]
    ocr_program: String,

    /// Tesseract language(s) for OCR, e.g. "eng+deu".
    #[arg(long, global = true, env = "PDF2DOCX_OCR_LANGUAGE")]
    ocr_language: Option<String>,

    /// PDF → DOCX conversion executable.
    #[arg(long, global = true, env = "PDF2DOCX_CONVERTER", default_value = "pdf2docx")]
    converter: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the upload/convert/download web service.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "PDF2DOCX_ADDR", default_value = "127.0.0.1:5000")]
        addr: String,

        /// Maximum request body size in MiB.
        #[arg(long, env = "PDF2DOCX_MAX_UPLOAD_MB", default_value_t = 100,
              value_parser = clap::value_parser!(u64).range(1..))]
        max_upload_mb: u64,
    },

    /// Convert one local PDF file.
    Convert {
        /// PDF file to convert.
        input: PathBuf,

        /// Output path. Default: input with its extension replaced by .docx.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the conversion report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let is_convert = matches!(cli.command, Command::Convert { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || is_convert {
        // The spinner provides the feedback for one-off conversions.
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{filter},tower_http={filter}"))),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            ref addr,
            max_upload_mb,
        } => {
            let max_bytes = usize::try_from(max_upload_mb.saturating_mul(1024 * 1024))
                .context("--max-upload-mb is too large for this platform")?;
            let config = build_config(&cli.engine, Some(max_bytes))?;
            start_server(addr, AppState::new(config))
                .await
                .with_context(|| format!("Server on {addr} failed"))?;
        }
        Command::Convert {
            ref input,
            ref output,
            json,
        } => {
            let config = build_config(&cli.engine, None)?;
            let show_spinner = !cli.quiet && !cli.verbose && !json;
            run_convert(input, output.as_deref(), json, cli.quiet, show_spinner, &config).await?;
        }
    }

    Ok(())
}

/// Map CLI args to `ServerConfig`.
fn build_config(args: &EngineArgs, max_bytes: Option<usize>) -> Result<ServerConfig> {
    let mut builder = ServerConfig::builder()
        .ocr_enabled(!args.no_ocr)
        .ocr_program(&args.ocr_program)
        .converter_program(&args.converter);

    if let Some(ref dir) = args.upload_dir {
        builder = builder.upload_dir(dir);
    }
    if let Some(bytes) = max_bytes {
        builder = builder.max_content_length(bytes);
    }
    if let Some(ref lang) = args.ocr_language {
        builder = builder.ocr_language(lang);
    }

    builder.build().context("Invalid configuration")
}

async fn run_convert(
    input: &std::path::Path,
    output: Option<&std::path::Path>,
    json: bool,
    quiet: bool,
    show_spinner: bool,
    config: &ServerConfig,
) -> Result<()> {
    let spinner = show_spinner.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message(input.display().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = convert_file(input, output, config).await;
    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }
    let report = result.with_context(|| format!("Failed to convert {}", input.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    let ocr = match report.ocr {
        OcrStatus::Applied => cyan("OCR applied"),
        OcrStatus::PriorText => dim("text layer present"),
        OcrStatus::NotInstalled => dim("OCR not installed"),
        OcrStatus::Disabled => dim("OCR disabled"),
        OcrStatus::Failed(ref reason) => dim(&format!("OCR failed: {reason}")),
    };
    eprintln!(
        "{}  {}  {}ms  ({})",
        green("✔"),
        bold(&report.destination_path.display().to_string()),
        report.total_duration_ms,
        ocr,
    );
    Ok(())
}
