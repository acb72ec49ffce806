//! OCR preprocessing: add a text layer to scanned pages before conversion.
//!
//! ## Why a subprocess?
//!
//! OCRmyPDF already does the hard parts (page classification, deskew,
//! Tesseract orchestration, PDF/A-safe text-layer embedding). We drive its
//! command-line interface through `tokio::process` so a long OCR run only
//! parks the current request's task instead of a runtime worker thread.
//!
//! The stage is best-effort. Every outcome other than success comes back as
//! an [`OcrError`] and the orchestrator decides what to do with it; this
//! module never decides that a job has failed.

use crate::config::OcrOptions;
use crate::error::OcrError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tracing::debug;

/// OCRmyPDF exits with this code when it finds a text layer it must not replace.
pub const EXIT_PRIOR_OCR_FOUND: i32 = 6;

/// Per-run OCR settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    /// Leave pages that already carry text untouched.
    pub skip_text: bool,
    /// Straighten scanned pages.
    pub deskew: bool,
    /// Tesseract language code(s).
    pub language: Option<String>,
}

impl From<&OcrOptions> for OcrRequest {
    fn from(o: &OcrOptions) -> Self {
        Self {
            skip_text: o.skip_text,
            deskew: o.deskew,
            language: o.language.clone(),
        }
    }
}

/// An engine that writes a text-layered copy of a PDF.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Whether the engine can run on this host at all.
    fn is_installed(&self) -> bool;

    /// Write an OCR-enhanced copy of `input` to `output`.
    ///
    /// Returns [`OcrError::PriorOcrFound`] when the document already has a
    /// text layer and nothing was done.
    async fn ocr(&self, input: &Path, output: &Path, request: &OcrRequest) -> Result<(), OcrError>;
}

/// [`OcrEngine`] backed by the `ocrmypdf` command-line tool.
#[derive(Debug, Clone)]
pub struct OcrMyPdf {
    program: String,
    probe_program: String,
}

impl OcrMyPdf {
    pub fn new(program: impl Into<String>, probe_program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            probe_program: probe_program.into(),
        }
    }

    pub fn from_options(options: &OcrOptions) -> Self {
        Self::new(&options.program, &options.probe_program)
    }

    /// Command-line arguments for one run, in invocation order.
    pub fn args(input: &Path, output: &Path, request: &OcrRequest) -> Vec<String> {
        let mut args = Vec::new();
        if request.skip_text {
            args.push("--skip-text".to_string());
        }
        if request.deskew {
            args.push("--deskew".to_string());
        }
        if let Some(ref lang) = request.language {
            args.push("--language".to_string());
            args.push(lang.clone());
        }
        args.push(input.to_string_lossy().into_owned());
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

impl Default for OcrMyPdf {
    fn default() -> Self {
        Self::from_options(&OcrOptions::default())
    }
}

#[async_trait]
impl OcrEngine for OcrMyPdf {
    fn is_installed(&self) -> bool {
        is_on_path(&self.probe_program)
    }

    async fn ocr(&self, input: &Path, output: &Path, request: &OcrRequest) -> Result<(), OcrError> {
        let args = Self::args(input, output, request);
        debug!("Running {} {}", self.program, args.join(" "));

        let result = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| OcrError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if result.status.success() {
            return Ok(());
        }
        match result.status.code() {
            Some(EXIT_PRIOR_OCR_FOUND) => Err(OcrError::PriorOcrFound),
            code => Err(OcrError::Failed {
                code,
                stderr: last_line(&String::from_utf8_lossy(&result.stderr)),
            }),
        }
    }
}

/// True if `program` resolves to an executable on `PATH`.
pub fn is_on_path(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Last non-blank line of a tool's stderr, which is where both OCRmyPDF and
/// pdf2docx put the actual error.
pub(crate) fn last_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}
