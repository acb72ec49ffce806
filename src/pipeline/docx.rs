//! Document conversion: PDF with extractable text → `.docx`.
//!
//! Layout analysis and Word serialisation belong to the `pdf2docx` tool; this
//! stage only invokes it and turns its exit status into a `Result`. Writing
//! to the final destination atomically is the orchestrator's job, so an
//! engine is free to leave a half-written file behind on failure.

use crate::pipeline::ocr::last_line;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tracing::debug;

/// Pages to convert, 0-indexed, `end` exclusive. Default: every page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl PageRange {
    /// The whole document.
    pub fn all() -> Self {
        Self::default()
    }
}

/// An engine that turns a PDF into a Word document.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert `pages` of `input` and write the document to `output`.
    ///
    /// On error, the returned string is the engine's own description and is
    /// reported to the caller verbatim.
    async fn convert(&self, input: &Path, output: &Path, pages: PageRange) -> Result<(), String>;
}

/// [`DocumentConverter`] backed by the `pdf2docx` command-line tool.
#[derive(Debug, Clone)]
pub struct Pdf2DocxCli {
    program: String,
}

impl Pdf2DocxCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for one run.
    pub fn args(input: &Path, output: &Path, pages: PageRange) -> Vec<String> {
        let mut args = vec![
            "convert".to_string(),
            input.to_string_lossy().into_owned(),
            output.to_string_lossy().into_owned(),
            format!("--start={}", pages.start),
        ];
        if let Some(end) = pages.end {
            args.push(format!("--end={end}"));
        }
        args
    }
}

impl Default for Pdf2DocxCli {
    fn default() -> Self {
        Self::new("pdf2docx")
    }
}

#[async_trait]
impl DocumentConverter for Pdf2DocxCli {
    async fn convert(&self, input: &Path, output: &Path, pages: PageRange) -> Result<(), String> {
        let args = Self::args(input, output, pages);
        debug!("Running {} {}", self.program, args.join(" "));

        let result = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to run '{}': {}", self.program, e))?;

        let stderr = last_line(&String::from_utf8_lossy(&result.stderr));
        if !result.status.success() {
            return Err(if stderr.is_empty() {
                format!("{} exited with {}", self.program, result.status)
            } else {
                stderr
            });
        }

        // pdf2docx logs some errors and still exits 0.
        match tokio::fs::metadata(output).await {
            Ok(m) if m.len() > 0 => Ok(()),
            _ if !stderr.is_empty() => Err(stderr),
            _ => Err(format!(
                "{} produced no output for '{}'",
                self.program,
                input.display()
            )),
        }
    }
}
