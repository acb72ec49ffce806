//! Configuration types for the upload/convert service.
//!
//! All behaviour is controlled through [`ServerConfig`], built via its
//! [`ServerConfigBuilder`]. The config is handed to the orchestrator and the
//! HTTP handlers at construction time; nothing is read from process-wide
//! state after that, so tests can point each instance at its own scratch
//! directory.

use crate::error::Pdf2DocxError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// 100 MiB, the default request body cap.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 100 * 1024 * 1024;

/// Configuration for the conversion service.
///
/// # Example
/// ```rust
/// use edgequake_pdf2docx::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .upload_dir("/var/tmp/pdf2docx")
///     .max_content_length(20 * 1024 * 1024)
///     .ocr_enabled(false)
///     .build()
///     .unwrap();
/// assert!(config.is_allowed_extension("PDF"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Scratch storage root. Uploads, OCR intermediates and produced
    /// documents all live directly under this directory. Default: the host
    /// temporary directory.
    pub upload_dir: PathBuf,

    /// Maximum request body size in bytes. Default: 100 MiB.
    ///
    /// Enforced by the transport layer; oversized requests are rejected with
    /// `413` before the upload handler sees them.
    pub max_content_length: usize,

    /// Lowercase extensions (no leading dot) accepted by the upload handler.
    /// Default: `{"pdf"}`.
    pub allowed_extensions: BTreeSet<String>,

    /// OCR preprocessing settings.
    pub ocr: OcrOptions,

    /// Executable that performs PDF → DOCX conversion. Default: `pdf2docx`.
    pub converter_program: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upload_dir: std::env::temp_dir(),
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            allowed_extensions: BTreeSet::from(["pdf".to_string()]),
            ocr: OcrOptions::default(),
            converter_program: "pdf2docx".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Case-insensitive membership test against [`Self::allowed_extensions`].
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.allowed_extensions.contains(&ext.to_ascii_lowercase())
    }
}

/// Settings for the best-effort OCR pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOptions {
    /// Run OCR at all. Default: true. When false the availability probe is
    /// not even consulted.
    pub enabled: bool,

    /// OCR executable. Default: `ocrmypdf`.
    pub program: String,

    /// Executable whose presence on `PATH` means OCR can run. Default: `tesseract`.
    pub probe_program: String,

    /// Leave pages that already carry a text layer untouched. Default: true.
    pub skip_text: bool,

    /// Straighten scanned pages. Default: true.
    pub deskew: bool,

    /// Tesseract language code(s), e.g. `"eng+deu"`. `None` uses the engine default.
    pub language: Option<String>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "ocrmypdf".to_string(),
            probe_program: "tesseract".to_string(),
            skip_text: true,
            deskew: true,
            language: None,
        }
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn max_content_length(mut self, bytes: usize) -> Self {
        self.config.max_content_length = bytes;
        self
    }

    /// Replace the allowed set. Entries are lowercased and stripped of a
    /// leading dot.
    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn ocr(mut self, ocr: OcrOptions) -> Self {
        self.config.ocr = ocr;
        self
    }

    pub fn ocr_enabled(mut self, v: bool) -> Self {
        self.config.ocr.enabled = v;
        self
    }

    pub fn ocr_program(mut self, program: impl Into<String>) -> Self {
        self.config.ocr.program = program.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr.language = Some(lang.into());
        self
    }

    pub fn converter_program(mut self, program: impl Into<String>) -> Self {
        self.config.converter_program = program.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, Pdf2DocxError> {
        let c = &self.config;
        if c.max_content_length == 0 {
            return Err(Pdf2DocxError::InvalidConfig(
                "max_content_length must be ≥ 1 byte".into(),
            ));
        }
        if c.allowed_extensions.is_empty() {
            return Err(Pdf2DocxError::InvalidConfig(
                "at least one allowed extension is required".into(),
            ));
        }
        if c.converter_program.trim().is_empty() {
            return Err(Pdf2DocxError::InvalidConfig(
                "converter program must not be empty".into(),
            ));
        }
        if c.ocr.enabled && (c.ocr.program.trim().is_empty() || c.ocr.probe_program.trim().is_empty())
        {
            return Err(Pdf2DocxError::InvalidConfig(
                "OCR is enabled but its program name is empty".into(),
            ));
        }
        Ok(self.config)
    }
}
