//! The conversion orchestrator: optional OCR, then PDF → DOCX.
//!
//! ## Failure policy
//!
//! OCR is a quality improvement, never a requirement. Whether it is turned
//! off, not installed, finds an existing text layer, or blows up, the
//! conversion step runs anyway on a single *effective source* path. Only a
//! conversion-engine failure fails the job.
//!
//! ## No partial output
//!
//! The engine writes into a hidden sibling of the destination which is
//! renamed into place only after it reports success. The OCR intermediate is
//! held as a [`TempPath`], so it is removed when the job ends however it
//! ends, including when the request future is dropped mid-flight.

use crate::config::{OcrOptions, ServerConfig};
use crate::error::{OcrError, Pdf2DocxError};
use crate::output::{ConversionJob, ConversionReport, OcrStatus};
use crate::pipeline::docx::{DocumentConverter, PageRange, Pdf2DocxCli};
use crate::pipeline::naming;
use crate::pipeline::ocr::{OcrEngine, OcrMyPdf, OcrRequest};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempPath;
use tracing::{debug, error, info, warn};

/// Mode of a produced document on unix.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Runs conversion jobs. Cheap to clone; share one per process.
#[derive(Clone)]
pub struct Converter {
    ocr: Arc<dyn OcrEngine>,
    docx: Arc<dyn DocumentConverter>,
    ocr_options: OcrOptions,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("ocr", &"<dyn OcrEngine>")
            .field("docx", &"<dyn DocumentConverter>")
            .field("ocr_options", &self.ocr_options)
            .finish()
    }
}

impl Converter {
    /// Converter using `ocrmypdf` and `pdf2docx` as configured.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_engines(
            Arc::new(OcrMyPdf::from_options(&config.ocr)),
            Arc::new(Pdf2DocxCli::new(&config.converter_program)),
            config.ocr.clone(),
        )
    }

    /// Converter with caller-supplied engines.
    pub fn with_engines(
        ocr: Arc<dyn OcrEngine>,
        docx: Arc<dyn DocumentConverter>,
        ocr_options: OcrOptions,
    ) -> Self {
        Self {
            ocr,
            docx,
            ocr_options,
        }
    }

    /// Run `job`. See [`Converter::convert`].
    pub async fn run(&self, job: &ConversionJob) -> Result<ConversionReport, Pdf2DocxError> {
        self.convert(&job.source_path, &job.destination_path).await
    }

    /// Convert the PDF at `source` into a Word document at `destination`.
    ///
    /// # Errors
    /// [`Pdf2DocxError::ConversionFailed`] if the source is missing or the
    /// conversion engine fails. OCR problems are never returned; they are
    /// logged and reported in [`ConversionReport::ocr`].
    pub async fn convert(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<ConversionReport, Pdf2DocxError> {
        let total_start = Instant::now();
        info!("Starting conversion: {}", source.display());

        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Err(Pdf2DocxError::ConversionFailed {
                detail: format!("source '{}' does not exist", source.display()),
            });
        }

        // ── Step 1–2: Best-effort OCR ───────────────────────────────────
        let ocr_start = Instant::now();
        let (ocr_status, intermediate) = self.preprocess(source).await;
        let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
        let effective: &Path = intermediate.as_deref().unwrap_or(source);

        // ── Step 3: Convert the effective source ────────────────────────
        let convert_start = Instant::now();
        let converted = self.convert_atomic(effective, destination).await;
        let convert_duration_ms = convert_start.elapsed().as_millis() as u64;

        // ── Step 4: Drop the OCR intermediate, whatever happened ────────
        if let Some(tmp) = intermediate {
            let path = tmp.to_path_buf();
            if let Err(e) = tmp.close() {
                debug!("Could not remove OCR intermediate {}: {}", path.display(), e);
            }
        }

        // ── Step 5: Report ──────────────────────────────────────────────
        converted.map_err(|detail| {
            error!("Conversion failed: {}", detail);
            Pdf2DocxError::ConversionFailed { detail }
        })?;

        let report = ConversionReport {
            destination_path: destination.to_path_buf(),
            ocr: ocr_status,
            ocr_duration_ms,
            convert_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Conversion complete: {} in {}ms",
            report.destination_name(),
            report.total_duration_ms
        );
        Ok(report)
    }

    /// Decide whether to OCR and do it. Returns the intermediate only when
    /// it is the file the conversion step should read.
    async fn preprocess(&self, source: &Path) -> (OcrStatus, Option<TempPath>) {
        if !self.ocr_options.enabled {
            debug!("OCR disabled. Skipping OCR preprocessing.");
            return (OcrStatus::Disabled, None);
        }
        if !self.ocr.is_installed() {
            info!(
                "{} not found. Skipping OCR preprocessing.",
                self.ocr_options.probe_program
            );
            return (OcrStatus::NotInstalled, None);
        }

        // Guard before the engine runs: a failed run may leave a partial file.
        let guard = TempPath::from_path(naming::ocr_intermediate_path(source));
        let request = OcrRequest::from(&self.ocr_options);

        match self.ocr.ocr(source, &guard, &request).await {
            Ok(()) => {
                info!("OCR preprocessing completed successfully.");
                (OcrStatus::Applied, Some(guard))
            }
            Err(OcrError::PriorOcrFound) => {
                info!("Page already has text, skipping OCR.");
                (OcrStatus::PriorText, None)
            }
            Err(e) => {
                warn!("OCR preprocessing failed (proceeding with original): {}", e);
                (OcrStatus::Failed(e.to_string()), None)
            }
        }
    }

    /// Convert into a hidden sibling of `destination`, then rename it into place.
    async fn convert_atomic(&self, input: &Path, destination: &Path) -> Result<(), String> {
        let dir = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| format!("cannot create '{}': {}", dir.display(), e))?;

        let stem = destination
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| naming::FALLBACK_STEM.to_string());
        let partial = tempfile::Builder::new()
            .prefix(&format!(".{stem}."))
            .suffix(".docx")
            .tempfile_in(dir)
            .map_err(|e| format!("cannot create output in '{}': {}", dir.display(), e))?
            .into_temp_path();

        self.docx.convert(input, &partial, PageRange::all()).await?;

        // The partial file is created 0600; the document is a normal artifact.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&*partial, std::fs::Permissions::from_mode(OUTPUT_MODE))
                .await
                .map_err(|e| format!("cannot set permissions on output: {e}"))?;
        }

        partial
            .persist(destination)
            .map_err(|e| format!("cannot write '{}': {}", destination.display(), e.error))
    }
}

/// Convert a local PDF with the configured engines.
///
/// `output` defaults to the input path with its extension replaced by `.docx`.
pub async fn convert_file(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &ServerConfig,
) -> Result<ConversionReport, Pdf2DocxError> {
    let mut job = ConversionJob::for_source(input.as_ref());
    if let Some(out) = output {
        job.destination_path = out.to_path_buf();
    }
    Converter::new(config).run(&job).await
}
