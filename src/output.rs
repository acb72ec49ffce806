//! Job paths and the report returned by a finished conversion.

use crate::pipeline::naming;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One conversion, described entirely by where its files live.
///
/// Jobs are never persisted; they exist for the duration of a request.
/// The OCR intermediate is not stored here: the orchestrator holds it as an
/// `Option<TempPath>` only while it actually exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Uploaded PDF in scratch storage.
    pub source_path: PathBuf,
    /// Where the finished document is written.
    pub destination_path: PathBuf,
}

impl ConversionJob {
    /// Job whose destination sits next to the source with the extension
    /// replaced by `.docx`.
    pub fn for_source(source_path: impl Into<PathBuf>) -> Self {
        let source_path = source_path.into();
        let destination_path =
            source_path.with_file_name(naming::docx_name_for(&file_name_of(&source_path)));
        Self {
            source_path,
            destination_path,
        }
    }

    /// File name of the destination, as used in download URLs.
    pub fn destination_name(&self) -> String {
        file_name_of(&self.destination_path)
    }

    /// Path the OCR engine writes its enhanced copy to.
    pub fn ocr_intermediate_path(&self) -> PathBuf {
        naming::ocr_intermediate_path(&self.source_path)
    }
}

/// What happened during the OCR stage.
///
/// Only informational: the conversion stage receives a single effective
/// source path whichever variant applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum OcrStatus {
    /// OCR turned off in configuration.
    Disabled,
    /// The OCR toolchain is not installed on the host.
    NotInstalled,
    /// The document already had a text layer; the original was used.
    PriorText,
    /// OCR produced an enhanced copy that was converted instead of the original.
    Applied,
    /// OCR failed; the original was used.
    Failed(String),
}

impl OcrStatus {
    /// True when the converted file was the OCR intermediate.
    pub fn applied(&self) -> bool {
        matches!(self, OcrStatus::Applied)
    }
}

/// Summary of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// The finished document.
    pub destination_path: PathBuf,
    /// Outcome of the OCR stage.
    pub ocr: OcrStatus,
    /// Wall-clock time spent in OCR.
    pub ocr_duration_ms: u64,
    /// Wall-clock time spent in document conversion.
    pub convert_duration_ms: u64,
    /// Total wall-clock time.
    pub total_duration_ms: u64,
}

impl ConversionReport {
    /// File name of the finished document.
    pub fn destination_name(&self) -> String {
        file_name_of(&self.destination_path)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_replaces_extension() {
        let job = ConversionJob::for_source("/tmp/scratch/annual_report.pdf");
        assert_eq!(
            job.destination_path,
            PathBuf::from("/tmp/scratch/annual_report.docx")
        );
        assert_eq!(job.destination_name(), "annual_report.docx");
    }

    #[test]
    fn destination_of_uppercase_extension() {
        let job = ConversionJob::for_source("/tmp/SCAN.PDF");
        assert_eq!(job.destination_name(), "SCAN.docx");
    }

    #[test]
    fn intermediate_sits_next_to_source() {
        let job = ConversionJob::for_source("/tmp/scratch/a.pdf");
        assert_eq!(
            job.ocr_intermediate_path(),
            PathBuf::from("/tmp/scratch/a_ocr.pdf")
        );
    }

    #[test]
    fn ocr_status_serialises_tagged() {
        let json = serde_json::to_string(&OcrStatus::Failed("boom".into())).unwrap();
        assert_eq!(json, r#"{"status":"failed","detail":"boom"}"#);
        let json = serde_json::to_string(&OcrStatus::PriorText).unwrap();
        assert_eq!(json, r#"{"status":"prior_text"}"#);
    }
}
