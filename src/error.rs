//! Error types for the edgequake-pdf2docx library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`ValidationError`]: the upload itself is unusable (no file field, empty
//!   filename, wrong extension). Surfaced to HTTP callers as `400`.
//!
//! * [`Pdf2DocxError`]: **Fatal.** The job cannot produce a document
//!   (conversion engine failed, scratch storage unwritable, file missing).
//!   Returned as `Err(Pdf2DocxError)` from [`crate::convert::Converter::convert`]
//!   and from the HTTP handlers.
//!
//! * [`OcrError`]: **Non-fatal.** OCR preprocessing did not produce an
//!   enhanced copy. The orchestrator logs it, records it in
//!   [`crate::output::OcrStatus`], and carries on with the original PDF.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;
use thiserror::Error;

/// A rejected upload.
///
/// The `Display` strings are part of the HTTP contract and are sent verbatim
/// in the `{"error": ...}` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The multipart body carries no `file` field.
    #[error("No file part")]
    NoFilePart,

    /// The `file` field is present but its filename is empty.
    #[error("No selected file")]
    NoSelectedFile,

    /// The filename's extension is not in the allowed set.
    #[error("Invalid file type")]
    InvalidFileType,
}

/// All fatal errors returned by the edgequake-pdf2docx library.
///
/// OCR failures use [`OcrError`] and are never propagated here.
#[derive(Debug, Error)]
pub enum Pdf2DocxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The upload failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The multipart body could not be read (malformed, or over the size cap).
    #[error("{detail}")]
    Multipart { status: StatusCode, detail: String },

    /// Could not persist the uploaded bytes to scratch storage.
    #[error("Failed to save upload to '{path}': {source}")]
    UploadWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested file does not exist in scratch storage.
    #[error("File not found: '{name}'")]
    NotFound { name: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The document-conversion engine failed; no output was produced.
    #[error("Conversion failed: {detail}")]
    ConversionFailed { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2DocxError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Pdf2DocxError::Validation(_) => StatusCode::BAD_REQUEST,
            Pdf2DocxError::Multipart { status, .. } => *status,
            Pdf2DocxError::NotFound { .. } => StatusCode::NOT_FOUND,
            Pdf2DocxError::UploadWriteFailed { .. }
            | Pdf2DocxError::ConversionFailed { .. }
            | Pdf2DocxError::InvalidConfig(_)
            | Pdf2DocxError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for Pdf2DocxError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        Pdf2DocxError::Multipart {
            status: e.status(),
            detail: e.body_text(),
        }
    }
}

impl From<axum::extract::multipart::MultipartRejection> for Pdf2DocxError {
    fn from(e: axum::extract::multipart::MultipartRejection) -> Self {
        Pdf2DocxError::Multipart {
            status: e.status(),
            detail: e.body_text(),
        }
    }
}

impl IntoResponse for Pdf2DocxError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = crate::server::types::ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Why OCR preprocessing did not yield an enhanced copy.
///
/// Never fatal: the orchestrator falls back to the original PDF.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Every page already carries a text layer.
    #[error("page already has text")]
    PriorOcrFound,

    /// The engine ran and exited unsuccessfully.
    #[error("OCR exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    /// The engine could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
