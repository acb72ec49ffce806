//! HTTP request handlers for the upload page, uploads and downloads.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::error::{Pdf2DocxError, ValidationError};
use crate::output::ConversionJob;
use crate::pipeline::naming;
use crate::server::types::{HealthResponse, UploadResponse};
use crate::server::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");
const MAIN_JS: &str = include_str!("../../static/js/main.js");

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// `GET /`: the upload form.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /static/js/main.js`: the upload form's script.
pub async fn main_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        MAIN_JS,
    )
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /upload`: save the `file` field to scratch storage and convert it.
///
/// Validation happens before anything touches the disk, so a rejected upload
/// never leaves a file behind.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, Pdf2DocxError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        // A part without a filename is a plain form value, not a file.
        if field.name() != Some("file") || field.file_name().is_none() {
            continue;
        }

        let client_name = field.file_name().unwrap_or_default().to_string();
        if client_name.is_empty() {
            return Err(ValidationError::NoSelectedFile.into());
        }
        let ext = naming::extension_of(&client_name)
            .filter(|e| state.config.is_allowed_extension(e))
            .ok_or(ValidationError::InvalidFileType)?;

        let stored = naming::storage_name(&client_name, &ext);
        let path = state.config.upload_dir.join(&stored);
        let bytes = field.bytes().await?;
        info!(
            "Upload received: '{}' ({} bytes) → {}",
            client_name,
            bytes.len(),
            path.display()
        );

        tokio::fs::create_dir_all(&state.config.upload_dir)
            .await
            .map_err(|e| Pdf2DocxError::UploadWriteFailed {
                path: state.config.upload_dir.clone(),
                source: e,
            })?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| Pdf2DocxError::UploadWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        let job = ConversionJob::for_source(path);
        let report = state.converter.run(&job).await?;
        debug!("OCR outcome for '{}': {:?}", stored, report.ocr);

        return Ok(Json(UploadResponse::for_document(&report.destination_name())));
    }

    Err(ValidationError::NoFilePart.into())
}

/// `GET /download/{filename}`: serve a file from scratch storage as an attachment.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, Pdf2DocxError> {
    let not_found = || Pdf2DocxError::NotFound {
        name: filename.clone(),
    };

    if !naming::is_servable_name(&filename) {
        return Err(not_found());
    }
    let path = state.config.upload_dir.join(&filename);
    match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => {}
        _ => return Err(not_found()),
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            not_found()
        } else {
            Pdf2DocxError::Internal(format!("reading '{}': {}", path.display(), e))
        }
    })?;
    info!("Serving {} ({} bytes)", filename, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn content_type_for(name: &str) -> &'static str {
    match naming::extension_of(name).as_deref() {
        Some("docx") => DOCX_MIME,
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.docx"), DOCX_MIME);
        assert_eq!(content_type_for("a.PDF"), "application/pdf");
        assert_eq!(content_type_for("a"), "application/octet-stream");
    }

    #[test]
    fn index_page_posts_to_upload() {
        assert!(INDEX_HTML.contains("/static/js/main.js"));
        assert!(MAIN_JS.contains("/upload"));
    }

    #[test]
    fn page_offers_document_preview() {
        assert!(INDEX_HTML.contains("id=\"preview-btn\""));
        assert!(INDEX_HTML.contains("id=\"preview-container\""));
        assert!(INDEX_HTML.contains("mammoth"));
        assert!(MAIN_JS.contains("mammoth.convertToHtml"));
    }
}
