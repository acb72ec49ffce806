//! HTTP-level tests for the upload service.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; the OCR
//! and conversion engines are in-process fakes, and every test gets its own
//! scratch directory, so these run anywhere without external tools.
//!
//! Run with:
//!   cargo test --test server

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use edgequake_pdf2docx::pipeline::naming;
use edgequake_pdf2docx::{
    build_router, AppState, Converter, DocumentConverter, OcrEngine, OcrError, OcrOptions,
    OcrRequest, PageRange, ServerConfig,
};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "----pdf2docx-test-boundary";
const PDF_BYTES: &[u8] = b"%PDF-1.7\n1 0 obj << >> endobj\ntrailer << >>\n%%EOF\n";

// ── Fake engines ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Ocr {
    Absent,
    PriorText,
    Applies,
    Crashes,
}

struct FakeOcr {
    mode: Ocr,
    calls: AtomicUsize,
}

#[async_trait]
impl OcrEngine for FakeOcr {
    fn is_installed(&self) -> bool {
        !matches!(self.mode, Ocr::Absent)
    }

    async fn ocr(&self, input: &Path, output: &Path, _req: &OcrRequest) -> Result<(), OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Ocr::Absent => unreachable!("OCR must not run when not installed"),
            Ocr::PriorText => Err(OcrError::PriorOcrFound),
            Ocr::Applies => {
                std::fs::copy(input, output).unwrap();
                Ok(())
            }
            Ocr::Crashes => {
                std::fs::write(output, b"%PDF-half").unwrap();
                Err(OcrError::Failed {
                    code: Some(15),
                    stderr: "tesseract crashed".into(),
                })
            }
        }
    }
}

/// Writes `DOCX:<input file name>` so tests can see which source was converted.
struct FakeDocx {
    fail_with: Option<&'static str>,
}

#[async_trait]
impl DocumentConverter for FakeDocx {
    async fn convert(&self, input: &Path, output: &Path, _pages: PageRange) -> Result<(), String> {
        if let Some(msg) = self.fail_with {
            std::fs::write(output, b"half").unwrap();
            return Err(msg.to_string());
        }
        let name = input.file_name().unwrap().to_string_lossy();
        std::fs::write(output, format!("DOCX:{name}")).unwrap();
        Ok(())
    }
}

// ── Test helpers ─────────────────────────────────────────────────────────────

struct Harness {
    scratch: TempDir,
    ocr: Arc<FakeOcr>,
    router: Router,
}

fn harness_with(ocr: Ocr, fail_with: Option<&'static str>, max_len: usize) -> Harness {
    let scratch = TempDir::new().unwrap();
    let config = ServerConfig::builder()
        .upload_dir(scratch.path())
        .max_content_length(max_len)
        .build()
        .unwrap();
    let fake_ocr = Arc::new(FakeOcr {
        mode: ocr,
        calls: AtomicUsize::new(0),
    });
    let converter = Converter::with_engines(
        fake_ocr.clone(),
        Arc::new(FakeDocx { fail_with }),
        OcrOptions::default(),
    );
    let router = build_router(AppState::with_converter(config, converter));
    Harness {
        scratch,
        ocr: fake_ocr,
        router,
    }
}

fn harness(ocr: Ocr) -> Harness {
    harness_with(ocr, None, 100 * 1024 * 1024)
}

/// One multipart part: (field name, filename, content).
type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_upload(router: &Router, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

fn scratch_files(h: &Harness) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(h.scratch.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn assert_no_ocr_intermediates(h: &Harness) {
    for name in scratch_files(h) {
        assert!(
            !naming::is_ocr_intermediate(&name),
            "OCR intermediate leaked: {name}"
        );
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_pdf_is_rejected_and_nothing_is_written() {
    let h = harness(Ocr::PriorText);
    let (status, body) = post_upload(&h.router, &[("file", Some("notes.txt"), b"hello")]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid file type");
    assert!(scratch_files(&h).is_empty());
}

#[tokio::test]
async fn file_without_extension_is_rejected() {
    let h = harness(Ocr::PriorText);
    let (status, body) = post_upload(&h.router, &[("file", Some("README"), b"x")]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid file type");
}

#[tokio::test]
async fn empty_filename_is_no_selected_file() {
    let h = harness(Ocr::PriorText);
    let (status, body) = post_upload(&h.router, &[("file", Some(""), b"")]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No selected file");
    assert!(scratch_files(&h).is_empty());
}

#[tokio::test]
async fn missing_file_field_is_no_file_part() {
    let h = harness(Ocr::PriorText);
    let (status, body) =
        post_upload(&h.router, &[("document", Some("a.pdf"), PDF_BYTES)]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file part");
}

#[tokio::test]
async fn plain_form_value_named_file_is_no_file_part() {
    let h = harness(Ocr::PriorText);
    let (status, body) = post_upload(&h.router, &[("file", None, b"a.pdf")]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file part");
}

#[tokio::test]
async fn non_multipart_body_gets_json_error() {
    let h = harness(Ocr::PriorText);
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"file":"a.pdf"}"#))
        .unwrap();
    let resp = h.router.clone().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert!(scratch_files(&h).is_empty());
}

#[tokio::test]
async fn oversized_body_is_rejected_by_transport() {
    let h = harness_with(Ocr::PriorText, None, 1024);
    let big = vec![b'x'; 8 * 1024];
    let (status, _) = post_upload(&h.router, &[("file", Some("big.pdf"), &big)]).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!h.scratch.path().join("big.docx").exists());
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_pdf_converts_without_ocr_layer() {
    let h = harness(Ocr::PriorText);
    let (status, body) =
        post_upload(&h.router, &[("file", Some("report.pdf"), PDF_BYTES)]).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["message"], "Conversion successful");
    assert_eq!(body["download_url"], "/download/report.docx");
    assert_eq!(h.ocr.calls.load(Ordering::SeqCst), 1);

    let out = std::fs::read_to_string(h.scratch.path().join("report.docx")).unwrap();
    assert_eq!(out, "DOCX:report.pdf");
    assert_eq!(scratch_files(&h), vec!["report.docx", "report.pdf"]);
}

#[tokio::test]
async fn scanned_pdf_is_converted_from_ocr_copy() {
    let h = harness(Ocr::Applies);
    let (status, _) = post_upload(&h.router, &[("file", Some("scan.pdf"), PDF_BYTES)]).await;

    assert_eq!(status, StatusCode::OK);
    let out = std::fs::read_to_string(h.scratch.path().join("scan.docx")).unwrap();
    assert_eq!(out, "DOCX:scan_ocr.pdf");
    assert_no_ocr_intermediates(&h);
}

#[tokio::test]
async fn missing_ocr_engine_still_converts() {
    let h = harness(Ocr::Absent);
    let (status, body) = post_upload(&h.router, &[("file", Some("a.pdf"), PDF_BYTES)]).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(h.ocr.calls.load(Ordering::SeqCst), 0);
    let out = std::fs::read_to_string(h.scratch.path().join("a.docx")).unwrap();
    assert_eq!(out, "DOCX:a.pdf");
}

#[tokio::test]
async fn ocr_crash_is_absorbed() {
    let h = harness(Ocr::Crashes);
    let (status, body) = post_upload(&h.router, &[("file", Some("a.pdf"), PDF_BYTES)]).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let out = std::fs::read_to_string(h.scratch.path().join("a.docx")).unwrap();
    assert_eq!(out, "DOCX:a.pdf");
    assert_no_ocr_intermediates(&h);
}

#[tokio::test]
async fn conversion_failure_is_500_with_detail() {
    let h = harness_with(Ocr::Applies, Some("no text layer on page 1"), 1 << 20);
    let (status, body) = post_upload(&h.router, &[("file", Some("a.pdf"), PDF_BYTES)]).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Conversion failed: no text layer on page 1");
    assert_eq!(scratch_files(&h), vec!["a.pdf"]);
}

#[tokio::test]
async fn uppercase_extension_is_accepted() {
    let h = harness(Ocr::PriorText);
    let (status, body) = post_upload(&h.router, &[("file", Some("SCAN.PDF"), PDF_BYTES)]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["download_url"], "/download/SCAN.docx");
}

#[tokio::test]
async fn filename_is_sanitised_into_scratch_dir() {
    let h = harness(Ocr::PriorText);
    let (status, body) = post_upload(
        &h.router,
        &[("file", Some("../../My Report (final).pdf"), PDF_BYTES)],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["download_url"], "/download/My_Report_final.docx");
    assert!(h.scratch.path().join("My_Report_final.pdf").exists());
}

#[tokio::test]
async fn reupload_overwrites_previous_file() {
    let h = harness(Ocr::PriorText);
    post_upload(&h.router, &[("file", Some("a.pdf"), b"%PDF-first")]).await;
    let (status, _) = post_upload(&h.router, &[("file", Some("a.pdf"), b"%PDF-second")]).await;

    assert_eq!(status, StatusCode::OK);
    let stored = std::fs::read(h.scratch.path().join("a.pdf")).unwrap();
    assert_eq!(stored, b"%PDF-second");
}

// ── Download ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn download_serves_produced_document_as_attachment() {
    let h = harness(Ocr::PriorText);
    let (_, body) = post_upload(&h.router, &[("file", Some("report.pdf"), PDF_BYTES)]).await;
    let url = body["download_url"].as_str().unwrap().to_string();

    let (status, headers, bytes) = get(&h.router, &url).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"DOCX:report.pdf");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert_eq!(disposition, "attachment; filename=\"report.docx\"");
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .contains("wordprocessingml"));
}

#[tokio::test]
async fn download_of_unknown_file_is_404() {
    let h = harness(Ocr::PriorText);
    let (status, _, _) = get(&h.router, "/download/never-made.docx").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_cannot_escape_scratch_dir() {
    let h = harness(Ocr::PriorText);
    std::fs::write(h.scratch.path().join("ok.docx"), b"x").unwrap();

    for uri in [
        "/download/..%2Fok.docx",
        "/download/..%2F..%2Fetc%2Fpasswd",
        "/download/%2E%2E",
    ] {
        let (status, _, _) = get(&h.router, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "uri: {uri}");
    }
}

// ── Pages ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn index_and_script_are_served() {
    let h = harness(Ocr::PriorText);

    let (status, headers, body) = get(&h.router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(String::from_utf8_lossy(&body).contains("drop-zone"));

    let (status, _, body) = get(&h.router, "/static/js/main.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("/upload"));
}

#[tokio::test]
async fn health_reports_version() {
    let h = harness(Ocr::PriorText);
    let (status, _, body) = get(&h.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
