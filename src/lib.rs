//! # edgequake-pdf2docx
//!
//! Upload a PDF over HTTP and get a Word document back.
//!
//! The heavy lifting is done by two external tools: **OCRmyPDF** adds a text
//! layer to scanned pages, and **pdf2docx** turns a text-bearing PDF into a
//! `.docx` with its layout, paragraphs and images. This crate is the glue: a
//! small axum service, filename hygiene, scratch-storage management, and an
//! orchestrator that treats OCR as a best-effort improvement.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /upload (multipart "file")
//!  │
//!  ├─ 1. Validate   field present, filename non-empty, extension allowed
//!  ├─ 2. Store      sanitised name under the scratch dir
//!  ├─ 3. OCR        optional; any failure falls back to the original PDF
//!  ├─ 4. Convert    pdf2docx → hidden partial file → atomic rename
//!  └─ 5. Respond    {"download_url": "/download/<name>.docx"}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2docx::{start_server, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder()
//!         .upload_dir("/tmp/pdf2docx")
//!         .build()?;
//!     start_server("127.0.0.1:5000", AppState::new(config)).await?;
//!     Ok(())
//! }
//! ```
//!
//! Or convert a single file without the server:
//!
//! ```rust,no_run
//! use edgequake_pdf2docx::{convert_file, ServerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = convert_file("scan.pdf", None, &ServerConfig::default()).await?;
//! println!("{} (OCR: {:?})", report.destination_path.display(), report.ocr);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2docx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Host Requirements
//!
//! | Tool | Required | Purpose |
//! |------|----------|---------|
//! | `pdf2docx` | yes | PDF → DOCX conversion (`pip install pdf2docx`) |
//! | `ocrmypdf` + `tesseract` | no | OCR for scanned documents |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrOptions, ServerConfig, ServerConfigBuilder};
pub use convert::{convert_file, Converter};
pub use error::{OcrError, Pdf2DocxError, ValidationError};
pub use output::{ConversionJob, ConversionReport, OcrStatus};
pub use pipeline::docx::{DocumentConverter, PageRange, Pdf2DocxCli};
pub use pipeline::ocr::{OcrEngine, OcrMyPdf, OcrRequest};
pub use server::{build_router, serve, start_server, AppState};
