//! Pipeline stages for PDF-to-DOCX conversion.
//!
//! Each submodule implements exactly one step. The two engine stages sit
//! behind traits so the orchestrator can be exercised with in-process fakes
//! and so either external tool can be swapped without touching the other.
//!
//! ## Data Flow
//!
//! ```text
//! naming ──▶ ocr (optional) ──▶ docx
//! (paths)    (ocrmypdf)         (pdf2docx)
//! ```
//!
//! 1. [`naming`]: sanitise the uploaded name and derive the destination and
//!    OCR-intermediate paths
//! 2. [`ocr`]: best-effort text-layer pass; every failure is recoverable
//! 3. [`docx`]: the conversion proper; its failure fails the job

pub mod docx;
pub mod naming;
pub mod ocr;
