//! HTTP response bodies.

use serde::{Deserialize, Serialize};

/// `200` body of `POST /upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    /// Always "Conversion successful".
    pub message: String,
    /// Relative URL of the produced document, `/download/<name>.docx`.
    pub download_url: String,
}

impl UploadResponse {
    pub fn for_document(name: &str) -> Self {
        Self {
            message: "Conversion successful".to_string(),
            download_url: format!("/download/{name}"),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub error: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}
