//! HTTP surface: upload form, `POST /upload`, `GET /download/{filename}`.
//!
//! Handlers are stateless apart from scratch storage. Everything they need
//! (the directory, the size cap, the converter) arrives through [`AppState`],
//! built once from a [`ServerConfig`].

pub mod handlers;
pub mod types;

use crate::config::ServerConfig;
use crate::convert::Converter;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use handlers::*;

/// State shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Immutable service configuration.
    pub config: Arc<ServerConfig>,
    /// Orchestrator that runs each upload's conversion job.
    pub converter: Converter,
}

impl AppState {
    /// State using the real OCR and conversion engines.
    pub fn new(config: ServerConfig) -> Self {
        let converter = Converter::new(&config);
        Self::with_converter(config, converter)
    }

    /// State with a caller-supplied converter.
    pub fn with_converter(config: ServerConfig, converter: Converter) -> Self {
        Self {
            config: Arc::new(config),
            converter,
        }
    }
}

/// Build the router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_content_length;
    Router::new()
        .route("/", get(index))
        .route("/static/js/main.js", get(main_js))
        .route("/health", get(health_check))
        .route("/upload", post(upload))
        .route("/download/{filename}", get(download))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "Listening on http://{} (scratch dir: {})",
        listener.local_addr()?,
        state.config.upload_dir.display()
    );
    serve(listener, state).await
}

/// Serve on an already-bound listener until Ctrl-C.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down"),
        Err(e) => {
            // Without a signal handler, run until the process is killed.
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
