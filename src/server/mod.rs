//! Web front end
//!
//! Accepts user messages (form and JSON) and high-priority sequences (JSON)
//! and hands them to the sign loop through the queue.

pub mod error;
mod handlers;

pub use error::{ApiError, ApiResult};

use crate::queue::QueueHandle;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// Front page shipped with the binary
pub const BUILTIN_FRONTEND: &str = include_str!("frontend.html");

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub queue: QueueHandle,
    /// Front page template, read once at startup
    pub frontend: Arc<str>,
}

impl AppState {
    pub fn new(queue: QueueHandle, frontend: impl Into<Arc<str>>) -> Self {
        Self {
            queue,
            frontend: frontend.into(),
        }
    }

    /// State serving the built-in front page
    pub fn with_builtin_frontend(queue: QueueHandle) -> Self {
        Self::new(queue, BUILTIN_FRONTEND)
    }
}

/// Read the front page template, falling back to the built-in page.
///
/// `{{recent}}`, `{{colors}}` and `{{modes}}` are filled in on every request.
pub fn load_frontend(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => Ok(BUILTIN_FRONTEND.to_string()),
    }
}

pub fn router(state: AppState) -> Router {
    tracing::debug!("Building routes");

    Router::new()
        .route("/", get(handlers::index).post(handlers::submit_form))
        .route("/enqueue_message", post(handlers::enqueue_message))
        .route("/enqueue_sequence", post(handlers::enqueue_sequence))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve until `shutdown` flips to true
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            info!("Web server shutting down");
        })
        .await
}
