use crate::config::ServerConfig;
use crate::decoder::decode;
use crate::error::{ApiError, ErrorResponse, GENERIC_MESSAGE};
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Json, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use pdf_swap::{CancellationToken, PdfSwapper, ResultDocument, WorkingArea};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Settings handed to every request
#[derive(Debug, Clone)]
pub struct AppState {
    /// Base directory for working areas
    pub work_dir: Arc<PathBuf>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(work_dir: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            work_dir: Arc::new(work_dir.into()),
            max_upload_bytes,
        }
    }
}

impl From<&ServerConfig> for AppState {
    fn from(config: &ServerConfig) -> Self {
        Self::new(config.work_dir.clone(), config.max_upload_bytes)
    }
}

/// Build the application router with all routes configured
pub fn app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health_check))
        // Legacy route and its versioned alias
        .route("/api", post(swap_pdf))
        .route("/api/v1/pdf/swap", post(swap_pdf))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Moustache-swap</title></head>
<body>
<h1>Moustache-swap</h1>
<p>Send a <code>multipart/form-data</code> POST to <code>/api</code> with:</p>
<ul>
<li><code>params</code>: JSON <code>{"annexes":[{"name":"pdf_1.pdf","pattern":"PDF_1"}]}</code>,
optionally with <code>"with_annexes_pages_numbered": true</code></li>
<li><code>principal</code>: the main PDF document</li>
<li><code>annexe</code>: one part per annex PDF, named as in <code>params</code></li>
<li><code>font_size</code>, <code>pos_x</code>, <code>pos_y</code>: optional page number placement</li>
</ul>
<p>Each annex replaces the first page of the principal containing its pattern.</p>
</body>
</html>
"#;

/// Service description page
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pdf-swap",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Swap the annexes of a multipart request into its principal PDF.
///
/// The working area lives until the blocking task finishes; if this future is
/// dropped first, the cancel guard stops the task at its next checkpoint.
pub async fn swap_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let multipart = multipart.map_err(|rejection| ApiError::Multipart(rejection.body_text()))?;
    let area = WorkingArea::acquire_in(state.work_dir.as_path())?;
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let request = decode(multipart, &area).await?;
    let swapper = PdfSwapper::new().with_cancel(cancel);

    let outcome = tokio::task::spawn_blocking(move || -> Result<ResultDocument, ApiError> {
        let result = swapper.swap(&request)?;
        area.store_result(&result)?;
        area.release()?;
        Ok(result)
    })
    .await;
    let _ = guard.disarm();

    let result = outcome.map_err(|e| ApiError::Task(e.to_string()))??;

    tracing::info!(
        pages = result.page_count,
        bytes = result.bytes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "swap request served"
    );

    let disposition = result.content_disposition();
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, ResultDocument::CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        result.bytes,
    )
        .into_response())
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = detail, "request handler panicked");

    let error_response = ErrorResponse {
        message: GENERIC_MESSAGE.to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response)).into_response()
}
