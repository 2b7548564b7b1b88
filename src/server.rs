//! HTTP front-end: upload page, OCR endpoint and export downloads.
//!
//! ## Routes
//!
//! | Method | Path               | Body                     | Reply                          |
//! |--------|--------------------|--------------------------|--------------------------------|
//! | GET    | `/`                | –                        | HTML page                      |
//! | POST   | `/ocr`             | multipart, field `pdf`   | `{markdown, outline, heading_count}` |
//! | POST   | `/pdf`             | `{markdown}`             | `ocr.pdf` attachment           |
//! | POST   | `/export/{format}` | `{markdown}`             | `ocr.md` / `ocr.txt` / `ocr.pdf` |
//! | POST   | `/outline`         | `{markdown}`             | `{entries, page_count}`        |
//!
//! Failures are `{"error": "..."}` with 400 for caller mistakes and 500 for
//! everything else; rejected request bodies keep axum's status code but get
//! the same JSON shape. PDF rendering is CPU-bound and runs on the blocking
//! pool.

use crate::config::{OcrConfig, RenderConfig, ServerConfig};
use crate::convert::convert_with;
use crate::error::OcrMdError;
use crate::export::{export, ExportFormat};
use crate::outline::{self, Outline};
use crate::pipeline::input::validate_upload;
use crate::pipeline::ocr::{MistralOcrProvider, OcrProvider};
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Multipart field carrying the uploaded document.
pub const UPLOAD_FIELD: &str = "pdf";

const INDEX_HTML: &str = include_str!("../assets/index.html");

// ── State ────────────────────────────────────────────────────────────────

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    ocr: OcrConfig,
    render: RenderConfig,
    /// Fixed provider; when absent a Mistral client is built per request so a
    /// missing key surfaces as a 500 on `/ocr` instead of a startup failure.
    provider: Option<Arc<dyn OcrProvider>>,
}

impl AppState {
    pub fn new(ocr: OcrConfig, render: RenderConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                ocr,
                render,
                provider: None,
            }),
        }
    }

    /// Use `provider` for every OCR request.
    pub fn with_provider(ocr: OcrConfig, render: RenderConfig, provider: Arc<dyn OcrProvider>) -> Self {
        Self {
            inner: Arc::new(Inner {
                ocr,
                render,
                provider: Some(provider),
            }),
        }
    }

    fn provider(&self) -> Result<Arc<dyn OcrProvider>, OcrMdError> {
        match &self.inner.provider {
            Some(p) => Ok(Arc::clone(p)),
            None => Ok(Arc::new(MistralOcrProvider::new(&self.inner.ocr)?)),
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────────

/// JSON error reply.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<OcrMdError> for ApiError {
    fn from(e: OcrMdError) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        Self {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!("{} {}", self.status.as_u16(), self.message);
        }
        let body = Json(ErrorBody {
            error: &self.message,
        });
        (self.status, body).into_response()
    }
}

// ── Payloads ─────────────────────────────────────────────────────────────

/// Request body for the export endpoints. A missing or `null` field reads
/// as empty.
#[derive(Debug, Default, Deserialize)]
pub struct MarkdownBody {
    #[serde(default)]
    pub markdown: Option<String>,
}

impl MarkdownBody {
    fn into_text(self) -> String {
        self.markdown.unwrap_or_default()
    }
}

/// Reply of `POST /ocr`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OcrReply {
    pub markdown: String,
    pub outline: Outline,
    pub heading_count: usize,
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn ocr(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrReply>, ApiError> {
    // The key is checked before the upload is looked at.
    let provider = state.provider()?;

    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let (filename, bytes) = upload.ok_or(OcrMdError::MissingUpload)?;
    let input = validate_upload(&filename, bytes.to_vec())?;
    info!("OCR upload '{}' ({} bytes)", input.name, input.len());

    let output = convert_with(&input.bytes, provider.as_ref()).await?;

    Ok(Json(OcrReply {
        heading_count: output.outline.heading_count(),
        markdown: output.markdown,
        outline: output.outline,
    }))
}

async fn pdf(
    State(state): State<AppState>,
    body: Result<Json<MarkdownBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    download(&state, ExportFormat::Pdf, body.into_text()).await
}

async fn export_as(
    State(state): State<AppState>,
    Path(format): Path<String>,
    body: Result<Json<MarkdownBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = format.parse()?;
    let Json(body) = body?;
    download(&state, format, body.into_text()).await
}

async fn outline_of(body: Result<Json<MarkdownBody>, JsonRejection>) -> Result<Json<Outline>, ApiError> {
    let Json(body) = body?;
    Ok(Json(outline::summarize(&body.into_text())))
}

async fn download(state: &AppState, format: ExportFormat, markdown: String) -> Result<Response, ApiError> {
    let bytes = if format == ExportFormat::Pdf {
        let render = state.inner.render.clone();
        tokio::task::spawn_blocking(move || export(&markdown, format, &render))
            .await
            .map_err(|e| OcrMdError::Internal(format!("render task: {e}")))??
    } else {
        export(&markdown, format, &state.inner.render)?
    };

    let headers = [
        (header::CONTENT_TYPE, format.mime_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", format.file_name()),
        ),
    ];
    Ok((headers, bytes).into_response())
}

// ── Router ───────────────────────────────────────────────────────────────

/// Build the router. `max_upload_bytes` caps every request body.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ocr", post(ocr))
        .route("/pdf", post(pdf))
        .route("/export/{format}", post(export_as))
        .route("/outline", post(outline_of))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), OcrMdError> {
    let state = AppState::new(config.ocr.clone(), config.render.clone());
    let app = router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| OcrMdError::Internal(format!("bind {}: {e}", config.bind)))?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| OcrMdError::Internal(format!("server: {e}")))
}
