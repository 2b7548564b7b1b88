//! Offline integration tests for the HTTP front-end.
//!
//! The OCR provider is replaced by a canned one so no network or API key is
//! needed. Requests go through the full router with `tower::ServiceExt`.

#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use ocrmd::server::{router, AppState, OcrReply};
use ocrmd::{
    OcrConfig, OcrMdError, OcrPage, OcrProvider, OcrResponse, Outline, RenderConfig, API_KEY_VAR,
};
use std::sync::Arc;
use tower::ServiceExt;

// ── Test helpers ─────────────────────────────────────────────────────────────

const BOUNDARY: &str = "ocrmd-test-boundary";
const TINY_PDF: &[u8] = b"%PDF-1.4\n%%EOF\n";

struct CannedProvider;

#[async_trait]
impl OcrProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    async fn process(&self, document_url: &str) -> Result<OcrResponse, OcrMdError> {
        assert!(document_url.starts_with("data:application/pdf;base64,"));
        Ok(OcrResponse {
            pages: vec![
                OcrPage {
                    index: 0,
                    markdown: "## Summary\n\nAll good.".into(),
                },
                OcrPage {
                    index: 1,
                    markdown: "![fig](img-0.jpeg)\n\n### Details".into(),
                },
            ],
            model: "canned".into(),
        })
    }
}

struct DownProvider;

#[async_trait]
impl OcrProvider for DownProvider {
    fn name(&self) -> &str {
        "down"
    }

    async fn process(&self, _: &str) -> Result<OcrResponse, OcrMdError> {
        Err(OcrMdError::OcrApi {
            status: 503,
            message: "service unavailable".into(),
        })
    }
}

fn app_with(provider: Arc<dyn OcrProvider>) -> Router {
    let state = AppState::with_provider(OcrConfig::default(), RenderConfig::default(), provider);
    router(state, 1024 * 1024)
}

fn app() -> Router {
    app_with(Arc::new(CannedProvider))
}

fn multipart(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/ocr")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_post(uri: &str, markdown: &str) -> Request<Body> {
    let body = serde_json::json!({ "markdown": markdown }).to_string();
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()
}

fn is_json(resp: &axum::response::Response) -> bool {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

async fn error_text(resp: axum::response::Response) -> String {
    let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    v["error"].as_str().unwrap_or_default().to_string()
}

// ── /ocr ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ocr_returns_markdown_and_outline() {
    let resp = app().oneshot(multipart("pdf", "scan.pdf", TINY_PDF)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let reply: OcrReply = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(reply.markdown.starts_with("\n\n---\n\n# Page 1\n\n## Summary"));
    assert!(reply.markdown.contains("\n\n---\n\n# Page 2\n\n"));
    assert_eq!(reply.outline.page_count, 2);
    assert_eq!(reply.heading_count, 4);
    let titles: Vec<&str> = reply.outline.entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(titles, vec!["Page 1", "Summary", "Page 2", "Details"]);
}

#[tokio::test]
async fn ocr_without_pdf_field_is_400() {
    let resp = app().oneshot(multipart("file", "scan.pdf", TINY_PDF)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(error_text(resp).await.contains("No file"));
}

#[tokio::test]
async fn ocr_rejects_non_pdf_name() {
    let resp = app().oneshot(multipart("pdf", "notes.docx", TINY_PDF)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(error_text(resp).await.contains("must be a PDF"));
}

#[tokio::test]
async fn ocr_rejects_bad_signature() {
    let resp = app()
        .oneshot(multipart("pdf", "fake.pdf", b"\x89PNG\r\n"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_failure_is_500() {
    let resp = app_with(Arc::new(DownProvider))
        .oneshot(multipart("pdf", "scan.pdf", TINY_PDF))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_text(resp).await.contains("service unavailable"));
}

#[tokio::test]
async fn ocr_without_multipart_body_is_json_400() {
    let req = Request::post("/ocr")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(is_json(&resp));
    assert!(!error_text(resp).await.is_empty());
}

#[tokio::test]
async fn missing_key_is_reported_before_upload_checks() {
    let ocr = OcrConfig::builder().api_key("  ").build().unwrap();
    let app = router(AppState::new(ocr, RenderConfig::default()), 1024 * 1024);
    let resp = app
        .oneshot(multipart("pdf", "notes.docx", b"not a pdf"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_text(resp).await.contains(API_KEY_VAR));
}

// ── /pdf and /export ─────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_endpoint_returns_attachment() {
    let resp = app()
        .oneshot(json_post("/pdf", "# Title\n\nSome body text."))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"ocr.pdf\""
    );
    assert!(body_bytes(resp).await.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn pdf_endpoint_rejects_blank_markdown() {
    let resp = app().oneshot(json_post("/pdf", " \n\t")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(error_text(resp).await.contains("Nothing to render"));
}

#[tokio::test]
async fn missing_markdown_field_reads_as_blank() {
    let req = Request::post("/pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn null_markdown_reads_as_blank() {
    let req = Request::post("/pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"markdown":null}"#))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(is_json(&resp));
    assert!(error_text(resp).await.contains("Nothing to render"));
}

#[tokio::test]
async fn wrong_content_type_gets_json_error() {
    let req = Request::post("/export/md")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("# Title"))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(is_json(&resp));
    assert!(!error_text(resp).await.is_empty());
}

#[tokio::test]
async fn malformed_json_gets_json_error() {
    let req = Request::post("/outline")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"markdown\":"))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
    assert!(is_json(&resp));
}

#[tokio::test]
async fn render_failure_message_is_passed_through() {
    let mut render = RenderConfig::default();
    render.styles.body.leading = 5000.0;
    let expected = format!(
        "a 5000pt line does not fit in a {:.1}pt frame",
        render.geometry.frame_height()
    );
    let state = AppState::with_provider(OcrConfig::default(), render, Arc::new(CannedProvider));
    let resp = router(state, 1024 * 1024)
        .oneshot(json_post("/pdf", "body text"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_text(resp).await, expected);
}

#[tokio::test]
async fn markdown_export_is_verbatim() {
    let md = "# Page 1\n\n![x](y) [link](z)";
    let resp = app().oneshot(json_post("/export/md", md)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "text/markdown; charset=utf-8"
    );
    assert_eq!(body_bytes(resp).await, md.as_bytes());
}

#[tokio::test]
async fn text_export_strips_images_and_links() {
    let resp = app()
        .oneshot(json_post("/export/txt", "See ![fig](a.png)[docs](https://x.test)."))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"See docs.");
}

#[tokio::test]
async fn export_pdf_matches_pdf_endpoint_type() {
    let resp = app().oneshot(json_post("/export/pdf", "body")).await.unwrap();
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
}

// ── /outline ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn outline_endpoint_summarises() {
    let resp = app()
        .oneshot(json_post("/outline", "# Page 1\n\n## A\n\n# Page 2\n####### no"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let outline: Outline = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(outline.page_count, 2);
    assert_eq!(outline.heading_count(), 3);
}
