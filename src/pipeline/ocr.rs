//! OCR provider boundary: send one document, get per-page markdown back.
//!
//! The provider is hidden behind [`OcrProvider`] so the conversion entry
//! points and the HTTP handlers can be exercised with a canned provider in
//! tests. [`MistralOcrProvider`] is the production implementation.
//!
//! One request per document, no retries: a failed call surfaces to the
//! caller as [`OcrMdError::OcrApi`] (the provider answered with an error) or
//! [`OcrMdError::OcrRequestFailed`] (we never got an answer).

use crate::config::{OcrConfig, API_KEY_VAR};
use crate::error::OcrMdError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Optional override for the OCR base URL.
pub const ENDPOINT_VAR: &str = "MISTRAL_OCR_ENDPOINT";

/// Optional override for the OCR model.
pub const MODEL_VAR: &str = "MISTRAL_OCR_MODEL";

/// Markdown for one page as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrPage {
    /// Zero-based page index reported by the provider.
    pub index: usize,
    pub markdown: String,
}

/// Result of one OCR call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrResponse {
    pub pages: Vec<OcrPage>,
    /// Model that actually served the request.
    pub model: String,
}

/// Anything that can turn a document URL into per-page markdown.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    async fn process(&self, document_url: &str) -> Result<OcrResponse, OcrMdError>;
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: DocumentRef<'a>,
    include_image_base64: bool,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    document_url: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    pages: Vec<WirePage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct WirePage {
    index: usize,
    #[serde(default)]
    markdown: Option<String>,
}

/// Pull a readable message out of an error body; falls back to the raw text.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let field = parsed.as_ref().and_then(|v| {
        ["message", "detail", "error"]
            .iter()
            .find_map(|key| v.get(*key).and_then(|m| m.as_str()))
    });
    match field {
        Some(msg) => msg.to_string(),
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.trim().to_string(),
    }
}

// ── Mistral ──────────────────────────────────────────────────────────────

/// Client for the Mistral OCR endpoint (`POST {endpoint}/v1/ocr`).
pub struct MistralOcrProvider {
    client: reqwest::Client,
    api_key: String,
    url: String,
    model: String,
    include_image_base64: bool,
}

impl fmt::Debug for MistralOcrProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MistralOcrProvider")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl MistralOcrProvider {
    /// Build a provider from config. A missing key is looked up in
    /// `MISTRAL_API_KEY`; empty keys are treated as missing.
    pub fn new(config: &OcrConfig) -> Result<Self, OcrMdError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_VAR).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OcrMdError::MissingApiKey {
                var: API_KEY_VAR.to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrMdError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            url: format!("{}/v1/ocr", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            include_image_base64: config.include_image_base64,
        })
    }

    /// Build from `MISTRAL_API_KEY` plus the optional endpoint/model overrides.
    pub fn from_env() -> Result<Self, OcrMdError> {
        let mut builder = OcrConfig::builder();
        if let Ok(endpoint) = std::env::var(ENDPOINT_VAR) {
            builder = builder.endpoint(endpoint);
        }
        if let Ok(model) = std::env::var(MODEL_VAR) {
            builder = builder.model(model);
        }
        Self::new(&builder.build()?)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl OcrProvider for MistralOcrProvider {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn process(&self, document_url: &str) -> Result<OcrResponse, OcrMdError> {
        let start = Instant::now();
        let request = OcrRequest {
            model: &self.model,
            document: DocumentRef {
                kind: "document_url",
                document_url,
            },
            include_image_base64: self.include_image_base64,
        };

        debug!("POST {} (model {})", self.url, self.model);
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrMdError::OcrRequestFailed {
                reason: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OcrMdError::OcrRequestFailed {
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(OcrMdError::OcrApi {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let wire: WireResponse =
            serde_json::from_str(&body).map_err(|e| OcrMdError::OcrRequestFailed {
                reason: format!("unexpected response body: {e}"),
            })?;

        let pages: Vec<OcrPage> = wire
            .pages
            .into_iter()
            .map(|p| OcrPage {
                index: p.index,
                markdown: p.markdown.unwrap_or_default(),
            })
            .collect();

        info!(
            "OCR returned {} page(s) in {}ms",
            pages.len(),
            start.elapsed().as_millis()
        );

        Ok(OcrResponse {
            pages,
            model: wire.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let req = OcrRequest {
            model: "mistral-ocr-latest",
            document: DocumentRef {
                kind: "document_url",
                document_url: "data:application/pdf;base64,JVBERg==",
            },
            include_image_base64: true,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "mistral-ocr-latest");
        assert_eq!(v["document"]["type"], "document_url");
        assert_eq!(
            v["document"]["document_url"],
            "data:application/pdf;base64,JVBERg=="
        );
        assert_eq!(v["include_image_base64"], true);
    }

    #[test]
    fn response_tolerates_missing_markdown() {
        let body = r##"{"pages":[{"index":0,"markdown":"# A"},{"index":1,"markdown":null},{"index":2}],"model":"m"}"##;
        let wire: WireResponse = serde_json::from_str(body).unwrap();
        assert_eq!(wire.pages.len(), 3);
        assert_eq!(wire.pages[1].markdown, None);
        assert_eq!(wire.pages[2].markdown, None);
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"message":"Unauthorized"}"#), "Unauthorized");
        assert_eq!(error_message(r#"{"detail":"bad document"}"#), "bad document");
        assert_eq!(error_message("plain failure\n"), "plain failure");
        assert_eq!(error_message(""), "empty response body");
    }

    #[test]
    fn explicit_key_skips_environment() {
        let config = OcrConfig::builder().api_key("sk-test").build().unwrap();
        let provider = MistralOcrProvider::new(&config).unwrap();
        assert_eq!(provider.url, "https://api.mistral.ai/v1/ocr");
        assert!(!format!("{provider:?}").contains("sk-test"));
    }

    #[test]
    fn blank_key_is_missing() {
        let config = OcrConfig::builder().api_key("   ").build().unwrap();
        let err = MistralOcrProvider::new(&config).unwrap_err();
        assert!(matches!(err, OcrMdError::MissingApiKey { .. }));
    }

    #[cfg(feature = "server")]
    mod http {
        use super::*;
        use axum::{http::StatusCode, routing::post, Json, Router};

        async fn spawn(app: Router) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{addr}")
        }

        fn provider_for(endpoint: String) -> MistralOcrProvider {
            let config = OcrConfig::builder()
                .api_key("sk-test")
                .endpoint(endpoint)
                .timeout_secs(5)
                .build()
                .unwrap();
            MistralOcrProvider::new(&config).unwrap()
        }

        #[tokio::test]
        async fn parses_pages_from_mock_endpoint() {
            let app = Router::new().route(
                "/v1/ocr",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["document"]["type"], "document_url");
                    Json(serde_json::json!({
                        "pages": [
                            {"index": 0, "markdown": "first"},
                            {"index": 1, "markdown": null}
                        ],
                        "model": "mistral-ocr-2505"
                    }))
                }),
            );
            let provider = provider_for(spawn(app).await);
            let resp = provider
                .process("data:application/pdf;base64,JVBERg==")
                .await
                .unwrap();
            assert_eq!(resp.model, "mistral-ocr-2505");
            assert_eq!(resp.pages[0].markdown, "first");
            assert_eq!(resp.pages[1].markdown, "");
        }

        #[tokio::test]
        async fn non_success_status_maps_to_api_error() {
            let app = Router::new().route(
                "/v1/ocr",
                post(|| async {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(serde_json::json!({"message": "Unauthorized"})),
                    )
                }),
            );
            let provider = provider_for(spawn(app).await);
            let err = provider.process("data:,").await.unwrap_err();
            match err {
                OcrMdError::OcrApi { status, message } => {
                    assert_eq!(status, 401);
                    assert_eq!(message, "Unauthorized");
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
    }
}
