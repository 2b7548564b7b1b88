//! Configuration types.
//!
//! Every knob lives in one of three structs, each built through a builder
//! with validated defaults:
//!
//! * [`RenderConfig`]: page geometry and the style table used by the PDF
//!   renderer. Read-only once built; share it freely across requests.
//! * [`OcrConfig`]: where and how to call the hosted OCR API.
//! * [`ServerConfig`]: the HTTP front-end (bind address, upload limit).

use crate::error::OcrMdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// PostScript points per centimetre.
pub const CM: f32 = 72.0 / 2.54;

/// A4 width in points.
pub const A4_WIDTH: f32 = 595.2756;

/// A4 height in points.
pub const A4_HEIGHT: f32 = 841.8898;

// ── Styles ───────────────────────────────────────────────────────────────

/// Presentation of one block tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    /// Font size in points.
    pub font_size: f32,
    /// Baseline-to-baseline distance in points.
    pub leading: f32,
    /// Vertical gap before the block; dropped at the top of a page.
    pub space_before: f32,
    /// Vertical gap after the block.
    pub space_after: f32,
    /// Use the bold face.
    pub bold: bool,
}

impl StyleRule {
    pub const fn new(font_size: f32, leading: f32, space_after: f32) -> Self {
        Self {
            font_size,
            leading,
            space_before: 0.0,
            space_after,
            bold: false,
        }
    }

    pub const fn space_before(mut self, pts: f32) -> Self {
        self.space_before = pts;
        self
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// The style table: body text plus three heading tiers.
///
/// Only three heading tiers exist. Levels 3 through 6 all share `heading3`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    pub body: StyleRule,
    pub heading1: StyleRule,
    pub heading2: StyleRule,
    pub heading3: StyleRule,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            body: StyleRule::new(10.0, 13.0, 6.0),
            heading1: StyleRule::new(16.0, 18.0, 10.0).bold(),
            heading2: StyleRule::new(13.0, 15.0, 8.0).space_before(12.0).bold(),
            heading3: StyleRule::new(11.5, 14.0, 6.0).space_before(12.0).bold(),
        }
    }
}

impl StyleSheet {
    /// Style for a heading of the given level (1 = largest).
    pub fn heading(&self, level: u8) -> &StyleRule {
        match level {
            0 | 1 => &self.heading1,
            2 => &self.heading2,
            _ => &self.heading3,
        }
    }
}

/// Page size and margins, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    /// A4 with the same margin on all four sides.
    pub fn a4(margin: f32) -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin_top: margin,
            margin_bottom: margin,
            margin_left: margin,
            margin_right: margin,
        }
    }

    pub fn frame_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn frame_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4(2.0 * CM)
    }
}

// ── RenderConfig ─────────────────────────────────────────────────────────

/// Configuration for the markdown → PDF renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Page size and margins. Default: A4, 2 cm on every side.
    pub geometry: PageGeometry,

    /// Style table keyed by block tier.
    pub styles: StyleSheet,

    /// Height of the gap emitted for each blank line. Default: 6 pt.
    pub spacer_height: f32,

    /// Deflate page content streams. Default: true.
    pub compress: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            styles: StyleSheet::default(),
            spacer_height: 6.0,
            compress: true,
        }
    }
}

impl RenderConfig {
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn geometry(mut self, geometry: PageGeometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    pub fn styles(mut self, styles: StyleSheet) -> Self {
        self.config.styles = styles;
        self
    }

    pub fn spacer_height(mut self, pts: f32) -> Self {
        self.config.spacer_height = pts.max(0.0);
        self
    }

    pub fn compress(mut self, v: bool) -> Self {
        self.config.compress = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, OcrMdError> {
        let g = &self.config.geometry;
        if g.frame_width() <= 0.0 || g.frame_height() <= 0.0 {
            return Err(OcrMdError::InvalidConfig(format!(
                "margins leave no room on a {}x{} page",
                g.width, g.height
            )));
        }
        let s = &self.config.styles;
        for (name, rule) in [
            ("body", &s.body),
            ("heading1", &s.heading1),
            ("heading2", &s.heading2),
            ("heading3", &s.heading3),
        ] {
            if rule.font_size <= 0.0 || rule.leading <= 0.0 {
                return Err(OcrMdError::InvalidConfig(format!(
                    "style '{name}' needs a positive font size and leading"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── OcrConfig ────────────────────────────────────────────────────────────

/// Environment variable holding the OCR API key.
pub const API_KEY_VAR: &str = "MISTRAL_API_KEY";

/// Default OCR API base URL.
pub const DEFAULT_OCR_ENDPOINT: &str = "https://api.mistral.ai";

/// Default OCR model.
pub const DEFAULT_OCR_MODEL: &str = "mistral-ocr-latest";

/// Configuration for the hosted OCR call.
#[derive(Clone)]
pub struct OcrConfig {
    /// API key. `None` means "read `MISTRAL_API_KEY` when the provider is created".
    pub api_key: Option<String>,

    /// Base URL; `/v1/ocr` is appended. Default: `https://api.mistral.ai`.
    pub endpoint: String,

    /// OCR model identifier. Default: `mistral-ocr-latest`.
    pub model: String,

    /// Ask the provider to return embedded page images as base64. Default: true.
    pub include_image_base64: bool,

    /// Timeout for the single OCR request, in seconds. Default: 300.
    pub timeout_secs: u64,

    /// Download timeout for URL inputs, in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            model: DEFAULT_OCR_MODEL.to_string(),
            include_image_base64: true,
            timeout_secs: 300,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("include_image_base64", &self.include_image_base64)
            .field("timeout_secs", &self.timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl OcrConfig {
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn include_image_base64(mut self, v: bool) -> Self {
        self.config.include_image_base64 = v;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<OcrConfig, OcrMdError> {
        let c = &self.config;
        if !c.endpoint.starts_with("http://") && !c.endpoint.starts_with("https://") {
            return Err(OcrMdError::InvalidConfig(format!(
                "OCR endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(OcrMdError::InvalidConfig("OCR model must not be empty".into()));
        }
        if c.timeout_secs == 0 {
            return Err(OcrMdError::InvalidConfig("OCR timeout must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}

// ── ServerConfig ─────────────────────────────────────────────────────────

/// Configuration for the HTTP front-end.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. Default: 127.0.0.1:5000.
    pub bind: SocketAddr,

    /// Maximum accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    pub ocr: OcrConfig,
    pub render: RenderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_upload_bytes: 50 * 1024 * 1024,
            ocr: OcrConfig::default(),
            render: RenderConfig::default(),
        }
    }
}
