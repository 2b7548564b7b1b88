//! Export of OCR markdown as Markdown, plain text or PDF.
//!
//! Markdown is written verbatim. Plain text drops image references and
//! unwraps `[text](url)` links to their text. PDF goes through
//! [`crate::render`] with the given [`RenderConfig`].

use crate::config::RenderConfig;
use crate::error::OcrMdError;
use crate::render::{render_document_with, strip_images, PdfBackend};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Download format offered by the export endpoints and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[serde(rename = "md")]
    Markdown,
    #[serde(rename = "txt")]
    Text,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Markdown, ExportFormat::Text, ExportFormat::Pdf];

    /// Short name used in URLs and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Suggested download file name.
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "ocr.md",
            ExportFormat::Text => "ocr.txt",
            ExportFormat::Pdf => "ocr.pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Guess the format from an output path's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = OcrMdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "txt" | "text" => Ok(ExportFormat::Text),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(OcrMdError::UnknownFormat {
                format: s.to_string(),
            }),
        }
    }
}

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());

/// Plain-text rendition: images removed first, then links replaced by their
/// text. Headings and other markdown syntax are left alone.
pub fn to_plain_text(markdown: &str) -> String {
    let without_images = strip_images(markdown);
    RE_LINK.replace_all(&without_images, "$1").into_owned()
}

/// Produce the bytes for one export format.
///
/// Blank input is rejected with [`OcrMdError::EmptyInput`] for every format.
/// The PDF path renders the trimmed text.
pub fn export(
    markdown: &str,
    format: ExportFormat,
    config: &RenderConfig,
) -> Result<Vec<u8>, OcrMdError> {
    let trimmed = markdown.trim();
    if trimmed.is_empty() {
        return Err(OcrMdError::EmptyInput);
    }
    match format {
        ExportFormat::Markdown => Ok(markdown.as_bytes().to_vec()),
        ExportFormat::Text => Ok(to_plain_text(markdown).into_bytes()),
        ExportFormat::Pdf => {
            let backend = PdfBackend::from_config(config);
            Ok(render_document_with(trimmed, config, &backend)?)
        }
    }
}
