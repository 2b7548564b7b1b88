//! # ocrmd
//!
//! OCR PDF documents to Markdown through a hosted OCR API, browse the
//! heading outline, and export the text as Markdown, plain text or PDF.
//!
//! ## Why this crate?
//!
//! Scanned PDFs carry no text layer. Instead of running OCR locally this
//! crate sends the document to Mistral OCR, which returns markdown per page,
//! and builds the two things a reader needs on top of it: an outline for
//! navigation and a clean paginated PDF export.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     local file, URL or upload; `.pdf` + `%PDF` checks
//!  ├─ 2. Encode    base64 data URL
//!  ├─ 3. OCR       one call to the provider (no retries)
//!  ├─ 4. Assemble  `# Page N` heading before every page
//!  └─ 5. Outline   headings + page count
//!
//! markdown ──▶ export: md (verbatim) │ txt (images/links stripped) │ pdf (A4 renderer)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocrmd::{convert, export, ExportFormat, OcrConfig, RenderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from MISTRAL_API_KEY
//!     let output = convert("scan.pdf", &OcrConfig::default()).await?;
//!     for entry in &output.outline.entries {
//!         println!("{}{}", "  ".repeat(entry.level as usize - 1), entry.text);
//!     }
//!     let pdf = export(&output.markdown, ExportFormat::Pdf, &RenderConfig::default())?;
//!     std::fs::write("ocr.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! The outline extractor and the renderer need no network access:
//!
//! ```rust
//! let text = "# Title\n\nSome body text.\n\n## Sub\n\nMore text.";
//! let outline = ocrmd::extract_outline(text);
//! assert_eq!(outline.len(), 2);
//! let pdf = ocrmd::render_document(text).unwrap();
//! assert!(pdf.starts_with(b"%PDF-"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | The `ocrmd` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | The axum web front-end in [`server`] |
//!
//! Disable both when using only the library:
//! ```toml
//! ocrmd = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod outline;
pub mod output;
pub mod pipeline;
pub mod render;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    OcrConfig, OcrConfigBuilder, PageGeometry, RenderConfig, RenderConfigBuilder, ServerConfig,
    StyleRule, StyleSheet, API_KEY_VAR,
};
pub use convert::{convert, convert_from_bytes, convert_sync, convert_to_file, convert_with, write_output};
pub use error::{OcrMdError, RenderError};
pub use export::{export, to_plain_text, ExportFormat};
pub use outline::{extract_outline, Outline, OutlineEntry};
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::ocr::{MistralOcrProvider, OcrPage, OcrProvider, OcrResponse};
pub use render::{render_document, render_document_with, Flowable, LayoutBackend, PdfBackend, TextBlock};
