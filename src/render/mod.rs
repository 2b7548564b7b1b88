//! Markdown → paginated PDF export.
//!
//! The renderer does not understand general markdown. It walks the OCR text
//! line by line and recognises three block kinds: headings (`#`–`######`),
//! paragraphs (any other non-blank line) and spacers (blank lines). The
//! resulting stream is styled from a fixed [`StyleSheet`] and handed to a
//! [`LayoutBackend`], which decides page breaks and produces the bytes.
//!
//! ## Stages
//!
//! ```text
//! text ──▶ strip images ──▶ segment ──▶ escape + style ──▶ backend
//!          (![..](..))      (TextBlock)  (Flowable)         (paginate, PDF)
//! ```
//!
//! Image references are dropped before segmentation: images cannot be
//! reproduced on this export path and a dangling `![..](..)` is worse than
//! nothing. Flowable text is markup: `&`, `<` and `>` are stored as named
//! entities and decoded again by the backend when glyphs are placed.
//!
//! [`StyleSheet`]: crate::config::StyleSheet

mod backend;
mod fonts;

pub use backend::{LayoutBackend, PdfBackend};

use crate::config::{RenderConfig, StyleRule};
use crate::error::RenderError;
use crate::outline::parse_heading;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::time::Instant;
use tracing::debug;

/// One segmented unit of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextBlock {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    Spacer,
}

/// A styled block, ready for layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    /// Escaped text (`&amp;`, `&lt;`, `&gt;`) with its style.
    Text { markup: String, style: StyleRule },
    /// Fixed vertical gap.
    Spacer { height: f32 },
}

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").unwrap());

/// Remove every `![alt](url)` reference.
pub fn strip_images(text: &str) -> Cow<'_, str> {
    RE_IMAGE.replace_all(text, "")
}

/// Escape the three markup-sensitive characters, ampersand first so the
/// entities introduced for `<` and `>` are not escaped again.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Inverse of [`escape_markup`]; ampersand last.
pub fn unescape_markup(markup: &str) -> String {
    markup
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Split image-free text into blocks, one per line.
pub fn segment(text: &str) -> Vec<TextBlock> {
    text.lines()
        .map(str::trim)
        .map(|line| {
            if line.is_empty() {
                TextBlock::Spacer
            } else if let Some((level, title)) = parse_heading(line) {
                TextBlock::Heading {
                    level,
                    text: title.to_string(),
                }
            } else {
                TextBlock::Paragraph {
                    text: line.to_string(),
                }
            }
        })
        .collect()
}

/// Escape block text and attach styles from the config's style table.
pub fn style_blocks(blocks: Vec<TextBlock>, config: &RenderConfig) -> Vec<Flowable> {
    let styles = &config.styles;
    blocks
        .into_iter()
        .map(|block| match block {
            TextBlock::Spacer => Flowable::Spacer {
                height: config.spacer_height,
            },
            TextBlock::Heading { level, text } => Flowable::Text {
                markup: escape_markup(&text),
                style: *styles.heading(level),
            },
            TextBlock::Paragraph { text } => Flowable::Text {
                markup: escape_markup(&text),
                style: styles.body,
            },
        })
        .collect()
}

/// Full preparation: strip images, segment, escape and style.
pub fn prepare(text: &str, config: &RenderConfig) -> Vec<Flowable> {
    let text = strip_images(text);
    style_blocks(segment(&text), config)
}

/// Render heading-annotated text to PDF bytes with the default A4 layout.
///
/// Callers must reject blank text before calling; blank input still yields a
/// valid single-page document.
pub fn render_document(text: &str) -> Result<Vec<u8>, RenderError> {
    let config = RenderConfig::default();
    render_document_with(text, &config, &PdfBackend::from_config(&config))
}

/// Render with an explicit configuration and layout backend.
pub fn render_document_with(
    text: &str,
    config: &RenderConfig,
    backend: &dyn LayoutBackend,
) -> Result<Vec<u8>, RenderError> {
    let start = Instant::now();
    let flowables = prepare(text, config);
    let bytes = backend.build(&flowables, &config.geometry)?;
    debug!(
        "Rendered {} blocks → {} bytes in {:.1}ms",
        flowables.len(),
        bytes.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(bytes)
}
