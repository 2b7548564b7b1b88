//! Output types returned by the conversion entry points.

use crate::outline::Outline;
use crate::pipeline::ocr::OcrPage;
use serde::{Deserialize, Serialize};

/// Complete result of OCR-ing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Assembled markdown, with a `# Page N` heading before every page.
    pub markdown: String,

    /// Headings found in `markdown`, plus the page count.
    pub outline: Outline,

    /// Per-page markdown as the provider returned it, sorted by index.
    pub pages: Vec<OcrPage>,

    pub stats: ConversionStats,
}

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages returned by the OCR provider.
    pub total_pages: usize,
    /// Entries in the outline, page headings included.
    pub heading_count: usize,
    pub markdown_bytes: usize,
    /// Time spent waiting on the OCR call.
    pub ocr_duration_ms: u64,
    /// Wall time from input resolution to assembled markdown.
    pub total_duration_ms: u64,
}
