//! Conversion entry points: PDF in, OCR markdown (or an export of it) out.
//!
//! Every entry point funnels into [`convert_with`], which takes the PDF bytes
//! and an [`OcrProvider`]. The others only differ in where the bytes come
//! from and which provider they build.

use crate::config::{OcrConfig, RenderConfig};
use crate::error::OcrMdError;
use crate::export::{export, ExportFormat};
use crate::outline;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::ocr::{MistralOcrProvider, OcrProvider};
use crate::pipeline::{assemble, encode, input};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// OCR a PDF file or URL.
///
/// # Errors
/// Input errors (`FileNotFound`, `InvalidExtension`, `NotAPdf`, download
/// failures), `MissingApiKey` when no key is configured, and the provider's
/// `OcrApi` / `OcrRequestFailed`.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &OcrConfig,
) -> Result<ConversionOutput, OcrMdError> {
    let input_str = input_str.as_ref();
    info!("Starting OCR: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let provider = MistralOcrProvider::new(config)?;
    convert_with(&resolved.bytes, &provider).await
}

/// OCR PDF bytes held in memory.
///
/// ```rust,no_run
/// use ocrmd::{convert_from_bytes, OcrConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("scan.pdf")?;
/// let output = convert_from_bytes(&bytes, &OcrConfig::default()).await?;
/// println!("{}", output.markdown);
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &OcrConfig,
) -> Result<ConversionOutput, OcrMdError> {
    input::check_signature("<memory>", bytes)?;
    let provider = MistralOcrProvider::new(config)?;
    convert_with(bytes, &provider).await
}

/// OCR already-validated PDF bytes with an explicit provider.
pub async fn convert_with(
    bytes: &[u8],
    provider: &dyn OcrProvider,
) -> Result<ConversionOutput, OcrMdError> {
    let total_start = Instant::now();

    let document_url = encode::document_url(bytes);

    let ocr_start = Instant::now();
    let response = provider.process(&document_url).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    debug!(
        "{} answered with model {} in {}ms",
        provider.name(),
        response.model,
        ocr_duration_ms
    );

    let mut pages = response.pages;
    pages.sort_by_key(|p| p.index);

    let markdown = assemble::assemble_markdown(&pages);
    let outline = outline::summarize(&markdown);

    let stats = ConversionStats {
        total_pages: pages.len(),
        heading_count: outline.heading_count(),
        markdown_bytes: markdown.len(),
        ocr_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "OCR complete: {} page(s), {} heading(s), {}ms total",
        stats.total_pages, stats.heading_count, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        markdown,
        outline,
        pages,
        stats,
    })
}

/// OCR a PDF and write one export format to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    format: ExportFormat,
    ocr: &OcrConfig,
    render: &RenderConfig,
) -> Result<ConversionStats, OcrMdError> {
    let output = convert(input_str, ocr).await?;
    let bytes = export(&output.markdown, format, render)?;
    write_output(output_path.as_ref(), &bytes).await?;
    Ok(output.stats)
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
pub async fn write_output(path: &Path, bytes: &[u8]) -> Result<(), OcrMdError> {
    let write_failed = |source: std::io::Error| OcrMdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(write_failed)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &OcrConfig,
) -> Result<ConversionOutput, OcrMdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OcrMdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}
