//! Error types for the ocrmd library.
//!
//! Two error types reflect two layers:
//!
//! * [`RenderError`]: the layout backend rejected the styled block stream.
//!   Produced only by [`crate::render`]; the backend's message is carried
//!   verbatim so callers can surface it unchanged.
//!
//! * [`OcrMdError`]: every fatal error a caller of the top-level entry points
//!   can see: empty input rejected at the boundary, a wrapped [`RenderError`],
//!   and the upload / OCR-provider failures that happen before any text
//!   exists. None of these are retried or recovered locally.

use std::path::PathBuf;
use thiserror::Error;

/// The layout backend failed to produce a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The backend reported a failure; `message` is passed through as-is.
    #[error("{message}")]
    Backend { message: String },
}

impl RenderError {
    pub fn backend(message: impl Into<String>) -> Self {
        RenderError::Backend {
            message: message.into(),
        }
    }
}

/// All fatal errors returned by the ocrmd library.
#[derive(Debug, Error)]
pub enum OcrMdError {
    // ── Caller errors ─────────────────────────────────────────────────────
    /// The text to export or render is empty or whitespace only.
    #[error("Nothing to render: the document text is empty")]
    EmptyInput,

    /// An export format name that is not `md`, `txt` or `pdf`.
    #[error("Unknown export format '{format}' (expected md, txt or pdf)")]
    UnknownFormat { format: String },

    /// PDF rendering failed inside the layout backend. Displays the
    /// backend's message unchanged.
    #[error(transparent)]
    Render(#[from] RenderError),

    // ── Upload / input errors ─────────────────────────────────────────────
    /// No file was uploaded, or the upload was empty.
    #[error("No file was uploaded")]
    MissingUpload,

    /// The uploaded or local file does not have a `.pdf` extension.
    #[error("The file must be a PDF: '{filename}'")]
    InvalidExtension { filename: String },

    /// The bytes do not start with the `%PDF` signature.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── OCR provider errors ───────────────────────────────────────────────
    /// The OCR API key is not set.
    #[error("Environment variable {var} is not set")]
    MissingApiKey { var: String },

    /// The request to the OCR provider could not be completed.
    #[error("OCR request failed: {reason}")]
    OcrRequestFailed { reason: String },

    /// The OCR provider answered with a non-success status.
    #[error("OCR API error (HTTP {status}): {message}")]
    OcrApi { status: u16, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrMdError {
    /// `true` when the caller sent something unusable, as opposed to a
    /// failure on our side or the provider's. The HTTP layer maps these to 400.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OcrMdError::EmptyInput
                | OcrMdError::UnknownFormat { .. }
                | OcrMdError::MissingUpload
                | OcrMdError::InvalidExtension { .. }
                | OcrMdError::NotAPdf { .. }
        )
    }
}
