//! Document encoding: PDF bytes → `data:` URL for the OCR request body.
//!
//! The OCR endpoint accepts either a public URL or an inline data URL. Inline
//! keeps uploads private and avoids a second storage hop, at the cost of a
//! ~33% larger request.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// MIME type declared in the data URL.
pub const PDF_MIME: &str = "application/pdf";

/// Wrap PDF bytes as `data:application/pdf;base64,<standard base64>`.
pub fn document_url(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded document → {} bytes base64", b64.len());
    format!("data:{PDF_MIME};base64,{b64}")
}
