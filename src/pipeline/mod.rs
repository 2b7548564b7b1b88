//! Pipeline stages for PDF → OCR markdown.
//!
//! Each submodule implements exactly one step, so each can be tested alone
//! and the provider can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ ocr ──▶ assemble
//! (path/URL/  (data URL) (HTTP)  (# Page N
//!  upload)                        separators)
//! ```
//!
//! 1. [`input`]   : read or download the PDF and validate name and signature
//! 2. [`encode`]  : base64-wrap the bytes as a `data:` document URL
//! 3. [`ocr`]     : one provider call; the only stage with network I/O
//! 4. [`assemble`]: join per-page markdown with page headings

pub mod assemble;
pub mod encode;
pub mod input;
pub mod ocr;
