//! Input resolution: turn a path, URL or uploaded file into validated PDF bytes.
//!
//! The OCR provider takes the document inline, so there is no need for a
//! file on disk: every input kind ends up as an in-memory buffer plus a
//! display name. Validation is the same for all three kinds and happens
//! before any network call to the provider, so a stray `.docx` fails fast
//! with a 400 instead of burning an OCR request.

use crate::error::OcrMdError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF ready to be encoded and sent for OCR.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    /// File name or URL, for messages and logs.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ResolvedInput {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// `true` when the name ends in `.pdf`, ignoring case.
pub fn has_pdf_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Fail with [`OcrMdError::NotAPdf`] unless `bytes` starts with `%PDF`.
pub fn check_signature(name: &str, bytes: &[u8]) -> Result<(), OcrMdError> {
    if bytes.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    Err(OcrMdError::NotAPdf {
        name: name.to_string(),
        magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
    })
}

/// Validate an uploaded file: non-empty, `.pdf` name, `%PDF` signature.
pub fn validate_upload(filename: &str, bytes: Vec<u8>) -> Result<ResolvedInput, OcrMdError> {
    if filename.is_empty() || bytes.is_empty() {
        return Err(OcrMdError::MissingUpload);
    }
    if !has_pdf_extension(filename) {
        return Err(OcrMdError::InvalidExtension {
            filename: filename.to_string(),
        });
    }
    check_signature(filename, &bytes)?;
    debug!("Accepted upload '{}' ({} bytes)", filename, bytes.len());
    Ok(ResolvedInput {
        name: filename.to_string(),
        bytes,
    })
}

/// Resolve a path or URL to validated PDF bytes.
///
/// URLs are downloaded with the given timeout; local paths must exist, be
/// readable and carry a `.pdf` extension.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, OcrMdError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<ResolvedInput, OcrMdError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(OcrMdError::PermissionDenied { path });
        }
        Err(_) => return Err(OcrMdError::FileNotFound { path }),
    };

    if !has_pdf_extension(path_str) {
        return Err(OcrMdError::InvalidExtension {
            filename: path_str.to_string(),
        });
    }
    check_signature(path_str, &bytes)?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput {
        name: path_str.to_string(),
        bytes,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, OcrMdError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| OcrMdError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            OcrMdError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| failed(e.to_string()))?
        .to_vec();

    check_signature(url, &bytes)?;
    info!("Downloaded {} bytes", bytes.len());

    Ok(ResolvedInput {
        name: url.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY_PDF: &[u8] = b"%PDF-1.4\n%%EOF\n";

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(has_pdf_extension("scan.pdf"));
        assert!(has_pdf_extension("SCAN.PDF"));
        assert!(has_pdf_extension("dir/report.Pdf"));
        assert!(!has_pdf_extension("notes.docx"));
        assert!(!has_pdf_extension("pdf"));
        assert!(!has_pdf_extension("archive.pdf.zip"));
    }

    #[test]
    fn upload_accepts_valid_pdf() {
        let input = validate_upload("scan.pdf", TINY_PDF.to_vec()).unwrap();
        assert_eq!(input.name, "scan.pdf");
        assert_eq!(input.len(), TINY_PDF.len());
    }

    #[test]
    fn upload_rejects_empty() {
        assert!(matches!(
            validate_upload("scan.pdf", Vec::new()),
            Err(OcrMdError::MissingUpload)
        ));
        assert!(matches!(
            validate_upload("", TINY_PDF.to_vec()),
            Err(OcrMdError::MissingUpload)
        ));
    }

    #[test]
    fn upload_rejects_wrong_extension() {
        let err = validate_upload("scan.png", TINY_PDF.to_vec()).unwrap_err();
        assert!(matches!(err, OcrMdError::InvalidExtension { .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn upload_rejects_bad_magic() {
        let err = validate_upload("fake.pdf", b"PK\x03\x04zip".to_vec()).unwrap_err();
        match err {
            OcrMdError::NotAPdf { magic, .. } => assert_eq!(magic, b"PK\x03\x04".to_vec()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn local_missing_file() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, OcrMdError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, TINY_PDF).unwrap();
        let input = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(input.bytes, TINY_PDF);
    }

    #[tokio::test]
    async fn local_non_pdf_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, TINY_PDF).unwrap();
        let err = resolve_input(path.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, OcrMdError::InvalidExtension { .. }));
    }
}
