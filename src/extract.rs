//! Text extraction for the supported document formats.
//!
//! The loader supplies raw bytes plus a [`DocKind`] chosen from the file
//! extension; this module returns plain UTF-8 text. PDFs are extracted page
//! by page so each page can become its own document.

use std::path::Path;

use thiserror::Error;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Pdf,
    Text,
}

impl DocKind {
    /// Classify a path by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocKind::Pdf),
            "txt" => Some(DocKind::Text),
            _ => None,
        }
    }
}

/// Extraction error. Never a panic; the loader records it and moves on.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("invalid UTF-8 at byte {0}")]
    Utf8(usize),
}

/// Extract the text of every page of a PDF, in page order.
pub fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    // pdf-extract panics on some malformed inputs.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("parser panicked".to_string())),
    }
}

/// Decode a text file strictly as UTF-8, dropping a leading BOM.
pub fn decode_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ExtractError::Utf8(e.valid_up_to()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocKind::from_path(Path::new("a.pdf")), Some(DocKind::Pdf));
        assert_eq!(DocKind::from_path(Path::new("B.PDF")), Some(DocKind::Pdf));
        assert_eq!(DocKind::from_path(Path::new("notes.Txt")), Some(DocKind::Text));
        assert_eq!(DocKind::from_path(Path::new("readme.md")), None);
        assert_eq!(DocKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pdf_pages(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn decode_text_strips_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhello").unwrap(), "hello");
        assert_eq!(decode_text("héllo".as_bytes()).unwrap(), "héllo");
    }

    #[test]
    fn invalid_utf8_reports_position() {
        let err = decode_text(b"ok\xFF\xFE").unwrap_err();
        assert!(matches!(err, ExtractError::Utf8(2)));
    }
}
