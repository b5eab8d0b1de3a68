use std::io::Write;

use tempfile::NamedTempFile;

use crate::error::{RagError, Result};

/// Extract the text of an uploaded PDF.
///
/// The bytes are staged in a named temp file for the extractor and removed
/// when the handle drops, on every exit path. A PDF that parses but contains
/// no text (a scanned image without an OCR layer) is an
/// `UnsupportedDocument`, not a crash.
pub fn extract_pdf_text(filename: &str, bytes: &[u8]) -> Result<String> {
    let mut staged = NamedTempFile::new()?;
    staged.write_all(bytes)?;
    staged.flush()?;

    let text = pdf_extract::extract_text(staged.path()).map_err(|e| RagError::UnsupportedDocument {
        filename: filename.to_string(),
        reason: e.to_string(),
    })?;

    ensure_extractable(filename, text)
}

/// Reject extraction output that carries no usable text.
fn ensure_extractable(filename: &str, text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(RagError::UnsupportedDocument {
            filename: filename.to_string(),
            reason: "the PDF contains no text layer (scanned images need OCR first)".to_string(),
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_extraction_is_unsupported() {
        let err = ensure_extractable("scan.pdf", "  \n\t ".to_string()).unwrap_err();
        match err {
            RagError::UnsupportedDocument { filename, .. } => assert_eq!(filename, "scan.pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_passes_through() {
        let text = ensure_extractable("notes.pdf", "page one".to_string()).unwrap();
        assert_eq!(text, "page one");
    }

    #[test]
    fn garbage_bytes_are_unsupported() {
        let err = extract_pdf_text("broken.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, RagError::UnsupportedDocument { .. }));
    }
}
