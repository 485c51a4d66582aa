//! Text extraction for supported document formats.
//!
//! The file extension picks the extraction path: PDFs go through
//! `pdf-extract` (page texts concatenated with no boundary marker); every
//! other supported format is read as UTF-8 with invalid byte sequences
//! dropped. Files with any other extension are not documents.

use std::path::Path;

/// Formats the ingestor knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
    Markdown,
    SourceCode,
    Json,
}

impl DocumentFormat {
    /// Classify a path by extension (case-insensitive). `None` = unsupported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::PlainText),
            "md" => Some(Self::Markdown),
            "py" | "js" => Some(Self::SourceCode),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Extraction error. The ingestor logs it and skips the file.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Read `path` and return its plain text.
pub fn extract_text(path: &Path, format: DocumentFormat) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    match format {
        DocumentFormat::Pdf => extract_pdf(&bytes),
        DocumentFormat::PlainText
        | DocumentFormat::Markdown
        | DocumentFormat::SourceCode
        | DocumentFormat::Json => Ok(decode_utf8_ignoring_errors(&bytes)),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Decode UTF-8, silently dropping invalid sequences.
fn decode_utf8_ignoring_errors(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for piece in bytes.utf8_chunks() {
        out.push_str(piece.valid());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classifies_supported_extensions() {
        let cases = [
            ("resume.pdf", Some(DocumentFormat::Pdf)),
            ("notes.txt", Some(DocumentFormat::PlainText)),
            ("README.MD", Some(DocumentFormat::Markdown)),
            ("train.py", Some(DocumentFormat::SourceCode)),
            ("app.js", Some(DocumentFormat::SourceCode)),
            ("package.json", Some(DocumentFormat::Json)),
            ("cover.docx", None),
            ("Makefile", None),
        ];
        for (name, expected) in cases {
            assert_eq!(DocumentFormat::from_path(&PathBuf::from(name)), expected, "{}", name);
        }
    }

    #[test]
    fn invalid_utf8_bytes_are_dropped() {
        let bytes = b"caf\xc3\xa9 \xff\xfe ok";
        assert_eq!(decode_utf8_ignoring_errors(bytes), "café  ok");
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pdf(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn missing_file_returns_io_error() {
        let err = extract_text(Path::new("/no/such/file.txt"), DocumentFormat::PlainText)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }

    #[test]
    fn reads_text_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.md");
        std::fs::write(&path, "# Projects\n\nBuilt things.").unwrap();
        let text = extract_text(&path, DocumentFormat::Markdown).unwrap();
        assert_eq!(text, "# Projects\n\nBuilt things.");
    }
}
