//! Text extraction for uploaded resumes.
//!
//! PDFs go through `pdf-extract`; `.txt` and `.md` are read as UTF-8.
//! Line structure is kept so the segmenter can still see headers.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::models::document::RawDocument;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type '{0}' (expected .pdf, .txt or .md)")]
    Unsupported(String),

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("file is not valid UTF-8 text")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("no text could be extracted")]
    Empty,
}

/// Extracts resume text from an uploaded file, dispatching on its extension.
pub fn extract(file_name: &str, bytes: &[u8]) -> Result<RawDocument, ExtractError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let raw = match ext.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        "txt" | "md" => String::from_utf8(bytes.to_vec())?,
        other => return Err(ExtractError::Unsupported(other.to_string())),
    };

    let text = clean_text(&raw);
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    debug!("Extracted {} chars from .{ext} upload", text.chars().count());
    Ok(RawDocument::new(text))
}

/// Normalises line endings and rejoins words hyphenated across a line break.
pub fn clean_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let chars: Vec<char> = unified.chars().collect();
    let mut out = String::with_capacity(unified.len());

    let mut i = 0;
    while i < chars.len() {
        let joins = chars[i] == '-'
            && chars.get(i + 1) == Some(&'\n')
            && i > 0
            && chars[i - 1].is_alphanumeric()
            && chars.get(i + 2).is_some_and(|c| c.is_alphanumeric());
        if joins {
            i += 2;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_upload() {
        let doc = extract("resume.TXT", b"Skills\r\nPython\r\n").unwrap();
        assert_eq!(doc.text, "Skills\nPython");
    }

    #[test]
    fn test_hyphenated_line_break_rejoined() {
        assert_eq!(clean_text("experi-\nence in man-\n agement"), "experience in man-\n agement");
        assert_eq!(clean_text("state-of-the-art"), "state-of-the-art");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = extract("resume.docx", b"PK..").unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(ext) if ext == "docx"));
        assert!(matches!(extract("resume", b"text"), Err(ExtractError::Unsupported(_))));
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(matches!(extract("blank.md", b"  \n\t "), Err(ExtractError::Empty)));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(matches!(
            extract("bad.txt", &[0xff, 0xfe, 0x00]),
            Err(ExtractError::Encoding(_))
        ));
    }

    #[test]
    fn test_garbage_pdf_is_pdf_error() {
        assert!(matches!(
            extract("resume.pdf", b"not a pdf"),
            Err(ExtractError::Pdf(_))
        ));
    }
}
