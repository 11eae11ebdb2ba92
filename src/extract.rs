//! Uploaded-file text extraction.
//!
//! Supported uploads are plain text and PDF. Text files are decoded as
//! UTF-8 with a Latin-1 fallback (a common encoding for exported mail).
//! PDFs are probed for encryption first, then run through the text
//! extractor.

use thiserror::Error;

const ALLOWED_EXTENSIONS: [&str; 2] = ["txt", "pdf"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid file format. Please upload .txt or .pdf files only.")]
    UnsupportedExtension,
    #[error("PDF is password protected. Please provide an unencrypted version.")]
    EncryptedPdf,
    #[error("Could not read PDF file: {0}")]
    Pdf(String),
}

/// True when the filename carries an allowed extension.
pub fn allowed_file(filename: &str) -> bool {
    extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Extract email text from an uploaded file's bytes.
pub fn extract_from_upload(filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    match extension(filename).as_deref() {
        Some("txt") => Ok(decode_text(bytes)),
        Some("pdf") => extract_pdf(bytes),
        _ => Err(ExtractError::UnsupportedExtension),
    }
}

/// UTF-8 first; Latin-1 maps bytes to code points one-to-one, so it never
/// fails and serves as the lossless fallback.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(ExtractError::EncryptedPdf);
    }

    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allowlist() {
        assert!(allowed_file("mail.txt"));
        assert!(allowed_file("report.PDF"));
        assert!(!allowed_file("mail.docx"));
        assert!(!allowed_file("no_extension"));
        assert!(!allowed_file(".txt"));
    }

    #[test]
    fn utf8_text_decodes() {
        let out = extract_from_upload("mail.txt", "Hello, world".as_bytes()).unwrap();
        assert_eq!(out, "Hello, world");
    }

    #[test]
    fn latin1_text_falls_back() {
        // "café" in Latin-1: 0xE9 is not valid UTF-8 on its own.
        let out = extract_from_upload("mail.txt", b"caf\xe9").unwrap();
        assert_eq!(out, "caf\u{e9}");
    }

    #[test]
    fn unsupported_extension_rejected() {
        let err = extract_from_upload("mail.docx", b"whatever").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedExtension));
    }

    #[test]
    fn garbage_pdf_is_an_error() {
        let err = extract_from_upload("mail.pdf", b"this is not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }
}
