//! Candidate documents (resume, job description) as plain text.
//!
//! Plain text and markdown are read directly. PDF and Word files are
//! extracted when built with the `documents` feature.

use std::path::Path;
use tracing::debug;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Pdf,
    Word,
}

fn format_of(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        e if TEXT_EXTENSIONS.contains(&e) => Some(Format::Text),
        "pdf" => Some(Format::Pdf),
        "docx" | "doc" => Some(Format::Word),
        _ => None,
    }
}

/// Read a document as text.
///
/// Never fails: an empty path, a missing file, an unsupported or corrupt
/// document and a read error all yield an empty string. Invalid UTF-8 in
/// text files is replaced lossily.
pub fn load_text(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        return String::new();
    }

    let Some(format) = format_of(path) else {
        debug!(path = %path.display(), "unsupported document format, ignoring");
        return String::new();
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), "failed to read document: {e}");
            return String::new();
        }
    };

    let extracted = match format {
        Format::Text => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Format::Pdf => pdf_text(&bytes),
        Format::Word => word_text(&bytes),
    };
    extracted.unwrap_or_else(|| {
        debug!(path = %path.display(), ?format, "no text extracted from document");
        String::new()
    })
}

#[cfg(feature = "documents")]
fn pdf_text(bytes: &[u8]) -> Option<String> {
    // The extractor can panic on malformed files.
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    match result {
        Ok(Ok(text)) => Some(text.trim().to_string()),
        Ok(Err(e)) => {
            debug!("pdf extraction failed: {e}");
            None
        }
        Err(_) => {
            debug!("pdf extraction panicked");
            None
        }
    }
}

#[cfg(feature = "documents")]
fn word_text(bytes: &[u8]) -> Option<String> {
    match docx_body_text(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("word extraction failed: {e}");
            None
        }
    }
}

/// Paragraph text from `word/document.xml`, one paragraph per line.
#[cfg(feature = "documents")]
fn docx_body_text(bytes: &[u8]) -> std::result::Result<String, String> {
    use quick_xml::Reader;
    use quick_xml::events::Event;
    use std::io::{Cursor, Read};

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                text.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text.trim().to_string())
}

#[cfg(not(feature = "documents"))]
fn pdf_text(_bytes: &[u8]) -> Option<String> {
    debug!("built without the documents feature; PDF ignored");
    None
}

#[cfg(not(feature = "documents"))]
fn word_text(_bytes: &[u8]) -> Option<String> {
    debug!("built without the documents feature; Word document ignored");
    None
}
