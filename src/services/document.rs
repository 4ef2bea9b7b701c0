// Document Text Extraction
// Plain text from .docx files for the front ends; the analysis core only ever sees strings.

use regex::Regex;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Only .docx files are supported: {0}")]
    UnsupportedFormat(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse document: {0}")]
    Parse(String),
}

/// Read a `.docx` file and return its paragraphs joined by newlines.
pub fn read_docx_file(path: &Path) -> Result<String, ExtractError> {
    let is_docx = path
        .extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("docx"))
        .unwrap_or(false);
    if !is_docx {
        return Err(ExtractError::UnsupportedFormat(path.display().to_string()));
    }
    if !path.exists() {
        return Err(ExtractError::NotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    extract_docx_text(&bytes)
}

/// Paragraph texts of a .docx archive, blank paragraphs skipped.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    match extract_with_reader(bytes) {
        Ok(text) if !text.is_empty() => Ok(text),
        Ok(text) => Ok(extract_from_xml(bytes).unwrap_or(text)),
        Err(e) => {
            warn!(error = %e, "docx reader failed, falling back to raw XML");
            extract_from_xml(bytes)
        }
    }
}

fn extract_with_reader(bytes: &[u8]) -> Result<String, ExtractError> {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Parse(e.to_string()))?;
    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        let DocumentChild::Paragraph(paragraph) = child else {
            continue;
        };
        let mut text = String::new();
        for pc in &paragraph.children {
            if let ParagraphChild::Run(run) = pc {
                for rc in &run.children {
                    match rc {
                        RunChild::Text(t) => text.push_str(&t.text),
                        RunChild::Tab(_) => text.push('\t'),
                        _ => {}
                    }
                }
            }
        }
        paragraphs.push(text);
    }
    debug!(paragraphs = paragraphs.len(), "docx.reader.extracted");
    Ok(join_paragraphs(paragraphs))
}

fn extract_from_xml(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Parse(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Parse(e.to_string()))?
        .read_to_string(&mut xml)?;

    let paragraphs = xml
        .split("</w:p>")
        .map(|chunk| unescape_xml(&tag_re().replace_all(chunk, "")))
        .collect();
    Ok(join_paragraphs(paragraphs))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex"))
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn join_paragraphs(paragraphs: Vec<String>) -> String {
    paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(document_xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_xml_fallback_joins_paragraphs() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>First &amp; foremost.</w:t></w:r></w:p><w:p></w:p><w:p><w:r><w:t>Second</w:t></w:r><w:r><w:t xml:space="preserve"> part.</w:t></w:r></w:p></w:body></w:document>"#;
        let text = extract_docx_text(&docx_bytes(xml)).unwrap();
        assert_eq!(text, "First & foremost.\nSecond part.");
    }

    #[test]
    fn test_reader_path() {
        let mut buf = Cursor::new(Vec::new());
        docx_rs::Docx::new()
            .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Hello world.")))
            .add_paragraph(docx_rs::Paragraph::new())
            .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Second one.")))
            .build()
            .pack(&mut buf)
            .unwrap();
        let text = extract_docx_text(buf.get_ref()).unwrap();
        assert_eq!(text, "Hello world.\nSecond one.");
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(extract_docx_text(b"not a zip"), Err(ExtractError::Parse(_))));
    }

    #[test]
    fn test_non_docx_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "text").unwrap();
        assert!(matches!(read_docx_file(&path), Err(ExtractError::UnsupportedFormat(_))));
        assert!(matches!(
            read_docx_file(&dir.path().join("missing.docx")),
            Err(ExtractError::NotFound(_))
        ));
    }
}
