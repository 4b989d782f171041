//! Format-specific text extraction for PDF, presentation, and text blobs.

use crate::loader::types::ExtractError;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::Read;
use std::path::Path;

/// Maximum decompressed bytes read from a single archive entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extract per-page text from a PDF file.
pub fn extract_pdf(path: &Path) -> Result<Vec<String>, ExtractError> {
    pdf_extract::extract_text_by_pages(path).map_err(|err| ExtractError::Pdf(err.to_string()))
}

/// Extract per-slide text from a `.pptx` archive, in slide order.
pub fn extract_presentation(path: &Path) -> Result<Vec<String>, ExtractError> {
    let bytes = std::fs::read(path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|err| ExtractError::Presentation(err.to_string()))?;

    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .map(|name| name.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut slides = Vec::with_capacity(slide_names.len());
    for name in slide_names {
        let entry = archive
            .by_name(&name)
            .map_err(|err| ExtractError::Presentation(err.to_string()))?;
        let mut xml = Vec::new();
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut xml)
            .map_err(|err| ExtractError::Presentation(err.to_string()))?;
        if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(ExtractError::Presentation(format!(
                "archive entry {name} exceeds size limit"
            )));
        }
        slides.push(extract_text_runs(&xml)?);
    }
    Ok(slides)
}

/// Read a UTF-8 plain-text file.
pub fn extract_text_file(path: &Path) -> Result<String, ExtractError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Collect the `a:t` text runs of a slide's XML into one string.
fn extract_text_runs(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(Event::Text(text)) = reader.read_event_into(&mut buf) {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(text.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ExtractError::Presentation(err.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_pptx(slides: &[&str]) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new()
            .suffix(".pptx")
            .tempfile()
            .expect("temp file");
        let mut writer = zip::ZipWriter::new(file.reopen().expect("reopen"));
        for (idx, body) in slides.iter().enumerate() {
            let name = format!("ppt/slides/slide{}.xml", idx + 1);
            writer
                .start_file(name, SimpleFileOptions::default())
                .expect("start entry");
            let xml = format!(
                "<p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">\
                 <a:t>{body}</a:t></p:sld>"
            );
            writer.write_all(xml.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish archive");
        file
    }

    #[test]
    fn presentation_extraction_yields_one_string_per_slide() {
        let file = write_pptx(&["First slide", "Second slide"]);
        let slides = extract_presentation(file.path()).expect("slides");
        assert_eq!(slides, vec!["First slide", "Second slide"]);
    }

    #[test]
    fn invalid_archive_returns_presentation_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"not a zip").expect("write");
        let error = extract_presentation(file.path()).unwrap_err();
        assert!(matches!(error, ExtractError::Presentation(_)));
    }

    #[test]
    fn invalid_pdf_returns_pdf_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"not a pdf").expect("write");
        let error = extract_pdf(file.path()).unwrap_err();
        assert!(matches!(error, ExtractError::Pdf(_)));
    }

    #[test]
    fn text_extraction_reads_utf8_body() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all("Paris is the capital of France.".as_bytes())
            .expect("write");
        let text = extract_text_file(file.path()).expect("text");
        assert_eq!(text, "Paris is the capital of France.");
    }
}
