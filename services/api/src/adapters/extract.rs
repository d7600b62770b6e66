//! services/api/src/adapters/extract.rs
//!
//! Turns uploaded bytes into plain text. PDFs go through `pdf-extract`, DOCX body
//! paragraphs are read with `docx-rust`, and everything else is taken as UTF-8 text.

use async_trait::async_trait;
use docx_rust::document::{BodyContent, Paragraph, ParagraphContent, Run, RunContent};
use docx_rust::DocxFile;
use std::io::Cursor;
use study_assistant_core::ports::{PortError, PortResult, TextExtractionService};

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// An adapter that implements `TextExtractionService` for PDF, DOCX and plain text.
#[derive(Clone, Default)]
pub struct DocumentTextExtractor;

impl DocumentTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractionService for DocumentTextExtractor {
    async fn extract_text(&self, data: &[u8], mime_type: &str) -> PortResult<String> {
        let data = data.to_vec();
        let mime_type = mime_type.to_string();
        // Parsing is CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || extract_text(&data, &mime_type))
            .await
            .map_err(|e| PortError::Unexpected(format!("Extraction task failed: {}", e)))?
    }
}

/// Synchronous extraction entry point.
pub fn extract_text(data: &[u8], mime_type: &str) -> PortResult<String> {
    let text = match essence(mime_type).as_str() {
        PDF_MIME => extract_pdf(data)?,
        DOCX_MIME => extract_docx(data)?,
        _ => String::from_utf8(data.to_vec())
            .map_err(|e| PortError::Extraction(format!("file is not valid UTF-8 text: {}", e)))?,
    };

    if text.trim().is_empty() {
        return Err(PortError::Extraction("no text could be extracted".to_string()));
    }
    Ok(text)
}

/// `Application/PDF; charset=binary` -> `application/pdf`
fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn extract_pdf(data: &[u8]) -> PortResult<String> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(PortError::Extraction(format!("unreadable PDF: {}", e))),
        Err(_) => Err(PortError::Extraction("unreadable PDF".to_string())),
    }
}

fn extract_docx(data: &[u8]) -> PortResult<String> {
    let file = DocxFile::from_reader(Cursor::new(data))
        .map_err(|e| PortError::Extraction(format!("unreadable DOCX container: {}", e)))?;
    let docx = file
        .parse()
        .map_err(|e| PortError::Extraction(format!("unreadable DOCX body: {}", e)))?;

    let paragraphs: Vec<String> = docx
        .document
        .body
        .content
        .iter()
        .filter_map(|content| match content {
            BodyContent::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n\n"))
}

/// Text of one paragraph: runs and hyperlink runs in order, `<w:tab/>` as a tab and
/// `<w:br/>` as a newline.
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for content in &paragraph.content {
        match content {
            ParagraphContent::Run(run) => push_run(&mut text, run),
            ParagraphContent::Link(link) => {
                for run in link.content.iter() {
                    push_run(&mut text, run);
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run(out: &mut String, run: &Run) {
    for content in &run.content {
        match content {
            RunContent::Text(t) => out.push_str(&t.text),
            RunContent::Tab(_) => out.push('\t'),
            RunContent::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let parts = [
            (
                "[Content_Types].xml",
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
                    r#"</Types>"#,
                )
                .to_string(),
            ),
            (
                "_rels/.rels",
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
                    r#"</Relationships>"#,
                )
                .to_string(),
            ),
            (
                "word/_rels/document.xml.rels",
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#,
                )
                .to_string(),
            ),
            (
                "word/document.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"><w:body>{}</w:body></w:document>"#,
                    body
                ),
            ),
        ];

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, xml) in parts {
            writer.start_file(name, options).unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn plain_text_is_returned_verbatim() {
        let text = extract_text("Photosynthesis converts light.".as_bytes(), "text/plain").unwrap();
        assert_eq!(text, "Photosynthesis converts light.");
    }

    #[test]
    fn unknown_types_are_read_as_utf8() {
        let text = extract_text("# Notes".as_bytes(), "text/markdown; charset=utf-8").unwrap();
        assert_eq!(text, "# Notes");
    }

    #[test]
    fn invalid_utf8_is_an_extraction_error() {
        let err = extract_text(&[0xff, 0xfe, 0x00], "text/plain").unwrap_err();
        assert!(matches!(err, PortError::Extraction(_)));
    }

    #[test]
    fn whitespace_only_is_an_extraction_error() {
        let err = extract_text(b"  \n\t ", "text/plain").unwrap_err();
        assert!(matches!(err, PortError::Extraction(_)));
    }

    #[test]
    fn corrupt_pdf_is_an_extraction_error() {
        let err = extract_text(b"definitely not a pdf", "Application/PDF").unwrap_err();
        assert!(matches!(err, PortError::Extraction(_)));
    }

    #[test]
    fn docx_paragraphs_are_extracted() {
        let body = concat!(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>"#,
            r#"<w:r><w:t>Cells &amp; tissues</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Mitosis</w:t><w:tab/><w:t>phase</w:t><w:br/><w:t>two</w:t></w:r></w:p>"#,
        );
        let text = extract_text(&docx_with_body(body), DOCX_MIME).unwrap();
        assert_eq!(text, "Cells & tissues\n\nMitosis\tphase\ntwo");
    }

    #[test]
    fn docx_alternate_content_is_not_duplicated() {
        let body = concat!(
            r#"<w:p><w:r><mc:AlternateContent>"#,
            r#"<mc:Choice Requires="wps"><w:txbxContent><w:p><w:r><w:t>Box text</w:t></w:r></w:p></w:txbxContent></mc:Choice>"#,
            r#"<mc:Fallback><w:txbxContent><w:p><w:r><w:t>Box text</w:t></w:r></w:p></w:txbxContent></mc:Fallback>"#,
            r#"</mc:AlternateContent></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Body</w:t></w:r></w:p>"#,
        );
        let text = extract_text(&docx_with_body(body), DOCX_MIME).unwrap();
        assert!(text.ends_with("Body"));
        assert!(text.matches("Box text").count() <= 1);
    }

    #[test]
    fn docx_without_body_is_an_extraction_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_text(&bytes, DOCX_MIME).unwrap_err();
        assert!(matches!(err, PortError::Extraction(_)));
        let err = extract_text(b"not a zip", DOCX_MIME).unwrap_err();
        assert!(matches!(err, PortError::Extraction(_)));
    }

    #[tokio::test]
    async fn async_port_delegates_to_blocking_extraction() {
        let extractor = DocumentTextExtractor::new();
        let text = extractor.extract_text(b"hello", "text/plain").await.unwrap();
        assert_eq!(text, "hello");
    }
}
