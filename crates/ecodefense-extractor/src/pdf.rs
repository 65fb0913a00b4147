//! Page text extraction from PDF documents

use crate::error::ExtractorError;
use flate2::read::ZlibDecoder;
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Text pulled from a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Page texts in page order, joined by a line break
    pub text: String,

    /// Pages in the document
    pub page_count: usize,

    /// Pages visited (the page limit may stop early)
    pub pages_read: usize,

    /// 1-based numbers of pages whose extraction failed
    pub failed_pages: Vec<u32>,
}

/// Extracts the text of every page, skipping pages that fail
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor {
    page_limit: Option<usize>,
}

impl TextExtractor {
    /// Extractor reading every page
    pub fn new() -> Self {
        Self::default()
    }

    /// Read at most `pages` pages from the start of the document
    pub fn with_page_limit(pages: usize) -> Self {
        Self {
            page_limit: Some(pages),
        }
    }

    /// Extract text from a file on disk
    pub fn extract_file(&self, path: &Path) -> Result<ExtractedText, ExtractorError> {
        let bytes = std::fs::read(path)?;
        self.extract_bytes(&bytes)
    }

    /// Extract text from PDF bytes
    ///
    /// Fails with `CorruptDocument` if the bytes are not a readable PDF and
    /// with `EmptyExtraction` if no page yields any text.
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractorError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| ExtractorError::CorruptDocument(e.to_string()))?;

        let pages = doc.get_pages();
        let page_count = pages.len();
        let limit = self.page_limit.unwrap_or(page_count).min(page_count);

        let mut texts = Vec::new();
        let mut failed_pages = Vec::new();

        for (&page_number, &page_id) in pages.iter().take(limit) {
            let page_text = page_content(&doc, page_id)
                .and_then(|data| Content::decode(&data).map_err(|e| e.to_string()))
                .and_then(|_| doc.extract_text(&[page_number]).map_err(|e| e.to_string()));

            match page_text {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        texts.push(text.to_string());
                    }
                }
                Err(e) => {
                    warn!(page = page_number, "Skipping page, text extraction failed: {}", e);
                    failed_pages.push(page_number);
                }
            }
        }

        let text = texts.join("\n");
        debug!(
            page_count,
            pages_read = limit,
            failed = failed_pages.len(),
            chars = text.len(),
            "Extracted document text"
        );

        if text.trim().is_empty() {
            return Err(ExtractorError::EmptyExtraction { pages: page_count });
        }

        Ok(ExtractedText {
            text,
            page_count,
            pages_read: limit,
            failed_pages,
        })
    }
}

/// Decoded bytes of every content stream on a page
///
/// Fails when a content object is missing or a stream does not decode.
fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, String> {
    let mut content = Vec::new();
    for id in doc.get_page_contents(page_id) {
        let stream = doc
            .get_object(id)
            .and_then(Object::as_stream)
            .map_err(|e| format!("content stream {} {} R: {}", id.0, id.1, e))?;
        content.extend(decode_stream(stream)?);
        content.push(b'\n');
    }
    Ok(content)
}

fn decode_stream(stream: &Stream) -> Result<Vec<u8>, String> {
    if !stream.dict.has(b"Filter") {
        return Ok(stream.content.clone());
    }

    let filters = stream.filters().map_err(|e| e.to_string())?;
    match filters.as_slice() {
        // lopdf logs inflate errors and returns what it got, so inflate here
        [filter] if filter == "FlateDecode" && !stream.dict.has(b"DecodeParms") => {
            let mut data = Vec::new();
            ZlibDecoder::new(stream.content.as_slice())
                .read_to_end(&mut data)
                .map_err(|e| format!("FlateDecode: {}", e))?;
            Ok(data)
        }
        _ => stream.decompressed_content().map_err(|e| e.to_string()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_concatenated_in_order() {
        let pdf = test_pdf::build(&[Some("First page"), Some("Second page"), Some("Third page")]);
        let extracted = TextExtractor::new().extract_bytes(&pdf).unwrap();

        assert_eq!(extracted.page_count, 3);
        assert_eq!(extracted.pages_read, 3);
        let first = extracted.text.find("First page").unwrap();
        let second = extracted.text.find("Second page").unwrap();
        let third = extracted.text.find("Third page").unwrap();
        assert!(first < second && second < third);
        assert!(extracted.failed_pages.is_empty());
    }

    #[test]
    fn test_blank_pages_contribute_nothing() {
        let pdf = test_pdf::build(&[None, Some("Only text"), None]);
        let extracted = TextExtractor::new().extract_bytes(&pdf).unwrap();

        assert_eq!(extracted.text.trim(), "Only text");
        assert_eq!(extracted.page_count, 3);
    }

    #[test]
    fn test_no_text_is_empty_extraction() {
        let pdf = test_pdf::build(&[None, None, None, None, None]);
        let result = TextExtractor::new().extract_bytes(&pdf);
        assert!(matches!(
            result,
            Err(ExtractorError::EmptyExtraction { pages: 5 })
        ));
    }

    #[test]
    fn test_unreadable_pages_are_skipped_and_reported() {
        let pdf = test_pdf::build(&[
            Some("Good first page"),
            Some("Compressed page"),
            Some("Dangling page"),
        ]);
        let pdf = test_pdf::break_pages(&pdf, 2, 3);

        let extracted = TextExtractor::new().extract_bytes(&pdf).unwrap();
        assert_eq!(extracted.text.trim(), "Good first page");
        assert_eq!(extracted.page_count, 3);
        assert_eq!(extracted.failed_pages, vec![2, 3]);
    }

    #[test]
    fn test_every_page_unreadable_is_empty_extraction() {
        let pdf = test_pdf::build(&[Some("Compressed page"), Some("Dangling page")]);
        let pdf = test_pdf::break_pages(&pdf, 1, 2);

        let result = TextExtractor::new().extract_bytes(&pdf);
        assert!(matches!(
            result,
            Err(ExtractorError::EmptyExtraction { pages: 2 })
        ));
    }

    #[test]
    fn test_flate_content_is_read() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let pdf = test_pdf::build(&[Some("Compressed licence text")]);
        let mut doc = Document::load_mem(&pdf).unwrap();
        let page_id = doc.get_pages()[&1];
        let content_id = doc.get_page_contents(page_id)[0];
        if let Ok(Object::Stream(stream)) = doc.get_object_mut(content_id) {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&stream.content).unwrap();
            stream.dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
            stream.set_content(encoder.finish().unwrap());
        }
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let extracted = TextExtractor::new().extract_bytes(&bytes).unwrap();
        assert!(extracted.text.contains("Compressed licence text"));
        assert!(extracted.failed_pages.is_empty());
    }

    #[test]
    fn test_page_limit() {
        let pdf = test_pdf::build(&[
            Some("Page one"),
            Some("Page two"),
            Some("Page three"),
            Some("Page four"),
        ]);
        let extracted = TextExtractor::with_page_limit(3).extract_bytes(&pdf).unwrap();

        assert_eq!(extracted.pages_read, 3);
        assert!(extracted.text.contains("Page three"));
        assert!(!extracted.text.contains("Page four"));
    }

    #[test]
    fn test_garbage_is_corrupt_document() {
        let result = TextExtractor::new().extract_bytes(b"this is not a pdf");
        assert!(matches!(result, Err(ExtractorError::CorruptDocument(_))));
    }

    #[test]
    fn test_extract_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("licence.pdf");
        std::fs::write(&path, test_pdf::build(&[Some("Licence text")])).unwrap();

        let extracted = TextExtractor::new().extract_file(&path).unwrap();
        assert!(extracted.text.contains("Licence text"));
    }
}
