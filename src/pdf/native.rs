//! Native text-layer extraction
//!
//! Reads the embedded text of every page without OCR and decides,
//! from the amount of text found, whether the PDF is probably a scan.

use mupdf::{Document, TextPageOptions};
use thiserror::Error;

use super::types::ExtractionResult;
use super::{has_pdf_header, PDF_MIME};

/// PDF text extraction errors
#[derive(Error, Debug)]
pub enum PdfExtractionError {
    #[error("Empty input: no PDF bytes were provided")]
    Empty,
    #[error("Not a PDF: missing %PDF- header")]
    NotAPdf,
    #[error("Failed to open PDF: {0}")]
    Open(String),
    #[error("PDF has no pages")]
    NoPages,
    #[error("Failed to extract text from page {page}: {message}")]
    PageText { page: usize, message: String },
    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Reads the text layer of PDF documents
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTextExtractor;

impl NativeTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the text layer of every page.
    ///
    /// Pages are trimmed and empty ones dropped; the remainder is joined
    /// in page order with a blank line.
    pub fn extract(&self, pdf_bytes: &[u8]) -> Result<ExtractionResult, PdfExtractionError> {
        let doc = open(pdf_bytes)?;

        let page_count = doc
            .page_count()
            .map_err(|e| PdfExtractionError::Open(e.to_string()))?
            .max(0) as usize;
        if page_count == 0 {
            return Err(PdfExtractionError::NoPages);
        }

        let mut parts: Vec<String> = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let text = page_text(&doc, index).map_err(|e| PdfExtractionError::PageText {
                page: index + 1,
                message: e.to_string(),
            })?;

            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }

        let result = ExtractionResult::new(parts.join("\n\n"), page_count);
        tracing::debug!(
            page_count = result.page_count,
            chars = result.full_text.chars().count(),
            scanned = result.is_probably_scanned,
            "Extracted native text layer"
        );

        Ok(result)
    }

    /// Run [`extract`](Self::extract) on the blocking pool
    pub async fn extract_blocking(
        &self,
        pdf_bytes: std::sync::Arc<Vec<u8>>,
    ) -> Result<ExtractionResult, PdfExtractionError> {
        let extractor = *self;
        tokio::task::spawn_blocking(move || extractor.extract(&pdf_bytes))
            .await
            .map_err(|e| PdfExtractionError::Task(e.to_string()))?
    }
}

fn open(pdf_bytes: &[u8]) -> Result<Document, PdfExtractionError> {
    if pdf_bytes.is_empty() {
        return Err(PdfExtractionError::Empty);
    }
    if !has_pdf_header(pdf_bytes) {
        return Err(PdfExtractionError::NotAPdf);
    }

    Document::from_bytes(pdf_bytes, PDF_MIME).map_err(|e| PdfExtractionError::Open(e.to_string()))
}

fn page_text(doc: &Document, index: usize) -> Result<String, mupdf::Error> {
    let page = doc.load_page(index as i32)?;
    let text_page = page.to_text_page(TextPageOptions::empty())?;
    text_page.to_text()
}
