//! PDF extraction types

use serde::Serialize;

/// Below this many characters per page a PDF is treated as a scan
pub const SCANNED_CHARS_PER_PAGE: f64 = 50.0;

/// Result of reading the embedded text layer of a PDF
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Non-empty page texts, trimmed, joined by a blank line
    pub full_text: String,
    /// Number of pages in the document (always >= 1)
    pub page_count: usize,
    /// Characters-per-page heuristic verdict
    pub is_probably_scanned: bool,
}

impl ExtractionResult {
    pub fn new(full_text: String, page_count: usize) -> Self {
        let is_probably_scanned = is_probably_scanned(&full_text, page_count);
        Self {
            full_text,
            page_count,
            is_probably_scanned,
        }
    }
}

/// Average characters per page below the fixed threshold.
///
/// Characters are Unicode scalar values, not bytes.
pub fn is_probably_scanned(full_text: &str, page_count: usize) -> bool {
    let chars = full_text.chars().count() as f64;
    chars / (page_count.max(1) as f64) < SCANNED_CHARS_PER_PAGE
}
