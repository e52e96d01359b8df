//! OCR Types
//!
//! Recognition configurations, results and errors for the OCR fallback.

use serde::Serialize;

/// Separator between page texts
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Default recognition languages (Portuguese + English)
pub const DEFAULT_LANGUAGES: &str = "por+eng";

/// One engine parameter set tried on every page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecognitionConfig {
    /// Short label used in logs
    pub name: &'static str,
    /// Engine mode (`--oem`)
    pub engine_mode: u8,
    /// Page segmentation mode (`--psm`)
    pub page_segmentation: u8,
}

impl RecognitionConfig {
    pub const fn new(name: &'static str, engine_mode: u8, page_segmentation: u8) -> Self {
        Self {
            name,
            engine_mode,
            page_segmentation,
        }
    }
}

/// Configurations tried per page, in tie-break order
pub const DEFAULT_CONFIGS: [RecognitionConfig; 4] = [
    RecognitionConfig::new("block", 3, 6),
    RecognitionConfig::new("column", 3, 4),
    RecognitionConfig::new("legacy-lstm", 1, 6),
    RecognitionConfig::new("single-line", 3, 7),
];

/// OCR result for a whole document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrResult {
    /// Page texts joined by a blank line, trimmed
    pub full_text: String,
    /// Best text of each page, in page order
    pub per_page_texts: Vec<String>,
}

impl OcrResult {
    pub fn from_pages(per_page_texts: Vec<String>) -> Self {
        let full_text = per_page_texts.join(PAGE_SEPARATOR).trim().to_string();
        Self {
            full_text,
            per_page_texts,
        }
    }

    pub fn page_count(&self) -> usize {
        self.per_page_texts.len()
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    ProviderNotAvailable(String),

    #[error("Failed to convert PDF to images: {0}")]
    Rasterization(String),

    #[error("No pages were produced from the PDF")]
    NoPages,

    #[error("OCR failed on page {page}: {source}")]
    PageFailed {
        page: usize,
        #[source]
        source: Box<OcrError>,
    },

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),
}

impl OcrError {
    /// Wrap an error with the 1-based page it happened on
    pub fn on_page(page: usize, source: OcrError) -> Self {
        OcrError::PageFailed {
            page,
            source: Box::new(source),
        }
    }

    /// The underlying error, with page wrapping removed
    pub fn root_cause(&self) -> &OcrError {
        match self {
            OcrError::PageFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<crate::pdf::RasterizeError> for OcrError {
    fn from(e: crate::pdf::RasterizeError) -> Self {
        OcrError::Rasterization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_text_joins_and_trims() {
        let result = OcrResult::from_pages(vec![
            "  first page".to_string(),
            String::new(),
            "last page\n".to_string(),
        ]);

        assert_eq!(result.full_text, "first page\n\n\n\nlast page");
        assert_eq!(result.page_count(), 3);
    }

    #[test]
    fn test_default_configs_order() {
        let modes: Vec<(u8, u8)> = DEFAULT_CONFIGS
            .iter()
            .map(|c| (c.engine_mode, c.page_segmentation))
            .collect();
        assert_eq!(modes, vec![(3, 6), (3, 4), (1, 6), (3, 7)]);
    }

    #[test]
    fn test_page_failure_keeps_cause() {
        let err = OcrError::on_page(3, OcrError::ProviderNotAvailable("spawn".to_string()));

        assert_eq!(
            err.to_string(),
            "OCR failed on page 3: OCR engine not available: spawn"
        );
        assert!(matches!(
            err.root_cause(),
            OcrError::ProviderNotAvailable(_)
        ));
        assert!(std::error::Error::source(&err).is_some());
        assert!(matches!(OcrError::NoPages.root_cause(), OcrError::NoPages));
    }
}
