//! OCR Module
//!
//! Fallback text acquisition for scanned PDFs. Every page is tried under
//! several recognition configurations and the best output is kept.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use idscan_server::ocr::{OcrFallbackConfig, OcrFallbackEngine};
//!
//! let engine = OcrFallbackEngine::new(&OcrFallbackConfig::default());
//! let result = engine.recognize(Arc::new(pdf_bytes)).await?;
//! println!("{}", result.full_text);
//! ```

mod provider;
mod scoring;
mod service;
mod types;

pub use provider::{OcrEngine, TesseractEngine};
pub use scoring::{select_best, LongestText, TextScorer};
pub use service::{OcrFallbackConfig, OcrFallbackEngine};
pub use types::{
    OcrError, OcrResult, RecognitionConfig, DEFAULT_CONFIGS, DEFAULT_LANGUAGES, PAGE_SEPARATOR,
};
