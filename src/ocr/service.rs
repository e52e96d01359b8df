//! OCR Fallback
//!
//! Rasterizes a scanned PDF, enhances every page and runs each
//! recognition configuration on it, keeping the best candidate per page.

use std::sync::Arc;

use super::{
    provider::{OcrEngine, TesseractEngine},
    scoring::{select_best, LongestText, TextScorer},
    types::{OcrError, OcrResult, RecognitionConfig, DEFAULT_CONFIGS, DEFAULT_LANGUAGES},
};
use crate::pdf::PageRasterizer;
use crate::preprocess::{encode_png, ImagePreprocessor, UPSCALE_FACTOR};

/// OCR fallback configuration
#[derive(Debug, Clone)]
pub struct OcrFallbackConfig {
    /// Path to the tesseract executable
    pub tesseract_path: String,
    /// Recognition languages, `+`-separated
    pub languages: String,
    /// Rasterization resolution
    pub dpi: u32,
}

impl OcrFallbackConfig {
    /// Resolution of the page images after OCR upscaling
    pub fn image_dpi(&self) -> u32 {
        (self.dpi.max(1) as f32 * UPSCALE_FACTOR).round() as u32
    }
}

impl Default for OcrFallbackConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            languages: DEFAULT_LANGUAGES.to_string(),
            dpi: PageRasterizer::OCR_DPI,
        }
    }
}

/// Multi-configuration OCR over whole documents
pub struct OcrFallbackEngine {
    engine: Arc<dyn OcrEngine>,
    scorer: Arc<dyn TextScorer>,
    configs: Vec<RecognitionConfig>,
    languages: String,
    rasterizer: PageRasterizer,
    preprocessor: ImagePreprocessor,
}

impl OcrFallbackEngine {
    /// Tesseract-backed engine with the default configurations and scorer
    pub fn new(config: &OcrFallbackConfig) -> Self {
        let tesseract =
            TesseractEngine::new(&config.tesseract_path).with_dpi(config.image_dpi());
        Self::with_engine(Arc::new(tesseract), config)
    }

    pub fn with_engine(engine: Arc<dyn OcrEngine>, config: &OcrFallbackConfig) -> Self {
        Self {
            engine,
            scorer: Arc::new(LongestText),
            configs: DEFAULT_CONFIGS.to_vec(),
            languages: config.languages.clone(),
            rasterizer: PageRasterizer::new(config.dpi),
            preprocessor: ImagePreprocessor::new(),
        }
    }

    /// Replace the candidate scorer
    pub fn with_scorer(mut self, scorer: Arc<dyn TextScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub async fn is_available(&self) -> bool {
        self.engine.is_available().await
    }

    /// OCR a whole PDF
    pub async fn recognize(&self, pdf_bytes: Arc<Vec<u8>>) -> Result<OcrResult, OcrError> {
        let rasterizer = self.rasterizer;
        let preprocessor = self.preprocessor;

        let pages = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<u8>>, OcrError> {
            let images = rasterizer.rasterize(&pdf_bytes)?;
            images
                .iter()
                .enumerate()
                .map(|(index, image)| {
                    let enhanced = preprocessor.for_ocr(image);
                    encode_png(&enhanced).map_err(|e| {
                        OcrError::on_page(
                            index + 1,
                            OcrError::ProcessingError(format!("Failed to encode page: {}", e)),
                        )
                    })
                })
                .collect()
        })
        .await
        .map_err(|e| OcrError::ProcessingError(format!("Task join error: {}", e)))??;

        if pages.is_empty() {
            return Err(OcrError::NoPages);
        }

        tracing::info!(
            pages = pages.len(),
            engine = self.engine.name(),
            "Running OCR fallback"
        );

        self.recognize_images(&pages).await
    }

    /// OCR already-encoded page images, in order
    pub async fn recognize_images(&self, pages: &[Vec<u8>]) -> Result<OcrResult, OcrError> {
        let mut per_page_texts = Vec::with_capacity(pages.len());

        for (index, image) in pages.iter().enumerate() {
            let text = self
                .recognize_page(image)
                .await
                .map_err(|e| OcrError::on_page(index + 1, e))?;

            tracing::debug!(page = index + 1, chars = text.chars().count(), "OCR page done");
            per_page_texts.push(text);
        }

        Ok(OcrResult::from_pages(per_page_texts))
    }

    async fn recognize_page(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut candidates = Vec::with_capacity(self.configs.len());
        for config in &self.configs {
            let text = self.engine.recognize(image, config, &self.languages).await?;
            candidates.push(text.trim().to_string());
        }

        Ok(select_best(self.scorer.as_ref(), candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::provider::ScriptedEngine;
    use crate::pdf::fixtures::pdf_with_pages;

    fn engine_with(outputs: &[(&'static str, &str)]) -> OcrFallbackEngine {
        OcrFallbackEngine::with_engine(
            Arc::new(ScriptedEngine::new(outputs)),
            &OcrFallbackConfig::default(),
        )
    }

    #[test]
    fn test_image_dpi_follows_upscaling() {
        assert_eq!(OcrFallbackConfig::default().image_dpi(), 450);
        let low = OcrFallbackConfig {
            dpi: 36,
            ..OcrFallbackConfig::default()
        };
        assert_eq!(low.image_dpi(), 54);
    }

    #[tokio::test]
    async fn test_longest_candidate_wins() {
        let engine = engine_with(&[
            ("block", "NOME JOAO"),
            ("column", "NOME JOAO DA SILVA"),
            ("legacy-lstm", "NOME"),
            ("single-line", ""),
        ]);

        let result = engine.recognize_images(&[b"page".to_vec()]).await.unwrap();
        assert_eq!(result.per_page_texts, vec!["NOME JOAO DA SILVA"]);
    }

    #[tokio::test]
    async fn test_tie_keeps_configuration_order() {
        let engine = engine_with(&[
            ("block", "abc"),
            ("column", "xyz1"),
            ("legacy-lstm", "wxyz"),
            ("single-line", "q"),
        ]);

        let result = engine.recognize_images(&[b"page".to_vec()]).await.unwrap();
        assert_eq!(result.per_page_texts, vec!["xyz1"]);
    }

    #[tokio::test]
    async fn test_candidates_are_trimmed() {
        // Raw "   a   " is longer than "bc" only before trimming
        let engine = engine_with(&[("block", "   a   "), ("column", "bc\n")]);

        let result = engine.recognize_images(&[b"page".to_vec()]).await.unwrap();
        assert_eq!(result.per_page_texts, vec!["bc"]);
    }

    #[tokio::test]
    async fn test_full_text_joins_pages() {
        let engine = engine_with(&[("block", "RG 12.345.678-9")]);

        let pages = vec![b"one".to_vec(), b"two".to_vec()];
        let result = engine.recognize_images(&pages).await.unwrap();

        assert_eq!(result.page_count(), 2);
        assert_eq!(result.full_text, "RG 12.345.678-9\n\nRG 12.345.678-9");
        assert_eq!(
            result.full_text,
            result.per_page_texts.join("\n\n").trim().to_string()
        );
    }

    #[tokio::test]
    async fn test_failure_names_page() {
        let mut scripted = ScriptedEngine::new(&[("block", "text")]);
        // Four configurations per page; call 5 is the second page's second attempt
        scripted.fail_on_call = Some(5);
        let engine =
            OcrFallbackEngine::with_engine(Arc::new(scripted), &OcrFallbackConfig::default());

        let pages = vec![b"one".to_vec(), b"two".to_vec()];
        let err = engine.recognize_images(&pages).await.unwrap_err();
        assert!(matches!(err, OcrError::PageFailed { page: 2, .. }));
        assert!(matches!(err.root_cause(), OcrError::ProcessingError(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_stays_unavailable() {
        let config = OcrFallbackConfig {
            tesseract_path: "/nonexistent/tesseract-binary".to_string(),
            ..OcrFallbackConfig::default()
        };
        let engine = OcrFallbackEngine::new(&config);

        let err = engine
            .recognize_images(&[b"page".to_vec()])
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::PageFailed { page: 1, .. }));
        assert!(matches!(
            err.root_cause(),
            OcrError::ProviderNotAvailable(_)
        ));
    }

    #[tokio::test]
    async fn test_recognize_pdf_end_to_end() {
        let config = OcrFallbackConfig {
            dpi: 36,
            ..OcrFallbackConfig::default()
        };
        let engine = OcrFallbackEngine::with_engine(
            Arc::new(ScriptedEngine::new(&[("block", "CPF 123.456.789-00")])),
            &config,
        );

        let pdf = pdf_with_pages(&["", ""]);
        let result = engine.recognize(Arc::new(pdf)).await.unwrap();

        assert_eq!(result.page_count(), 2);
        assert!(result.full_text.starts_with("CPF 123.456.789-00"));
    }

    #[tokio::test]
    async fn test_recognize_rejects_non_pdf() {
        let engine = engine_with(&[]);
        let err = engine.recognize(Arc::new(b"plain".to_vec())).await.unwrap_err();
        assert!(matches!(err, OcrError::Rasterization(_)));
    }

    #[tokio::test]
    async fn test_recognize_zero_page_pdf() {
        let engine = engine_with(&[("block", "unused")]);
        let err = engine
            .recognize(Arc::new(pdf_with_pages(&[])))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::NoPages));
    }
}
