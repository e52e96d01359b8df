//! Structured field extraction
//!
//! Sends document text or page images to the extraction capability and
//! turns the reply into validated person records.

use std::sync::Arc;

use image::RgbImage;

use super::capability::ExtractionCapability;
use super::parser::parse_people;
use super::sanitize::sanitize_for_model;
use super::types::{ExtractionError, PersonFields};
use crate::pdf::PageRasterizer;
use crate::preprocess::{encode_jpeg, ImagePreprocessor};

/// Extracts people from identity documents through a language model
pub struct StructuredFieldExtractor {
    capability: Arc<dyn ExtractionCapability>,
    rasterizer: PageRasterizer,
    preprocessor: ImagePreprocessor,
}

impl StructuredFieldExtractor {
    pub fn new(capability: Arc<dyn ExtractionCapability>) -> Self {
        Self {
            capability,
            rasterizer: PageRasterizer::new(PageRasterizer::VISION_DPI),
            preprocessor: ImagePreprocessor::new(),
        }
    }

    pub fn capability_name(&self) -> &str {
        self.capability.name()
    }

    /// Every person found in `document_text`, in reply order
    pub async fn extract_from_text(
        &self,
        document_text: &str,
        api_key: Option<&str>,
    ) -> Result<Vec<PersonFields>, ExtractionError> {
        if document_text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput("document text is empty"));
        }
        let api_key = require_credential(api_key)?;

        let sanitized = sanitize_for_model(document_text);
        if sanitized.trim().is_empty() {
            return Err(ExtractionError::EmptyInput(
                "document text has no ASCII-representable content",
            ));
        }

        let reply = self
            .capability
            .extract_from_text(api_key, &sanitized)
            .await?;
        let people = parse_people(&reply)?;

        tracing::info!(people = people.len(), "Extracted people from text");
        Ok(people)
    }

    /// Only the first person in `document_text`
    pub async fn extract_first(
        &self,
        document_text: &str,
        api_key: Option<&str>,
    ) -> Result<PersonFields, ExtractionError> {
        self.extract_from_text(document_text, api_key)
            .await?
            .into_iter()
            .next()
            .ok_or(ExtractionError::NoPeople)
    }

    /// Every person visible on the rendered pages of a PDF
    pub async fn extract_from_pdf_images(
        &self,
        pdf_bytes: Arc<Vec<u8>>,
        api_key: Option<&str>,
    ) -> Result<Vec<PersonFields>, ExtractionError> {
        let rasterizer = self.rasterizer;
        let pages = tokio::task::spawn_blocking(move || rasterizer.rasterize(&pdf_bytes))
            .await
            .map_err(|e| ExtractionError::Image(format!("Task join error: {}", e)))?
            .map_err(|e| ExtractionError::Image(e.to_string()))?;

        self.extract_from_images(pages, api_key).await
    }

    /// Every person visible on the given page images
    pub async fn extract_from_images(
        &self,
        pages: Vec<RgbImage>,
        api_key: Option<&str>,
    ) -> Result<Vec<PersonFields>, ExtractionError> {
        if pages.is_empty() {
            return Err(ExtractionError::EmptyInput("no page images"));
        }
        let api_key = require_credential(api_key)?;

        let preprocessor = self.preprocessor;
        let jpegs = tokio::task::spawn_blocking(move || {
            pages
                .iter()
                .map(|page| encode_jpeg(&preprocessor.for_vision(page)))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| ExtractionError::Image(format!("Task join error: {}", e)))?
        .map_err(|e| ExtractionError::Image(e.to_string()))?;

        let reply = self
            .capability
            .extract_from_images(api_key, &jpegs)
            .await?;
        let people = parse_people(&reply)?;

        tracing::info!(
            pages = jpegs.len(),
            people = people.len(),
            "Extracted people from page images"
        );
        Ok(people)
    }
}

fn require_credential(api_key: Option<&str>) -> Result<&str, ExtractionError> {
    match api_key.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(ExtractionError::MissingCredential),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Capability returning a fixed reply and recording what it was sent
    struct CannedCapability {
        reply: Result<String, String>,
        seen_text: Mutex<Option<String>>,
        seen_pages: Mutex<usize>,
    }

    impl CannedCapability {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                seen_text: Mutex::new(None),
                seen_pages: Mutex::new(0),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                seen_text: Mutex::new(None),
                seen_pages: Mutex::new(0),
            })
        }

        fn respond(&self) -> Result<String, ExtractionError> {
            self.reply.clone().map_err(ExtractionError::Capability)
        }
    }

    #[async_trait]
    impl ExtractionCapability for CannedCapability {
        fn name(&self) -> &str {
            "canned"
        }

        async fn extract_from_text(
            &self,
            _api_key: &str,
            document_text: &str,
        ) -> Result<String, ExtractionError> {
            *self.seen_text.lock().unwrap() = Some(document_text.to_string());
            self.respond()
        }

        async fn extract_from_images(
            &self,
            _api_key: &str,
            jpeg_pages: &[Vec<u8>],
        ) -> Result<String, ExtractionError> {
            *self.seen_pages.lock().unwrap() = jpeg_pages.len();
            self.respond()
        }
    }

    const ONE_PERSON: &str = r#"{"pessoas": [{"nome": "JOAO", "cpf": "123.456.789-00"}]}"#;

    #[tokio::test]
    async fn test_extracts_people_and_sanitizes() {
        let capability = CannedCapability::replying(ONE_PERSON);
        let extractor = StructuredFieldExtractor::new(capability.clone());

        let people = extractor
            .extract_from_text("NOME: JOÃO", Some("sk-test"))
            .await
            .unwrap();

        assert_eq!(people.len(), 1);
        assert_eq!(people[0].cpf_number.as_deref(), Some("123.456.789-00"));
        assert!(people[0].warnings.is_empty());
        assert_eq!(
            capability.seen_text.lock().unwrap().as_deref(),
            Some("NOME: JOAO")
        );
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let extractor = StructuredFieldExtractor::new(CannedCapability::replying(ONE_PERSON));

        for key in [None, Some(""), Some("   ")] {
            let err = extractor.extract_from_text("text", key).await.unwrap_err();
            assert!(matches!(err, ExtractionError::MissingCredential));
        }
    }

    #[tokio::test]
    async fn test_empty_text() {
        let extractor = StructuredFieldExtractor::new(CannedCapability::replying(ONE_PERSON));
        let err = extractor
            .extract_from_text(" \n\t", Some("sk-test"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyInput(_)));
    }

    #[tokio::test]
    async fn test_capability_failure_propagates() {
        let extractor = StructuredFieldExtractor::new(CannedCapability::failing("quota"));
        let err = extractor
            .extract_from_text("text", Some("sk-test"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Capability(ref m) if m == "quota"));
    }

    #[tokio::test]
    async fn test_extract_first() {
        let extractor = StructuredFieldExtractor::new(CannedCapability::replying(
            r#"{"pessoas": [{"nome": "A"}, {"nome": "B"}]}"#,
        ));
        let first = extractor.extract_first("text", Some("k")).await.unwrap();
        assert_eq!(first.full_name.as_deref(), Some("A"));

        let none = StructuredFieldExtractor::new(CannedCapability::replying(r#"{"pessoas": []}"#));
        let err = none.extract_first("text", Some("k")).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoPeople));
    }

    #[tokio::test]
    async fn test_images_are_sent_as_jpegs() {
        let capability = CannedCapability::replying(
            r#"{"documentos": [{"nome_completo": "ANA", "filiacao": ["PAI", "MAE"]}]}"#,
        );
        let extractor = StructuredFieldExtractor::new(capability.clone());

        let pages = vec![RgbImage::from_pixel(20, 20, image::Rgb([240, 240, 240])); 2];
        let people = extractor
            .extract_from_images(pages, Some("k"))
            .await
            .unwrap();

        assert_eq!(*capability.seen_pages.lock().unwrap(), 2);
        assert_eq!(people[0].full_name.as_deref(), Some("ANA"));
        assert_eq!(people[0].filiation, vec!["PAI", "MAE"]);
    }

    #[tokio::test]
    async fn test_no_images() {
        let extractor = StructuredFieldExtractor::new(CannedCapability::replying(ONE_PERSON));
        let err = extractor
            .extract_from_images(Vec::new(), Some("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyInput(_)));
    }
}
