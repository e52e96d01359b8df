//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use idscan_server::extraction::{ExtractionCapability, ExtractionError, StructuredFieldExtractor};
use idscan_server::ocr::{OcrEngine, OcrError, OcrFallbackConfig, OcrFallbackEngine, RecognitionConfig};
use idscan_server::pipeline::ExtractionPipeline;

pub use idscan_server::pdf::fixtures::pdf_with_pages;

/// Capability that answers every request with the same reply
pub struct FixedCapability {
    reply: String,
    pub last_text: Mutex<Option<String>>,
    pub image_calls: AtomicUsize,
}

impl FixedCapability {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            last_text: Mutex::new(None),
            image_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ExtractionCapability for FixedCapability {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn extract_from_text(
        &self,
        _api_key: &str,
        document_text: &str,
    ) -> Result<String, ExtractionError> {
        *self.last_text.lock().unwrap() = Some(document_text.to_string());
        Ok(self.reply.clone())
    }

    async fn extract_from_images(
        &self,
        _api_key: &str,
        _jpeg_pages: &[Vec<u8>],
    ) -> Result<String, ExtractionError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// OCR engine that reads the same text off every page
pub struct FixedOcr {
    pub text: String,
    pub calls: AtomicUsize,
}

impl FixedOcr {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl OcrEngine for FixedOcr {
    fn name(&self) -> &str {
        "fixed-ocr"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(
        &self,
        _image_data: &[u8],
        _config: &RecognitionConfig,
        _languages: &str,
    ) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// OCR engine whose executable cannot be started
pub struct UnavailableOcr;

#[async_trait]
impl OcrEngine for UnavailableOcr {
    fn name(&self) -> &str {
        "unavailable-ocr"
    }

    async fn is_available(&self) -> bool {
        false
    }

    async fn recognize(
        &self,
        _image_data: &[u8],
        _config: &RecognitionConfig,
        _languages: &str,
    ) -> Result<String, OcrError> {
        Err(OcrError::ProviderNotAvailable(
            "Failed to spawn /opt/ocr/bin/tesseract: No such file or directory".to_string(),
        ))
    }
}

pub fn pipeline(ocr: Arc<FixedOcr>, capability: Arc<FixedCapability>) -> ExtractionPipeline {
    pipeline_with_engine(ocr, capability)
}

pub fn pipeline_with_engine(
    ocr: Arc<dyn OcrEngine>,
    capability: Arc<FixedCapability>,
) -> ExtractionPipeline {
    let config = OcrFallbackConfig {
        // Low resolution keeps rasterization fast
        dpi: 36,
        ..OcrFallbackConfig::default()
    };
    ExtractionPipeline::new(
        OcrFallbackEngine::with_engine(ocr, &config),
        StructuredFieldExtractor::new(capability),
    )
}

pub const ID_CARD_TEXT: &str = "REPUBLICA FEDERATIVA DO BRASIL\n\
CARTEIRA DE IDENTIDADE\n\
NOME: JOAO DA SILVA\n\
DATA DE NASCIMENTO: 01/01/1990\n\
CPF: 123.456.789-00\n\
RG: 12.345.678-9 SSP/SP";
