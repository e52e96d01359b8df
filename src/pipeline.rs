//! Extraction pipeline
//!
//! One upload, end to end: native text first, OCR when the PDF looks
//! scanned, field extraction, then persistence. Records are appended only
//! once the full person list is known.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extraction::{ExtractionError, StructuredFieldExtractor};
use crate::ocr::{OcrError, OcrFallbackEngine};
use crate::pdf::{NativeTextExtractor, PdfExtractionError};
use crate::store::{build_records, DocumentRecord, DocumentStore, StoreError};

/// How fields are extracted from the document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Native text, OCR fallback, then text extraction
    #[default]
    Text,
    /// Page images sent straight to the vision model
    Vision,
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" => Ok(Self::Text),
            "vision" => Ok(Self::Vision),
            other => Err(format!("unknown extraction mode '{}'", other)),
        }
    }
}

/// Where the text handed to the extractor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Native,
    Ocr,
    Vision,
}

/// Pipeline errors, one variant per stage
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Pdf(#[from] PdfExtractionError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One uploaded document
#[derive(Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Arc<Vec<u8>>,
    pub mode: ExtractionMode,
    /// Never persisted or logged
    pub api_key: Option<String>,
}

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub file_name: String,
    pub source: TextSource,
    pub is_probably_scanned: bool,
    pub page_count: usize,
    pub records: Vec<DocumentRecord>,
}

/// Text acquisition, extraction and persistence for uploads
pub struct ExtractionPipeline {
    native: NativeTextExtractor,
    ocr: OcrFallbackEngine,
    extractor: StructuredFieldExtractor,
}

impl ExtractionPipeline {
    pub fn new(ocr: OcrFallbackEngine, extractor: StructuredFieldExtractor) -> Self {
        Self {
            native: NativeTextExtractor::new(),
            ocr,
            extractor,
        }
    }

    pub fn ocr(&self) -> &OcrFallbackEngine {
        &self.ocr
    }

    pub fn extractor(&self) -> &StructuredFieldExtractor {
        &self.extractor
    }

    /// Run one upload and append its records to `store`
    pub async fn run(
        &self,
        store: &DocumentStore,
        upload: Upload,
    ) -> Result<PipelineOutcome, PipelineError> {
        let api_key = upload.api_key.as_deref();
        let native = self.native.extract_blocking(upload.bytes.clone()).await?;

        tracing::info!(
            file = %upload.file_name,
            mode = ?upload.mode,
            pages = native.page_count,
            scanned = native.is_probably_scanned,
            "Processing document"
        );

        let (source, people) = match upload.mode {
            ExtractionMode::Vision => {
                let people = self
                    .extractor
                    .extract_from_pdf_images(upload.bytes.clone(), api_key)
                    .await?;
                (TextSource::Vision, people)
            }
            ExtractionMode::Text => {
                let (source, text) =
                    if native.is_probably_scanned || native.full_text.trim().is_empty() {
                        let ocr = self.ocr.recognize(upload.bytes.clone()).await?;
                        (TextSource::Ocr, ocr.full_text)
                    } else {
                        (TextSource::Native, native.full_text)
                    };

                tracing::debug!(source = ?source, chars = text.chars().count(), "Text acquired");
                let people = self.extractor.extract_from_text(&text, api_key).await?;
                (source, people)
            }
        };

        let records = build_records(&people, &upload.file_name, native.is_probably_scanned);
        store.append(&records).await?;

        tracing::info!(
            file = %upload.file_name,
            records = records.len(),
            "Document processed"
        );

        Ok(PipelineOutcome {
            file_name: upload.file_name,
            source,
            is_probably_scanned: native.is_probably_scanned,
            page_count: native.page_count,
            records,
        })
    }
}
