//! Application state management

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::extraction::{OpenAiCapability, StructuredFieldExtractor};
use crate::ocr::OcrFallbackEngine;
use crate::pipeline::ExtractionPipeline;
use crate::store::{DocumentStore, Session, StoreError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pipeline: ExtractionPipeline,
    /// Held for the whole pipeline run, so uploads are processed one at a time
    session: Mutex<Session>,
}

impl AppState {
    /// Build the production pipeline and begin the first session
    pub async fn new(config: Config) -> Result<Self, StoreError> {
        let ocr = OcrFallbackEngine::new(&config.ocr);
        if !ocr.is_available().await {
            tracing::warn!(
                path = %config.ocr.tesseract_path,
                "Tesseract not found; scanned PDFs will fail until it is installed"
            );
        }

        let capability = Arc::new(OpenAiCapability::new(config.openai.client.clone()));
        let pipeline = ExtractionPipeline::new(ocr, StructuredFieldExtractor::new(capability));

        Self::with_pipeline(config, pipeline).await
    }

    /// State around an already-built pipeline
    pub async fn with_pipeline(
        config: Config,
        pipeline: ExtractionPipeline,
    ) -> Result<Self, StoreError> {
        let session = Session::begin(DocumentStore::new(&config.store.path)).await?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                session: Mutex::new(session),
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.inner.pipeline
    }

    pub fn session(&self) -> &Mutex<Session> {
        &self.inner.session
    }
}
