//! Error types for the ID scan server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::ocr::OcrError;
use crate::pdf::PdfExtractionError;
use crate::pipeline::PipelineError;
use crate::store::StoreError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Multipart(e) => {
                let status = e.status();
                let error_type = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "payload_too_large"
                } else {
                    "bad_request"
                };
                (status, error_type, e.body_text())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal("internal_error", "An internal error occurred")
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                internal("store_error", "Failed to persist records")
            }
            AppError::Pipeline(PipelineError::Store(e)) => {
                tracing::error!("Store error: {}", e);
                internal("store_error", "Failed to persist records")
            }
            AppError::Pipeline(PipelineError::Pdf(e)) => match e {
                PdfExtractionError::Task(msg) => {
                    tracing::error!("PDF task error: {}", msg);
                    internal("internal_error", "An internal error occurred")
                }
                _ => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_pdf", e.to_string()),
            },
            AppError::Pipeline(PipelineError::Ocr(e)) => match e.root_cause() {
                OcrError::ProviderNotAvailable(_) => {
                    tracing::error!("OCR engine unavailable: {}", e);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "ocr_unavailable",
                        "OCR engine is not available".to_string(),
                    )
                }
                OcrError::ProcessingError(_) | OcrError::InvalidLanguage(_) => {
                    tracing::error!("OCR error: {}", e);
                    internal("ocr_error", "OCR processing failed")
                }
                _ => (StatusCode::UNPROCESSABLE_ENTITY, "ocr_failed", e.to_string()),
            },
            AppError::Pipeline(PipelineError::Extraction(e)) => match e {
                ExtractionError::MissingCredential => {
                    (StatusCode::UNAUTHORIZED, "missing_credential", e.to_string())
                }
                ExtractionError::EmptyInput(_) | ExtractionError::NoPeople => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "nothing_extracted", e.to_string())
                }
                ExtractionError::Capability(_) => {
                    tracing::error!("Extraction service error: {}", e);
                    (
                        StatusCode::BAD_GATEWAY,
                        "extraction_service_error",
                        "The extraction service call failed".to_string(),
                    )
                }
                ExtractionError::InvalidJson(_) | ExtractionError::MalformedResponse(_) => {
                    tracing::error!("Bad extraction response: {}", e);
                    (
                        StatusCode::BAD_GATEWAY,
                        "invalid_extraction_response",
                        e.to_string(),
                    )
                }
                ExtractionError::Image(_) => {
                    tracing::error!("Image preparation error: {}", e);
                    internal("image_error", "Failed to prepare page images")
                }
            },
        }
    }
}

fn internal(error_type: &'static str, message: &str) -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_type,
        message.to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.classify();

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
