//! Document extraction API endpoints
//!
//! - `POST /` upload a PDF and extract the people it identifies
//! - `GET /` list every record of the current session
//! - `DELETE /` start a new session, clearing the store

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::pipeline::{ExtractionMode, PipelineOutcome, Upload};
use crate::state::AppState;
use crate::store::{DocumentRecord, Session};

/// Records of the current session
#[derive(Serialize)]
pub struct RecordListResponse {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub records: Vec<DocumentRecord>,
}

/// Response for a session reset
#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_records).post(upload_document).delete(new_session),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Fields read from the upload form
#[derive(Default)]
struct UploadForm {
    file_name: Option<String>,
    bytes: Option<Vec<u8>>,
    mode: Option<String>,
    api_key: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" | "document" => {
                form.file_name = Some(
                    field
                        .file_name()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "document.pdf".to_string()),
                );
                let data = field.bytes().await?;
                tracing::debug!("Read {} bytes of file data", data.len());
                form.bytes = Some(data.to_vec());
            }
            "mode" => form.mode = Some(field.text().await?),
            "api_key" => form.api_key = Some(field.text().await?),
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(form)
}

/// Upload a PDF and run the extraction pipeline on it
async fn upload_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PipelineOutcome>> {
    let form = read_form(multipart).await?;

    let bytes = form
        .bytes
        .ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;
    let mode: ExtractionMode = form
        .mode
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(AppError::BadRequest)?;

    // A key sent with the upload wins over the server-side one
    let api_key = form
        .api_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| state.config().openai.api_key.clone());

    let upload = Upload {
        file_name: form.file_name.unwrap_or_else(|| "document.pdf".to_string()),
        bytes: Arc::new(bytes),
        mode,
        api_key,
    };

    let session = state.session().lock().await;
    let outcome = state.pipeline().run(session.store(), upload).await?;

    Ok(Json(outcome))
}

/// List every record stored during the current session
async fn list_records(State(state): State<AppState>) -> Json<RecordListResponse> {
    let session = state.session().lock().await;
    let records = session.store().load().await;

    Json(RecordListResponse {
        session_id: session.id(),
        started_at: session.started_at(),
        total: records.len(),
        records,
    })
}

/// Replace the current session with a fresh one
async fn new_session(State(state): State<AppState>) -> Result<Json<SessionResponse>> {
    let mut session = state.session().lock().await;
    *session = Session::begin(session.store().clone()).await?;

    Ok(Json(SessionResponse {
        session_id: session.id(),
        started_at: session.started_at(),
    }))
}
