use std::path::PathBuf;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

use common::error::AppError;
use ingestion_pipeline::{DocumentSource, Summary, ToxicClause};

use crate::{api_state::ApiState, error::ApiError, session_id::SessionId};

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    #[form_data(limit = "10000000")]
    pub file: FieldData<NamedTempFile>,
}

/// Field order mirrors the upload contract; `summary` may be the structured
/// map or the degraded sentinel string.
#[derive(Debug, Serialize)]
struct UploadResponse {
    status: String,
    message: String,
    filename: String,
    file_url: String,
    pdf_id: String,
    summary: Summary,
    highlight: Vec<ToxicClause>,
}

/// Full ingestion endpoint: store the blob, refresh the session artifact,
/// then run parse → summarize → extract.
pub async fn upload_pdf(
    State(state): State<ApiState>,
    session: SessionId,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (filename, bytes) = read_pdf_upload(&input.file).await?;
    info!(filename = %filename, bytes = bytes.len(), "upload received");

    let upload_id = state.storage.next_upload_id();
    let blob_location = format!("pdf/{upload_id}");
    state
        .storage
        .put(&blob_location, bytes.clone())
        .await
        .map_err(AppError::from)?;
    let file_url = state.file_url(&blob_location);

    store_session_artifact(&state, &session, &filename, &bytes).await?;

    let output = state
        .ingestion
        .process(DocumentSource {
            bytes,
            filename: filename.clone(),
        })
        .await?;

    let response = UploadResponse {
        status: "success".to_string(),
        message: "Successfully uploaded file".to_string(),
        filename,
        file_url,
        pdf_id: format!("PDF_{upload_id}"),
        summary: output.summary,
        highlight: output.highlights,
    };

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session.cookie())],
        Json(response),
    ))
}

/// Session-only upload: saves the artifact for later queries without
/// running the ingestion pipeline.
pub async fn upload_contract(
    State(state): State<ApiState>,
    session: SessionId,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (filename, bytes) = read_pdf_upload(&input.file).await?;

    store_session_artifact(&state, &session, &filename, &bytes).await?;
    info!(filename = %filename, "contract stored in session");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session.cookie())],
        Json(json!({ "success": true, "filename": filename })),
    ))
}

async fn read_pdf_upload(file: &FieldData<NamedTempFile>) -> Result<(String, Bytes), ApiError> {
    let filename = file
        .metadata
        .file_name
        .clone()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::ValidationError("선택된 파일이 없습니다.".to_string()))?;

    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::ValidationError(
            "PDF 파일만 업로드 가능합니다.".to_string(),
        ));
    }

    let bytes = tokio::fs::read(file.contents.path())
        .await
        .map_err(AppError::from)?;
    if bytes.is_empty() {
        return Err(ApiError::ValidationError("빈 파일이 전송되었습니다.".to_string()));
    }

    Ok((filename, Bytes::from(bytes)))
}

/// Writes `<uuid>.pdf` under the uploads directory and commits it to the
/// session, purging the previous artifact.
async fn store_session_artifact(
    state: &ApiState,
    session: &SessionId,
    filename: &str,
    bytes: &Bytes,
) -> Result<PathBuf, ApiError> {
    let uploads_dir = PathBuf::from(&state.config.uploads_dir);
    tokio::fs::create_dir_all(&uploads_dir)
        .await
        .map_err(AppError::from)?;

    let artifact_path = uploads_dir.join(format!("{}.pdf", Uuid::new_v4()));
    tokio::fs::write(&artifact_path, bytes)
        .await
        .map_err(AppError::from)?;

    state
        .sessions
        .record_upload(
            &session.0,
            artifact_path.display().to_string(),
            filename.to_string(),
        )
        .await;

    Ok(artifact_path)
}
