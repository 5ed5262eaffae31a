use std::path::PathBuf;

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use serde::Deserialize;
use tracing::info;

use agent_pipeline::QueryResponse;

use crate::{api_state::ApiState, session_id::SessionId};

#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    query: Option<String>,
}

/// Follow-up query endpoint. Accepts JSON `{query}` or a `query` form
/// field; every outcome is one of the three canonical envelopes.
pub async fn user_query(
    State(state): State<ApiState>,
    session: SessionId,
    request: Request,
) -> impl IntoResponse {
    let query = extract_query(request).await;

    let Some(query) = query.filter(|query| !query.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            [(header::SET_COOKIE, session.cookie())],
            Json(QueryResponse::error_dialogue(
                "쿼리가 제공되지 않았습니다.",
                "Query not provided",
            )),
        );
    };

    let pdf_path = resolve_session_file(&state, &session).await;
    info!(query = %query, has_file = pdf_path.is_some(), "user query received");

    let response = state
        .orchestrator
        .process_query(&query, pdf_path.as_deref())
        .await;

    (
        StatusCode::OK,
        [(header::SET_COOKIE, session.cookie())],
        Json(response),
    )
}

async fn extract_query(request: Request) -> Option<String> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        Json::<QueryRequest>::from_request(request, &())
            .await
            .ok()
            .and_then(|Json(body)| body.query)
    } else {
        Form::<QueryRequest>::from_request(request, &())
            .await
            .ok()
            .and_then(|Form(body)| body.query)
    }
}

/// The session's contract path, only when the artifact is still on disk.
async fn resolve_session_file(state: &ApiState, session: &SessionId) -> Option<PathBuf> {
    let stored = state.sessions.get(&session.0).await?.pdf_file_path?;
    let path = PathBuf::from(stored);
    tokio::fs::metadata(&path).await.ok().map(|_| path)
}
