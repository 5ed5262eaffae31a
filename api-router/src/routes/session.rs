use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, session_id::SessionId};

/// Clears the caller's session, removing the stored contract artifact.
pub async fn reset_session(
    State(state): State<ApiState>,
    session: SessionId,
) -> impl IntoResponse {
    state.sessions.clear(&session.0).await;
    info!(session = %session.0, "session reset");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, session.cookie())],
        Json(json!({ "success": true })),
    )
}
