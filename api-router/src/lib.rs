use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::post,
    Router,
};
use routes::{
    query::user_query,
    session::reset_session,
    upload::{upload_contract, upload_pdf},
};

pub mod api_state;
pub mod error;
mod session_id;
mod routes;

const UPLOAD_BODY_LIMIT: usize = 10_000_000;

/// Router for the contract-analysis API.
pub fn api_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route(
            "/api/pdf/upload",
            post(upload_pdf).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/user-query", post(user_query))
        .route(
            "/upload",
            post(upload_contract).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/reset", post(reset_session))
}
