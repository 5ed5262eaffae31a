use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use agent_pipeline::{AgentOrchestrator, ToolRegistry};
use case_retrieval::CaseRetriever;
use common::{
    session::SessionStore,
    storage::store::{testing::test_config_memory, StorageManager},
    utils::{config::AppConfig, llm::LlmClient, prompts::SummaryPromptFile},
};
use ingestion_pipeline::{
    DefaultPipelineServices, DocumentParser, IngestionPipeline, Summarizer, ToxicClauseExtractor,
};

use crate::{api_routes, api_state::ApiState};

/// Builds the full router over in-memory storage and fixture prompts. No
/// LLM or corpus call happens on the routes exercised here.
async fn test_app(uploads_dir: &std::path::Path) -> Router {
    let config = AppConfig {
        uploads_dir: uploads_dir.display().to_string(),
        ..test_config_memory()
    };

    let llm = LlmClient::new(&config);
    let retriever = Arc::new(CaseRetriever::new(
        llm.clone(),
        PathBuf::from(&config.case_db_path),
        PathBuf::from(&config.embedding_archive_path),
    ));
    let parser = DocumentParser::new(&config);
    let summarizer = Summarizer::new(
        llm.clone(),
        SummaryPromptFile {
            message: "Summarize: {content}".into(),
            prefix: "Use the fixed keys.".into(),
        },
        1,
    );
    let extractor = Arc::new(ToxicClauseExtractor::new(
        llm.clone(),
        retriever,
        "highlight prompt".into(),
        "format prompt".into(),
    ));

    let ingestion = Arc::new(IngestionPipeline::with_services(Arc::new(
        DefaultPipelineServices::new(parser, summarizer, extractor),
    )));

    let orchestrator = Arc::new(AgentOrchestrator::new(
        llm,
        ToolRegistry::new(Vec::new()),
        "format prompt".into(),
    ));

    let state = ApiState::new(
        config.clone(),
        StorageManager::new(&config).await.expect("storage"),
        SessionStore::new(),
        ingestion,
        orchestrator,
    );

    api_routes::<ApiState>().with_state(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn reset_clears_session_and_sets_cookie() {
    let uploads = tempfile::tempdir().expect("temp dir");
    let app = test_app(uploads.path()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/reset")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn missing_query_is_a_bad_request_envelope() {
    let uploads = tempfile::tempdir().expect("temp dir");
    let app = test_app(uploads.path()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user-query")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["type"], "simple_dialogue");
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn simulation_query_without_file_asks_for_upload() {
    let uploads = tempfile::tempdir().expect("temp dir");
    let app = test_app(uploads.path()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user-query")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"query": "계약 해지 시뮬레이션"}"#))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["type"], "simple_dialogue");
    assert_eq!(body["status"], "error");
    assert!(body["response"]
        .as_str()
        .expect("response text")
        .contains("업로드"));
}

#[tokio::test]
async fn form_queries_are_accepted() {
    let uploads = tempfile::tempdir().expect("temp dir");
    let app = test_app(uploads.path()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user-query")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "query=%EA%B3%84%EC%95%BD%20%ED%95%B4%EC%A7%80",
                ))
                .expect("request"),
        )
        .await
        .expect("response");

    // "계약 해지" with no session file takes the upload-request branch.
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["type"], "simple_dialogue");
    assert_eq!(body["status"], "error");
}
