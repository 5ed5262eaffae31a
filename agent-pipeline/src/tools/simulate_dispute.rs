use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use common::error::AppError;
use ingestion_pipeline::DocumentSource;

use super::{query_argument, AgentTool, ToolContext};
use crate::simulator::DisputeSimulator;

/// Runs the dispute-simulation sub-pipeline over the session's contract.
pub struct SimulateDisputeTool {
    simulator: Arc<DisputeSimulator>,
}

impl SimulateDisputeTool {
    pub fn new(simulator: Arc<DisputeSimulator>) -> Self {
        Self { simulator }
    }
}

#[async_trait]
impl AgentTool for SimulateDisputeTool {
    fn name(&self) -> &'static str {
        "simulate_dispute_tool"
    }

    fn description(&self) -> &str {
        "유저 쿼리와 계약 문서에 기반하여 계약 분쟁 시뮬레이션을 실행합니다."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "계약 분쟁 시뮬레이션에 대한 사용자 질문"
                }
            },
            "required": ["query"]
        })
    }

    fn requires_file(&self) -> bool {
        true
    }

    async fn invoke(&self, args: &Value, ctx: &ToolContext) -> Result<Value, AppError> {
        let path = ctx.file_path.as_ref().ok_or_else(|| {
            AppError::Validation(
                "계약서 파일이 제공되지 않았습니다. 파일을 업로드하세요.".into(),
            )
        })?;
        let query = query_argument(args, "계약서 시뮬레이션");

        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());

        info!(query = %query, "running dispute simulation");
        let outcome = self
            .simulator
            .run(
                &query,
                DocumentSource {
                    bytes: bytes.into(),
                    filename,
                },
            )
            .await?;

        Ok(json!({ "simulations": outcome.simulations }))
    }
}
