use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use case_retrieval::CaseRetriever;
use common::error::AppError;
use ingestion_pipeline::ToxicClauseExtractor;

use super::{query_argument, AgentTool, ToolContext};

const FORMATTED_CASE_LIMIT: usize = 3;

/// Precedent search: embeds the query, retrieves the closest precedents and
/// formats each for the client.
pub struct FindCaseTool {
    retriever: Arc<CaseRetriever>,
    extractor: Arc<ToxicClauseExtractor>,
}

impl FindCaseTool {
    pub fn new(retriever: Arc<CaseRetriever>, extractor: Arc<ToxicClauseExtractor>) -> Self {
        Self {
            retriever,
            extractor,
        }
    }
}

#[async_trait]
impl AgentTool for FindCaseTool {
    fn name(&self) -> &'static str {
        "find_case_tool"
    }

    fn description(&self) -> &str {
        "특정 법적 상황에 대한 판례, 판결, 법원 결정을 검색하여 정리된 형태로 반환합니다."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "판례를 찾고자 하는 법적 상황에 대한 질문"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, args: &Value, _ctx: &ToolContext) -> Result<Value, AppError> {
        let query = query_argument(args, "판례 검색");

        let embedding = self.retriever.embed(&query).await?;
        let matches = self
            .retriever
            .top_cases(&embedding, FORMATTED_CASE_LIMIT)
            .await?;

        if matches.is_empty() {
            return Err(AppError::NotFound("관련 판례를 찾지 못했습니다.".into()));
        }

        let mut formatted_cases = Vec::with_capacity(matches.len());
        for matched in matches {
            formatted_cases.push(self.extractor.format_case(&matched.case_text).await);
        }

        Ok(json!({ "formatted_cases": formatted_cases }))
    }
}
