use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use common::error::AppError;
use ingestion_pipeline::{DocumentParser, DocumentSource, ToxicClauseExtractor};

use super::{AgentTool, ToolContext};

/// Full toxic-clause analysis over the session's uploaded contract: parse,
/// extract, and attach a precedent to every clause.
pub struct FindToxicClausesTool {
    parser: DocumentParser,
    extractor: Arc<ToxicClauseExtractor>,
}

impl FindToxicClausesTool {
    pub fn new(parser: DocumentParser, extractor: Arc<ToxicClauseExtractor>) -> Self {
        Self { parser, extractor }
    }
}

#[async_trait]
impl AgentTool for FindToxicClausesTool {
    fn name(&self) -> &'static str {
        "find_toxic_clauses_tool"
    }

    fn description(&self) -> &str {
        "계약서 내의 독소조항들을 찾아 반환합니다. 사용자가 계약서에서 독소조항, 불공정한 조항, \
         일방적인 조항, 또는 위험 조항을 찾아달라고 요청할 때 사용하세요."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "독소조항 분석에 대한 사용자 질문"
                }
            },
            "required": ["query"]
        })
    }

    fn requires_file(&self) -> bool {
        true
    }

    async fn invoke(&self, _args: &Value, ctx: &ToolContext) -> Result<Value, AppError> {
        let path = ctx.file_path.as_ref().ok_or_else(|| {
            AppError::Validation("계약서 파일이 없습니다. 파일을 먼저 업로드해주세요.".into())
        })?;

        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let document = DocumentSource {
            bytes: bytes.into(),
            filename,
        };

        let text = self
            .parser
            .parse(document.bytes.clone(), &document.filename)
            .await?;
        if text.is_empty() {
            return Err(AppError::Processing(
                "문서에서 텍스트를 추출할 수 없습니다.".into(),
            ));
        }

        let clauses = self.extractor.find(&text).await?;
        if clauses.is_empty() {
            return Ok(json!([{ "message": "독소조항을 찾을 수 없습니다." }]));
        }

        info!(count = clauses.len(), "toxic clauses returned to agent");
        Ok(serde_json::to_value(clauses)?)
    }
}
