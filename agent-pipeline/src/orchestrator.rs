use std::path::Path;

use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use serde_json::{json, Value};
use tracing::{error, info};

use common::{error::AppError, utils::llm::LlmClient};

use crate::{
    envelope::QueryResponse,
    messages::{AgentMessage, ToolCallRecord},
    processors::extract_response,
    tools::{ToolContext, ToolRegistry},
};

const ROUTER_TEMPERATURE: f32 = 0.1;
const FORMATTER_TEMPERATURE: f32 = 0.1;

/// Queries with these markers need the session contract; without one the
/// router is never consulted and the user is asked to upload.
const SIMULATION_KEYWORDS: [&str; 3] = ["계약", "시뮬레이션", "해지"];

const TOOL_SELECTION_PROMPT: &str = "당신은 금융계약서를 분석하는 법률 도우미 AI입니다. \
사용자의 질문을 분석하여 최적의 도구를 선택해 응답해야 합니다.

사용 가능한 도구:
{tool_list}

도구 선택 가이드라인:
1. 계약서 독소조항 분석 (find_toxic_clauses_tool)
   - 사용 시점: 사용자가 계약서에서 독소조항, 불공정 조항, 불리한 조항, 위험 조항 등을 찾아달라고 요청할 때 사용
   - 예시 질문: \"이 계약서에 독소조항이 있나요?\", \"불리한 조건이 있는지 알려주세요\"

2. 계약 분쟁 시뮬레이션 (simulate_dispute_tool)
   - 사용 시점: 사용자가 계약 해지, 위반, 불이행 상황에서 어떤 결과가 나올지 묻거나 분쟁 해결을 원할 때 사용
   - 예시 질문: \"계약을 해지하면 어떻게 되나요?\", \"위약금이 발생할까요?\"

3. 판례 검색 (find_case_tool)
   - 사용 시점: 사용자가 특정 법적 상황에 대한 판례, 판결, 법원 결정 등을 찾고자 할 때 사용
   - 예시 질문: \"이와 유사한 판례가 있나요?\", \"법원은 이런 경우 어떻게 판결했나요?\"

4. 웹 검색 (web_search_tool)
   - 사용 시점: 다른 도구로 응답할 수 없는 일반적인 정보나 최신 정보가 필요할 때만 사용
   - 예시 질문: \"최근 금융법 개정 내용이 뭔가요?\"

주의사항:
1. 파일이 필요한 도구: simulate_dispute_tool과 find_toxic_clauses_tool은 계약서 파일이 반드시 필요합니다. \
파일이 업로드된 경우에만 이 도구를 사용하세요.
2. 명확한 경우에만 도구를 호출하세요. 도구 호출이 필요하지 않다면 직접 응답하세요.
3. 사용자의 의도를 명확히 파악한 후 적절한 도구를 선택하세요.

도구를 사용할 때는 반드시 필요한 인자(args)를 정확히 전달해야 합니다.";

const FILE_ATTACHED_CONTEXT: &str =
    "사용자가 계약서 파일을 업로드했습니다. 필요한 경우 계약서 분석 도구를 사용하세요.";
const FILE_MISSING_CONTEXT: &str = "사용자가 아직 계약서 파일을 업로드하지 않았습니다. \
     계약서 분석이 필요한 경우, 파일 업로드를 요청하세요.";

const UPLOAD_REQUIRED_RESPONSE: &str = "계약서 분석을 위해서는 먼저 PDF 파일을 업로드해 주세요.";

/// LLM-driven router over the tool set, plus the formatter pass and the
/// final envelope shaping.
pub struct AgentOrchestrator {
    llm: LlmClient,
    registry: ToolRegistry,
    format_prompt: String,
}

impl AgentOrchestrator {
    pub fn new(llm: LlmClient, registry: ToolRegistry, format_prompt: String) -> Self {
        Self {
            llm,
            registry,
            format_prompt,
        }
    }

    /// Processes one user query against the session's contract file, if any.
    /// Every failure terminates in a structured envelope.
    #[tracing::instrument(skip_all, fields(query = %query, has_file = pdf_path.is_some()))]
    pub async fn process_query(&self, query: &str, pdf_path: Option<&Path>) -> QueryResponse {
        let simulation_intent = SIMULATION_KEYWORDS
            .iter()
            .any(|keyword| query.contains(keyword));
        if simulation_intent && pdf_path.is_none() {
            return QueryResponse::error_dialogue(
                UPLOAD_REQUIRED_RESPONSE,
                "PDF file required for contract analysis",
            );
        }

        match self.drive(query, pdf_path).await {
            Ok(trail) => extract_response(&trail),
            Err(err) => {
                error!(error = %err, "agent execution failed");
                QueryResponse::error_dialogue(format!("시스템 오류: {err}"), err.to_string())
            }
        }
    }

    async fn drive(
        &self,
        query: &str,
        pdf_path: Option<&Path>,
    ) -> Result<Vec<AgentMessage>, AppError> {
        let mut trail = Vec::new();

        let router_reply = self.route(query, pdf_path.is_some()).await?;
        let ran_tools = !router_reply.tool_calls.is_empty();
        trail.push(AgentMessage::Assistant {
            content: router_reply.content,
            tool_calls: router_reply.tool_calls.clone(),
        });

        let ctx = ToolContext {
            file_path: pdf_path.map(Path::to_path_buf),
        };
        for call in &router_reply.tool_calls {
            if let Some(output) = self
                .registry
                .dispatch(&call.name, &call.arguments, &ctx)
                .await
            {
                trail.push(AgentMessage::tool(call.name.clone(), output));
            }
        }

        if ran_tools {
            self.format_latest_tool_output(&mut trail).await;
        }

        Ok(trail)
    }

    /// The router call: tool-calling enabled, deterministic temperature.
    async fn route(&self, query: &str, has_file: bool) -> Result<RouterReply, AppError> {
        let file_context = if has_file {
            FILE_ATTACHED_CONTEXT
        } else {
            FILE_MISSING_CONTEXT
        };
        let system = format!(
            "{}\n\n{}",
            TOOL_SELECTION_PROMPT.replace("{tool_list}", &self.registry.descriptions()),
            file_context
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.llm.chat_model())
            .temperature(ROUTER_TEMPERATURE)
            .messages([
                ChatCompletionRequestSystemMessage::from(system.as_str()).into(),
                ChatCompletionRequestUserMessage::from(query).into(),
            ])
            .tools(self.registry.definitions())
            .build()?;

        let response = self.llm.client().chat().create(request).await?;
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AppError::LLMParsing("No content found in LLM response".into()))?;

        let tool_calls: Vec<ToolCallRecord> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments = serde_json::from_str::<Value>(&call.function.arguments)
                    .unwrap_or_else(|_| json!({}));
                ToolCallRecord {
                    id: call.id,
                    name: call.function.name,
                    arguments,
                }
            })
            .collect();

        if !tool_calls.is_empty() {
            info!(count = tool_calls.len(), "tool calls requested by router");
        }

        Ok(RouterReply {
            content: message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    /// Second LLM pass rendering the latest tool output as a user-facing
    /// string, appended to the trail. Formatting failures degrade to an
    /// error line instead of dropping the tool result.
    async fn format_latest_tool_output(&self, trail: &mut Vec<AgentMessage>) {
        let latest_tool_output = trail.iter().rev().find_map(|message| match message {
            AgentMessage::Tool { content, .. } if !content.is_empty() => Some(content.clone()),
            _ => None,
        });

        let Some(tool_output) = latest_tool_output else {
            return;
        };

        match self
            .llm
            .complete(&self.format_prompt, &tool_output, FORMATTER_TEMPERATURE)
            .await
        {
            Ok(formatted) => trail.push(AgentMessage::assistant(formatted)),
            Err(err) => {
                error!(error = %err, "error formatting response");
                trail.push(AgentMessage::assistant(format!("결과 포맷팅 실패: {err}")));
            }
        }
    }
}

struct RouterReply {
    content: String,
    tool_calls: Vec<ToolCallRecord>,
}
