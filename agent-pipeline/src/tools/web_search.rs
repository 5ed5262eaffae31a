use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use common::{error::AppError, utils::config::AppConfig};

use super::{query_argument, AgentTool, ToolContext};

const SEARCH_RESULT_LIMIT: usize = 5;

/// Free-form web-augmented answers through the external search provider.
pub struct WebSearchTool {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl WebSearchTool {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.tavily_api_key.clone(),
            base_url: config.search_base_url.clone(),
        }
    }
}

#[async_trait]
impl AgentTool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search_tool"
    }

    fn description(&self) -> &str {
        "다른 도구로 응답할 수 없는 일반적인 정보나 최신 정보를 웹에서 검색합니다."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "웹에서 검색할 질문"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, args: &Value, _ctx: &ToolContext) -> Result<Value, AppError> {
        if self.api_key.is_empty() {
            return Err(AppError::Validation("검색 API 키가 설정되지 않았습니다.".into()));
        }

        let query = query_argument(args, "법률 정보 검색");

        let response = self
            .http
            .post(&self.base_url)
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "search_depth": "basic",
                "max_results": SEARCH_RESULT_LIMIT,
            }))
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        let results: Vec<Value> = body
            .results
            .into_iter()
            .map(|result| json!({"title": result.title, "content": result.content}))
            .collect();

        Ok(json!({ "results": results }))
    }
}
