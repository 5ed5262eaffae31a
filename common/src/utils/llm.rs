use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs,
    },
    Client,
};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};
use tracing::debug;

use crate::{error::AppError, utils::config::AppConfig};

/// Uniform access to the chat-completion and embedding providers.
///
/// Transient transport failures (network, rate limit, deserialization) are
/// retried with bounded exponential backoff; schema-level failures are the
/// caller's concern and retry at the stage level.
#[derive(Clone)]
pub struct LlmClient {
    client: Arc<Client<OpenAIConfig>>,
    chat_model: String,
    embedding_model: String,
    max_attempts: usize,
}

impl LlmClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Arc::new(Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));

        Self {
            client,
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            max_attempts: config.llm_max_attempts.max(1),
        }
    }

    pub fn with_client(client: Arc<Client<OpenAIConfig>>, config: &AppConfig) -> Self {
        Self {
            client,
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            max_attempts: config.llm_max_attempts.max(1),
        }
    }

    /// The underlying provider client, for callers that need request shapes
    /// beyond the plain (system, user) call, such as tool definitions.
    pub fn client(&self) -> &Client<OpenAIConfig> {
        &self.client
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, AppError> {
        self.complete_with_limits(system_prompt, user_prompt, temperature, None)
            .await
    }

    pub async fn complete_with_limits(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String, AppError> {
        let response = RetryIf::spawn(
            self.retry_strategy(),
            || self.try_complete(system_prompt, user_prompt, temperature, max_tokens),
            is_transient,
        )
        .await?;

        Ok(response)
    }

    async fn try_complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String, OpenAIError> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.chat_model)
            .temperature(temperature)
            .messages([
                ChatCompletionRequestSystemMessage::from(system_prompt).into(),
                ChatCompletionRequestUserMessage::from(user_prompt).into(),
            ]);
        if let Some(limit) = max_tokens {
            builder.max_tokens(limit);
        }
        let request = builder.build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or_default();

        Ok(strip_code_fences(content))
    }

    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AppError> {
        let embedding = RetryIf::spawn(
            self.retry_strategy(),
            || self.try_embed(input),
            is_transient,
        )
        .await?;

        debug!(dimensions = embedding.len(), "embedding generated");

        Ok(embedding)
    }

    async fn try_embed(&self, input: &str) -> Result<Vec<f32>, OpenAIError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_model)
            .input([input])
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        response
            .data
            .first()
            .map(|data| data.embedding.clone())
            .ok_or_else(|| {
                OpenAIError::InvalidArgument("No embedding data received".to_string())
            })
    }

    fn retry_strategy(&self) -> impl Iterator<Item = std::time::Duration> {
        ExponentialBackoff::from_millis(200)
            .max_delay(std::time::Duration::from_secs(30))
            .map(jitter)
            .take(self.max_attempts.saturating_sub(1))
    }
}

fn is_transient(error: &OpenAIError) -> bool {
    match error {
        OpenAIError::Reqwest(_) | OpenAIError::JSONDeserialize(_) | OpenAIError::StreamError(_) => {
            true
        }
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.as_deref().unwrap_or_default();
            kind.contains("rate_limit")
                || kind.contains("server_error")
                || api.message.contains("Rate limit")
        }
        _ => false,
    }
}

/// Drops an enclosing triple-backtick fence, bare or language-tagged, and
/// surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // The opening fence may carry a language tag on the same line.
    let body = match rest.find('\n') {
        Some(newline) => rest.get(newline + 1..).unwrap_or_default(),
        None => rest,
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);

    body.trim().to_string()
}
