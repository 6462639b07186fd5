//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Each prompt is sent as a single user message. The API caps `n` per request, so
//! larger sample counts are split into batches of [`MAX_CHOICES_PER_REQUEST`] and the
//! usage of all batches is summed. Requires `OPENAI_API_KEY` (or explicit config);
//! `OPENAI_BASE_URL` / `OPENAI_API_BASE` are honoured by the underlying client.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::SolveError;
use crate::llm::{Backend, LlmClient, LlmRequest, LlmResponse, LlmUsage};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    Client,
};

/// Upper bound on `n` for a single chat completion request.
pub const MAX_CHOICES_PER_REQUEST: usize = 20;

/// OpenAI Chat Completions client.
///
/// Uses `OPENAI_API_KEY` from the environment by default; or provide config via
/// [`ChatOpenAI::with_config`].
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Build client for a known backend.
    pub fn for_backend(backend: Backend) -> Self {
        Self::new(backend.model_name())
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap completion length per choice.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Splits `n` into request-sized batches, e.g. 45 -> [20, 20, 5].
    fn batches(n: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut left = n;
        while left > 0 {
            let cnt = left.min(MAX_CHOICES_PER_REQUEST);
            out.push(cnt);
            left -= cnt;
        }
        out
    }

    async fn invoke_batch(
        &self,
        prompt: &str,
        n: usize,
    ) -> Result<(Vec<String>, Option<LlmUsage>), SolveError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage::from(prompt),
        )]);
        args.n(n as u8);
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        if let Some(m) = self.max_tokens {
            args.max_completion_tokens(m);
        }
        let request = args
            .build()
            .map_err(|e| SolveError::Oracle(format!("OpenAI request build failed: {}", e)))?;

        debug!(model = %self.model, n, temperature = ?self.temperature, "OpenAI chat create");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SolveError::Oracle(format!("OpenAI API error: {}", e)))?;

        if let Ok(js) = serde_json::to_string_pretty(&response) {
            trace!(model = %self.model, response = %js, "OpenAI response body");
        }

        let choices: Vec<String> = response
            .choices
            .into_iter()
            .map(|c| c.message.content.unwrap_or_default())
            .collect();
        if choices.is_empty() {
            return Err(SolveError::Oracle("OpenAI returned no choices".to_string()));
        }
        let usage = response.usage.map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        Ok((choices, usage))
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    fn backend_id(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, request: &LlmRequest) -> Result<LlmResponse, SolveError> {
        let mut choices = Vec::with_capacity(request.n);
        let mut usage: Option<LlmUsage> = None;
        for cnt in Self::batches(request.n) {
            let (batch, batch_usage) = self.invoke_batch(&request.prompt, cnt).await?;
            choices.extend(batch);
            if let Some(u) = batch_usage {
                usage.get_or_insert_with(LlmUsage::default).accumulate(&u);
            }
        }
        Ok(LlmResponse { choices, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Sample counts are split into batches no larger than the API cap.
    #[test]
    fn batches_respect_api_cap() {
        assert_eq!(ChatOpenAI::batches(0), Vec::<usize>::new());
        assert_eq!(ChatOpenAI::batches(5), vec![5]);
        assert_eq!(ChatOpenAI::batches(20), vec![20]);
        assert_eq!(ChatOpenAI::batches(45), vec![20, 20, 5]);
    }

    /// **Scenario**: backend_id is the model name so usage is keyed per model.
    #[test]
    fn backend_id_is_model_name() {
        let llm = ChatOpenAI::for_backend(Backend::Gpt35Turbo).with_temperature(0.7);
        assert_eq!(llm.backend_id(), "gpt-3.5-turbo");
    }
}
