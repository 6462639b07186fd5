//! Generation oracle: the LLM client abstraction and the adapter the search uses.
//!
//! [`LlmClient`] is the raw text-generation capability (one prompt in, `n` choices out).
//! [`Oracle`] wraps a client for the search: it applies stop sequences, logs each call and
//! records token usage into the process-wide ledger in [`usage`], keyed by the client's
//! backend id.

mod mock;
mod openai;
pub mod usage;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::SolveError;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;
pub use usage::{usage_so_far, UsageReport};

/// Model backend; decides the model name sent to the API and the price per token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
}

impl Backend {
    /// Model name as sent to the chat completions API.
    pub fn model_name(&self) -> &'static str {
        match self {
            Backend::Gpt4 => "gpt-4",
            Backend::Gpt35Turbo => "gpt-3.5-turbo",
            Backend::Gpt4o => "gpt-4o",
        }
    }

    /// USD per 1k tokens as (prompt, completion).
    pub fn price_per_1k(&self) -> (f64, f64) {
        match self {
            Backend::Gpt4 => (0.03, 0.06),
            Backend::Gpt35Turbo => (0.0015, 0.002),
            Backend::Gpt4o => (0.0025, 0.01),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.model_name())
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gpt-4" | "gpt4" => Ok(Self::Gpt4),
            "gpt-3.5-turbo" | "gpt-35-turbo" => Ok(Self::Gpt35Turbo),
            "gpt-4o" => Ok(Self::Gpt4o),
            _ => Err(format!(
                "unknown backend: {} (use gpt-4, gpt-3.5-turbo, or gpt-4o)",
                s
            )),
        }
    }
}

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    /// Tokens in the prompt (input).
    pub prompt_tokens: u32,
    /// Tokens in the completion (output).
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Adds another call's usage into this one.
    pub fn accumulate(&mut self, other: &LlmUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// One generation request: a single prompt sampled `n` times.
#[derive(Clone, Debug)]
pub struct LlmRequest {
    pub prompt: String,
    /// Number of independent choices to sample.
    pub n: usize,
    /// Stop sequence; choices are cut at its first occurrence.
    pub stop: Option<String>,
}

/// Response from an LLM completion: `n` choice texts and usage when available.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    pub choices: Vec<String>,
    pub usage: Option<LlmUsage>,
}

/// LLM client: given one prompt, returns `n` sampled completions.
///
/// Implementations: [`MockLlm`] (scripted replies), [`ChatOpenAI`] (real API).
/// Rate limiting and retries, if any, belong to the implementation.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Identity used to key cumulative usage (usually the model name).
    fn backend_id(&self) -> &str;

    /// Sample `request.n` completions for `request.prompt`.
    async fn invoke(&self, request: &LlmRequest) -> Result<LlmResponse, SolveError>;
}

/// Generation oracle adapter used by the search engine and the reflection generator.
///
/// Cuts each choice at the stop sequence and records usage for [`Oracle::usage`].
/// Cloning shares the same client.
#[derive(Clone)]
pub struct Oracle {
    client: Arc<dyn LlmClient>,
    backend: Option<Backend>,
}

impl Oracle {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            backend: None,
        }
    }

    /// Sets the backend used for pricing in [`Oracle::usage`]. Without it, cost is 0.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn backend_id(&self) -> &str {
        self.client.backend_id()
    }

    /// Returns `n` candidate continuations of `prompt`, each cut at `stop`.
    pub async fn generate(
        &self,
        prompt: &str,
        n: usize,
        stop: Option<&str>,
    ) -> Result<Vec<String>, SolveError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let request = LlmRequest {
            prompt: prompt.to_string(),
            n,
            stop: stop.map(str::to_string),
        };
        debug!(backend = %self.backend_id(), n, "oracle generate");
        trace!(backend = %self.backend_id(), prompt = %prompt, "oracle prompt");
        let response = self.client.invoke(&request).await?;
        if let Some(ref u) = response.usage {
            usage::record(self.backend_id(), u);
        }
        let choices: Vec<String> = response
            .choices
            .into_iter()
            .map(|c| match stop {
                Some(s) if !s.is_empty() => match c.find(s) {
                    Some(pos) => c[..pos].to_string(),
                    None => c,
                },
                _ => c,
            })
            .collect();
        trace!(backend = %self.backend_id(), choices = ?choices, "oracle choices");
        Ok(choices)
    }

    /// Cumulative usage for this oracle's backend id across the process.
    pub fn usage(&self) -> UsageReport {
        usage_so_far(self.backend_id(), self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Backend parses the CLI spellings and rejects unknown names.
    #[test]
    fn backend_from_str_parses_known_values() {
        assert_eq!("gpt-4".parse::<Backend>().unwrap(), Backend::Gpt4);
        assert_eq!(
            "GPT-3.5-TURBO".parse::<Backend>().unwrap(),
            Backend::Gpt35Turbo
        );
        assert_eq!("gpt-4o".parse::<Backend>().unwrap(), Backend::Gpt4o);
        let err = "llama".parse::<Backend>().unwrap_err();
        assert!(err.contains("unknown backend"));
    }

    /// **Scenario**: Display matches the model name so it can be used in file names.
    #[test]
    fn backend_display_is_model_name() {
        assert_eq!(Backend::Gpt35Turbo.to_string(), "gpt-3.5-turbo");
    }

    /// **Scenario**: generate cuts each choice at the stop sequence.
    #[tokio::test]
    async fn generate_applies_stop_sequence() {
        let llm = MockLlm::new("backend-stop-test", "3 + 4 = 7 (left: 7 8 9)\nmore text");
        let oracle = Oracle::new(Arc::new(llm));
        let out = oracle.generate("p", 2, Some("\n")).await.unwrap();
        assert_eq!(out, vec!["3 + 4 = 7 (left: 7 8 9)"; 2]);
    }

    /// **Scenario**: n = 0 returns nothing without calling the client.
    #[tokio::test]
    async fn generate_zero_samples_skips_client() {
        let llm = Arc::new(MockLlm::new("backend-zero-test", "x"));
        let oracle = Oracle::new(llm.clone());
        assert!(oracle.generate("p", 0, None).await.unwrap().is_empty());
        assert!(llm.requests().is_empty());
    }

    /// **Scenario**: usage is accumulated under the client's backend id and priced by backend.
    #[tokio::test]
    async fn generate_records_usage_for_backend() {
        let llm = MockLlm::new("backend-usage-test", "ok").with_usage(100, 50);
        let oracle = Oracle::new(Arc::new(llm)).with_backend(Backend::Gpt4);
        oracle.generate("p", 2, None).await.unwrap();
        let usage = oracle.usage();
        assert_eq!(usage.prompt_tokens, 100);
        assert_eq!(usage.completion_tokens, 100);
        let expected = 100.0 * 0.03 / 1000.0 + 100.0 * 0.06 / 1000.0;
        assert!((usage.cost - expected).abs() < 1e-12);
    }
}
