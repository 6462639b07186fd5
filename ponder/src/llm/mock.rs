//! Mock LLM for tests and examples.
//!
//! Replies are scripted by prompt substring: the first rule whose needle occurs in the
//! prompt answers, otherwise the default reply is used. A rule with several replies cycles
//! through them across choices, so one call with `n = 3` can return three different
//! candidates. Every request is recorded for assertions.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SolveError;
use crate::llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};

struct Rule {
    needle: String,
    replies: Vec<String>,
}

/// Mock LLM: scripted replies keyed by prompt substring.
///
/// **Interaction**: Implements `LlmClient`; wrapped by [`Oracle`](crate::llm::Oracle) in tests.
pub struct MockLlm {
    backend_id: String,
    default_reply: String,
    rules: Vec<Rule>,
    /// When Some, any prompt containing this needle fails with `SolveError::Oracle`.
    fail_on: Option<String>,
    /// (prompt tokens per call, completion tokens per choice).
    usage: Option<(u32, u32)>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    /// Creates a mock that answers every prompt with `default_reply`.
    pub fn new(backend_id: impl Into<String>, default_reply: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            default_reply: default_reply.into(),
            rules: Vec::new(),
            fail_on: None,
            usage: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Adds a rule: prompts containing `needle` get `replies`, cycled per choice (builder).
    pub fn with_rule<I, S>(mut self, needle: impl Into<String>, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(Rule {
            needle: needle.into(),
            replies: replies.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Fails every prompt containing `needle` (builder).
    pub fn with_failure_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    /// Reports usage: `prompt_tokens` per call and `completion_tokens` per choice (builder).
    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = Some((prompt_tokens, completion_tokens));
        self
    }

    /// All requests received so far, in call order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Prompts received so far that contain `needle`.
    pub fn prompts_containing(&self, needle: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.prompt)
            .filter(|p| p.contains(needle))
            .collect()
    }

    fn replies_for(&self, prompt: &str) -> Vec<String> {
        self.rules
            .iter()
            .find(|r| prompt.contains(&r.needle) && !r.replies.is_empty())
            .map(|r| r.replies.clone())
            .unwrap_or_else(|| vec![self.default_reply.clone()])
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn backend_id(&self) -> &str {
        &self.backend_id
    }

    async fn invoke(&self, request: &LlmRequest) -> Result<LlmResponse, SolveError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }
        if let Some(ref needle) = self.fail_on {
            if request.prompt.contains(needle.as_str()) {
                return Err(SolveError::Oracle(format!("mock failure on '{}'", needle)));
            }
        }
        let replies = self.replies_for(&request.prompt);
        let choices = (0..request.n)
            .map(|i| replies[i % replies.len()].clone())
            .collect::<Vec<_>>();
        let usage = self.usage.map(|(prompt_tokens, per_choice)| {
            let completion_tokens = per_choice * request.n as u32;
            LlmUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }
        });
        Ok(LlmResponse { choices, usage })
    }
}
