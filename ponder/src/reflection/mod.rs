//! Reflection: short lessons generated from low-scoring thoughts.
//!
//! [`Reflector`] turns rejected candidates into lesson strings. Local reflections live
//! only inside one instance's search; global ones are promoted by the run loop into
//! [`ReflectionMemory`], which persists across instances and process restarts.

mod memory;

use async_trait::async_trait;
use tracing::debug;

use crate::error::SolveError;
use crate::llm::Oracle;
use crate::search::ScoredThought;
use crate::task::Task;

pub use memory::{ReflectionCheckpoint, ReflectionMemory};

/// Produces reflections for a set of rejected candidates of one task instance.
#[async_trait]
pub trait Reflector: Send + Sync {
    /// Returns at most `limit` lessons learned from `rejected` (lowest score first).
    async fn reflect(
        &self,
        task: &dyn Task,
        x: &str,
        rejected: &[ScoredThought],
        limit: usize,
    ) -> Result<Vec<String>, SolveError>;
}

/// Reflector backed by the generation oracle and the task's reflection prompt.
pub struct LlmReflector {
    oracle: Oracle,
}

impl LlmReflector {
    pub fn new(oracle: Oracle) -> Self {
        Self { oracle }
    }

    /// Strips bullets and numbering (`- `, `* `, `1. `, `2) `) and drops blank lines.
    fn parse_lessons(output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| {
                let line = line.trim();
                let line = line.trim_start_matches(['-', '*', '•']).trim_start();
                let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
                if digits > 0 {
                    let rest = &line[digits..];
                    if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
                        return stripped.trim().to_string();
                    }
                }
                line.to_string()
            })
            .filter(|l| !l.is_empty())
            .collect()
    }
}

#[async_trait]
impl Reflector for LlmReflector {
    async fn reflect(
        &self,
        task: &dyn Task,
        x: &str,
        rejected: &[ScoredThought],
        limit: usize,
    ) -> Result<Vec<String>, SolveError> {
        if rejected.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let prompt = task.reflection_prompt_wrap(x, rejected);
        let outputs = self.oracle.generate(&prompt, 1, None).await?;
        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| SolveError::Reflection("oracle returned no reflection".into()))?;
        let mut lessons: Vec<String> = Vec::new();
        for lesson in Self::parse_lessons(&output) {
            if !lessons.contains(&lesson) {
                lessons.push(lesson);
            }
        }
        lessons.truncate(limit);
        debug!(rejected = rejected.len(), lessons = lessons.len(), "reflection generated");
        Ok(lessons)
    }
}
