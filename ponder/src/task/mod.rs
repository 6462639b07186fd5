//! Task provider: problem instances, prompt wrapping, output parsing and validation.
//!
//! The search engine never interprets task text itself. It asks the task for prompts
//! (generation, evaluation, reflection), hands the oracle's replies back to the task to
//! parse, and finally asks the task to test each final candidate.

mod expr;
mod game24;

use serde::{Deserialize, Serialize};

use crate::error::SolveError;
use crate::search::ScoredThought;

pub use expr::{evaluate as evaluate_expression, ExprError, Rational};
pub use game24::Game24Task;

/// Result of testing one final candidate against ground truth.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Score in `[0, 1]`: 0/1 for pass/fail tasks, fractional for partial credit.
    pub r: f64,
    /// Why the candidate failed, when the validator can say.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TestOutcome {
    pub fn pass() -> Self {
        Self { r: 1.0, detail: None }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            r: 0.0,
            detail: Some(detail.into()),
        }
    }
}

/// Header line of the reflection preamble injected into generation prompts.
pub const REFLECTION_HEADER: &str = "Lessons from previous attempts:";

/// A discrete reasoning task solved by tree-of-thought search.
///
/// `x` is the instance input (e.g. the four puzzle numbers); `y` is a partial solution
/// (a thought), built by appending one step per depth to the initial state.
pub trait Task: Send + Sync {
    /// Short name used in log paths (e.g. `game24`).
    fn name(&self) -> &str;

    /// Number of instances.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Input of instance `idx`.
    fn input(&self, idx: usize) -> Result<String, SolveError>;

    /// Root of the search tree for instance `idx`.
    fn initial_state(&self, _idx: usize) -> String {
        String::new()
    }

    /// Depth of the search tree (number of generation steps).
    fn steps(&self) -> usize;

    /// Stop sequence for sample-style generation at `step`.
    fn stop(&self, _step: usize) -> Option<&str> {
        None
    }

    /// True when `state` needs no further expansion.
    fn is_terminal(&self, _state: &str) -> bool {
        false
    }

    /// Direct-answer prompt (naive runs and `PromptStyle::Standard` sampling).
    fn standard_prompt_wrap(&self, x: &str, y: &str) -> String;

    /// Step-by-step prompt (`PromptStyle::Cot` sampling).
    fn cot_prompt_wrap(&self, x: &str, y: &str) -> String;

    /// Prompt asking the oracle to enumerate possible next steps from `y`.
    fn propose_prompt_wrap(&self, x: &str, y: &str) -> String;

    /// Splits a propose reply into individual next steps.
    fn parse_proposals(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Prompt asking the oracle to judge one candidate.
    fn value_prompt_wrap(&self, x: &str, y: &str) -> String;

    /// Aggregates `n_evaluate_sample` judgements of one candidate into a scalar.
    fn value_outputs_unwrap(&self, x: &str, y: &str, outputs: &[String]) -> f64;

    /// Prompt asking the oracle to vote for the best of `ys`.
    fn vote_prompt_wrap(&self, x: &str, ys: &[String]) -> String {
        let mut prompt = format!(
            "Given a task and several choices, decide which choice is most promising. \
             Analyze each choice in detail, then conclude in the last line \
             \"The best choice is {{s}}\", where s is the integer id of the choice.\n\nTask: {}\n",
            x
        );
        for (i, y) in ys.iter().enumerate() {
            prompt.push_str(&format!("Choice {}:\n{}\n", i + 1, y));
        }
        prompt
    }

    /// Counts votes per candidate; replies without a parsable vote are ignored.
    fn vote_outputs_unwrap(&self, outputs: &[String], n_candidates: usize) -> Vec<f64> {
        let mut votes = vec![0.0; n_candidates];
        for output in outputs {
            let Some(last) = output.lines().rev().find(|l| !l.trim().is_empty()) else {
                continue;
            };
            let lower = last.to_lowercase();
            let Some(rest) = lower.split("best choice is").nth(1) else {
                continue;
            };
            let digits: String = rest
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            match digits.parse::<usize>() {
                Ok(id) if (1..=n_candidates).contains(&id) => votes[id - 1] += 1.0,
                _ => continue,
            }
        }
        votes
    }

    /// Prompt asking the oracle to critique low-scoring attempts, one lesson per line.
    fn reflection_prompt_wrap(&self, x: &str, rejected: &[ScoredThought]) -> String {
        let mut prompt = format!(
            "The following partial attempts at a task scored poorly.\n\nTask: {}\n\n",
            x
        );
        for (i, t) in rejected.iter().enumerate() {
            prompt.push_str(&format!(
                "Attempt {} (score {:.3}):\n{}\n",
                i + 1,
                t.score,
                t.state.trim()
            ));
        }
        prompt.push_str(
            "\nWrite short, general lessons that would help avoid these mistakes next time. \
             One lesson per line, no more than three.\n",
        );
        prompt
    }

    /// Tests a final candidate of instance `idx`. Must handle any text, including empty.
    fn test_output(&self, idx: usize, output: &str) -> TestOutcome;
}
