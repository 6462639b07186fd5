//! Search trace types: scored thoughts, per-step records and the whole trace of one instance.

use serde::{Deserialize, Serialize};

/// One candidate thought with the score the evaluator gave it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredThought {
    pub state: String,
    pub score: f64,
}

impl ScoredThought {
    pub fn new(state: impl Into<String>, score: f64) -> Self {
        Self {
            state: state.into(),
            score,
        }
    }
}

/// Record of one search depth: what was generated, how it scored, what survived, and any
/// reflections produced.
///
/// `global_reflections` is what the run loop promotes into global reflection memory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub step: usize,
    /// Instance input.
    pub x: String,
    /// Frontier entering this step.
    pub ys: Vec<String>,
    /// Candidates generated from the frontier, in generation order.
    pub new_ys: Vec<String>,
    /// Score of each entry of `new_ys`.
    pub values: Vec<f64>,
    /// Frontier leaving this step.
    pub select_new_ys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_reflections: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_reflections: Vec<String>,
}

/// Step-level trace of solving one instance. Empty for naive runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveTrace {
    #[serde(default)]
    pub steps: Vec<StepInfo>,
}

impl SolveTrace {
    /// Global reflections produced across all steps, in step order (may repeat).
    pub fn global_reflections(&self) -> impl Iterator<Item = &String> {
        self.steps.iter().flat_map(|s| s.global_reflections.iter())
    }
}

/// Final candidates of one instance plus the trace that produced them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Solution {
    /// Final frontier; empty when the search ran out of candidates.
    pub ys: Vec<String>,
    pub trace: SolveTrace,
}
