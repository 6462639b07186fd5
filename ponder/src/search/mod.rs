//! Tree-of-thought search: strategies, selection, trace types and the engine.

mod engine;
pub mod select;
mod state;
mod strategy;

pub use engine::SearchEngine;
pub use state::{ScoredThought, Solution, SolveTrace, StepInfo};
pub use strategy::{
    EvaluateMethod, GenerateMethod, PromptStyle, ReflectionSettings, SearchConfig, SelectMethod,
    TriggerPolicy,
};
