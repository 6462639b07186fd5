//! # Ponder
//!
//! Tree-of-thought search over discrete reasoning tasks, with reflection that learns from
//! low-scoring thoughts within one instance (local) and across instances and runs (global).
//!
//! ## Design principles
//!
//! - **Strategies picked once**: generation, evaluation and selection are closed enums in
//!   [`SearchConfig`]; the [`SearchEngine`] dispatches on them, never on strings.
//! - **Explicitly owned memory**: [`ReflectionMemory`] is owned by the run loop, lent to the
//!   search by reference and merged only between instances.
//! - **Incremental persistence**: the log file is rewritten after every instance; the
//!   reflection checkpoint too, unless [`CheckpointPolicy::RunEnd`] is chosen.
//!
//! ## Main modules
//!
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], [`ChatOpenAI`], the [`Oracle`] adapter and
//!   process-wide usage accounting ([`usage_so_far`]).
//! - [`task`]: [`Task`] trait and [`Game24Task`].
//! - [`reflection`]: [`Reflector`] trait, [`LlmReflector`], [`ReflectionMemory`].
//! - [`search`]: [`SearchEngine`], strategy enums, [`StepInfo`] trace records.
//! - [`solve`]: [`SolveMode`] and [`Solver`].
//! - [`run`]: [`run()`](run::run), [`RunConfig`], [`RunSummary`], [`LogEntry`].

pub mod error;
pub mod llm;
pub mod reflection;
pub mod run;
pub mod search;
pub mod solve;
pub mod task;

pub use error::{RunError, SolveError};
pub use llm::{
    usage_so_far, Backend, ChatOpenAI, LlmClient, LlmRequest, LlmResponse, LlmUsage, MockLlm,
    Oracle, UsageReport,
};
pub use reflection::{LlmReflector, ReflectionCheckpoint, ReflectionMemory, Reflector};
pub use run::{read_log, CheckpointPolicy, LogEntry, LogWriter, Metrics, RunConfig, RunSummary};
pub use search::{
    EvaluateMethod, GenerateMethod, PromptStyle, ReflectionSettings, ScoredThought, SearchConfig,
    SearchEngine, SelectMethod, Solution, SolveTrace, StepInfo, TriggerPolicy,
};
pub use solve::{SolveMode, Solver};
pub use task::{Game24Task, Task, TestOutcome};
