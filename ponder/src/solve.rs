//! Solve modes: naive single-shot, search, and search with reflection.
//!
//! The mode is picked once per run ([`SolveMode::from_flags`]) and [`Solver`] dispatches on
//! it for every instance.

use std::sync::Arc;

use tracing::debug;

use crate::error::SolveError;
use crate::llm::Oracle;
use crate::reflection::{LlmReflector, ReflectionMemory, Reflector};
use crate::search::{
    PromptStyle, ReflectionSettings, SearchConfig, SearchEngine, Solution, SolveTrace,
};
use crate::task::Task;

/// How each instance is solved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveMode {
    /// One generation call from the empty state; no evaluation, selection or reflection.
    Naive,
    /// Tree search without reflection.
    Search,
    /// Tree search with local and/or global reflection.
    SearchWithReflection(ReflectionSettings),
}

impl SolveMode {
    /// `naive` wins over the reflection flags; neither reflection flag means plain search.
    pub fn from_flags(naive: bool, local: bool, global: bool) -> Self {
        if naive {
            Self::Naive
        } else if local || global {
            Self::SearchWithReflection(ReflectionSettings { local, global })
        } else {
            Self::Search
        }
    }

    pub fn is_naive(&self) -> bool {
        matches!(self, Self::Naive)
    }

    pub fn reflection(&self) -> ReflectionSettings {
        match self {
            Self::SearchWithReflection(settings) => *settings,
            _ => ReflectionSettings::default(),
        }
    }

    pub fn global_reflection(&self) -> bool {
        self.reflection().global
    }
}

/// Solves single instances according to a fixed [`SolveMode`].
pub struct Solver {
    mode: SolveMode,
    oracle: Oracle,
    engine: SearchEngine,
}

impl Solver {
    /// Builds the solver; reflection modes use an [`LlmReflector`] on the same oracle.
    pub fn new(mode: SolveMode, oracle: Oracle, config: SearchConfig) -> Self {
        let reflector: Arc<dyn Reflector> = Arc::new(LlmReflector::new(oracle.clone()));
        Self::with_reflector(mode, oracle, config, reflector)
    }

    /// Like [`Solver::new`] with a custom reflection generator.
    pub fn with_reflector(
        mode: SolveMode,
        oracle: Oracle,
        config: SearchConfig,
        reflector: Arc<dyn Reflector>,
    ) -> Self {
        let mut engine = SearchEngine::new(oracle.clone(), config);
        if let SolveMode::SearchWithReflection(settings) = mode {
            engine = engine.with_reflection(settings, reflector);
        }
        Self {
            mode,
            oracle,
            engine,
        }
    }

    pub fn mode(&self) -> SolveMode {
        self.mode
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    pub fn config(&self) -> &SearchConfig {
        self.engine.config()
    }

    /// Solves instance `idx`. `memory` is only consulted in global-reflection mode.
    pub async fn solve(
        &self,
        task: &dyn Task,
        idx: usize,
        memory: Option<&ReflectionMemory>,
    ) -> Result<Solution, SolveError> {
        match self.mode {
            SolveMode::Naive => self.naive(task, idx).await,
            SolveMode::Search => self.engine.search(task, idx, None).await,
            SolveMode::SearchWithReflection(settings) => {
                let memory = if settings.global { memory } else { None };
                self.engine.search(task, idx, memory).await
            }
        }
    }

    async fn naive(&self, task: &dyn Task, idx: usize) -> Result<Solution, SolveError> {
        let x = task.input(idx)?;
        let y = task.initial_state(idx);
        let config = self.engine.config();
        let prompt = match config.prompt_style {
            PromptStyle::Standard => task.standard_prompt_wrap(&x, &y),
            PromptStyle::Cot => task.cot_prompt_wrap(&x, &y),
        };
        let samples = self
            .oracle
            .generate(&prompt, config.n_generate_sample, None)
            .await?;
        debug!(idx, samples = samples.len(), "naive samples");
        Ok(Solution {
            ys: samples.into_iter().map(|s| format!("{}{}", y, s)).collect(),
            trace: SolveTrace::default(),
        })
    }
}
