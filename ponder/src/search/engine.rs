//! Breadth-first tree-of-thought search with optional local and global reflection.
//!
//! One [`SearchEngine`] is built per run. Per depth it generates children for every
//! frontier state, scores them, optionally reflects on the low scorers, selects the next
//! frontier over the union of all children, and records a [`StepInfo`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::error::SolveError;
use crate::llm::Oracle;
use crate::reflection::{ReflectionMemory, Reflector};
use crate::task::{Task, REFLECTION_HEADER};

use super::select;
use super::state::{ScoredThought, Solution, SolveTrace, StepInfo};
use super::strategy::{
    EvaluateMethod, GenerateMethod, PromptStyle, ReflectionSettings, SearchConfig, SelectMethod,
};

/// Search engine: strategies fixed at construction, reflection memory lent per call.
pub struct SearchEngine {
    oracle: Oracle,
    config: SearchConfig,
    reflection: ReflectionSettings,
    reflector: Option<Arc<dyn Reflector>>,
    rng: Mutex<StdRng>,
    /// Value prompt -> value, shared across instances of the run.
    value_cache: Mutex<HashMap<String, f64>>,
}

impl SearchEngine {
    /// Engine without reflection.
    pub fn new(oracle: Oracle, config: SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            oracle,
            config,
            reflection: ReflectionSettings::default(),
            reflector: None,
            rng: Mutex::new(rng),
            value_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Enables the given reflection scopes, generated by `reflector`.
    pub fn with_reflection(
        mut self,
        settings: ReflectionSettings,
        reflector: Arc<dyn Reflector>,
    ) -> Self {
        self.reflection = settings;
        self.reflector = Some(reflector);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn reflection(&self) -> ReflectionSettings {
        self.reflection
    }

    /// Solves instance `idx`. `memory` is read (never written) when global reflection is on.
    ///
    /// Returns the final frontier (possibly empty) and the per-step trace.
    pub async fn search(
        &self,
        task: &dyn Task,
        idx: usize,
        memory: Option<&ReflectionMemory>,
    ) -> Result<Solution, SolveError> {
        let x = task.input(idx)?;
        let mut ys = vec![task.initial_state(idx)];
        let mut local: Vec<String> = Vec::new();
        let mut trace = SolveTrace::default();

        for step in 0..task.steps() {
            let preamble = self.preamble(memory, &local);

            let new_ys = self.generate(task, &x, &ys, step, &preamble).await?;
            let values = self.evaluate(task, &x, &new_ys).await?;
            debug!(idx, step, candidates = new_ys.len(), "step evaluated");

            let (local_reflections, global_reflections) =
                self.maybe_reflect(task, &x, step, &new_ys, &values).await?;
            for r in &local_reflections {
                if !local.contains(r) {
                    local.push(r.clone());
                }
            }

            let select_ids = self.select(&values);
            let select_new_ys: Vec<String> =
                select_ids.iter().map(|&i| new_ys[i].clone()).collect();
            debug!(
                idx,
                step,
                selected = select_new_ys.len(),
                best = select_ids.first().map(|&i| values[i]).unwrap_or(0.0),
                "frontier selected"
            );

            trace.steps.push(StepInfo {
                step,
                x: x.clone(),
                ys: std::mem::take(&mut ys),
                new_ys,
                values,
                select_new_ys: select_new_ys.clone(),
                local_reflections,
                global_reflections,
            });
            ys = select_new_ys;

            if ys.is_empty() {
                debug!(idx, step, "frontier empty, stopping early");
                break;
            }
            if ys.iter().all(|y| task.is_terminal(y)) {
                debug!(idx, step, "all frontier states terminal");
                break;
            }
        }

        Ok(Solution { ys, trace })
    }

    /// Active reflections (global snapshot, then local) rendered as a prompt preamble.
    fn preamble(&self, memory: Option<&ReflectionMemory>, local: &[String]) -> String {
        let mut active: Vec<&str> = Vec::new();
        if self.reflection.global {
            if let Some(m) = memory {
                active.extend(m.entries().iter().map(String::as_str));
            }
        }
        if self.reflection.local {
            for r in local {
                if !active.contains(&r.as_str()) {
                    active.push(r.as_str());
                }
            }
        }
        if active.is_empty() {
            return String::new();
        }
        let mut out = format!("{}\n", REFLECTION_HEADER);
        for r in active {
            out.push_str("- ");
            out.push_str(r);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    async fn generate(
        &self,
        task: &dyn Task,
        x: &str,
        ys: &[String],
        step: usize,
        preamble: &str,
    ) -> Result<Vec<String>, SolveError> {
        let mut new_ys = Vec::new();
        for y in ys {
            match self.config.method_generate {
                GenerateMethod::Sample => {
                    let body = match self.config.prompt_style {
                        PromptStyle::Standard => task.standard_prompt_wrap(x, y),
                        PromptStyle::Cot => task.cot_prompt_wrap(x, y),
                    };
                    let prompt = format!("{}{}", preamble, body);
                    let stop = task.stop(step);
                    let samples = self
                        .oracle
                        .generate(&prompt, self.config.n_generate_sample, stop)
                        .await?;
                    // the stop sequence is cut from each sample; restore it as the step delimiter
                    let delimiter = stop.unwrap_or("");
                    new_ys.extend(samples.into_iter().map(|s| format!("{}{}{}", y, s, delimiter)));
                }
                GenerateMethod::Propose => {
                    let prompt = format!("{}{}", preamble, task.propose_prompt_wrap(x, y));
                    let outputs = self.oracle.generate(&prompt, 1, None).await?;
                    for output in outputs {
                        new_ys.extend(
                            task.parse_proposals(&output)
                                .into_iter()
                                .map(|p| format!("{}{}\n", y, p)),
                        );
                    }
                }
            }
        }
        Ok(new_ys)
    }

    async fn evaluate(
        &self,
        task: &dyn Task,
        x: &str,
        new_ys: &[String],
    ) -> Result<Vec<f64>, SolveError> {
        if new_ys.is_empty() {
            return Ok(Vec::new());
        }
        match self.config.method_evaluate {
            EvaluateMethod::Value => {
                let mut values = Vec::with_capacity(new_ys.len());
                for (i, y) in new_ys.iter().enumerate() {
                    if new_ys[..i].contains(y) {
                        values.push(0.0);
                        continue;
                    }
                    values.push(self.value(task, x, y).await?);
                }
                Ok(values)
            }
            EvaluateMethod::Vote => {
                let prompt = task.vote_prompt_wrap(x, new_ys);
                let outputs = self
                    .oracle
                    .generate(&prompt, self.config.n_evaluate_sample, None)
                    .await?;
                Ok(task.vote_outputs_unwrap(&outputs, new_ys.len()))
            }
        }
    }

    async fn value(&self, task: &dyn Task, x: &str, y: &str) -> Result<f64, SolveError> {
        let prompt = task.value_prompt_wrap(x, y);
        let cached = self
            .value_cache
            .lock()
            .ok()
            .and_then(|c| c.get(&prompt).copied());
        if let Some(v) = cached {
            return Ok(v);
        }
        let outputs = self
            .oracle
            .generate(&prompt, self.config.n_evaluate_sample, None)
            .await?;
        let v = task.value_outputs_unwrap(x, y, &outputs);
        if let Ok(mut cache) = self.value_cache.lock() {
            cache.insert(prompt, v);
        }
        Ok(v)
    }

    /// Returns `(local, global)` reflections of this step; both empty when not triggered.
    async fn maybe_reflect(
        &self,
        task: &dyn Task,
        x: &str,
        step: usize,
        new_ys: &[String],
        values: &[f64],
    ) -> Result<(Vec<String>, Vec<String>), SolveError> {
        let Some(reflector) = self.reflector.as_ref().filter(|_| self.reflection.any()) else {
            return Ok((Vec::new(), Vec::new()));
        };
        let Some(stat) = self.config.trigger.statistic(values) else {
            return Ok((Vec::new(), Vec::new()));
        };
        if stat >= self.config.threshold {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut rejected: Vec<ScoredThought> = new_ys
            .iter()
            .zip(values)
            .filter(|(_, v)| **v < self.config.threshold)
            .map(|(y, &v)| ScoredThought::new(y.clone(), v))
            .collect();
        rejected.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if rejected.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let lessons = reflector
            .reflect(task, x, &rejected, self.config.max_reflections_per_step)
            .await?;
        info!(
            step,
            trigger = %self.config.trigger,
            score = stat,
            threshold = self.config.threshold,
            rejected = rejected.len(),
            reflections = lessons.len(),
            "reflection triggered"
        );
        let local = if self.reflection.local {
            lessons.clone()
        } else {
            Vec::new()
        };
        let global = if self.reflection.global {
            lessons
        } else {
            Vec::new()
        };
        Ok((local, global))
    }

    fn select(&self, values: &[f64]) -> Vec<usize> {
        let k = self.config.n_select_sample;
        match self.config.method_select {
            SelectMethod::Greedy => select::greedy(values, k),
            SelectMethod::Sample => match self.rng.lock() {
                Ok(mut rng) => select::sample(values, k, &mut *rng),
                Err(poisoned) => select::sample(values, k, &mut *poisoned.into_inner()),
            },
        }
    }
}
