//! Run loop: solve a contiguous range of instances, validate, log and checkpoint.
//!
//! For every index in `[start, end)` the loop solves the instance, tests each final
//! candidate, merges the instance's global reflections into memory, appends a
//! [`LogEntry`] and rewrites the log file, then updates the running metrics. A failing
//! instance stops the run; entries written before it stay on disk.

mod log;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RunError;
use crate::llm::UsageReport;
use crate::reflection::ReflectionMemory;
use crate::solve::Solver;
use crate::task::{Task, TestOutcome};

pub use log::{read_log, LogEntry, LogWriter};
pub(crate) use log::write_atomic;

/// When the reflection checkpoint is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointPolicy {
    /// After every instance and at run end.
    #[default]
    EveryInstance,
    /// Only once the whole range is done.
    RunEnd,
}

/// Range and output files of one run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub start: usize,
    pub end: usize,
    pub log_file: PathBuf,
    /// Reflection checkpoint; only used when global reflection is on.
    pub checkpoint_file: Option<PathBuf>,
    pub checkpoint_policy: CheckpointPolicy,
}

impl RunConfig {
    pub fn new(start: usize, end: usize, log_file: impl Into<PathBuf>) -> Self {
        Self {
            start,
            end,
            log_file: log_file.into(),
            checkpoint_file: None,
            checkpoint_policy: CheckpointPolicy::default(),
        }
    }

    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_file = Some(path.into());
        self
    }

    pub fn with_checkpoint_policy(mut self, policy: CheckpointPolicy) -> Self {
        self.checkpoint_policy = policy;
        self
    }
}

/// Running accuracy counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Metrics {
    /// Sum over instances of the mean candidate score.
    pub cnt_avg: f64,
    /// Number of instances where any candidate scored above 0.
    pub cnt_any: f64,
}

impl Metrics {
    /// Adds one instance's validation results. No candidates counts as a failed instance.
    pub fn record(&mut self, infos: &[TestOutcome]) {
        if infos.is_empty() {
            return;
        }
        let sum: f64 = infos.iter().map(|i| i.r).sum();
        self.cnt_avg += sum / infos.len() as f64;
        if infos.iter().any(|i| i.r > 0.0) {
            self.cnt_any += 1.0;
        }
    }
}

/// Final report of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of instances processed.
    pub n: usize,
    pub cnt_avg: f64,
    pub cnt_any: f64,
    /// `cnt_avg / n`.
    pub avg_accuracy: f64,
    /// `cnt_any / n`.
    pub any_accuracy: f64,
    pub usage: UsageReport,
}

/// Solves `[config.start, config.end)` of `task` with `solver`.
pub async fn run(
    task: &dyn Task,
    solver: &Solver,
    config: &RunConfig,
) -> Result<RunSummary, RunError> {
    if config.start >= config.end || config.end > task.len() {
        return Err(RunError::InvalidRange {
            start: config.start,
            end: config.end,
        });
    }
    let global = solver.mode().global_reflection();
    let checkpoint = config.checkpoint_file.as_deref().filter(|_| global);

    let mut memory = match checkpoint {
        Some(path) => {
            let cp = ReflectionMemory::load_checkpoint(path);
            info!(
                path = %path.display(),
                reflections = cp.global_reflection_memory.len(),
                last_index = ?cp.last_index,
                "loaded reflection checkpoint"
            );
            ReflectionMemory::from_entries(cp.global_reflection_memory)
        }
        None => ReflectionMemory::new(),
    };

    let mut log = LogWriter::new(&config.log_file);
    let mut metrics = Metrics::default();

    for idx in config.start..config.end {
        let solution = solver.solve(task, idx, Some(&memory)).await?;
        let infos: Vec<TestOutcome> = solution
            .ys
            .iter()
            .map(|y| task.test_output(idx, y))
            .collect();

        if global {
            let added = memory.merge(solution.trace.global_reflections().cloned());
            debug!(idx, added, total = memory.len(), "merged global reflections");
        }

        log.append(LogEntry {
            idx,
            ys: solution.ys,
            infos: infos.clone(),
            usage_so_far: solver.oracle().usage(),
            global_reflection_memory: global.then(|| memory.entries().to_vec()),
            steps: solution.trace.steps,
        })?;

        if let (Some(path), CheckpointPolicy::EveryInstance) = (checkpoint, config.checkpoint_policy)
        {
            memory.persist(path, idx)?;
        }

        metrics.record(&infos);
        info!(
            idx,
            candidates = infos.len(),
            cnt_avg = metrics.cnt_avg,
            cnt_any = metrics.cnt_any,
            "instance done"
        );
    }

    if let Some(path) = checkpoint {
        memory.persist(path, config.end - 1)?;
        info!(path = %path.display(), reflections = memory.len(), "reflection checkpoint saved");
    }

    let n = config.end - config.start;
    Ok(RunSummary {
        n,
        cnt_avg: metrics.cnt_avg,
        cnt_any: metrics.cnt_any,
        avg_accuracy: metrics.cnt_avg / n as f64,
        any_accuracy: metrics.cnt_any / n as f64,
        usage: solver.oracle().usage(),
    })
}
