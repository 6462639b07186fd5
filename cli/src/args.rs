//! Command-line arguments and their resolution against `[defaults]` from `config.toml`.

use std::path::PathBuf;

use clap::Parser;
use config::RunDefaults;
use ponder::{
    Backend, EvaluateMethod, GenerateMethod, PromptStyle, RunError, SearchConfig, SelectMethod,
    SolveMode, TriggerPolicy,
};

const DEFAULT_BACKEND: Backend = Backend::Gpt4;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_THRESHOLD: f64 = 0.5;
const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_GAME24_DATA: &str = "data/24/24.csv";

#[derive(Parser, Debug, Clone)]
#[command(name = "ponder")]
#[command(about = "Ponder: tree-of-thought search with local and global reflection")]
pub struct Args {
    /// Model backend: gpt-4, gpt-3.5-turbo or gpt-4o (default: [defaults].backend, then gpt-4)
    #[arg(long, value_name = "MODEL")]
    pub backend: Option<Backend>,

    /// Sampling temperature (default: [defaults].temperature, then 0.7)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Task to solve
    #[arg(long, default_value = "game24")]
    pub task: String,

    /// Puzzle file for the task (game24: CSV with a `Puzzles` column)
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// First instance index (inclusive)
    #[arg(long, default_value_t = 900)]
    pub task_start_index: usize,

    /// Last instance index (exclusive)
    #[arg(long, default_value_t = 1000)]
    pub task_end_index: usize,

    /// Single-shot baseline: one generation call per instance, no search
    #[arg(long)]
    pub naive_run: bool,

    /// Prompt style for sampling and naive runs: standard or cot
    #[arg(long, default_value_t = PromptStyle::Standard)]
    pub prompt_sample: PromptStyle,

    /// Generation strategy: sample or propose (required unless --naive-run)
    #[arg(long)]
    pub method_generate: Option<GenerateMethod>,

    /// Evaluation strategy: value or vote (required unless --naive-run)
    #[arg(long)]
    pub method_evaluate: Option<EvaluateMethod>,

    /// Selection strategy: sample or greedy
    #[arg(long, default_value_t = SelectMethod::Greedy)]
    pub method_select: SelectMethod,

    #[arg(long, default_value_t = 1)]
    pub n_generate_sample: usize,

    #[arg(long, default_value_t = 1)]
    pub n_evaluate_sample: usize,

    #[arg(long, default_value_t = 1)]
    pub n_select_sample: usize,

    /// Reflect within one instance's search
    #[arg(long)]
    pub enable_local_reflection: bool,

    /// Keep reflections across instances and runs
    #[arg(long)]
    pub enable_global_reflection: bool,

    /// Reflect when the step score falls below this (default: [defaults].threshold, then 0.5)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Step score compared with the threshold: max or mean
    #[arg(long, default_value_t = TriggerPolicy::Max)]
    pub trigger: TriggerPolicy,

    /// Upper bound on reflections kept per triggered step
    #[arg(long, default_value_t = 3)]
    pub max_reflections_per_step: usize,

    /// Seed for sample selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Root of log and checkpoint files (default: [defaults].log_dir, then ./logs)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Write the reflection checkpoint only when the whole range is done
    #[arg(long)]
    pub checkpoint_at_end: bool,

    /// Debug-level logging when RUST_LOG is unset
    #[arg(short, long)]
    pub verbose: bool,
}

/// Values that fall back from flag to `[defaults]` to built-in.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub backend: Backend,
    pub temperature: f32,
    pub threshold: f64,
    pub log_dir: PathBuf,
}

impl Args {
    pub fn resolve(&self, defaults: &RunDefaults) -> Result<Resolved, RunError> {
        let backend = match (self.backend, defaults.backend.as_deref()) {
            (Some(b), _) => b,
            (None, Some(s)) => s
                .parse::<Backend>()
                .map_err(|e| RunError::Config(format!("[defaults].backend: {}", e)))?,
            (None, None) => DEFAULT_BACKEND,
        };
        Ok(Resolved {
            backend,
            temperature: self
                .temperature
                .or(defaults.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            threshold: self
                .threshold
                .or(defaults.threshold)
                .unwrap_or(DEFAULT_THRESHOLD),
            log_dir: self
                .log_dir
                .clone()
                .or_else(|| defaults.log_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        })
    }

    pub fn mode(&self) -> SolveMode {
        SolveMode::from_flags(
            self.naive_run,
            self.enable_local_reflection,
            self.enable_global_reflection,
        )
    }

    /// Search parameters. Search modes need both `--method-generate` and `--method-evaluate`.
    pub fn search_config(&self, resolved: &Resolved) -> Result<SearchConfig, RunError> {
        let base = if self.naive_run {
            SearchConfig::default()
        } else {
            match (self.method_generate, self.method_evaluate) {
                (Some(g), Some(e)) => SearchConfig::new(g, e),
                _ => {
                    return Err(RunError::Config(
                        "search requires --method-generate and --method-evaluate (or use --naive-run)"
                            .into(),
                    ))
                }
            }
        };
        Ok(base
            .with_select(self.method_select)
            .with_prompt_style(self.prompt_sample)
            .with_samples(
                self.n_generate_sample,
                self.n_evaluate_sample,
                self.n_select_sample,
            )
            .with_threshold(resolved.threshold)
            .with_trigger(self.trigger)
            .with_max_reflections_per_step(self.max_reflections_per_step)
            .with_seed(self.seed))
    }

    pub fn data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GAME24_DATA))
    }
}
