//! Ponder CLI library: argument parsing, log paths and the run entry used by the binary.

pub mod args;
pub mod paths;

use std::sync::Arc;

use config::RunDefaults;
use ponder::{
    ChatOpenAI, CheckpointPolicy, Game24Task, LlmClient, Oracle, RunConfig, RunError, RunSummary,
    Solver, Task,
};
use tracing::info;

pub use args::{Args, Resolved};

/// Builds the task named by `--task`.
pub fn load_task(args: &Args) -> Result<Box<dyn Task>, RunError> {
    match args.task.as_str() {
        "game24" => Ok(Box::new(Game24Task::from_csv(&args.data_file())?)),
        other => Err(RunError::Config(format!("unknown task: {} (use game24)", other))),
    }
}

/// Runs with the OpenAI client for the resolved backend and temperature.
pub async fn execute(args: &Args, defaults: &RunDefaults) -> Result<RunSummary, RunError> {
    let resolved = args.resolve(defaults)?;
    let client = ChatOpenAI::for_backend(resolved.backend).with_temperature(resolved.temperature);
    execute_with(args, &resolved, Arc::new(client)).await
}

/// Runs with a caller-supplied client (tests use `MockLlm`).
pub async fn execute_with(
    args: &Args,
    resolved: &Resolved,
    client: Arc<dyn LlmClient>,
) -> Result<RunSummary, RunError> {
    let mode = args.mode();
    let search = args.search_config(resolved)?;
    let task = load_task(args)?;

    let log_file = paths::log_file(args, resolved);
    let mut run_config = RunConfig::new(args.task_start_index, args.task_end_index, &log_file);
    if mode.global_reflection() {
        run_config = run_config.with_checkpoint(paths::checkpoint_file(args, resolved));
    }
    if args.checkpoint_at_end {
        run_config = run_config.with_checkpoint_policy(CheckpointPolicy::RunEnd);
    }

    info!(
        task = %task.name(),
        backend = %resolved.backend,
        mode = ?mode,
        start = args.task_start_index,
        end = args.task_end_index,
        log_file = %log_file.display(),
        "starting run"
    );
    let oracle = Oracle::new(client).with_backend(resolved.backend);
    let solver = Solver::new(mode, oracle, search);
    ponder::run::run(task.as_ref(), &solver, &run_config).await
}
