//! Log and checkpoint file names under `{log_dir}/{task}/`.
//!
//! Names encode the run's settings so runs with different settings never overwrite each
//! other, e.g. `gpt-4_0.7_propose1_value3_greedy5_local-global_start900_end1000.json`.

use std::path::PathBuf;

use ponder::search::ReflectionSettings;

use crate::args::{Args, Resolved};

/// `{backend}_{temperature}`; the temperature always carries a decimal point (`1.0`, `0.7`).
fn prefix(resolved: &Resolved) -> String {
    format!("{}_{:?}", resolved.backend, resolved.temperature)
}

fn range(args: &Args) -> String {
    format!("start{}_end{}", args.task_start_index, args.task_end_index)
}

fn file_name(args: &Args, resolved: &Resolved) -> String {
    if args.naive_run {
        return format!(
            "{}_naive_{}_sample_{}_{}.json",
            prefix(resolved),
            args.prompt_sample,
            args.n_generate_sample,
            range(args)
        );
    }
    let mut name = format!(
        "{}_{}{}_{}{}_{}{}",
        prefix(resolved),
        method_or_none(args.method_generate),
        args.n_generate_sample,
        method_or_none(args.method_evaluate),
        args.n_evaluate_sample,
        args.method_select,
        args.n_select_sample,
    );
    let reflection = ReflectionSettings {
        local: args.enable_local_reflection,
        global: args.enable_global_reflection,
    };
    if reflection.any() {
        name.push('_');
        name.push_str(&reflection.suffix());
    }
    format!("{}_{}.json", name, range(args))
}

fn method_or_none<T: std::fmt::Display>(method: Option<T>) -> String {
    method.map(|m| m.to_string()).unwrap_or_else(|| "none".into())
}

/// Per-run log file.
pub fn log_file(args: &Args, resolved: &Resolved) -> PathBuf {
    resolved.log_dir.join(&args.task).join(file_name(args, resolved))
}

/// Global reflection checkpoint shared by runs with the same backend, temperature and generator.
pub fn checkpoint_file(args: &Args, resolved: &Resolved) -> PathBuf {
    let name = format!(
        "{}_global_reflection_{}{}_{}.json",
        prefix(resolved),
        method_or_none(args.method_generate),
        args.n_generate_sample,
        range(args)
    );
    resolved.log_dir.join(&args.task).join(name)
}
