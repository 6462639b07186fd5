//! End-to-end runs through the CLI library with a scripted LLM.

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use cli::{execute_with, Args};
use config::RunDefaults;
use ponder::{read_log, MockLlm, RunError};

fn write_puzzles(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("24.csv");
    std::fs::write(
        &path,
        "Rank,Puzzles,AMT (s),Solved rate\n1,4 5 6 10,5.1,99%\n2,1 1 4 6,6.0,98%\n",
    )
    .unwrap();
    path
}

fn args(dir: &Path, extra: &[&str]) -> Args {
    let data = write_puzzles(dir);
    let log_dir = dir.join("logs");
    let mut argv = vec![
        "ponder".to_string(),
        "--data-file".into(),
        data.display().to_string(),
        "--log-dir".into(),
        log_dir.display().to_string(),
        "--task-start-index".into(),
        "0".into(),
        "--task-end-index".into(),
        "2".into(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    Args::try_parse_from(argv).unwrap()
}

/// **Scenario**: a naive run writes one entry per instance to the named log file.
#[tokio::test]
async fn naive_run_writes_named_log() {
    let dir = tempfile::tempdir().unwrap();
    let args = args(dir.path(), &["--naive-run"]);
    let resolved = args.resolve(&RunDefaults::default()).unwrap();
    let llm = Arc::new(MockLlm::new("cli-naive-test", "Answer: (5 * (10 - 4)) - 6 = 24"));
    let summary = execute_with(&args, &resolved, llm).await.unwrap();
    assert_eq!(summary.n, 2);
    assert_eq!(summary.cnt_any, 1.0);

    let log = dir
        .path()
        .join("logs/game24/gpt-4_0.7_naive_standard_sample_1_start0_end2.json");
    let entries = read_log(&log).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].infos[0].r, 1.0);
    assert_eq!(entries[1].infos[0].r, 0.0);
}

/// **Scenario**: global reflection runs write the checkpoint next to the log.
#[tokio::test]
async fn global_reflection_run_writes_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let args = args(
        dir.path(),
        &[
            "--method-generate",
            "sample",
            "--method-evaluate",
            "value",
            "--enable-global-reflection",
        ],
    );
    let resolved = args.resolve(&RunDefaults::default()).unwrap();
    let llm = Arc::new(
        MockLlm::new("cli-global-test", "impossible").with_rule("scored poorly", ["- check the numbers"]),
    );
    execute_with(&args, &resolved, llm).await.unwrap();
    let cp = dir
        .path()
        .join("logs/game24/gpt-4_0.7_global_reflection_sample1_start0_end2.json");
    let memory = ponder::ReflectionMemory::load(&cp);
    assert_eq!(memory.entries(), ["check the numbers"]);
}

#[tokio::test]
async fn unknown_task_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = args(dir.path(), &["--naive-run", "--task", "crosswords"]);
    let resolved = args.resolve(&RunDefaults::default()).unwrap();
    let llm = Arc::new(MockLlm::new("cli-unknown-task-test", ""));
    let err = execute_with(&args, &resolved, llm).await.unwrap_err();
    assert!(matches!(err, RunError::Config(_)), "{}", err);
}
