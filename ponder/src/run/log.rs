//! Per-instance log entries and the incremental JSON log file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RunError;
use crate::llm::UsageReport;
use crate::search::StepInfo;
use crate::task::TestOutcome;

/// Everything recorded for one instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub idx: usize,
    /// Final candidates.
    pub ys: Vec<String>,
    /// One validation result per candidate.
    pub infos: Vec<TestOutcome>,
    /// Cumulative oracle usage after this instance.
    pub usage_so_far: UsageReport,
    /// Global reflection memory after merging this instance's reflections; None unless
    /// global reflection is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_reflection_memory: Option<Vec<String>>,
    /// Search trace; empty for naive runs.
    #[serde(default)]
    pub steps: Vec<StepInfo>,
}

/// Log file rewritten in full after every appended entry.
pub struct LogWriter {
    path: PathBuf,
    entries: Vec<LogEntry>,
}

impl LogWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Appends `entry` and rewrites the file with every entry so far.
    pub fn append(&mut self, entry: LogEntry) -> Result<(), RunError> {
        self.entries.push(entry);
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.path, json.as_bytes())
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}

/// Reads a log file written by [`LogWriter`].
pub fn read_log(path: &Path) -> Result<Vec<LogEntry>, RunError> {
    let content = std::fs::read_to_string(path).map_err(|e| RunError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
///
/// Creates missing parent directories.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RunError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| RunError::io(parent, e))?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, bytes).map_err(|e| RunError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| RunError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(idx: usize) -> LogEntry {
        LogEntry {
            idx,
            ys: vec![format!("answer {}", idx)],
            infos: vec![TestOutcome::pass()],
            ..Default::default()
        }
    }

    /// **Scenario**: every append leaves a complete, parseable file holding all entries so far.
    #[test]
    fn append_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game24").join("run.json");
        let mut w = LogWriter::new(&path);
        w.append(entry(900)).unwrap();
        assert_eq!(read_log(&path).unwrap().len(), 1);
        w.append(entry(901)).unwrap();
        let back = read_log(&path).unwrap();
        assert_eq!(back.iter().map(|e| e.idx).collect::<Vec<_>>(), vec![900, 901]);
        assert!(!path.with_file_name("run.json.tmp").exists());
    }

    /// **Scenario**: memory is left out when global reflection is off and written as `[]`
    /// when it is on but still empty.
    #[test]
    fn entry_memory_key_follows_global_reflection() {
        let v = serde_json::to_value(entry(1)).unwrap();
        assert!(v.get("global_reflection_memory").is_none());
        assert_eq!(v["infos"][0]["r"], 1.0);
        assert!(v["usage_so_far"].get("cost").is_some());

        let on = LogEntry {
            global_reflection_memory: Some(Vec::new()),
            ..entry(2)
        };
        let v = serde_json::to_value(&on).unwrap();
        assert_eq!(v["global_reflection_memory"], serde_json::json!([]));
        let back: LogEntry = serde_json::from_value(v).unwrap();
        assert_eq!(back.global_reflection_memory, Some(Vec::new()));
    }

    #[test]
    fn read_log_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_log(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, RunError::Io { .. }));
    }
}
