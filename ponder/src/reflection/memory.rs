//! Global reflection memory: an ordered, duplicate-free list of lessons.
//!
//! Owned by the run loop and lent to the search by reference. Entries are never reordered
//! or evicted; new ones are appended only when no identical string exists. The checkpoint
//! file stores the list together with the last fully processed instance index.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RunError;

/// On-disk shape of the reflection checkpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectionCheckpoint {
    pub global_reflection_memory: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_index: Option<usize>,
}

/// Deduplicated, insertion-ordered global reflection memory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReflectionMemory {
    entries: Vec<String>,
}

impl ReflectionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds memory from a list, dropping later duplicates.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut memory = Self::new();
        memory.merge(entries);
        memory
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, reflection: &str) -> bool {
        self.entries.iter().any(|e| e == reflection)
    }

    /// Appends each reflection not already present; returns how many were added.
    pub fn merge<I, S>(&mut self, reflections: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.entries.len();
        for r in reflections {
            let r = r.into();
            if !self.contains(&r) {
                self.entries.push(r);
            }
        }
        self.entries.len() - before
    }

    /// Reads a checkpoint. Missing, unreadable or malformed files give an empty checkpoint.
    pub fn load_checkpoint(path: &Path) -> ReflectionCheckpoint {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ReflectionCheckpoint::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "reflection checkpoint unreadable, starting fresh");
                return ReflectionCheckpoint::default();
            }
        };
        match serde_json::from_str::<ReflectionCheckpoint>(&content) {
            Ok(cp) => cp,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "reflection checkpoint malformed, starting fresh");
                ReflectionCheckpoint::default()
            }
        }
    }

    /// Loads memory from a checkpoint file; never fails (see [`Self::load_checkpoint`]).
    pub fn load(path: &Path) -> Self {
        Self::from_entries(Self::load_checkpoint(path).global_reflection_memory)
    }

    /// Overwrites the checkpoint with this memory and `last_index`.
    ///
    /// Written to a sibling temp file and renamed, so readers never see a partial file.
    pub fn persist(&self, path: &Path, last_index: usize) -> Result<(), RunError> {
        let checkpoint = ReflectionCheckpoint {
            global_reflection_memory: self.entries.clone(),
            last_index: Some(last_index),
        };
        let json = serde_json::to_string_pretty(&checkpoint)?;
        crate::run::write_atomic(path, json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: duplicates are suppressed and first-seen order is kept.
    #[test]
    fn merge_keeps_first_seen_order() {
        let mut m = ReflectionMemory::new();
        assert_eq!(m.merge(["a", "b", "a"]), 2);
        assert_eq!(m.merge(["c", "b", "a", "d"]), 2);
        assert_eq!(m.entries(), ["a", "b", "c", "d"]);
    }

    /// **Scenario**: re-submitting duplicates many times never changes the memory.
    #[test]
    fn merge_is_idempotent_for_duplicates() {
        let mut m = ReflectionMemory::from_entries(["x", "y"]);
        for _ in 0..5 {
            assert_eq!(m.merge(["y", "x"]), 0);
        }
        assert_eq!(m.entries(), ["x", "y"]);
    }

    /// **Scenario**: exact match only; near-duplicates are distinct entries.
    #[test]
    fn merge_is_exact_string_match() {
        let mut m = ReflectionMemory::from_entries(["Use multiplication"]);
        assert_eq!(m.merge(["use multiplication", "Use multiplication "]), 2);
        assert_eq!(m.len(), 3);
    }

    /// **Scenario**: missing checkpoint file loads as empty memory.
    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let m = ReflectionMemory::load(&dir.path().join("absent.json"));
        assert!(m.is_empty());
    }

    /// **Scenario**: malformed JSON or a JSON object without the memory field loads as empty.
    #[test]
    fn load_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(ReflectionMemory::load(&bad).is_empty());
        let other = dir.path().join("other.json");
        std::fs::write(&other, r#"{"something_else": [1, 2]}"#).unwrap();
        assert!(ReflectionMemory::load(&other).is_empty());
    }

    /// **Scenario**: persist overwrites the file and load reads back entries and last_index.
    #[test]
    fn persist_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.json");
        ReflectionMemory::from_entries(["old"]).persist(&path, 3).unwrap();
        let m = ReflectionMemory::from_entries(["a", "b"]);
        m.persist(&path, 5).unwrap();
        let cp = ReflectionMemory::load_checkpoint(&path);
        assert_eq!(cp.global_reflection_memory, vec!["a", "b"]);
        assert_eq!(cp.last_index, Some(5));
        assert_eq!(ReflectionMemory::load(&path), m);
    }

    /// **Scenario**: checkpoint {["a","b"], 5} merged with ["b","c"] gives ["a","b","c"].
    #[test]
    fn resume_from_checkpoint_then_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.json");
        std::fs::write(
            &path,
            r#"{"global_reflection_memory": ["a", "b"], "last_index": 5}"#,
        )
        .unwrap();
        let mut m = ReflectionMemory::load(&path);
        m.merge(["b", "c"]);
        assert_eq!(m.entries(), ["a", "b", "c"]);
    }
}
