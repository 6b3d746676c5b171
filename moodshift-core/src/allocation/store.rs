//! Caller-owned persistence for allocation state and evaluation history.
//!
//! `StateStore` keeps one `AllocationState` as pretty JSON. Writes go to a
//! sibling temp file that is then renamed over the target, so a crash never
//! leaves a half-written state behind. A persisted state that violates the
//! bucket invariant is rejected on load, never repaired.
//!
//! `EvaluationJournal` is append-only JSONL: one `Evaluation` per line.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::state::{AllocationState, InvariantViolation};
use crate::evaluation::Evaluation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed state file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("state in {path} violates an allocation invariant: {source}")]
    Invariant {
        path: PathBuf,
        #[source]
        source: InvariantViolation,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// JSON file holding the current allocation state.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted state; a missing file yields the initial state.
    pub fn load(&self) -> Result<AllocationState, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.path.display(),
                    "no state file, starting fully defensive"
                );
                return Ok(AllocationState::initial());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let state: AllocationState =
            serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        state.validate().map_err(|source| StoreError::Invariant {
            path: self.path.clone(),
            source,
        })?;

        Ok(state)
    }

    /// Persist `state`, replacing whatever was stored.
    pub fn save(&self, state: &AllocationState) -> Result<(), StoreError> {
        state.validate().map_err(|source| StoreError::Invariant {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    /// Overwrite the stored state with the initial state.
    pub fn reset(&self) -> Result<AllocationState, StoreError> {
        let initial = AllocationState::initial();
        self.save(&initial)?;
        Ok(initial)
    }
}

/// Append-only JSONL log of evaluations.
#[derive(Debug, Clone)]
pub struct EvaluationJournal {
    path: PathBuf,
}

impl EvaluationJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, evaluation: &Evaluation) -> Result<(), StoreError> {
        let json = serde_json::to_string(evaluation)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;

        writeln!(file, "{json}").map_err(|e| StoreError::io(&self.path, e))?;
        file.flush().map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    /// Read every entry, oldest first. Malformed lines are skipped.
    pub fn read_all(&self) -> Result<Vec<Evaluation>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let mut entries = Vec::new();
        for (lineno, line) in io::BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StoreError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Evaluation>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        error = %e,
                        "skipping malformed journal line"
                    );
                }
            }
        }

        Ok(entries)
    }

    /// The most recent `limit` entries, oldest first.
    pub fn tail(&self, limit: usize) -> Result<Vec<Evaluation>, StoreError> {
        let mut entries = self.read_all()?;
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CalendarMonth, IndicatorSnapshot};
    use crate::evaluation::evaluate;
    use chrono::NaiveDate;

    fn noon(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn missing_file_loads_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(!store.exists());
        assert_eq!(store.load().unwrap(), AllocationState::initial());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));
        let state = AllocationState {
            bucket_a_pct: 85.0,
            bucket_b_pct: 15.0,
            month_counter: 2,
            last_triggered_month: CalendarMonth::new(4),
        };
        store.save(&state).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), state);
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[test]
    fn corrupt_sum_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{"bucket_a_pct":90.0,"bucket_b_pct":20.0,"month_counter":1,"last_triggered_month":3}"#,
        )
        .unwrap();
        let err = StateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Invariant { .. }), "got {err}");
    }

    #[test]
    fn out_of_range_month_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{"bucket_a_pct":100.0,"bucket_b_pct":0.0,"month_counter":0,"last_triggered_month":13}"#,
        )
        .unwrap();
        let err = StateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }), "got {err}");
    }

    #[test]
    fn save_refuses_invalid_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let bad = AllocationState {
            bucket_b_pct: 10.0,
            ..AllocationState::initial()
        };
        assert!(store.save(&bad).is_err());
        assert!(!store.exists());
    }

    #[test]
    fn reset_restores_initial() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store
            .save(&AllocationState {
                bucket_a_pct: 50.0,
                bucket_b_pct: 50.0,
                month_counter: 4,
                last_triggered_month: CalendarMonth::new(8),
            })
            .unwrap();
        store.reset().unwrap();
        assert_eq!(store.load().unwrap(), AllocationState::initial());
    }

    #[test]
    fn journal_append_and_tail() {
        let dir = tempfile::tempdir().unwrap();
        let journal = EvaluationJournal::new(dir.path().join("journal.jsonl"));
        assert!(journal.read_all().unwrap().is_empty());

        let below = IndicatorSnapshot {
            price: Some(90.0),
            moving_average: Some(100.0),
            ..IndicatorSnapshot::unknown()
        };
        let mut state = AllocationState::initial();
        for m in 1..=3 {
            let eval = evaluate(&state, &below, noon(2024, m, 1));
            journal.append(&eval).unwrap();
            state = eval.state;
        }

        let all = journal.read_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].state.month_counter, 3);

        let last_two = journal.tail(2).unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].state.month_counter, 2);
    }

    #[test]
    fn journal_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let journal = EvaluationJournal::new(&path);
        let eval = evaluate(
            &AllocationState::initial(),
            &IndicatorSnapshot::unknown(),
            noon(2024, 1, 2),
        );
        journal.append(&eval).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
        drop(file);
        journal.append(&eval).unwrap();

        assert_eq!(journal.read_all().unwrap().len(), 2);
    }
}
