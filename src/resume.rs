//! Durable resume cursor.
//!
//! The state file holds `{"next_index": N}`: every line with index below `N`
//! has been fully processed. Older files wrote `last_index` with the same
//! meaning; it is read when `next_index` is missing.
use crate::error::{ConfigError, ResumeStoreError};
use crate::util::write_atomic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunState {
    pub next_index: usize,
}

#[derive(Deserialize)]
struct StoredState {
    next_index: Option<usize>,
    last_index: Option<usize>,
}

/// Records that every line up to and including an index is done.
///
/// Callers advance only after the line's side effect is durable; a failed
/// advance must stop the run.
pub trait ProgressCursor {
    fn advance(&mut self, line_index: usize) -> Result<(), ResumeStoreError>;

    /// Mark the whole input done; `total_lines` counts blanks and comments.
    fn complete(&mut self, total_lines: usize) -> Result<(), ResumeStoreError>;
}

#[derive(Debug, Clone)]
pub struct ResumeStore {
    path: PathBuf,
}

impl ResumeStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no state file exists yet.
    pub fn try_load(&self) -> Result<Option<RunState>, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let stored: StoredState =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        let next_index = stored.next_index.or(stored.last_index).unwrap_or_default();
        Ok(Some(RunState { next_index }))
    }

    /// Absent or unreadable state starts from the top.
    pub fn load(&self) -> RunState {
        match self.try_load() {
            Ok(state) => state.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable resume state");
                RunState::default()
            }
        }
    }

    fn store(&self, state: RunState) -> Result<(), ResumeStoreError> {
        let mut bytes = serde_json::to_vec_pretty(&state)?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes).map_err(|source| ResumeStoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl ProgressCursor for ResumeStore {
    fn advance(&mut self, line_index: usize) -> Result<(), ResumeStoreError> {
        self.store(RunState {
            next_index: line_index + 1,
        })
    }

    fn complete(&mut self, total_lines: usize) -> Result<(), ResumeStoreError> {
        self.store(RunState {
            next_index: total_lines,
        })
    }
}
