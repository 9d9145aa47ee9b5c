//! Typed paths for run artifacts.
//!
//! Every file an import run reads or writes is derived here so `import` and
//! `clean` always agree on the layout.
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const LOG_FILE: &str = "radarr_flat_import.log";
pub const STATE_FILE: &str = "radarr_flat_import.state.json";
pub const DRYRUN_ENTRIES_FILE: &str = "radarr_flat_import.dryrun.jsonl";
pub const DRYRUN_REPORT_FILE: &str = "radarr_flat_import.dryrun.txt";
pub const HISTORY_FILE: &str = "radarr_flat_import.history.jsonl";
pub const SETTINGS_FILE: &str = "radarr_flat_import.last_settings.json";

const SETTINGS_APP_DIR: &str = "radarr-flat-import";

/// Convenience wrapper for locating run artifacts under a work directory.
#[derive(Debug, Clone)]
pub struct RunPaths {
    root: PathBuf,
}

impl RunPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    /// Return the per-record dry-run entries path (JSONL, processing order).
    pub fn dryrun_entries_path(&self) -> PathBuf {
        self.root.join(DRYRUN_ENTRIES_FILE)
    }

    /// Return the exportable dry-run text report path.
    pub fn dryrun_report_path(&self) -> PathBuf {
        self.root.join(DRYRUN_REPORT_FILE)
    }

    /// Return the live-run outcome history path (JSONL).
    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }

    /// Files produced by runs, removed by `clean --run-files`.
    pub fn run_files(&self) -> Vec<PathBuf> {
        vec![
            self.log_path(),
            self.state_path(),
            self.dryrun_entries_path(),
            self.dryrun_report_path(),
            self.history_path(),
        ]
    }

    /// Resolve the persisted settings path, preferring an explicit override.
    ///
    /// Without an override the user config dir is used so credentials do not
    /// land next to the movie list; the work dir is the fallback.
    pub fn settings_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        dirs::config_dir()
            .map(|dir| dir.join(SETTINGS_APP_DIR).join(SETTINGS_FILE))
            .unwrap_or_else(|| self.root.join(SETTINGS_FILE))
    }
}

pub fn ensure_work_dir(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).with_context(|| format!("create work dir {}", path.display()))?;
    path.canonicalize()
        .with_context(|| format!("resolve work dir {}", path.display()))
}
