//! Resolved configuration for one import run.
//!
//! Built once during setup from flags, saved settings and prompts, then
//! passed by reference to the pieces that need it.
use crate::catalog::AddOptions;
use crate::confirm::{ConfirmationMode, ConfirmationPolicy};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub url: String,
    pub input_file: PathBuf,
    pub add: AddOptions,
    pub quality_profile_name: Option<String>,
    pub dry_run: bool,
    pub mode: ConfirmationMode,
    pub yes_all: bool,
    pub max_add: Option<usize>,
    pub pause_on_issues: bool,
    pub delay: Duration,
}

impl ImportConfig {
    /// Fresh policy for a run; counters start at zero.
    pub fn policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy::new(self.mode, self.max_add).with_sticky_first_yes(self.yes_all)
    }

    pub fn run_label(&self) -> &'static str {
        if self.dry_run {
            "DRY-RUN"
        } else {
            "LIVE"
        }
    }

    /// `monitored=.., search_on_add=..`, as shown in logs and reports.
    pub fn add_behavior(&self) -> String {
        format!(
            "monitored={}, search_on_add={}",
            self.add.monitored, self.add.search_on_add
        )
    }

    pub fn quality_profile_label(&self) -> String {
        match &self.quality_profile_name {
            Some(name) => format!("{} ({name})", self.add.quality_profile_id),
            None => self.add.quality_profile_id.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ImportConfig {
    ImportConfig {
        url: "http://radarr.test:7878".to_string(),
        input_file: PathBuf::from("movies.txt"),
        add: AddOptions {
            root_folder: "/movies".to_string(),
            quality_profile_id: 4,
            monitored: true,
            search_on_add: false,
        },
        quality_profile_name: Some("HD-1080p".to_string()),
        dry_run: true,
        mode: ConfirmationMode::AutoAdd,
        yes_all: false,
        max_add: None,
        pause_on_issues: false,
        delay: Duration::ZERO,
    }
}
