//! CLI argument parsing.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Radarr's default local address, offered when nothing is saved.
pub const DEFAULT_RADARR_URL: &str = "http://127.0.0.1:7878";

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "radarr-import",
    version,
    about = "Resumable flat-list movie importer for Radarr",
    after_help = "Commands:\n  import --file movies.txt   Reconcile a list against Radarr (resumable)\n  clean --run-files          Delete log, state and reports from previous runs\n  notes                      Show feature notes",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Import(ImportArgs),
    Clean(CleanArgs),
    /// Print a summary of features and run files
    Notes,
}

#[derive(Parser, Debug)]
#[command(about = "Import a flat list of movie titles into Radarr")]
pub struct ImportArgs {
    /// Input list: one title per line, optional trailing "(YYYY)"
    #[arg(long, value_name = "PATH", default_value = "movies.txt")]
    pub file: PathBuf,

    /// Radarr base URL (skips the URL prompt)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Radarr API key (skips the key prompt)
    #[arg(long, value_name = "KEY", env = "RADARR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Root folder path for added movies (skips selection)
    #[arg(long, value_name = "PATH")]
    pub root_folder: Option<String>,

    /// Quality profile id for added movies (skips selection)
    #[arg(long, value_name = "ID")]
    pub quality_profile_id: Option<i64>,

    /// Add movies as monitored (skips the prompt)
    #[arg(long, value_name = "BOOL")]
    pub monitored: Option<bool>,

    /// Search for movies when added (skips the prompt)
    #[arg(long, value_name = "BOOL")]
    pub search_on_add: Option<bool>,

    /// Simulate adds and write an exportable report instead
    #[arg(long, alias = "dryrun")]
    pub dry_run: bool,

    /// Add without per-movie confirmation
    #[arg(long)]
    pub auto_add: bool,

    /// First "yes" at a confirmation applies to the rest of the run
    #[arg(long, conflicts_with = "auto_add")]
    pub yes_all: bool,

    /// Stop adding after N successful adds
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_add: Option<u64>,

    /// Do not ask whether to continue after a miss, error or skipped ambiguity
    #[arg(long)]
    pub no_pause_on_issues: bool,

    /// Never prompt, even on a terminal
    #[arg(long)]
    pub non_interactive: bool,

    /// Directory for the log, resume state and reports
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Saved settings file
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Pause between lines in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 250)]
    pub delay_ms: u64,

    /// Debug-level logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Delete files from previous runs and/or saved settings")]
pub struct CleanArgs {
    /// Delete the log, resume state and reports
    #[arg(long)]
    pub run_files: bool,

    /// Delete saved URL, API key, root folder and quality profile
    #[arg(long)]
    pub wipe_config: bool,

    /// Both --run-files and --wipe-config
    #[arg(long)]
    pub nuke: bool,

    /// Skip confirmations
    #[arg(long)]
    pub force: bool,

    /// Directory holding the run files
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Saved settings file
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

impl CleanArgs {
    pub fn clean_run_files(&self) -> bool {
        self.run_files || self.nuke
    }

    pub fn clean_config(&self) -> bool {
        self.wipe_config || self.nuke
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn import_defaults() {
        let args = RootArgs::try_parse_from(["radarr-import", "import"]).expect("parse");
        let Command::Import(import) = args.command else {
            panic!("expected import");
        };
        assert_eq!(import.file, PathBuf::from("movies.txt"));
        assert_eq!(import.delay_ms, 250);
        assert!(!import.dry_run);
        assert!(!import.no_pause_on_issues);
        assert!(import.max_add.is_none());
    }

    #[test]
    fn max_add_must_be_positive() {
        assert!(
            RootArgs::try_parse_from(["radarr-import", "import", "--max-add", "0"]).is_err()
        );
        let args = RootArgs::try_parse_from([
            "radarr-import",
            "import",
            "--max-add",
            "3",
            "--monitored",
            "false",
            "--dryrun",
        ])
        .expect("parse");
        let Command::Import(import) = args.command else {
            panic!("expected import");
        };
        assert_eq!(import.max_add, Some(3));
        assert_eq!(import.monitored, Some(false));
        assert!(import.dry_run);
    }

    #[test]
    fn nuke_implies_both() {
        let args =
            RootArgs::try_parse_from(["radarr-import", "clean", "--nuke"]).expect("parse");
        let Command::Clean(clean) = args.command else {
            panic!("expected clean");
        };
        assert!(clean.clean_run_files());
        assert!(clean.clean_config());
    }
}
