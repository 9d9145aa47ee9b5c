//! `clean` command: remove run artifacts and/or saved settings.
use crate::cli::CleanArgs;
use crate::paths::RunPaths;
use crate::prompt::Operator;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Typed by the operator to confirm deleting saved settings.
pub const WIPE_TOKEN: &str = "WIPE";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub deleted: Vec<PathBuf>,
    pub not_deleted: Vec<PathBuf>,
}

pub fn run_clean(args: &CleanArgs, operator: &mut Operator, out: &mut dyn Write) -> Result<()> {
    let paths = RunPaths::new(args.work_dir.clone());
    let mut targets = Vec::new();
    if args.clean_run_files() {
        targets.extend(paths.run_files());
    }
    if args.clean_config() {
        targets.push(paths.settings_path(args.settings.as_deref()));
    }
    if targets.is_empty() {
        return Err(anyhow!(
            "nothing to clean; pass --run-files, --wipe-config or --nuke"
        ));
    }

    if !args.force {
        let Some(prompter) = operator.prompter() else {
            return Err(anyhow!("clean needs confirmation; pass --force to skip it"));
        };
        if args.clean_config() {
            writeln!(
                out,
                "WARNING: this permanently deletes the saved Radarr URL, API key, \
                 root folder and quality profile."
            )?;
            let token = prompter.input(
                &format!("Type {WIPE_TOKEN} to confirm, or anything else to cancel"),
                "",
            )?;
            if token != WIPE_TOKEN {
                writeln!(out, "Config wipe cancelled.")?;
                return Ok(());
            }
        }
        writeln!(out, "The following files may be deleted:")?;
        for target in &targets {
            writeln!(out, "  - {}", target.display())?;
        }
        if !prompter.confirm("Proceed with deletion?", false)? {
            writeln!(out, "Cleanup cancelled.")?;
            return Ok(());
        }
    }

    let report = delete_all(&targets)?;
    if !report.deleted.is_empty() {
        writeln!(out, "Deleted:")?;
        for path in &report.deleted {
            writeln!(out, "  - {}", path.display())?;
        }
    }
    if !report.not_deleted.is_empty() {
        writeln!(out, "Not deleted (missing):")?;
        for path in &report.not_deleted {
            writeln!(out, "  - {}", path.display())?;
        }
    }
    tracing::info!(
        deleted = report.deleted.len(),
        missing = report.not_deleted.len(),
        "cleanup finished"
    );
    Ok(())
}

fn delete_all(targets: &[PathBuf]) -> Result<CleanReport> {
    let mut report = CleanReport::default();
    for target in targets {
        match fs::remove_file(target) {
            Ok(()) => report.deleted.push(target.clone()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                report.not_deleted.push(target.clone())
            }
            Err(err) => {
                return Err(err).with_context(|| format!("delete {}", target.display()));
            }
        }
    }
    Ok(report)
}
