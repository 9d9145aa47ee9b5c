use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;

mod catalog;
mod clean;
mod cli;
mod config;
mod confirm;
mod engine;
mod error;
mod logging;
mod parse;
mod paths;
mod prompt;
mod radarr;
mod report;
mod resolve;
mod resume;
mod settings;
mod setup;
mod signal;
mod util;

use cli::{Command, RootArgs};
use engine::RunEnd;
use prompt::{LinePrompter, Operator};

const NOTES: &str = "\
radarr-import: reconcile a flat list of movie titles against Radarr.

- One title per line; a trailing \"(YYYY)\" is a strict year filter.
- Blank lines and lines starting with # are ignored but keep their index.
- Movies already in the library (by TMDb id) are skipped as duplicates.
- Several matches are never guessed: pick one, or the line is skipped.
- Progress is saved after every line; rerun the same command to resume.
- --dry-run writes a JSONL decision log and an exportable text report.
- --auto-add, --yes-all and --max-add control confirmation and volume.
- Interactive runs ask to continue after a miss, an error or a skipped
  ambiguity; --no-pause-on-issues turns that off.
- clean --run-files / --wipe-config / --nuke remove previous run files.";

fn main() -> Result<()> {
    let args = RootArgs::parse();

    match args.command {
        Command::Import(args) => {
            if setup::run_import(&args)? == RunEnd::Interrupted {
                std::process::exit(signal::INTERRUPTED_EXIT_CODE);
            }
            Ok(())
        }
        Command::Clean(args) => {
            let mut operator = if std::io::stdin().is_terminal() {
                Operator::interactive(Box::new(LinePrompter::terminal()))
            } else {
                Operator::unattended()
            };
            clean::run_clean(&args, &mut operator, &mut std::io::stdout())
        }
        Command::Notes => {
            println!("{NOTES}");
            Ok(())
        }
    }
}
