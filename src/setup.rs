//! `import` command: gather settings, check the connection, run the loop.
//!
//! Every value follows the same precedence: explicit flag, then a saved value
//! the operator agrees to reuse, then an interactive prompt. Unattended runs
//! reuse saved values without asking and fail when nothing is available.
use crate::catalog::{AddOptions, Catalog};
use crate::cli::{ImportArgs, DEFAULT_RADARR_URL};
use crate::config::ImportConfig;
use crate::confirm::ConfirmationMode;
use crate::engine::{ImportRun, RunEnd};
use crate::logging;
use crate::parse::load_input;
use crate::paths::{ensure_work_dir, RunPaths};
use crate::prompt::{Choice, LinePrompter, Operator};
use crate::radarr::{QualityProfile, RadarrClient, RootFolder};
use crate::report::{DryRunSink, LiveSink, ReportSink};
use crate::resume::ResumeStore;
use crate::settings::{SavedSettings, SettingsStore};
use crate::signal;
use crate::util::{mask_key, normalize_url};
use anyhow::{anyhow, Context, Result};
use std::io::IsTerminal;
use std::time::Duration;

pub fn run_import(args: &ImportArgs) -> Result<RunEnd> {
    let paths = RunPaths::new(ensure_work_dir(&args.work_dir)?);
    logging::init(Some(&paths.log_path()), args.verbose)?;
    tracing::debug!(work_dir = %paths.root().display(), "run files located");

    let mut operator = if !args.non_interactive && std::io::stdin().is_terminal() {
        Operator::interactive(Box::new(LinePrompter::terminal()))
    } else {
        Operator::unattended()
    };
    let mode = confirmation_mode(args, &operator)?;

    let settings_store = SettingsStore::new(paths.settings_path(args.settings.as_deref()));
    let mut saved = settings_store.load().unwrap_or_default();

    let url = resolve_url(args.url.as_deref(), &saved, &mut operator)?;
    let api_key = resolve_api_key(args.api_key.as_deref(), &saved, &mut operator)?;
    log_run_header(args, mode, &url, &api_key);

    let client = RadarrClient::new(&url, &api_key);
    tracing::info!("running pre-flight checks");
    let status = client.system_status().context("Radarr connection failed")?;
    tracing::info!(
        version = status.version.as_deref().unwrap_or("?"),
        os = status.os_name.as_deref().unwrap_or("?"),
        "connected to Radarr"
    );

    let placement = resolve_placement(args, &saved, &client, &mut operator)?;
    let (monitored, search_on_add) = resolve_add_behavior(args, &mut operator)?;
    tracing::info!(monitored, search_on_add, "add behavior selected");

    saved.radarr_url = Some(url.clone());
    saved.api_key = Some(api_key);
    saved.root_folder = Some(placement.root_folder.clone());
    saved.quality_profile_id = Some(placement.quality_profile_id);
    if placement.quality_profile_name.is_some() {
        saved.quality_profile_name = placement.quality_profile_name.clone();
    }
    if let Err(err) = settings_store.save(&saved) {
        tracing::warn!(
            path = %settings_store.path().display(),
            error = %err,
            "could not save settings"
        );
    }

    let config = ImportConfig {
        url,
        input_file: args.file.clone(),
        add: AddOptions {
            root_folder: placement.root_folder,
            quality_profile_id: placement.quality_profile_id,
            monitored,
            search_on_add,
        },
        quality_profile_name: placement.quality_profile_name,
        dry_run: args.dry_run,
        mode,
        yes_all: args.yes_all,
        max_add: args.max_add.and_then(|limit| usize::try_from(limit).ok()),
        pause_on_issues: !args.no_pause_on_issues,
        delay: Duration::from_millis(args.delay_ms),
    };

    let input = load_input(&config.input_file)?;
    let mut store = ResumeStore::new(paths.state_path());
    let start = store.load().next_index;
    if start > 0 {
        tracing::info!(
            line = start + 1,
            total = input.line_count(),
            state = %store.path().display(),
            "resuming"
        );
    }

    tracing::info!("fetching existing Radarr movies for duplicate detection");
    let library = client
        .library_snapshot()
        .context("Failed to read existing Radarr library")?;
    tracing::info!(count = library.len(), "library loaded");
    tracing::info!(
        run = config.run_label(),
        lines = input.line_count(),
        "starting import"
    );

    let mut sink: Box<dyn ReportSink + '_> = if config.dry_run {
        Box::new(DryRunSink::open(
            &config,
            &paths.dryrun_entries_path(),
            &paths.dryrun_report_path(),
            start,
        )?)
    } else {
        Box::new(LiveSink::open(&client, &config, &paths.history_path(), start)?)
    };

    if let Err(err) = signal::install() {
        tracing::warn!(error = %err, "Ctrl-C handler not installed");
    }
    let mut run = ImportRun::new(
        &client,
        &library,
        sink.as_mut(),
        &mut store,
        &mut operator,
        config.policy(),
    )
    .with_pause_on_issues(config.pause_on_issues)
    .with_delay(config.delay)
    .with_interrupt_check(signal::interrupted);
    let end = run.run(&input, start)?;
    let processed = run.summary().processed;
    let successful_adds = run.policy().successful_adds();
    let final_mode = run.policy().mode().as_str();
    match end {
        RunEnd::Completed => {
            tracing::info!(processed, successful_adds, mode = final_mode, "import complete")
        }
        RunEnd::Interrupted => tracing::warn!("import interrupted; rerun to resume"),
        RunEnd::OperatorQuit => tracing::warn!("import stopped by operator; rerun to resume"),
    }
    Ok(end)
}

fn confirmation_mode(args: &ImportArgs, operator: &Operator) -> Result<ConfirmationMode> {
    if args.auto_add {
        return Ok(ConfirmationMode::AutoAdd);
    }
    if !operator.is_interactive() {
        return Err(anyhow!(
            "per-movie confirmation needs an interactive terminal; pass --auto-add"
        ));
    }
    Ok(ConfirmationMode::Manual)
}

fn log_run_header(args: &ImportArgs, mode: ConfirmationMode, url: &str, api_key: &str) {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        run = if args.dry_run { "DRY-RUN" } else { "LIVE" },
        url,
        api_key = %mask_key(api_key),
        input = %args.file.display(),
        confirmation = mode.as_str(),
        yes_all = args.yes_all,
        max_add = ?args.max_add,
        "radarr-flat-import starting"
    );
}

fn reuse(operator: &mut Operator, question: &str) -> Result<bool> {
    match operator.prompter() {
        Some(prompter) => Ok(prompter.confirm(question, true)?),
        None => Ok(true),
    }
}

pub(crate) fn resolve_url(
    flag: Option<&str>,
    saved: &SavedSettings,
    operator: &mut Operator,
) -> Result<String> {
    if let Some(url) = flag {
        return normalize_url(url);
    }
    if let Some(saved_url) = saved.radarr_url.as_deref().filter(|url| !url.is_empty()) {
        if reuse(operator, &format!("Reuse saved Radarr URL ({saved_url})?"))? {
            return normalize_url(saved_url);
        }
    }
    match operator.prompter() {
        Some(prompter) => {
            let url = prompter.input("Enter Radarr URL", DEFAULT_RADARR_URL)?;
            normalize_url(&url)
        }
        None => normalize_url(DEFAULT_RADARR_URL),
    }
}

pub(crate) fn resolve_api_key(
    flag: Option<&str>,
    saved: &SavedSettings,
    operator: &mut Operator,
) -> Result<String> {
    let key = match flag {
        Some(key) => key.trim().to_string(),
        None => {
            let saved_key = saved.api_key.as_deref().map(str::trim).unwrap_or_default();
            if !saved_key.is_empty()
                && reuse(
                    operator,
                    &format!("Reuse saved API key ({})?", mask_key(saved_key)),
                )?
            {
                saved_key.to_string()
            } else {
                match operator.prompter() {
                    Some(prompter) => prompter
                        .secret("Enter Radarr API key (input hidden)")?
                        .trim()
                        .to_string(),
                    None => {
                        return Err(anyhow!(
                            "no API key available; pass --api-key or set RADARR_API_KEY"
                        ))
                    }
                }
            }
        }
    };
    if key.is_empty() {
        return Err(anyhow!("API key cannot be empty"));
    }
    Ok(key)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Placement {
    pub root_folder: String,
    pub quality_profile_id: i64,
    pub quality_profile_name: Option<String>,
}

/// Lists the interactive selection needs; the HTTP client is one source.
pub(crate) trait PlacementSource {
    fn root_folders(&self) -> Result<Vec<RootFolder>>;
    fn quality_profiles(&self) -> Result<Vec<QualityProfile>>;
}

impl PlacementSource for RadarrClient {
    fn root_folders(&self) -> Result<Vec<RootFolder>> {
        RadarrClient::root_folders(self).context("list root folders")
    }

    fn quality_profiles(&self) -> Result<Vec<QualityProfile>> {
        RadarrClient::quality_profiles(self).context("list quality profiles")
    }
}

pub(crate) fn resolve_placement(
    args: &ImportArgs,
    saved: &SavedSettings,
    source: &dyn PlacementSource,
    operator: &mut Operator,
) -> Result<Placement> {
    if let (Some(root), Some(id)) = (&args.root_folder, args.quality_profile_id) {
        return Ok(Placement {
            root_folder: root.clone(),
            quality_profile_id: id,
            quality_profile_name: profile_name(source, id),
        });
    }

    if let Some((root, id, name)) = saved.root_and_profile() {
        let question = format!("Reuse Root Folder {root} and Quality Profile {name} (id={id})?");
        if reuse(operator, &question)? {
            tracing::info!(root, profile = name, id, "reusing saved root folder and profile");
            let id = args.quality_profile_id.unwrap_or(id);
            return Ok(Placement {
                root_folder: args.root_folder.clone().unwrap_or_else(|| root.to_string()),
                quality_profile_id: id,
                quality_profile_name: if args.quality_profile_id.is_some() {
                    profile_name(source, id)
                } else {
                    Some(name.to_string())
                },
            });
        }
    }

    let root_folder = match &args.root_folder {
        Some(root) => root.clone(),
        None => select_root_folder(source, operator)?,
    };
    let (quality_profile_id, quality_profile_name) = match args.quality_profile_id {
        Some(id) => (id, profile_name(source, id)),
        None => select_quality_profile(source, operator)?,
    };
    tracing::info!(
        root = root_folder.as_str(),
        profile = quality_profile_name.as_deref().unwrap_or("?"),
        id = quality_profile_id,
        "root folder and quality profile selected"
    );
    Ok(Placement {
        root_folder,
        quality_profile_id,
        quality_profile_name,
    })
}

fn profile_name(source: &dyn PlacementSource, id: i64) -> Option<String> {
    match source.quality_profiles() {
        Ok(profiles) => profiles
            .into_iter()
            .find(|profile| profile.id == Some(id))
            .and_then(|profile| profile.name),
        Err(err) => {
            tracing::debug!(error = %err, "could not resolve quality profile name");
            None
        }
    }
}

fn select_root_folder(source: &dyn PlacementSource, operator: &mut Operator) -> Result<String> {
    let Some(prompter) = operator.prompter() else {
        return Err(anyhow!("no root folder available; pass --root-folder"));
    };
    let roots: Vec<RootFolder> = source
        .root_folders()?
        .into_iter()
        .filter(|root| root.path.as_deref().is_some_and(|path| !path.is_empty()))
        .collect();
    if roots.is_empty() {
        return Err(anyhow!("Radarr returned no root folders"));
    }
    let options: Vec<String> = roots
        .iter()
        .map(|root| {
            let free = root
                .free_space
                .map(|bytes| bytes.to_string())
                .unwrap_or_else(|| "?".to_string());
            format!(
                "{} (freeSpace={free})",
                root.path.as_deref().unwrap_or_default()
            )
        })
        .collect();
    match prompter.choose("Root Folder:", &options)? {
        Choice::Pick(index) => roots
            .get(index)
            .and_then(|root| root.path.clone())
            .ok_or_else(|| anyhow!("invalid root folder selection")),
        Choice::Skip | Choice::Quit => Err(anyhow!("root folder selection cancelled")),
    }
}

fn select_quality_profile(
    source: &dyn PlacementSource,
    operator: &mut Operator,
) -> Result<(i64, Option<String>)> {
    let Some(prompter) = operator.prompter() else {
        return Err(anyhow!(
            "no quality profile available; pass --quality-profile-id"
        ));
    };
    let profiles: Vec<QualityProfile> = source
        .quality_profiles()?
        .into_iter()
        .filter(|profile| profile.id.is_some())
        .collect();
    if profiles.is_empty() {
        return Err(anyhow!("Radarr returned no quality profiles"));
    }
    let options: Vec<String> = profiles
        .iter()
        .map(|profile| {
            format!(
                "{} (id={})",
                profile.name.as_deref().unwrap_or("?"),
                profile.id.unwrap_or_default()
            )
        })
        .collect();
    match prompter.choose("Quality Profile:", &options)? {
        Choice::Pick(index) => profiles
            .get(index)
            .and_then(|profile| profile.id.map(|id| (id, profile.name.clone())))
            .ok_or_else(|| anyhow!("invalid quality profile selection")),
        Choice::Skip | Choice::Quit => Err(anyhow!("quality profile selection cancelled")),
    }
}

/// `(monitored, search_on_add)`; both default to yes.
pub(crate) fn resolve_add_behavior(
    args: &ImportArgs,
    operator: &mut Operator,
) -> Result<(bool, bool)> {
    let monitored = match (args.monitored, operator.prompter()) {
        (Some(value), _) => value,
        (None, Some(prompter)) => prompter.confirm("Set movies as Monitored?", true)?,
        (None, None) => true,
    };
    let search_on_add = match (args.search_on_add, operator.prompter()) {
        (Some(value), _) => value,
        (None, Some(prompter)) => prompter.confirm("Automatically search when added?", true)?,
        (None, None) => true,
    };
    Ok((monitored, search_on_add))
}

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;
