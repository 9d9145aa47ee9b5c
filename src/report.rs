//! Recording per-line outcomes.
//!
//! `DryRunSink` simulates adds and keeps an exportable report; `LiveSink`
//! performs the add against the catalog and keeps a history. Both append one
//! JSON line per processed record and flush it before returning, so the
//! caller may advance the resume cursor as soon as `record` succeeds.
//!
//! A line recorded just before a crash is recorded again on resume. Opening a
//! sink at a nonzero start drops the trailing entries at or past that index,
//! so each line keeps a single entry.
use crate::catalog::{CandidateMovie, Catalog, CatalogId};
use crate::config::ImportConfig;
use crate::error::{AddError, LookupError, ReportError};
use crate::parse::InputRecord;
use crate::resolve::{Decision, DecisionKind};
use crate::util::{now_epoch_ms, write_atomic};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Duplicate(CatalogId),
    NoMatch,
    Declined,
    CapReached,
    AmbiguousSkipped,
}

impl SkipReason {
    pub fn describe(&self) -> String {
        match self {
            SkipReason::Duplicate(id) => format!("already in library (tmdb:{id})"),
            SkipReason::NoMatch => "no catalog match".to_string(),
            SkipReason::Declined => "declined by operator".to_string(),
            SkipReason::CapReached => "add cap reached".to_string(),
            SkipReason::AmbiguousSkipped => "ambiguous match not chosen".to_string(),
        }
    }
}

/// What the run decided to do with a record after confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Add(CandidateMovie),
    Skip(SkipReason),
    Failed(LookupError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Added(CandidateMovie),
    Simulated(CandidateMovie),
    AddFailed {
        candidate: CandidateMovie,
        error: AddError,
    },
    Skipped(SkipReason),
    LookupFailed(LookupError),
}

impl Outcome {
    /// Counts towards the add cap.
    pub fn is_successful_add(&self) -> bool {
        matches!(self, Outcome::Added(_) | Outcome::Simulated(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Added(_) => "added",
            Outcome::Simulated(_) => "would_add",
            Outcome::AddFailed { .. } => "add_failed",
            Outcome::Skipped(_) => "skipped",
            Outcome::LookupFailed(_) => "error",
        }
    }

    fn candidate(&self) -> Option<&CandidateMovie> {
        match self {
            Outcome::Added(candidate)
            | Outcome::Simulated(candidate)
            | Outcome::AddFailed { candidate, .. } => Some(candidate),
            Outcome::Skipped(_) | Outcome::LookupFailed(_) => None,
        }
    }

    fn reason(&self) -> String {
        match self {
            Outcome::Added(_) => "added to library".to_string(),
            Outcome::Simulated(_) => "would add".to_string(),
            Outcome::AddFailed { error, .. } => error.to_string(),
            Outcome::Skipped(reason) => reason.describe(),
            Outcome::LookupFailed(error) => error.to_string(),
        }
    }
}

/// One JSON line per processed record, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub line_index: usize,
    pub title: String,
    pub year: Option<i32>,
    pub decision_kind: DecisionKind,
    pub outcome: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<CatalogId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_year: Option<i32>,
}

impl ReportEntry {
    pub fn new(record: &InputRecord, decision: &Decision, outcome: &Outcome) -> Self {
        let candidate = outcome.candidate();
        let catalog_id = match (candidate, outcome) {
            (Some(candidate), _) => Some(candidate.catalog_id),
            (None, Outcome::Skipped(SkipReason::Duplicate(id))) => Some(*id),
            _ => None,
        };
        Self {
            line_index: record.line_index,
            title: record.title.clone(),
            year: record.year,
            decision_kind: decision.kind(),
            outcome: outcome.as_str().to_string(),
            reason: outcome.reason(),
            catalog_id,
            matched_title: candidate.map(|candidate| candidate.title.clone()),
            matched_year: candidate.map(|candidate| candidate.year),
        }
    }
}

pub trait ReportSink {
    /// Execute (or simulate) the verdict and durably record the outcome.
    fn record(
        &mut self,
        record: &InputRecord,
        decision: &Decision,
        verdict: Verdict,
    ) -> Result<Outcome, ReportError>;

    /// Called once when the loop stops without a fatal error.
    fn finish(&mut self) -> Result<(), ReportError>;
}

/// Append-only JSONL file, flushed and synced after every entry.
#[derive(Debug)]
struct EntryLog {
    path: PathBuf,
    file: File,
}

impl EntryLog {
    fn open(path: &Path, truncate: bool) -> Result<Self, ReportError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options.open(path).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Open for appending after dropping the unadvanced tail (see module docs).
    fn resume(path: &Path, start: usize) -> Result<Self, ReportError> {
        trim_unadvanced_tail(path, start)?;
        Self::open(path, false)
    }

    fn append(&mut self, entry: &ReportEntry) -> Result<(), ReportError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        self.file
            .write_all(&line)
            .and_then(|()| self.file.flush())
            .and_then(|()| self.file.sync_data())
            .map_err(|source| ReportError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

/// Drop trailing entries with `line_index >= start`, and any torn last line.
fn trim_unadvanced_tail(path: &Path, start: usize) -> Result<(), ReportError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(ReportError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let mut lines: Vec<&str> = text.lines().collect();
    let total = lines.len();
    while let Some(last) = lines.last() {
        let committed = serde_json::from_str::<ReportEntry>(last)
            .is_ok_and(|entry| entry.line_index < start);
        if committed {
            break;
        }
        lines.pop();
    }
    let dropped = total - lines.len();
    if dropped == 0 {
        return Ok(());
    }
    let mut kept = lines.join("\n");
    if !kept.is_empty() {
        kept.push('\n');
    }
    write_atomic(path, kept.as_bytes()).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        dropped,
        start,
        "dropped entries past the resume cursor"
    );
    Ok(())
}

/// Read back entries written by either sink; unparsable lines are skipped.
pub fn read_entries(path: &Path) -> Result<Vec<ReportEntry>, ReportError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ReportError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping bad report line")
            }
        }
    }
    Ok(entries)
}

/// Never calls the catalog; every authorized add is reported as succeeded.
pub struct DryRunSink<'a> {
    config: &'a ImportConfig,
    entries: EntryLog,
    report_path: PathBuf,
}

impl<'a> DryRunSink<'a> {
    /// `start == 0` discards entries from a previous run; a resumed run keeps
    /// the entries before `start` so the final report covers the whole list.
    pub fn open(
        config: &'a ImportConfig,
        entries_path: &Path,
        report_path: &Path,
        start: usize,
    ) -> Result<Self, ReportError> {
        let entries = if start == 0 {
            EntryLog::open(entries_path, true)?
        } else {
            EntryLog::resume(entries_path, start)?
        };
        Ok(Self {
            config,
            entries,
            report_path: report_path.to_path_buf(),
        })
    }

    pub fn render_report(&self, entries: &[ReportEntry]) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "radarr-flat-import v{} - DRY RUN REPORT\n",
            env!("CARGO_PKG_VERSION")
        ));
        out.push_str(&format!("Generated (epoch ms): {}\n", now_epoch_ms()));
        out.push_str(&format!("Radarr URL: {}\n", self.config.url));
        out.push_str(&format!(
            "Selected Root: {}\n",
            self.config.add.root_folder
        ));
        out.push_str(&format!(
            "Selected QualityProfile: {}\n",
            self.config.quality_profile_label()
        ));
        out.push_str(&format!("Add behavior: {}\n\n", self.config.add_behavior()));
        for entry in entries.iter().filter(|entry| entry.outcome == "would_add") {
            let title = entry.matched_title.as_deref().unwrap_or(&entry.title);
            let year = entry
                .matched_year
                .map(|year| year.to_string())
                .unwrap_or_default();
            let id = entry.catalog_id.unwrap_or_default();
            out.push_str(&format!("{title} ({year}) | tmdb:{id}\n"));
        }
        out
    }
}

impl ReportSink for DryRunSink<'_> {
    fn record(
        &mut self,
        record: &InputRecord,
        decision: &Decision,
        verdict: Verdict,
    ) -> Result<Outcome, ReportError> {
        let outcome = match verdict {
            Verdict::Add(candidate) => Outcome::Simulated(candidate),
            Verdict::Skip(reason) => Outcome::Skipped(reason),
            Verdict::Failed(error) => Outcome::LookupFailed(error),
        };
        self.entries
            .append(&ReportEntry::new(record, decision, &outcome))?;
        Ok(outcome)
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        let entries = read_entries(&self.entries.path)?;
        let text = self.render_report(&entries);
        write_atomic(&self.report_path, text.as_bytes()).map_err(|source| {
            ReportError::Write {
                path: self.report_path.clone(),
                source,
            }
        })?;
        tracing::info!(path = %self.report_path.display(), "dry-run report written");
        Ok(())
    }
}

/// Performs authorized adds and appends every outcome to the history file.
pub struct LiveSink<'a> {
    catalog: &'a dyn Catalog,
    config: &'a ImportConfig,
    history: EntryLog,
}

impl<'a> LiveSink<'a> {
    /// The history spans runs, so a run starting at 0 only appends.
    pub fn open(
        catalog: &'a dyn Catalog,
        config: &'a ImportConfig,
        history_path: &Path,
        start: usize,
    ) -> Result<Self, ReportError> {
        let history = if start == 0 {
            EntryLog::open(history_path, false)?
        } else {
            EntryLog::resume(history_path, start)?
        };
        Ok(Self {
            catalog,
            config,
            history,
        })
    }
}

impl ReportSink for LiveSink<'_> {
    fn record(
        &mut self,
        record: &InputRecord,
        decision: &Decision,
        verdict: Verdict,
    ) -> Result<Outcome, ReportError> {
        let outcome = match verdict {
            Verdict::Add(candidate) => match self.catalog.add_movie(&candidate, &self.config.add)
            {
                Ok(()) => Outcome::Added(candidate),
                Err(err) => Outcome::AddFailed {
                    candidate,
                    error: AddError(err),
                },
            },
            Verdict::Skip(reason) => Outcome::Skipped(reason),
            Verdict::Failed(error) => Outcome::LookupFailed(error),
        };
        self.history
            .append(&ReportEntry::new(record, decision, &outcome))?;
        Ok(outcome)
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        tracing::info!(path = %self.history.path.display(), "run history updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fake::FakeCatalog;
    use crate::config::test_config;
    use crate::error::CatalogError;
    use crate::parse::parse_line;
    use std::fs;
    use tempfile::tempdir;

    fn matrix() -> CandidateMovie {
        CandidateMovie::new(603, "The Matrix", 1999)
    }

    #[test]
    fn dry_run_records_simulated_add_and_renders_report() {
        let dir = tempdir().expect("tempdir");
        let entries_path = dir.path().join("entries.jsonl");
        let report_path = dir.path().join("report.txt");
        let config = test_config();
        let mut sink =
            DryRunSink::open(&config, &entries_path, &report_path, 0).expect("open");

        let record = parse_line(2, "The Matrix (1999)").expect("record");
        let decision = Decision::Add(matrix());
        let outcome = sink
            .record(&record, &decision, Verdict::Add(matrix()))
            .expect("record");
        assert_eq!(outcome, Outcome::Simulated(matrix()));
        assert!(outcome.is_successful_add());

        let dup = parse_line(3, "Heat").expect("record");
        sink.record(
            &dup,
            &Decision::SkipDuplicate(949),
            Verdict::Skip(SkipReason::Duplicate(949)),
        )
        .expect("record");

        let entries = read_entries(&entries_path).expect("entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line_index, 2);
        assert_eq!(entries[0].decision_kind, DecisionKind::Add);
        assert_eq!(entries[0].outcome, "would_add");
        assert_eq!(entries[0].catalog_id, Some(603));
        assert_eq!(entries[1].decision_kind, DecisionKind::SkipDuplicate);
        assert_eq!(entries[1].reason, "already in library (tmdb:949)");
        assert_eq!(entries[1].catalog_id, Some(949));

        sink.finish().expect("finish");
        let report = fs::read_to_string(&report_path).expect("report");
        assert!(report.contains("DRY RUN REPORT"));
        assert!(report.contains("Radarr URL: http://radarr.test:7878"));
        assert!(report.contains("Add behavior: monitored=true, search_on_add=false"));
        assert!(report.ends_with("The Matrix (1999) | tmdb:603\n"));
        assert!(!report.contains("tmdb:949"));
    }

    #[test]
    fn dry_run_entries_are_kept_on_resume_and_cleared_on_fresh_start() {
        let dir = tempdir().expect("tempdir");
        let entries_path = dir.path().join("entries.jsonl");
        let report_path = dir.path().join("report.txt");
        let config = test_config();

        for (start, line_index) in [(0, 0), (1, 1)] {
            let record = parse_line(line_index, "Nothing").expect("record");
            let mut sink =
                DryRunSink::open(&config, &entries_path, &report_path, start).expect("open");
            sink.record(
                &record,
                &Decision::SkipNoMatch,
                Verdict::Skip(SkipReason::NoMatch),
            )
            .expect("record");
        }
        assert_eq!(read_entries(&entries_path).expect("entries").len(), 2);

        DryRunSink::open(&config, &entries_path, &report_path, 0).expect("open");
        assert!(read_entries(&entries_path).expect("entries").is_empty());
    }

    #[test]
    fn live_add_success_and_rejection() {
        let dir = tempdir().expect("tempdir");
        let history_path = dir.path().join("history.jsonl");
        let mut config = test_config();
        config.dry_run = false;
        let rejected = CandidateMovie::new(11, "Dune", 2021);
        let catalog = FakeCatalog::default().rejecting_add(
            11,
            CatalogError::Status {
                status: 400,
                body: "already exists".to_string(),
            },
        );
        let mut sink = LiveSink::open(&catalog, &config, &history_path, 0).expect("open");

        let record = parse_line(0, "The Matrix").expect("record");
        let outcome = sink
            .record(&record, &Decision::Add(matrix()), Verdict::Add(matrix()))
            .expect("record");
        assert_eq!(outcome, Outcome::Added(matrix()));

        let record = parse_line(1, "Dune (2021)").expect("record");
        let outcome = sink
            .record(
                &record,
                &Decision::Add(rejected.clone()),
                Verdict::Add(rejected),
            )
            .expect("record");
        assert!(!outcome.is_successful_add());
        assert_eq!(outcome.as_str(), "add_failed");

        assert_eq!(*catalog.added.borrow(), vec![603]);
        let entries = read_entries(&history_path).expect("history");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].outcome, "added");
        assert_eq!(entries[1].outcome, "add_failed");
        assert!(entries[1].reason.contains("HTTP 400"));
    }

    #[test]
    fn live_skips_do_not_call_add() {
        let dir = tempdir().expect("tempdir");
        let config = test_config();
        let catalog = FakeCatalog::default();
        let mut sink =
            LiveSink::open(&catalog, &config, &dir.path().join("h.jsonl"), 0).expect("open");
        let record = parse_line(0, "The Matrix").expect("record");
        let outcome = sink
            .record(
                &record,
                &Decision::Add(matrix()),
                Verdict::Skip(SkipReason::Declined),
            )
            .expect("record");
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Declined));
        assert!(catalog.added.borrow().is_empty());
    }

    fn no_match_entry(line_index: usize) -> String {
        let record = parse_line(line_index, "Nothing").expect("record");
        let entry = ReportEntry::new(
            &record,
            &Decision::SkipNoMatch,
            &Outcome::Skipped(SkipReason::NoMatch),
        );
        serde_json::to_string(&entry).expect("json")
    }

    #[test]
    fn resume_drops_entries_the_cursor_never_passed() {
        let dir = tempdir().expect("tempdir");
        let entries_path = dir.path().join("entries.jsonl");
        let report_path = dir.path().join("report.txt");
        let config = test_config();
        let text = format!(
            "{}\n{}\n{}\n{{\"line_index\": 4, \"tit",
            no_match_entry(0),
            no_match_entry(2),
            no_match_entry(3)
        );
        fs::write(&entries_path, text).expect("write");

        DryRunSink::open(&config, &entries_path, &report_path, 3).expect("open");
        let indices: Vec<usize> = read_entries(&entries_path)
            .expect("entries")
            .iter()
            .map(|entry| entry.line_index)
            .collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn live_history_keeps_earlier_runs_and_trims_only_on_resume() {
        let dir = tempdir().expect("tempdir");
        let history_path = dir.path().join("history.jsonl");
        let config = test_config();
        let catalog = FakeCatalog::default();
        let earlier_run = [0, 1, 2].map(no_match_entry).join("\n");
        let current_run = [0, 1].map(no_match_entry).join("\n");
        fs::write(&history_path, format!("{earlier_run}\n{current_run}\n")).expect("write");

        LiveSink::open(&catalog, &config, &history_path, 0).expect("open");
        assert_eq!(read_entries(&history_path).expect("history").len(), 5);

        LiveSink::open(&catalog, &config, &history_path, 1).expect("open");
        let indices: Vec<usize> = read_entries(&history_path)
            .expect("history")
            .iter()
            .map(|entry| entry.line_index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 0]);
    }
}
