//! The sequential import loop.
//!
//! Each record is resolved, confirmed, recorded by the sink, and only then
//! is the resume cursor advanced. A failure between `record` and `advance`
//! reprocesses that one line on the next run and nothing earlier.
use crate::catalog::{CandidateMovie, Catalog, LibrarySnapshot};
use crate::confirm::{Authorization, ConfirmationPolicy, Disambiguation};
use crate::error::{LookupError, RunError};
use crate::parse::{InputList, InputRecord};
use crate::prompt::{Answer, Operator};
use crate::report::{Outcome, ReportSink, SkipReason, Verdict};
use crate::resolve::{resolve, Decision};
use crate::resume::ProgressCursor;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub added: usize,
    pub would_add: usize,
    pub duplicates: usize,
    pub misses: usize,
    pub ambiguous: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Completed,
    Interrupted,
    OperatorQuit,
}

enum Step {
    Continue,
    Stop,
}

pub struct ImportRun<'a> {
    catalog: &'a dyn Catalog,
    library: &'a LibrarySnapshot,
    sink: &'a mut dyn ReportSink,
    cursor: &'a mut dyn ProgressCursor,
    operator: &'a mut Operator,
    policy: ConfirmationPolicy,
    pause_on_issues: bool,
    delay: Duration,
    interrupted: Box<dyn Fn() -> bool + 'a>,
    summary: RunSummary,
}

impl<'a> ImportRun<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        library: &'a LibrarySnapshot,
        sink: &'a mut dyn ReportSink,
        cursor: &'a mut dyn ProgressCursor,
        operator: &'a mut Operator,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            catalog,
            library,
            sink,
            cursor,
            operator,
            policy,
            pause_on_issues: false,
            delay: Duration::ZERO,
            interrupted: Box::new(|| false),
            summary: RunSummary::default(),
        }
    }

    pub fn with_pause_on_issues(mut self, enabled: bool) -> Self {
        self.pause_on_issues = enabled;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Polled before each record; `true` stops the run cleanly.
    pub fn with_interrupt_check(mut self, check: impl Fn() -> bool + 'a) -> Self {
        self.interrupted = Box::new(check);
        self
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Process `input` from line index `start` to the end.
    ///
    /// On normal completion the cursor is set to the total line count. The
    /// sink is finished whenever the loop stops without a fatal error.
    pub fn run(&mut self, input: &InputList, start: usize) -> Result<RunEnd, RunError> {
        let end = self.drive(input, start)?;
        if end == RunEnd::Completed {
            self.cursor.complete(input.line_count())?;
        }
        self.sink.finish()?;
        tracing::info!(
            processed = self.summary.processed,
            added = self.summary.added,
            would_add = self.summary.would_add,
            duplicates = self.summary.duplicates,
            misses = self.summary.misses,
            ambiguous = self.summary.ambiguous,
            skipped = self.summary.skipped,
            errors = self.summary.errors,
            "summary"
        );
        Ok(end)
    }

    fn drive(&mut self, input: &InputList, start: usize) -> Result<RunEnd, RunError> {
        for record in input.records_from(start) {
            if (self.interrupted)() {
                tracing::warn!(
                    line = record.line_no(),
                    "interrupted; stopping before this line"
                );
                return Ok(RunEnd::Interrupted);
            }
            if let Step::Stop = self.process(&record)? {
                tracing::info!(line = record.line_no(), "stopped by operator");
                return Ok(RunEnd::OperatorQuit);
            }
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }
        Ok(RunEnd::Completed)
    }

    fn process(&mut self, record: &InputRecord) -> Result<Step, RunError> {
        let decision = resolve(record, self.catalog, self.library);
        tracing::debug!(line = record.line_no(), decision = %decision.kind(), "resolved");
        if let Decision::Error(LookupError(err)) = &decision {
            if err.is_fatal() {
                return Err(RunError::Catalog {
                    line_no: record.line_no(),
                    source: err.clone(),
                });
            }
        }

        let mut quit = false;
        let verdict = match &decision {
            Decision::Add(candidate) => self.authorize(candidate.clone())?,
            Decision::SkipDuplicate(id) => Verdict::Skip(SkipReason::Duplicate(*id)),
            Decision::SkipNoMatch => Verdict::Skip(SkipReason::NoMatch),
            Decision::DeferAmbiguous(candidates) => {
                match self
                    .policy
                    .disambiguate(record, candidates, self.operator)?
                {
                    Disambiguation::Pick(candidate) => self.authorize(candidate)?,
                    Disambiguation::Skip => Verdict::Skip(SkipReason::AmbiguousSkipped),
                    Disambiguation::Quit => {
                        quit = true;
                        Verdict::Skip(SkipReason::AmbiguousSkipped)
                    }
                }
            }
            Decision::Error(err) => Verdict::Failed(err.clone()),
        };

        let outcome = self.sink.record(record, &decision, verdict)?;
        if let Outcome::AddFailed { error, .. } = &outcome {
            if error.0.is_fatal() {
                return Err(RunError::Catalog {
                    line_no: record.line_no(),
                    source: error.0.clone(),
                });
            }
        }
        if outcome.is_successful_add() {
            self.policy.record_success();
        }
        self.cursor.advance(record.line_index)?;

        self.tally(&decision, &outcome);
        log_outcome(record, &outcome);

        if quit {
            return Ok(Step::Stop);
        }
        self.pause_after_issue(record, &outcome)
    }

    fn authorize(&mut self, candidate: CandidateMovie) -> Result<Verdict, RunError> {
        Ok(match self.policy.authorize(&candidate, self.operator)? {
            Authorization::Authorized => Verdict::Add(candidate),
            Authorization::Declined => Verdict::Skip(SkipReason::Declined),
            Authorization::CapReached => Verdict::Skip(SkipReason::CapReached),
        })
    }

    fn tally(&mut self, decision: &Decision, outcome: &Outcome) {
        let summary = &mut self.summary;
        summary.processed += 1;
        if let Decision::DeferAmbiguous(_) = decision {
            summary.ambiguous += 1;
        }
        match outcome {
            Outcome::Added(_) => summary.added += 1,
            Outcome::Simulated(_) => summary.would_add += 1,
            Outcome::AddFailed { .. } | Outcome::LookupFailed(_) => summary.errors += 1,
            Outcome::Skipped(SkipReason::Duplicate(_)) => summary.duplicates += 1,
            Outcome::Skipped(SkipReason::NoMatch) => summary.misses += 1,
            Outcome::Skipped(_) => summary.skipped += 1,
        }
    }

    fn pause_after_issue(
        &mut self,
        record: &InputRecord,
        outcome: &Outcome,
    ) -> Result<Step, RunError> {
        let issue = matches!(
            outcome,
            Outcome::Skipped(SkipReason::NoMatch | SkipReason::AmbiguousSkipped)
                | Outcome::LookupFailed(_)
                | Outcome::AddFailed { .. }
        );
        if !self.pause_on_issues || !issue {
            return Ok(Step::Continue);
        }
        let Some(prompter) = self.operator.prompter() else {
            return Ok(Step::Continue);
        };
        let question = format!(
            "[{}] Issue with '{}' ({}).",
            record.line_no(),
            record.raw_text,
            outcome.as_str()
        );
        Ok(match prompter.proceed(&question)? {
            Answer::Yes => Step::Continue,
            Answer::Always => {
                self.pause_on_issues = false;
                Step::Continue
            }
            Answer::No => Step::Stop,
        })
    }
}

fn log_outcome(record: &InputRecord, outcome: &Outcome) {
    let line = record.line_no();
    let text = record.raw_text.as_str();
    match outcome {
        Outcome::Added(candidate) => {
            tracing::info!(line, movie = %candidate.label(), "[ADD ] added")
        }
        Outcome::Simulated(candidate) => {
            tracing::info!(line, movie = %candidate.label(), "[DRY ] would add")
        }
        Outcome::AddFailed { candidate, error } => {
            tracing::error!(
                line,
                text,
                movie = %candidate.label(),
                error = %error,
                "[ERR ] add failed"
            )
        }
        Outcome::LookupFailed(error) => {
            tracing::error!(line, text, error = %error, "[FAIL] lookup failed")
        }
        Outcome::Skipped(SkipReason::Duplicate(id)) => {
            tracing::info!(line, text, tmdb_id = id, "[DUP ] already in library")
        }
        Outcome::Skipped(SkipReason::NoMatch) => {
            tracing::warn!(line, text, "[MISS] no match")
        }
        Outcome::Skipped(reason) => {
            tracing::info!(line, text, reason = %reason.describe(), "[SKIP] skipped")
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
