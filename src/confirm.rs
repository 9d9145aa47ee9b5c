//! Add confirmation policy.
//!
//! Modes: `Manual` asks per add, `AutoAdd` (chosen at start) never asks,
//! `YesAll` is entered from `Manual` by an "always" answer and never left.
//! The add cap is checked before any prompt; once reached, every later add is
//! refused for the rest of the run.
use crate::catalog::CandidateMovie;
use crate::parse::InputRecord;
use crate::prompt::{Answer, Choice, Operator};
use std::io;

/// For ambiguous lookups, show at most this many candidates.
pub const MAX_CHOICES_TO_SHOW: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationMode {
    Manual,
    AutoAdd,
    YesAll,
}

impl ConfirmationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationMode::Manual => "manual",
            ConfirmationMode::AutoAdd => "auto_add",
            ConfirmationMode::YesAll => "yes_all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Declined,
    CapReached,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Disambiguation {
    Skip,
    Pick(CandidateMovie),
    Quit,
}

#[derive(Debug, Clone)]
pub struct ConfirmationPolicy {
    mode: ConfirmationMode,
    /// `--yes-all`: the first plain "yes" behaves like "always".
    sticky_first_yes: bool,
    max_add: Option<usize>,
    successful_adds: usize,
}

impl ConfirmationPolicy {
    pub fn new(mode: ConfirmationMode, max_add: Option<usize>) -> Self {
        Self {
            mode,
            sticky_first_yes: false,
            max_add,
            successful_adds: 0,
        }
    }

    pub fn with_sticky_first_yes(mut self, enabled: bool) -> Self {
        self.sticky_first_yes = enabled;
        self
    }

    pub fn mode(&self) -> ConfirmationMode {
        self.mode
    }

    pub fn successful_adds(&self) -> usize {
        self.successful_adds
    }

    pub fn cap_reached(&self) -> bool {
        matches!(self.max_add, Some(limit) if self.successful_adds >= limit)
    }

    /// Gate one add. A declined or capped add is a skip, never an error.
    ///
    /// In `Manual` mode without an interactive channel the add is declined.
    pub fn authorize(
        &mut self,
        candidate: &CandidateMovie,
        operator: &mut Operator,
    ) -> io::Result<Authorization> {
        if self.cap_reached() {
            return Ok(Authorization::CapReached);
        }
        if self.mode != ConfirmationMode::Manual {
            return Ok(Authorization::Authorized);
        }
        let Some(prompter) = operator.prompter() else {
            return Ok(Authorization::Declined);
        };
        let question = format!("Add '{}'?", candidate.label());
        match prompter.ask(&question, Answer::Yes)? {
            Answer::Yes => {
                if self.sticky_first_yes {
                    self.enter_yes_all();
                }
                Ok(Authorization::Authorized)
            }
            Answer::Always => {
                self.enter_yes_all();
                Ok(Authorization::Authorized)
            }
            Answer::No => Ok(Authorization::Declined),
        }
    }

    /// Count an authorized add that the sink executed successfully.
    pub fn record_success(&mut self) {
        self.successful_adds += 1;
        if self.cap_reached() {
            tracing::info!(
                max_add = self.max_add.unwrap_or_default(),
                "add cap reached; remaining adds will be skipped"
            );
        }
    }

    /// Ask the operator to pick among ambiguous candidates.
    ///
    /// Never resolved automatically: without an interactive channel the
    /// answer is always `Skip`, whatever the confirmation mode.
    pub fn disambiguate(
        &self,
        record: &InputRecord,
        candidates: &[CandidateMovie],
        operator: &mut Operator,
    ) -> io::Result<Disambiguation> {
        let Some(prompter) = operator.prompter() else {
            return Ok(Disambiguation::Skip);
        };
        let shown = &candidates[..candidates.len().min(MAX_CHOICES_TO_SHOW)];
        let options: Vec<String> = shown.iter().map(CandidateMovie::label).collect();
        let header = format!(
            "[{}] [AMBIG] Multiple matches for: {}",
            record.line_no(),
            record.raw_text
        );
        Ok(match prompter.choose(&header, &options)? {
            Choice::Skip => Disambiguation::Skip,
            Choice::Quit => Disambiguation::Quit,
            Choice::Pick(index) => shown
                .get(index)
                .cloned()
                .map(Disambiguation::Pick)
                .unwrap_or(Disambiguation::Skip),
        })
    }

    fn enter_yes_all(&mut self) {
        if self.mode == ConfirmationMode::Manual {
            self.mode = ConfirmationMode::YesAll;
            tracing::info!("confirmation mode is now yes_all for the rest of the run");
        }
    }
}
