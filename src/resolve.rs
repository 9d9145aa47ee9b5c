//! Turns one input record into a `Decision`.
//!
//! Rules, in order: a given year is a hard filter; any remaining candidate the
//! library already owns makes the line a duplicate; one candidate left is an
//! add; several are deferred to the operator.
use crate::catalog::{CandidateMovie, Catalog, CatalogId, LibrarySnapshot};
use crate::error::LookupError;
use crate::parse::InputRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Add(CandidateMovie),
    SkipDuplicate(CatalogId),
    SkipNoMatch,
    DeferAmbiguous(Vec<CandidateMovie>),
    Error(LookupError),
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::Add(_) => DecisionKind::Add,
            Decision::SkipDuplicate(_) => DecisionKind::SkipDuplicate,
            Decision::SkipNoMatch => DecisionKind::SkipNoMatch,
            Decision::DeferAmbiguous(_) => DecisionKind::DeferAmbiguous,
            Decision::Error(_) => DecisionKind::Error,
        }
    }
}

/// Stable identifier for a decision in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Add,
    SkipDuplicate,
    SkipNoMatch,
    DeferAmbiguous,
    Error,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Add => "add",
            DecisionKind::SkipDuplicate => "skip_duplicate",
            DecisionKind::SkipNoMatch => "skip_no_match",
            DecisionKind::DeferAmbiguous => "defer_ambiguous",
            DecisionKind::Error => "error",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query the catalog for `record.title` and decide. Lookup failures become
/// `Decision::Error`; retries are the catalog's business.
pub fn resolve(
    record: &InputRecord,
    catalog: &dyn Catalog,
    library: &LibrarySnapshot,
) -> Decision {
    match catalog.lookup(&record.title) {
        Ok(candidates) => resolve_candidates(record, candidates, library),
        Err(err) => Decision::Error(LookupError(err)),
    }
}

pub fn resolve_candidates(
    record: &InputRecord,
    candidates: Vec<CandidateMovie>,
    library: &LibrarySnapshot,
) -> Decision {
    let filtered: Vec<CandidateMovie> = match record.year {
        Some(year) => candidates
            .into_iter()
            .filter(|candidate| candidate.year == year)
            .collect(),
        None => candidates,
    };

    if let Some(owned) = filtered
        .iter()
        .find(|candidate| library.contains(&candidate.catalog_id))
    {
        return Decision::SkipDuplicate(owned.catalog_id);
    }

    let mut remaining = filtered;
    match remaining.len() {
        0 => Decision::SkipNoMatch,
        1 => Decision::Add(remaining.remove(0)),
        _ => Decision::DeferAmbiguous(remaining),
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
