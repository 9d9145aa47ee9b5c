use super::*;
use crate::catalog::fake::FakeCatalog;
use crate::error::CatalogError;
use crate::parse::parse_line;

fn record(raw: &str) -> InputRecord {
    parse_line(0, raw).expect("importable line")
}

fn snapshot(ids: &[CatalogId]) -> LibrarySnapshot {
    ids.iter().copied().collect()
}

#[test]
fn owned_match_is_duplicate_not_ambiguous() {
    let catalog = FakeCatalog::default()
        .with("The Matrix", vec![CandidateMovie::new(1, "The Matrix", 1999)])
        .owning(1);

    let decision = resolve(&record("The Matrix (1999)"), &catalog, &catalog.library);
    assert_eq!(decision, Decision::SkipDuplicate(1));
}

#[test]
fn duplicate_wins_over_other_unowned_candidates() {
    let candidates = vec![
        CandidateMovie::new(10, "Dune", 1984),
        CandidateMovie::new(11, "Dune", 2021),
        CandidateMovie::new(12, "Dune: Part Two", 2024),
    ];
    let decision = resolve_candidates(&record("Dune"), candidates, &snapshot(&[11]));
    assert_eq!(decision, Decision::SkipDuplicate(11));
}

#[test]
fn year_is_a_strict_filter() {
    let candidates = vec![
        CandidateMovie::new(1, "X", 1998),
        CandidateMovie::new(2, "X", 1999),
    ];

    let decision = resolve_candidates(&record("X (1999)"), candidates.clone(), &snapshot(&[]));
    assert_eq!(decision, Decision::Add(CandidateMovie::new(2, "X", 1999)));

    let decision = resolve_candidates(&record("X (2000)"), candidates, &snapshot(&[]));
    assert_eq!(decision, Decision::SkipNoMatch);
}

#[test]
fn owned_candidate_outside_requested_year_is_ignored() {
    let candidates = vec![
        CandidateMovie::new(1, "Heat", 1986),
        CandidateMovie::new(2, "Heat", 1995),
    ];
    let decision = resolve_candidates(&record("Heat (1995)"), candidates, &snapshot(&[1]));
    assert_eq!(decision, Decision::Add(CandidateMovie::new(2, "Heat", 1995)));
}

#[test]
fn no_candidates_is_no_match() {
    let catalog = FakeCatalog::default();
    let decision = resolve(&record("Nothing Here"), &catalog, &catalog.library);
    assert_eq!(decision, Decision::SkipNoMatch);
}

#[test]
fn multiple_unowned_candidates_are_deferred() {
    let candidates = vec![
        CandidateMovie::new(1, "Solaris", 1972),
        CandidateMovie::new(2, "Solaris", 2002),
    ];
    let decision = resolve_candidates(&record("Solaris"), candidates.clone(), &snapshot(&[]));
    assert_eq!(decision, Decision::DeferAmbiguous(candidates));
    assert_eq!(decision.kind(), DecisionKind::DeferAmbiguous);
}

#[test]
fn lookup_is_queried_with_title_without_year() {
    let catalog = FakeCatalog::default();
    resolve(&record("Alien (1979)"), &catalog, &catalog.library);
    assert_eq!(*catalog.lookups.borrow(), vec!["Alien".to_string()]);
}

#[test]
fn lookup_failure_becomes_error_decision() {
    let catalog = FakeCatalog::default()
        .failing("Heat", CatalogError::Transport("connection reset".to_string()));
    let decision = resolve(&record("Heat"), &catalog, &catalog.library);
    assert_eq!(
        decision,
        Decision::Error(LookupError(CatalogError::Transport(
            "connection reset".to_string()
        )))
    );
    assert_eq!(decision.kind().as_str(), "error");
}
