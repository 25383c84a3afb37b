//! End-to-end progression through a participant session
//!
//! Drives the session against the scripted execution service and the
//! in-memory store, from the first submission to a sealed finale.

use riftgate::config::presets::default_word_list;
use riftgate::config::types::{Cohort, DispatchError, FinaleState, SubmissionResult};
use riftgate::identity::Identity;
use riftgate::judge::SubmissionDispatcher;
use riftgate::progression::{Pointer, ProgressionEngine, RoundPhase, SubmissionOutcome};
use riftgate::session::ParticipantSession;
use riftgate::store::{MemoryStore, ProgressStore};
use riftgate::testing::{fixture_set, judged_result, ScriptedExecutionService, ScriptedReply};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

const EMAIL: &str = "23z101@psgtech.ac.in";

fn engine() -> ProgressionEngine {
    ProgressionEngine::new(
        Arc::new(fixture_set()),
        default_word_list(),
        Some("UPSIDE DOWN".to_string()),
    )
}

fn open(service: &ScriptedExecutionService, store: &Arc<MemoryStore>) -> ParticipantSession {
    let dispatcher = SubmissionDispatcher::new(Arc::new(service.clone()), Duration::from_secs(5));
    ParticipantSession::open_with_rng(
        Identity::from_email(EMAIL, Cohort::CohortA),
        engine(),
        dispatcher,
        store.clone(),
        fastrand::Rng::with_seed(7),
    )
    .unwrap()
}

fn expect_accepted(outcome: &SubmissionOutcome, puzzle: usize) {
    match outcome {
        SubmissionOutcome::Accepted { puzzle: p, .. } => assert_eq!(*p, puzzle),
        other => panic!("expected puzzle {} accepted, got {:?}", puzzle, other),
    }
}

#[test]
fn test_full_round_from_first_submission_to_sealed_finale() {
    let service = ScriptedExecutionService::new();
    let store = Arc::new(MemoryStore::new());
    let session = open(&service, &store);

    // Puzzle 0 passes every case
    service.push(ScriptedReply::PassAll);
    let report = session.submit("fixed 0").unwrap();
    expect_accepted(&report.outcome, 0);
    let state = session.state().unwrap();
    assert!(state.fragments.contains("FRAGMENT1"));
    assert_eq!(state.pointer, Pointer::Active(1));

    // Puzzle 1 fails one hidden case
    service.push(ScriptedReply::FailCases(vec![3]));
    let report = session.submit("almost 1").unwrap();
    match &report.outcome {
        SubmissionOutcome::Rejected { puzzle, verdict } => {
            assert_eq!(*puzzle, 1);
            assert!(!verdict.is_accepted());
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    let result = report.result.expect("judged result");
    assert_eq!(result.visible().len(), 2);
    assert_eq!(result.hidden_passed(), 2);
    let state = session.state().unwrap();
    assert_eq!(state.fragments.len(), 1);
    assert_eq!(state.pointer, Pointer::Active(1));

    // Puzzles 1..=4 pass
    for index in 1..5 {
        service.push(ScriptedReply::PassAll);
        let report = session.submit(&format!("fixed {}", index)).unwrap();
        expect_accepted(&report.outcome, index);
    }

    let state = session.state().unwrap();
    assert_eq!(state.pointer, Pointer::AllComplete);
    assert_eq!(state.fragments.len(), 5);
    assert_eq!(state.phase(), RoundPhase::SideChallenge);

    // Finale stays shut until the side challenge is solved
    assert!(session.submit_final("FRAGMENT1FRAGMENT2").is_err());

    let word = state.side_challenge.as_ref().unwrap().word.clone();
    assert!(!session.solve_side_challenge("definitely wrong").unwrap());
    assert!(session.solve_side_challenge(&word.to_lowercase()).unwrap());

    assert!(!session.submit_final("fragment5fragment4").unwrap());
    assert!(session
        .submit_final("fragment1fragment2fragment3fragment4fragment5")
        .unwrap());

    let state = session.state().unwrap();
    assert_eq!(state.phase(), RoundPhase::Sealed);
    assert_eq!(state.final_attempts, 2);

    let record = store
        .load(&Identity::from_email(EMAIL, Cohort::CohortA).participant_id)
        .unwrap()
        .unwrap();
    assert_eq!(record.finale, FinaleState::Sealed);
    assert_eq!(record.fragments.len(), 5);
    assert!(record.sealed_at.is_some());
}

#[test]
fn test_override_phrase_opens_the_finale() {
    let service = ScriptedExecutionService::with_default(ScriptedReply::PassAll);
    let store = Arc::new(MemoryStore::new());
    let session = open(&service, &store);

    for index in 0..5 {
        expect_accepted(&session.submit("ok").unwrap().outcome, index);
    }
    let word = session.state().unwrap().side_challenge.unwrap().word;
    assert!(session.solve_side_challenge(&word).unwrap());
    assert!(session.submit_final("  upside down ").unwrap());
}

#[test]
fn test_service_unavailable_leaves_earlier_progress_intact() {
    let service = ScriptedExecutionService::new();
    let store = Arc::new(MemoryStore::new());
    let session = open(&service, &store);

    service.push(ScriptedReply::PassAll);
    service.push(ScriptedReply::PassAll);
    session.submit("fixed 0").unwrap();
    session.submit("fixed 1").unwrap();

    service.push(ScriptedReply::Error(DispatchError::ServiceUnavailable(
        "connection refused".to_string(),
    )));
    let report = session.submit("fixed 2").unwrap();
    assert!(matches!(
        report.outcome,
        SubmissionOutcome::Unjudged {
            puzzle: 2,
            error: DispatchError::ServiceUnavailable(_)
        }
    ));
    assert!(report.result.is_none());

    let state = session.state().unwrap();
    assert!(state.is_complete(0));
    assert!(state.is_complete(1));
    assert!(!state.is_complete(2));
    assert_eq!(state.pointer, Pointer::Active(2));
}

#[test]
fn test_completed_set_never_shrinks() {
    let service = ScriptedExecutionService::new();
    let store = Arc::new(MemoryStore::new());
    let session = open(&service, &store);

    let script = [
        ScriptedReply::FailCases(vec![0]),
        ScriptedReply::PassAll,
        ScriptedReply::Error(DispatchError::Timeout(Duration::from_secs(1))),
        ScriptedReply::FailCases(vec![1, 4]),
        ScriptedReply::Error(DispatchError::CompileError("expected ';'".to_string())),
        ScriptedReply::PassAll,
        ScriptedReply::FailCases(vec![2]),
        ScriptedReply::PassAll,
    ];

    let mut previous: BTreeSet<usize> = BTreeSet::new();
    for reply in script {
        service.push(reply);
        session.submit("attempt").unwrap();
        let state = session.state().unwrap();
        assert!(previous.is_subset(&state.completed));
        assert_eq!(state.pointer, state.lowest_incomplete());
        previous = state.completed.clone();
    }
    assert_eq!(previous, BTreeSet::from([0, 1, 2]));
}

#[test]
fn test_resubmitting_a_completed_puzzle_changes_nothing() {
    let engine = engine();
    let set = engine.puzzle_set().clone();
    let mut rng = fastrand::Rng::with_seed(3);

    let pass = |index: usize| -> Result<SubmissionResult, DispatchError> {
        Ok(judged_result(set.puzzle_at(index).unwrap(), &[]))
    };

    let (after_first, outcome) = engine
        .on_submission(&engine.start(), 0, &pass(0), &mut rng)
        .unwrap();
    expect_accepted(&outcome, 0);

    let mut state = after_first.clone();
    for _ in 0..3 {
        let (next, outcome) = engine.on_submission(&state, 0, &pass(0), &mut rng).unwrap();
        assert!(matches!(outcome, SubmissionOutcome::AlreadyCompleted { puzzle: 0, .. }));
        assert!(!outcome.changed_state());
        state = next;
    }
    assert_eq!(state.fragments, after_first.fragments);
    assert_eq!(state.completed, after_first.completed);
}

#[test]
fn test_session_resumes_from_the_store() {
    let service = ScriptedExecutionService::with_default(ScriptedReply::PassAll);
    let store = Arc::new(MemoryStore::new());

    {
        let session = open(&service, &store);
        session.submit("fixed 0").unwrap();
        session.submit("fixed 1").unwrap();
    }

    let resumed = open(&service, &store);
    let state = resumed.state().unwrap();
    assert_eq!(state.completed, BTreeSet::from([0, 1]));
    assert_eq!(state.pointer, Pointer::Active(2));
    assert_eq!(resumed.current_puzzle().unwrap().unwrap().index, 2);
}

#[test]
fn test_navigation_skips_completed_puzzles() {
    let service = ScriptedExecutionService::with_default(ScriptedReply::PassAll);
    let store = Arc::new(MemoryStore::new());
    let session = open(&service, &store);

    session.submit("fixed 0").unwrap();
    assert_eq!(session.advance().unwrap().pointer, Pointer::Active(2));
    session.submit("fixed 2").unwrap();

    // Acceptance returns the pointer to the lowest incomplete puzzle
    assert_eq!(session.state().unwrap().pointer, Pointer::Active(1));
    assert_eq!(session.advance().unwrap().pointer, Pointer::Active(3));
    assert_eq!(session.retreat().unwrap().pointer, Pointer::Active(1));
    assert_eq!(session.retreat().unwrap().pointer, Pointer::Active(1));
}
