//! Durable progress across sessions with the file-backed store

use riftgate::config::presets::default_word_list;
use riftgate::config::types::{Cohort, FinaleState, PortalError};
use riftgate::identity::Identity;
use riftgate::judge::SubmissionDispatcher;
use riftgate::progression::{Pointer, ProgressionEngine, RoundPhase};
use riftgate::session::ParticipantSession;
use riftgate::store::{FileStore, ProgressStore};
use riftgate::testing::{fixture_set, ScriptedExecutionService, ScriptedReply};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const EMAIL: &str = "23z555@psgtech.ac.in";

fn open_at(dir: &Path, seed: u64) -> ParticipantSession {
    let service = ScriptedExecutionService::with_default(ScriptedReply::PassAll);
    let engine = ProgressionEngine::new(Arc::new(fixture_set()), default_word_list(), None);
    let dispatcher = SubmissionDispatcher::new(Arc::new(service), Duration::from_secs(5));
    ParticipantSession::open_with_rng(
        Identity::from_email(EMAIL, Cohort::CohortA),
        engine,
        dispatcher,
        Arc::new(FileStore::open(dir).unwrap()),
        fastrand::Rng::with_seed(seed),
    )
    .unwrap()
}

#[test]
fn test_progress_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let session = open_at(dir.path(), 1);
        session.submit("fixed 0").unwrap();
        session.submit("fixed 1").unwrap();
        session.submit("fixed 2").unwrap();
    }

    let session = open_at(dir.path(), 2);
    let state = session.state().unwrap();
    assert_eq!(state.completed, BTreeSet::from([0, 1, 2]));
    assert_eq!(
        state.fragments,
        BTreeSet::from([
            "FRAGMENT1".to_string(),
            "FRAGMENT2".to_string(),
            "FRAGMENT3".to_string()
        ])
    );
    assert_eq!(state.pointer, Pointer::Active(3));
}

#[test]
fn test_side_challenge_is_fixed_once_drawn() {
    let dir = tempfile::tempdir().unwrap();

    let drawn = {
        let session = open_at(dir.path(), 11);
        for _ in 0..5 {
            session.submit("fixed").unwrap();
        }
        session.state().unwrap().side_challenge.unwrap()
    };

    // A different seed must not redraw the stored challenge
    let session = open_at(dir.path(), 99);
    let state = session.state().unwrap();
    assert_eq!(state.phase(), RoundPhase::SideChallenge);
    assert_eq!(state.side_challenge.as_ref(), Some(&drawn));
}

#[test]
fn test_sealed_finale_is_durable() {
    let dir = tempfile::tempdir().unwrap();

    {
        let session = open_at(dir.path(), 5);
        for _ in 0..5 {
            session.submit("fixed").unwrap();
        }
        let word = session.state().unwrap().side_challenge.unwrap().word;
        assert!(session.solve_side_challenge(&word).unwrap());
        assert!(!session.submit_final("FRAGMENT1").unwrap());
        assert!(session
            .submit_final("FRAGMENT1FRAGMENT2FRAGMENT3FRAGMENT4FRAGMENT5")
            .unwrap());
    }

    let store = FileStore::open(dir.path()).unwrap();
    let id = Identity::from_email(EMAIL, Cohort::CohortA).participant_id;
    let record = store.load(&id).unwrap().unwrap();
    assert_eq!(record.finale, FinaleState::Sealed);
    assert_eq!(record.final_attempts, 2);
    assert_eq!(record.last_final_result, Some(true));
    assert!(record.side_challenge_solved);

    let session = open_at(dir.path(), 6);
    assert_eq!(session.state().unwrap().phase(), RoundPhase::Sealed);
    assert!(session.submit_final("anything").unwrap());
}

#[test]
fn test_inconsistent_record_refuses_to_resume() {
    let dir = tempfile::tempdir().unwrap();
    {
        let session = open_at(dir.path(), 1);
        session.submit("fixed 0").unwrap();
    }

    // A fragment without its completed puzzle
    let store = FileStore::open(dir.path()).unwrap();
    let id = Identity::from_email(EMAIL, Cohort::CohortA).participant_id;
    let mut record = store.load(&id).unwrap().unwrap();
    record.fragments.insert("FRAGMENT4".to_string());
    store.upsert(&record).unwrap();

    let service = ScriptedExecutionService::new();
    let result = ParticipantSession::open(
        Identity::from_email(EMAIL, Cohort::CohortA),
        ProgressionEngine::new(Arc::new(fixture_set()), default_word_list(), None),
        SubmissionDispatcher::new(Arc::new(service), Duration::from_secs(5)),
        Arc::new(store),
    );
    assert!(matches!(result, Err(PortalError::Invariant(_))));
}
