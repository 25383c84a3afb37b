use crate::config::config::PortalConfig;
use crate::config::types::{
    canonical_fragment, DispatchError, FinaleState, PortalError, Result, SubmissionResult,
};
use crate::finale::FragmentAssembler;
use crate::progression::side_challenge::SideChallenge;
use crate::progression::state::{Pointer, ProgressState, RoundPhase};
use crate::puzzle::PuzzleSet;
use crate::store::ParticipantRecord;
use crate::verdict::{Verdict, VerdictClassifier};
use std::sync::Arc;

/// What a submission did to progress
#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionOutcome {
    /// All cases passed; the fragment is now held and the puzzle complete
    Accepted {
        puzzle: usize,
        fragment: String,
        all_complete: bool,
    },
    /// Judged, at least one case failed; state unchanged
    Rejected { puzzle: usize, verdict: Verdict },
    /// Judged resubmission of a completed puzzle; state unchanged
    AlreadyCompleted { puzzle: usize, verdict: Verdict },
    /// Could not be judged; state unchanged
    Unjudged { puzzle: usize, error: DispatchError },
    /// Result for a puzzle the participant has left, or a cancelled call
    Discarded { puzzle: usize },
}

impl SubmissionOutcome {
    pub fn changed_state(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }
}

/// Participant state machine over one cohort's puzzle set.
/// Transitions are pure: they take a state and return the next one.
#[derive(Clone)]
pub struct ProgressionEngine {
    set: Arc<PuzzleSet>,
    words: Vec<String>,
    override_phrase: Option<String>,
    clues: Vec<String>,
}

impl ProgressionEngine {
    pub fn new(set: Arc<PuzzleSet>, words: Vec<String>, override_phrase: Option<String>) -> Self {
        Self {
            set,
            words,
            override_phrase,
            clues: Vec::new(),
        }
    }

    pub fn from_config(set: Arc<PuzzleSet>, config: &PortalConfig) -> Self {
        let clues = config
            .finale
            .clues
            .get(&set.cohort())
            .cloned()
            .unwrap_or_default();
        Self::new(
            set,
            config.side_challenge.words.clone(),
            config.finale.override_phrase.clone(),
        )
        .with_clues(clues)
    }

    /// Finale guidance for this engine's cohort
    pub fn with_clues(mut self, clues: Vec<String>) -> Self {
        self.clues = clues;
        self
    }

    pub fn finale_clues(&self) -> &[String] {
        &self.clues
    }

    pub fn puzzle_set(&self) -> &Arc<PuzzleSet> {
        &self.set
    }

    pub fn assembler(&self, state: &ProgressState) -> FragmentAssembler {
        FragmentAssembler::new(&self.set, self.override_phrase.clone())
            .with_attempts(state.final_attempts)
    }

    /// Fresh participant
    pub fn start(&self) -> ProgressState {
        ProgressState::new(self.set.cohort(), self.set.len())
    }

    /// Rebuild state from a durable record. The pointer restarts at the
    /// lowest incomplete puzzle.
    pub fn resume(&self, record: &ParticipantRecord, rng: &mut fastrand::Rng) -> Result<ProgressState> {
        if record.cohort != self.set.cohort() {
            return Err(PortalError::Invariant(format!(
                "record for {} is {} but the session serves {}",
                record.participant_id.short(),
                record.cohort,
                self.set.cohort()
            )));
        }

        let mut state = self.start();
        state.completed = record.completed.clone();
        state.fragments = record
            .fragments
            .iter()
            .map(|f| canonical_fragment(f))
            .collect();
        state.side_challenge = record.side_challenge.clone();
        state.side_challenge_solved = record.side_challenge_solved;
        state.finale = record.finale;
        state.final_attempts = record.final_attempts;
        state.last_final_result = record.last_final_result;
        state.sealed_at = record.sealed_at;
        state.pointer = state.lowest_incomplete();

        self.select_side_challenge(&mut state, rng)?;
        state.check_invariants(&self.set)?;
        Ok(state)
    }

    /// Apply a judging outcome for `index`.
    pub fn on_submission(
        &self,
        state: &ProgressState,
        index: usize,
        result: &std::result::Result<SubmissionResult, DispatchError>,
        rng: &mut fastrand::Rng,
    ) -> Result<(ProgressState, SubmissionOutcome)> {
        let puzzle = self.set.puzzle_at(index)?;
        let unchanged = |outcome| Ok((state.clone(), outcome));

        if matches!(result, Err(DispatchError::Cancelled)) {
            return unchanged(SubmissionOutcome::Discarded { puzzle: index });
        }

        let completed = state.is_complete(index);
        if !completed && state.pointer != Pointer::Active(index) {
            log::debug!(
                "Discarding result for puzzle {}; pointer is at {:?}",
                index,
                state.pointer
            );
            return unchanged(SubmissionOutcome::Discarded { puzzle: index });
        }

        let judged = match result {
            Ok(judged) => judged,
            Err(error) => {
                return unchanged(SubmissionOutcome::Unjudged {
                    puzzle: index,
                    error: error.clone(),
                })
            }
        };

        let verdict = VerdictClassifier::classify(puzzle, judged);
        if completed {
            return unchanged(SubmissionOutcome::AlreadyCompleted {
                puzzle: index,
                verdict,
            });
        }
        if !verdict.is_accepted() {
            return unchanged(SubmissionOutcome::Rejected {
                puzzle: index,
                verdict,
            });
        }

        let mut next = state.clone();
        let fragment = canonical_fragment(&puzzle.fragment);
        if !next.fragments.contains(&fragment) {
            next.fragments.insert(fragment.clone());
        }
        next.completed.insert(index);
        next.pointer = next.lowest_incomplete();
        self.select_side_challenge(&mut next, rng)?;
        next.check_invariants(&self.set)?;

        let all_complete = next.pointer == Pointer::AllComplete;
        Ok((
            next,
            SubmissionOutcome::Accepted {
                puzzle: index,
                fragment,
                all_complete,
            },
        ))
    }

    /// Move to the nearest incomplete puzzle after the pointer; no-op at the end.
    pub fn advance(&self, state: &ProgressState) -> ProgressState {
        let mut next = state.clone();
        if let Pointer::Active(current) = state.pointer {
            if let Some(i) = (current + 1..state.puzzle_count).find(|i| !state.is_complete(*i)) {
                next.pointer = Pointer::Active(i);
            }
        }
        next
    }

    /// Move to the nearest incomplete puzzle before the pointer; no-op at the start.
    pub fn retreat(&self, state: &ProgressState) -> ProgressState {
        let mut next = state.clone();
        if let Pointer::Active(current) = state.pointer {
            if let Some(i) = (0..current).rev().find(|i| !state.is_complete(*i)) {
                next.pointer = Pointer::Active(i);
            }
        }
        next
    }

    /// Answer the scrambled-word gate
    pub fn solve_side_challenge(
        &self,
        state: &ProgressState,
        answer: &str,
    ) -> Result<(ProgressState, bool)> {
        if state.side_challenge_solved {
            return Ok((state.clone(), true));
        }
        let challenge = match (&state.side_challenge, state.phase()) {
            (Some(challenge), RoundPhase::SideChallenge) => challenge,
            _ => {
                return Err(PortalError::Phase(
                    "the side challenge opens once every puzzle is complete".to_string(),
                ))
            }
        };

        if !challenge.check(answer) {
            return Ok((state.clone(), false));
        }
        let mut next = state.clone();
        next.side_challenge_solved = true;
        Ok((next, true))
    }

    /// Check a final answer. A match seals the finale at `now` (unix seconds).
    pub fn submit_final(
        &self,
        state: &ProgressState,
        candidate: &str,
        now: u64,
    ) -> Result<(ProgressState, bool)> {
        match state.phase() {
            RoundPhase::Sealed => return Ok((state.clone(), true)),
            RoundPhase::Finale => {}
            _ => {
                return Err(PortalError::Phase(
                    "the finale opens after the side challenge is solved".to_string(),
                ))
            }
        }

        let mut assembler = self.assembler(state);
        let accepted = assembler.check_final(candidate, &state.fragments);

        let mut next = state.clone();
        next.final_attempts = assembler.attempts();
        next.last_final_result = Some(accepted);
        if accepted {
            next.finale = FinaleState::Sealed;
            next.sealed_at = Some(now);
        }
        Ok((next, accepted))
    }

    /// One-time draw when the puzzle round completes
    fn select_side_challenge(&self, state: &mut ProgressState, rng: &mut fastrand::Rng) -> Result<()> {
        if state.pointer != Pointer::AllComplete || state.side_challenge.is_some() {
            return Ok(());
        }
        let challenge = SideChallenge::pick(&self.words, rng).ok_or_else(|| {
            PortalError::Config("side challenge word list has no usable word".to_string())
        })?;
        log::info!("Side challenge selected for {} participant", state.cohort);
        state.side_challenge = Some(challenge);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_set, judged_result};

    fn engine() -> ProgressionEngine {
        ProgressionEngine::new(
            Arc::new(fixture_set()),
            vec!["HAWKINS".to_string()],
            Some("UPSIDE DOWN".to_string()),
        )
    }

    fn pass(engine: &ProgressionEngine, index: usize) -> std::result::Result<SubmissionResult, DispatchError> {
        Ok(judged_result(engine.puzzle_set().puzzle_at(index).unwrap(), &[]))
    }

    fn fail_hidden(engine: &ProgressionEngine, index: usize) -> std::result::Result<SubmissionResult, DispatchError> {
        let puzzle = engine.puzzle_set().puzzle_at(index).unwrap();
        Ok(judged_result(puzzle, &[puzzle.visible.len()]))
    }

    fn complete_all(engine: &ProgressionEngine, rng: &mut fastrand::Rng) -> ProgressState {
        let mut state = engine.start();
        for i in 0..5 {
            state = engine.on_submission(&state, i, &pass(engine, i), rng).unwrap().0;
        }
        state
    }

    #[test]
    fn test_accept_awards_fragment_and_moves_pointer() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(3);
        let state = engine.start();
        let (next, outcome) = engine.on_submission(&state, 0, &pass(&engine, 0), &mut rng).unwrap();

        assert!(next.fragments.contains("FRAGMENT1"));
        assert_eq!(next.pointer, Pointer::Active(1));
        assert_eq!(
            outcome,
            SubmissionOutcome::Accepted {
                puzzle: 0,
                fragment: "FRAGMENT1".to_string(),
                all_complete: false
            }
        );
    }

    #[test]
    fn test_any_failure_blocks_completion() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(3);
        let state = engine.start();
        let (next, outcome) = engine
            .on_submission(&state, 0, &fail_hidden(&engine, 0), &mut rng)
            .unwrap();
        assert_eq!(next, state);
        assert!(matches!(outcome, SubmissionOutcome::Rejected { puzzle: 0, .. }));
    }

    #[test]
    fn test_dispatch_error_leaves_state() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(3);
        let state = engine.start();
        let err = Err(DispatchError::ServiceUnavailable("down".to_string()));
        let (next, outcome) = engine.on_submission(&state, 0, &err, &mut rng).unwrap();
        assert_eq!(next, state);
        assert!(matches!(outcome, SubmissionOutcome::Unjudged { puzzle: 0, .. }));
    }

    #[test]
    fn test_resubmission_is_idempotent() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(3);
        let (after_first, _) = engine
            .on_submission(&engine.start(), 0, &pass(&engine, 0), &mut rng)
            .unwrap();
        let (after_second, outcome) = engine
            .on_submission(&after_first, 0, &pass(&engine, 0), &mut rng)
            .unwrap();
        assert_eq!(after_first, after_second);
        assert!(matches!(outcome, SubmissionOutcome::AlreadyCompleted { puzzle: 0, .. }));
    }

    #[test]
    fn test_result_for_other_puzzle_discarded() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(3);
        let state = engine.start();
        let (next, outcome) = engine.on_submission(&state, 2, &pass(&engine, 2), &mut rng).unwrap();
        assert_eq!(next, state);
        assert_eq!(outcome, SubmissionOutcome::Discarded { puzzle: 2 });
    }

    #[test]
    fn test_cancelled_result_discarded() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(3);
        let state = engine.start();
        let (next, outcome) = engine
            .on_submission(&state, 0, &Err(DispatchError::Cancelled), &mut rng)
            .unwrap();
        assert_eq!(next, state);
        assert_eq!(outcome, SubmissionOutcome::Discarded { puzzle: 0 });
    }

    #[test]
    fn test_out_of_range_is_not_found() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(3);
        let err = engine
            .on_submission(&engine.start(), 9, &pass(&engine, 0), &mut rng)
            .unwrap_err();
        assert!(matches!(err, PortalError::NotFound { index: 9, .. }));
    }

    #[test]
    fn test_navigation_skips_completed_and_stops_at_edges() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(3);
        let mut state = engine.start();
        state = engine.on_submission(&state, 0, &pass(&engine, 0), &mut rng).unwrap().0;
        state = engine.advance(&state);
        assert_eq!(state.pointer, Pointer::Active(2));
        state = engine.on_submission(&state, 2, &pass(&engine, 2), &mut rng).unwrap().0;
        // completion recomputes to the lowest incomplete puzzle
        assert_eq!(state.pointer, Pointer::Active(1));

        assert_eq!(engine.retreat(&state).pointer, Pointer::Active(1));
        let forward = engine.advance(&state);
        assert_eq!(forward.pointer, Pointer::Active(3));
        let end = engine.advance(&engine.advance(&forward));
        assert_eq!(end.pointer, Pointer::Active(4));
    }

    #[test]
    fn test_side_challenge_selected_once() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(11);
        let state = complete_all(&engine, &mut rng);
        assert_eq!(state.pointer, Pointer::AllComplete);
        let challenge = state.side_challenge.clone().unwrap();
        assert_eq!(challenge.word, "HAWKINS");

        // A late resubmission must not re-roll the challenge
        let (next, _) = engine.on_submission(&state, 4, &pass(&engine, 4), &mut rng).unwrap();
        assert_eq!(next.side_challenge, Some(challenge));
        assert_eq!(engine.advance(&next), next);
    }

    #[test]
    fn test_finale_requires_side_challenge() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(5);
        let state = complete_all(&engine, &mut rng);
        assert!(matches!(
            engine.submit_final(&state, "x", 0),
            Err(PortalError::Phase(_))
        ));

        let (state, solved) = engine.solve_side_challenge(&state, "nope").unwrap();
        assert!(!solved);
        let (state, solved) = engine.solve_side_challenge(&state, "hawkins").unwrap();
        assert!(solved);

        let (state, ok) = engine.submit_final(&state, "FRAGMENT5", 10).unwrap();
        assert!(!ok);
        assert_eq!(state.final_attempts, 1);
        assert_eq!(state.last_final_result, Some(false));

        let secret = "fragment1fragment2fragment3fragment4fragment5";
        let (state, ok) = engine.submit_final(&state, secret, 20).unwrap();
        assert!(ok);
        assert_eq!(state.finale, FinaleState::Sealed);
        assert_eq!(state.sealed_at, Some(20));
        assert_eq!(state.final_attempts, 1);
    }

    #[test]
    fn test_side_challenge_closed_during_puzzles() {
        let engine = engine();
        assert!(engine.solve_side_challenge(&engine.start(), "HAWKINS").is_err());
    }

    #[test]
    fn test_resume_restarts_pointer_and_fills_missing_challenge() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(9);
        let mut state = complete_all(&engine, &mut rng);
        state.side_challenge = None;
        let id = crate::config::types::ParticipantId::from_verified_email("23a100@example.edu");
        let resumed = engine.resume(&state.to_record(&id), &mut rng).unwrap();
        assert_eq!(resumed.pointer, Pointer::AllComplete);
        assert!(resumed.side_challenge.is_some());
    }

    #[test]
    fn test_resume_rejects_inconsistent_record() {
        let engine = engine();
        let mut rng = fastrand::Rng::with_seed(9);
        let id = crate::config::types::ParticipantId::from_verified_email("23a100@example.edu");
        let mut record = engine.start().to_record(&id);
        record.completed.insert(1);
        assert!(matches!(
            engine.resume(&record, &mut rng),
            Err(PortalError::Invariant(_))
        ));
    }

    #[test]
    fn test_lowercase_catalogue_fragments_are_awarded_and_resumed() {
        let mut sets = crate::puzzle::PuzzleCatalog::builtin().raw_sets();
        for puzzles in sets.values_mut() {
            for puzzle in puzzles.iter_mut() {
                puzzle.fragment = format!(" frag{} ", puzzle.index + 1);
            }
        }
        let catalog = crate::puzzle::PuzzleCatalog::from_sets(sets).unwrap();
        let engine = ProgressionEngine::new(
            catalog.for_cohort(crate::config::types::Cohort::CohortA).unwrap(),
            vec!["HAWKINS".to_string()],
            None,
        );
        let mut rng = fastrand::Rng::with_seed(5);

        let (state, outcome) = engine
            .on_submission(&engine.start(), 0, &pass(&engine, 0), &mut rng)
            .unwrap();
        assert!(matches!(
            outcome,
            SubmissionOutcome::Accepted { puzzle: 0, ref fragment, .. } if fragment == "FRAG1"
        ));
        state.check_invariants(engine.puzzle_set()).unwrap();

        let id = crate::config::types::ParticipantId::from_verified_email("23a100@example.edu");
        let resumed = engine.resume(&state.to_record(&id), &mut rng).unwrap();
        assert_eq!(resumed.pointer, Pointer::Active(1));

        let state = complete_all(&engine, &mut rng);
        let state = engine.solve_side_challenge(&state, "HAWKINS").unwrap().0;
        let (state, accepted) = engine
            .submit_final(&state, "frag1frag2frag3frag4frag5", 30)
            .unwrap();
        assert!(accepted);
        assert_eq!(state.phase(), RoundPhase::Sealed);
    }

    #[test]
    fn test_from_config_picks_the_cohort_clues() {
        let config = PortalConfig::default();
        let catalog = crate::puzzle::PuzzleCatalog::builtin();
        let cohort_a = catalog.for_cohort(crate::config::types::Cohort::CohortA).unwrap();
        let cohort_b = catalog.for_cohort(crate::config::types::Cohort::CohortB).unwrap();

        let a = ProgressionEngine::from_config(cohort_a, &config);
        let b = ProgressionEngine::from_config(cohort_b, &config);
        assert_eq!(a.finale_clues().len(), 7);
        assert!(a.finale_clues()[6].ends_with("add #."));
        assert!(b.finale_clues()[6].ends_with("hook: $."));
        assert_ne!(a.finale_clues(), b.finale_clues());
    }
}
