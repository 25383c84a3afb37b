use crate::config::types::{
    canonical_fragment, Cohort, FinaleState, ParticipantId, PortalError, Result,
};
use crate::progression::side_challenge::SideChallenge;
use crate::puzzle::PuzzleSet;
use crate::store::ParticipantRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Current puzzle pointer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pointer {
    Active(usize),
    AllComplete,
}

impl Pointer {
    pub fn index(self) -> Option<usize> {
        match self {
            Pointer::Active(index) => Some(index),
            Pointer::AllComplete => None,
        }
    }
}

/// Coarse round phase, derived from the state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    Puzzles,
    SideChallenge,
    Finale,
    Sealed,
}

/// Per-participant progress over one puzzle set
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressState {
    pub cohort: Cohort,
    pub puzzle_count: usize,
    pub completed: BTreeSet<usize>,
    pub fragments: BTreeSet<String>,
    pub pointer: Pointer,
    pub side_challenge: Option<SideChallenge>,
    pub side_challenge_solved: bool,
    pub finale: FinaleState,
    pub final_attempts: u32,
    pub last_final_result: Option<bool>,
    pub sealed_at: Option<u64>,
}

impl ProgressState {
    pub fn new(cohort: Cohort, puzzle_count: usize) -> Self {
        let mut state = Self {
            cohort,
            puzzle_count,
            completed: BTreeSet::new(),
            fragments: BTreeSet::new(),
            pointer: Pointer::AllComplete,
            side_challenge: None,
            side_challenge_solved: false,
            finale: FinaleState::NotStarted,
            final_attempts: 0,
            last_final_result: None,
            sealed_at: None,
        };
        state.pointer = state.lowest_incomplete();
        state
    }

    pub fn is_complete(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub fn all_complete(&self) -> bool {
        (0..self.puzzle_count).all(|i| self.completed.contains(&i))
    }

    pub fn lowest_incomplete(&self) -> Pointer {
        (0..self.puzzle_count)
            .find(|i| !self.completed.contains(i))
            .map(Pointer::Active)
            .unwrap_or(Pointer::AllComplete)
    }

    pub fn phase(&self) -> RoundPhase {
        if self.finale == FinaleState::Sealed {
            RoundPhase::Sealed
        } else if self.side_challenge_solved {
            RoundPhase::Finale
        } else if self.pointer == Pointer::AllComplete {
            RoundPhase::SideChallenge
        } else {
            RoundPhase::Puzzles
        }
    }

    /// Structural invariants against the set this state belongs to
    pub fn check_invariants(&self, set: &PuzzleSet) -> Result<()> {
        if self.cohort != set.cohort() {
            return Err(PortalError::Invariant(format!(
                "state for {} checked against {} set",
                self.cohort,
                set.cohort()
            )));
        }
        if self.puzzle_count != set.len() {
            return Err(PortalError::Invariant(format!(
                "state tracks {} puzzles, set has {}",
                self.puzzle_count,
                set.len()
            )));
        }
        if let Some(index) = self.completed.iter().find(|i| **i >= self.puzzle_count) {
            return Err(PortalError::Invariant(format!(
                "completed index {} out of range",
                index
            )));
        }
        if self.completed.len() != self.fragments.len() {
            return Err(PortalError::Invariant(format!(
                "{} puzzles completed but {} fragments held",
                self.completed.len(),
                self.fragments.len()
            )));
        }
        for index in &self.completed {
            let fragment = canonical_fragment(&set.puzzle_at(*index)?.fragment);
            if !self.fragments.contains(&fragment) {
                return Err(PortalError::Invariant(format!(
                    "puzzle {} complete without its fragment",
                    index
                )));
            }
        }
        match self.pointer {
            Pointer::Active(index) if index >= self.puzzle_count || self.is_complete(index) => {
                return Err(PortalError::Invariant(format!(
                    "pointer addresses puzzle {} which is not an open puzzle",
                    index
                )));
            }
            Pointer::AllComplete if !self.all_complete() => {
                return Err(PortalError::Invariant(
                    "pointer is AllComplete with puzzles outstanding".to_string(),
                ));
            }
            _ => {}
        }
        if self.side_challenge_solved && self.side_challenge.is_none() {
            return Err(PortalError::Invariant(
                "side challenge solved but never selected".to_string(),
            ));
        }
        if self.finale == FinaleState::Sealed && !self.side_challenge_solved {
            return Err(PortalError::Invariant(
                "finale sealed before the side challenge".to_string(),
            ));
        }
        Ok(())
    }

    /// Durable shape of this state. The pointer is not persisted.
    pub fn to_record(&self, participant_id: &ParticipantId) -> ParticipantRecord {
        ParticipantRecord {
            participant_id: participant_id.clone(),
            cohort: self.cohort,
            completed: self.completed.clone(),
            fragments: self.fragments.clone(),
            finale: self.finale,
            side_challenge: self.side_challenge.clone(),
            side_challenge_solved: self.side_challenge_solved,
            final_attempts: self.final_attempts,
            last_final_result: self.last_final_result,
            sealed_at: self.sealed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_set;

    #[test]
    fn test_new_state_points_at_first_puzzle() {
        let state = ProgressState::new(Cohort::CohortA, 5);
        assert_eq!(state.pointer, Pointer::Active(0));
        assert_eq!(state.phase(), RoundPhase::Puzzles);
        assert!(state.check_invariants(&fixture_set()).is_ok());
    }

    #[test]
    fn test_lowest_incomplete_skips_gaps() {
        let mut state = ProgressState::new(Cohort::CohortA, 5);
        state.completed.extend([0, 1, 3]);
        assert_eq!(state.lowest_incomplete(), Pointer::Active(2));
        state.completed.extend([2, 4]);
        assert_eq!(state.lowest_incomplete(), Pointer::AllComplete);
    }

    #[test]
    fn test_missing_fragment_is_invariant_violation() {
        let mut state = ProgressState::new(Cohort::CohortA, 5);
        state.completed.insert(0);
        state.fragments.insert("FRAGMENT2".to_string());
        state.pointer = Pointer::Active(1);
        assert!(matches!(
            state.check_invariants(&fixture_set()),
            Err(PortalError::Invariant(_))
        ));
    }

    #[test]
    fn test_pointer_on_completed_puzzle_is_invariant_violation() {
        let mut state = ProgressState::new(Cohort::CohortA, 5);
        state.completed.insert(0);
        state.fragments.insert("FRAGMENT1".to_string());
        assert!(state.check_invariants(&fixture_set()).is_err());
    }

    #[test]
    fn test_record_omits_pointer() {
        let state = ProgressState::new(Cohort::CohortB, 5);
        let id = ParticipantId::from_verified_email("24z001@example.edu");
        let record = state.to_record(&id);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("pointer").is_none());
        assert_eq!(json["cohort"], "cohort_b");
    }
}
