/// Participant session
///
/// Owns one participant's progress and wires the pure engine to its
/// collaborators: the dispatcher for judging, the store for durability and
/// the audit trail. Enforces at most one in-flight submission and cancels it
/// when the participant navigates away.
use crate::config::types::{DispatchError, PortalError, Puzzle, Result, SubmissionResult};
use crate::identity::Identity;
use crate::judge::{DispatchCanceller, SubmissionDispatcher};
use crate::observability::audit::{events, CorrelationIds};
use crate::observability::metrics::get_metrics;
use crate::progression::{ProgressState, ProgressionEngine, SubmissionOutcome};
use crate::store::ProgressStore;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Result of one `submit` call as shown to the participant
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub outcome: SubmissionOutcome,
    /// Judged cases; absent when the submission could not be judged
    pub result: Option<SubmissionResult>,
}

struct InFlight {
    ticket: u64,
    puzzle: usize,
    canceller: DispatchCanceller,
}

struct SessionInner {
    state: ProgressState,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    rng: fastrand::Rng,
}

pub struct ParticipantSession {
    identity: Identity,
    engine: ProgressionEngine,
    dispatcher: SubmissionDispatcher,
    store: Arc<dyn ProgressStore>,
    correlation: CorrelationIds,
    inner: Mutex<SessionInner>,
}

impl ParticipantSession {
    /// Resume the participant's stored progress, or start fresh
    pub fn open(
        identity: Identity,
        engine: ProgressionEngine,
        dispatcher: SubmissionDispatcher,
        store: Arc<dyn ProgressStore>,
    ) -> Result<Self> {
        Self::open_with_rng(identity, engine, dispatcher, store, fastrand::Rng::new())
    }

    /// `open` with a caller-seeded generator for the side challenge draw
    pub fn open_with_rng(
        identity: Identity,
        engine: ProgressionEngine,
        dispatcher: SubmissionDispatcher,
        store: Arc<dyn ProgressStore>,
        mut rng: fastrand::Rng,
    ) -> Result<Self> {
        let correlation =
            CorrelationIds::new().with_participant(identity.participant_id.short());

        if identity.cohort != engine.puzzle_set().cohort() {
            return Err(PortalError::Invariant(format!(
                "participant cohort {} does not match the {} puzzle set",
                identity.cohort,
                engine.puzzle_set().cohort()
            )));
        }

        let record = store.load(&identity.participant_id)?;
        let resumed = record.is_some();
        let state = match &record {
            Some(record) => {
                let state = report_invariant(&correlation, engine.resume(record, &mut rng))?;
                if record.side_challenge.is_none() && state.side_challenge.is_some() {
                    events::side_challenge_selected(&correlation);
                }
                state
            }
            None => engine.start(),
        };

        if record.as_ref() != Some(&state.to_record(&identity.participant_id)) {
            store.upsert(&state.to_record(&identity.participant_id))?;
        }

        get_metrics().sessions_opened.inc();
        events::session_opened(&correlation, identity.cohort, resumed);
        log::info!(
            "Session {} opened for {} ({}, {} of {} complete)",
            correlation.session_id,
            identity.participant_id.short(),
            identity.cohort,
            state.completed.len(),
            state.puzzle_count
        );

        Ok(Self {
            identity,
            engine,
            dispatcher,
            store,
            correlation,
            inner: Mutex::new(SessionInner {
                state,
                in_flight: None,
                next_ticket: 0,
                rng,
            }),
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    /// Finale guidance for the participant's cohort
    pub fn finale_clues(&self) -> &[String] {
        self.engine.finale_clues()
    }

    pub fn correlation(&self) -> &CorrelationIds {
        &self.correlation
    }

    pub fn state(&self) -> Result<ProgressState> {
        Ok(self.lock()?.state.clone())
    }

    /// Puzzle under the pointer, `None` once every puzzle is complete
    pub fn current_puzzle(&self) -> Result<Option<Puzzle>> {
        let inner = self.lock()?;
        match inner.state.pointer.index() {
            Some(index) => Ok(Some(self.engine.puzzle_set().puzzle_at(index)?.clone())),
            None => Ok(None),
        }
    }

    /// Judge `code` against the puzzle under the pointer. Blocks for the
    /// round trip; a second call while one is outstanding is rejected.
    pub fn submit(&self, code: &str) -> Result<SubmissionReport> {
        let (ticket, puzzle, pending) = {
            let mut inner = self.lock()?;
            if let Some(in_flight) = &inner.in_flight {
                return Err(PortalError::SubmissionInFlight {
                    puzzle: in_flight.puzzle,
                });
            }
            let index = inner.state.pointer.index().ok_or_else(|| {
                PortalError::Phase("every puzzle is already complete".to_string())
            })?;
            let puzzle = self.engine.puzzle_set().puzzle_at(index)?.clone();

            let pending = self.dispatcher.dispatch(&puzzle, code);
            inner.next_ticket += 1;
            let ticket = inner.next_ticket;
            inner.in_flight = Some(InFlight {
                ticket,
                puzzle: index,
                canceller: pending.canceller(),
            });
            (ticket, puzzle, pending)
        };

        let correlation = self.correlation.clone().with_submission(pending.submission_id());
        events::submission_start(&correlation, puzzle.index);

        let result = pending.wait();

        let mut inner = self.lock()?;
        if inner.in_flight.as_ref().map(|f| f.ticket) == Some(ticket) {
            inner.in_flight = None;
        }
        self.apply(&mut inner, &correlation, puzzle.index, result)
    }

    fn apply(
        &self,
        inner: &mut SessionInner,
        correlation: &CorrelationIds,
        index: usize,
        result: std::result::Result<SubmissionResult, DispatchError>,
    ) -> Result<SubmissionReport> {
        let SessionInner { state, rng, .. } = inner;
        let (next, outcome) = report_invariant(
            correlation,
            self.engine.on_submission(state, index, &result, rng),
        )?;

        if outcome.changed_state() {
            self.store
                .upsert(&next.to_record(&self.identity.participant_id))?;
        }
        *state = next;

        get_metrics().record_outcome(&outcome);
        match &outcome {
            SubmissionOutcome::Accepted { all_complete, .. } => {
                events::submission_judged(correlation, index, count_passed(&result), case_total(&result));
                events::fragment_awarded(correlation, index, state.fragments.len());
                events::puzzle_completed(correlation, index);
                if *all_complete {
                    events::side_challenge_selected(correlation);
                }
            }
            SubmissionOutcome::Rejected { .. } | SubmissionOutcome::AlreadyCompleted { .. } => {
                events::submission_judged(correlation, index, count_passed(&result), case_total(&result));
            }
            SubmissionOutcome::Unjudged { error, .. } => {
                events::submission_unjudged(correlation, index, error);
            }
            SubmissionOutcome::Discarded { .. } => {
                events::submission_discarded(correlation, index);
            }
        }

        Ok(SubmissionReport {
            outcome,
            result: result.ok(),
        })
    }

    /// Move to the next incomplete puzzle, discarding any in-flight result
    pub fn advance(&self) -> Result<ProgressState> {
        self.navigate(|engine, state| engine.advance(state))
    }

    /// Move to the previous incomplete puzzle, discarding any in-flight result
    pub fn retreat(&self) -> Result<ProgressState> {
        self.navigate(|engine, state| engine.retreat(state))
    }

    fn navigate<F>(&self, step: F) -> Result<ProgressState>
    where
        F: FnOnce(&ProgressionEngine, &ProgressState) -> ProgressState,
    {
        let mut inner = self.lock()?;
        let next = step(&self.engine, &inner.state);
        if next.pointer != inner.state.pointer {
            if let Some(in_flight) = inner.in_flight.take() {
                log::debug!(
                    "Navigation away from puzzle {} cancels its submission",
                    in_flight.puzzle
                );
                in_flight.canceller.cancel();
            }
        }
        inner.state = next;
        Ok(inner.state.clone())
    }

    /// Answer the scrambled-word gate
    pub fn solve_side_challenge(&self, answer: &str) -> Result<bool> {
        let mut inner = self.lock()?;
        let was_solved = inner.state.side_challenge_solved;
        let (next, solved) = self.engine.solve_side_challenge(&inner.state, answer)?;
        if solved && !was_solved {
            self.store
                .upsert(&next.to_record(&self.identity.participant_id))?;
            get_metrics().side_challenges_solved.inc();
            events::side_challenge_solved(&self.correlation);
        }
        inner.state = next;
        Ok(solved)
    }

    /// Check a final answer; a match seals the finale
    pub fn submit_final(&self, candidate: &str) -> Result<bool> {
        let mut inner = self.lock()?;
        let already_sealed = inner.state.finale == crate::config::types::FinaleState::Sealed;
        let (next, accepted) = self.engine.submit_final(&inner.state, candidate, unix_now())?;
        if already_sealed {
            return Ok(accepted);
        }

        self.store
            .upsert(&next.to_record(&self.identity.participant_id))?;
        get_metrics().record_final_attempt(accepted);
        if accepted {
            events::finale_sealed(&self.correlation, next.final_attempts);
        } else {
            events::final_attempt_rejected(&self.correlation, next.final_attempts);
        }
        inner.state = next;
        Ok(accepted)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionInner>> {
        self.inner
            .lock()
            .map_err(|_| PortalError::Invariant("session state lock poisoned".to_string()))
    }
}

/// Invariant violations are fatal to the operation and always reported
fn report_invariant<T>(correlation: &CorrelationIds, result: Result<T>) -> Result<T> {
    if let Err(e @ (PortalError::Invariant(_) | PortalError::NotFound { .. })) = &result {
        log::error!("Invariant violation: {}", e);
        get_metrics().invariant_violations.inc();
        events::invariant_violation(correlation, e.to_string());
    }
    result
}

fn count_passed(result: &std::result::Result<SubmissionResult, DispatchError>) -> usize {
    result
        .as_ref()
        .map(|r| r.cases.iter().filter(|c| c.passed).count())
        .unwrap_or(0)
}

fn case_total(result: &std::result::Result<SubmissionResult, DispatchError>) -> usize {
    result.as_ref().map(|r| r.cases.len()).unwrap_or(0)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
