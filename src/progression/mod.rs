//! Participant progression.
//!
//! `ProgressionEngine` is an explicit state machine over a cohort's puzzle
//! set. Inputs are judging outcomes and navigation commands; every transition
//! returns a new `ProgressState` and can be tested without any front end.

pub mod engine;
pub mod side_challenge;
pub mod state;

pub use engine::{ProgressionEngine, SubmissionOutcome};
pub use side_challenge::SideChallenge;
pub use state::{Pointer, ProgressState, RoundPhase};
