//! Testing infrastructure
//!
//! Deterministic stand-ins for the execution service plus fixture puzzles,
//! shared by unit tests, integration tests and benches.

pub mod fixtures;
pub mod scripted;

pub use fixtures::{fixture_puzzle, fixture_set, judged_result};
pub use scripted::{ScriptedExecutionService, ScriptedReply};
