//! riftgate: round-progression and puzzle-verification engine for a
//! multi-round event portal
//!
//! # Architecture
//!
//! ## Configuration & Catalogue ([`config`], [`puzzle`])
//! - [`config::config`]: JSON configuration loading with defaults
//! - [`config::types`]: Shared domain types and error enums
//! - [`config::presets`]: Built-in puzzle sets, word list and override phrase
//! - [`config::validator`]: Startup validation of config and catalogue
//! - [`puzzle::catalog`]: Immutable per-cohort puzzle sets
//!
//! ## Judging ([`judge`], [`verdict`])
//! - [`judge::adapter`]: Execution service contract and wire format
//! - [`judge::http`]: HTTP execution service client
//! - [`judge::dispatcher`]: Deadline-bounded, cancellable dispatch
//! - [`verdict::evaluator`]: Output normalization and comparison
//! - [`verdict::verdict`]: All-or-nothing verdict classification
//!
//! ## Progression ([`progression`], [`finale`])
//! - [`progression::state`]: Per-participant progress state and phases
//! - [`progression::engine`]: The state machine over submissions, navigation
//!   and the finale
//! - [`progression::side_challenge`]: Scrambled-word side challenge
//! - [`finale::assembler`]: Canonical secret assembly and final check
//!
//! ## Participants ([`identity`], [`store`], [`session`])
//! - [`identity`]: Verified-email identity and cohort derivation
//! - [`store`]: Durable progress records (memory and file backends)
//! - [`session`]: One participant's session wiring engine, dispatcher and store
//!
//! ## Observability ([`observability`])
//! - [`observability::audit`]: Structured JSON-lines audit events
//! - [`observability::metrics`]: Prometheus metrics export
//!
//! # Design Principles
//!
//! 1. **Transitions are values** - every engine step returns a new state
//! 2. **Persist, then commit** - in-memory state never runs ahead of the store
//! 3. **Failures are not verdicts** - an unjudged submission changes nothing
//! 4. **Monotonic progress** - completions and fragments are never revoked

// Configuration & Catalogue
pub mod config;
pub mod puzzle;

// Judging
pub mod judge;
pub mod verdict;

// Progression
pub mod finale;
pub mod progression;

// Participants
pub mod identity;
pub mod session;
pub mod store;

// Observability
pub mod observability;

// Test doubles and fixtures shared by unit and integration tests
pub mod testing;

// CLI entrypoint wiring for the riftgate binary
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::*;
