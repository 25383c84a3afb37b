//! Persistence of participant progress.
//!
//! The store sees only the durable record. Writes are full-record upserts
//! issued after every transition, so repeating one is harmless.

pub mod file;
pub mod memory;

use crate::config::types::{Cohort, FinaleState, ParticipantId, Result};
use crate::progression::side_challenge::SideChallenge;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Durable per-participant record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub participant_id: ParticipantId,
    pub cohort: Cohort,
    #[serde(default)]
    pub completed: BTreeSet<usize>,
    #[serde(default)]
    pub fragments: BTreeSet<String>,
    #[serde(default)]
    pub finale: FinaleState,
    #[serde(default)]
    pub side_challenge: Option<SideChallenge>,
    #[serde(default)]
    pub side_challenge_solved: bool,
    #[serde(default)]
    pub final_attempts: u32,
    #[serde(default)]
    pub last_final_result: Option<bool>,
    /// Unix seconds at which the finale was sealed
    #[serde(default)]
    pub sealed_at: Option<u64>,
}

/// Persistence collaborator contract
pub trait ProgressStore: Send + Sync {
    fn load(&self, participant: &ParticipantId) -> Result<Option<ParticipantRecord>>;
    fn upsert(&self, record: &ParticipantRecord) -> Result<()>;
}
