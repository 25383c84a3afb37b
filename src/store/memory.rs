use crate::config::types::{ParticipantId, PortalError, Result};
use crate::store::{ParticipantRecord, ProgressStore};
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local store for tests and single-run CLI use
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<ParticipantId, ParticipantRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, participant: &ParticipantId) -> Result<Option<ParticipantRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| PortalError::Store("memory store lock poisoned".to_string()))?;
        Ok(records.get(participant).cloned())
    }

    fn upsert(&self, record: &ParticipantRecord) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| PortalError::Store("memory store lock poisoned".to_string()))?;
        records.insert(record.participant_id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Cohort;
    use crate::progression::ProgressState;

    #[test]
    fn test_upsert_replaces() {
        let store = MemoryStore::new();
        let id = ParticipantId::from_verified_email("23c001@example.edu");
        let mut state = ProgressState::new(Cohort::CohortA, 5);

        store.upsert(&state.to_record(&id)).unwrap();
        state.completed.insert(0);
        state.fragments.insert("FRAGMENT1".to_string());
        store.upsert(&state.to_record(&id)).unwrap();
        store.upsert(&state.to_record(&id)).unwrap();

        assert_eq!(store.len(), 1);
        let loaded = store.load(&id).unwrap().unwrap();
        assert_eq!(loaded.completed.len(), 1);
        assert!(store
            .load(&ParticipantId::from_verified_email("x@y.z"))
            .unwrap()
            .is_none());
    }
}
