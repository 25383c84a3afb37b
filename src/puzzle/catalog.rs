use crate::config::config::PortalConfig;
use crate::config::presets;
use crate::config::types::{canonical_fragment, Cohort, PortalError, Puzzle, Result};
use crate::config::validator::{validate_catalog, ValidationResult};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Ordered puzzle list for one cohort. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleSet {
    cohort: Cohort,
    puzzles: Vec<Puzzle>,
}

impl PuzzleSet {
    /// Fragment tokens are stored in canonical form.
    pub fn new(cohort: Cohort, mut puzzles: Vec<Puzzle>) -> Self {
        for puzzle in &mut puzzles {
            puzzle.fragment = canonical_fragment(&puzzle.fragment);
        }
        Self { cohort, puzzles }
    }

    pub fn cohort(&self) -> Cohort {
        self.cohort
    }

    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    /// Out-of-range indices are a caller bug, not a participant error.
    pub fn puzzle_at(&self, index: usize) -> Result<&Puzzle> {
        self.puzzles.get(index).ok_or(PortalError::NotFound {
            cohort: self.cohort,
            index,
        })
    }

    /// Index of the puzzle that awards `token`, compared in canonical form.
    pub fn index_of_fragment(&self, token: &str) -> Option<usize> {
        let token = canonical_fragment(token);
        self.puzzles
            .iter()
            .find(|p| p.fragment == token)
            .map(|p| p.index)
    }
}

/// Cohort → puzzle set mapping
#[derive(Debug, Clone)]
pub struct PuzzleCatalog {
    sets: BTreeMap<Cohort, Arc<PuzzleSet>>,
}

impl PuzzleCatalog {
    /// Build from raw sets, rejecting an unsound catalogue.
    pub fn from_sets(sets: BTreeMap<Cohort, Vec<Puzzle>>) -> Result<Self> {
        let mut result = ValidationResult::new();
        validate_catalog(&sets, &mut result);
        result.into_result()?;

        Ok(Self {
            sets: sets
                .into_iter()
                .map(|(cohort, puzzles)| (cohort, Arc::new(PuzzleSet::new(cohort, puzzles))))
                .collect(),
        })
    }

    pub fn builtin() -> Self {
        Self {
            sets: presets::get_builtin_sets()
                .iter()
                .map(|(cohort, puzzles)| (*cohort, Arc::new(PuzzleSet::new(*cohort, puzzles.clone()))))
                .collect(),
        }
    }

    /// Load a JSON catalogue: `{ "cohort_a": [Puzzle, ..], "cohort_b": [..] }`
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PortalError::Config(format!(
                "Failed to read catalogue {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let sets: BTreeMap<Cohort, Vec<Puzzle>> = serde_json::from_str(&content)
            .map_err(|e| PortalError::Config(format!("Failed to parse catalogue JSON: {}", e)))?;
        Self::from_sets(sets)
    }

    /// Catalogue named by the config, or the built-in presets
    pub fn from_config(config: &PortalConfig) -> Result<Self> {
        match &config.catalog {
            Some(path) => {
                log::info!("Loading puzzle catalogue from {}", path.display());
                Self::load_from_file(path)
            }
            None => Ok(Self::builtin()),
        }
    }

    pub fn for_cohort(&self, cohort: Cohort) -> Result<Arc<PuzzleSet>> {
        self.sets
            .get(&cohort)
            .cloned()
            .ok_or_else(|| PortalError::Config(format!("no puzzle set configured for {}", cohort)))
    }

    /// Raw view used by config validation
    pub fn raw_sets(&self) -> BTreeMap<Cohort, Vec<Puzzle>> {
        self.sets
            .iter()
            .map(|(cohort, set)| (*cohort, set.puzzles().to_vec()))
            .collect()
    }
}
