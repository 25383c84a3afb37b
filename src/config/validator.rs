// Config Validation
// Startup validation: fail fast with actionable errors before any session opens.

use crate::config::config::PortalConfig;
use crate::config::types::{canonical_fragment, Cohort, PortalError, Puzzle, Result};
use std::collections::{BTreeMap, HashSet};

/// Validation result with detailed errors
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Turn accumulated errors into a single config error
    pub fn into_result(self) -> Result<Self> {
        if self.valid {
            for warning in &self.warnings {
                log::warn!("Configuration warning: {}", warning);
            }
            return Ok(self);
        }
        Err(PortalError::Config(format!(
            "Config validation failed:\n{}",
            self.errors.join("\n")
        )))
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate the portal config and the catalogue it will serve
pub fn validate_config(
    config: &PortalConfig,
    sets: &BTreeMap<Cohort, Vec<Puzzle>>,
) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_judge(config, &mut result);
    validate_side_challenge(config, &mut result);
    validate_finale(config, &mut result);
    validate_catalog(sets, &mut result);

    result.into_result()
}

fn validate_judge(config: &PortalConfig, result: &mut ValidationResult) {
    let judge = &config.judge;
    if !(judge.base_url.starts_with("http://") || judge.base_url.starts_with("https://")) {
        result.add_error(format!(
            "judge.base_url must be an http(s) URL, got '{}'",
            judge.base_url
        ));
    }
    if judge.timeout_ms == 0 {
        result.add_error("judge.timeout_ms must be greater than zero".to_string());
    } else if judge.timeout_ms > 120_000 {
        result.add_warning(format!(
            "judge.timeout_ms={} holds a participant for over two minutes",
            judge.timeout_ms
        ));
    }
    for (language, route) in &judge.routes {
        if !route.starts_with('/') {
            result.add_error(format!(
                "judge route for {} must start with '/', got '{}'",
                language, route
            ));
        }
    }
}

fn validate_side_challenge(config: &PortalConfig, result: &mut ValidationResult) {
    let words = &config.side_challenge.words;
    if words.is_empty() {
        result.add_error("side_challenge.words must not be empty".to_string());
        return;
    }
    for word in words {
        let distinct: HashSet<char> = word.trim().to_uppercase().chars().collect();
        if distinct.len() < 2 {
            result.add_error(format!(
                "side challenge word '{}' cannot be scrambled (needs two distinct letters)",
                word
            ));
        }
    }
}

fn validate_finale(config: &PortalConfig, result: &mut ValidationResult) {
    match config.finale.override_phrase.as_deref() {
        Some(phrase) if phrase.trim().is_empty() => {
            result.add_error(
                "finale.override_phrase is blank; use null to disable it".to_string(),
            );
        }
        Some(_) => result.add_warning(
            "finale.override_phrase is set; it is accepted as an alternate final answer"
                .to_string(),
        ),
        None => {}
    }

    for cohort in Cohort::ALL {
        match config.finale.clues.get(&cohort) {
            None => result.add_error(format!("finale.clues has no list for {}", cohort)),
            Some(clues) if clues.is_empty() => {
                result.add_error(format!("finale.clues for {} is empty", cohort))
            }
            Some(clues) if clues.iter().any(|c| c.trim().is_empty()) => {
                result.add_error(format!("finale.clues for {} contains a blank clue", cohort))
            }
            Some(_) => {}
        }
    }
}

/// Catalogue soundness: every cohort present, indices contiguous from zero,
/// fragments unique and non-empty, at least one visible case per puzzle.
pub fn validate_catalog(sets: &BTreeMap<Cohort, Vec<Puzzle>>, result: &mut ValidationResult) {
    for cohort in Cohort::ALL {
        let Some(set) = sets.get(&cohort) else {
            result.add_error(format!("catalogue has no puzzle set for {}", cohort));
            continue;
        };
        if set.is_empty() {
            result.add_error(format!("puzzle set for {} is empty", cohort));
        }

        let mut fragments = HashSet::new();
        for (position, puzzle) in set.iter().enumerate() {
            if puzzle.index != position {
                result.add_error(format!(
                    "{} puzzle at position {} declares index {}",
                    cohort, position, puzzle.index
                ));
            }
            if puzzle.cohort != cohort {
                result.add_error(format!(
                    "{} puzzle {} declares cohort {}",
                    cohort, position, puzzle.cohort
                ));
            }
            if puzzle.fragment.trim().is_empty() {
                result.add_error(format!("{} puzzle {} has an empty fragment", cohort, position));
            } else if !fragments.insert(canonical_fragment(&puzzle.fragment)) {
                result.add_error(format!(
                    "{} puzzle {} reuses fragment '{}'",
                    cohort, position, puzzle.fragment
                ));
            }
            if puzzle.visible.is_empty() {
                result.add_error(format!(
                    "{} puzzle {} has no visible test cases",
                    cohort, position
                ));
            }
            if puzzle.hidden.is_empty() {
                result.add_warning(format!(
                    "{} puzzle {} has no hidden test cases",
                    cohort, position
                ));
            }
        }
    }
}
