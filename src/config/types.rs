/// Core types and structures for the riftgate engine
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Participant classification selecting the puzzle set and clue text.
/// Derived once at authentication and immutable for the session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cohort {
    #[serde(rename = "cohort_a")]
    CohortA,
    #[serde(rename = "cohort_b")]
    CohortB,
}

impl Cohort {
    pub const ALL: [Cohort; 2] = [Cohort::CohortA, Cohort::CohortB];

    /// Map an entry year (1st year, 2nd year) onto a cohort.
    pub fn from_year(year: u32) -> Option<Self> {
        match year {
            1 => Some(Cohort::CohortA),
            2 => Some(Cohort::CohortB),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Cohort::CohortA => "cohort_a",
            Cohort::CohortB => "cohort_b",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Cohort {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "cohort_a" | "1" | "1st" => Ok(Cohort::CohortA),
            "b" | "cohort_b" | "2" | "2nd" => Ok(Cohort::CohortB),
            other => Err(PortalError::Config(format!("unknown cohort: {other}"))),
        }
    }
}

/// Source language of a puzzle. Decides which route of the execution
/// service judges a submission.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "c")]
    C,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque stable participant identity derived from a verified email.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Lowercase hex SHA-256 of the trimmed, lowercased address.
    pub fn from_verified_email(email: &str) -> Self {
        let normalized = email.trim().to_ascii_lowercase();
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single stdin / expected-stdout pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Immutable puzzle definition. Defined at configuration time, never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Puzzle {
    /// Ordinal position within the cohort's set
    pub index: usize,
    /// Cohort whose set owns this puzzle
    pub cohort: Cohort,
    pub language: Language,
    /// Buggy source handed to the participant as the starting editor content
    pub buggy_source: String,
    pub hint: String,
    /// Token awarded on a full pass; unique within the set
    pub fragment: String,
    /// Cases shown to the participant with expected output
    pub visible: Vec<TestCase>,
    /// Cases judged identically but never displayed
    pub hidden: Vec<TestCase>,
}

/// Fragment tokens compare trimmed and uppercased everywhere
pub fn canonical_fragment(token: &str) -> String {
    token.trim().to_uppercase()
}

impl Puzzle {
    /// Full judged case list. Visible cases always precede hidden ones.
    pub fn all_cases(&self) -> Vec<TestCase> {
        self.visible
            .iter()
            .chain(self.hidden.iter())
            .cloned()
            .collect()
    }

    pub fn case_count(&self) -> usize {
        self.visible.len() + self.hidden.len()
    }
}

/// Judged outcome of one case, exactly as reported by the execution service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaseOutcome {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub actual_output: String,
    pub passed: bool,
}

/// Result of one submission attempt. Transient, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SubmissionResult {
    pub submission_id: String,
    /// Per-case outcomes in request order (visible first)
    pub cases: Vec<CaseOutcome>,
    /// Number of leading cases that are visible
    pub visible_count: usize,
    /// Compiler or runtime diagnostic, if the service reported one
    pub diagnostic: Option<String>,
}

impl SubmissionResult {
    pub fn all_passed(&self) -> bool {
        !self.cases.is_empty() && self.cases.iter().all(|c| c.passed)
    }

    pub fn visible(&self) -> &[CaseOutcome] {
        &self.cases[..self.visible_count.min(self.cases.len())]
    }

    pub fn hidden(&self) -> &[CaseOutcome] {
        &self.cases[self.visible_count.min(self.cases.len())..]
    }

    pub fn hidden_passed(&self) -> usize {
        self.hidden().iter().filter(|c| c.passed).count()
    }
}

/// Final round state
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FinaleState {
    #[default]
    #[serde(rename = "not_started")]
    NotStarted,
    #[serde(rename = "sealed")]
    Sealed,
}

/// Failures of the judging round trip. Distinct from a judged case that
/// simply did not match its expected output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("compile error: {0}")]
    CompileError(String),

    #[error("runtime error: {0}")]
    RuntimeError(String),

    #[error("execution service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("execution service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("submission cancelled before a verdict arrived")]
    Cancelled,
}

impl DispatchError {
    /// Stable short label for metrics and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::CompileError(_) => "compile_error",
            DispatchError::RuntimeError(_) => "runtime_error",
            DispatchError::ServiceUnavailable(_) => "service_unavailable",
            DispatchError::Timeout(_) => "timeout",
            DispatchError::Cancelled => "cancelled",
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            DispatchError::CompileError(d) | DispatchError::RuntimeError(d) => Some(d),
            _ => None,
        }
    }
}

/// Identity provider failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("verification code rejected")]
    InvalidCode,

    #[error("identity provider rejected the request: {0}")]
    Rejected(String),

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Custom error types for riftgate
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Puzzle {index} not found in {cohort} set")]
    NotFound { cohort: Cohort, index: usize },

    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("Operation not valid in current phase: {0}")]
    Phase(String),

    #[error("A submission for puzzle {puzzle} is already in flight")]
    SubmissionInFlight { puzzle: usize },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl PortalError {
    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            PortalError::Config(_) => 78,    // Configuration error
            PortalError::Io(_) => 74,        // IO error
            PortalError::Json(_) => 65,      // Data format error
            PortalError::Store(_) => 74,     // IO error
            PortalError::Invariant(_) => 70, // Internal software error
            PortalError::NotFound { .. } => 70,
            PortalError::Identity(IdentityError::Unavailable(_)) => 69, // Service unavailable
            PortalError::Identity(_) => 77,                              // Permission error
            PortalError::Phase(_) => 2,
            PortalError::SubmissionInFlight { .. } => 2,
        }
    }
}

/// Result type alias for riftgate operations
pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(passes: &[bool], visible: usize) -> SubmissionResult {
        SubmissionResult {
            submission_id: "sub_test".to_string(),
            cases: passes
                .iter()
                .enumerate()
                .map(|(i, p)| CaseOutcome {
                    input: i.to_string(),
                    expected_output: "x".to_string(),
                    actual_output: if *p { "x" } else { "y" }.to_string(),
                    passed: *p,
                })
                .collect(),
            visible_count: visible,
            diagnostic: None,
        }
    }

    #[test]
    fn test_participant_id_is_stable_and_case_insensitive() {
        let a = ParticipantId::from_verified_email("24z368@psgtech.ac.in");
        let b = ParticipantId::from_verified_email("  24Z368@PSGTECH.ac.in ");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(a.short().len(), 12);
    }

    #[test]
    fn test_cohort_parsing() {
        assert_eq!("a".parse::<Cohort>().unwrap(), Cohort::CohortA);
        assert_eq!("2nd".parse::<Cohort>().unwrap(), Cohort::CohortB);
        assert!("c".parse::<Cohort>().is_err());
        assert_eq!(Cohort::from_year(2), Some(Cohort::CohortB));
        assert_eq!(Cohort::from_year(3), None);
    }

    #[test]
    fn test_visible_and_hidden_slices() {
        let result = result_with(&[true, true, false, true, true], 2);
        assert_eq!(result.visible().len(), 2);
        assert_eq!(result.hidden().len(), 3);
        assert_eq!(result.hidden_passed(), 2);
        assert!(!result.all_passed());
    }

    #[test]
    fn test_empty_result_never_counts_as_passed() {
        let result = result_with(&[], 0);
        assert!(!result.all_passed());
    }

    #[test]
    fn test_test_case_wire_format() {
        let case = TestCase::new("apple", "Vowel Count = 2");
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["expectedOutput"], "Vowel Count = 2");
    }
}
