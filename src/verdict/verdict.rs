/// Verdict classification
/// Derives a puzzle verdict as a pure function over one judged submission.
use crate::config::types::{Puzzle, SubmissionResult};
use serde::{Deserialize, Serialize};

/// Judged outcome of one submission against one puzzle
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    /// Every visible and hidden case passed in this attempt
    #[serde(rename = "accepted")]
    Accepted,
    /// Ran, but at least one case mismatched
    #[serde(rename = "rejected")]
    Rejected {
        visible_failed: usize,
        hidden_failed: usize,
    },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Verdict classifier - pure function over a submission result
pub struct VerdictClassifier;

impl VerdictClassifier {
    /// Classify a judged result. A result that does not cover exactly the
    /// puzzle's cases can never be accepted.
    pub fn classify(puzzle: &Puzzle, result: &SubmissionResult) -> Verdict {
        let visible_failed = result.visible().iter().filter(|c| !c.passed).count();
        let hidden_failed = result.hidden().iter().filter(|c| !c.passed).count();

        if result.cases.len() == puzzle.case_count()
            && result.visible_count == puzzle.visible.len()
            && result.all_passed()
        {
            return Verdict::Accepted;
        }

        let missing = puzzle.case_count().saturating_sub(result.cases.len());
        Verdict::Rejected {
            visible_failed,
            hidden_failed: hidden_failed + missing,
        }
    }
}
