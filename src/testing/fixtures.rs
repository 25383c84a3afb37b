use crate::config::types::{
    CaseOutcome, Cohort, Language, Puzzle, SubmissionResult, TestCase,
};
use crate::puzzle::PuzzleSet;

/// Five cohort-A puzzles, two visible and three hidden cases each,
/// awarding `FRAGMENT1`..`FRAGMENT5`.
pub fn fixture_set() -> PuzzleSet {
    PuzzleSet::new(Cohort::CohortA, (0..5).map(fixture_puzzle).collect())
}

pub fn fixture_puzzle(index: usize) -> Puzzle {
    let case = |n: usize| TestCase::new(format!("p{}-in{}", index, n), format!("p{}-out{}", index, n));
    Puzzle {
        index,
        cohort: Cohort::CohortA,
        language: Language::Python,
        buggy_source: format!("print('puzzle {}')\n", index),
        hint: format!("hint {}", index),
        fragment: format!("FRAGMENT{}", index + 1),
        visible: (0..2).map(case).collect(),
        hidden: (2..5).map(case).collect(),
    }
}

/// Judged result echoing `puzzle`'s cases, failing the given positions
pub fn judged_result(puzzle: &Puzzle, failing: &[usize]) -> SubmissionResult {
    SubmissionResult {
        submission_id: format!("sub_fixture_{}", puzzle.index),
        cases: outcomes(&puzzle.all_cases(), failing),
        visible_count: puzzle.visible.len(),
        diagnostic: None,
    }
}

pub(crate) fn outcomes(cases: &[TestCase], failing: &[usize]) -> Vec<CaseOutcome> {
    cases
        .iter()
        .enumerate()
        .map(|(i, case)| {
            let passed = !failing.contains(&i);
            CaseOutcome {
                input: case.input.clone(),
                expected_output: case.expected_output.clone(),
                actual_output: if passed {
                    case.expected_output.clone()
                } else {
                    format!("{}-wrong", case.expected_output)
                },
                passed,
            }
        })
        .collect()
}
