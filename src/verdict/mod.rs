//! Test case evaluation and verdict classification
//!
//! Verdicts are pure functions over a judged submission: all cases pass or
//! the puzzle stays incomplete.

pub mod evaluator;
pub mod verdict;

pub use evaluator::TestCaseEvaluator;
pub use verdict::{Verdict, VerdictClassifier};
