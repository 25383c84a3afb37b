/// Test case comparison semantics
///
/// The execution service applies this comparison when it judges a case. The
/// client mirrors it to cross-check the verdicts it is handed; it never
/// replaces them.
use crate::config::types::CaseOutcome;

pub struct TestCaseEvaluator;

impl TestCaseEvaluator {
    /// Canonical form of program output: CRLF/CR folded to LF, trailing
    /// whitespace dropped from every line, surrounding blank space trimmed.
    /// Leading whitespace inside a line is significant and kept.
    pub fn normalize(output: &str) -> String {
        let unified = output.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = unified.lines().map(str::trim_end).collect();
        lines.join("\n").trim().to_string()
    }

    /// Exact match after normalisation. No partial credit.
    pub fn evaluate(actual: &str, expected: &str) -> bool {
        Self::normalize(actual) == Self::normalize(expected)
    }

    /// Positions where the service's verdict disagrees with local comparison.
    pub fn disagreements(cases: &[CaseOutcome]) -> Vec<usize> {
        cases
            .iter()
            .enumerate()
            .filter(|(_, case)| {
                Self::evaluate(&case.actual_output, &case.expected_output) != case.passed
            })
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(TestCaseEvaluator::evaluate("Sum = 6", "Sum = 6"));
        assert!(!TestCaseEvaluator::evaluate("Sum = 7", "Sum = 6"));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert!(TestCaseEvaluator::evaluate("  olleh\n\n", "olleh"));
        assert!(TestCaseEvaluator::evaluate("1 2 3 4 5 \n", "1 2 3 4 5 "));
    }

    #[test]
    fn test_line_endings_ignored() {
        assert!(TestCaseEvaluator::evaluate("a\r\nb\r\n", "a\nb"));
        assert!(TestCaseEvaluator::evaluate("a\rb", "a\nb"));
    }

    #[test]
    fn test_trailing_space_per_line_ignored() {
        assert!(TestCaseEvaluator::evaluate("30 20 \n10 \n", "30 20\n10"));
    }

    #[test]
    fn test_inner_whitespace_is_significant() {
        assert!(!TestCaseEvaluator::evaluate("Sum  = 6", "Sum = 6"));
        assert!(!TestCaseEvaluator::evaluate("a\n  b", "a\nb"));
        assert!(!TestCaseEvaluator::evaluate("a\n\nb", "a\nb"));
    }

    #[test]
    fn test_case_is_significant() {
        assert!(!TestCaseEvaluator::evaluate("NULL", "null"));
    }

    #[test]
    fn test_disagreements() {
        let cases = vec![
            CaseOutcome {
                input: "1".to_string(),
                expected_output: "1".to_string(),
                actual_output: "1\n".to_string(),
                passed: true,
            },
            CaseOutcome {
                input: "2".to_string(),
                expected_output: "2".to_string(),
                actual_output: "3".to_string(),
                passed: true,
            },
        ];
        assert_eq!(TestCaseEvaluator::disagreements(&cases), vec![1]);
    }
}
