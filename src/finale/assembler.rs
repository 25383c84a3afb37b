/// Final secret assembly
/// The secret is derived on demand from held fragments, never stored.
use crate::config::types::canonical_fragment;
use crate::puzzle::PuzzleSet;
use std::collections::HashMap;

/// Validates final answers against the index-ordered fragment secret
#[derive(Debug, Clone)]
pub struct FragmentAssembler {
    /// Uppercased token -> originating puzzle index
    order: HashMap<String, usize>,
    override_phrase: Option<String>,
    attempts: u32,
}

impl FragmentAssembler {
    pub fn new(set: &PuzzleSet, override_phrase: Option<String>) -> Self {
        Self {
            order: set
                .puzzles()
                .iter()
                .map(|p| (canonical_fragment(&p.fragment), p.index))
                .collect(),
            override_phrase: override_phrase
                .map(|p| p.trim().to_uppercase())
                .filter(|p| !p.is_empty()),
            attempts: 0,
        }
    }

    /// Resume with a previously counted number of mismatches
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Non-matching submissions so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Known fragments concatenated in puzzle-index order, uppercased.
    /// Insertion order of `fragments` is irrelevant.
    pub fn canonical_secret<I, S>(&self, fragments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered: Vec<(usize, String)> = Vec::new();
        for fragment in fragments {
            let token = canonical_fragment(fragment.as_ref());
            match self.order.get(&token) {
                Some(index) => ordered.push((*index, token)),
                None => log::warn!("Ignoring unknown fragment token '{}'", token),
            }
        }
        ordered.sort_by_key(|(index, _)| *index);
        ordered.dedup_by_key(|(index, _)| *index);
        ordered.into_iter().map(|(_, token)| token).collect()
    }

    /// Case-insensitive, trimmed exact match against the secret or the
    /// override phrase. Every mismatch is counted; there is no lockout.
    pub fn check_final<I, S>(&mut self, candidate: &str, fragments: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidate = candidate.trim().to_uppercase();
        let secret = self.canonical_secret(fragments);

        let matched = (!secret.is_empty() && candidate == secret)
            || self.override_phrase.as_deref() == Some(candidate.as_str());

        if !matched {
            self.attempts = self.attempts.saturating_add(1);
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_set;

    #[test]
    fn test_secret_follows_index_order() {
        let assembler = FragmentAssembler::new(&fixture_set(), None);
        let secret = assembler.canonical_secret(["FRAGMENT2", "FRAGMENT1"]);
        assert_eq!(secret, "FRAGMENT1FRAGMENT2");
    }

    #[test]
    fn test_out_of_order_collection_checks_against_index_order() {
        let mut assembler = FragmentAssembler::new(&fixture_set(), None);
        assert!(!assembler.check_final("FRAGMENT2FRAGMENT1", ["FRAGMENT2", "FRAGMENT1"]));
        assert!(assembler.check_final(" fragment1fragment2 ", ["FRAGMENT2", "FRAGMENT1"]));
        assert_eq!(assembler.attempts(), 1);
    }

    #[test]
    fn test_override_phrase_accepted() {
        let mut assembler =
            FragmentAssembler::new(&fixture_set(), Some("Upside Down".to_string()));
        assert!(assembler.check_final("upside down", ["FRAGMENT1"]));
        assert_eq!(assembler.attempts(), 0);
    }

    #[test]
    fn test_override_disabled() {
        let mut assembler = FragmentAssembler::new(&fixture_set(), None);
        assert!(!assembler.check_final("UPSIDE DOWN", ["FRAGMENT1"]));
    }

    #[test]
    fn test_unknown_tokens_ignored() {
        let assembler = FragmentAssembler::new(&fixture_set(), None);
        assert_eq!(
            assembler.canonical_secret(["bogus", "fragment3"]),
            "FRAGMENT3"
        );
    }

    #[test]
    fn test_empty_secret_never_matches() {
        let mut assembler = FragmentAssembler::new(&fixture_set(), None);
        let none: [&str; 0] = [];
        assert!(!assembler.check_final("", none));
        assert!(!assembler.check_final("   ", none));
        assert_eq!(assembler.attempts(), 2);
    }

    #[test]
    fn test_attempts_resume() {
        let mut assembler = FragmentAssembler::new(&fixture_set(), None).with_attempts(4);
        assembler.check_final("wrong", ["FRAGMENT1"]);
        assert_eq!(assembler.attempts(), 5);
    }
}
