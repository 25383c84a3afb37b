use serde::{Deserialize, Serialize};

/// Scrambled-word gate between the puzzle round and the finale.
/// Selected once per participant and persisted, so a retry never re-rolls it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideChallenge {
    pub word: String,
    pub scrambled: String,
}

impl SideChallenge {
    /// Draw a word (with replacement) and shuffle its letters. `None` when
    /// no word in the list can be scrambled.
    pub fn pick(words: &[String], rng: &mut fastrand::Rng) -> Option<Self> {
        let usable: Vec<&String> = words.iter().filter(|w| scramblable(w)).collect();
        if usable.is_empty() {
            return None;
        }
        let word = usable[rng.usize(..usable.len())].trim().to_uppercase();
        let scrambled = scramble(&word, rng);
        Some(Self { word, scrambled })
    }

    pub fn check(&self, answer: &str) -> bool {
        answer.trim().to_uppercase() == self.word
    }
}

fn scramblable(word: &str) -> bool {
    let word = word.trim().to_uppercase();
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => chars.any(|c| c != first),
        None => false,
    }
}

/// Shuffle until the result differs from the word.
fn scramble(word: &str, rng: &mut fastrand::Rng) -> String {
    let mut letters: Vec<char> = word.chars().collect();
    for _ in 0..32 {
        rng.shuffle(&mut letters);
        let candidate: String = letters.iter().collect();
        if candidate != word {
            return candidate;
        }
    }
    // A one-step rotation differs for any word with two distinct letters.
    let mut rotated: Vec<char> = word.chars().collect();
    rotated.rotate_left(1);
    rotated.into_iter().collect()
}
