//! Word-ordering lock on the door.
//!
//! The collected words are shown shuffled and the player rearranges them until they
//! match the solution exactly. A wrong order is not a failure state; the puzzle just
//! stays open.

use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone)]
pub struct DoorPuzzle {
    items: Vec<String>,
    solution: Vec<String>,
    sentence: String,
}

impl DoorPuzzle {
    /// Creates a puzzle presenting `words` in the given order.
    pub fn new(words: Vec<String>, solution: Vec<String>, sentence: impl Into<String>) -> Self {
        Self {
            items: words,
            solution,
            sentence: sentence.into(),
        }
    }

    /// Creates a puzzle with `words` shuffled by `rng`.
    ///
    /// A shuffle that happens to land on the solution is reshuffled, so the
    /// player always has at least one move to make.
    pub fn shuffled<R: Rng + ?Sized>(
        words: Vec<String>,
        solution: Vec<String>,
        sentence: impl Into<String>,
        rng: &mut R,
    ) -> Self {
        let mut puzzle = Self::new(words, solution, sentence);
        if puzzle.items.len() > 1 {
            for _ in 0..8 {
                puzzle.items.shuffle(rng);
                if !puzzle.is_solved() {
                    break;
                }
            }
        }
        puzzle
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn solution(&self) -> &[String] {
        &self.solution
    }

    /// Moves the word at `from` so it ends up at index `to`, shifting the rest.
    ///
    /// Returns `false` and leaves the order unchanged when `from == to` or either index
    /// is out of range.
    pub fn move_word(&mut self, from: usize, to: usize) -> bool {
        let len = self.items.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let word = self.items.remove(from);
        self.items.insert(to, word);
        true
    }

    pub fn is_solved(&self) -> bool {
        self.items == self.solution
    }

    /// The template sentence with the current words filled into its blanks.
    pub fn sentence_preview(&self) -> String {
        let mut words = self.items.iter();
        let mut out = String::with_capacity(self.sentence.len() + 32);
        for (i, part) in self.sentence.split('_').enumerate() {
            if i > 0 {
                match words.next() {
                    Some(word) => out.push_str(word),
                    None => out.push('_'),
                }
            }
            out.push_str(part);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn solution() -> Vec<String> {
        ["BOTTLENECK", "QUEEF", "ROBUST", "REPENNY"]
            .iter()
            .map(|w| w.to_string())
            .collect()
    }

    fn sentence() -> &'static str {
        "The _ quickens with a sudden _, revealing a _ passage to _"
    }

    #[test]
    fn test_move_word_shifts_others() {
        let words = vec!["ROBUST".into(), "BOTTLENECK".into(), "QUEEF".into(), "REPENNY".into()];
        let mut puzzle = DoorPuzzle::new(words, solution(), sentence());
        assert!(!puzzle.is_solved());

        assert!(puzzle.move_word(0, 2));
        assert_eq!(puzzle.items(), solution().as_slice());
        assert!(puzzle.is_solved());
    }

    /// Moves without a valid target leave the order alone.
    #[test]
    fn test_invalid_moves_are_noops() {
        let mut puzzle = DoorPuzzle::new(solution(), solution(), sentence());
        let before = puzzle.items().to_vec();
        assert!(!puzzle.move_word(1, 1));
        assert!(!puzzle.move_word(4, 0));
        assert!(!puzzle.move_word(0, 9));
        assert_eq!(puzzle.items(), before.as_slice());
    }

    #[test]
    fn test_shuffle_keeps_words_and_is_unsolved() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let puzzle = DoorPuzzle::shuffled(solution(), solution(), sentence(), &mut rng);
            let mut sorted = puzzle.items().to_vec();
            sorted.sort();
            let mut expected = solution();
            expected.sort();
            assert_eq!(sorted, expected);
            assert!(!puzzle.is_solved());
        }
    }

    #[test]
    fn test_sentence_preview() {
        let puzzle = DoorPuzzle::new(solution(), solution(), sentence());
        assert_eq!(
            puzzle.sentence_preview(),
            "The BOTTLENECK quickens with a sudden QUEEF, revealing a ROBUST passage to REPENNY"
        );
    }
}
