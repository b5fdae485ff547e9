//! Riddle records and answer checking.
//!
//! A [`Riddle`] is plain data. [`RiddleBook`] binds every key to exactly one riddle
//! and refuses inconsistent bindings at level build time, so the rest of the game can
//! look riddles up by key without re-validating. [`RiddleSession`] holds the state of
//! one attempt at answering: typed input, wrong attempts and whether the hint shows.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Wrong submissions needed before the hint is revealed.
pub const HINT_AFTER_ATTEMPTS: u32 = 2;

/// Stable identity of a collectible key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(pub String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        KeyId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of a riddle record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiddleId(pub String);

impl fmt::Display for RiddleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A riddle shown on a scroll when the player reaches a key.
///
/// The answer doubles as the secret word the key contributes to the door lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Riddle {
    pub id: RiddleId,
    pub title: String,
    pub text: String,
    pub hint: String,
    pub answer: String,
}

impl Riddle {
    /// The word this riddle unlocks, always uppercase.
    pub fn word(&self) -> String {
        self.answer.trim().to_uppercase()
    }

    /// Number of letter cells the answer needs.
    pub fn answer_len(&self) -> usize {
        self.word().chars().count()
    }
}

/// Reasons a set of riddles and key bindings is rejected.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RiddleError {
    #[error("riddle '{0}' is defined twice")]
    DuplicateRiddle(RiddleId),
    #[error("riddle '{0}' has an empty answer")]
    EmptyAnswer(RiddleId),
    #[error("key '{0}' is bound twice")]
    DuplicateKey(KeyId),
    #[error("key '{key}' refers to unknown riddle '{riddle}'")]
    UnknownRiddle { key: KeyId, riddle: RiddleId },
    #[error("riddle '{0}' is bound to more than one key")]
    SharedRiddle(RiddleId),
    #[error("word '{0}' is unlocked by more than one riddle")]
    DuplicateWord(String),
}

/// Validated one-to-one mapping from keys to riddles.
#[derive(Debug, Clone, Default)]
pub struct RiddleBook {
    by_key: BTreeMap<KeyId, Riddle>,
}

impl RiddleBook {
    /// Binds every key to its riddle.
    ///
    /// # Errors
    /// Returns [`RiddleError`] when a riddle is duplicated or has no answer, when a
    /// key is bound twice or to an unknown riddle, or when two keys share a riddle or word.
    pub fn new(
        riddles: &[Riddle],
        bindings: impl IntoIterator<Item = (KeyId, RiddleId)>,
    ) -> Result<Self, RiddleError> {
        let mut catalogue: BTreeMap<&RiddleId, &Riddle> = BTreeMap::new();
        for riddle in riddles {
            if riddle.word().is_empty() {
                return Err(RiddleError::EmptyAnswer(riddle.id.clone()));
            }
            if catalogue.insert(&riddle.id, riddle).is_some() {
                return Err(RiddleError::DuplicateRiddle(riddle.id.clone()));
            }
        }

        let mut by_key = BTreeMap::new();
        let mut used_riddles = HashSet::new();
        let mut used_words = HashSet::new();
        for (key, riddle_id) in bindings {
            let riddle = catalogue
                .get(&riddle_id)
                .ok_or_else(|| RiddleError::UnknownRiddle {
                    key: key.clone(),
                    riddle: riddle_id.clone(),
                })?;
            if !used_riddles.insert(riddle_id.clone()) {
                return Err(RiddleError::SharedRiddle(riddle_id));
            }
            if !used_words.insert(riddle.word()) {
                return Err(RiddleError::DuplicateWord(riddle.word()));
            }
            if by_key.contains_key(&key) {
                return Err(RiddleError::DuplicateKey(key));
            }
            by_key.insert(key, (*riddle).clone());
        }

        Ok(Self { by_key })
    }

    pub fn riddle_for(&self, key: &KeyId) -> Option<&Riddle> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Result of submitting the typed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Wrong { attempts: u32, hint_revealed: bool },
}

/// One attempt at answering a riddle.
#[derive(Debug, Clone)]
pub struct RiddleSession {
    riddle: Riddle,
    input: String,
    attempts: u32,
    hint_visible: bool,
    solved: bool,
}

impl RiddleSession {
    pub fn new(riddle: Riddle) -> Self {
        Self {
            riddle,
            input: String::new(),
            attempts: 0,
            hint_visible: false,
            solved: false,
        }
    }

    pub fn riddle(&self) -> &Riddle {
        &self.riddle
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Appends a letter. Non-letters and letters whose uppercase form would run past the
    /// answer length are ignored.
    ///
    /// Returns `true` when the typed input now matches the answer.
    pub fn push_char(&mut self, c: char) -> bool {
        if self.solved || !c.is_alphabetic() {
            return self.solved;
        }
        let upper = c.to_uppercase();
        if self.input.chars().count() + upper.len() > self.riddle.answer_len() {
            return false;
        }
        self.input.extend(upper);
        if self.input == self.riddle.word() {
            self.solved = true;
        }
        self.solved
    }

    pub fn backspace(&mut self) {
        if !self.solved {
            self.input.pop();
        }
    }

    /// Checks the typed input against the answer.
    pub fn submit(&mut self) -> AnswerOutcome {
        if self.solved || self.input.to_uppercase() == self.riddle.word() {
            self.solved = true;
            return AnswerOutcome::Correct;
        }
        self.attempts += 1;
        let was_visible = self.hint_visible;
        if self.attempts >= HINT_AFTER_ATTEMPTS {
            self.hint_visible = true;
        }
        AnswerOutcome::Wrong {
            attempts: self.attempts,
            hint_revealed: self.hint_visible && !was_visible,
        }
    }

    /// Letter cells for display, `_` for cells not yet typed.
    pub fn cells(&self) -> String {
        let mut typed = self.input.chars();
        (0..self.riddle.answer_len())
            .map(|_| typed.next().unwrap_or('_'))
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn riddle(id: &str, title: &str, text: &str, hint: &str, answer: &str) -> Riddle {
    Riddle {
        id: RiddleId(id.to_string()),
        title: title.to_string(),
        text: text.to_string(),
        hint: hint.to_string(),
        answer: answer.to_string(),
    }
}

/// The four scrolls hidden in the castle.
pub fn default_riddles() -> Vec<Riddle> {
    vec![
        riddle(
            "scroll-reflection",
            "The Scroll of Reflection",
            "In chambers of reflection, where souls seek to mend,\n\
             A gathering of friends, where old ways transcend.\n\
             What word do you whisper, when the music grows loud,\n\
             A secret that bonds you, away from the crowd?",
            "Think about that special event you all attended... What did you call it among yourselves?",
            "REPENNY",
        ),
        riddle(
            "scroll-oak",
            "The Scroll of the Old Oak",
            "Storms cannot bend it, the years cannot break,\n\
             It holds through the night and it stands when you wake.\n\
             What word names a thing built stout to the core,\n\
             That weathers each trial and asks for no more?",
            "Engineers love to call their favourite systems this. Six letters, strong and sturdy.",
            "ROBUST",
        ),
        riddle(
            "scroll-flask",
            "The Scroll of the Narrow Neck",
            "The flask may be wide but the pour is still slow,\n\
             For all that it holds through one passage must go.\n\
             What word names the narrowing none can outrun,\n\
             Where many must wait while they pass one by one?",
            "Look at the top of a wine bottle. Then think of a slow queue.",
            "BOTTLENECK",
        ),
        riddle(
            "scroll-jest",
            "The Scroll of the Jester",
            "It slipped out one evening and silenced the hall,\n\
             Then laughter came roaring and toppled us all.\n\
             What word from that night still brings tears to your eyes,\n\
             Five letters of mischief that no one denies?",
            "The inside joke nobody can say with a straight face. Five letters.",
            "QUEEF",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> RiddleBook {
        let riddles = default_riddles();
        RiddleBook::new(
            &riddles,
            [
                (KeyId::new("key-1"), RiddleId("scroll-reflection".into())),
                (KeyId::new("key-2"), RiddleId("scroll-oak".into())),
            ],
        )
        .expect("valid bindings")
    }

    #[test]
    fn test_book_maps_keys_to_riddles() {
        let book = book();
        assert_eq!(book.len(), 2);
        assert_eq!(
            book.riddle_for(&KeyId::new("key-2")).map(Riddle::word),
            Some("ROBUST".to_string())
        );
        assert!(book.riddle_for(&KeyId::new("key-9")).is_none());
    }

    /// Two keys sharing one riddle would collect the same word twice.
    #[test]
    fn test_book_rejects_shared_riddle() {
        let riddles = default_riddles();
        let result = RiddleBook::new(
            &riddles,
            [
                (KeyId::new("a"), RiddleId("scroll-oak".into())),
                (KeyId::new("b"), RiddleId("scroll-oak".into())),
            ],
        );
        assert_eq!(
            result.err(),
            Some(RiddleError::SharedRiddle(RiddleId("scroll-oak".into())))
        );
    }

    #[test]
    fn test_book_rejects_unknown_and_empty() {
        let riddles = default_riddles();
        let unknown = RiddleBook::new(&riddles, [(KeyId::new("a"), RiddleId("nope".into()))]);
        assert!(matches!(unknown, Err(RiddleError::UnknownRiddle { .. })));

        let mut blank = default_riddles();
        blank[0].answer = "  ".into();
        let empty = RiddleBook::new(&blank, []);
        assert!(matches!(empty, Err(RiddleError::EmptyAnswer(_))));
    }

    /// Typing is uppercased, capped at the answer length and solves on match.
    #[test]
    fn test_session_typing() {
        let mut session = RiddleSession::new(default_riddles()[1].clone());
        for c in "rob1ust".chars() {
            session.push_char(c);
        }
        assert_eq!(session.input(), "ROBUST");
        assert!(session.is_solved());
        session.push_char('x');
        session.backspace();
        assert_eq!(session.input(), "ROBUST");
    }

    /// A letter that uppercases to several characters never overruns the answer cells.
    #[test]
    fn test_multi_char_uppercase_stays_in_bounds() {
        let mut session = RiddleSession::new(default_riddles()[1].clone());
        for c in "robus".chars() {
            session.push_char(c);
        }
        assert!(!session.push_char('ß'));
        assert_eq!(session.input(), "ROBUS");
        assert_eq!(session.input().chars().count(), 5);

        session.backspace();
        session.backspace();
        session.push_char('ß');
        assert_eq!(session.input(), "ROBSS");
        assert!(!session.push_char('ß'));
        assert!(!session.push_char('t'));
        assert_eq!(session.input(), "ROBSST");
        assert_eq!(session.cells(), "R O B S S T");
    }

    /// The hint appears on the second wrong submission, never earlier.
    #[test]
    fn test_wrong_answers_reveal_hint() {
        let mut session = RiddleSession::new(default_riddles()[0].clone());
        for c in "PENNY".chars() {
            session.push_char(c);
        }
        assert_eq!(
            session.submit(),
            AnswerOutcome::Wrong {
                attempts: 1,
                hint_revealed: false
            }
        );
        assert!(!session.hint_visible());
        assert_eq!(
            session.submit(),
            AnswerOutcome::Wrong {
                attempts: 2,
                hint_revealed: true
            }
        );
        assert!(session.hint_visible());
        assert_eq!(
            session.submit(),
            AnswerOutcome::Wrong {
                attempts: 3,
                hint_revealed: false
            }
        );
        assert!(!session.is_solved());
    }

    #[test]
    fn test_cells_show_progress() {
        let mut session = RiddleSession::new(default_riddles()[3].clone());
        session.push_char('q');
        session.push_char('u');
        assert_eq!(session.cells(), "Q U _ _ _");
        session.backspace();
        assert_eq!(session.cells(), "Q _ _ _ _");
    }
}
