//! Parchment scroll showing a key's riddle.
//!
//! Letters typed while the scroll is open fill the answer cells. Enter checks the
//! answer; a wrong one buzzes and, from the second miss on, reveals the hint. A correct
//! answer is reported [`SOLVE_DELAY`] later so the player sees the filled-in word.

use crate::game::audio::{AudioPort, Sound};
use crate::game::riddle::{AnswerOutcome, KeyId, Riddle, RiddleSession};
use crate::ui::{Deferred, GameEvent, OverlayInput, RiddleOverlayPort, SOLVE_DELAY, UiFrame, ui_scale};
use log::{debug, warn};
use std::sync::mpsc::Sender;
use std::time::Instant;

const PARCHMENT: [f32; 4] = [0.91, 0.84, 0.68, 0.97];
const INK: [u8; 3] = [60, 40, 20];
const HINT_INK: [u8; 3] = [140, 70, 30];

#[derive(Debug)]
struct OpenScroll {
    key: KeyId,
    session: RiddleSession,
    solved: Option<Deferred<KeyId>>,
    feedback: Option<String>,
}

pub struct RiddleScroll {
    open: Option<OpenScroll>,
    events: Sender<GameEvent>,
}

impl RiddleScroll {
    pub fn new(events: Sender<GameEvent>) -> Self {
        Self { open: None, events }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn session(&self) -> Option<&RiddleSession> {
        self.open.as_ref().map(|o| &o.session)
    }

    fn send(&self, event: GameEvent) {
        if self.events.send(event).is_err() {
            warn!("Riddle scroll outcome dropped: event queue closed");
        }
    }

    pub fn handle_input(&mut self, input: OverlayInput, now: Instant, audio: &mut dyn AudioPort) {
        if input == OverlayInput::Close {
            self.close();
            return;
        }
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if open.solved.is_some() {
            return;
        }

        let correct = match input {
            OverlayInput::Char(c) => open.session.push_char(c),
            OverlayInput::Backspace => {
                open.session.backspace();
                false
            }
            OverlayInput::Submit => match open.session.submit() {
                AnswerOutcome::Correct => true,
                AnswerOutcome::Wrong { attempts, hint_revealed } => {
                    debug!("Wrong answer for {} ({} attempts)", open.key, attempts);
                    audio.play(Sound::ErrorBuzz, 0.5);
                    open.feedback = Some(if hint_revealed {
                        "Not quite. A hint appears on the parchment...".to_string()
                    } else {
                        "Not quite. Try again.".to_string()
                    });
                    false
                }
            },
            OverlayInput::Digit(_) | OverlayInput::Close => false,
        };

        if correct {
            open.feedback = Some("The key is yours!".to_string());
            open.solved = Some(Deferred::new(now, SOLVE_DELAY, open.key.clone()));
        }
    }

    /// Closes the scroll. A correct answer still waiting on its delay is reported right away.
    pub fn close(&mut self) {
        if let Some(mut open) = self.open.take() {
            match open.solved.as_mut().and_then(Deferred::take_now) {
                Some(key) => self.send(GameEvent::RiddleSolved { key }),
                None => self.send(GameEvent::RiddleClosed { key: open.key }),
            }
        }
    }

    /// Reports a pending solve once its delay has passed.
    pub fn update(&mut self, now: Instant) {
        let due = self
            .open
            .as_mut()
            .and_then(|o| o.solved.as_mut())
            .and_then(|d| d.poll(now));
        if let Some(key) = due {
            self.open = None;
            self.send(GameEvent::RiddleSolved { key });
        }
    }

    pub fn layout(&self, frame: &mut UiFrame, width: f32, height: f32) {
        let Some(open) = &self.open else {
            return;
        };
        let scale = ui_scale(height);
        let w = (640.0 * scale).min(width * 0.9);
        let h = (440.0 * scale).min(height * 0.9);
        let x = (width - w) / 2.0;
        let y = (height - h) / 2.0;
        let pad = 32.0 * scale;
        let inner = w - pad * 2.0;

        frame.panel(0.0, 0.0, width, height, [0.0, 0.0, 0.0, 0.45]);
        frame.panel(x, y, w, h, PARCHMENT);

        let riddle = open.session.riddle();
        frame.text("riddle-title", &riddle.title, x + pad, y + pad, inner, 30.0 * scale, INK);
        frame.text("riddle-text", &riddle.text, x + pad, y + pad + 50.0 * scale, inner, 20.0 * scale, INK);
        frame.text(
            "riddle-cells",
            open.session.cells(),
            x + pad,
            y + h - 150.0 * scale,
            inner,
            28.0 * scale,
            INK,
        );
        if open.session.hint_visible() {
            frame.text(
                "riddle-hint",
                format!("Hint: {}", riddle.hint),
                x + pad,
                y + h - 105.0 * scale,
                inner,
                18.0 * scale,
                HINT_INK,
            );
        }
        if let Some(feedback) = &open.feedback {
            frame.text("riddle-feedback", feedback, x + pad, y + h - 70.0 * scale, inner, 18.0 * scale, INK);
        }
        frame.text(
            "riddle-help",
            "Type the answer, Enter to check, Esc to close",
            x + pad,
            y + h - 38.0 * scale,
            inner,
            14.0 * scale,
            HINT_INK,
        );
    }
}

impl RiddleOverlayPort for RiddleScroll {
    fn activate(&mut self, key: &KeyId, riddle: &Riddle, expected_answer: &str) {
        let mut riddle = riddle.clone();
        if riddle.word() != expected_answer.to_uppercase() {
            warn!(
                "Riddle {} answer differs from expected word for {}; using the expected word",
                riddle.id, key
            );
            riddle.answer = expected_answer.to_string();
        }
        self.open = Some(OpenScroll {
            key: key.clone(),
            session: RiddleSession::new(riddle),
            solved: None,
            feedback: None,
        });
    }
}
