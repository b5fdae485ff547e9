//! Screen-space overlays: the riddle scroll, the door lock and the HUD.
//!
//! The game core only sees the two port traits below. Overlays report back by sending
//! [`GameEvent`]s on a channel which the frame loop drains and hands to the quest.
//! Every overlay describes what it wants drawn into a [`UiFrame`]; the renderer turns
//! that into panels and text buffers, so none of the layout logic needs a GPU.

pub mod door_lock;
pub mod hud;
pub mod riddle_scroll;

use crate::game::riddle::{KeyId, Riddle};
use std::time::{Duration, Instant};
use winit::keyboard::{Key, NamedKey};

/// Delay between a correct answer and the overlay reporting it solved.
pub const SOLVE_DELAY: Duration = Duration::from_millis(1500);

/// Outcomes reported by overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    RiddleSolved { key: KeyId },
    RiddleClosed { key: KeyId },
    DoorPuzzleSolved,
    DoorPuzzleClosed,
}

/// Shows a riddle and eventually reports `RiddleSolved` or `RiddleClosed`.
pub trait RiddleOverlayPort {
    fn activate(&mut self, key: &KeyId, riddle: &Riddle, expected_answer: &str);
}

/// Shows the word-ordering lock and eventually reports `DoorPuzzleSolved` or `DoorPuzzleClosed`.
pub trait DoorPuzzleOverlayPort {
    fn activate(&mut self, words: &[String], required_order: &[String]);
}

/// Keyboard input routed to whichever overlay is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayInput {
    Char(char),
    Digit(u8),
    Backspace,
    Submit,
    Close,
}

impl OverlayInput {
    pub fn from_winit(key: &Key) -> Option<Self> {
        match key {
            Key::Named(NamedKey::Escape) => Some(OverlayInput::Close),
            Key::Named(NamedKey::Enter) => Some(OverlayInput::Submit),
            Key::Named(NamedKey::Backspace) => Some(OverlayInput::Backspace),
            Key::Character(s) => {
                let c = s.chars().next()?;
                match c.to_digit(10) {
                    Some(d) => Some(OverlayInput::Digit(d as u8)),
                    None if c.is_alphabetic() => Some(OverlayInput::Char(c)),
                    None => None,
                }
            }
            _ => None,
        }
    }
}

/// A value that becomes available once a wall-clock deadline passes.
#[derive(Debug, Clone)]
pub struct Deferred<T> {
    due: Instant,
    value: Option<T>,
}

impl<T> Deferred<T> {
    pub fn new(now: Instant, delay: Duration, value: T) -> Self {
        Self {
            due: now + delay,
            value: Some(value),
        }
    }

    /// Yields the value exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if now >= self.due { self.value.take() } else { None }
    }

    /// Yields the value immediately regardless of the deadline.
    pub fn take_now(&mut self) -> Option<T> {
        self.value.take()
    }
}

/// A filled rounded rectangle in screen pixels, origin top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct UiPanel {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: [f32; 4],
    pub corner_radius: f32,
}

/// A block of text in screen pixels, keyed by a stable id so buffers can be reused.
#[derive(Debug, Clone, PartialEq)]
pub struct UiText {
    pub id: &'static str,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub max_width: f32,
    pub font_size: f32,
    pub color: [u8; 3],
}

/// Everything the overlays want drawn this frame.
#[derive(Debug, Clone, Default)]
pub struct UiFrame {
    pub panels: Vec<UiPanel>,
    pub texts: Vec<UiText>,
}

impl UiFrame {
    pub fn clear(&mut self) {
        self.panels.clear();
        self.texts.clear();
    }

    pub fn panel(&mut self, x: f32, y: f32, width: f32, height: f32, color: [f32; 4]) {
        self.panels.push(UiPanel {
            x,
            y,
            width,
            height,
            color,
            corner_radius: 12.0,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn text(
        &mut self,
        id: &'static str,
        text: impl Into<String>,
        x: f32,
        y: f32,
        max_width: f32,
        font_size: f32,
        color: [u8; 3],
    ) {
        self.texts.push(UiText {
            id,
            text: text.into(),
            x,
            y,
            max_width,
            font_size,
            color,
        });
    }

    pub fn find_text(&self, id: &str) -> Option<&UiText> {
        self.texts.iter().find(|t| t.id == id)
    }
}

/// Scales pixel sizes relative to a 1080p reference height.
pub fn ui_scale(height: f32) -> f32 {
    (height / 1080.0).clamp(0.7, 2.0)
}
