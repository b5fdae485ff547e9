//! Keyboard and mouse input handling for the game.
//!
//! This module defines the [`GameKey`] enum for abstracting game actions from physical keys,
//! and provides [`KeyState`] for tracking held keys. Key events only ever flip flags here;
//! the kinematics step reads the resulting [`MovementIntent`] once per frame.
//! It also includes the dispatch table mapping winit key events to game actions.

use crate::game::audio::AudioChannel;
use crate::math::vec::Vec3;
use std::collections::HashSet;
use winit::keyboard;

/// Enum representing all possible in-game actions that can be triggered by keyboard or mouse input.
///
/// This abstraction allows the game logic to be decoupled from specific physical keys or buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKey {
    /// Move player forward (W or Up Arrow).
    MoveForward,
    /// Move player backward (S or Down Arrow).
    MoveBackward,
    /// Move player left (A or Left Arrow).
    MoveLeft,
    /// Move player right (D or Right Arrow).
    MoveRight,
    /// Quit the game (`).
    Quit,
    /// Escape key (release mouse capture).
    Escape,
    /// Turn a channel up (`=` master, `]` music, `.` effects).
    VolumeUp(AudioChannel),
    /// Turn a channel down (`-` master, `[` music, `,` effects).
    VolumeDown(AudioChannel),
    /// Mute or unmute everything (M).
    ToggleMute,
}

/// Local-space movement request built from the held direction keys.
///
/// Forward is local -Z and right is local +X.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementIntent {
    pub x: f32,
    pub z: f32,
}

impl MovementIntent {
    pub fn is_moving(&self) -> bool {
        self.x != 0.0 || self.z != 0.0
    }

    /// Unit direction in local space, or zero when nothing is held.
    ///
    /// Diagonals are normalized so they are not faster than straight moves.
    pub fn direction(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z).normalize()
    }
}

/// Tracks the set of currently pressed game keys.
///
/// Use [`KeyState::press_key`] and [`KeyState::release_key`] to update the state, and
/// [`KeyState::is_pressed`] to query.
#[derive(Debug, Default)]
pub struct KeyState {
    /// Set of currently pressed keys.
    pub pressed_keys: HashSet<GameKey>,
}

impl KeyState {
    /// Creates a new, empty [`KeyState`]
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
        }
    }

    /// Marks a key as pressed.
    pub fn press_key(&mut self, key: GameKey) {
        self.pressed_keys.insert(key);
    }

    /// Marks a key as released.
    pub fn release_key(&mut self, key: GameKey) {
        self.pressed_keys.remove(&key);
    }

    /// Checks if a key is currently pressed.
    pub fn is_pressed(&self, key: GameKey) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Forgets every held key. Used when an overlay takes the keyboard or focus is lost.
    pub fn clear(&mut self) {
        self.pressed_keys.clear();
    }

    /// Combines the held direction keys into a [`MovementIntent`].
    ///
    /// Opposite keys cancel out.
    pub fn movement_intent(&self) -> MovementIntent {
        let axis = |negative: GameKey, positive: GameKey| {
            let mut value = 0.0;
            if self.is_pressed(negative) {
                value -= 1.0;
            }
            if self.is_pressed(positive) {
                value += 1.0;
            }
            value
        };

        MovementIntent {
            x: axis(GameKey::MoveLeft, GameKey::MoveRight),
            z: axis(GameKey::MoveForward, GameKey::MoveBackward),
        }
    }
}

macro_rules! match_char_key {
    ($c:expr, {
        $($key:literal => $variant:expr),* $(,)?
    }) => {{
        match $c.to_ascii_lowercase().as_str() {
            $($key => Some($variant),)*
            _ => None,
        }
    }};
}

macro_rules! match_named_key {
    ($k:expr, {
        $($key:ident => $variant:expr),* $(,)?
    }) => {{
        match $k {
            $(winit::keyboard::NamedKey::$key => Some($variant),)*
            _ => None,
        }
    }};
}

/// Converts a winit [`keyboard::Key`] to a [`GameKey`] if it matches a mapped action.
///
/// Supports both named keys (arrows, escape) and character keys (WASD, backtick, volume).
///
/// # Arguments
/// * `key` - The winit key event to convert.
///
/// # Returns
/// * `Some(GameKey)` if the key maps to a game action.
/// * `None` otherwise.
pub fn winit_key_to_game_key(key: &keyboard::Key) -> Option<GameKey> {
    match key {
        keyboard::Key::Named(named) => match_named_key!(named, {
            ArrowUp => GameKey::MoveForward,
            ArrowDown => GameKey::MoveBackward,
            ArrowLeft => GameKey::MoveLeft,
            ArrowRight => GameKey::MoveRight,
            Escape => GameKey::Escape,
        }),

        keyboard::Key::Character(c) => match_char_key!(c, {
            "w" => GameKey::MoveForward,
            "s" => GameKey::MoveBackward,
            "a" => GameKey::MoveLeft,
            "d" => GameKey::MoveRight,
            "`" => GameKey::Quit,
            "=" => GameKey::VolumeUp(AudioChannel::Master),
            "+" => GameKey::VolumeUp(AudioChannel::Master),
            "-" => GameKey::VolumeDown(AudioChannel::Master),
            "]" => GameKey::VolumeUp(AudioChannel::Music),
            "[" => GameKey::VolumeDown(AudioChannel::Music),
            "." => GameKey::VolumeUp(AudioChannel::Sfx),
            "," => GameKey::VolumeDown(AudioChannel::Sfx),
            "m" => GameKey::ToggleMute,
        }),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use winit::keyboard::{Key, NamedKey, SmolStr};

    #[test]
    fn test_dispatch_table() {
        assert_eq!(
            winit_key_to_game_key(&Key::Character(SmolStr::new("W"))),
            Some(GameKey::MoveForward)
        );
        assert_eq!(
            winit_key_to_game_key(&Key::Named(NamedKey::ArrowLeft)),
            Some(GameKey::MoveLeft)
        );
        assert_eq!(
            winit_key_to_game_key(&Key::Character(SmolStr::new("`"))),
            Some(GameKey::Quit)
        );
        assert_eq!(winit_key_to_game_key(&Key::Character(SmolStr::new("q"))), None);
    }

    #[test]
    fn test_volume_keys() {
        let key = |c: &str| winit_key_to_game_key(&Key::Character(SmolStr::new(c)));
        assert_eq!(key("-"), Some(GameKey::VolumeDown(AudioChannel::Master)));
        assert_eq!(key("="), Some(GameKey::VolumeUp(AudioChannel::Master)));
        assert_eq!(key("+"), key("="));
        assert_eq!(key("["), Some(GameKey::VolumeDown(AudioChannel::Music)));
        assert_eq!(key("."), Some(GameKey::VolumeUp(AudioChannel::Sfx)));
        assert_eq!(key("M"), Some(GameKey::ToggleMute));
    }

    /// With nothing held the direction is exactly zero, never NaN.
    #[test]
    fn test_zero_intent_is_safe() {
        let keys = KeyState::new();
        let intent = keys.movement_intent();
        assert!(!intent.is_moving());
        assert_eq!(intent.direction(), Vec3::ZERO);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut keys = KeyState::new();
        keys.press_key(GameKey::MoveForward);
        keys.press_key(GameKey::MoveBackward);
        assert!(!keys.movement_intent().is_moving());
    }

    /// Diagonal movement is not faster than straight movement.
    #[test]
    fn test_diagonal_is_normalized() {
        let mut keys = KeyState::new();
        keys.press_key(GameKey::MoveForward);
        keys.press_key(GameKey::MoveRight);
        let direction = keys.movement_intent().direction();
        assert_relative_eq!(direction.length(), 1.0, epsilon = 1e-6);
        assert!(direction.x() > 0.0 && direction.z() < 0.0);

        keys.release_key(GameKey::MoveRight);
        assert_eq!(keys.movement_intent().direction(), Vec3::new(0.0, 0.0, -1.0));
    }
}
