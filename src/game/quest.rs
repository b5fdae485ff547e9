//! Quest progression.
//!
//! [`QuestState`] is the single owner of progress: which keys are collected, which
//! words they gave, the door animation and the end sequence. Every transition is
//! guarded so it fires at most once, and every transition is announced to
//! subscribers as a [`QuestEvent`] instead of being polled.
//!
//! ```text
//! Exploring -> RiddleActive -> Exploring (one more key) ... -> AllKeysCollected
//!   -> DoorPuzzleActive -> DoorOpening -> DoorOpen -> EndSequence
//! ```

use crate::config::DoorConfig;
use crate::game::audio::{AudioPort, Sound};
use crate::game::collision::ColliderSet;
use crate::game::level::{DOOR_ID, Level};
use crate::game::riddle::{KeyId, Riddle, RiddleBook};
use crate::math::damp;
use crate::math::mat::Mat4;
use crate::renderer::scene::VisualArena;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::{Receiver, Sender, channel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestPhase {
    Exploring,
    RiddleActive { key: KeyId },
    AllKeysCollected,
    DoorPuzzleActive,
    DoorOpening,
    DoorOpen,
    EndSequence,
}

/// Lifecycle of one key. Only ever moves forward, except that closing a riddle
/// without solving it returns the key to `Uncollected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Uncollected,
    RiddleActive,
    Collected,
}

/// Notifications sent to subscribers on every transition.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestEvent {
    RiddleOpened { key: KeyId },
    RiddleClosed { key: KeyId },
    KeyCollected {
        key: KeyId,
        word: String,
        collected: usize,
        total: usize,
    },
    AllKeysCollected,
    DoorPuzzleOpened,
    DoorPuzzleClosed,
    DoorUnlocked,
    DoorColliderReleased,
    EndSequenceStarted,
}

/// Door animation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Door {
    /// Current center height of the door.
    pub offset_y: f32,
    pub open: bool,
    pub collider_released: bool,
}

pub struct QuestState {
    phase: QuestPhase,
    keys: BTreeMap<KeyId, KeyStatus>,
    collected_keys: BTreeSet<KeyId>,
    collected_words: Vec<String>,
    riddles: RiddleBook,
    door: Door,
    door_config: DoorConfig,
    wall_height: f32,
    door_solution: Vec<String>,
    end_sequence_shown: bool,
    subscribers: Vec<Sender<QuestEvent>>,
}

impl QuestState {
    pub fn new(level: &Level, door_config: &DoorConfig) -> Self {
        Self {
            phase: QuestPhase::Exploring,
            keys: level
                .keys
                .iter()
                .map(|k| (k.id.clone(), KeyStatus::Uncollected))
                .collect(),
            collected_keys: BTreeSet::new(),
            collected_words: Vec::new(),
            riddles: level.riddles.clone(),
            door: Door {
                offset_y: level.door.closed_center.y(),
                open: false,
                collider_released: false,
            },
            door_config: door_config.clone(),
            wall_height: level.config.wall_height,
            door_solution: level.config.door_solution.iter().map(|w| w.to_uppercase()).collect(),
            end_sequence_shown: false,
            subscribers: Vec::new(),
        }
    }

    /// Registers a new listener. Dropped receivers are pruned on the next event.
    pub fn subscribe(&mut self) -> Receiver<QuestEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: QuestEvent) {
        debug!("Quest event: {:?}", event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn enter(&mut self, phase: QuestPhase) {
        info!("Quest: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    pub fn phase(&self) -> &QuestPhase {
        &self.phase
    }

    pub fn key_status(&self, key: &KeyId) -> Option<KeyStatus> {
        self.keys.get(key).copied()
    }

    pub fn collected_keys(&self) -> &BTreeSet<KeyId> {
        &self.collected_keys
    }

    /// Words in the order they were collected.
    pub fn collected_words(&self) -> &[String] {
        &self.collected_words
    }

    pub fn total_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn all_keys_collected(&self) -> bool {
        self.collected_keys.len() == self.keys.len()
    }

    pub fn door(&self) -> &Door {
        &self.door
    }

    pub fn door_solution(&self) -> &[String] {
        &self.door_solution
    }

    pub fn end_sequence_shown(&self) -> bool {
        self.end_sequence_shown
    }

    /// Whether any overlay owned by the quest is currently open.
    pub fn overlay_open(&self) -> bool {
        matches!(
            self.phase,
            QuestPhase::RiddleActive { .. } | QuestPhase::DoorPuzzleActive
        )
    }

    pub fn riddle_active(&self) -> bool {
        matches!(self.phase, QuestPhase::RiddleActive { .. })
    }

    pub fn can_begin_riddle(&self, key: &KeyId) -> bool {
        self.phase == QuestPhase::Exploring && self.key_status(key) == Some(KeyStatus::Uncollected)
    }

    /// Opens the riddle bound to `key`.
    ///
    /// Returns the riddle to show, or `None` when the key is not eligible (already
    /// collected, or another riddle or the door puzzle is open).
    pub fn begin_riddle(&mut self, key: &KeyId) -> Option<Riddle> {
        if !self.can_begin_riddle(key) {
            return None;
        }
        let riddle = self.riddles.riddle_for(key)?.clone();
        self.keys.insert(key.clone(), KeyStatus::RiddleActive);
        self.enter(QuestPhase::RiddleActive { key: key.clone() });
        self.emit(QuestEvent::RiddleOpened { key: key.clone() });
        Some(riddle)
    }

    /// The riddle overlay reported a correct answer for `key`.
    ///
    /// Collects the key, adds its word, removes the key from the world and plays the
    /// pickup sounds. Ignored unless that key's riddle is the active one.
    pub fn on_riddle_solved(
        &mut self,
        key: &KeyId,
        audio: &mut dyn AudioPort,
        visuals: &mut VisualArena,
    ) -> bool {
        if self.phase != (QuestPhase::RiddleActive { key: key.clone() }) {
            return false;
        }
        let Some(word) = self.riddles.riddle_for(key).map(Riddle::word) else {
            return false;
        };

        self.keys.insert(key.clone(), KeyStatus::Collected);
        self.collected_keys.insert(key.clone());
        self.collected_words.push(word.clone());
        visuals.release(key.as_str());
        audio.play(Sound::KeyPickup, 1.0);
        audio.play(Sound::RiddleSuccess, 1.0);

        info!(
            "Collected {} ({}/{}): {}",
            key,
            self.collected_keys.len(),
            self.keys.len(),
            word
        );
        self.emit(QuestEvent::KeyCollected {
            key: key.clone(),
            word,
            collected: self.collected_keys.len(),
            total: self.keys.len(),
        });

        if self.all_keys_collected() {
            self.enter(QuestPhase::AllKeysCollected);
            self.emit(QuestEvent::AllKeysCollected);
        } else {
            self.enter(QuestPhase::Exploring);
        }
        true
    }

    /// The riddle overlay was dismissed without an answer. The key stays in the world.
    pub fn on_riddle_closed(&mut self, key: &KeyId) -> bool {
        if self.phase != (QuestPhase::RiddleActive { key: key.clone() }) {
            return false;
        }
        self.keys.insert(key.clone(), KeyStatus::Uncollected);
        self.enter(QuestPhase::Exploring);
        self.emit(QuestEvent::RiddleClosed { key: key.clone() });
        true
    }

    pub fn can_begin_door_puzzle(&self) -> bool {
        self.phase == QuestPhase::AllKeysCollected
    }

    /// Opens the word lock. Returns the words to arrange and the required order.
    pub fn begin_door_puzzle(&mut self) -> Option<(Vec<String>, Vec<String>)> {
        if !self.can_begin_door_puzzle() {
            return None;
        }
        self.enter(QuestPhase::DoorPuzzleActive);
        self.emit(QuestEvent::DoorPuzzleOpened);
        Some((self.collected_words.clone(), self.door_solution.clone()))
    }

    /// The word lock reported the exact solution. Starts the door lifting.
    pub fn on_door_puzzle_solved(&mut self, audio: &mut dyn AudioPort) -> bool {
        if self.phase != QuestPhase::DoorPuzzleActive || self.door.open {
            return false;
        }
        self.door.open = true;
        audio.play(Sound::DoorUnlock, 1.0);
        audio.play(Sound::DoorCreak, 0.8);
        self.enter(QuestPhase::DoorOpening);
        self.emit(QuestEvent::DoorUnlocked);
        true
    }

    pub fn on_door_puzzle_closed(&mut self) -> bool {
        if self.phase != QuestPhase::DoorPuzzleActive {
            return false;
        }
        self.enter(QuestPhase::AllKeysCollected);
        self.emit(QuestEvent::DoorPuzzleClosed);
        true
    }

    /// Height the door's center rises to.
    pub fn door_target_y(&self) -> f32 {
        self.wall_height + self.door_config.open_lift
    }

    /// Advances the door animation by `delta` seconds.
    ///
    /// While open, the door center eases towards [`QuestState::door_target_y`] and its
    /// collider box follows it every frame. The collider is deactivated once, when the
    /// center passes `wall_height - release_margin`.
    pub fn update_door(&mut self, delta: f32, colliders: &mut ColliderSet, visuals: &mut VisualArena) {
        if !self.door.open {
            return;
        }
        let target = self.door_target_y();
        if (target - self.door.offset_y).abs() < 1e-4 && self.door.collider_released {
            return;
        }

        self.door.offset_y = damp(self.door.offset_y, target, self.door_config.damp_rate, delta);

        let Some(collider) = colliders.get_mut(DOOR_ID) else {
            return;
        };
        let center = collider.center().with_y(self.door.offset_y);
        collider.set_center(center);
        if let Some(handle) = collider.visual() {
            visuals.set_transform(handle, Mat4::translation(center.x(), center.y(), center.z()));
        }

        if !self.door.collider_released
            && self.door.offset_y > self.wall_height - self.door_config.release_margin
            && collider.deactivate()
        {
            self.door.collider_released = true;
            info!("Door collider released at y = {:.2}", self.door.offset_y);
            if self.phase == QuestPhase::DoorOpening {
                self.enter(QuestPhase::DoorOpen);
            }
            self.emit(QuestEvent::DoorColliderReleased);
        }
    }

    pub fn can_begin_end_sequence(&self) -> bool {
        self.door.open && !self.end_sequence_shown
    }

    /// Plays the celebration at the chest. Fires once per session.
    pub fn begin_end_sequence(&mut self, audio: &mut dyn AudioPort) -> bool {
        if !self.can_begin_end_sequence() {
            return false;
        }
        self.end_sequence_shown = true;
        audio.play(Sound::ChestOpen, 1.0);
        audio.play(Sound::PartyHorn, 1.0);
        audio.play(Sound::MagicalSparkle, 1.0);
        audio.start_music(Sound::HappyBirthday);
        self.enter(QuestPhase::EndSequence);
        self.emit(QuestEvent::EndSequenceStarted);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelConfig;
    use crate::test_support::RecordingAudio;
    use approx::assert_abs_diff_eq;

    fn setup() -> (Level, QuestState) {
        let level = Level::build(&LevelConfig::default()).expect("level");
        let quest = QuestState::new(&level, &DoorConfig::default());
        (level, quest)
    }

    fn collect_all(quest: &mut QuestState, level: &Level) {
        let mut audio = RecordingAudio::default();
        let mut visuals = VisualArena::new();
        for key in &level.keys {
            assert!(quest.begin_riddle(&key.id).is_some());
            assert!(quest.on_riddle_solved(&key.id, &mut audio, &mut visuals));
        }
    }

    /// Solving a riddle collects the key's word once; repeats change nothing.
    #[test]
    fn test_key_collection_is_idempotent() {
        let (_, mut quest) = setup();
        let mut audio = RecordingAudio::default();
        let mut visuals = VisualArena::new();
        let oak = KeyId::new("key-oak");

        let riddle = quest.begin_riddle(&oak).expect("riddle opens");
        assert_eq!(riddle.word(), "ROBUST");
        assert!(quest.begin_riddle(&oak).is_none());
        assert!(quest.on_riddle_solved(&oak, &mut audio, &mut visuals));

        for _ in 0..5 {
            assert!(quest.begin_riddle(&oak).is_none());
            assert!(!quest.on_riddle_solved(&oak, &mut audio, &mut visuals));
        }
        assert_eq!(quest.collected_words(), ["ROBUST".to_string()]);
        assert_eq!(audio.played(Sound::KeyPickup), 1);
        assert_eq!(quest.phase(), &QuestPhase::Exploring);
    }

    /// Only one riddle can be open; a second key waits until the first is resolved.
    #[test]
    fn test_one_riddle_at_a_time() {
        let (_, mut quest) = setup();
        let oak = KeyId::new("key-oak");
        let jest = KeyId::new("key-jest");
        assert!(quest.begin_riddle(&oak).is_some());
        assert!(quest.begin_riddle(&jest).is_none());

        assert!(quest.on_riddle_closed(&oak));
        assert_eq!(quest.key_status(&oak), Some(KeyStatus::Uncollected));
        assert!(quest.begin_riddle(&jest).is_some());
    }

    #[test]
    fn test_door_puzzle_requires_all_keys() {
        let (level, mut quest) = setup();
        assert!(quest.begin_door_puzzle().is_none());

        let events = quest.subscribe();
        collect_all(&mut quest, &level);
        assert_eq!(quest.phase(), &QuestPhase::AllKeysCollected);
        assert!(events.try_iter().any(|e| e == QuestEvent::AllKeysCollected));

        let (words, order) = quest.begin_door_puzzle().expect("door puzzle opens");
        assert_eq!(words.len(), 4);
        assert_eq!(order, ["BOTTLENECK", "QUEEF", "ROBUST", "REPENNY"]);
    }

    /// The door rises monotonically and its collider is released exactly once.
    #[test]
    fn test_door_opening_is_monotonic() {
        let (mut level, mut quest) = setup();
        let mut audio = RecordingAudio::default();
        let mut visuals = VisualArena::new();
        let events = quest.subscribe();
        collect_all(&mut quest, &level);
        quest.begin_door_puzzle();
        assert!(quest.on_door_puzzle_solved(&mut audio));
        assert!(!quest.on_door_puzzle_solved(&mut audio));
        assert!(quest.door().open);

        let mut previous = quest.door().offset_y;
        let mut released_at = None;
        for frame in 0..300 {
            quest.update_door(1.0 / 60.0, &mut level.colliders, &mut visuals);
            let y = quest.door().offset_y;
            assert!(y >= previous);
            assert!(y <= quest.door_target_y() + 1e-6);
            let door = level.colliders.get(DOOR_ID).expect("door");
            assert_abs_diff_eq!(door.aabb().center().y(), y, epsilon = 1e-5);
            if !door.is_active() && released_at.is_none() {
                released_at = Some(frame);
                assert!(y > 3.0 - 0.2);
            }
            previous = y;
        }

        assert!(released_at.is_some());
        assert_abs_diff_eq!(quest.door().offset_y, 3.1, epsilon = 1e-3);
        assert_eq!(quest.phase(), &QuestPhase::DoorOpen);
        let releases = events
            .try_iter()
            .filter(|e| *e == QuestEvent::DoorColliderReleased)
            .count();
        assert_eq!(releases, 1);
    }

    #[test]
    fn test_end_sequence_once() {
        let (level, mut quest) = setup();
        let mut audio = RecordingAudio::default();
        assert!(!quest.begin_end_sequence(&mut audio));

        collect_all(&mut quest, &level);
        quest.begin_door_puzzle();
        quest.on_door_puzzle_solved(&mut audio);
        assert!(quest.begin_end_sequence(&mut audio));
        assert!(!quest.begin_end_sequence(&mut audio));
        assert_eq!(audio.music, vec![Sound::HappyBirthday]);
        assert_eq!(audio.played(Sound::PartyHorn), 1);
    }

    /// Reaching the chest while the door is still rising keeps the session in the end
    /// sequence once the collider is released.
    #[test]
    fn test_end_sequence_survives_late_collider_release() {
        let (mut level, mut quest) = setup();
        let mut audio = RecordingAudio::default();
        let mut visuals = VisualArena::new();
        collect_all(&mut quest, &level);
        quest.begin_door_puzzle();
        assert!(quest.on_door_puzzle_solved(&mut audio));

        for _ in 0..3 {
            quest.update_door(1.0 / 60.0, &mut level.colliders, &mut visuals);
        }
        assert!(!quest.door().collider_released);
        assert!(quest.begin_end_sequence(&mut audio));

        let events = quest.subscribe();
        for _ in 0..300 {
            quest.update_door(1.0 / 60.0, &mut level.colliders, &mut visuals);
        }
        assert!(quest.door().collider_released);
        assert_eq!(quest.phase(), &QuestPhase::EndSequence);
        assert!(events.try_iter().any(|e| e == QuestEvent::DoorColliderReleased));
        assert!(!quest.begin_end_sequence(&mut audio));
    }

    /// Dropped subscribers do not stop the others from being notified.
    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let (_, mut quest) = setup();
        let dropped = quest.subscribe();
        let kept = quest.subscribe();
        drop(dropped);

        quest.begin_riddle(&KeyId::new("key-flask"));
        assert_eq!(
            kept.try_recv().ok(),
            Some(QuestEvent::RiddleOpened {
                key: KeyId::new("key-flask")
            })
        );
        assert_eq!(quest.subscribers.len(), 1);
    }
}
