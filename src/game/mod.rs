//! Game state management module.
//!
//! This module defines the [`GameState`] struct, which owns everything that changes
//! while a session runs: the player, the level colliders, quest progress and the
//! proximity triggers. [`GameState::step`] advances one frame in a fixed order:
//!
//! 1. Frame delta from the [`FrameClock`] (uncapped)
//! 2. Player kinematics (movement suppressed while an overlay is open)
//! 3. Footstep loop
//! 4. Proximity triggers
//! 5. Door animation and collider release
//! 6. Idle prop animation and the player's visual transform

pub mod audio;
pub mod collision;
pub mod door_puzzle;
pub mod keys;
pub mod level;
pub mod player;
pub mod props;
pub mod quest;
pub mod riddle;
pub mod triggers;

use self::audio::{AudioPort, FootstepTracker, Sound};
use self::keys::{KeyState, MovementIntent};
use self::level::{Level, LevelError, PLAYER_ID};
use self::player::Player;
use self::quest::QuestState;
use self::triggers::{TriggerFired, TriggerSystem};
use crate::config::GameConfig;
use crate::renderer::primitives::Vertex;
use crate::renderer::scene::VisualArena;
use crate::ui::{DoorPuzzleOverlayPort, GameEvent, RiddleOverlayPort};
use log::{debug, info};
use std::time::{Duration, Instant};

/// Frame timing: delta between frames and a once-per-second FPS count.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Time of the last frame.
    pub last_frame_time: Instant,
    /// Time elapsed since the last frame (seconds).
    pub delta_time: f32,
    /// Seconds since the session started, summed from deltas.
    pub elapsed: f32,
    pub frame_count: u32,
    pub current_fps: u32,
    last_fps_time: Instant,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            last_frame_time: now,
            delta_time: 0.0,
            elapsed: 0.0,
            frame_count: 0,
            current_fps: 0,
            last_fps_time: now,
        }
    }

    /// Advances to `now` and returns the delta in seconds.
    ///
    /// The delta is not capped: a long stall produces one long step.
    pub fn tick(&mut self, now: Instant) -> f32 {
        self.delta_time = now.saturating_duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        self.elapsed += self.delta_time;

        self.frame_count += 1;
        if now.saturating_duration_since(self.last_fps_time) >= Duration::from_secs(1) {
            self.current_fps = self.frame_count;
            self.frame_count = 0;
            self.last_fps_time = now;
        }
        self.delta_time
    }
}

/// Represents the entire mutable state of a session.
pub struct GameState {
    /// The player character.
    pub player: Player,
    /// Colliders, keys, door layout and props.
    pub level: Level,
    pub quest: QuestState,
    pub triggers: TriggerSystem,
    /// Held movement keys.
    pub keys: KeyState,
    pub footsteps: FootstepTracker,
    pub clock: FrameClock,
    /// Whether the cursor is captured for camera movement.
    pub capture_mouse: bool,
}

impl GameState {
    /// Builds the level and places the player at the configured spawn.
    ///
    /// # Errors
    /// Returns a [`LevelError`] when the level config is inconsistent.
    pub fn new(config: &GameConfig, now: Instant) -> Result<Self, LevelError> {
        let level = Level::build(&config.level)?;
        let player = Player::new(&config.player);
        let quest = QuestState::new(&level, &config.door);
        let triggers = TriggerSystem::new(&level, &config.triggers, config.player.floor_y());
        info!(
            "Session ready: {} keys, spawn at {:?}",
            level.keys.len(),
            player.position
        );

        Ok(Self {
            player,
            level,
            quest,
            triggers,
            keys: KeyState::new(),
            footsteps: FootstepTracker::default(),
            clock: FrameClock::new(now),
            capture_mouse: false,
        })
    }

    /// Registers every entity's mesh and starts the ambient music.
    pub fn begin(&mut self, visuals: &mut VisualArena, player_mesh: Vec<Vertex>, audio: &mut dyn AudioPort) {
        self.level.spawn_visuals(visuals, player_mesh);
        if let Some(handle) = visuals.handle_of(PLAYER_ID) {
            visuals.set_transform(handle, self.player.body_transform());
        }
        audio.start_music(Sound::MedievalAmbient);
    }

    pub fn overlay_open(&self) -> bool {
        self.quest.overlay_open()
    }

    /// Mouse look, only while the cursor is captured and no overlay is up.
    pub fn mouse_movement(&mut self, delta_x: f64, delta_y: f64) {
        if self.capture_mouse && !self.overlay_open() {
            self.player.mouse_movement(delta_x, delta_y);
        }
    }

    /// Advances the session by one frame.
    ///
    /// # Returns
    ///
    /// What the proximity triggers fired this frame.
    pub fn step(
        &mut self,
        now: Instant,
        audio: &mut dyn AudioPort,
        riddles: &mut dyn RiddleOverlayPort,
        door: &mut dyn DoorPuzzleOverlayPort,
        visuals: &mut VisualArena,
    ) -> Vec<TriggerFired> {
        let delta = self.clock.tick(now);

        let intent = if self.overlay_open() {
            MovementIntent::default()
        } else {
            self.keys.movement_intent()
        };
        let moving = self.player.update_kinematics(intent, &self.level.colliders, delta);
        self.footsteps.update(moving, audio);

        let fired = self.triggers.update(
            self.player.position,
            now,
            &mut self.quest,
            audio,
            riddles,
            door,
        );
        for event in &fired {
            if let TriggerFired::RiddleOpened(key) = event {
                debug!("Unrolling scroll for {}", key);
                audio.play(Sound::ParchmentUnfurl, 0.6);
            }
        }

        self.quest.update_door(delta, &mut self.level.colliders, visuals);
        self.level.animate(self.clock.elapsed, visuals);
        if let Some(handle) = visuals.handle_of(PLAYER_ID) {
            visuals.set_transform(handle, self.player.body_transform());
        }

        fired
    }

    /// Applies an overlay outcome to the quest.
    pub fn handle_event(&mut self, event: GameEvent, audio: &mut dyn AudioPort, visuals: &mut VisualArena) {
        let applied = match &event {
            GameEvent::RiddleSolved { key } => self.quest.on_riddle_solved(key, audio, visuals),
            GameEvent::RiddleClosed { key } => self.quest.on_riddle_closed(key),
            GameEvent::DoorPuzzleSolved => self.quest.on_door_puzzle_solved(audio),
            GameEvent::DoorPuzzleClosed => self.quest.on_door_puzzle_closed(),
        };
        if !applied {
            debug!("Ignored stale overlay event {:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::keys::GameKey;
    use crate::game::quest::QuestPhase;
    use crate::game::riddle::KeyId;
    use crate::math::vec::Vec3;
    use crate::test_support::{RecordingAudio, RecordingDoorOverlay, RecordingRiddleOverlay};
    use approx::assert_abs_diff_eq;

    struct Session {
        game: GameState,
        audio: RecordingAudio,
        riddles: RecordingRiddleOverlay,
        door: RecordingDoorOverlay,
        visuals: VisualArena,
        now: Instant,
    }

    impl Session {
        fn new() -> Self {
            let now = Instant::now();
            let mut game = GameState::new(&GameConfig::default(), now).expect("default session");
            let mut audio = RecordingAudio::default();
            let mut visuals = VisualArena::new();
            game.begin(&mut visuals, Vec::new(), &mut audio);
            Self {
                game,
                audio,
                riddles: RecordingRiddleOverlay::default(),
                door: RecordingDoorOverlay::default(),
                visuals,
                now,
            }
        }

        fn frame(&mut self) -> Vec<TriggerFired> {
            self.now += Duration::from_millis(16);
            self.game.step(
                self.now,
                &mut self.audio,
                &mut self.riddles,
                &mut self.door,
                &mut self.visuals,
            )
        }

        fn teleport(&mut self, p: Vec3) {
            self.game.player.position = p.with_y(self.game.player.position.y());
        }

        fn event(&mut self, event: GameEvent) {
            self.game.handle_event(event, &mut self.audio, &mut self.visuals);
        }
    }

    #[test]
    fn test_clock_delta_is_uncapped() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        assert_abs_diff_eq!(clock.tick(start + Duration::from_secs(2)), 2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(clock.elapsed, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_begin_starts_ambient_music() {
        let session = Session::new();
        assert_eq!(session.audio.music, vec![Sound::MedievalAmbient]);
        assert!(session.visuals.handle_of(PLAYER_ID).is_some());
    }

    /// Walking is frozen while a riddle is open.
    #[test]
    fn test_overlay_suppresses_movement() {
        let mut s = Session::new();
        let key = s.game.level.key(&KeyId::new("key-reflection")).expect("key").position;
        s.teleport(key);
        let fired = s.frame();
        assert!(fired.contains(&TriggerFired::RiddleOpened(KeyId::new("key-reflection"))));
        assert_eq!(s.audio.played(Sound::ParchmentUnfurl), 1);

        let before = s.game.player.position;
        s.game.keys.press_key(GameKey::MoveForward);
        for _ in 0..30 {
            s.frame();
        }
        assert_eq!(s.game.player.position, before);
        assert_eq!(s.audio.played(Sound::Footsteps), 0);

        s.event(GameEvent::RiddleClosed { key: KeyId::new("key-reflection") });
        s.frame();
        assert_ne!(s.game.player.position, before);
    }

    /// The full quest: four riddles, the door lock, the door rising and the chest.
    #[test]
    fn test_full_session() {
        let mut s = Session::new();
        let ids: Vec<KeyId> = s.game.level.keys.iter().map(|k| k.id.clone()).collect();

        for id in &ids {
            let p = s.game.level.key(id).expect("key").position;
            s.teleport(p);
            s.frame();
            assert_eq!(s.game.quest.phase(), &QuestPhase::RiddleActive { key: id.clone() });
            s.event(GameEvent::RiddleSolved { key: id.clone() });
        }
        assert_eq!(s.game.quest.phase(), &QuestPhase::AllKeysCollected);
        assert_eq!(s.riddles.activations.len(), 4);

        s.teleport(Vec3::new(0.0, 0.0, 10.0));
        s.frame();
        assert_eq!(s.door.activations.len(), 1);
        s.event(GameEvent::DoorPuzzleSolved);
        assert!(s.game.quest.door().open);

        for _ in 0..240 {
            s.frame();
        }
        assert!(s.game.quest.door().collider_released);
        assert_eq!(s.game.quest.phase(), &QuestPhase::DoorOpen);

        // Walk through the doorway into the chamber.
        s.game.player.yaw = std::f32::consts::PI;
        s.game.keys.press_key(GameKey::MoveForward);
        for _ in 0..150 {
            s.frame();
            if s.game.quest.end_sequence_shown() {
                break;
            }
        }
        s.game.keys.release_key(GameKey::MoveForward);
        assert!(s.game.player.position.z() > 11.75);
        assert!(s.game.quest.end_sequence_shown());
        assert_eq!(s.audio.music.last(), Some(&Sound::HappyBirthday));
    }
}
