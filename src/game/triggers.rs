//! Distance-based interaction.
//!
//! Each frame the player's position is measured against every point of interest.
//! Two radii apply:
//!
//! * **approach**: plays an ambient cue, rate limited by a wall-clock [`Cooldown`]
//! * **activation**: asks the quest for a transition (open a riddle, open the door
//!   lock, start the end sequence)
//!
//! Activation is edge triggered. A trigger that fired, or whose overlay was dismissed,
//! stays disarmed until the player steps back outside its activation radius. On top of
//! that every activation is guarded by the quest's own eligibility checks, so running
//! this every frame can never fire a transition twice.

use crate::config::TriggerConfig;
use crate::game::audio::{AudioPort, Sound};
use crate::game::level::Level;
use crate::game::quest::QuestState;
use crate::game::riddle::KeyId;
use crate::math::vec::Vec3;
use crate::ui::{DoorPuzzleOverlayPort, RiddleOverlayPort};
use log::debug;
use std::time::{Duration, Instant};

/// Wall-clock rate limiter. Never blocks; it only answers whether `now` is past the deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cooldown {
    until: Option<Instant>,
}

impl Cooldown {
    pub fn ready(&self, now: Instant) -> bool {
        self.until.is_none_or(|until| now >= until)
    }

    pub fn start(&mut self, now: Instant, duration: Duration) {
        self.until = Some(now + duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerTarget {
    Key(KeyId),
    Door,
    Chest,
    Torch(String),
}

#[derive(Debug, Clone)]
pub struct ProximityTrigger {
    pub target: TriggerTarget,
    pub position: Vec3,
    pub approach_radius: f32,
    pub activation_radius: Option<f32>,
    pub cue: Option<Sound>,
    cooldown: Cooldown,
    armed: bool,
}

impl ProximityTrigger {
    pub fn new(target: TriggerTarget, position: Vec3, approach_radius: f32) -> Self {
        Self {
            target,
            position,
            approach_radius,
            activation_radius: None,
            cue: None,
            cooldown: Cooldown::default(),
            armed: true,
        }
    }

    pub fn with_activation(mut self, radius: f32) -> Self {
        self.activation_radius = Some(radius);
        self
    }

    pub fn with_cue(mut self, cue: Sound) -> Self {
        self.cue = Some(cue);
        self
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// What a trigger did this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerFired {
    Cue(Sound),
    RiddleOpened(KeyId),
    DoorPuzzleOpened,
    EndSequence,
}

pub struct TriggerSystem {
    triggers: Vec<ProximityTrigger>,
    cue_cooldown: Duration,
}

impl TriggerSystem {
    /// Creates the triggers for every key, the door, the chest and each torch.
    ///
    /// Door, chest and torch points are measured at `player_height` so the vertical
    /// offset of the prop does not eat into the radius.
    pub fn new(level: &Level, config: &TriggerConfig, player_height: f32) -> Self {
        let mut triggers = Vec::new();
        for key in &level.keys {
            triggers.push(
                ProximityTrigger::new(TriggerTarget::Key(key.id.clone()), key.position, config.approach)
                    .with_activation(config.key_activation)
                    .with_cue(Sound::MagicalSparkle),
            );
        }
        triggers.push(
            ProximityTrigger::new(
                TriggerTarget::Door,
                level.door.closed_center.with_y(player_height),
                config.approach,
            )
            .with_activation(config.door_activation),
        );
        triggers.push(
            ProximityTrigger::new(TriggerTarget::Chest, level.chest.with_y(player_height), config.approach)
                .with_activation(config.chest_activation),
        );
        for torch in &level.torches {
            triggers.push(
                ProximityTrigger::new(
                    TriggerTarget::Torch(torch.id.clone()),
                    torch.position.with_y(player_height),
                    config.approach,
                )
                .with_cue(Sound::TorchCrackle),
            );
        }

        Self {
            triggers,
            cue_cooldown: Duration::from_secs_f32(config.cue_cooldown_secs.max(0.0)),
        }
    }

    pub fn triggers(&self) -> &[ProximityTrigger] {
        &self.triggers
    }

    /// Runs every trigger against the player position.
    ///
    /// # Arguments
    ///
    /// * `player` - Current (post-collision) player position
    /// * `now` - Wall clock used for cue cooldowns
    /// * `quest` - Guards and performs the transitions
    /// * `audio` - Receives approach cues and end-sequence sounds
    /// * `riddles` - Shown when a key riddle opens
    /// * `door` - Shown when the door lock opens
    ///
    /// # Returns
    ///
    /// Everything that fired this frame, in trigger order.
    pub fn update(
        &mut self,
        player: Vec3,
        now: Instant,
        quest: &mut QuestState,
        audio: &mut dyn AudioPort,
        riddles: &mut dyn RiddleOverlayPort,
        door: &mut dyn DoorPuzzleOverlayPort,
    ) -> Vec<TriggerFired> {
        let mut fired = Vec::new();
        let cue_cooldown = self.cue_cooldown;

        for trigger in &mut self.triggers {
            let distance = player.distance(&trigger.position);

            if let Some(radius) = trigger.activation_radius {
                if distance >= radius {
                    trigger.armed = true;
                } else if trigger.armed {
                    if let Some(event) = activate(trigger, quest, audio, riddles, door) {
                        debug!("{:?} activated at distance {:.2}", trigger.target, distance);
                        trigger.armed = false;
                        fired.push(event);
                    }
                }
            }

            if distance < trigger.approach_radius && trigger.cooldown.ready(now) {
                let eligible = match &trigger.target {
                    TriggerTarget::Key(key) => quest.can_begin_riddle(key),
                    TriggerTarget::Torch(_) => true,
                    TriggerTarget::Door | TriggerTarget::Chest => false,
                };
                if let (true, Some(cue)) = (eligible, trigger.cue) {
                    audio.play(cue, 0.5);
                    trigger.cooldown.start(now, cue_cooldown);
                    fired.push(TriggerFired::Cue(cue));
                }
            }
        }

        fired
    }
}

fn activate(
    trigger: &ProximityTrigger,
    quest: &mut QuestState,
    audio: &mut dyn AudioPort,
    riddles: &mut dyn RiddleOverlayPort,
    door: &mut dyn DoorPuzzleOverlayPort,
) -> Option<TriggerFired> {
    match &trigger.target {
        TriggerTarget::Key(key) => {
            let riddle = quest.begin_riddle(key)?;
            riddles.activate(key, &riddle, &riddle.word());
            Some(TriggerFired::RiddleOpened(key.clone()))
        }
        TriggerTarget::Door => {
            let (words, order) = quest.begin_door_puzzle()?;
            door.activate(&words, &order);
            Some(TriggerFired::DoorPuzzleOpened)
        }
        TriggerTarget::Chest => quest
            .begin_end_sequence(audio)
            .then_some(TriggerFired::EndSequence),
        TriggerTarget::Torch(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DoorConfig, LevelConfig};
    use crate::renderer::scene::VisualArena;
    use crate::test_support::{RecordingAudio, RecordingDoorOverlay, RecordingRiddleOverlay};

    struct Harness {
        level: Level,
        quest: QuestState,
        triggers: TriggerSystem,
        audio: RecordingAudio,
        riddles: RecordingRiddleOverlay,
        door: RecordingDoorOverlay,
        visuals: VisualArena,
    }

    impl Harness {
        fn new() -> Self {
            let level = Level::build(&LevelConfig::default()).expect("level");
            let quest = QuestState::new(&level, &DoorConfig::default());
            let triggers = TriggerSystem::new(&level, &TriggerConfig::default(), 0.55);
            Self {
                level,
                quest,
                triggers,
                audio: RecordingAudio::default(),
                riddles: RecordingRiddleOverlay::default(),
                door: RecordingDoorOverlay::default(),
                visuals: VisualArena::new(),
            }
        }

        fn step(&mut self, player: Vec3, now: Instant) -> Vec<TriggerFired> {
            self.triggers.update(
                player,
                now,
                &mut self.quest,
                &mut self.audio,
                &mut self.riddles,
                &mut self.door,
            )
        }

        fn key_position(&self, id: &str) -> Vec3 {
            self.level.key(&KeyId::new(id)).expect("key").position
        }

        fn key_armed(&self, id: &str) -> bool {
            let target = TriggerTarget::Key(KeyId::new(id));
            self.triggers
                .triggers()
                .iter()
                .find(|t| t.target == target)
                .expect("key trigger")
                .is_armed()
        }
    }

    /// Standing next to a key opens its riddle exactly once, and solving it collects the word.
    #[test]
    fn test_riddle_opens_once_and_collects() {
        let mut h = Harness::new();
        let near = h.key_position("key-oak") + Vec3::new(0.5, 0.0, 0.0);
        let now = Instant::now();

        for i in 0..120 {
            h.step(near, now + Duration::from_millis(i * 16));
        }
        assert_eq!(h.riddles.activations.len(), 1);
        let (key, riddle, expected) = &h.riddles.activations[0];
        assert_eq!(key.as_str(), "key-oak");
        assert_eq!(riddle.word(), "ROBUST");
        assert_eq!(expected, "ROBUST");

        let oak = KeyId::new("key-oak");
        assert!(h.quest.on_riddle_solved(&oak, &mut h.audio, &mut h.visuals));
        for i in 0..120 {
            h.step(near, now + Duration::from_secs(5) + Duration::from_millis(i * 16));
        }
        assert_eq!(h.riddles.activations.len(), 1);
        assert_eq!(h.quest.collected_words(), ["ROBUST".to_string()]);
    }

    /// A dismissed riddle does not reopen until the player walks away and back.
    #[test]
    fn test_dismissed_riddle_needs_reentry() {
        let mut h = Harness::new();
        let key = h.key_position("key-reflection");
        let now = Instant::now();

        assert!(h.key_armed("key-reflection"));
        h.step(key, now);
        assert!(!h.key_armed("key-reflection"));
        assert!(h.quest.on_riddle_closed(&KeyId::new("key-reflection")));
        h.step(key, now);
        assert_eq!(h.riddles.activations.len(), 1);

        h.step(key + Vec3::new(3.0, 0.0, 0.0), now);
        assert!(h.key_armed("key-reflection"));
        h.step(key, now);
        assert_eq!(h.riddles.activations.len(), 2);
    }

    /// The sparkle cue plays once per cooldown window while lingering near a key.
    #[test]
    fn test_approach_cue_respects_cooldown() {
        let mut h = Harness::new();
        let lingering = h.key_position("key-flask") + Vec3::new(2.0, 0.0, 0.0);
        let now = Instant::now();

        for i in 0..100 {
            h.step(lingering, now + Duration::from_millis(i * 20));
        }
        assert_eq!(h.audio.played(Sound::MagicalSparkle), 1);

        h.step(lingering, now + Duration::from_secs(4));
        assert_eq!(h.audio.played(Sound::MagicalSparkle), 2);
        assert!(h.riddles.activations.is_empty());
    }

    #[test]
    fn test_door_needs_all_keys() {
        let mut h = Harness::new();
        let doorway = Vec3::new(0.0, 0.55, 10.0);
        let now = Instant::now();
        h.step(doorway, now);
        assert!(h.door.activations.is_empty());

        for id in ["key-reflection", "key-oak", "key-flask", "key-jest"] {
            let key = KeyId::new(id);
            h.quest.begin_riddle(&key);
            h.quest.on_riddle_solved(&key, &mut h.audio, &mut h.visuals);
        }
        // Still inside the radius: the trigger was never consumed, so it fires now.
        let fired = h.step(doorway, now);
        assert!(fired.contains(&TriggerFired::DoorPuzzleOpened));
        assert_eq!(h.door.activations.len(), 1);
        assert_eq!(h.door.activations[0].1, ["BOTTLENECK", "QUEEF", "ROBUST", "REPENNY"]);
    }

    #[test]
    fn test_cooldown() {
        let now = Instant::now();
        let mut cooldown = Cooldown::default();
        assert!(cooldown.ready(now));
        cooldown.start(now, Duration::from_secs(3));
        assert!(!cooldown.ready(now + Duration::from_secs(2)));
        assert!(cooldown.ready(now + Duration::from_secs(3)));
    }
}
