//! Sound effects and music.
//!
//! The simulation never talks to kira directly. It goes through [`AudioPort`], a small
//! fire-and-forget interface: every call is best-effort and a missing clip or a dead
//! backend simply stays silent. [`GameAudioManager`] is the kira-backed implementation;
//! [`SilentAudio`] is used when no output device is available.

use kira::sound::PlaybackState;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, AudioManagerSettings, Decibels, DefaultBackend, Tween};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::config::AudioConfig;
use crate::game::keys::GameKey;

/// Every clip the game can play, named after its asset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sound {
    KeyPickup,
    RiddleSuccess,
    DoorUnlock,
    DoorCreak,
    ChestOpen,
    Footsteps,
    TorchCrackle,
    ButtonClick,
    ParchmentUnfurl,
    ErrorBuzz,
    PartyHorn,
    MagicalSparkle,
    MedievalAmbient,
    HappyBirthday,
}

impl Sound {
    pub const ALL: [Sound; 14] = [
        Sound::KeyPickup,
        Sound::RiddleSuccess,
        Sound::DoorUnlock,
        Sound::DoorCreak,
        Sound::ChestOpen,
        Sound::Footsteps,
        Sound::TorchCrackle,
        Sound::ButtonClick,
        Sound::ParchmentUnfurl,
        Sound::ErrorBuzz,
        Sound::PartyHorn,
        Sound::MagicalSparkle,
        Sound::MedievalAmbient,
        Sound::HappyBirthday,
    ];

    /// Asset name, also the file stem under the audio root.
    pub fn name(self) -> &'static str {
        match self {
            Sound::KeyPickup => "key-pickup",
            Sound::RiddleSuccess => "riddle-success",
            Sound::DoorUnlock => "door-unlock",
            Sound::DoorCreak => "door-creak",
            Sound::ChestOpen => "chest-open",
            Sound::Footsteps => "footsteps",
            Sound::TorchCrackle => "torch-crackle",
            Sound::ButtonClick => "button-click",
            Sound::ParchmentUnfurl => "parchment-unfurl",
            Sound::ErrorBuzz => "error-buzz",
            Sound::PartyHorn => "party-horn",
            Sound::MagicalSparkle => "magical-sparkle",
            Sound::MedievalAmbient => "medieval-ambient",
            Sound::HappyBirthday => "happy-birthday",
        }
    }

    pub fn is_music(self) -> bool {
        matches!(self, Sound::MedievalAmbient | Sound::HappyBirthday)
    }

    /// Whether the clip repeats until stopped.
    pub fn loops(self) -> bool {
        self.is_music() || self == Sound::Footsteps
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies one playing instance of a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

/// Audio errors
#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    /// The output device could not be opened.
    #[error("audio backend unavailable: {0}")]
    Backend(String),

    /// A clip could not be decoded or found.
    #[error("failed to load {name}: {reason}")]
    Load { name: String, reason: String },

    /// The mixer refused to start a sound.
    #[error("failed to play sound: {0}")]
    Play(String),
}

/// Narrow, fire-and-forget audio interface used by the simulation.
pub trait AudioPort {
    /// Starts a sound effect at `volume` (0..1, scaled by the sfx and master levels).
    fn play(&mut self, sound: Sound, volume: f32) -> Option<VoiceId>;

    /// Stops one voice started by [`AudioPort::play`]. Unknown voices are ignored.
    fn stop(&mut self, sound: Sound, voice: VoiceId);

    /// Replaces the current music track.
    fn start_music(&mut self, track: Sound);

    fn stop_music(&mut self);

    /// Stops every voice and the music.
    fn stop_all(&mut self);

    fn set_master_volume(&mut self, volume: f32);
    fn set_music_volume(&mut self, volume: f32);
    fn set_sfx_volume(&mut self, volume: f32);
}

/// Converts a linear amplitude to kira's decibel volume.
pub fn amplitude_to_decibels(amplitude: f32) -> Decibels {
    if amplitude <= 0.0 {
        Decibels::SILENCE
    } else {
        Decibels(20.0 * amplitude.log10())
    }
}

/// Channel levels, kept separately so they can be mixed as master × channel × call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mix {
    pub master: f32,
    pub music: f32,
    pub sfx: f32,
}

impl Mix {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            master: config.master_volume.clamp(0.0, 1.0),
            music: config.music_volume.clamp(0.0, 1.0),
            sfx: config.sfx_volume.clamp(0.0, 1.0),
        }
    }

    pub fn effect(&self, volume: f32) -> f32 {
        self.master * self.sfx * volume.clamp(0.0, 1.0)
    }

    pub fn music(&self) -> f32 {
        self.master * self.music
    }
}

/// kira-backed [`AudioPort`].
pub struct GameAudioManager {
    audio_manager: AudioManager<DefaultBackend>,
    clips: HashMap<Sound, StaticSoundData>,
    voices: HashMap<VoiceId, (Sound, StaticSoundHandle)>,
    music: Option<(Sound, StaticSoundHandle)>,
    next_voice: u64,
    mix: Mix,
}

impl GameAudioManager {
    /// Opens the default output device.
    ///
    /// `clips` holds whatever the asset loader managed to decode; sounds missing
    /// from it are silently skipped at play time.
    pub fn new(config: &AudioConfig, clips: HashMap<Sound, StaticSoundData>) -> Result<Self, AudioError> {
        let audio_manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        info!("Audio ready with {}/{} clips", clips.len(), Sound::ALL.len());

        Ok(GameAudioManager {
            audio_manager,
            clips,
            voices: HashMap::new(),
            music: None,
            next_voice: 0,
            mix: Mix::from_config(config),
        })
    }

    fn start(&mut self, sound: Sound, amplitude: f32) -> Result<StaticSoundHandle, AudioError> {
        let data = self.clips.get(&sound).ok_or_else(|| AudioError::Load {
            name: sound.name().to_string(),
            reason: "clip not loaded".to_string(),
        })?;

        let mut data = data.volume(amplitude_to_decibels(amplitude));
        if sound.loops() {
            data = data.loop_region(..);
        }

        self.audio_manager
            .play(data)
            .map_err(|e| AudioError::Play(format!("{:?}", e)))
    }

    fn prune_finished(&mut self) {
        self.voices
            .retain(|_, (_, handle)| handle.state() != PlaybackState::Stopped);
    }
}

impl AudioPort for GameAudioManager {
    fn play(&mut self, sound: Sound, volume: f32) -> Option<VoiceId> {
        self.prune_finished();
        match self.start(sound, self.mix.effect(volume)) {
            Ok(handle) => {
                let voice = VoiceId(self.next_voice);
                self.next_voice += 1;
                self.voices.insert(voice, (sound, handle));
                Some(voice)
            }
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }

    fn stop(&mut self, sound: Sound, voice: VoiceId) {
        match self.voices.remove(&voice) {
            Some((playing, mut handle)) if playing == sound => handle.stop(Tween::default()),
            Some(entry) => {
                warn!("Voice {:?} belongs to {}, not {}", voice, entry.0, sound);
                self.voices.insert(voice, entry);
            }
            None => {}
        }
    }

    fn start_music(&mut self, track: Sound) {
        self.stop_music();
        match self.start(track, self.mix.music()) {
            Ok(handle) => {
                info!("Music: {}", track);
                self.music = Some((track, handle));
            }
            Err(e) => debug!("{}", e),
        }
    }

    fn stop_music(&mut self) {
        if let Some((_, mut handle)) = self.music.take() {
            handle.stop(Tween::default());
        }
    }

    fn stop_all(&mut self) {
        for (_, (_, mut handle)) in self.voices.drain() {
            handle.stop(Tween::default());
        }
        self.stop_music();
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.mix.master = volume.clamp(0.0, 1.0);
        let music = amplitude_to_decibels(self.mix.music());
        if let Some((_, handle)) = self.music.as_mut() {
            handle.set_volume(music, Tween::default());
        }
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.mix.music = volume.clamp(0.0, 1.0);
        let music = amplitude_to_decibels(self.mix.music());
        if let Some((_, handle)) = self.music.as_mut() {
            handle.set_volume(music, Tween::default());
        }
    }

    fn set_sfx_volume(&mut self, volume: f32) {
        self.mix.sfx = volume.clamp(0.0, 1.0);
    }
}

/// [`AudioPort`] that plays nothing. Used when audio is disabled or unavailable.
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioPort for SilentAudio {
    fn play(&mut self, _sound: Sound, _volume: f32) -> Option<VoiceId> {
        None
    }
    fn stop(&mut self, _sound: Sound, _voice: VoiceId) {}
    fn start_music(&mut self, _track: Sound) {}
    fn stop_music(&mut self) {}
    fn stop_all(&mut self) {}
    fn set_master_volume(&mut self, _volume: f32) {}
    fn set_music_volume(&mut self, _volume: f32) {}
    fn set_sfx_volume(&mut self, _volume: f32) {}
}

/// Opens kira when enabled, otherwise (or on failure) returns [`SilentAudio`].
pub fn open_audio(config: &AudioConfig, clips: HashMap<Sound, StaticSoundData>) -> Box<dyn AudioPort> {
    if !config.enabled {
        info!("Audio disabled by config");
        return Box::new(SilentAudio);
    }
    match GameAudioManager::new(config, clips) {
        Ok(manager) => Box::new(manager),
        Err(e) => {
            warn!("{}; continuing without sound", e);
            Box::new(SilentAudio)
        }
    }
}

/// Keeps exactly one looping footstep voice alive while the player moves.
#[derive(Debug, Default)]
pub struct FootstepTracker {
    voice: Option<VoiceId>,
    walking: bool,
}

impl FootstepTracker {
    pub fn update(&mut self, moving: bool, audio: &mut dyn AudioPort) {
        if moving == self.walking {
            return;
        }
        self.walking = moving;
        if moving {
            self.voice = audio.play(Sound::Footsteps, 0.4);
        } else if let Some(voice) = self.voice.take() {
            audio.stop(Sound::Footsteps, voice);
        }
    }

    pub fn is_walking(&self) -> bool {
        self.walking
    }
}

/// Fraction one volume key press moves a channel by.
pub const VOLUME_STEP: f32 = 0.1;

/// A channel the player can turn up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioChannel {
    Master,
    Music,
    Sfx,
}

/// Player-facing volume levels and the mute switch.
///
/// Holds its own copy of the [`Mix`] so the HUD can show the levels without asking the
/// backend. Every change is pushed through [`AudioPort`]. Muting sends a master level of
/// zero and remembers the real one, so unmuting restores it.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeControl {
    mix: Mix,
    muted: bool,
}

impl VolumeControl {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            mix: Mix::from_config(config),
            muted: false,
        }
    }

    pub fn level(&self, channel: AudioChannel) -> f32 {
        match channel {
            AudioChannel::Master => self.mix.master,
            AudioChannel::Music => self.mix.music,
            AudioChannel::Sfx => self.mix.sfx,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Applies a volume key.
    ///
    /// # Returns
    /// `false` when `key` is not a volume key, so the caller can handle it.
    pub fn handle_key(&mut self, key: GameKey, audio: &mut dyn AudioPort) -> bool {
        match key {
            GameKey::VolumeUp(channel) => self.step(channel, VOLUME_STEP, audio),
            GameKey::VolumeDown(channel) => self.step(channel, -VOLUME_STEP, audio),
            GameKey::ToggleMute => self.toggle_mute(audio),
            _ => return false,
        }
        true
    }

    /// Moves one channel by `delta`, snapped to whole steps and clamped to 0..1.
    ///
    /// While muted the master level is stored but not sent until unmuting.
    pub fn step(&mut self, channel: AudioChannel, delta: f32, audio: &mut dyn AudioPort) {
        let level = (((self.level(channel) + delta) / VOLUME_STEP).round() * VOLUME_STEP).clamp(0.0, 1.0);
        match channel {
            AudioChannel::Master => {
                self.mix.master = level;
                if !self.muted {
                    audio.set_master_volume(level);
                }
            }
            AudioChannel::Music => {
                self.mix.music = level;
                audio.set_music_volume(level);
            }
            AudioChannel::Sfx => {
                self.mix.sfx = level;
                audio.set_sfx_volume(level);
            }
        }
        info!("{:?} volume set to {}%", channel, percent(level));
    }

    pub fn toggle_mute(&mut self, audio: &mut dyn AudioPort) {
        self.muted = !self.muted;
        audio.set_master_volume(if self.muted { 0.0 } else { self.mix.master });
        info!("Audio {}", if self.muted { "muted" } else { "unmuted" });
    }

    /// One-line summary for the HUD.
    pub fn readout(&self) -> String {
        if self.muted {
            return "Muted".to_string();
        }
        format!(
            "Volume {}%  Music {}%  Effects {}%",
            percent(self.mix.master),
            percent(self.mix.music),
            percent(self.mix.sfx)
        )
    }
}

fn percent(level: f32) -> u32 {
    (level * 100.0).round() as u32
}
