//! Recording doubles for the collaborator ports.

use crate::game::audio::{AudioPort, Sound, VoiceId};
use crate::game::riddle::{KeyId, Riddle};
use crate::ui::{DoorPuzzleOverlayPort, RiddleOverlayPort};

#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub played: Vec<(Sound, f32)>,
    pub stopped: Vec<(Sound, VoiceId)>,
    pub music: Vec<Sound>,
    pub music_stopped: usize,
    pub stop_all_calls: usize,
    pub master_volumes: Vec<f32>,
    pub music_volumes: Vec<f32>,
    pub sfx_volumes: Vec<f32>,
    next_voice: u64,
}

impl RecordingAudio {
    /// How many times `sound` was played.
    pub fn played(&self, sound: Sound) -> usize {
        self.played.iter().filter(|(s, _)| *s == sound).count()
    }
}

impl AudioPort for RecordingAudio {
    fn play(&mut self, sound: Sound, volume: f32) -> Option<VoiceId> {
        self.played.push((sound, volume));
        let voice = VoiceId(self.next_voice);
        self.next_voice += 1;
        Some(voice)
    }

    fn stop(&mut self, sound: Sound, voice: VoiceId) {
        self.stopped.push((sound, voice));
    }

    fn start_music(&mut self, track: Sound) {
        self.music.push(track);
    }

    fn stop_music(&mut self) {
        self.music_stopped += 1;
    }

    fn stop_all(&mut self) {
        self.stop_all_calls += 1;
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.master_volumes.push(volume);
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.music_volumes.push(volume);
    }

    fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volumes.push(volume);
    }
}

#[derive(Debug, Default)]
pub struct RecordingRiddleOverlay {
    pub activations: Vec<(KeyId, Riddle, String)>,
}

impl RiddleOverlayPort for RecordingRiddleOverlay {
    fn activate(&mut self, key: &KeyId, riddle: &Riddle, expected_answer: &str) {
        self.activations
            .push((key.clone(), riddle.clone(), expected_answer.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingDoorOverlay {
    pub activations: Vec<(Vec<String>, Vec<String>)>,
}

impl DoorPuzzleOverlayPort for RecordingDoorOverlay {
    fn activate(&mut self, words: &[String], required_order: &[String]) {
        self.activations.push((words.to_vec(), required_order.to_vec()));
    }
}
