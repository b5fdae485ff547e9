//! Heads-up display.
//!
//! Mirrors quest progress from [`QuestEvent`]s only. The HUD never reads quest fields,
//! so what it shows is exactly what was announced.

use crate::game::quest::QuestEvent;
use crate::ui::{UiFrame, ui_scale};
use chrono::{DateTime, Local};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

const HUD_TEXT: [u8; 3] = [255, 255, 150];
const WORDS_TEXT: [u8; 3] = [150, 255, 255];
const PROMPT_TEXT: [u8; 3] = [235, 235, 235];
const BANNER_TEXT: [u8; 3] = [255, 213, 74];
const VOLUME_TEXT: [u8; 3] = [200, 200, 200];

/// Shown once the end sequence starts.
#[derive(Debug, Clone, PartialEq)]
pub struct EndBanner {
    pub elapsed: Duration,
    pub completed_at: DateTime<Local>,
}

impl EndBanner {
    pub fn text(&self) -> String {
        let secs = self.elapsed.as_secs();
        format!(
            "Happy Birthday!\nThe castle's treasure is yours.\nEscaped in {}m {:02}s, at {}",
            secs / 60,
            secs % 60,
            self.completed_at.format("%H:%M")
        )
    }
}

pub struct Hud {
    events: Receiver<QuestEvent>,
    collected: usize,
    total: usize,
    words: Vec<String>,
    prompt: Option<String>,
    overlay_open: bool,
    banner: Option<EndBanner>,
    session_start: Instant,
    started_at: DateTime<Local>,
    /// Volume summary, pushed by the app whenever a volume key changes it.
    volume: String,
}

impl Hud {
    pub fn new(events: Receiver<QuestEvent>, total_keys: usize, now: Instant) -> Self {
        Self {
            events,
            collected: 0,
            total: total_keys,
            words: Vec::new(),
            prompt: Some(format!("Find the {} hidden keys.", total_keys)),
            overlay_open: false,
            banner: None,
            session_start: now,
            started_at: Local::now(),
            volume: String::new(),
        }
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn key_count_text(&self) -> String {
        format!("Keys: {}/{}", self.collected, self.total)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn banner(&self) -> Option<&EndBanner> {
        self.banner.as_ref()
    }

    pub fn set_volume(&mut self, readout: String) {
        self.volume = readout;
    }

    /// Drains pending quest events.
    pub fn update(&mut self, now: Instant) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event, now);
        }
    }

    fn apply(&mut self, event: QuestEvent, now: Instant) {
        match event {
            QuestEvent::RiddleOpened { .. } | QuestEvent::DoorPuzzleOpened => self.overlay_open = true,
            QuestEvent::RiddleClosed { .. } => self.overlay_open = false,
            QuestEvent::KeyCollected {
                word, collected, total, ..
            } => {
                self.overlay_open = false;
                self.collected = collected;
                self.total = total;
                self.prompt = Some(format!("The key whispers a word: {}", word));
                self.words.push(word);
            }
            QuestEvent::AllKeysCollected | QuestEvent::DoorPuzzleClosed => {
                self.overlay_open = false;
                self.prompt = Some("All keys found. The great door awaits.".to_string());
            }
            QuestEvent::DoorUnlocked => {
                self.overlay_open = false;
                self.prompt = Some("The door grinds upward...".to_string());
            }
            QuestEvent::DoorColliderReleased => {
                self.prompt = Some("Something glints in the chamber beyond.".to_string());
            }
            QuestEvent::EndSequenceStarted => {
                self.prompt = None;
                self.banner = Some(EndBanner {
                    elapsed: now.saturating_duration_since(self.session_start),
                    completed_at: Local::now(),
                });
            }
        }
    }

    pub fn layout(&self, frame: &mut UiFrame, width: f32, height: f32) {
        let scale = ui_scale(height);
        let margin = 20.0 * scale;

        frame.text("hud-keys", self.key_count_text(), margin, margin, 240.0 * scale, 22.0 * scale, HUD_TEXT);
        if !self.volume.is_empty() {
            let w = 360.0 * scale;
            frame.text("hud-volume", self.volume.as_str(), width - margin - w, margin, w, 16.0 * scale, VOLUME_TEXT);
        }
        if !self.words.is_empty() {
            frame.text(
                "hud-words",
                self.words.join("  "),
                margin,
                margin + 32.0 * scale,
                width - margin * 2.0,
                18.0 * scale,
                WORDS_TEXT,
            );
        }

        if let Some(banner) = &self.banner {
            let w = (720.0 * scale).min(width * 0.9);
            let h = 200.0 * scale;
            let x = (width - w) / 2.0;
            let y = height * 0.2;
            frame.panel(x, y, w, h, [0.05, 0.03, 0.08, 0.85]);
            frame.text("hud-banner", banner.text(), x + 28.0 * scale, y + 28.0 * scale, w - 56.0 * scale, 30.0 * scale, BANNER_TEXT);
        } else if let (Some(prompt), false) = (&self.prompt, self.overlay_open) {
            frame.text(
                "hud-prompt",
                prompt.as_str(),
                margin,
                height - margin - 30.0 * scale,
                width - margin * 2.0,
                18.0 * scale,
                PROMPT_TEXT,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::riddle::KeyId;
    use std::sync::mpsc::channel;

    fn collected(word: &str, n: usize) -> QuestEvent {
        QuestEvent::KeyCollected {
            key: KeyId::new(format!("key-{}", n)),
            word: word.to_string(),
            collected: n,
            total: 4,
        }
    }

    #[test]
    fn test_counts_follow_events() {
        let (tx, rx) = channel();
        let now = Instant::now();
        let mut hud = Hud::new(rx, 4, now);
        assert_eq!(hud.key_count_text(), "Keys: 0/4");

        tx.send(collected("ROBUST", 1)).expect("send");
        tx.send(collected("QUEEF", 2)).expect("send");
        hud.update(now);
        assert_eq!(hud.key_count_text(), "Keys: 2/4");
        assert_eq!(hud.words(), ["ROBUST".to_string(), "QUEEF".to_string()]);
    }

    /// The prompt hides while an overlay is up and the banner replaces it at the end.
    #[test]
    fn test_prompt_and_banner() {
        let (tx, rx) = channel();
        let now = Instant::now();
        let mut hud = Hud::new(rx, 4, now);

        tx.send(QuestEvent::RiddleOpened { key: KeyId::new("key-oak") }).expect("send");
        hud.update(now);
        let mut frame = UiFrame::default();
        hud.layout(&mut frame, 1280.0, 720.0);
        assert!(frame.find_text("hud-prompt").is_none());

        tx.send(QuestEvent::EndSequenceStarted).expect("send");
        hud.update(now + Duration::from_secs(125));
        let banner = hud.banner().expect("banner");
        assert_eq!(banner.elapsed, Duration::from_secs(125));
        assert!(banner.text().contains("2m 05s"));

        frame.clear();
        hud.layout(&mut frame, 1280.0, 720.0);
        assert!(frame.find_text("hud-banner").is_some());
        assert!(frame.find_text("hud-prompt").is_none());
    }

    #[test]
    fn test_volume_readout() {
        let (_tx, rx) = channel();
        let mut hud = Hud::new(rx, 4, Instant::now());
        let mut frame = UiFrame::default();
        hud.layout(&mut frame, 1280.0, 720.0);
        assert!(frame.find_text("hud-volume").is_none());

        hud.set_volume("Muted".to_string());
        frame.clear();
        hud.layout(&mut frame, 1280.0, 720.0);
        let text = frame.find_text("hud-volume").expect("volume text");
        assert_eq!(text.text, "Muted");
        assert!(text.x + text.max_width <= 1280.0);
    }
}
