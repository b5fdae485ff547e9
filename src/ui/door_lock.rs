//! Word-ordering lock on the great door.
//!
//! Number keys pick a slot; a second number moves the picked word to that slot.

use crate::game::audio::{AudioPort, Sound};
use crate::game::door_puzzle::DoorPuzzle;
use crate::ui::{Deferred, DoorPuzzleOverlayPort, GameEvent, OverlayInput, SOLVE_DELAY, UiFrame, ui_scale};
use log::{debug, warn};
use std::sync::mpsc::Sender;
use std::time::Instant;

const IRON_PANEL: [f32; 4] = [0.16, 0.17, 0.2, 0.96];
const SLOT: [f32; 4] = [0.26, 0.3, 0.36, 1.0];
const SLOT_SELECTED: [f32; 4] = [0.55, 0.45, 0.15, 1.0];
const TEXT: [u8; 3] = [235, 225, 200];
const GOLD: [u8; 3] = [255, 213, 74];

const SLOT_IDS: [&str; 8] = [
    "lock-slot-1",
    "lock-slot-2",
    "lock-slot-3",
    "lock-slot-4",
    "lock-slot-5",
    "lock-slot-6",
    "lock-slot-7",
    "lock-slot-8",
];

#[derive(Debug)]
struct OpenLock {
    puzzle: DoorPuzzle,
    selected: Option<usize>,
    solved: Option<Deferred<()>>,
}

pub struct DoorLock {
    open: Option<OpenLock>,
    sentence: String,
    events: Sender<GameEvent>,
}

impl DoorLock {
    pub fn new(events: Sender<GameEvent>, sentence: impl Into<String>) -> Self {
        Self {
            open: None,
            sentence: sentence.into(),
            events,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn puzzle(&self) -> Option<&DoorPuzzle> {
        self.open.as_ref().map(|o| &o.puzzle)
    }

    pub fn selected(&self) -> Option<usize> {
        self.open.as_ref().and_then(|o| o.selected)
    }

    fn send(&self, event: GameEvent) {
        if self.events.send(event).is_err() {
            warn!("Door lock outcome dropped: event queue closed");
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
        let OverlayInput::Digit(d) = input else {
            return;
        };
        let Some(slot) = (d as usize).checked_sub(1).filter(|&s| s < open.puzzle.items().len()) else {
            return;
        };

        match open.selected.take() {
            None => open.selected = Some(slot),
            Some(from) => {
                if open.puzzle.move_word(from, slot) {
                    audio.play(Sound::ButtonClick, 0.5);
                    debug!("Door lock: {:?}", open.puzzle.items());
                }
                if open.puzzle.is_solved() {
                    open.solved = Some(Deferred::new(now, SOLVE_DELAY, ()));
                }
            }
        }
    }

    /// Closes the lock. An order already solved is reported right away.
    pub fn close(&mut self) {
        if let Some(mut open) = self.open.take() {
            match open.solved.as_mut().and_then(Deferred::take_now) {
                Some(()) => self.send(GameEvent::DoorPuzzleSolved),
                None => self.send(GameEvent::DoorPuzzleClosed),
            }
        }
    }

    pub fn update(&mut self, now: Instant) {
        let due = self
            .open
            .as_mut()
            .and_then(|o| o.solved.as_mut())
            .and_then(|d| d.poll(now));
        if due.is_some() {
            self.open = None;
            self.send(GameEvent::DoorPuzzleSolved);
        }
    }

    pub fn layout(&self, frame: &mut UiFrame, width: f32, height: f32) {
        let Some(open) = &self.open else {
            return;
        };
        let scale = ui_scale(height);
        let w = (760.0 * scale).min(width * 0.95);
        let h = (380.0 * scale).min(height * 0.9);
        let x = (width - w) / 2.0;
        let y = (height - h) / 2.0;
        let pad = 28.0 * scale;
        let inner = w - pad * 2.0;

        frame.panel(0.0, 0.0, width, height, [0.0, 0.0, 0.0, 0.5]);
        frame.panel(x, y, w, h, IRON_PANEL);
        frame.text("lock-title", "The Great Door", x + pad, y + pad, inner, 30.0 * scale, GOLD);
        frame.text(
            "lock-sentence",
            open.puzzle.sentence_preview(),
            x + pad,
            y + pad + 48.0 * scale,
            inner,
            20.0 * scale,
            TEXT,
        );

        let items = open.puzzle.items();
        let count = items.len().min(SLOT_IDS.len());
        let gap = 12.0 * scale;
        let slot_w = if count == 0 {
            0.0
        } else {
            (inner - gap * (count as f32 - 1.0)) / count as f32
        };
        let slot_h = 64.0 * scale;
        let slot_y = y + h / 2.0;
        for (i, word) in items.iter().take(count).enumerate() {
            let slot_x = x + pad + i as f32 * (slot_w + gap);
            let color = if open.selected == Some(i) { SLOT_SELECTED } else { SLOT };
            frame.panel(slot_x, slot_y, slot_w, slot_h, color);
            frame.text(
                SLOT_IDS[i],
                format!("{}. {}", i + 1, word),
                slot_x + 10.0 * scale,
                slot_y + 18.0 * scale,
                slot_w - 20.0 * scale,
                18.0 * scale,
                TEXT,
            );
        }

        let status = if open.solved.is_some() {
            "The lock turns..."
        } else if open.selected.is_some() {
            "Press the number of the slot to move it to"
        } else {
            "Press a number to pick a word, Esc to step away"
        };
        frame.text("lock-help", status, x + pad, y + h - 44.0 * scale, inner, 16.0 * scale, TEXT);
    }
}

impl DoorPuzzleOverlayPort for DoorLock {
    fn activate(&mut self, words: &[String], required_order: &[String]) {
        let puzzle = DoorPuzzle::shuffled(
            words.to_vec(),
            required_order.to_vec(),
            self.sentence.clone(),
            &mut rand::thread_rng(),
        );
        self.open = Some(OpenLock {
            puzzle,
            selected: None,
            solved: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingAudio;
    use std::sync::mpsc::{Receiver, channel};

    const SENTENCE: &str = "The _ quickens with a sudden _, revealing a _ passage to _";

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn open_lock() -> (DoorLock, Receiver<GameEvent>) {
        let (tx, rx) = channel();
        let mut lock = DoorLock::new(tx, SENTENCE);
        lock.activate(
            &words(&["ROBUST", "REPENNY", "BOTTLENECK", "QUEEF"]),
            &words(&["BOTTLENECK", "QUEEF", "ROBUST", "REPENNY"]),
        );
        (lock, rx)
    }

    /// Solves whatever shuffle the lock presented by moving each target word into place.
    fn solve(lock: &mut DoorLock, now: Instant, audio: &mut RecordingAudio) {
        let target = lock.puzzle().expect("open").solution().to_vec();
        for (to, word) in target.iter().enumerate() {
            let from = lock
                .puzzle()
                .expect("open")
                .items()
                .iter()
                .position(|w| w == word)
                .expect("word present");
            if from != to {
                lock.handle_input(OverlayInput::Digit(from as u8 + 1), now, audio);
                lock.handle_input(OverlayInput::Digit(to as u8 + 1), now, audio);
            }
        }
    }

    #[test]
    fn test_activation_shuffles_away_from_solution() {
        let (lock, _rx) = open_lock();
        let puzzle = lock.puzzle().expect("open");
        assert!(!puzzle.is_solved());
        assert_eq!(puzzle.items().len(), 4);
    }

    #[test]
    fn test_solving_reports_after_delay() {
        let (mut lock, rx) = open_lock();
        let mut audio = RecordingAudio::default();
        let now = Instant::now();

        solve(&mut lock, now, &mut audio);
        assert!(lock.puzzle().expect("open").is_solved());
        assert!(audio.played(Sound::ButtonClick) >= 1);

        lock.update(now);
        assert!(rx.try_recv().is_err());
        lock.update(now + SOLVE_DELAY);
        assert_eq!(rx.try_recv().ok(), Some(GameEvent::DoorPuzzleSolved));
        assert!(!lock.is_open());
    }

    /// Picking the same slot twice, or a slot that does not exist, changes nothing.
    #[test]
    fn test_noop_moves_are_silent() {
        let (mut lock, _rx) = open_lock();
        let mut audio = RecordingAudio::default();
        let now = Instant::now();
        let before = lock.puzzle().expect("open").items().to_vec();

        lock.handle_input(OverlayInput::Digit(2), now, &mut audio);
        assert_eq!(lock.selected(), Some(1));
        lock.handle_input(OverlayInput::Digit(2), now, &mut audio);
        lock.handle_input(OverlayInput::Digit(9), now, &mut audio);
        lock.handle_input(OverlayInput::Digit(0), now, &mut audio);

        assert_eq!(lock.puzzle().expect("open").items(), before.as_slice());
        assert_eq!(audio.played(Sound::ButtonClick), 0);
    }

    #[test]
    fn test_escape_reports_closed() {
        let (mut lock, rx) = open_lock();
        let mut audio = RecordingAudio::default();
        lock.handle_input(OverlayInput::Close, Instant::now(), &mut audio);
        assert_eq!(rx.try_recv().ok(), Some(GameEvent::DoorPuzzleClosed));
        assert!(!lock.is_open());
    }

    #[test]
    fn test_layout_lists_slots() {
        let (lock, _rx) = open_lock();
        let mut frame = UiFrame::default();
        lock.layout(&mut frame, 1920.0, 1080.0);
        for id in &SLOT_IDS[..4] {
            assert!(frame.find_text(id).is_some());
        }
        let sentence = frame.find_text("lock-sentence").expect("sentence");
        assert!(sentence.text.starts_with("The "));
        assert!(!sentence.text.contains('_'));
    }
}
