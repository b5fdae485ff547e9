//! AppState module for Keystone.
//!
//! This module defines the [`AppState`] struct, which holds all state required for a running
//! session: the GPU renderers, the simulation, the audio service, the visual arena and the
//! overlays.

use crate::assets::LoadedAssets;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::GameState;
use crate::game::audio::{self, AudioPort, VolumeControl};
use crate::game::keys::GameKey;
use crate::renderer::scene::VisualArena;
use crate::renderer::text::TextRenderer;
use crate::renderer::wgpu_lib::WgpuRenderer;
use crate::ui::door_lock::DoorLock;
use crate::ui::hud::Hud;
use crate::ui::riddle_scroll::RiddleScroll;
use crate::ui::{GameEvent, UiFrame};
use log::{info, warn};
use std::sync::mpsc::{Receiver, channel};
use std::time::Instant;
use winit::window::{CursorGrabMode, Window};

pub struct AppState {
    /// The WGPU renderer for the scene and overlays.
    pub wgpu_renderer: WgpuRenderer,
    pub text_renderer: TextRenderer,
    /// Player, level, quest and triggers.
    pub game_state: GameState,
    pub audio: Box<dyn AudioPort>,
    pub volume: VolumeControl,
    pub visuals: VisualArena,
    pub riddle_scroll: RiddleScroll,
    pub door_lock: DoorLock,
    pub hud: Hud,
    /// Outcomes reported by the overlays, applied once per frame.
    pub events: Receiver<GameEvent>,
    /// The overlay view model, rebuilt every frame.
    pub ui_frame: UiFrame,
    /// Whether the cursor grab currently applied matches `game_state.capture_mouse`.
    cursor_applied: Option<bool>,
}

impl AppState {
    /// Creates the renderers, builds the level and starts the session.
    ///
    /// # Errors
    /// Fails when the GPU cannot be set up or the level config is inconsistent.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        config: &GameConfig,
        assets: LoadedAssets,
        width: u32,
        height: u32,
    ) -> Result<Self, GameError> {
        let wgpu_renderer = WgpuRenderer::new(instance, surface, width, height).await?;
        let text_renderer = TextRenderer::new(
            &wgpu_renderer.device,
            &wgpu_renderer.queue,
            wgpu_renderer.surface_config.format,
            wgpu_renderer.surface_config.width,
            wgpu_renderer.surface_config.height,
        );

        let now = Instant::now();
        let mut game_state = GameState::new(config, now)?;
        let mut hud = Hud::new(game_state.quest.subscribe(), game_state.level.keys.len(), now);
        let volume = VolumeControl::from_config(&config.audio);
        hud.set_volume(volume.readout());

        let (tx, events) = channel();
        let riddle_scroll = RiddleScroll::new(tx.clone());
        let door_lock = DoorLock::new(tx, config.level.door_sentence.clone());

        let mut audio = audio::open_audio(&config.audio, assets.clips);
        let mut visuals = VisualArena::new();
        game_state.begin(&mut visuals, assets.player_mesh, audio.as_mut());
        info!(
            "Session started at {} with {} visuals",
            hud.started_at().format("%H:%M:%S"),
            visuals.len()
        );

        Ok(Self {
            wgpu_renderer,
            text_renderer,
            game_state,
            audio,
            volume,
            visuals,
            riddle_scroll,
            door_lock,
            hud,
            events,
            ui_frame: UiFrame::default(),
            cursor_applied: None,
        })
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) {
        self.wgpu_renderer
            .resize(width, height, &mut self.text_renderer);
    }

    /// Locks or releases the cursor to match `capture_mouse`.
    ///
    /// Falls back to a confined cursor on platforms without pointer lock.
    pub fn triage_mouse(&mut self, window: &Window) {
        let capture = self.game_state.capture_mouse;
        if self.cursor_applied == Some(capture) {
            return;
        }

        if capture {
            if let Err(e) = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
            {
                warn!("Failed to grab cursor: {}", e);
                self.game_state.capture_mouse = false;
                self.cursor_applied = Some(false);
                return;
            }
            window.set_cursor_visible(false);
        } else {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                warn!("Failed to release cursor: {}", e);
            }
            window.set_cursor_visible(true);
        }
        self.cursor_applied = Some(capture);
    }

    /// Applies a volume key and refreshes the HUD readout.
    ///
    /// # Returns
    /// `false` when `key` is not a volume key.
    pub fn handle_volume_key(&mut self, key: GameKey) -> bool {
        if !self.volume.handle_key(key, self.audio.as_mut()) {
            return false;
        }
        self.hud.set_volume(self.volume.readout());
        true
    }

    /// Stops audio and drops every visual. GPU resources go with `self`.
    pub fn shutdown(&mut self) {
        self.audio.stop_all();
        self.visuals.clear();
        self.game_state.keys.clear();
    }
}
