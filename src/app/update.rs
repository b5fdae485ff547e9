//! Update logic for the Keystone app.
//!
//! One redraw runs the whole frame: step the session, apply overlay outcomes, refresh the
//! HUD, lay out the overlays and draw.

use super::app_state::AppState;
use super::event_handler::App;
use crate::game::triggers::TriggerFired;
use crate::ui::OverlayInput;
use log::{debug, error, info};
use std::time::Instant;
use winit::keyboard::Key;

impl AppState {
    /// Advances the session by one frame and rebuilds the overlay view model.
    pub fn update(&mut self, now: Instant) {
        let fired = self.game_state.step(
            now,
            self.audio.as_mut(),
            &mut self.riddle_scroll,
            &mut self.door_lock,
            &mut self.visuals,
        );
        for trigger in &fired {
            if let TriggerFired::EndSequence = trigger {
                info!("The chest is open");
            }
        }

        self.riddle_scroll.update(now);
        self.door_lock.update(now);
        while let Ok(event) = self.events.try_recv() {
            debug!("Overlay reported {:?}", event);
            self.game_state
                .handle_event(event, self.audio.as_mut(), &mut self.visuals);
        }
        self.hud.update(now);

        let width = self.wgpu_renderer.surface_config.width as f32;
        let height = self.wgpu_renderer.surface_config.height as f32;
        self.ui_frame.clear();
        self.hud.layout(&mut self.ui_frame, width, height);
        self.riddle_scroll.layout(&mut self.ui_frame, width, height);
        self.door_lock.layout(&mut self.ui_frame, width, height);
    }

    /// Sends a key press to whichever overlay is open.
    ///
    /// # Returns
    ///
    /// `true` when an overlay consumed the key.
    pub fn route_overlay_input(&mut self, key: &Key, now: Instant) -> bool {
        if !self.riddle_scroll.is_open() && !self.door_lock.is_open() {
            return false;
        }
        let Some(input) = OverlayInput::from_winit(key) else {
            // Overlays swallow everything except the quit key.
            return true;
        };

        if self.riddle_scroll.is_open() {
            self.riddle_scroll
                .handle_input(input, now, self.audio.as_mut());
        } else {
            self.door_lock.handle_input(input, now, self.audio.as_mut());
        }
        true
    }
}

impl App {
    /// Runs one frame: update, then draw.
    ///
    /// Minimized windows skip both.
    pub fn handle_redraw(&mut self) {
        let (Some(window), Some(state)) = (self.window.as_ref(), self.state.as_mut()) else {
            return;
        };
        if window.is_minimized().unwrap_or(false) {
            return;
        }

        state.update(Instant::now());
        state.triage_mouse(window);

        let result = state.wgpu_renderer.render(
            &state.game_state,
            &state.visuals,
            &state.ui_frame,
            &mut state.text_renderer,
        );
        if let Err(e) = result {
            error!("Rendering stopped: {:?}", e);
            self.request_shutdown();
        }
    }
}
