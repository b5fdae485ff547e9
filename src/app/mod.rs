//! Application module for Keystone.
//!
//! This module ties the window, the renderer and the session together.
//!
//! # Module Structure
//!
//! - [`app_state`]: [`AppState`], everything a running session owns
//! - [`event_handler`]: [`App`] and its winit event routing
//! - [`update`]: the per-frame update and redraw
//!
//! # Event Flow
//!
//! 1. **Input Events**: key and mouse events only set flags and angles, or go to the open overlay
//! 2. **State Updates**: once per redraw the session steps (kinematics, triggers, quest)
//! 3. **Overlay Outcomes**: events reported by the overlays are applied to the quest
//! 4. **Rendering**: the scene, overlay panels and text are drawn
//!
//! # Threading Model
//!
//! Everything runs on the main thread. The only cross-thread signal is the Ctrl+C flag,
//! which is polled between frames.

pub mod app_state;
pub mod event_handler;
pub mod update;

pub use app_state::AppState;
pub use event_handler::App;
