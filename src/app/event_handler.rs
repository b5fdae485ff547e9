//! Event handler module for Keystone.
//!
//! Contains the App struct and its event handling logic.

use crate::app::app_state::AppState;
use crate::assets::{AssetLoader, IconImage, LoadedAssets};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::keys::{GameKey, winit_key_to_game_key};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::ActiveEventLoop,
    window::{Icon, Window, WindowId},
};

/// Main application struct that manages the session lifecycle and event handling.
///
/// # Lifecycle
/// 1. Created with [`App::new`], holding the WGPU instance and the config
/// 2. On `resumed`, assets load, the window opens and [`AppState`] is built
/// 3. Events are handled via the [`ApplicationHandler`] trait methods
/// 4. Window close, the quit key, Ctrl+C, a render failure or a setup failure all end in
///    the same once-only teardown
pub struct App {
    /// The WGPU instance for graphics operations.
    pub instance: wgpu::Instance,
    pub config: GameConfig,
    /// The current application state, None until initialized.
    pub state: Option<AppState>,
    /// The application window, None until set.
    pub window: Option<Arc<Window>>,
    /// Set by Ctrl+C or by a fatal frame; polled between frames.
    shutdown: Arc<AtomicBool>,
    torn_down: bool,
    setup_failed: bool,
}

impl App {
    pub fn new(config: GameConfig, shutdown: Arc<AtomicBool>) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        Self {
            instance,
            config,
            state: None,
            window: None,
            shutdown,
            torn_down: false,
            setup_failed: false,
        }
    }

    /// Whether startup failed. Checked by `main` to pick the exit code.
    pub fn setup_failed(&self) -> bool {
        self.setup_failed
    }

    /// Asks for teardown at the next opportunity.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn load_assets(&self) -> LoadedAssets {
        let mut loader = AssetLoader::new(&self.config.assets);
        let progress = loader.subscribe();
        let assets = loader.load_all(&self.config.player);
        for step in progress.try_iter() {
            info!(
                "Loading [{:>3}%] {:?} {} ({})",
                step.percentage, step.kind, step.current_asset, step.status
            );
        }
        assets
    }

    /// Opens the window, creates the surface and starts the session.
    ///
    /// # Errors
    /// Any failure here is fatal; the caller tears down.
    pub async fn set_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), GameError> {
        let assets = self.load_assets();
        let window_config = &self.config.window;

        let mut attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
        match window_icon(&assets.icon) {
            Ok(icon) => attributes = attributes.with_window_icon(Some(icon)),
            Err(e) => warn!("Window icon rejected: {}", e),
        }
        let window = Arc::new(event_loop.create_window(attributes)?);
        self.window = Some(window.clone());

        let size = window.inner_size();
        let surface = self.instance.create_surface(window.clone())?;
        let state = AppState::new(
            &self.instance,
            surface,
            &self.config,
            assets,
            size.width.max(1),
            size.height.max(1),
        )
        .await?;

        self.state = Some(state);
        Ok(())
    }

    pub fn handle_resized(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        match self.state.as_mut() {
            Some(state) => state.resize_surface(width, height),
            None => debug!("Resize before session start ignored"),
        }
    }

    /// Stops audio, releases visuals and GPU resources, and leaves the event loop.
    ///
    /// Runs at most once.
    fn teardown(&mut self, event_loop: &ActiveEventLoop) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some(mut state) = self.state.take() {
            state.shutdown();
        }
        self.window = None;
        info!("Teardown complete");
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let game_key = winit_key_to_game_key(&event.logical_key);

        match event.state {
            ElementState::Pressed => {
                if game_key == Some(GameKey::Quit) {
                    info!("Quit key pressed");
                    self.teardown(event_loop);
                    return;
                }
                if state.route_overlay_input(&event.logical_key, Instant::now()) || event.repeat {
                    return;
                }
                match game_key {
                    Some(GameKey::Escape) => state.game_state.capture_mouse = false,
                    Some(key) if state.handle_volume_key(key) => {}
                    Some(key) => state.game_state.keys.press_key(key),
                    None => {}
                }
            }
            ElementState::Released => {
                if let Some(key) = game_key {
                    state.game_state.keys.release_key(key);
                }
            }
        }
    }
}

fn window_icon(icon: &IconImage) -> Result<Icon, winit::window::BadIcon> {
    Icon::from_rgba(icon.rgba.clone(), icon.width, icon.height)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.torn_down {
            return;
        }
        if let Err(e) = pollster::block_on(self.set_window(event_loop)) {
            error!("Setup failed: {}", e);
            self.setup_failed = true;
            self.teardown(event_loop);
        }
    }

    /// Mouse look. The game state ignores it unless the cursor is captured.
    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if let Some(state) = self.state.as_mut() {
                state.game_state.mouse_movement(delta.0, delta.1);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("The close button was pressed; stopping");
                self.teardown(event_loop);
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resized(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event_loop, event);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(state) = self.state.as_mut() {
                    if !state.game_state.overlay_open() {
                        state.game_state.capture_mouse = true;
                    }
                }
            }
            WindowEvent::Focused(false) => {
                if let Some(state) = self.state.as_mut() {
                    state.game_state.keys.clear();
                    state.game_state.capture_mouse = false;
                }
            }
            WindowEvent::RedrawRequested => {
                self.handle_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.shutdown.load(Ordering::SeqCst) {
            info!("Shutdown requested");
            self.teardown(event_loop);
            return;
        }
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}
