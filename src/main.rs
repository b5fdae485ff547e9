//! Keystone - a third-person castle escape.
//!
//! The player walks a torch-lit hall, finds four keys, answers the riddle bound to each,
//! then arranges the collected words to unlock the door to the treasure chamber.
//!
//! # Architecture
//! - `app/`: window lifecycle, event routing, frame update and teardown
//! - `game/`: collision, player kinematics, triggers and the quest state machine
//! - `ui/`: the riddle scroll, the door lock and the HUD
//! - `renderer/`: WGPU scene, overlay panels and text
//! - `assets`, `config`, `error`, `math`: supporting pieces
//!
//! # Usage
//! Run with `cargo run`. Set `KEYSTONE_CONFIG` to load a different config file and
//! `RUST_LOG` to change the log level.

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod game;
pub mod math;
pub mod renderer;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

use config::GameConfig;
use log::{LevelFilter, error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use winit::event_loop::{ControlFlow, EventLoop};

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> ExitCode {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the event loop until teardown.
///
/// # Returns
/// `Ok(false)` when the session could not start.
///
/// # Errors
/// Returns an error if the event loop cannot be created or fails while running.
fn run() -> Result<bool, error::GameError> {
    let config = GameConfig::load();

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("Ctrl+C handler not installed: {}", e);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = app::App::new(config, shutdown);
    event_loop.run_app(&mut app)?;
    info!("Goodbye");

    Ok(!app.setup_failed())
}
