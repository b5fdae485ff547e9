//! Setup-time errors.
//!
//! Everything that can go wrong while the session is being brought up lands in
//! [`GameError`]. Once the frame loop is running, failures are logged and the
//! affected subsystem degrades instead of aborting the session.

use crate::game::level::LevelError;

/// Fatal errors raised while creating the window, surface or GPU device.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    /// The event loop could not be created or run.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The OS refused to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// No rendering surface could be created for the window.
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// No adapter is compatible with the surface.
    #[error("no compatible graphics adapter found")]
    Adapter,

    /// The adapter refused to hand out a device.
    #[error("failed to create graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The surface exposes no usable color format.
    #[error("surface does not support any usable texture format")]
    SurfaceFormat,

    /// The configured level is inconsistent.
    #[error("invalid level: {0}")]
    Level(#[from] LevelError),
}
