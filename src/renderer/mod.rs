//! Main renderer module.
//!
//! Game code talks to the renderer only through [`scene::VisualArena`] and the
//! [`UiFrame`](crate::ui::UiFrame) view model; everything GPU-side lives here.

/// Scene pipeline: world geometry, torch lights and fog.
pub mod game_renderer;
/// Rounded translucent overlay panels.
pub mod panel;
/// Pipeline building utilities for WGPU.
pub mod pipeline_builder;
/// Box meshes and the scene vertex format.
pub mod primitives;
/// Renderable objects keyed by entity id.
pub mod scene;
/// Text rendering system.
pub mod text;
/// Per-frame scene uniforms.
pub mod uniform;
/// Core WGPU library and utilities.
pub mod wgpu_lib;
