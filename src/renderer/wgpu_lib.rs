//! WGPU-based renderer for Keystone.
//!
//! This module provides [`WgpuRenderer`], which owns the surface, device and queue along
//! with the three layers drawn each frame:
//!
//! 1. The castle scene ([`SceneRenderer`]) with depth testing
//! 2. Overlay panels ([`PanelRenderer`])
//! 3. Overlay and HUD text ([`TextRenderer`])
//!
//! # Usage
//! Create a [`WgpuRenderer`] via [`WgpuRenderer::new`] and call [`WgpuRenderer::render`]
//! once per frame.

use crate::error::GameError;
use crate::game::GameState;
use crate::renderer::game_renderer::SceneRenderer;
use crate::renderer::panel::PanelRenderer;
use crate::renderer::scene::VisualArena;
use crate::renderer::text::TextRenderer;
use crate::ui::UiFrame;
use log::{error, info, warn};
use wgpu::TextureView;

/// Matches the fog color in `scene.wgsl` so distant geometry fades into the clear color.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.04,
    g: 0.035,
    b: 0.05,
    a: 1.0,
};

pub struct WgpuRenderer {
    /// The WGPU surface for presenting rendered frames.
    pub surface: wgpu::Surface<'static>,
    /// The surface configuration (format, size, etc.).
    pub surface_config: wgpu::SurfaceConfiguration,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub scene_renderer: SceneRenderer,
    pub panel_renderer: PanelRenderer,
}

impl WgpuRenderer {
    /// Initializes a new [`WgpuRenderer`] and all associated GPU resources.
    ///
    /// # Errors
    /// Fails when no adapter fits the surface, the device request is refused or the surface
    /// has no usable format.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
    ) -> Result<Self, GameError> {
        let adapter = Self::create_adapter(instance, &surface).await?;
        let (device, queue) = Self::create_device(&adapter).await?;
        let surface_config = Self::create_surface_config(&surface, &adapter, width, height)?;

        surface.configure(&device, &surface_config);
        info!(
            "Surface configured: {}x{} {:?} on {}",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            adapter.get_info().name
        );

        let scene_renderer = SceneRenderer::new(&device, &surface_config);
        let panel_renderer = PanelRenderer::new(
            &device,
            surface_config.format,
            surface_config.width,
            surface_config.height,
        );

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            scene_renderer,
            panel_renderer,
        })
    }

    async fn create_adapter(
        instance: &wgpu::Instance,
        surface: &wgpu::Surface<'static>,
    ) -> Result<wgpu::Adapter, GameError> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: Some(surface),
            })
            .await
            .ok_or(GameError::Adapter)
    }

    async fn create_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue), GameError> {
        let device = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: Default::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;
        Ok(device)
    }

    fn create_surface_config(
        surface: &wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<wgpu::SurfaceConfiguration, GameError> {
        let capabilities = surface.get_capabilities(adapter);
        let format = capabilities
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| capabilities.formats.first())
            .copied()
            .ok_or(GameError::SurfaceFormat)?;
        let alpha_mode = capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        })
    }

    /// Reconfigures the surface for a new window size. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32, text_renderer: &mut TextRenderer) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.panel_renderer.resize(width, height);
        text_renderer.resize(&self.queue, width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height.max(1) as f32
    }

    /// Renders one frame and presents it.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    ///
    /// # Errors
    /// Returns the surface error when the GPU is out of memory; the caller should exit.
    pub fn render(
        &mut self,
        game_state: &GameState,
        visuals: &VisualArena,
        ui: &UiFrame,
        text_renderer: &mut TextRenderer,
    ) -> Result<(), wgpu::SurfaceError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!("Surface {:?}, reconfiguring", e);
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Surface timed out, skipping frame");
                return Ok(());
            }
            Err(e) => {
                error!("Failed to acquire surface texture: {:?}", e);
                return Err(e);
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (width, height) = (self.surface_config.width, self.surface_config.height);
        let depth_view = self.scene_renderer.update_depth_texture(&self.device, width, height);
        let aspect = self.aspect();
        self.scene_renderer
            .prepare(&self.device, &self.queue, game_state, visuals, aspect);

        text_renderer.sync_frame(ui);
        if let Err(e) = text_renderer.prepare(&self.device, &self.queue) {
            warn!("Failed to prepare text: {:?}", e);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.render_scene(&mut encoder, &surface_view, &depth_view);
        self.render_overlay(&mut encoder, &surface_view, ui, text_renderer);

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        text_renderer.trim();
        Ok(())
    }

    fn render_scene(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &TextureView,
        depth_view: &TextureView,
    ) {
        let mut scene_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        self.scene_renderer.render(&mut scene_pass);
    }

    /// Panels first, then text on top, in one pass without depth.
    fn render_overlay(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &TextureView,
        ui: &UiFrame,
        text_renderer: &mut TextRenderer,
    ) {
        let mut overlay_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.panel_renderer
            .render(&self.device, &mut overlay_pass, &ui.panels);
        if let Err(e) = text_renderer.render(&mut overlay_pass) {
            warn!("Text render failed: {:?}", e);
        }
    }
}
