//! # Panel Renderer
//!
//! Draws the translucent backdrops of the overlays: the riddle parchment, the door lock
//! plate with its word slots, and the end banner. Panels come from
//! [`UiFrame::panels`](crate::ui::UiFrame) in screen pixels and are batched into one
//! indexed draw with alpha blending. Rounded corners are cut in the fragment shader.

use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::ui::UiPanel;
use std::mem;
use wgpu::util::DeviceExt;
use wgpu::{Device, RenderPass, RenderPipeline, VertexAttribute, VertexBufferLayout};

/// One corner of a panel quad.
///
/// `uv` is the pixel offset inside the panel, which the shader uses to compute the
/// distance to the rounded edge.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct PanelVertex {
    position: [f32; 2],
    color: [f32; 4],
    uv: [f32; 2],
    rect_size: [f32; 2],
    corner_radius: f32,
    _padding: f32,
}

impl PanelVertex {
    const ATTRIBUTES: [VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x4,
        2 => Float32x2,
        3 => Float32x2,
        4 => Float32,
    ];

    fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: mem::size_of::<PanelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Converts a panel to four NDC vertices: top-left, top-right, bottom-right, bottom-left.
fn panel_vertices(panel: &UiPanel, window_width: f32, window_height: f32) -> [PanelVertex; 4] {
    // Screen space has y down; NDC has y up.
    let x = (panel.x / window_width) * 2.0 - 1.0;
    let y = 1.0 - (panel.y / window_height) * 2.0;
    let w = (panel.width / window_width) * 2.0;
    let h = -(panel.height / window_height) * 2.0;

    let corner = |position: [f32; 2], uv: [f32; 2]| PanelVertex {
        position,
        color: panel.color,
        uv,
        rect_size: [panel.width, panel.height],
        corner_radius: panel.corner_radius,
        _padding: 0.0,
    };
    [
        corner([x, y], [0.0, 0.0]),
        corner([x + w, y], [panel.width, 0.0]),
        corner([x + w, y + h], [panel.width, panel.height]),
        corner([x, y + h], [0.0, panel.height]),
    ]
}

pub struct PanelRenderer {
    pipeline: RenderPipeline,
    window_width: f32,
    window_height: f32,
}

impl PanelRenderer {
    pub fn new(device: &Device, surface_format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let pipeline = PipelineBuilder::new(
            device,
            surface_format,
            "Panel Pipeline",
            include_str!("shaders/panel.wgsl"),
        )
        .with_vertex_buffer(PanelVertex::desc())
        .with_alpha_blending()
        .with_no_culling()
        .build();

        Self {
            pipeline,
            window_width: width.max(1) as f32,
            window_height: height.max(1) as f32,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.window_width = width.max(1) as f32;
        self.window_height = height.max(1) as f32;
    }

    /// Draws every panel in one call. Panels later in the slice draw on top.
    pub fn render(&self, device: &Device, render_pass: &mut RenderPass, panels: &[UiPanel]) {
        if panels.is_empty() {
            return;
        }

        let mut vertices = Vec::with_capacity(panels.len() * 4);
        let mut indices: Vec<u32> = Vec::with_capacity(panels.len() * 6);
        for (i, panel) in panels.iter().enumerate() {
            vertices.extend_from_slice(&panel_vertices(panel, self.window_width, self.window_height));
            let base = (i * 4) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Panel Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Panel Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..indices.len() as u32, 0, 0..1);
    }
}
