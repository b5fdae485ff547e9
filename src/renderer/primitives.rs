//! Vertex format and box mesh construction.
//!
//! Every visible object in the castle is assembled from axis-aligned boxes. Meshes are
//! built in local space around the origin and placed in the world by the transform
//! stored next to them in the [`VisualArena`](crate::renderer::scene::VisualArena).

use crate::math::mat::Mat4;
use crate::math::vec::Vec3;

/// Vertex data for all scene geometry.
///
/// Each vertex contains:
/// - `position`: 3D position (local space while in a mesh, world space once uploaded).
/// - `color`: RGBA color (as 4 normalized u8 values), face shading already applied.
/// - `material`: Material type (see [`Material`]).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// 3D position.
    pub position: [f32; 3],
    /// RGBA color (normalized 0-255).
    pub color: [u8; 4],
    /// Material type.
    pub material: u32,
}

/// Shading model selected per vertex in the scene shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Material {
    /// Stone and wood: lit and fogged.
    Matte = 0,
    /// Flames and key glow: full brightness, no fog.
    Emissive = 1,
}

impl Vertex {
    /// Returns the vertex buffer layout for use in a wgpu pipeline.
    ///
    /// This describes the memory layout of [`Vertex`] for the GPU.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position (3 floats)
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color (4 u8 bytes, interpreted as normalized floats in shader)
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Unorm8x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress
                        + std::mem::size_of::<[u8; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Uint32,
                },
            ],
        }
    }

    /// Copy of this vertex moved by `transform`.
    pub fn transformed(&self, transform: &Mat4) -> Vertex {
        Vertex {
            position: transform.transform_point(Vec3(self.position)).0,
            ..*self
        }
    }
}

/// Brightness of each box face, so boxes read as solid without per-pixel lighting.
const FACE_SHADE: [f32; 6] = [
    1.0,  // top
    0.45, // bottom
    0.8,  // front (+Z)
    0.7,  // back (-Z)
    0.6,  // right (+X)
    0.9,  // left (-X)
];

fn shade(color: [u8; 4], factor: f32) -> [u8; 4] {
    let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
    [scale(color[0]), scale(color[1]), scale(color[2]), color[3]]
}

/// Appends the 36 vertices of a box centered at `center` with full extents `size`.
///
/// # Arguments
/// * `out` - Vertex list to append to
/// * `center` - Box center in local space
/// * `size` - Full width, height and depth
/// * `color` - Base RGBA color; each face is darkened by a fixed amount
/// * `material` - Shading model for every vertex of the box
pub fn push_box(out: &mut Vec<Vertex>, center: Vec3, size: Vec3, color: [u8; 4], material: Material) {
    let h = size * 0.5;
    let (x0, x1) = (center.x() - h.x(), center.x() + h.x());
    let (y0, y1) = (center.y() - h.y(), center.y() + h.y());
    let (z0, z1) = (center.z() - h.z(), center.z() + h.z());

    // top, bottom, +Z, -Z, +X, -X
    let faces: [[[f32; 3]; 4]; 6] = [
        [[x0, y1, z1], [x1, y1, z1], [x1, y1, z0], [x0, y1, z0]],
        [[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]],
        [[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]],
        [[x1, y0, z0], [x0, y0, z0], [x0, y1, z0], [x1, y1, z0]],
        [[x1, y0, z1], [x1, y0, z0], [x1, y1, z0], [x1, y1, z1]],
        [[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]],
    ];

    for (face, factor) in faces.iter().zip(FACE_SHADE) {
        let color = shade(color, factor);
        for index in [0, 1, 2, 0, 2, 3] {
            out.push(Vertex {
                position: face[index],
                color,
                material: material as u32,
            });
        }
    }
}

/// A single box as its own mesh.
pub fn box_mesh(size: Vec3, color: [u8; 4], material: Material) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(36);
    push_box(&mut out, Vec3::ZERO, size, color, material);
    out
}
