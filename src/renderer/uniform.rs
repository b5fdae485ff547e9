//! Uniform buffer utilities for wgpu rendering.
//!
//! This module provides the [`Uniforms`] struct for storing and uploading per-frame
//! scene data (camera matrix, camera position, torch lights, fog and time) to the GPU,
//! as well as helper methods for buffer and bind group creation.

use crate::math::mat::Mat4;
use crate::math::vec::Vec3;
use wgpu::util::DeviceExt;

/// Most point lights the scene shader takes.
pub const MAX_LIGHTS: usize = 4;

/// Uniforms for the scene pipeline. Layout matches `SceneUniforms` in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    /// Projection * View.
    pub view_proj: [[f32; 4]; 4],
    /// Camera position in `xyz`; `w` unused.
    pub camera: [f32; 4],
    /// `x` elapsed seconds, `y` ambient level, `z` fog start, `w` fog end.
    pub params: [f32; 4],
    /// Torch lights: position in `xyz`, intensity in `w`. Zero intensity disables a slot.
    pub lights: [[f32; 4]; MAX_LIGHTS],
}

impl Default for Uniforms {
    fn default() -> Self {
        Self::new()
    }
}

impl Uniforms {
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::identity().into(),
            camera: [0.0; 4],
            params: [0.0, 0.35, 12.0, 40.0],
            lights: [[0.0; 4]; MAX_LIGHTS],
        }
    }

    pub fn set_camera(&mut self, view_proj: Mat4, position: Vec3) {
        self.view_proj = view_proj.into();
        self.camera = [position.x(), position.y(), position.z(), 1.0];
    }

    pub fn set_time(&mut self, elapsed: f32) {
        self.params[0] = elapsed;
    }

    /// Fills the light slots in order; extra lights are dropped and unused slots cleared.
    pub fn set_lights(&mut self, lights: impl IntoIterator<Item = (Vec3, f32)>) {
        self.lights = [[0.0; 4]; MAX_LIGHTS];
        for (slot, (position, intensity)) in self.lights.iter_mut().zip(lights) {
            *slot = [position.x(), position.y(), position.z(), intensity];
        }
    }

    /// Returns the raw bytes of the uniform struct for uploading to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Creates a GPU buffer containing the uniform data.
    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform Buffer"),
            contents: self.as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    /// Creates a bind group and layout for the uniform buffer.
    ///
    /// # Returns
    /// A tuple of (`wgpu::BindGroup`, `wgpu::BindGroupLayout`), visible to both shader stages.
    pub fn create_bind_group(
        &self,
        buffer: &wgpu::Buffer,
        device: &wgpu::Device,
    ) -> (wgpu::BindGroup, wgpu::BindGroupLayout) {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("scene_uniform_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("scene_uniform_bind_group"),
        });
        (bind_group, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// WGSL uniform structs must be a multiple of 16 bytes.
    #[test]
    fn test_uniform_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<Uniforms>(), 64 + 16 + 16 + 16 * MAX_LIGHTS);
    }

    #[test]
    fn test_set_lights_clears_unused_slots() {
        let mut uniforms = Uniforms::new();
        uniforms.set_lights((0..6).map(|i| (Vec3::new(i as f32, 0.0, 0.0), 1.0)));
        assert_eq!(uniforms.lights[3], [3.0, 0.0, 0.0, 1.0]);

        uniforms.set_lights([(Vec3::new(1.0, 2.0, 3.0), 0.5)]);
        assert_eq!(uniforms.lights[0], [1.0, 2.0, 3.0, 0.5]);
        assert_eq!(uniforms.lights[1], [0.0; 4]);
    }
}
