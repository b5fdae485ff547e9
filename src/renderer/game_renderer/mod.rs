use crate::game::GameState;
use crate::renderer::pipeline_builder::{DEPTH_FORMAT, PipelineBuilder};
use crate::renderer::primitives::Vertex;
use crate::renderer::scene::VisualArena;
use crate::renderer::uniform::Uniforms;

/// Starting size of the scene vertex buffer, in vertices. Grows on demand.
const INITIAL_VERTEX_CAPACITY: usize = 16 * 1024;

/// Light intensity of every torch.
const TORCH_INTENSITY: f32 = 1.0;

/// Main renderer for the 3D chamber.
///
/// Every visible object in the [`VisualArena`] is flattened into world space each frame
/// and drawn in one call with depth testing. Torch positions go to the shader as point
/// lights; flicker and fog are computed there.
///
/// # Fields
///
/// - `pipeline` - Scene pipeline with depth testing and both faces drawn
/// - `vertex_buffer` - Dynamic buffer rewritten every frame, reallocated when too small
/// - `uniform_buffer` - Camera, time and torch lights, bound at group 0
/// - `depth_texture` - Depth buffer, recreated when the surface size changes
pub struct SceneRenderer {
    pub pipeline: wgpu::RenderPipeline,
    pub vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    /// Vertices written this frame.
    pub vertex_count: u32,
    /// Scratch space reused between frames.
    scratch: Vec<Vertex>,
    pub uniforms: Uniforms,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    pub depth_texture: Option<wgpu::Texture>,
}

impl SceneRenderer {
    pub fn new(device: &wgpu::Device, surface_config: &wgpu::SurfaceConfiguration) -> Self {
        let uniforms = Uniforms::new();
        let uniform_buffer = uniforms.create_buffer(device);
        let (uniform_bind_group, uniform_bind_group_layout) =
            uniforms.create_bind_group(&uniform_buffer, device);

        let pipeline = PipelineBuilder::new(
            device,
            surface_config.format,
            "Scene Pipeline",
            include_str!("../shaders/scene.wgsl"),
        )
        .with_vertex_buffer(Vertex::desc())
        .with_bind_group_layout(&uniform_bind_group_layout)
        .with_no_culling()
        .with_depth()
        .build();

        Self {
            pipeline,
            vertex_buffer: create_vertex_buffer(device, INITIAL_VERTEX_CAPACITY),
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            vertex_count: 0,
            scratch: Vec::with_capacity(INITIAL_VERTEX_CAPACITY),
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            depth_texture: None,
        }
    }

    /// Returns a view of the depth buffer, recreating it if the size changed.
    pub fn update_depth_texture(&mut self, device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let (width, height) = (width.max(1), height.max(1));
        let texture = match self.depth_texture.take() {
            Some(texture) if texture.width() == width && texture.height() == height => texture,
            _ => device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            }),
        };
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth_texture = Some(texture);
        view
    }

    /// Uploads this frame's geometry and uniforms. Call before the render pass begins.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        game_state: &GameState,
        visuals: &VisualArena,
        aspect: f32,
    ) {
        self.uniforms
            .set_camera(game_state.player.view_proj_matrix(aspect), game_state.player.camera.position);
        self.uniforms.set_time(game_state.clock.elapsed);
        self.uniforms.set_lights(
            game_state
                .level
                .torches
                .iter()
                .map(|torch| (torch.position, TORCH_INTENSITY)),
        );
        queue.write_buffer(&self.uniform_buffer, 0, self.uniforms.as_bytes());

        visuals.world_vertices(&mut self.scratch);
        if self.scratch.len() > self.vertex_capacity {
            self.vertex_capacity = grown_capacity(self.vertex_capacity, self.scratch.len());
            log::debug!("Growing scene vertex buffer to {} vertices", self.vertex_capacity);
            self.vertex_buffer = create_vertex_buffer(device, self.vertex_capacity);
        }
        if !self.scratch.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.scratch));
        }
        self.vertex_count = self.scratch.len() as u32;
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass) {
        if self.vertex_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: (capacity * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Doubles `current` until it holds `needed`.
fn grown_capacity(current: usize, needed: usize) -> usize {
    let mut capacity = current.max(1);
    while capacity < needed {
        capacity *= 2;
    }
    capacity
}
