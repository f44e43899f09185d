use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};
use gridview_common::GridConfig;
use gridview_render::{
    FramePlan, GridPass, HIGHLIGHT_INSET, HighlightPass, Palette, Renderer, grid_line_vertices,
    highlight_quad,
};
use wgpu::util::DeviceExt;

/// Fatal errors while building the GPU programs. There is no fallback path:
/// the scene cannot render without both programs.
#[derive(Debug, thiserror::Error)]
pub enum RenderInitError {
    #[error("shader `{label}` failed to compile: {diagnostic}")]
    ShaderCompile {
        label: &'static str,
        diagnostic: String,
    },
    #[error("program `{label}` failed to link: {diagnostic}")]
    ProgramLink {
        label: &'static str,
        diagnostic: String,
    },
    #[error("no compatible GPU adapter found")]
    NoAdapter,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct GridUniforms {
    mvp: [[f32; 4]; 4],
    /// Line color with the pass's LOD opacity in alpha.
    color: [f32; 4],
    zoom: f32,
    discard_below: f32,
    _pad: [f32; 2],
}

impl GridUniforms {
    fn new(projection: Mat4, pass: &GridPass) -> Self {
        let [r, g, b] = pass.color;
        Self {
            mvp: projection.to_cols_array_2d(),
            color: [r, g, b, pass.alpha],
            zoom: pass.zoom,
            discard_below: pass.lod.discard_below,
            _pad: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct HighlightUniforms {
    mvp: [[f32; 4]; 4],
    highlight_color: [f32; 4],
}

impl HighlightUniforms {
    fn new(projection: Mat4, pass: &HighlightPass) -> Self {
        let [r, g, b] = pass.color;
        Self {
            mvp: projection.to_cols_array_2d(),
            highlight_color: [r, g, b, pass.alpha],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Vertex {
    position: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    offset: [f32; 2],
}

const INSTANCE_STRIDE: u64 = std::mem::size_of::<InstanceData>() as u64;

fn vertices(points: &[Vec2]) -> Vec<Vertex> {
    points
        .iter()
        .map(|p| Vertex {
            position: p.to_array(),
        })
        .collect()
}

/// Compile WGSL, surfacing validation failures instead of the device's
/// uncaptured-error panic.
fn compile_shader(
    device: &wgpu::Device,
    label: &'static str,
    source: &str,
) -> Result<wgpu::ShaderModule, RenderInitError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(RenderInitError::ShaderCompile {
            label,
            diagnostic: err.to_string(),
        }),
        None => Ok(module),
    }
}

fn link_pipeline(
    device: &wgpu::Device,
    label: &'static str,
    descriptor: &wgpu::RenderPipelineDescriptor<'_>,
) -> Result<wgpu::RenderPipeline, RenderInitError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(descriptor);
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(RenderInitError::ProgramLink {
            label,
            diagnostic: err.to_string(),
        }),
        None => Ok(pipeline),
    }
}

/// A uniform buffer with its layout and bind group at group 0, binding 0.
struct UniformSlot {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new<T: Pod>(
        device: &wgpu::Device,
        label: &str,
        initial: &T,
        visibility: wgpu::ShaderStages,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            buffer,
            layout,
            bind_group,
        }
    }
}

/// wgpu grid renderer.
///
/// Owns every GPU resource for the scene: two static vertex buffers (grid
/// lines, quad template) and one instance buffer whose used prefix mirrors the
/// visible highlight subset.
pub struct WgpuRenderer {
    grid_pipeline: wgpu::RenderPipeline,
    highlight_pipeline: wgpu::RenderPipeline,
    grid_uniforms: UniformSlot,
    highlight_uniforms: UniformSlot,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    quad_vertex_buffer: wgpu::Buffer,
    quad_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instance_count: u32,
    instance_scratch: Vec<InstanceData>,
    clear_color: wgpu::Color,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    /// Build programs and static geometry. `max_instances` sizes the instance
    /// buffer up front, normally the full highlight count.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        grid: &GridConfig,
        palette: &Palette,
        max_instances: usize,
    ) -> Result<Self, RenderInitError> {
        let grid_uniforms = UniformSlot::new(
            device,
            "grid_uniforms",
            &GridUniforms::zeroed(),
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );
        let highlight_uniforms = UniformSlot::new(
            device,
            "highlight_uniforms",
            &HighlightUniforms::zeroed(),
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );

        let grid_shader = compile_shader(device, "grid_shader", shaders::GRID_SHADER)?;
        let highlight_shader =
            compile_shader(device, "highlight_shader", shaders::HIGHLIGHT_SHADER)?;

        let color_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        // Grid program
        let grid_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid_pipeline_layout"),
            bind_group_layouts: &[&grid_uniforms.layout],
            push_constant_ranges: &[],
        });
        let grid_pipeline = link_pipeline(
            device,
            "grid_pipeline",
            &wgpu::RenderPipelineDescriptor {
                label: Some("grid_pipeline"),
                layout: Some(&grid_layout),
                vertex: wgpu::VertexState {
                    module: &grid_shader,
                    entry_point: Some("vs_grid"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &grid_shader,
                    entry_point: Some("fs_grid"),
                    compilation_options: Default::default(),
                    targets: &color_target,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            },
        )?;

        // Highlight program
        let highlight_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("highlight_pipeline_layout"),
            bind_group_layouts: &[&highlight_uniforms.layout],
            push_constant_ranges: &[],
        });
        let highlight_pipeline = link_pipeline(
            device,
            "highlight_pipeline",
            &wgpu::RenderPipelineDescriptor {
                label: Some("highlight_pipeline"),
                layout: Some(&highlight_layout),
                vertex: wgpu::VertexState {
                    module: &highlight_shader,
                    entry_point: Some("vs_highlight"),
                    compilation_options: Default::default(),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<Vertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                        },
                        wgpu::VertexBufferLayout {
                            array_stride: INSTANCE_STRIDE,
                            step_mode: wgpu::VertexStepMode::Instance,
                            attributes: &wgpu::vertex_attr_array![1 => Float32x2],
                        },
                    ],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &highlight_shader,
                    entry_point: Some("fs_highlight"),
                    compilation_options: Default::default(),
                    targets: &color_target,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            },
        )?;

        // Static geometry
        let grid_verts = vertices(&grid_line_vertices(grid));
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_verts = vertices(&highlight_quad(HIGHLIGHT_INSET));
        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("highlight_quad_buffer"),
            contents: bytemuck::cast_slice(&quad_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_capacity = max_instances.max(1);
        let instance_buffer = Self::create_instance_buffer(device, instance_capacity);

        let [r, g, b] = palette.background;
        tracing::info!(
            grid_vertices = grid_verts.len(),
            instance_capacity,
            "wgpu renderer initialized"
        );

        Ok(Self {
            grid_pipeline,
            highlight_pipeline,
            grid_uniforms,
            highlight_uniforms,
            grid_vertex_count: grid_verts.len() as u32,
            grid_vertex_buffer,
            quad_vertex_count: quad_verts.len() as u32,
            quad_vertex_buffer,
            instance_buffer,
            instance_capacity,
            instance_count: 0,
            instance_scratch: Vec::new(),
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
            surface_format,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Number of instances the GPU buffer holds without reallocating.
    pub fn instance_capacity(&self) -> usize {
        self.instance_capacity
    }

    /// Bind the renderer to this frame's device, queue and target.
    pub fn frame<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        target: &'a wgpu::TextureView,
    ) -> WgpuFrame<'a> {
        WgpuFrame {
            renderer: self,
            device,
            queue,
            target,
        }
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("highlight_instance_buffer"),
            size: capacity as u64 * INSTANCE_STRIDE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Rewrite the used prefix of the instance buffer. Grows the buffer only
    /// when the subset exceeds its capacity.
    fn write_instances(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, offsets: &[Vec2]) {
        if offsets.len() > self.instance_capacity {
            let capacity = offsets.len().next_power_of_two();
            tracing::debug!(
                old = self.instance_capacity,
                new = capacity,
                "growing instance buffer"
            );
            self.instance_buffer = Self::create_instance_buffer(device, capacity);
            self.instance_capacity = capacity;
        }

        self.instance_scratch.clear();
        self.instance_scratch
            .extend(offsets.iter().map(|o| InstanceData { offset: o.to_array() }));
        if !self.instance_scratch.is_empty() {
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&self.instance_scratch),
            );
        }
        self.instance_count = offsets.len() as u32;
    }

    /// Encode and submit the grid pass then the highlight pass.
    fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        plan: &FramePlan,
    ) {
        if let Some(grid) = &plan.grid {
            queue.write_buffer(
                &self.grid_uniforms.buffer,
                0,
                bytemuck::bytes_of(&GridUniforms::new(plan.projection, grid)),
            );
        }
        // The instance count in the plan and the uploaded prefix come from the
        // same culling pass; take the smaller in case they ever disagree.
        let instances = plan
            .highlights
            .map(|h| h.instance_count.min(self.instance_count))
            .unwrap_or(0);
        if let Some(pass) = &plan.highlights {
            queue.write_buffer(
                &self.highlight_uniforms.buffer,
                0,
                bytemuck::bytes_of(&HighlightUniforms::new(plan.projection, pass)),
            );
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("grid_frame_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("grid_frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if plan.grid.is_some() {
                pass.set_pipeline(&self.grid_pipeline);
                pass.set_bind_group(0, &self.grid_uniforms.bind_group, &[]);
                pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
                pass.draw(0..self.grid_vertex_count, 0..1);
            }

            if instances > 0 {
                pass.set_pipeline(&self.highlight_pipeline);
                pass.set_bind_group(0, &self.highlight_uniforms.bind_group, &[]);
                pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
                pass.set_vertex_buffer(
                    1,
                    self.instance_buffer
                        .slice(..instances as u64 * INSTANCE_STRIDE),
                );
                pass.draw(0..self.quad_vertex_count, 0..instances);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// A [`WgpuRenderer`] bound to one frame's device, queue and render target.
pub struct WgpuFrame<'a> {
    renderer: &'a mut WgpuRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    target: &'a wgpu::TextureView,
}

impl Renderer for WgpuFrame<'_> {
    type Output = ();

    fn upload_instances(&mut self, offsets: &[Vec2]) {
        self.renderer
            .write_instances(self.device, self.queue, offsets);
    }

    fn render(&mut self, plan: &FramePlan) {
        self.renderer
            .draw(self.device, self.queue, self.target, plan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridview_render::GridLod;

    #[test]
    fn uniform_layouts_match_wgsl() {
        // WGSL uniform structs are 16-byte aligned.
        assert_eq!(std::mem::size_of::<GridUniforms>(), 96);
        assert_eq!(std::mem::size_of::<HighlightUniforms>(), 80);
        assert_eq!(INSTANCE_STRIDE, 8);
        assert_eq!(std::mem::size_of::<Vertex>(), 8);
    }

    #[test]
    fn grid_uniforms_carry_cpu_alpha() {
        let lod = GridLod::default();
        let pass = GridPass {
            zoom: 0.5,
            alpha: 0.35,
            color: [0.1, 0.2, 0.3],
            lod,
        };
        let u = GridUniforms::new(Mat4::IDENTITY, &pass);
        assert_eq!(u.color, [0.1, 0.2, 0.3, 0.35]);
        assert_eq!(u.zoom, 0.5);
        assert_eq!(u.discard_below, lod.discard_below);
        assert_eq!(u.mvp, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn grid_uniform_alpha_matches_frame_plan() {
        let lod = GridLod::default();
        let plan = FramePlan::new(Mat4::IDENTITY, 0.4, 0, &lod, &Palette::default());
        let pass = plan.grid.unwrap();
        let u = GridUniforms::new(plan.projection, &pass);
        assert_eq!(Some(u.color[3]), lod.grid_alpha(0.4));
    }

    #[test]
    fn highlight_uniforms_append_alpha() {
        let pass = HighlightPass {
            instance_count: 3,
            color: [0.99, 0.52, 0.1],
            alpha: 0.9,
        };
        let u = HighlightUniforms::new(Mat4::IDENTITY, &pass);
        assert_eq!(u.highlight_color, [0.99, 0.52, 0.1, 0.9]);
    }

    #[test]
    fn vertices_flatten_points() {
        let v = vertices(&[Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)]);
        let flat: &[f32] = bytemuck::cast_slice(&v);
        assert_eq!(flat, &[1.0, 2.0, 3.0, 4.0]);
    }
}
