use crate::config::GridConfig;
use crate::constants::{BACKGROUND_COLOR, COMPUTE_WORKGROUP_SIZE};
use crate::simulation::ActiveBuffer;
use crate::utils::cells_to_words;
use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

// --- GPU Data Structures ---

// Must match the GridParams struct in render.wgsl and update.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct GridParams {
    width: u32,
    height: u32,
    cell_size: u32,
    _pad: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
}

impl QuadVertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x2],
        }
    }
}

// Two triangles covering the whole render target.
const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex {
        position: [-1.0, -1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
    },
];

// --- Renderer ---
pub struct Renderer<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    grid: GridConfig,
    render_pipeline: wgpu::RenderPipeline,
    compute_pipeline: wgpu::ComputePipeline,
    quad_vertex_buffer: wgpu::Buffer,
    cell_buffer_a: wgpu::Buffer,
    cell_buffer_b: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    display_bind_group_a: wgpu::BindGroup,
    display_bind_group_b: wgpu::BindGroup,
    compute_bind_group_a_to_b: wgpu::BindGroup,
    compute_bind_group_b_to_a: wgpu::BindGroup,
    window: Arc<Window>,
}

impl<'a> Renderer<'a> {
    /// One-time GPU setup. Any failure here is fatal; there is no degraded
    /// mode to fall back to.
    pub async fn new(window: Arc<Window>, grid: GridConfig) -> Self {
        let size = window.inner_size();
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to find an appropriate adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let render_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Grid Render Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("render.wgsl").into()),
        });
        let update_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Grid Update Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("update.wgsl").into()),
        });

        // --- Buffers ---

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fullscreen Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let params = GridParams {
            width: grid.width,
            height: grid.height,
            cell_size: grid.cell_size,
            _pad: 0,
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Params Buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        // One u32 word per cell; two buffers so an update never reads and
        // writes the same memory.
        let cell_buffer_size =
            (grid.cell_count() * std::mem::size_of::<u32>()) as wgpu::BufferAddress;
        let cell_buffer_desc = |label| wgpu::BufferDescriptor {
            label: Some(label),
            size: cell_buffer_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        };
        let cell_buffer_a = device.create_buffer(&cell_buffer_desc("Cell Buffer A"));
        let cell_buffer_b = device.create_buffer(&cell_buffer_desc("Cell Buffer B"));

        // --- Bind Group Layouts ---

        let params_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Params Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<GridParams>() as _
                        ),
                    },
                    count: None,
                }],
            });

        let display_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Display Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<u32>() as _),
                    },
                    count: None,
                }],
            });

        let compute_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Compute Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<u32>() as _
                            ),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<u32>() as _
                            ),
                        },
                        count: None,
                    },
                ],
            });

        // --- Bind Groups ---

        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Params Bind Group"),
            layout: &params_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let display_bind_group = |label, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &display_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        };
        let display_bind_group_a = display_bind_group("Display Bind Group A", &cell_buffer_a);
        let display_bind_group_b = display_bind_group("Display Bind Group B", &cell_buffer_b);

        let compute_bind_group = |label, input: &wgpu::Buffer, output: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &compute_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: input.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: output.as_entire_binding(),
                    },
                ],
            })
        };
        let compute_bind_group_a_to_b =
            compute_bind_group("Compute Bind Group A->B", &cell_buffer_a, &cell_buffer_b);
        let compute_bind_group_b_to_a =
            compute_bind_group("Compute Bind Group B->A", &cell_buffer_b, &cell_buffer_a);

        // --- Pipelines ---

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Grid Render Pipeline Layout"),
                bind_group_layouts: &[&params_bind_group_layout, &display_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Grid Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &render_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &render_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Grid Update Pipeline Layout"),
                bind_group_layouts: &[&params_bind_group_layout, &compute_bind_group_layout],
                push_constant_ranges: &[],
            });

        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Grid Update Pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &update_shader,
            entry_point: Some("step"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            surface,
            device,
            queue,
            config,
            size,
            grid,
            render_pipeline,
            compute_pipeline,
            quad_vertex_buffer,
            cell_buffer_a,
            cell_buffer_b,
            params_bind_group,
            display_bind_group_a,
            display_bind_group_b,
            compute_bind_group_a_to_b,
            compute_bind_group_b_to_a,
            window,
        }
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let new_size = PhysicalSize::new(new_size.width.max(1), new_size.height.max(1));
        if new_size != self.size {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
        }
        self.surface.configure(&self.device, &self.config);
    }

    /// Overwrites the grid buffer that `active` names with fresh cell
    /// values. Used when (re)seeding the simulation.
    pub fn upload_cells(&self, cells: &[u8], active: ActiveBuffer) {
        debug_assert_eq!(cells.len(), self.grid.cell_count());
        let words = cells_to_words(cells);
        let buffer = match active {
            ActiveBuffer::A => &self.cell_buffer_a,
            ActiveBuffer::B => &self.cell_buffer_b,
        };
        self.queue.write_buffer(buffer, 0, bytemuck::cast_slice(&words));
    }

    /// Encodes one frame: draw the current grid, then (unless paused)
    /// dispatch the update that writes the other grid. The caller advances
    /// the generation counter only when this returns Ok.
    pub fn frame(
        &mut self,
        active: ActiveBuffer,
        run_update: bool,
    ) -> Result<(), wgpu::SurfaceError> {
        let output_texture = self.surface.get_current_texture()?;
        let view = output_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Grid Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.params_bind_group, &[]);
            let display_bind_group = match active {
                ActiveBuffer::A => &self.display_bind_group_a,
                ActiveBuffer::B => &self.display_bind_group_b,
            };
            render_pass.set_bind_group(1, display_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            render_pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
        }

        if run_update {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Grid Update Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.compute_pipeline);
            compute_pass.set_bind_group(0, &self.params_bind_group, &[]);
            let compute_bind_group = match active {
                ActiveBuffer::A => &self.compute_bind_group_a_to_b,
                ActiveBuffer::B => &self.compute_bind_group_b_to_a,
            };
            compute_pass.set_bind_group(1, compute_bind_group, &[]);
            compute_pass.dispatch_workgroups(
                self.grid.width.div_ceil(COMPUTE_WORKGROUP_SIZE),
                self.grid.height.div_ceil(COMPUTE_WORKGROUP_SIZE),
                1,
            );
        }

        // Queue submission order guarantees this frame's update has finished
        // before the next frame's render pass reads its output.
        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output_texture.present();

        Ok(())
    }
}
