//! Rendering system with wgpu pipelines for band curves and persistence trails.
//!
//! Curves draw into an offscreen accumulation texture that is faded rather
//! than cleared each frame, then copied to the swapchain.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::audio::FrequencyBand;
use crate::camera::OrbitCamera;
use crate::curve::{CurveGeometry, POINT_STRIDE};
use crate::error::RenderError;
use crate::params::{BlendMode, RenderConfig, RenderMode};

/// Accumulation buffer format (float so additive overlaps don't band)
const TRAIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Initial per-band vertex capacity (points)
const INITIAL_POINT_CAPACITY: usize = 2048;

/// Vertices in one point-sprite quad
const QUAD_VERTICES: u32 = 6;

/// Uniform buffer for the curve shader (one per band)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CurveUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// Surface size in pixels
    pub viewport: [f32; 2],
    /// Point sprite diameter in pixels
    pub point_size: f32,
    pub _padding: f32, // Padding for alignment
}

/// Uniform buffer for the fade pass (black at the configured alpha)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FadeUniforms {
    pub color: [f32; 4],
}

/// Point sprite size after distance attenuation.
///
/// In 3D the configured size is rescaled by `10 / max(1, distance)` so
/// points shrink as the camera backs away; 2D uses it as-is.
pub fn effective_point_size(size: f32, camera_distance: f32, enable_3d: bool) -> f32 {
    if enable_3d {
        (size / 3.0) * (10.0 / camera_distance.max(1.0))
    } else {
        size
    }
}

/// True when the window's drawable size differs from the configured surface
pub fn needs_resize(window_size: (u32, u32), surface_size: (u32, u32)) -> bool {
    window_size.0 > 0 && window_size.1 > 0 && window_size != surface_size
}

/// Blend state for a global blend mode
pub fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
        BlendMode::Normal => wgpu::BlendState::ALPHA_BLENDING,
    }
}

/// Pipeline variants: every blend mode × primitive × depth combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    blend: BlendMode,
    mode: RenderMode,
    depth: bool,
}

impl PipelineKey {
    fn all() -> impl Iterator<Item = Self> {
        [BlendMode::Additive, BlendMode::Normal]
            .into_iter()
            .flat_map(|blend| {
                [RenderMode::Points, RenderMode::Lines]
                    .into_iter()
                    .flat_map(move |mode| {
                        [false, true]
                            .into_iter()
                            .map(move |depth| PipelineKey { blend, mode, depth })
                    })
            })
    }
}

/// GPU resources owned by one band
struct BandSlot {
    vertex_buffer: wgpu::Buffer,
    capacity_points: usize,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Offscreen targets sized to the surface
struct FrameTargets {
    trail_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    blit_bind_group: wgpu::BindGroup,
}

/// Scene renderer managing the wgpu device, pipelines and per-band buffers
pub struct SceneRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    render_config: RenderConfig,

    curve_pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    fade_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,

    curve_bind_group_layout: wgpu::BindGroupLayout,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    fade_uniform_buffer: wgpu::Buffer,
    fade_bind_group: wgpu::BindGroup,

    bands: Vec<BandSlot>,
    targets: FrameTargets,
}

impl SceneRenderer {
    /// Create the GPU context, compile shaders and build every pipeline.
    ///
    /// Any adapter, device or shader/pipeline failure is reported here, before
    /// a frame is drawn.
    pub async fn new(
        window: Arc<winit::window::Window>,
        mut render_config: RenderConfig,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance.create_surface(window).map_err(|e| {
            RenderError::Initialization(format!("Failed to create surface: {}", e))
        })?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                RenderError::Initialization("Failed to find suitable GPU adapter".to_string())
            })?;

        // Request device
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Initialization(format!("Failed to request device: {}", e)))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| {
                RenderError::Initialization("Surface reports no texture formats".to_string())
            })?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        render_config.window_width = surface_config.width;
        render_config.window_height = surface_config.height;

        // Shader or pipeline validation errors surface through this scope
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let curve_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Curve Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/curve.wgsl").into()),
        });
        let fade_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fade Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/fade.wgsl").into()),
        });
        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let uniform_layout_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let curve_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Curve Bind Group Layout"),
                entries: &[uniform_layout_entry],
            });
        let fade_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Fade Bind Group Layout"),
                entries: &[uniform_layout_entry],
            });
        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blit Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        // Curve pipelines
        let curve_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Curve Pipeline Layout"),
                bind_group_layouts: &[&curve_bind_group_layout],
                push_constant_ranges: &[],
            });
        let curve_pipelines = PipelineKey::all()
            .map(|key| {
                let pipeline = create_curve_pipeline(&device, &curve_pipeline_layout, &curve_shader, key);
                (key, pipeline)
            })
            .collect();

        // Fade pipeline: black at clear_alpha over the previous frame
        let fade_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Fade Pipeline Layout"),
                bind_group_layouts: &[&fade_bind_group_layout],
                push_constant_ranges: &[],
            });
        let fade_pipeline = create_fullscreen_pipeline(
            &device,
            "Fade Pipeline",
            &fade_pipeline_layout,
            &fade_shader,
            TRAIL_FORMAT,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        // Blit pipeline: accumulation texture to swapchain
        let blit_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Blit Pipeline Layout"),
                bind_group_layouts: &[&blit_bind_group_layout],
                push_constant_ranges: &[],
            });
        let blit_pipeline = create_fullscreen_pipeline(
            &device,
            "Blit Pipeline",
            &blit_pipeline_layout,
            &blit_shader,
            surface_config.format,
            None,
        );

        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::Initialization(format!(
                "Shader or pipeline creation failed: {}",
                error
            )));
        }

        let fade_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fade Uniform Buffer"),
            contents: bytemuck::cast_slice(&[fade_uniforms(render_config.clear_alpha)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let fade_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Fade Bind Group"),
            layout: &fade_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: fade_uniform_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Trail Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bands = FrequencyBand::ALL
            .iter()
            .map(|band| create_band_slot(&device, &curve_bind_group_layout, *band, INITIAL_POINT_CAPACITY))
            .collect();

        let targets = create_frame_targets(
            &device,
            &blit_bind_group_layout,
            &sampler,
            (surface_config.width, surface_config.height),
        );

        log::info!(
            "Renderer ready: {}x{} {:?} on {}",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            adapter.get_info().name
        );

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            render_config,
            curve_pipelines,
            fade_pipeline,
            blit_pipeline,
            curve_bind_group_layout,
            blit_bind_group_layout,
            sampler,
            fade_uniform_buffer,
            fade_bind_group,
            bands,
            targets,
        })
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Reallocate the surface and offscreen targets if the window changed
    fn resize_if_needed(&mut self, window_size: (u32, u32)) {
        if !needs_resize(window_size, self.surface_size()) {
            return;
        }
        self.surface_config.width = window_size.0;
        self.surface_config.height = window_size.1;
        self.surface.configure(&self.device, &self.surface_config);
        self.render_config.window_width = window_size.0;
        self.render_config.window_height = window_size.1;

        self.targets = create_frame_targets(
            &self.device,
            &self.blit_bind_group_layout,
            &self.sampler,
            window_size,
        );
        log::debug!("Resized to {}x{}", window_size.0, window_size.1);
    }

    /// Upload one band's points and uniforms; returns the points to draw
    fn upload(&mut self, geometry: &CurveGeometry, view_proj: Mat4, camera_distance: f32) -> u32 {
        let count = geometry.point_count();
        let index = geometry.band.index();

        if count > self.bands[index].capacity_points {
            let capacity = count.next_power_of_two();
            self.bands[index] =
                create_band_slot(&self.device, &self.curve_bind_group_layout, geometry.band, capacity);
        }
        let slot = &self.bands[index];

        let uniforms = CurveUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            color: geometry.color,
            viewport: [
                self.surface_config.width as f32,
                self.surface_config.height as f32,
            ],
            point_size: effective_point_size(
                geometry.point_size,
                camera_distance,
                self.render_config.enable_3d,
            ),
            _padding: 0.0,
        };
        self.queue
            .write_buffer(&slot.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        self.queue.write_buffer(
            &slot.vertex_buffer,
            0,
            bytemuck::cast_slice(&geometry.points[..count * POINT_STRIDE]),
        );
        count as u32
    }

    /// Draw one frame.
    ///
    /// `window_size` is the window's current physical size; the surface is
    /// reconfigured only when it differs. A lost or outdated surface skips
    /// the frame instead of failing.
    pub fn render(
        &mut self,
        window_size: (u32, u32),
        curves: &[CurveGeometry],
        camera: &OrbitCamera,
    ) -> Result<(), RenderError> {
        self.resize_if_needed(window_size);

        let enable_3d = self.render_config.enable_3d;
        let aspect = self.render_config.aspect_ratio();
        let view_proj = camera.view_proj(aspect, enable_3d);
        let distance = camera.state().distance;

        let draws: Vec<(FrequencyBand, RenderMode, u32)> = curves
            .iter()
            .filter(|geometry| !geometry.is_empty())
            .map(|geometry| {
                let count = self.upload(geometry, view_proj, distance);
                (geometry.band, geometry.render_mode, count)
            })
            .collect();

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                log::debug!("Surface lost, reconfigured");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Fade previous frame (persistence trails)
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Fade Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.trail_view,
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
            pass.set_pipeline(&self.fade_pipeline);
            pass.set_bind_group(0, &self.fade_bind_group, &[]);
            pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        // Curves
        {
            let depth_attachment = enable_3d.then(|| wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Curve Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.trail_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: depth_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (band, mode, count) in draws {
                let key = PipelineKey {
                    blend: self.render_config.blend_mode,
                    mode,
                    depth: enable_3d,
                };
                let Some(pipeline) = self.curve_pipelines.get(&key) else {
                    continue;
                };
                let slot = &self.bands[band.index()];
                let bytes = (count as usize * POINT_STRIDE * std::mem::size_of::<f32>()) as u64;

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &slot.bind_group, &[]);
                pass.set_vertex_buffer(0, slot.vertex_buffer.slice(..bytes));
                match mode {
                    RenderMode::Points => pass.draw(0..QUAD_VERTICES, 0..count),
                    RenderMode::Lines => pass.draw(0..count, 0..1),
                }
            }
        }

        // Present
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &self.targets.blit_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn fade_uniforms(clear_alpha: f32) -> FadeUniforms {
    FadeUniforms {
        color: [0.0, 0.0, 0.0, clear_alpha],
    }
}

fn create_curve_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let (vs_entry, fs_entry, step_mode, topology) = match key.mode {
        RenderMode::Points => (
            "vs_point",
            "fs_point",
            wgpu::VertexStepMode::Instance,
            wgpu::PrimitiveTopology::TriangleList,
        ),
        RenderMode::Lines => (
            "vs_line",
            "fs_line",
            wgpu::VertexStepMode::Vertex,
            wgpu::PrimitiveTopology::LineStrip,
        ),
    };

    let depth_stencil = key.depth.then(|| wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    });

    let label = format!("Curve Pipeline {:?}", key);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs_entry),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: (POINT_STRIDE * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                step_mode,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                }],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: TRAIL_FORMAT,
                blend: Some(blend_state(key.blend)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
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
    })
}

fn create_band_slot(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    band: FrequencyBand,
    capacity_points: usize,
) -> BandSlot {
    let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("{} Vertex Buffer", band)),
        size: (capacity_points.max(1) * POINT_STRIDE * std::mem::size_of::<f32>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Uniform Buffer", band)),
        contents: bytemuck::cast_slice(&[CurveUniforms::zeroed()]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{} Bind Group", band)),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    BandSlot {
        vertex_buffer,
        capacity_points: capacity_points.max(1),
        uniform_buffer,
        bind_group,
    }
}

fn create_frame_targets(
    device: &wgpu::Device,
    blit_layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    (width, height): (u32, u32),
) -> FrameTargets {
    let size = wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    };

    let trail = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Trail Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TRAIL_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let trail_view = trail.create_view(&wgpu::TextureViewDescriptor::default());

    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    let blit_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Blit Bind Group"),
        layout: blit_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&trail_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    FrameTargets {
        trail_view,
        depth_view,
        blit_bind_group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_size_attenuates_in_3d() {
        // Default size at default camera distance
        assert!((effective_point_size(3.0, 3.5, true) - 10.0 / 3.5).abs() < 1e-6);
        // Close cameras cap at distance 1
        assert_eq!(effective_point_size(3.0, 0.5, true), 10.0);
        assert_eq!(effective_point_size(6.0, 20.0, true), 1.0);
    }

    #[test]
    fn test_point_size_fixed_in_2d() {
        assert_eq!(effective_point_size(3.0, 0.5, false), 3.0);
        assert_eq!(effective_point_size(3.0, 20.0, false), 3.0);
    }

    #[test]
    fn test_needs_resize() {
        assert!(!needs_resize((1280, 720), (1280, 720)));
        assert!(needs_resize((1920, 1080), (1280, 720)));
        // Minimized windows keep the old surface
        assert!(!needs_resize((0, 720), (1280, 720)));
        assert!(!needs_resize((1280, 0), (1280, 720)));
    }

    #[test]
    fn test_blend_modes() {
        let additive = blend_state(BlendMode::Additive);
        assert_eq!(additive.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(additive.color.dst_factor, wgpu::BlendFactor::One);

        let normal = blend_state(BlendMode::Normal);
        assert_eq!(normal.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn test_every_pipeline_variant_listed() {
        let keys: Vec<PipelineKey> = PipelineKey::all().collect();
        assert_eq!(keys.len(), 8);
        assert!(keys.contains(&PipelineKey {
            blend: BlendMode::Normal,
            mode: RenderMode::Lines,
            depth: true,
        }));
    }

    #[test]
    fn test_uniform_layout_matches_shader() {
        // mat4 + vec4 + vec2 + f32 + pad, 16-byte aligned
        assert_eq!(std::mem::size_of::<CurveUniforms>(), 96);
        assert_eq!(std::mem::size_of::<FadeUniforms>(), 16);
    }
}
