use std::{borrow::Cow, sync::Arc, time::Instant};

use anyhow::{Context, Result};
use bytemuck::cast_slice;
use cell_model::Session;
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use super::super::batch::linear;
use super::super::mesh::{
    MeshInstance, MeshPrimitive, MeshUniforms, MeshVertex, PrimitiveKind, mesh_uniforms, primitive,
};
use super::super::overlay::OverlayTexture;
use super::super::shaders::{
    MESH_SHADER_SOURCE, OVERLAY_SHADER_SOURCE, QUAD_INDICES, QUAD_VERTICES, QuadVertex,
};
use super::{MeshResources, OverlayResources, PointerState, PrimitiveBuffers, ViewerState};
use crate::canvas::Canvas;
use crate::cli::LayoutPreset;
use crate::layout::ViewerLayout;
use crate::panels::scene_background;
use crate::text::Typeface;

const MESH_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_INSTANCE_CAPACITY: usize = 256;

/// Bundles the wgpu objects tied to the explorer window.
struct WgpuBootstrap {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    present_mode: wgpu::PresentMode,
    alpha_mode: wgpu::CompositeAlphaMode,
}

/// Bootstraps wgpu, builds the mesh and overlay pipelines, and sizes the
/// panel canvas to the window.
pub(super) async fn new(
    window: Arc<Window>,
    mut session: Session,
    preset: LayoutPreset,
    font: Option<Typeface>,
) -> Result<ViewerState> {
    let size = window.inner_size();
    let wgpu = bootstrap_wgpu(window.clone()).await?;

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu.surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu.present_mode,
        alpha_mode: wgpu.alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    wgpu.surface.configure(&wgpu.device, &config);
    log::info!(
        "surface configured: {}x{} {:?} {:?}",
        config.width,
        config.height,
        config.format,
        config.present_mode
    );

    let layout = ViewerLayout::compute(size, &preset);
    session.set_aspect(layout.scene_aspect());

    let overlay = create_overlay_resources(&wgpu.device, wgpu.surface_format, size);
    let mesh = create_mesh_resources(&wgpu.device, size, wgpu.surface_format);

    let [r, g, b] = linear(scene_background());
    let background = wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    };

    Ok(ViewerState {
        window,
        surface: wgpu.surface,
        device: wgpu.device,
        queue: wgpu.queue,
        config,
        size,
        background,
        session,
        preset,
        layout,
        font,
        canvas: Canvas::new(size.width, size.height),
        overlay,
        mesh,
        pointer: PointerState::default(),
        last_frame: Instant::now(),
    })
}

async fn bootstrap_wgpu(window: Arc<Window>) -> Result<WgpuBootstrap> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window)
        .context("creating wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("requesting wgpu adapter")?;
    log::info!("using adapter {:?}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cell-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("requesting wgpu device")?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .or_else(|| surface_caps.formats.first().copied())
        .context("surface reports no texture formats")?;
    let present_mode = surface_caps
        .present_modes
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Mailbox)
        .unwrap_or(wgpu::PresentMode::Fifo);
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Opaque);

    Ok(WgpuBootstrap {
        surface,
        device,
        queue,
        surface_format,
        present_mode,
        alpha_mode,
    })
}

fn create_overlay_resources(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
) -> OverlayResources {
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("panel-overlay-bind-group-layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
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

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("panel-overlay-sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("panel-overlay-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(OVERLAY_SHADER_SOURCE)),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("panel-overlay-pipeline-layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });
    let quad_vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("panel-overlay-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[quad_vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("panel-overlay-vertex-buffer"),
        contents: cast_slice(&QUAD_VERTICES),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("panel-overlay-index-buffer"),
        contents: cast_slice(&QUAD_INDICES),
        usage: wgpu::BufferUsages::INDEX,
    });

    let texture = OverlayTexture::new(device, &bind_group_layout, &sampler, size);

    OverlayResources {
        pipeline,
        bind_group_layout,
        sampler,
        quad_vertex_buffer,
        quad_index_buffer,
        quad_index_count: QUAD_INDICES.len() as u32,
        texture,
    }
}

fn create_mesh_resources(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
    surface_format: wgpu::TextureFormat,
) -> MeshResources {
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("mesh-uniform-layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<MeshUniforms>() as u64),
            },
            count: None,
        }],
    });

    let initial_uniform = mesh_uniforms(Mat4::IDENTITY, Vec3::ZERO);
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("mesh-uniform-buffer"),
        contents: cast_slice(&[initial_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("mesh-uniform-bind-group"),
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("mesh-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(MESH_SHADER_SOURCE)),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("mesh-pipeline-layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let opaque_pipeline = create_mesh_pipeline(
        device,
        &pipeline_layout,
        &mesh_shader,
        surface_format,
        MeshPass::Opaque,
    );
    let translucent_pipeline = create_mesh_pipeline(
        device,
        &pipeline_layout,
        &mesh_shader,
        surface_format,
        MeshPass::Translucent,
    );

    let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("mesh-instance-buffer"),
        size: (INITIAL_INSTANCE_CAPACITY * std::mem::size_of::<MeshInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let (depth_texture, depth_view) = create_mesh_depth_texture(device, size);

    MeshResources {
        opaque_pipeline,
        translucent_pipeline,
        bind_group,
        uniform_buffer,
        _depth_texture: depth_texture,
        depth_view,
        instance_buffer,
        instance_capacity: INITIAL_INSTANCE_CAPACITY,
        cube: upload_primitive(device, "mesh-cube", primitive(PrimitiveKind::Cube)),
        sphere: upload_primitive(device, "mesh-sphere", primitive(PrimitiveKind::Sphere)),
        dodecahedron: upload_primitive(
            device,
            "mesh-dodecahedron",
            primitive(PrimitiveKind::Dodecahedron),
        ),
    }
}

#[derive(Clone, Copy)]
enum MeshPass {
    Opaque,
    /// Back faces stay visible and depth is tested but not written, so
    /// translucent shells show what is inside them.
    Translucent,
}

fn create_mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    pass: MeshPass,
) -> wgpu::RenderPipeline {
    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
    let instance_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &wgpu::vertex_attr_array![
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
        ],
    };

    let (label, cull_mode, depth_write_enabled) = match pass {
        MeshPass::Opaque => ("mesh-opaque-pipeline", Some(wgpu::Face::Back), true),
        MeshPass::Translucent => ("mesh-translucent-pipeline", None, false),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "mesh_vs_main",
            buffers: &[vertex_layout, instance_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "mesh_fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode,
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: MESH_DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn upload_primitive(
    device: &wgpu::Device,
    label: &str,
    primitive: MeshPrimitive,
) -> PrimitiveBuffers {
    let vertex_label = format!("{label}-vertex-buffer");
    let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&vertex_label),
        contents: cast_slice(&primitive.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_label = format!("{label}-index-buffer");
    let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&index_label),
        contents: cast_slice(&primitive.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    PrimitiveBuffers {
        vertex,
        index,
        index_count: primitive.indices.len() as u32,
    }
}

pub(super) fn create_mesh_depth_texture(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
) -> (wgpu::Texture, wgpu::TextureView) {
    let extent = wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("mesh-depth-texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: MESH_DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
