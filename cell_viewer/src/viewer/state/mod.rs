//! Runtime state of the explorer window. Owns the wgpu device and surface,
//! the session being explored, and the panel canvas. Submodules cover the
//! lifecycle: `init` for setup, `layout` for resize handling, `input` for
//! pointer routing, and `render` for the draw passes.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use cell_model::Session;
use wgpu::SurfaceError;
use winit::{dpi::PhysicalSize, event::WindowEvent, window::Window};

use super::mesh::PrimitiveKind;
use super::overlay::OverlayTexture;
use crate::canvas::Canvas;
use crate::cli::LayoutPreset;
use crate::controls::Control;
use crate::layout::ViewerLayout;
use crate::text::Typeface;

mod init;
mod input;
mod layout;
mod render;

pub struct ViewerState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    background: wgpu::Color,
    session: Session,
    preset: LayoutPreset,
    layout: ViewerLayout,
    font: Option<Typeface>,
    canvas: Canvas,
    overlay: OverlayResources,
    mesh: MeshResources,
    pointer: PointerState,
    last_frame: Instant,
}

/// Full-window quad that composites the panel canvas over the scene.
struct OverlayResources {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    quad_index_count: u32,
    texture: OverlayTexture,
}

struct PrimitiveBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

struct MeshResources {
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    cube: PrimitiveBuffers,
    sphere: PrimitiveBuffers,
    dodecahedron: PrimitiveBuffers,
}

impl MeshResources {
    fn buffers(&self, kind: PrimitiveKind) -> &PrimitiveBuffers {
        match kind {
            PrimitiveKind::Cube => &self.cube,
            PrimitiveKind::Sphere => &self.sphere,
            PrimitiveKind::Dodecahedron => &self.dodecahedron,
        }
    }
}

/// Pointer bookkeeping between winit events.
#[derive(Debug, Default)]
struct PointerState {
    position: Option<(f32, f32)>,
    hovered_control: Option<Control>,
    press: Option<Press>,
}

#[derive(Debug, Clone, Copy)]
enum Press {
    /// Pressed inside the scene; becomes an orbit drag once it travels far
    /// enough, otherwise a click on release.
    Scene {
        origin: (f32, f32),
        last: (f32, f32),
        dragging: bool,
    },
    Slider,
}

impl ViewerState {
    pub async fn new(
        window: Arc<Window>,
        session: Session,
        preset: LayoutPreset,
        font: Option<Typeface>,
    ) -> Result<Self> {
        init::new(window, session, preset, font).await
    }

    pub fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        layout::resize(self, new_size);
    }

    /// Route a pointer event to controls or the scene.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        input::handle_window_event(self, event);
    }

    /// Advance the session by the wall-clock time since the last frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.session.set_aspect(self.layout.scene_aspect());
        self.session.advance(dt);
    }

    pub fn render(&mut self) -> Result<(), SurfaceError> {
        render::render(self)
    }
}
