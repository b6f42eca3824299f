use bytemuck::cast_slice;
use wgpu::SurfaceError;

use super::super::batch::SceneBatch;
use super::super::mesh::{MeshInstance, PrimitiveKind, mesh_uniforms};
use super::ViewerState;
use super::layout;
use crate::controls::VisibleControls;
use crate::panels::{self, Painter, UiView};

pub(super) fn render(state: &mut ViewerState) -> Result<(), SurfaceError> {
    let frame = state.surface.get_current_texture()?;
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("cell-viewer-encoder"),
        });

    draw_background(state, &view, &mut encoder);
    draw_scene_meshes(state, &view, &mut encoder);
    draw_panels(state, &view, &mut encoder);

    state.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}

fn draw_background(
    state: &ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("background-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(state.background),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
}

/// One draw call's slice of the shared instance buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
struct DrawRange {
    kind: PrimitiveKind,
    offset: u32,
    count: u32,
}

/// Flatten a batch into one instance list: opaque groups first, then
/// translucent runs in back-to-front order.
fn flatten(batch: &SceneBatch) -> (Vec<MeshInstance>, Vec<DrawRange>, Vec<DrawRange>) {
    let mut combined = Vec::with_capacity(batch.len());
    let mut opaque = Vec::new();
    for kind in PrimitiveKind::ALL {
        let instances = batch.opaque.get(kind);
        if instances.is_empty() {
            continue;
        }
        opaque.push(DrawRange {
            kind,
            offset: combined.len() as u32,
            count: instances.len() as u32,
        });
        combined.extend_from_slice(instances);
    }

    let mut translucent: Vec<DrawRange> = Vec::new();
    for (kind, instance) in &batch.translucent {
        match translucent.last_mut() {
            Some(run) if run.kind == *kind => run.count += 1,
            _ => translucent.push(DrawRange {
                kind: *kind,
                offset: combined.len() as u32,
                count: 1,
            }),
        }
        combined.push(*instance);
    }
    (combined, opaque, translucent)
}

fn draw_scene_meshes(
    state: &mut ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    let aspect = state.layout.scene_aspect();
    let orbit = state.session.orbit();
    let eye = orbit.eye();
    let view_projection = orbit.view_projection(aspect);
    let scene = state.session.scene();
    let batch = SceneBatch::build(&scene, state.session.composer().cathode_particles(), eye);
    if batch.is_empty() {
        return;
    }
    let (combined, opaque, translucent) = flatten(&batch);

    ensure_mesh_instance_capacity(state, combined.len());
    let mesh = &state.mesh;
    state
        .queue
        .write_buffer(&mesh.instance_buffer, 0, cast_slice(&combined));
    state.queue.write_buffer(
        &mesh.uniform_buffer,
        0,
        cast_slice(&[mesh_uniforms(view_projection, eye)]),
    );

    let mut mesh_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("mesh-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &mesh.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    let (vx, vy, vw, vh) = layout::scene_viewport(state);
    mesh_pass.set_viewport(vx, vy, vw, vh, 0.0, 1.0);
    mesh_pass.set_bind_group(0, &mesh.bind_group, &[]);
    let instance_bytes = (combined.len() * std::mem::size_of::<MeshInstance>()) as u64;
    mesh_pass.set_vertex_buffer(1, mesh.instance_buffer.slice(0..instance_bytes));

    for (pipeline, ranges) in [
        (&mesh.opaque_pipeline, &opaque),
        (&mesh.translucent_pipeline, &translucent),
    ] {
        if ranges.is_empty() {
            continue;
        }
        mesh_pass.set_pipeline(pipeline);
        for range in ranges {
            let buffers = mesh.buffers(range.kind);
            mesh_pass.set_vertex_buffer(0, buffers.vertex.slice(..));
            mesh_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint16);
            mesh_pass.draw_indexed(
                0..buffers.index_count,
                0,
                range.offset..(range.offset + range.count),
            );
        }
    }
}

/// Grow the shared instance buffer if the current frame needs more slots.
fn ensure_mesh_instance_capacity(state: &mut ViewerState, required: usize) {
    let mesh = &mut state.mesh;
    if required <= mesh.instance_capacity {
        return;
    }
    let mut capacity = mesh.instance_capacity.max(1);
    while capacity < required {
        capacity *= 2;
    }
    let label = format!("mesh-instance-buffer({capacity})");
    mesh.instance_buffer = state.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label.as_str()),
        size: (capacity * std::mem::size_of::<MeshInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    mesh.instance_capacity = capacity;
    log::debug!("mesh instance buffer grown to {capacity}");
}

/// Redraw the panel canvas, upload it, and composite it over the frame.
fn draw_panels(
    state: &mut ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    let scene = state.session.scene();
    let info = state.session.info();
    let controls = VisibleControls::from_session(&state.session);
    let ui = UiView::new(
        &state.session,
        &scene,
        &info,
        &controls,
        &state.layout,
        state.pointer.hovered_control,
    );
    {
        let mut painter = Painter::new(&mut state.canvas, state.font, state.layout.font_size);
        panels::draw_frame(&mut painter, &state.layout, &ui);
    }
    state.overlay.texture.upload(&state.queue, &state.canvas);

    let overlay = &state.overlay;
    let mut overlay_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("panel-overlay-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
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
    overlay_pass.set_pipeline(&overlay.pipeline);
    overlay_pass.set_bind_group(0, overlay.texture.bind_group(), &[]);
    overlay_pass.set_vertex_buffer(0, overlay.quad_vertex_buffer.slice(..));
    overlay_pass.set_index_buffer(overlay.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
    overlay_pass.draw_indexed(0..overlay.quad_index_count, 0, 0..1);
}
