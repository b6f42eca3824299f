use winit::dpi::PhysicalSize;

use super::super::overlay::OverlayTexture;
use super::ViewerState;
use super::init::create_mesh_depth_texture;
use crate::canvas::Canvas;
use crate::layout::ViewerLayout;

pub(super) fn resize(state: &mut ViewerState, new_size: PhysicalSize<u32>) {
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    state.size = new_size;
    state.config.width = new_size.width;
    state.config.height = new_size.height;
    state.surface.configure(&state.device, &state.config);

    let (depth_texture, depth_view) = create_mesh_depth_texture(&state.device, new_size);
    state.mesh._depth_texture = depth_texture;
    state.mesh.depth_view = depth_view;

    state.layout = ViewerLayout::compute(new_size, &state.preset);
    state.session.set_aspect(state.layout.scene_aspect());

    if state.overlay.texture.size() != new_size {
        state.overlay.texture = OverlayTexture::new(
            &state.device,
            &state.overlay.bind_group_layout,
            &state.overlay.sampler,
            new_size,
        );
        state.canvas = Canvas::new(new_size.width, new_size.height);
    }
    log::debug!("resized to {}x{}", new_size.width, new_size.height);
}

/// Viewport rectangle of the 3D scene, in the `set_viewport` argument order.
pub(super) fn scene_viewport(state: &ViewerState) -> (f32, f32, f32, f32) {
    let scene = state.layout.scene;
    let max_w = state.size.width as f32;
    let max_h = state.size.height as f32;
    let x = scene.x.clamp(0.0, max_w);
    let y = scene.y.clamp(0.0, max_h);
    (
        x,
        y,
        scene.width.min(max_w - x).max(1.0),
        scene.height.min(max_h - y).max(1.0),
    )
}
