use std::f32::consts::TAU;

use cell_model::Action;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::window::CursorIcon;

use super::{Press, ViewerState};
use crate::controls::{Control, VisibleControls};

/// Pointer travel, in pixels, before a scene press turns into an orbit drag.
const CLICK_SLOP: f32 = 4.0;
/// Zoom factor per wheel notch.
const WHEEL_ZOOM_STEP: f32 = 0.95;
/// Pixel-delta scroll distance treated as one wheel notch.
const PIXELS_PER_NOTCH: f32 = 50.0;

pub(super) fn handle_window_event(state: &mut ViewerState, event: &WindowEvent) {
    match event {
        WindowEvent::CursorMoved { position, .. } => {
            cursor_moved(state, position.x as f32, position.y as f32);
        }
        WindowEvent::CursorLeft { .. } => {
            state.pointer.position = None;
            state.pointer.hovered_control = None;
            state.pointer.press = None;
            apply(state, &Action::PointerLeave);
            refresh_cursor(state);
        }
        WindowEvent::MouseInput {
            state: button_state,
            button: MouseButton::Left,
            ..
        } => match button_state {
            ElementState::Pressed => left_pressed(state),
            ElementState::Released => left_released(state),
        },
        WindowEvent::MouseWheel { delta, .. } => {
            let notches = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_NOTCH,
            };
            let over_scene = state
                .pointer
                .position
                .is_some_and(|(x, y)| state.layout.scene.contains(x, y));
            if over_scene && notches != 0.0 {
                apply(
                    state,
                    &Action::Zoom {
                        factor: WHEEL_ZOOM_STEP.powf(notches),
                    },
                );
            }
        }
        _ => {}
    }
}

fn apply(state: &mut ViewerState, action: &Action) {
    if state.session.apply(action) {
        log::debug!("view state now {:?}", state.session.state());
    }
}

fn cursor_moved(state: &mut ViewerState, x: f32, y: f32) {
    state.pointer.position = Some((x, y));
    match state.pointer.press {
        Some(Press::Slider) => {
            let value = state.layout.slider_value(x);
            apply(state, &Action::SetInfusion { value });
            return;
        }
        Some(Press::Scene {
            origin,
            last,
            dragging,
        }) => {
            let travelled = (x - origin.0).hypot(y - origin.1);
            if dragging || travelled > CLICK_SLOP {
                let height = state.size.height.max(1) as f32;
                let yaw = -(x - last.0) / height * TAU;
                let pitch = (y - last.1) / height * TAU;
                apply(state, &Action::Orbit { yaw, pitch });
                state.pointer.press = Some(Press::Scene {
                    origin,
                    last: (x, y),
                    dragging: true,
                });
                return;
            }
        }
        None => {}
    }

    let controls = VisibleControls::from_session(&state.session);
    state.pointer.hovered_control = controls.hit_test(&state.layout, x, y);
    let hover = match (state.pointer.hovered_control, state.layout.scene_ndc(x, y)) {
        (None, Some([nx, ny])) => Action::Hover { x: nx, y: ny },
        _ => Action::PointerLeave,
    };
    apply(state, &hover);
    refresh_cursor(state);
}

fn left_pressed(state: &mut ViewerState) {
    let Some((x, y)) = state.pointer.position else {
        return;
    };
    let controls = VisibleControls::from_session(&state.session);
    match controls.hit_test(&state.layout, x, y) {
        Some(Control::InfusionSlider) => {
            state.pointer.press = Some(Press::Slider);
            let action = Control::InfusionSlider.action(&state.layout, x);
            apply(state, &action);
        }
        Some(control) => {
            let action = control.action(&state.layout, x);
            log::debug!("control {control:?} pressed");
            apply(state, &action);
        }
        None if state.layout.scene.contains(x, y) => {
            state.pointer.press = Some(Press::Scene {
                origin: (x, y),
                last: (x, y),
                dragging: false,
            });
        }
        None => {}
    }
}

fn left_released(state: &mut ViewerState) {
    let Some(press) = state.pointer.press.take() else {
        return;
    };
    let Press::Scene {
        origin,
        dragging: false,
        ..
    } = press
    else {
        return;
    };
    if let Some([nx, ny]) = state.layout.scene_ndc(origin.0, origin.1) {
        apply(state, &Action::Click { x: nx, y: ny });
    }
}

/// Hand cursor over anything clickable.
fn refresh_cursor(state: &ViewerState) {
    let clickable =
        state.pointer.hovered_control.is_some() || state.session.composer().hovered().is_some();
    let icon = if clickable {
        CursorIcon::Pointer
    } else {
        CursorIcon::Default
    };
    state.window.set_cursor_icon(icon);
}
