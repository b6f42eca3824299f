//! Camera state. The user owns the eye position (orbit and zoom); the rig only
//! steers the look-at target toward the layer currently in focus.

use glam::{Mat4, Vec3, Vec4};
use serde::Serialize;

use crate::layers::LayerStack;
use crate::scene::{layer_offset, EXPLODED_SPACING};
use crate::smoothing::{damp_factor, Smoothed};
use crate::view_state::ViewState;

/// Look-at smoothing rate (1/s).
pub const TARGET_RATE: f32 = 3.0;
pub const INITIAL_EYE: Vec3 = Vec3::new(6.0, 4.0, 6.0);
pub const FOV_DEGREES: f32 = 45.0;
pub const MIN_DISTANCE: f32 = 2.0;
pub const MAX_DISTANCE: f32 = 20.0;
const NEAR_CLIP: f32 = 0.1;
const FAR_CLIP: f32 = 100.0;
/// Orbit input eases in at this rate instead of snapping.
const ORBIT_DAMPING_RATE: f32 = 3.0;
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
/// Orbit steps below this many radians leave the eye where it is.
const ORBIT_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone)]
pub struct CameraRig {
    target: Smoothed<Vec3>,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            target: Smoothed::new(Vec3::ZERO, TARGET_RATE),
        }
    }
}

impl CameraRig {
    pub fn desired_target(state: &ViewState, stack: &LayerStack) -> Vec3 {
        if state.is_micro() || !state.is_exploded() {
            return Vec3::ZERO;
        }
        let y = state
            .selected()
            .and_then(|id| stack.index_of(id))
            .map(|index| layer_offset(index, stack.len(), EXPLODED_SPACING))
            .unwrap_or(0.0);
        Vec3::new(0.0, y, 0.0)
    }

    pub fn advance(&mut self, state: &ViewState, stack: &LayerStack, dt: f32) -> Vec3 {
        self.target.step(Self::desired_target(state, stack), dt)
    }

    pub fn target(&self) -> Vec3 {
        self.target.value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    pub fn transformed(&self, matrix: Mat4) -> Option<Self> {
        Self::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPose {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub distance: f32,
}

/// User-driven orbit; no panning. The eye only moves on orbit or zoom input.
/// When the rig moves the target, the camera turns to face it from where it
/// stands, so yaw, pitch and distance are always derived from `eye - target`.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    eye: Vec3,
    target: Vec3,
    pending_yaw: f32,
    pending_pitch: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            eye: INITIAL_EYE,
            target: Vec3::ZERO,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
        }
    }
}

/// Offset from target to eye for the given orbit angles.
fn spherical(yaw: f32, pitch: f32, distance: f32) -> Vec3 {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    let (sin_pitch, cos_pitch) = pitch.sin_cos();
    Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * distance
}

impl OrbitCamera {
    /// Queue an orbit drag in radians; it is applied gradually by `advance`.
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        if delta_yaw.is_finite() {
            self.pending_yaw += delta_yaw;
        }
        if delta_pitch.is_finite() {
            self.pending_pitch += delta_pitch;
        }
    }

    /// Multiply the orbit distance; values above 1 move away.
    pub fn zoom(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let Some(direction) = (self.eye - self.target).try_normalize() else {
            return;
        };
        let distance = (self.distance() * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.eye = self.target + direction * distance;
    }

    /// Face the rig's `target` from the current eye, then ease in any queued
    /// orbit input around it.
    pub fn advance(&mut self, target: Vec3, dt: f32) {
        if target.is_finite() && (self.eye - target).length() > f32::EPSILON {
            self.target = target;
        }
        let amount = damp_factor(ORBIT_DAMPING_RATE, dt);
        let yaw_step = self.pending_yaw * amount;
        let pitch_step = self.pending_pitch * amount;
        self.pending_yaw -= yaw_step;
        self.pending_pitch -= pitch_step;
        if yaw_step.abs() < ORBIT_EPSILON && pitch_step.abs() < ORBIT_EPSILON {
            return;
        }
        let yaw = (self.yaw() + yaw_step).rem_euclid(std::f32::consts::TAU);
        let pitch = (self.pitch() + pitch_step).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.eye = self.target + spherical(yaw, pitch, self.distance());
    }

    pub fn distance(&self) -> f32 {
        (self.eye - self.target).length()
    }

    /// Horizontal angle of the eye around the target, measured from +Z.
    pub fn yaw(&self) -> f32 {
        let offset = self.eye - self.target;
        offset.x.atan2(offset.z)
    }

    pub fn pitch(&self) -> f32 {
        let distance = self.distance();
        if distance <= f32::EPSILON {
            return 0.0;
        }
        ((self.eye.y - self.target.y) / distance)
            .clamp(-1.0, 1.0)
            .asin()
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            eye: self.eye().to_array(),
            target: self.target.to_array(),
            distance: self.distance(),
        }
    }

    pub fn view_projection(&self, aspect_ratio: f32) -> Mat4 {
        let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio
        } else {
            1.0
        };
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        let projection =
            Mat4::perspective_rh(FOV_DEGREES.to_radians(), aspect, NEAR_CLIP, FAR_CLIP);
        projection * view
    }

    /// World-space ray through a point in normalized device coordinates.
    pub fn ray_through(&self, ndc: [f32; 2], aspect_ratio: f32) -> Option<Ray> {
        let inverse = self.view_projection(aspect_ratio).inverse();
        let unproject = |depth: f32| {
            let point = inverse * Vec4::new(ndc[0], ndc[1], depth, 1.0);
            (point.w.abs() > f32::EPSILON).then(|| point.truncate() / point.w)
        };
        let near = unproject(0.0)?;
        let far = unproject(1.0)?;
        Ray::new(near, far - near)
    }

    /// Normalized device coordinates of a world point, if it is in front of
    /// the camera.
    pub fn project(&self, position: Vec3, aspect_ratio: f32) -> Option<[f32; 2]> {
        let clip = self.view_projection(aspect_ratio) * position.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !ndc.x.is_finite() || !ndc.y.is_finite() {
            return None;
        }
        Some([ndc.x, ndc.y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_state::ViewMode;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn exploded(id: Option<&str>) -> ViewState {
        ViewState {
            mode: ViewMode::Exploded,
            selected_layer_id: id.map(str::to_string),
        }
    }

    #[test]
    fn desired_target_follows_selected_layer() {
        let stack = LayerStack::builtin();
        let target = CameraRig::desired_target(&exploded(Some("copper")), &stack);
        assert!(approx(target.y, 3.0));
        let target = CameraRig::desired_target(&exploded(Some("aluminum")), &stack);
        assert!(approx(target.y, -3.0));
        assert_eq!(CameraRig::desired_target(&exploded(None), &stack), Vec3::ZERO);
        assert_eq!(CameraRig::desired_target(&exploded(Some("ghost")), &stack), Vec3::ZERO);
        let micro = ViewState {
            mode: ViewMode::Micro,
            selected_layer_id: Some("anode".to_string()),
        };
        assert_eq!(CameraRig::desired_target(&micro, &stack), Vec3::ZERO);
    }

    #[test]
    fn rig_converges_smoothly() {
        let stack = LayerStack::builtin();
        let state = exploded(Some("copper"));
        let mut rig = CameraRig::default();
        let first = rig.advance(&state, &stack, 1.0 / 60.0);
        assert!(first.y > 0.0 && first.y < 0.2, "no snapping: {}", first.y);
        for _ in 0..600 {
            rig.advance(&state, &stack, 1.0 / 60.0);
        }
        assert!(approx(rig.target().y, 3.0));
    }

    #[test]
    fn starts_at_reference_eye() {
        let camera = OrbitCamera::default();
        let eye = camera.eye();
        assert!(approx(eye.x, 6.0) && approx(eye.y, 4.0) && approx(eye.z, 6.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = OrbitCamera::default();
        camera.zoom(100.0);
        assert!(approx(camera.distance(), MAX_DISTANCE));
        camera.zoom(0.0001);
        assert!(approx(camera.distance(), MIN_DISTANCE));
        camera.zoom(f32::NAN);
        assert!(approx(camera.distance(), MIN_DISTANCE));
    }

    #[test]
    fn orbit_eases_in_and_keeps_distance() {
        let mut camera = OrbitCamera::default();
        let before = camera.eye();
        camera.orbit(0.5, 0.0);
        camera.advance(Vec3::ZERO, 1.0 / 60.0);
        let partial = camera.eye();
        assert_ne!(before, partial);
        for _ in 0..600 {
            camera.advance(Vec3::ZERO, 1.0 / 60.0);
        }
        assert!((camera.eye().length() - INITIAL_EYE.length()).abs() < 1e-3);
        assert!((camera.eye().y - 4.0).abs() < 1e-3);
    }

    #[test]
    fn rig_steering_turns_the_camera_in_place() {
        let stack = LayerStack::builtin();
        let state = exploded(Some("aluminum"));
        let mut rig = CameraRig::default();
        let mut camera = OrbitCamera::default();
        for _ in 0..600 {
            let target = rig.advance(&state, &stack, 1.0 / 60.0);
            camera.advance(target, 1.0 / 60.0);
        }
        assert_eq!(camera.eye(), INITIAL_EYE);
        assert!(approx(camera.target().y, -3.0));
        assert!(approx(camera.distance(), (INITIAL_EYE - camera.target()).length()));

        let ray = camera.ray_through([0.0, 0.0], 1.5).expect("ray");
        let to_target = (camera.target() - ray.origin).normalize();
        assert!(ray.direction.dot(to_target) > 0.9999);
    }

    #[test]
    fn orbit_after_retarget_circles_the_new_target() {
        let mut camera = OrbitCamera::default();
        let target = Vec3::new(0.0, 1.5, 0.0);
        camera.advance(target, 1.0 / 60.0);
        let distance = camera.distance();
        camera.orbit(1.0, 0.2);
        for _ in 0..600 {
            camera.advance(target, 1.0 / 60.0);
        }
        assert_ne!(camera.eye(), INITIAL_EYE);
        assert!(approx(camera.distance(), distance));
    }

    #[test]
    fn zoom_moves_along_the_view_line() {
        let mut camera = OrbitCamera::default();
        camera.zoom(0.5);
        let expected = INITIAL_EYE.normalize() * INITIAL_EYE.length() * 0.5;
        assert!((camera.eye() - expected).length() < 1e-4);
    }

    #[test]
    fn centre_ray_hits_target() {
        let camera = OrbitCamera::default();
        let ray = camera.ray_through([0.0, 0.0], 1.5).expect("ray");
        let to_target = (camera.target() - ray.origin).normalize();
        assert!(ray.direction.dot(to_target) > 0.9999);
    }

    #[test]
    fn projection_round_trips_through_ray() {
        let camera = OrbitCamera::default();
        let point = Vec3::new(1.0, 0.5, -0.5);
        let ndc = camera.project(point, 1.0).expect("visible");
        let ray = camera.ray_through(ndc, 1.0).expect("ray");
        let along = (point - ray.origin).dot(ray.direction);
        assert!((ray.at(along) - point).length() < 1e-3);
    }
}
