//! Per-frame scene choreography for the macro stack: where each layer sits,
//! how strongly it is emphasized, which labels are shown, and what a pointer
//! ray hits. Targets are derived from the view state every frame; the visible
//! values chase them through exponential smoothing so nothing pops.

use std::f32::consts::FRAC_PI_4;
use std::sync::Arc;

use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::Rng;
use serde::Serialize;

use crate::camera::Ray;
use crate::color::Rgb;
use crate::layers::LayerStack;
use crate::micro::{cathode, MicroFrame, MicroKind, MicroScene};
use crate::smoothing::Smoothed;
use crate::view_state::ViewState;

pub const EXPLODED_SPACING: f32 = 1.5;
pub const STACKED_SPACING: f32 = 0.5;
/// Slab footprint along x and z.
pub const SLAB_WIDTH: f32 = 4.0;
/// The whole stack is turned about the vertical axis.
pub const STACK_YAW: f32 = FRAC_PI_4;

pub const SELECTED_SCALE: f32 = 1.02;
pub const SELECTED_LIGHTNESS: f32 = 0.05;
pub const HOVER_LIGHTNESS: f32 = 0.1;
/// Scale and color emphasis rate (1/s).
pub const EMPHASIS_RATE: f32 = 6.0;
/// Vertical offset rate (1/s).
pub const OFFSET_RATE: f32 = 5.0;

const FLOAT_SPEED: f32 = 2.0;
const FLOAT_ROTATION_INTENSITY: f32 = 0.5;
const FLOAT_LIFT_INTENSITY: f32 = 0.5;
const FLOAT_FADE_RATE: f32 = 3.0;

/// Distance from the stack axis to a layer label, along the slab's local x.
pub const LABEL_OFFSET: f32 = 2.2;
/// Label marker dots sit this far inside the label anchor.
pub const LABEL_MARKER_INSET: f32 = 0.1;
pub const LABEL_COLOR: Rgb = Rgb::from_u8(0x33, 0x41, 0x55);
pub const GLASS_LABEL_COLOR: Rgb = Rgb::from_u8(0x3B, 0x82, 0xF6);
pub const PARTICLES_LABEL_COLOR: Rgb = Rgb::from_u8(0x1E, 0x29, 0x3B);

const GLASS_OPACITY: f32 = 0.4;
const CATHODE_PARTICLES: usize = 400;
const PARTICLE_SPREAD: f32 = 3.8;
pub const PARTICLE_COLOR: Rgb = Rgb::from_u8(0x0F, 0x17, 0x2A);

pub const CAPTION_EXPLODED: &str = "Interactive Exploded Assembly";
pub const CAPTION_STACKED: &str = "Solid State Cell Stack";

/// Vertical offset of layer `index` in a stack of `count`, measured from the
/// stack's midpoint; index 0 is the top.
pub fn layer_offset(index: usize, count: usize, spacing: f32) -> f32 {
    let center = count.saturating_sub(1) as f32 * 0.5;
    (center - index as f32) * spacing
}

pub fn spacing_unit(exploded: bool) -> f32 {
    if exploded {
        EXPLODED_SPACING
    } else {
        STACKED_SPACING
    }
}

/// Surface treatment of a slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Finish {
    Metal,
    Glass,
    Matte,
}

impl Finish {
    pub fn for_layer(id: &str) -> Self {
        match id {
            "separator" => Finish::Glass,
            "copper" | "aluminum" | "anode" => Finish::Metal,
            _ => Finish::Matte,
        }
    }

    pub fn opacity(self) -> f32 {
        match self {
            Finish::Glass => GLASS_OPACITY,
            Finish::Metal | Finish::Matte => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelAlign {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneLabel {
    pub text: String,
    pub position: [f32; 3],
    pub color: Rgb,
    pub opacity: f32,
    pub align: LabelAlign,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlabPose {
    pub id: String,
    pub index: usize,
    pub offset: f32,
    pub thickness: f32,
    pub scale: f32,
    pub color: Rgb,
    pub opacity: f32,
    pub finish: Finish,
    pub selected: bool,
    pub hovered: bool,
    pub has_particles: bool,
}

impl SlabPose {
    /// Slab centre frame, including emphasis scale but not slab extents.
    pub fn anchor(&self, stack: Mat4) -> Mat4 {
        stack
            * Mat4::from_translation(Vec3::new(0.0, self.offset, 0.0))
            * Mat4::from_scale(Vec3::splat(self.scale))
    }

    pub fn model(&self, stack: Mat4) -> Mat4 {
        self.anchor(stack)
            * Mat4::from_scale(Vec3::new(SLAB_WIDTH, self.thickness, SLAB_WIDTH))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroFrame {
    pub lift: f32,
    pub float_rotation: [f32; 3],
    pub slabs: Vec<SlabPose>,
    #[serde(skip_serializing)]
    pub transform: Mat4,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scene", rename_all = "snake_case")]
pub enum SceneContent {
    Macro(MacroFrame),
    Micro(MicroFrame),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneFrame {
    pub caption: &'static str,
    pub exploded: bool,
    pub content: SceneContent,
    pub labels: Vec<SceneLabel>,
}

/// Gentle bob and sway while nothing is selected.
#[derive(Debug, Clone)]
struct IdleFloat {
    time: f32,
    intensity: Smoothed<f32>,
}

impl IdleFloat {
    fn new() -> Self {
        Self {
            time: 0.0,
            intensity: Smoothed::new(1.0, FLOAT_FADE_RATE),
        }
    }

    fn advance(&mut self, active: bool, dt: f32) {
        self.time += dt;
        self.intensity.step(if active { 1.0 } else { 0.0 }, dt);
    }

    fn lift(&self) -> f32 {
        let phase = self.time / 4.0 * FLOAT_SPEED;
        phase.sin() / 10.0 * FLOAT_LIFT_INTENSITY * self.intensity.value()
    }

    fn rotation(&self) -> Vec3 {
        let phase = self.time / 4.0 * FLOAT_SPEED;
        let strength = FLOAT_ROTATION_INTENSITY * self.intensity.value();
        Vec3::new(
            phase.cos() / 8.0 * strength,
            phase.sin() / 8.0 * strength,
            phase.sin() / 20.0 * strength,
        )
    }
}

#[derive(Debug, Clone)]
struct LayerVisual {
    offset: Smoothed<f32>,
    scale: Smoothed<f32>,
    color: Smoothed<Rgb>,
}

#[derive(Debug, Clone)]
pub struct SceneComposer {
    stack: Arc<LayerStack>,
    visuals: Vec<LayerVisual>,
    hovered: Option<usize>,
    float: IdleFloat,
    particles: Vec<Particle>,
}

impl SceneComposer {
    pub fn new<R: Rng + ?Sized>(stack: Arc<LayerStack>, rng: &mut R) -> Self {
        let count = stack.len();
        let visuals = stack
            .layers()
            .iter()
            .enumerate()
            .map(|(index, layer)| LayerVisual {
                offset: Smoothed::new(layer_offset(index, count, STACKED_SPACING), OFFSET_RATE),
                scale: Smoothed::new(1.0, EMPHASIS_RATE),
                color: Smoothed::new(layer.color, EMPHASIS_RATE),
            })
            .collect();
        let particles = match stack.get(cathode_layer_id()) {
            Some(layer) => generate_particles(layer.thickness_ratio, rng),
            None => Vec::new(),
        };
        Self {
            stack,
            visuals,
            hovered: None,
            float: IdleFloat::new(),
            particles,
        }
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Filler particles drawn inside the cathode slab, in slab-local units.
    pub fn cathode_particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered
            .and_then(|index| self.stack.layers().get(index))
            .map(|layer| layer.id.as_str())
    }

    /// Update hover from a pointer ray; returns whether the hovered layer
    /// changed. Nothing is hoverable in micro view.
    pub fn hover(&mut self, state: &ViewState, ray: Option<Ray>) -> bool {
        let next = match ray {
            Some(ray) if !state.is_micro() => self.pick(ray),
            _ => None,
        };
        let changed = next != self.hovered;
        self.hovered = next;
        changed
    }

    pub fn advance(&mut self, state: &ViewState, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let spacing = spacing_unit(state.is_exploded());
        let count = self.stack.len();
        for (index, (layer, visual)) in self
            .stack
            .layers()
            .iter()
            .zip(self.visuals.iter_mut())
            .enumerate()
        {
            let selected = state.selected() == Some(layer.id.as_str());
            let hovered = self.hovered == Some(index);
            let scale = if selected { SELECTED_SCALE } else { 1.0 };
            let color = if selected {
                layer.color.offset_lightness(SELECTED_LIGHTNESS)
            } else if hovered {
                layer.color.offset_lightness(HOVER_LIGHTNESS)
            } else {
                layer.color
            };
            visual.offset.step(layer_offset(index, count, spacing), dt);
            visual.scale.step(scale, dt);
            visual.color.step(color, dt);
        }
        self.float.advance(state.selected().is_none(), dt);
    }

    /// Current stack transform: idle float around the fixed stack rotation.
    pub fn stack_transform(&self) -> Mat4 {
        let rotation = self.float.rotation();
        Mat4::from_translation(Vec3::new(0.0, self.float.lift(), 0.0))
            * Mat4::from_quat(Quat::from_euler(
                EulerRot::XYZ,
                rotation.x,
                rotation.y,
                rotation.z,
            ))
            * Mat4::from_rotation_y(STACK_YAW)
    }

    pub fn slabs(&self, state: &ViewState) -> Vec<SlabPose> {
        let cathode_id = cathode_layer_id();
        self.stack
            .layers()
            .iter()
            .zip(&self.visuals)
            .enumerate()
            .map(|(index, (layer, visual))| {
                let finish = Finish::for_layer(&layer.id);
                SlabPose {
                    id: layer.id.clone(),
                    index,
                    offset: visual.offset.value(),
                    thickness: layer.thickness_ratio,
                    scale: visual.scale.value(),
                    color: visual.color.value(),
                    opacity: finish.opacity(),
                    finish,
                    selected: state.selected() == Some(layer.id.as_str()),
                    hovered: self.hovered == Some(index),
                    has_particles: layer.id == cathode_id && !self.particles.is_empty(),
                }
            })
            .collect()
    }

    pub fn compose(&self, state: &ViewState, micro: Option<&MicroScene>) -> SceneFrame {
        let exploded = state.is_exploded();
        if state.is_micro() {
            let kind = state.selected().and_then(MicroKind::for_layer);
            return match (kind, micro) {
                (Some(kind), Some(scene)) if scene.kind() == kind => SceneFrame {
                    caption: kind.caption(),
                    exploded,
                    labels: micro_labels(scene),
                    content: SceneContent::Micro(scene.frame()),
                },
                _ => SceneFrame {
                    caption: kind.map(MicroKind::caption).unwrap_or(CAPTION_STACKED),
                    exploded,
                    labels: Vec::new(),
                    content: SceneContent::Empty,
                },
            };
        }

        let transform = self.stack_transform();
        let slabs = self.slabs(state);
        let labels = slabs
            .iter()
            .filter(|slab| exploded || slab.selected)
            .filter_map(|slab| {
                let layer = self.stack.layers().get(slab.index)?;
                let anchor = transform.transform_point3(Vec3::new(LABEL_OFFSET, slab.offset, 0.0));
                Some(SceneLabel {
                    text: layer.name.clone(),
                    position: anchor.to_array(),
                    color: LABEL_COLOR,
                    opacity: 1.0,
                    align: LabelAlign::Left,
                })
            })
            .collect();
        let rotation = self.float.rotation();
        SceneFrame {
            caption: if exploded {
                CAPTION_EXPLODED
            } else {
                CAPTION_STACKED
            },
            exploded,
            labels,
            content: SceneContent::Macro(MacroFrame {
                lift: self.float.lift(),
                float_rotation: rotation.to_array(),
                slabs,
                transform,
            }),
        }
    }

    /// Index of the nearest slab hit by `ray`, using the poses currently on
    /// screen.
    pub fn pick(&self, ray: Ray) -> Option<usize> {
        let local = ray.transformed(self.stack_transform().inverse())?;
        self.stack
            .layers()
            .iter()
            .zip(&self.visuals)
            .enumerate()
            .filter_map(|(index, (layer, visual))| {
                let scale = visual.scale.value();
                let center = Vec3::new(0.0, visual.offset.value(), 0.0);
                let half = Vec3::new(
                    SLAB_WIDTH * 0.5 * scale,
                    layer.thickness_ratio * 0.5 * scale,
                    SLAB_WIDTH * 0.5 * scale,
                );
                intersect_box(&local, center - half, center + half).map(|t| (index, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

fn cathode_layer_id() -> &'static str {
    MicroKind::Cathode.layer_id()
}

fn micro_labels(scene: &MicroScene) -> Vec<SceneLabel> {
    let Some(sim) = scene.cathode() else {
        return Vec::new();
    };
    vec![
        SceneLabel {
            text: cathode::PARTICLES_LABEL.to_string(),
            position: cathode::PARTICLES_LABEL_POSITION,
            color: PARTICLES_LABEL_COLOR,
            opacity: 1.0,
            align: LabelAlign::Right,
        },
        SceneLabel {
            text: cathode::GLASS_LABEL.to_string(),
            position: cathode::GLASS_LABEL_POSITION,
            color: GLASS_LABEL_COLOR,
            opacity: sim.infusion(),
            align: LabelAlign::Left,
        },
    ]
}

fn generate_particles<R: Rng + ?Sized>(thickness: f32, rng: &mut R) -> Vec<Particle> {
    (0..CATHODE_PARTICLES)
        .map(|_| {
            let position = Vec3::new(
                (rng.gen::<f32>() - 0.5) * PARTICLE_SPREAD,
                (rng.gen::<f32>() - 0.5) * thickness * 0.8,
                (rng.gen::<f32>() - 0.5) * PARTICLE_SPREAD,
            );
            Particle {
                position,
                scale: rng.gen::<f32>() * 0.1 + 0.05,
            }
        })
        .collect()
}

/// Slab test against an axis-aligned box; returns the entry distance.
fn intersect_box(ray: &Ray, min: Vec3, max: Vec3) -> Option<f32> {
    let mut near = f32::NEG_INFINITY;
    let mut far = f32::INFINITY;
    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        if direction.abs() < f32::EPSILON {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let a = (min[axis] - origin) / direction;
        let b = (max[axis] - origin) / direction;
        near = near.max(a.min(b));
        far = far.min(a.max(b));
        if near > far {
            return None;
        }
    }
    if far < 0.0 {
        return None;
    }
    Some(near.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_state::{ViewMode, ViewStateController};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn composer() -> SceneComposer {
        SceneComposer::new(Arc::new(LayerStack::builtin()), &mut StdRng::seed_from_u64(3))
    }

    fn state(mode: ViewMode, id: Option<&str>) -> ViewState {
        ViewState {
            mode,
            selected_layer_id: id.map(str::to_string),
        }
    }

    fn settle(composer: &mut SceneComposer, state: &ViewState) {
        for _ in 0..600 {
            composer.advance(state, 1.0 / 60.0);
        }
    }

    #[test]
    fn exploded_offsets_are_strictly_decreasing() {
        for count in 1..8 {
            let offsets: Vec<f32> = (0..count)
                .map(|i| layer_offset(i, count, EXPLODED_SPACING))
                .collect();
            assert!(offsets.windows(2).all(|pair| pair[0] > pair[1]));
            let sum: f32 = offsets.iter().sum();
            assert!(sum.abs() < 1e-4, "stack is centred");
        }
        assert_eq!(layer_offset(0, 5, EXPLODED_SPACING), 3.0);
        assert_eq!(layer_offset(4, 5, EXPLODED_SPACING), -3.0);
        assert!(STACKED_SPACING < EXPLODED_SPACING);
        assert_eq!(layer_offset(0, 5, STACKED_SPACING), 1.0);
    }

    #[test]
    fn selection_explodes_and_emphasizes() {
        let mut composer = composer();
        let selected = state(ViewMode::Exploded, Some("separator"));
        settle(&mut composer, &selected);
        let slabs = composer.slabs(&selected);
        assert!((slabs[0].offset - 3.0).abs() < 1e-3);
        let separator = &slabs[2];
        assert!(separator.selected);
        assert!((separator.scale - SELECTED_SCALE).abs() < 1e-4);
        let base = LayerStack::builtin().layers()[2].color;
        let target = base.offset_lightness(SELECTED_LIGHTNESS);
        assert!((separator.color.b - target.b).abs() < 1e-3);
        assert!((slabs[1].scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn emphasis_is_smoothed_not_snapped() {
        let mut composer = composer();
        let selected = state(ViewMode::Exploded, Some("copper"));
        composer.advance(&selected, 1.0 / 60.0);
        let slab = &composer.slabs(&selected)[0];
        assert!(slab.scale > 1.0 && slab.scale < SELECTED_SCALE);
        assert!(slab.offset > 1.0 && slab.offset < 3.0);
    }

    #[test]
    fn labels_follow_exploded_view() {
        let mut composer = composer();
        let intro = ViewState::default();
        assert!(composer.compose(&intro, None).labels.is_empty());
        assert_eq!(composer.compose(&intro, None).caption, CAPTION_STACKED);
        let exploded = state(ViewMode::Exploded, None);
        settle(&mut composer, &exploded);
        let frame = composer.compose(&exploded, None);
        assert_eq!(frame.caption, CAPTION_EXPLODED);
        assert_eq!(frame.labels.len(), 5);
        assert_eq!(frame.labels[3].text, "Glass-Infused Cathode");
    }

    #[test]
    fn micro_view_replaces_the_stack() {
        let composer = composer();
        let mut rng = StdRng::seed_from_u64(4);
        let scene = MicroScene::enter(MicroKind::Cathode, &mut rng);
        let micro = state(ViewMode::Micro, Some("cathode"));
        let frame = composer.compose(&micro, Some(&scene));
        assert!(matches!(frame.content, SceneContent::Micro(MicroFrame::Cathode(_))));
        assert_eq!(frame.caption, "Cathode-Electrolyte Interface");
        assert_eq!(frame.labels.len(), 2);
        let empty = composer.compose(&micro, None);
        assert!(matches!(empty.content, SceneContent::Empty));
    }

    #[test]
    fn idle_float_fades_once_selected() {
        let mut composer = composer();
        let selected = state(ViewMode::Exploded, Some("anode"));
        settle(&mut composer, &selected);
        let frame = composer.compose(&selected, None);
        let SceneContent::Macro(stack) = frame.content else {
            panic!("expected macro stack");
        };
        assert!(stack.lift.abs() < 1e-4);
        assert!(stack.float_rotation.iter().all(|r| r.abs() < 1e-4));
    }

    #[test]
    fn picking_hits_nearest_slab() {
        let mut composer = composer();
        let selected = state(ViewMode::Exploded, Some("anode"));
        settle(&mut composer, &selected);
        let down = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y).expect("ray");
        assert_eq!(composer.pick(down), Some(0));
        let up = Ray::new(Vec3::new(0.0, -10.0, 0.0), Vec3::Y).expect("ray");
        assert_eq!(composer.pick(up), Some(4));
        let miss = Ray::new(Vec3::new(10.0, 10.0, 10.0), Vec3::Y).expect("ray");
        assert_eq!(composer.pick(miss), None);
    }

    #[test]
    fn hover_brightens_unselected_layer() {
        let mut composer = composer();
        let mut ctrl = ViewStateController::new(Arc::new(LayerStack::builtin()));
        ctrl.set_mode(ViewMode::Exploded, crate::view_state::SelectionPolicy::Clear);
        settle(&mut composer, ctrl.state());
        let down = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y);
        assert!(composer.hover(ctrl.state(), down));
        assert_eq!(composer.hovered(), Some("copper"));
        settle(&mut composer, ctrl.state());
        let slab = &composer.slabs(ctrl.state())[0];
        let base = LayerStack::builtin().layers()[0].color;
        let sum = |c: Rgb| c.r + c.g + c.b;
        assert!(sum(slab.color) > sum(base));
        assert!(composer.hover(ctrl.state(), None));
        assert_eq!(composer.hovered(), None);
    }

    #[test]
    fn cathode_slab_carries_particles() {
        let composer = composer();
        assert_eq!(composer.cathode_particles().len(), CATHODE_PARTICLES);
        let slabs = composer.slabs(&ViewState::default());
        assert!(slabs.iter().filter(|s| s.has_particles).all(|s| s.id == "cathode"));
        assert_eq!(slabs[2].finish, Finish::Glass);
        assert!(slabs[2].opacity < 1.0);
    }
}
