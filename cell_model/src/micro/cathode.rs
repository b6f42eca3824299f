//! Glass infusion into the NMC cathode. A 3x3x3 lattice of active-material
//! nodes sits inside a glass volume whose size, opacity and ion traffic all
//! follow the user's infusion parameter.

use glam::Vec3;
use rand::Rng;
use serde::Serialize;

use super::ions::{IonField, GLASS_ION_COLOR};
use crate::color::Rgb;
use crate::smoothing::damp;

pub const DEFAULT_INFUSION: f32 = 0.6;

pub const LATTICE_SPACING: f32 = 2.2;
const LATTICE_JITTER: f32 = 0.2;
const MIN_NODE_SCALE: f32 = 0.8;
const NODE_SCALE_SPREAD: f32 = 0.2;
/// Inactive nodes ease back to their resting scale at this rate (1/s).
const NODE_SETTLE_RATE: f32 = 6.0;
const PULSE_AMPLITUDE: f32 = 0.03;
const PULSE_FREQUENCY: f32 = 10.0;
const EMISSIVE_BASE: f32 = 0.2;
const EMISSIVE_AMPLITUDE: f32 = 0.1;
const EMISSIVE_FREQUENCY: f32 = 5.0;

pub const NODE_COLOR: Rgb = Rgb::from_u8(0x1E, 0x29, 0x3B);
pub const NODE_EMISSIVE: Rgb = Rgb::from_u8(0x3B, 0x82, 0xF6);
pub const GLASS_COLOR: Rgb = Rgb::from_u8(0x60, 0xA5, 0xFA);

/// Nodes pulse once the infusion exceeds this.
pub const ACTIVE_THRESHOLD: f32 = 0.5;
pub const GLASS_THRESHOLD: f32 = 0.05;
pub const FLOW_THRESHOLD: f32 = 0.2;
pub const ION_THRESHOLD: f32 = 0.1;
pub const LOW_CONTACT_THRESHOLD: f32 = 0.3;

const GLASS_EDGE: f32 = 1.5;
const GLASS_GROWTH: f32 = 4.5;
const GLASS_MAX_OPACITY: f32 = 0.25;
pub const FLOW_RADIUS: f32 = 4.0;
const FLOW_OPACITY: f32 = 0.05;

pub const MAX_IONS: usize = 30;
const ION_BASE_SPEED: f32 = 2.0;
const ION_SPEED_GAIN: f32 = 2.0;
const ION_BOUNDS: Vec3 = Vec3::new(5.0, 5.0, 5.0);
const ION_LANE: (f32, f32) = (-2.0, 2.0);

pub const SLIDER_TITLE: &str = "Molten Glass Infusion";
pub const SLIDER_MIN_LABEL: &str = "Unfilled (Dry)";
pub const SLIDER_MAX_LABEL: &str = "Filled (Active)";
pub const PARTICLES_LABEL: &str = "NMC Cathode Particles";
pub const GLASS_LABEL: &str = "Oxy-Sulfide Glass Electrolyte";
pub const PARTICLES_LABEL_POSITION: [f32; 3] = [-3.0, 2.0, 0.0];
pub const GLASS_LABEL_POSITION: [f32; 3] = [3.0, -2.0, 0.0];

/// Status line under the infusion slider.
pub fn status_line(infusion: f32) -> &'static str {
    if infusion < LOW_CONTACT_THRESHOLD {
        "Low Surface Contact"
    } else {
        "High Ionic Conductivity"
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeNode {
    pub position: Vec3,
    pub base_scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodePose {
    pub position: [f32; 3],
    pub scale: f32,
    pub emissive: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlassVolume {
    pub edge: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowShell {
    pub radius: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CathodeFrame {
    pub infusion: f32,
    pub active: bool,
    pub nodes: Vec<NodePose>,
    pub glass: Option<GlassVolume>,
    pub flow_shell: Option<FlowShell>,
    pub ion_speed: f32,
    pub ion_color: Rgb,
    pub ions: Vec<[f32; 3]>,
    pub glass_label_opacity: f32,
    pub status: &'static str,
}

#[derive(Debug, Clone)]
pub struct CathodeSimulator {
    infusion: f32,
    elapsed: f32,
    nodes: Vec<LatticeNode>,
    scales: Vec<f32>,
    ions: IonField,
}

impl CathodeSimulator {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let nodes = generate_lattice(rng);
        let scales = nodes.iter().map(|node| node.base_scale).collect();
        Self {
            infusion: DEFAULT_INFUSION,
            elapsed: 0.0,
            nodes,
            scales,
            ions: IonField::generate(MAX_IONS, ION_BOUNDS, GLASS_ION_COLOR, rng),
        }
    }

    pub fn infusion(&self) -> f32 {
        self.infusion
    }

    /// Clamp to `[0, 1]`; NaN is ignored. Returns whether the value changed.
    pub fn set_infusion(&mut self, value: f32) -> bool {
        if value.is_nan() {
            log::debug!("ignoring NaN infusion");
            return false;
        }
        let clamped = value.clamp(0.0, 1.0);
        if clamped == self.infusion {
            return false;
        }
        self.infusion = clamped;
        true
    }

    pub fn is_active(&self) -> bool {
        self.infusion > ACTIVE_THRESHOLD
    }

    pub fn nodes(&self) -> &[LatticeNode] {
        &self.nodes
    }

    pub fn advance(&mut self, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        let active = self.is_active();
        let pulse = (self.elapsed * PULSE_FREQUENCY).sin() * PULSE_AMPLITUDE;
        for (node, scale) in self.nodes.iter().zip(self.scales.iter_mut()) {
            *scale = if active {
                node.base_scale + pulse
            } else {
                damp(*scale, node.base_scale, NODE_SETTLE_RATE, dt)
            };
        }
    }

    pub fn emissive(&self) -> f32 {
        if self.is_active() {
            EMISSIVE_BASE + (self.elapsed * EMISSIVE_FREQUENCY).sin() * EMISSIVE_AMPLITUDE
        } else {
            0.0
        }
    }

    pub fn glass(&self) -> Option<GlassVolume> {
        (self.infusion > GLASS_THRESHOLD).then(|| GlassVolume {
            edge: GLASS_EDGE * GLASS_GROWTH * self.infusion,
            opacity: GLASS_MAX_OPACITY * self.infusion,
        })
    }

    pub fn flow_shell(&self) -> Option<FlowShell> {
        (self.glass().is_some() && self.infusion > FLOW_THRESHOLD).then_some(FlowShell {
            radius: FLOW_RADIUS,
            opacity: FLOW_OPACITY,
        })
    }

    pub fn ion_count(&self) -> usize {
        if self.infusion > ION_THRESHOLD {
            (MAX_IONS as f32 * self.infusion).floor() as usize
        } else {
            0
        }
    }

    pub fn ion_speed(&self) -> f32 {
        ION_BASE_SPEED + ION_SPEED_GAIN * self.infusion
    }

    pub fn ion_color(&self) -> Rgb {
        self.ions.color()
    }

    pub fn ion_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.ions
            .poses(self.elapsed, self.ion_speed(), ION_LANE, self.ion_count())
    }

    pub fn frame(&self) -> CathodeFrame {
        let emissive = self.emissive();
        CathodeFrame {
            infusion: self.infusion,
            active: self.is_active(),
            nodes: self
                .nodes
                .iter()
                .zip(&self.scales)
                .map(|(node, scale)| NodePose {
                    position: node.position.to_array(),
                    scale: *scale,
                    emissive,
                })
                .collect(),
            glass: self.glass(),
            flow_shell: self.flow_shell(),
            ion_speed: self.ion_speed(),
            ion_color: self.ion_color(),
            ions: self.ion_positions().map(|position| position.to_array()).collect(),
            glass_label_opacity: self.infusion,
            status: status_line(self.infusion),
        }
    }
}

fn generate_lattice<R: Rng + ?Sized>(rng: &mut R) -> Vec<LatticeNode> {
    let mut nodes = Vec::with_capacity(27);
    for x in -1..=1 {
        for y in -1..=1 {
            for z in -1..=1 {
                let mut jitter = || (rng.gen::<f32>() - 0.5) * LATTICE_JITTER;
                let position = Vec3::new(
                    x as f32 * LATTICE_SPACING + jitter(),
                    y as f32 * LATTICE_SPACING + jitter(),
                    z as f32 * LATTICE_SPACING + jitter(),
                );
                nodes.push(LatticeNode {
                    position,
                    base_scale: MIN_NODE_SCALE + rng.gen::<f32>() * NODE_SCALE_SPREAD,
                });
            }
        }
    }
    nodes
}
