//! Turns a composed [`SceneFrame`] into GPU instances. Opaque instances are
//! bucketed per primitive; translucent ones keep their primitive and are
//! sorted back to front so they blend in the right order.

use cell_model::micro::anode::{self, AnodeFrame};
use cell_model::micro::cathode::{self, CathodeFrame};
use cell_model::scene::{
    Finish, LABEL_COLOR, LABEL_MARKER_INSET, LABEL_OFFSET, MacroFrame, PARTICLE_COLOR, Particle,
};
use cell_model::{MicroFrame, Rgb, SceneContent, SceneFrame};
use glam::{Mat4, Vec3};

use super::mesh::{MeshInstance, PrimitiveKind};

const METAL_SPECULAR: f32 = 0.9;
const GLASS_SPECULAR: f32 = 0.6;
const MATTE_SPECULAR: f32 = 0.12;
const NODE_SPECULAR: f32 = 0.35;

const LABEL_MARKER_RADIUS: f32 = 0.03;

const SHEET_THICKNESS: f32 = 0.02;
const SHEET_FILL_DROP: f32 = 0.05;
const SHEET_FILL_COLOR: Rgb = Rgb::from_u8(0xCB, 0xD5, 0xE1);
const SHEET_EDGE_OPACITY: f32 = 0.3;
const SHEET_FILL_OPACITY: f32 = 0.1;

const ION_RADIUS: f32 = 0.12;
const ION_GLOW: f32 = 0.8;
const ION_TRAIL_OFFSET: f32 = 0.2;
const ION_TRAIL_RADIUS: f32 = 0.06;
const ION_TRAIL_OPACITY: f32 = 0.4;

/// Primitives are one unit across; radii double into scales.
fn diameter(radius: f32) -> f32 {
    radius * 2.0
}

/// sRGB to linear, per channel.
pub fn linear(color: Rgb) -> [f32; 3] {
    color.to_array().map(|channel| {
        let channel = channel.clamp(0.0, 1.0);
        if channel <= 0.04045 {
            channel / 12.92
        } else {
            ((channel + 0.055) / 1.055).powf(2.4)
        }
    })
}

fn linear_rgba(color: Rgb, alpha: f32) -> [f32; 4] {
    let [r, g, b] = linear(color);
    [r, g, b, alpha.clamp(0.0, 1.0)]
}

fn scaled(color: [f32; 3], factor: f32) -> [f32; 3] {
    color.map(|channel| channel * factor)
}

#[derive(Default, Debug)]
pub struct InstanceGroups {
    pub cube: Vec<MeshInstance>,
    pub sphere: Vec<MeshInstance>,
    pub dodecahedron: Vec<MeshInstance>,
}

impl InstanceGroups {
    pub fn get(&self, kind: PrimitiveKind) -> &[MeshInstance] {
        match kind {
            PrimitiveKind::Cube => &self.cube,
            PrimitiveKind::Sphere => &self.sphere,
            PrimitiveKind::Dodecahedron => &self.dodecahedron,
        }
    }

    fn push(&mut self, kind: PrimitiveKind, instance: MeshInstance) {
        match kind {
            PrimitiveKind::Cube => self.cube.push(instance),
            PrimitiveKind::Sphere => self.sphere.push(instance),
            PrimitiveKind::Dodecahedron => self.dodecahedron.push(instance),
        }
    }

    pub fn len(&self) -> usize {
        self.cube.len() + self.sphere.len() + self.dodecahedron.len()
    }
}

#[derive(Default, Debug)]
pub struct SceneBatch {
    pub opaque: InstanceGroups,
    pub translucent: Vec<(PrimitiveKind, MeshInstance)>,
}

impl SceneBatch {
    pub fn build(frame: &SceneFrame, particles: &[Particle], eye: Vec3) -> Self {
        let mut batch = SceneBatch::default();
        match &frame.content {
            SceneContent::Macro(scene) => batch.push_macro(scene, frame.exploded, particles),
            SceneContent::Micro(MicroFrame::Anode(scene)) => batch.push_anode(scene),
            SceneContent::Micro(MicroFrame::Cathode(scene)) => batch.push_cathode(scene),
            SceneContent::Empty => {}
        }
        batch.sort_translucent(eye);
        batch
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.translucent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, kind: PrimitiveKind, instance: MeshInstance) {
        if instance.alpha() <= 0.0 {
            return;
        }
        if instance.alpha() < 1.0 {
            self.translucent.push((kind, instance));
        } else {
            self.opaque.push(kind, instance);
        }
    }

    fn sort_translucent(&mut self, eye: Vec3) {
        self.translucent.sort_by(|(_, a), (_, b)| {
            let da = a.translation().distance_squared(eye);
            let db = b.translation().distance_squared(eye);
            db.total_cmp(&da)
        });
    }

    fn push_macro(&mut self, scene: &MacroFrame, exploded: bool, particles: &[Particle]) {
        for slab in &scene.slabs {
            let specular = match slab.finish {
                Finish::Metal => METAL_SPECULAR,
                Finish::Glass => GLASS_SPECULAR,
                Finish::Matte => MATTE_SPECULAR,
            };
            self.push(
                PrimitiveKind::Cube,
                MeshInstance::new(
                    slab.model(scene.transform),
                    linear_rgba(slab.color, slab.opacity),
                    [0.0; 3],
                    specular,
                ),
            );

            if slab.has_particles {
                let anchor = slab.anchor(scene.transform);
                let color = linear_rgba(PARTICLE_COLOR, 1.0);
                for particle in particles {
                    let model = anchor
                        * Mat4::from_translation(particle.position)
                        * Mat4::from_scale(Vec3::splat(diameter(particle.scale)));
                    self.push(
                        PrimitiveKind::Dodecahedron,
                        MeshInstance::new(model, color, [0.0; 3], MATTE_SPECULAR),
                    );
                }
            }

            if exploded || slab.selected {
                let marker = scene.transform.transform_point3(Vec3::new(
                    LABEL_OFFSET - LABEL_MARKER_INSET,
                    slab.offset,
                    0.0,
                ));
                let model = Mat4::from_translation(marker)
                    * Mat4::from_scale(Vec3::splat(diameter(LABEL_MARKER_RADIUS)));
                // Unlit: all of the color comes from the emissive term.
                self.push(
                    PrimitiveKind::Sphere,
                    MeshInstance::new(model, [0.0, 0.0, 0.0, 1.0], linear(LABEL_COLOR), 0.0),
                );
            }
        }
    }

    fn push_anode(&mut self, scene: &AnodeFrame) {
        let atom_color = linear_rgba(anode::ATOM_COLOR, 1.0);
        let atom_scale = Vec3::splat(diameter(anode::ATOM_RADIUS));
        for sheet in &scene.sheets {
            let edge = Mat4::from_translation(Vec3::new(0.0, sheet.y, 0.0))
                * Mat4::from_scale(Vec3::new(
                    anode::SHEET_SIZE,
                    SHEET_THICKNESS,
                    anode::SHEET_SIZE,
                ));
            self.push(
                PrimitiveKind::Cube,
                MeshInstance::new(
                    edge,
                    linear_rgba(anode::SHEET_COLOR, sheet.opacity * SHEET_EDGE_OPACITY),
                    [0.0; 3],
                    MATTE_SPECULAR,
                ),
            );
            let fill = Mat4::from_translation(Vec3::new(0.0, sheet.y - SHEET_FILL_DROP, 0.0))
                * Mat4::from_scale(Vec3::new(
                    anode::SHEET_SIZE,
                    SHEET_THICKNESS,
                    anode::SHEET_SIZE,
                ));
            self.push(
                PrimitiveKind::Cube,
                MeshInstance::new(
                    fill,
                    linear_rgba(SHEET_FILL_COLOR, sheet.opacity * SHEET_FILL_OPACITY),
                    [0.0; 3],
                    0.0,
                ),
            );
            for (x, z) in anode::sheet_atoms() {
                let model = Mat4::from_translation(Vec3::new(x, sheet.y, z))
                    * Mat4::from_scale(atom_scale);
                self.push(
                    PrimitiveKind::Sphere,
                    MeshInstance::new(model, atom_color, [0.0; 3], MATTE_SPECULAR),
                );
            }
        }
        self.push_ions(&scene.ions, scene.ion_color);
    }

    fn push_cathode(&mut self, scene: &CathodeFrame) {
        let node_color = linear_rgba(cathode::NODE_COLOR, 1.0);
        let node_emissive = linear(cathode::NODE_EMISSIVE);
        for node in &scene.nodes {
            let model = Mat4::from_translation(Vec3::from(node.position))
                * Mat4::from_scale(Vec3::splat(diameter(node.scale)));
            self.push(
                PrimitiveKind::Dodecahedron,
                MeshInstance::new(
                    model,
                    node_color,
                    scaled(node_emissive, node.emissive),
                    NODE_SPECULAR,
                ),
            );
        }

        if let Some(glass) = scene.glass {
            self.push(
                PrimitiveKind::Cube,
                MeshInstance::new(
                    Mat4::from_scale(Vec3::splat(glass.edge)),
                    linear_rgba(cathode::GLASS_COLOR, glass.opacity),
                    [0.0; 3],
                    GLASS_SPECULAR,
                ),
            );
        }
        if let Some(shell) = scene.flow_shell {
            self.push(
                PrimitiveKind::Sphere,
                MeshInstance::new(
                    Mat4::from_scale(Vec3::splat(diameter(shell.radius))),
                    linear_rgba(cathode::GLASS_COLOR, shell.opacity),
                    [0.0; 3],
                    0.0,
                ),
            );
        }
        self.push_ions(&scene.ions, scene.ion_color);
    }

    fn push_ions(&mut self, ions: &[[f32; 3]], color: Rgb) {
        let body = linear_rgba(color, 1.0);
        let glow = scaled(linear(color), ION_GLOW);
        let trail = linear_rgba(color, ION_TRAIL_OPACITY);
        for position in ions {
            let center = Vec3::from(*position);
            self.push(
                PrimitiveKind::Sphere,
                MeshInstance::new(
                    Mat4::from_translation(center)
                        * Mat4::from_scale(Vec3::splat(diameter(ION_RADIUS))),
                    body,
                    glow,
                    0.3,
                ),
            );
            self.push(
                PrimitiveKind::Sphere,
                MeshInstance::new(
                    Mat4::from_translation(center - Vec3::new(ION_TRAIL_OFFSET, 0.0, 0.0))
                        * Mat4::from_scale(Vec3::splat(diameter(ION_TRAIL_RADIUS))),
                    trail,
                    [0.0; 3],
                    0.0,
                ),
            );
        }
    }
}
