//! Procedural primitives the scene is built from. Every primitive fits a
//! unit-diameter bound centred on the origin, so instance transforms carry
//! the full world size.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

const SPHERE_LAT_DIVS: u32 = 16;
const SPHERE_LON_DIVS: u32 = 24;

/// Light direction (towards the light), matching a key light above and in
/// front of the default camera.
const LIGHT_DIRECTION: [f32; 3] = [0.45, 0.85, 0.55];

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub struct MeshPrimitive {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl MeshPrimitive {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Cube,
    Sphere,
    Dodecahedron,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 3] = [
        PrimitiveKind::Cube,
        PrimitiveKind::Sphere,
        PrimitiveKind::Dodecahedron,
    ];
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    /// Linear RGB plus alpha.
    pub color: [f32; 4],
    /// Linear emissive RGB; `w` is the specular strength.
    pub emissive: [f32; 4],
}

impl MeshInstance {
    pub fn new(model: Mat4, color: [f32; 4], emissive: [f32; 3], specular: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color,
            emissive: [emissive[0], emissive[1], emissive[2], specular],
        }
    }

    pub fn translation(&self) -> Vec3 {
        let column = self.model[3];
        Vec3::new(column[0], column[1], column[2])
    }

    pub fn alpha(&self) -> f32 {
        self.color[3]
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshUniforms {
    pub view_projection: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub light: [f32; 4],
}

pub fn mesh_uniforms(view_projection: Mat4, eye: Vec3) -> MeshUniforms {
    let light = Vec3::from(LIGHT_DIRECTION).normalize();
    MeshUniforms {
        view_projection: view_projection.to_cols_array_2d(),
        eye: eye.extend(1.0).to_array(),
        light: light.extend(0.0).to_array(),
    }
}

pub fn primitive(kind: PrimitiveKind) -> MeshPrimitive {
    match kind {
        PrimitiveKind::Cube => build_cube(),
        PrimitiveKind::Sphere => build_sphere(SPHERE_LAT_DIVS, SPHERE_LON_DIVS),
        PrimitiveKind::Dodecahedron => build_dodecahedron(),
    }
}

fn build_sphere(lat_divisions: u32, lon_divisions: u32) -> MeshPrimitive {
    let lat_steps = lat_divisions.max(3);
    let lon_steps = lon_divisions.max(6);
    let mut vertices = Vec::with_capacity(((lat_steps + 1) * (lon_steps + 1)) as usize);
    let mut indices = Vec::with_capacity((lat_steps * lon_steps * 6) as usize);

    for lat in 0..=lat_steps {
        let theta = lat as f32 / lat_steps as f32 * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for lon in 0..=lon_steps {
            let phi = lon as f32 / lon_steps as f32 * PI * 2.0;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let normal = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            vertices.push(MeshVertex {
                position: (normal * 0.5).into(),
                normal: normal.normalize_or_zero().into(),
            });
        }
    }

    // Counter-clockwise seen from outside.
    let ring = (lon_steps + 1) as usize;
    for lat in 0..lat_steps as usize {
        for lon in 0..lon_steps as usize {
            let current = lat * ring + lon;
            let next = current + ring;
            indices.extend_from_slice(&[
                current as u16,
                (current + 1) as u16,
                next as u16,
                (current + 1) as u16,
                (next + 1) as u16,
                next as u16,
            ]);
        }
    }

    MeshPrimitive::new(vertices, indices)
}

fn build_cube() -> MeshPrimitive {
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([1.0, 0.0, 0.0], [[0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5], [0.5, -0.5, 0.5]]),
        ([-1.0, 0.0, 0.0], [[-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5], [-0.5, -0.5, -0.5]]),
        ([0.0, 1.0, 0.0], [[-0.5, 0.5, -0.5], [-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5]]),
        ([0.0, -1.0, 0.0], [[-0.5, -0.5, 0.5], [-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5]]),
        ([0.0, 0.0, 1.0], [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]]),
        ([0.0, 0.0, -1.0], [[0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5]]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face_index, (normal, corners)) in faces.iter().enumerate() {
        let base = (face_index * 4) as u16;
        vertices.extend(corners.iter().map(|corner| MeshVertex {
            position: *corner,
            normal: *normal,
        }));
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshPrimitive::new(vertices, indices)
}

/// Flat-shaded regular dodecahedron. Face normals point at the vertices of
/// the dual icosahedron; each face gathers the five corners closest to its
/// normal and is fanned in angular order.
fn build_dodecahedron() -> MeshPrimitive {
    let phi = (1.0 + 5.0_f32.sqrt()) * 0.5;
    let inv = 1.0 / phi;

    let mut corners = Vec::with_capacity(20);
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                corners.push(Vec3::new(x, y, z));
            }
        }
    }
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            corners.push(Vec3::new(0.0, a * inv, b * phi));
            corners.push(Vec3::new(a * inv, b * phi, 0.0));
            corners.push(Vec3::new(a * phi, 0.0, b * inv));
        }
    }

    let mut face_normals = Vec::with_capacity(12);
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            face_normals.push(Vec3::new(0.0, a * phi, b).normalize());
            face_normals.push(Vec3::new(a * phi, b, 0.0).normalize());
            face_normals.push(Vec3::new(a, 0.0, b * phi).normalize());
        }
    }

    let scale = 0.5 / 3.0_f32.sqrt();
    let mut vertices = Vec::with_capacity(60);
    let mut indices = Vec::with_capacity(108);
    for normal in face_normals {
        let mut ranked: Vec<Vec3> = corners.clone();
        ranked.sort_by(|a, b| b.dot(normal).total_cmp(&a.dot(normal)));
        let face: Vec<Vec3> = ranked.into_iter().take(5).collect();

        let center = face.iter().copied().sum::<Vec3>() / 5.0;
        let u = (face[0] - center).normalize();
        let w = normal.cross(u);
        let mut ordered = face;
        ordered.sort_by(|a, b| {
            let angle = |p: &Vec3| {
                let d = *p - center;
                d.dot(w).atan2(d.dot(u))
            };
            angle(a).total_cmp(&angle(b))
        });

        let base = vertices.len() as u16;
        vertices.extend(ordered.iter().map(|corner| MeshVertex {
            position: (*corner * scale).into(),
            normal: normal.into(),
        }));
        for step in 1..4u16 {
            indices.extend_from_slice(&[base, base + step, base + step + 1]);
        }
    }

    MeshPrimitive::new(vertices, indices)
}
