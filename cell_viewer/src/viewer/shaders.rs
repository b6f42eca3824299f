use bytemuck::{Pod, Zeroable};

/// Full-window quad sampling the CPU-drawn panel canvas.
pub(super) const OVERLAY_SHADER_SOURCE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.uv = input.uv;
    return out;
}

@group(0) @binding(0)
var overlay_texture: texture_2d<f32>;
@group(0) @binding(1)
var overlay_sampler: sampler;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let uv = clamp(input.uv, vec2<f32>(0.0, 0.0), vec2<f32>(1.0, 1.0));
    return textureSample(overlay_texture, overlay_sampler, uv);
}
"#;

/// Instanced primitives lit by one directional light. Instance colors arrive
/// in linear space; `emissive.w` scales the specular highlight.
pub(super) const MESH_SHADER_SOURCE: &str = r#"
struct MeshUniforms {
    view_projection: mat4x4<f32>,
    eye: vec4<f32>,
    light: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: MeshUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    @location(7) emissive: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) emissive: vec4<f32>,
};

@vertex
fn mesh_vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(instance.model_0, instance.model_1, instance.model_2, instance.model_3);
    let world = model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.position = uniforms.view_projection * world;
    out.world_position = world.xyz;
    out.normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.color = instance.color;
    out.emissive = instance.emissive;
    return out;
}

@fragment
fn mesh_fs_main(input: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var normal = normalize(input.normal);
    if (!front) {
        normal = -normal;
    }
    let light_dir = normalize(uniforms.light.xyz);
    let view_dir = normalize(uniforms.eye.xyz - input.world_position);
    let half_dir = normalize(light_dir + view_dir);

    let ambient = 0.42;
    let diffuse = max(dot(normal, light_dir), 0.0) * 0.62;
    let specular = pow(max(dot(normal, half_dir), 0.0), 48.0) * input.emissive.w;

    let lit = input.color.rgb * (ambient + diffuse) + vec3<f32>(specular) + input.emissive.rgb;
    return vec4<f32>(lit, input.color.a);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, 1.0],
        uv: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
        uv: [1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, -1.0],
        uv: [0.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
        uv: [1.0, 1.0],
    },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];
