/// WGSL for every scene pipeline: lit and unlit meshes, line segments and
/// camera-facing point sprites. Struct layouts mirror `uniforms.rs`.
pub const SCENE_SHADER: &str = r#"
struct Light {
    position: vec4<f32>,
    direction: vec4<f32>,
    color: vec4<f32>,
    cone: vec4<f32>,
};

struct Frame {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    camera_position: vec4<f32>,
    fog_color: vec4<f32>,
    fog_tone: vec4<f32>,
    ambient: vec4<f32>,
    sky: vec4<f32>,
    ground: vec4<f32>,
    light_count: vec4<u32>,
    lights: array<Light, 8>,
};

struct Draw {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
    flags: vec4<u32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> draw: Draw;

@group(2) @binding(0)
var map_texture: texture_2d<f32>;
@group(2) @binding(1)
var map_sampler: sampler;

@group(3) @binding(0)
var matcap_texture: texture_2d<f32>;
@group(3) @binding(1)
var matcap_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec3<f32>,
};

struct MeshOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec3<f32>,
    @location(4) view_depth: f32,
};

struct FlatOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) view_depth: f32,
};

fn vertex_color(color: vec3<f32>) -> vec3<f32> {
    if (draw.flags.y == 1u) {
        return color;
    }
    return vec3<f32>(1.0);
}

// ACES fit, then linear fog by view depth.
fn finish(color: vec3<f32>, depth: f32) -> vec4<f32> {
    var rgb = color;
    if (frame.fog_tone.z > 0.5) {
        let x = rgb * frame.fog_tone.w;
        rgb = saturate((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14));
    }
    if (frame.fog_color.w > 0.5) {
        let f = smoothstep(frame.fog_tone.x, frame.fog_tone.y, depth);
        rgb = mix(rgb, frame.fog_color.rgb, f);
    }
    return vec4<f32>(rgb, 1.0);
}

fn attenuation(distance: f32, cutoff: f32, decay: f32) -> f32 {
    var falloff = 1.0 / max(pow(distance, decay), 0.01);
    if (cutoff > 0.0) {
        let r = saturate(1.0 - pow(distance / cutoff, 4.0));
        falloff = falloff * r * r;
    }
    return falloff;
}

fn cone(cos_angle: f32, outer: f32, inner: f32) -> f32 {
    if (inner - outer < 1e-4) {
        return step(outer, cos_angle);
    }
    return smoothstep(outer, inner, cos_angle);
}

@vertex
fn vs_mesh(vertex: VertexInput) -> MeshOutput {
    let world = draw.model * vec4<f32>(vertex.position, 1.0);
    var out: MeshOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (draw.normal * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.uv;
    out.color = vertex_color(vertex.color);
    out.view_depth = -(frame.view * world).z;
    return out;
}

@fragment
fn fs_mesh(in: MeshOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let n = select(-normalize(in.world_normal), normalize(in.world_normal), front);
    let view_normal = normalize((frame.view * vec4<f32>(n, 0.0)).xyz);
    let matcap_uv = vec2<f32>(view_normal.x * 0.5 + 0.5, 0.5 - view_normal.y * 0.5);
    let texel = textureSample(map_texture, map_sampler, in.uv);
    let matcap = textureSample(matcap_texture, matcap_sampler, matcap_uv);

    var base = draw.color.rgb * in.color;
    if (draw.flags.x == 1u) {
        base = base * texel.rgb;
    }

    let shading = u32(draw.params.x + 0.5);
    if (shading == 0u) {
        return finish(base, in.view_depth);
    }
    if (shading == 4u) {
        return finish(base * matcap.rgb, in.view_depth);
    }

    var shininess = 0.0;
    var specular_color = vec3<f32>(0.0);
    var metalness = 0.0;
    if (shading == 2u) {
        shininess = max(draw.params.y, 1.0);
        specular_color = vec3<f32>(0.067);
    } else if (shading == 3u) {
        let r = clamp(draw.params.y, 0.04, 1.0);
        shininess = max(2.0 / (r * r * r * r) - 2.0, 1.0);
        metalness = saturate(draw.params.z);
        specular_color = mix(vec3<f32>(0.04), base, metalness) * (1.0 - r);
    }

    let view_dir = normalize(frame.camera_position.xyz - in.world_position);
    var diffuse = frame.ambient.rgb + mix(frame.ground.rgb, frame.sky.rgb, n.y * 0.5 + 0.5);
    var specular = vec3<f32>(0.0);
    for (var i = 0u; i < frame.light_count.x; i = i + 1u) {
        let light = frame.lights[i];
        let kind = u32(light.position.w + 0.5);
        var l = light.direction.xyz;
        var radiance = light.color.rgb;
        if (kind != 1u) {
            let to_light = light.position.xyz - in.world_position;
            let d = length(to_light);
            l = to_light / max(d, 1e-4);
            radiance = radiance * attenuation(d, light.direction.w, light.color.w);
            if (kind == 3u) {
                radiance = radiance * cone(dot(l, light.direction.xyz), light.cone.x, light.cone.y);
            }
        }
        let ndl = max(dot(n, l), 0.0);
        diffuse = diffuse + radiance * ndl;
        if (shininess > 0.0) {
            let h = normalize(l + view_dir);
            specular = specular + radiance * pow(max(dot(n, h), 0.0), shininess) * ndl;
        }
    }

    let lit = base * (1.0 - metalness) * diffuse + specular_color * specular;
    return finish(lit, in.view_depth);
}

@vertex
fn vs_line(vertex: VertexInput) -> FlatOutput {
    let world = draw.model * vec4<f32>(vertex.position, 1.0);
    var out: FlatOutput;
    out.clip_position = frame.view_proj * world;
    out.color = vertex_color(vertex.color);
    out.view_depth = -(frame.view * world).z;
    return out;
}

// One instance per point, six corners per instance.
@vertex
fn vs_points(vertex: VertexInput, @builtin(vertex_index) corner: u32) -> FlatOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let view_position = frame.view * draw.model * vec4<f32>(vertex.position, 1.0);
    let offset = corners[corner] * draw.params.w * 0.5;
    var out: FlatOutput;
    out.clip_position = frame.projection * vec4<f32>(view_position.xy + offset, view_position.z, 1.0);
    out.color = vertex_color(vertex.color);
    out.view_depth = -view_position.z;
    return out;
}

@fragment
fn fs_flat(in: FlatOutput) -> @location(0) vec4<f32> {
    return finish(draw.color.rgb * in.color, in.view_depth);
}
"#;
