use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use vitrine_render::PerspectiveCamera;
use vitrine_scene::{LightKind, Material, MeshData, Scene, Shading, Side, ToneMapping};

/// Punctual lights beyond this many are dropped for the frame.
pub const MAX_LIGHTS: usize = 8;

const KIND_DIRECTIONAL: f32 = 1.0;
const KIND_POINT: f32 = 2.0;
const KIND_SPOT: f32 = 3.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
pub struct GpuLight {
    /// xyz world position, w kind.
    pub position: [f32; 4],
    /// xyz unit vector from the surface toward the light (directional)
    /// or along the cone axis (spot); w cutoff distance.
    pub direction: [f32; 4],
    /// Linear rgb times intensity; w decay exponent.
    pub color: [f32; 4],
    /// cos(outer angle), cos(inner angle).
    pub cone: [f32; 4],
}

/// Per-frame values shared by every draw.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// rgb, w = 1 when fog is on.
    pub fog_color: [f32; 4],
    /// near, far, tone mapping mode, exposure.
    pub fog_tone: [f32; 4],
    pub ambient: [f32; 4],
    pub sky: [f32; 4],
    pub ground: [f32; 4],
    pub light_count: [u32; 4],
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl FrameUniforms {
    pub fn new(scene: &Scene, camera: &PerspectiveCamera) -> Self {
        let mut out = Self::zeroed();
        out.view_proj = camera.view_projection().to_cols_array_2d();
        out.view = camera.view_matrix().to_cols_array_2d();
        out.projection = camera.projection_matrix().to_cols_array_2d();
        out.camera_position = camera.position.extend(1.0).to_array();

        if let Some(fog) = scene.fog {
            out.fog_color = with_w(fog.color.to_linear(), 1.0);
            out.fog_tone[0] = fog.near;
            out.fog_tone[1] = fog.far;
        }
        if let ToneMapping::Aces { exposure } = scene.tone_mapping {
            out.fog_tone[2] = 1.0;
            out.fog_tone[3] = exposure;
        }

        let mut count = 0;
        let mut dropped = 0;
        for item in scene.lights() {
            let light = item.light;
            let radiance = scaled(light.color.to_linear(), light.intensity);
            let gpu = match light.kind {
                LightKind::Ambient => {
                    add(&mut out.ambient, radiance);
                    continue;
                }
                LightKind::Hemisphere { ground } => {
                    add(&mut out.sky, radiance);
                    add(&mut out.ground, scaled(ground.to_linear(), light.intensity));
                    continue;
                }
                LightKind::Directional { target, .. } => GpuLight {
                    position: with_w(item.position.to_array(), KIND_DIRECTIONAL),
                    direction: with_w(toward(item.position, target), 0.0),
                    color: with_w(radiance, 0.0),
                    cone: [0.0; 4],
                },
                LightKind::Point { distance, decay } => GpuLight {
                    position: with_w(item.position.to_array(), KIND_POINT),
                    direction: [0.0, 0.0, 0.0, distance],
                    color: with_w(radiance, decay),
                    cone: [0.0; 4],
                },
                LightKind::Spot {
                    target,
                    distance,
                    angle,
                    penumbra,
                    decay,
                    ..
                } => GpuLight {
                    position: with_w(item.position.to_array(), KIND_SPOT),
                    direction: with_w(toward(item.position, target), distance),
                    color: with_w(radiance, decay),
                    cone: [angle.cos(), (angle * (1.0 - penumbra)).cos(), 0.0, 0.0],
                },
            };
            if count == MAX_LIGHTS {
                dropped += 1;
                continue;
            }
            out.lights[count] = gpu;
            count += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "too many lights for one frame");
        }
        out.light_count[0] = count as u32;
        out
    }
}

/// Shading model codes understood by the mesh shader.
pub fn shading_code(shading: Shading) -> f32 {
    match shading {
        Shading::Basic => 0.0,
        Shading::Lambert => 1.0,
        Shading::Phong { .. } => 2.0,
        Shading::Standard { .. } => 3.0,
        Shading::Matcap => 4.0,
        Shading::Points { .. } => 5.0,
        Shading::Line => 6.0,
    }
}

/// Per-draw values, bound at a dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// shading code, shininess or roughness, metalness, point size.
    pub params: [f32; 4],
    /// has map, vertex colors, double sided.
    pub flags: [u32; 4],
}

impl DrawUniforms {
    pub fn new(material: &Material, world: Mat4, has_map: bool) -> Self {
        let (a, b, size) = match material.shading {
            Shading::Phong { shininess } => (shininess, 0.0, 0.0),
            Shading::Standard {
                roughness,
                metalness,
            } => (roughness, metalness, 0.0),
            Shading::Points { size } => (0.0, 0.0, size),
            _ => (0.0, 0.0, 0.0),
        };
        Self {
            model: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
            color: with_w(material.color.to_linear(), 1.0),
            params: [shading_code(material.shading), a, b, size],
            flags: [
                u32::from(has_map),
                u32::from(material.vertex_colors),
                u32::from(material.side == Side::Double),
                0,
            ],
        }
    }
}

/// Interleave mesh attributes, filling the ones the mesh lacks. Meshes
/// without indices are drawn in vertex order.
pub fn mesh_vertices(data: &MeshData) -> (Vec<Vertex>, Vec<u32>) {
    let vertices = data
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: data.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            uv: data.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            color: data
                .colors
                .as_ref()
                .and_then(|c| c.get(i).copied())
                .unwrap_or([1.0, 1.0, 1.0]),
        })
        .collect::<Vec<_>>();
    let indices = if data.indices.is_empty() {
        (0..vertices.len() as u32).collect()
    } else {
        data.indices.clone()
    };
    (vertices, indices)
}

/// Smallest multiple of `alignment` holding `size` bytes.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

fn toward(position: Vec3, target: Vec3) -> [f32; 3] {
    let d = (position - target).normalize_or_zero();
    let d = if d == Vec3::ZERO { Vec3::Y } else { d };
    d.to_array()
}

fn with_w(v: [f32; 3], w: f32) -> [f32; 4] {
    [v[0], v[1], v[2], w]
}

fn scaled(v: [f32; 3], k: f32) -> [f32; 3] {
    [v[0] * k, v[1] * k, v[2] * k]
}

fn add(acc: &mut [f32; 4], v: [f32; 3]) {
    for i in 0..3 {
        acc[i] += v[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_common::Color;
    use vitrine_scene::{Fog, Geometry, Light, Node};

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::default().with_position(Vec3::new(0.0, 0.0, 5.0))
    }

    #[test]
    fn layouts_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 64);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 176);
        assert_eq!(std::mem::size_of::<Vertex>(), 44);
    }

    #[test]
    fn ambient_and_hemisphere_accumulate() {
        let mut scene = Scene::new();
        scene.add(Node::light("a", Light::ambient(0xffffffu32, 0.5)));
        scene.add(Node::light("b", Light::ambient(0xffffffu32, 0.25)));
        scene.add(Node::light(
            "hemi",
            Light::hemisphere(0xffffffu32, 0x000000u32, 2.0),
        ));
        let frame = FrameUniforms::new(&scene, &camera());
        assert!((frame.ambient[0] - 0.75).abs() < 1e-6);
        assert!((frame.sky[1] - 2.0).abs() < 1e-6);
        assert_eq!(frame.ground[2], 0.0);
        assert_eq!(frame.light_count[0], 0);
    }

    #[test]
    fn directional_points_toward_light() {
        let mut scene = Scene::new();
        scene.add(
            Node::light("sun", Light::directional(0xffffffu32, 1.5))
                .with_position(Vec3::new(0.0, 10.0, 0.0)),
        );
        let frame = FrameUniforms::new(&scene, &camera());
        assert_eq!(frame.light_count[0], 1);
        let light = frame.lights[0];
        assert_eq!(light.position[3], KIND_DIRECTIONAL);
        assert_eq!(&light.direction[..3], &[0.0, 1.0, 0.0]);
        assert!((light.color[0] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn spot_cone_cosines() {
        let mut scene = Scene::new();
        let mut spot = Light::spot(0xffffffu32, 1.0);
        if let LightKind::Spot {
            angle, penumbra, ..
        } = &mut spot.kind
        {
            *angle = std::f32::consts::FRAC_PI_3;
            *penumbra = 0.5;
        }
        scene.add(Node::light("spot", spot).with_position(Vec3::new(0.0, 5.0, 0.0)));
        let light = FrameUniforms::new(&scene, &camera()).lights[0];
        assert!((light.cone[0] - 0.5).abs() < 1e-6);
        assert!((light.cone[1] - std::f32::consts::FRAC_PI_6.cos()).abs() < 1e-6);
        assert!(light.cone[1] > light.cone[0]);
    }

    #[test]
    fn extra_lights_are_dropped() {
        let mut scene = Scene::new();
        for i in 0..MAX_LIGHTS + 3 {
            scene.add(Node::light(
                format!("p{i}"),
                Light::point(0xffffffu32, 1.0, 0.0, 2.0),
            ));
        }
        let frame = FrameUniforms::new(&scene, &camera());
        assert_eq!(frame.light_count[0] as usize, MAX_LIGHTS);
        assert_eq!(frame.lights[0].color[3], 2.0);
    }

    #[test]
    fn hidden_lights_are_skipped() {
        let mut scene = Scene::new();
        scene.add(Node::light("sun", Light::directional(0xffffffu32, 1.0)).hidden());
        assert_eq!(FrameUniforms::new(&scene, &camera()).light_count[0], 0);
    }

    #[test]
    fn fog_and_tone_mapping_flags() {
        let mut scene = Scene::new();
        let frame = FrameUniforms::new(&scene, &camera());
        assert_eq!(frame.fog_color[3], 0.0);
        assert_eq!(frame.fog_tone[2], 0.0);

        scene.fog = Some(Fog {
            color: Color::WHITE,
            near: 0.0025,
            far: 90.0,
        });
        scene.tone_mapping = ToneMapping::Aces { exposure: 1.0 };
        let frame = FrameUniforms::new(&scene, &camera());
        assert_eq!(frame.fog_color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(&frame.fog_tone, &[0.0025, 90.0, 1.0, 1.0]);
    }

    #[test]
    fn draw_uniforms_pack_material() {
        let material = Material::standard(0xffffffu32).with_roughness(0.1);
        let world = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let draw = DrawUniforms::new(&material, world, true);
        assert_eq!(draw.params[0], 3.0);
        assert!((draw.params[1] - 0.1).abs() < 1e-6);
        assert_eq!(draw.flags[0], 1);
        // inverse transpose undoes the stretch on normals
        assert!((draw.normal[0][0] - 0.5).abs() < 1e-6);

        let points = Material::points(0.1).with_vertex_colors();
        let draw = DrawUniforms::new(&points, Mat4::IDENTITY, false);
        assert_eq!(draw.params[0], 5.0);
        assert!((draw.params[3] - 0.1).abs() < 1e-6);
        assert_eq!(draw.flags[1], 1);
    }

    #[test]
    fn missing_attributes_are_filled() {
        let geometry = Geometry::points(vec![[0.0; 3], [1.0, 2.0, 3.0]], None);
        let (vertices, indices) = mesh_vertices(&geometry.data);
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(vertices[1].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[1].color, [1.0, 1.0, 1.0]);
        assert_eq!(vertices[1].normal, [0.0, 1.0, 0.0]);

        let cube = Geometry::cuboid(1.0, 1.0, 1.0);
        let (vertices, indices) = mesh_vertices(&cube.data);
        assert_eq!(vertices.len(), cube.data.vertex_count());
        assert_eq!(indices.len(), 36);
    }

    #[test]
    fn stride_rounds_up() {
        assert_eq!(aligned_stride(176, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(257, 256), 512);
        assert_eq!(aligned_stride(10, 0), 10);
    }
}
