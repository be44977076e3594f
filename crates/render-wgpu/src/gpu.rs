use crate::shaders;
use crate::uniforms::{aligned_stride, mesh_vertices, DrawUniforms, FrameUniforms, Vertex};
use std::collections::HashMap;
use std::num::NonZeroU64;
use vitrine_render::PerspectiveCamera;
use vitrine_scene::{GeometryId, Material, NodePayload, Scene, Side, TextureId};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SIDES: [Side; 3] = [Side::Front, Side::Back, Side::Double];

/// Uploaded geometry, rebuilt when the scene bumps its revision.
struct GpuMesh {
    revision: u64,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_count: u32,
    index_count: u32,
}

struct GpuTexture {
    revision: u64,
    bind_group: wgpu::BindGroup,
}

#[derive(Clone, Copy)]
enum Pass {
    Mesh { side: Side, depth_write: bool },
    Lines,
    Points { depth_write: bool },
}

struct Draw {
    pass: Pass,
    geometry: GeometryId,
    map: Option<TextureId>,
    matcap: Option<TextureId>,
}

/// Draws a [`Scene`] into a color view with its own depth buffer.
///
/// GPU copies of geometries and textures are cached by handle and
/// refreshed when their revision changes.
pub struct WgpuRenderer {
    /// Indexed by `mesh_variant`.
    mesh_pipelines: Vec<wgpu::RenderPipeline>,
    line_pipeline: wgpu::RenderPipeline,
    /// Indexed by depth write.
    point_pipelines: [wgpu::RenderPipeline; 2],
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_stride: u64,
    draw_capacity: u64,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: wgpu::BindGroup,
    meshes: HashMap<GeometryId, GpuMesh>,
    textures: HashMap<TextureId, GpuTexture>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

fn mesh_variant(side: Side, depth_write: bool) -> usize {
    let side = SIDES.iter().position(|s| *s == side).unwrap_or(0);
    side * 2 + usize::from(depth_write)
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&<FrameUniforms as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
                },
                count: None,
            }],
        });
        let draw_stride = aligned_stride(
            std::mem::size_of::<DrawUniforms>() as u64,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );
        let draw_capacity = 64;
        let (draw_buffer, draw_bind_group) =
            Self::create_draw_buffer(device, &draw_layout, draw_stride, draw_capacity);

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let white = Self::create_texture_bind_group(
            device,
            queue,
            &texture_layout,
            &sampler,
            "white_texture",
            1,
            1,
            &[255; 4],
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout, &texture_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let builder = PipelineBuilder {
            device,
            layout: &pipeline_layout,
            shader: &shader,
            format: surface_format,
        };
        let mut mesh_pipelines = Vec::with_capacity(SIDES.len() * 2);
        for side in SIDES {
            let cull_mode = match side {
                Side::Front => Some(wgpu::Face::Back),
                Side::Back => Some(wgpu::Face::Front),
                Side::Double => None,
            };
            for depth_write in [false, true] {
                mesh_pipelines.push(builder.build(
                    "mesh_pipeline",
                    ("vs_mesh", "fs_mesh"),
                    wgpu::VertexStepMode::Vertex,
                    wgpu::PrimitiveTopology::TriangleList,
                    cull_mode,
                    depth_write,
                ));
            }
        }
        let line_pipeline = builder.build(
            "line_pipeline",
            ("vs_line", "fs_flat"),
            wgpu::VertexStepMode::Vertex,
            wgpu::PrimitiveTopology::LineList,
            None,
            true,
        );
        let point_pipelines = [false, true].map(|depth_write| {
            builder.build(
                "points_pipeline",
                ("vs_points", "fs_flat"),
                wgpu::VertexStepMode::Instance,
                wgpu::PrimitiveTopology::TriangleList,
                None,
                depth_write,
            )
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            mesh_pipelines,
            line_pipeline,
            point_pipelines,
            frame_buffer,
            frame_bind_group,
            draw_layout,
            draw_buffer,
            draw_bind_group,
            draw_stride,
            draw_capacity,
            texture_layout,
            sampler,
            white,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Render one frame of `scene` seen through `camera` into `view`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(scene, camera)),
        );

        self.evict(scene);

        let line_material = Material::line();
        let mut draws = Vec::new();
        let mut uniforms = Vec::new();
        for item in scene.draw_list() {
            let Some(node) = scene.get(item.node) else {
                continue;
            };
            let (geometry, material, pass) = match &node.payload {
                NodePayload::Mesh {
                    geometry, material, ..
                } => (
                    *geometry,
                    material,
                    Pass::Mesh {
                        side: material.side,
                        depth_write: material.depth_write,
                    },
                ),
                NodePayload::Points { geometry, material } => (
                    *geometry,
                    material,
                    Pass::Points {
                        depth_write: material.depth_write,
                    },
                ),
                NodePayload::Lines { geometry } => (*geometry, &line_material, Pass::Lines),
                NodePayload::Group | NodePayload::Light(_) => continue,
            };
            if !self.upload_mesh(device, scene, geometry) {
                continue;
            }
            let map = material.map.filter(|id| self.upload_texture(device, queue, scene, *id));
            let matcap = material
                .matcap
                .filter(|id| self.upload_texture(device, queue, scene, *id));
            uniforms.push(DrawUniforms::new(material, item.world, map.is_some()));
            draws.push(Draw {
                pass,
                geometry,
                map,
                matcap,
            });
        }

        self.write_draw_uniforms(device, queue, &uniforms);

        let bg = scene.background.to_linear();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(bg[0]),
                            g: f64::from(bg[1]),
                            b: f64::from(bg[2]),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (i, draw) in draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&draw.geometry) else {
                    continue;
                };
                let offset = (i as u64 * self.draw_stride) as u32;
                pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                pass.set_bind_group(2, self.texture_bind_group(draw.map), &[]);
                pass.set_bind_group(3, self.texture_bind_group(draw.matcap), &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                match draw.pass {
                    Pass::Mesh { side, depth_write } => {
                        pass.set_pipeline(&self.mesh_pipelines[mesh_variant(side, depth_write)]);
                        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                    }
                    Pass::Lines => {
                        pass.set_pipeline(&self.line_pipeline);
                        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                    }
                    Pass::Points { depth_write } => {
                        pass.set_pipeline(&self.point_pipelines[usize::from(depth_write)]);
                        pass.draw(0..6, 0..mesh.vertex_count);
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn texture_bind_group(&self, id: Option<TextureId>) -> &wgpu::BindGroup {
        id.and_then(|id| self.textures.get(&id))
            .map_or(&self.white, |t| &t.bind_group)
    }

    /// Drop GPU copies whose scene entries are gone.
    fn evict(&mut self, scene: &Scene) {
        self.meshes.retain(|id, _| scene.geometry(*id).is_some());
        self.textures.retain(|id, _| scene.texture(*id).is_some());
    }

    /// Returns false when there is nothing to draw for `id`.
    fn upload_mesh(&mut self, device: &wgpu::Device, scene: &Scene, id: GeometryId) -> bool {
        let (Some(geometry), Some(revision)) = (scene.geometry(id), scene.geometry_revision(id))
        else {
            return false;
        };
        if self.meshes.get(&id).is_some_and(|m| m.revision == revision) {
            return true;
        }
        let (vertices, indices) = mesh_vertices(&geometry.data);
        if vertices.is_empty() {
            self.meshes.remove(&id);
            return false;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        tracing::trace!(vertices = vertices.len(), revision, "uploaded geometry");
        self.meshes.insert(
            id,
            GpuMesh {
                revision,
                vertex_buffer,
                index_buffer,
                vertex_count: vertices.len() as u32,
                index_count: indices.len() as u32,
            },
        );
        true
    }

    /// Returns false while the texture has no pixels yet.
    fn upload_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        id: TextureId,
    ) -> bool {
        let Some(texture) = scene.texture(id) else {
            return false;
        };
        let Some(image) = texture.image() else {
            return false;
        };
        if self
            .textures
            .get(&id)
            .is_some_and(|t| t.revision == texture.revision())
        {
            return true;
        }
        let bind_group = Self::create_texture_bind_group(
            device,
            queue,
            &self.texture_layout,
            &self.sampler,
            &texture.name,
            image.width,
            image.height,
            &image.rgba,
        );
        tracing::debug!(
            texture = %texture.name,
            width = image.width,
            height = image.height,
            "uploaded texture"
        );
        self.textures.insert(
            id,
            GpuTexture {
                revision: texture.revision(),
                bind_group,
            },
        );
        true
    }

    fn write_draw_uniforms(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, draws: &[DrawUniforms]) {
        if draws.is_empty() {
            return;
        }
        let needed = draws.len() as u64;
        if needed > self.draw_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) =
                Self::create_draw_buffer(device, &self.draw_layout, self.draw_stride, capacity);
            self.draw_buffer = buffer;
            self.draw_bind_group = bind_group;
            self.draw_capacity = capacity;
        }
        let stride = self.draw_stride as usize;
        let mut bytes = vec![0u8; stride * draws.len()];
        for (chunk, draw) in bytes.chunks_exact_mut(stride).zip(draws) {
            let src = bytemuck::bytes_of(draw);
            chunk[..src.len()].copy_from_slice(src);
        }
        queue.write_buffer(&self.draw_buffer, 0, &bytes);
    }

    fn create_draw_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniforms"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    #[allow(clippy::too_many_arguments)]
    fn create_texture_bind_group(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> wgpu::BindGroup {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );
        let view = texture.create_view(&Default::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    format: wgpu::TextureFormat,
}

impl PipelineBuilder<'_> {
    fn build(
        &self,
        label: &str,
        (vs, fs): (&str, &str),
        step_mode: wgpu::VertexStepMode,
        topology: wgpu::PrimitiveTopology,
        cull_mode: Option<wgpu::Face>,
        depth_write: bool,
    ) -> wgpu::RenderPipeline {
        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(self.layout),
            vertex: wgpu::VertexState {
                module: self.shader,
                entry_point: Some(vs),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2,
                        3 => Float32x3,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: self.shader,
                entry_point: Some(fs),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                cull_mode,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_write,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_variants_are_distinct() {
        let mut seen = Vec::new();
        for side in SIDES {
            for depth_write in [false, true] {
                seen.push(mesh_variant(side, depth_write));
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..6).collect::<Vec<_>>());
    }
}
