use crate::AssetError;
use glam::{Quat, Vec3};
use std::path::Path;
use vitrine_common::{Color, Transform};
use vitrine_scene::{
    Geometry, GeometryShape, Material, MeshData, Node, NodeId, Scene, SceneError, Shading, Side,
    Texture, TextureImage,
};

#[derive(Debug, Clone)]
struct ImportedPrimitive {
    data: MeshData,
    color: Color,
    texture: Option<usize>,
    roughness: f32,
    metalness: f32,
    double_sided: bool,
}

#[derive(Debug, Clone)]
struct ImportedNode {
    name: String,
    transform: Transform,
    mesh: Option<usize>,
    children: Vec<usize>,
}

/// A glTF scene parsed into owned data, ready to splice into a [`Scene`].
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    pub name: String,
    nodes: Vec<ImportedNode>,
    roots: Vec<usize>,
    meshes: Vec<Vec<ImportedPrimitive>>,
    images: Vec<Option<TextureImage>>,
}

/// Read a `.gltf` or `.glb` file with its buffers and images.
pub fn import_gltf(path: &Path) -> Result<ImportedScene, AssetError> {
    let (document, buffers, images) = gltf::import(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "gltf".into());

    let images = images.into_iter().map(convert_image).collect();

    let meshes = document
        .meshes()
        .map(|mesh| {
            mesh.primitives()
                .filter(|p| p.mode() == gltf::mesh::Mode::Triangles)
                .filter_map(|primitive| import_primitive(&primitive, &buffers))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let nodes = document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            ImportedNode {
                name: node
                    .name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("node{}", node.index())),
                transform: Transform {
                    position: Vec3::from_array(t),
                    rotation: Quat::from_array(r),
                    scale: Vec3::from_array(s),
                },
                mesh: node.mesh().map(|m| m.index()),
                children: node.children().map(|c| c.index()).collect(),
            }
        })
        .collect();

    let roots = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .map(|scene| scene.nodes().map(|n| n.index()).collect())
        .unwrap_or_default();

    let imported = ImportedScene {
        name,
        nodes,
        roots,
        meshes,
        images,
    };
    tracing::debug!(
        name = %imported.name,
        nodes = imported.nodes.len(),
        meshes = imported.meshes.len(),
        "parsed glTF"
    );
    Ok(imported)
}

/// `None` for primitives without positions, which are skipped.
fn import_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Option<Result<ImportedPrimitive, AssetError>> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let count = positions.len();
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_else(|| (0..count as u32).collect());
    if let Err(e) = check_indices(&indices, count) {
        return Some(Err(e));
    }
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect::<Vec<_>>())
        .filter(|t| t.len() == count)
        .unwrap_or_else(|| vec![[0.0, 0.0]; count]);
    let mut data = MeshData {
        positions,
        normals: Vec::new(),
        uvs,
        colors: None,
        indices,
    };
    match reader
        .read_normals()
        .map(|n| n.collect::<Vec<_>>())
        .filter(|n| n.len() == count)
    {
        Some(normals) => data.normals = normals,
        None => data.compute_vertex_normals(),
    }

    let material = primitive.material();
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    Some(Ok(ImportedPrimitive {
        data,
        color: Color::from_linear([r, g, b]),
        texture: pbr
            .base_color_texture()
            .map(|info| info.texture().source().index()),
        roughness: pbr.roughness_factor(),
        metalness: pbr.metallic_factor(),
        double_sided: material.double_sided(),
    }))
}

fn check_indices(indices: &[u32], vertex_count: usize) -> Result<(), AssetError> {
    match indices.iter().find(|&&i| i as usize >= vertex_count) {
        Some(bad) => Err(AssetError::Mesh(format!(
            "index {bad} out of range for {vertex_count} vertices"
        ))),
        None => Ok(()),
    }
}

fn convert_image(data: gltf::image::Data) -> Option<TextureImage> {
    use gltf::image::Format;
    let channels = match data.format {
        Format::R8 => 1,
        Format::R8G8 => 2,
        Format::R8G8B8 => 3,
        Format::R8G8B8A8 => 4,
        other => {
            tracing::warn!(format = ?other, "unsupported glTF image format");
            return None;
        }
    };
    let rgba = data
        .pixels
        .chunks_exact(channels)
        .flat_map(|px| match px {
            [l] => [*l, *l, *l, 255],
            [l, a] => [*l, *l, *l, *a],
            [r, g, b] => [*r, *g, *b, 255],
            [r, g, b, a] => [*r, *g, *b, *a],
            _ => [0, 0, 0, 255],
        })
        .collect();
    Some(TextureImage {
        width: data.width,
        height: data.height,
        rgba,
    })
}

impl ImportedScene {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(Vec::len).sum()
    }

    /// Add the scene under `parent` as one group named after the file.
    /// Returns the group.
    pub fn instantiate(&self, scene: &mut Scene, parent: NodeId) -> Result<NodeId, SceneError> {
        let group = scene.add_child(parent, Node::group(self.name.clone()))?;
        let textures: Vec<_> = self
            .images
            .iter()
            .enumerate()
            .map(|(i, image)| {
                let name = format!("{}#{i}", self.name);
                image
                    .clone()
                    .map(|img| scene.add_texture(Texture::with_image(name, img)))
            })
            .collect();

        for &root in &self.roots {
            self.instantiate_node(scene, group, root, &textures, 0)?;
        }
        Ok(group)
    }

    fn instantiate_node(
        &self,
        scene: &mut Scene,
        parent: NodeId,
        index: usize,
        textures: &[Option<vitrine_scene::TextureId>],
        depth: usize,
    ) -> Result<(), SceneError> {
        // glTF forbids cycles; cap depth in case a file has one anyway
        let Some(node) = self.nodes.get(index).filter(|_| depth < 64) else {
            return Ok(());
        };
        let primitives = node.mesh.and_then(|m| self.meshes.get(m));

        let id = match primitives.map(Vec::as_slice) {
            Some([single]) => {
                let mesh = self.primitive_node(scene, &node.name, single, textures);
                scene.add_child(parent, mesh.with_transform(node.transform))?
            }
            Some(many) => {
                let id = scene.add_child(
                    parent,
                    Node::group(node.name.clone()).with_transform(node.transform),
                )?;
                for (i, p) in many.iter().enumerate() {
                    let mesh = self.primitive_node(scene, &format!("{}.{i}", node.name), p, textures);
                    scene.add_child(id, mesh)?;
                }
                id
            }
            None => scene.add_child(
                parent,
                Node::group(node.name.clone()).with_transform(node.transform),
            )?,
        };

        for &child in &node.children {
            self.instantiate_node(scene, id, child, textures, depth + 1)?;
        }
        Ok(())
    }

    fn primitive_node(
        &self,
        scene: &mut Scene,
        name: &str,
        primitive: &ImportedPrimitive,
        textures: &[Option<vitrine_scene::TextureId>],
    ) -> Node {
        let geometry = scene.add_geometry(Geometry::new(
            GeometryShape::Imported,
            primitive.data.clone(),
        ));
        let mut material = Material::standard(primitive.color);
        material.shading = Shading::Standard {
            roughness: primitive.roughness,
            metalness: primitive.metalness,
        };
        material.map = primitive
            .texture
            .and_then(|i| textures.get(i).copied().flatten());
        if primitive.double_sided {
            material.side = Side::Double;
        }
        Node::mesh(name, geometry, material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_triangle(dir: &Path) -> std::path::PathBuf {
        write_indexed_triangle(dir, [0, 1, 2])
    }

    fn write_indexed_triangle(dir: &Path, indices: [u16; 3]) -> std::path::PathBuf {
        let mut bin = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in indices {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        std::fs::write(dir.join("tri.bin"), &bin).unwrap();

        let json = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [
                {"name": "house", "translation": [1, 2, 3], "children": [1]},
                {"name": "roof", "mesh": 0, "scale": [2, 2, 2]}
            ],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]}],
            "materials": [{"pbrMetallicRoughness": {"baseColorFactor": [1, 0, 0, 1], "roughnessFactor": 0.5}, "doubleSided": true}],
            "buffers": [{"uri": "tri.bin", "byteLength": 42}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0]},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ]
        }"#;
        let path = dir.join("house.gltf");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn imports_hierarchy_and_material() {
        let dir = tempfile::tempdir().unwrap();
        let imported = import_gltf(&write_triangle(dir.path())).unwrap();
        assert_eq!(imported.name, "house");
        assert_eq!(imported.node_count(), 2);
        assert_eq!(imported.primitive_count(), 1);

        let mut scene = Scene::new();
        let root = scene.root();
        let group = imported.instantiate(&mut scene, root).unwrap();
        assert_eq!(scene.get(group).unwrap().name, "house");

        let house = scene.children(group)[0];
        assert_eq!(
            scene.get(house).unwrap().transform.position,
            Vec3::new(1.0, 2.0, 3.0)
        );
        let roof = scene.find_by_name("roof").unwrap();
        let node = scene.get(roof).unwrap();
        assert_eq!(node.transform.scale, Vec3::splat(2.0));
        let material = node.material().unwrap();
        assert_eq!(material.side, Side::Double);
        assert_eq!(material.color.to_hex(), 0xff0000);
        assert!(matches!(material.shading, Shading::Standard { roughness, .. } if roughness == 0.5));

        let geometry = scene.node_geometry(roof).unwrap();
        assert_eq!(geometry.data.triangle_count(), 1);
        // normals were generated
        assert_eq!(geometry.data.normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_indexed_triangle(dir.path(), [0, 1, 7]);
        assert!(import_gltf(&path).is_err());

        assert!(check_indices(&[0, 1, 2], 3).is_ok());
        assert!(matches!(check_indices(&[0, 3], 3), Err(AssetError::Mesh(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(import_gltf(&dir.path().join("nope.gltf")).is_err());
    }
}
