use std::fmt::Write;
use vitrine_scene::{LightKind, NodeId, NodePayload, Scene};

/// Scene inspector for developer tooling.
///
/// Read-only queries against a scene for debugging and development UI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let mut summary = SceneSummary {
            nodes: scene.node_count(),
            geometries: scene.geometry_count(),
            textures: scene.texture_count(),
            textures_loaded: scene
                .textures()
                .filter(|(_, t)| t.image().is_some())
                .count(),
            ..SceneSummary::default()
        };
        scene.traverse(scene.root(), |id, node| {
            match &node.payload {
                NodePayload::Group => summary.groups += 1,
                NodePayload::Mesh { .. } => {
                    summary.meshes += 1;
                    if let Some(g) = scene.node_geometry(id) {
                        summary.triangles += g.data.triangle_count();
                    }
                }
                NodePayload::Points { .. } => summary.points += 1,
                NodePayload::Lines { .. } => summary.lines += 1,
                NodePayload::Light(_) => summary.lights += 1,
            }
        });
        summary
    }

    pub fn inspect_node(scene: &Scene, id: NodeId) -> Option<NodeInfo> {
        scene.get(id).map(|node| {
            let p = node.transform.position;
            let r = node.transform.rotation;
            let s = node.transform.scale;
            NodeInfo {
                id,
                name: node.name.clone(),
                kind: kind_label(&node.payload),
                visible: node.visible,
                position: [p.x, p.y, p.z],
                rotation: [r.x, r.y, r.z, r.w],
                scale: [s.x, s.y, s.z],
                children: node.children().len(),
            }
        })
    }

    /// Indented dump of the whole graph, one node per line.
    pub fn tree(scene: &Scene) -> String {
        let mut out = String::new();
        Self::write_node(scene, scene.root(), 0, &mut out);
        out
    }

    fn write_node(scene: &Scene, id: NodeId, depth: usize, out: &mut String) {
        let Some(info) = Self::inspect_node(scene, id) else {
            return;
        };
        let _ = writeln!(out, "{:indent$}{info}", "", indent = depth * 2);
        for &child in scene.children(id) {
            Self::write_node(scene, child, depth + 1, out);
        }
    }
}

fn kind_label(payload: &NodePayload) -> &'static str {
    match payload {
        NodePayload::Group => "group",
        NodePayload::Mesh { .. } => "mesh",
        NodePayload::Points { .. } => "points",
        NodePayload::Lines { .. } => "lines",
        NodePayload::Light(light) => match light.kind {
            LightKind::Ambient => "ambient light",
            LightKind::Hemisphere { .. } => "hemisphere light",
            LightKind::Directional { .. } => "directional light",
            LightKind::Point { .. } => "point light",
            LightKind::Spot { .. } => "spot light",
        },
    }
}

/// Summary of scene contents for the inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneSummary {
    pub nodes: usize,
    pub groups: usize,
    pub meshes: usize,
    pub points: usize,
    pub lines: usize,
    pub lights: usize,
    pub geometries: usize,
    pub textures: usize,
    pub textures_loaded: usize,
    pub triangles: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} meshes={} points={} lines={} lights={} geometries={} textures={}/{} triangles={}",
            self.nodes,
            self.meshes,
            self.points,
            self.lines,
            self.lights,
            self.geometries,
            self.textures_loaded,
            self.textures,
            self.triangles
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub visible: bool,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub children: usize,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}{}) pos=({:.2}, {:.2}, {:.2})",
            self.name,
            self.kind,
            if self.visible { "" } else { ", hidden" },
            self.position[0],
            self.position[1],
            self.position[2],
        )?;
        if self.scale != [1.0; 3] {
            write!(
                f,
                " scale=({:.2}, {:.2}, {:.2})",
                self.scale[0], self.scale[1], self.scale[2]
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use vitrine_scene::{Geometry, Light, Material, Node, Texture};

    fn sample() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let cube = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let group = scene.add(Node::group("table"));
        let top = scene
            .add_child(
                group,
                Node::mesh("top", cube, Material::standard(0xffffffu32))
                    .with_position(Vec3::new(1.0, 2.0, 3.0)),
            )
            .unwrap();
        scene.add(Node::light("sun", Light::directional(0xffffffu32, 1.5)));
        scene.add_texture(Texture::empty("pending.png"));
        (scene, top)
    }

    #[test]
    fn summary_empty_scene() {
        let summary = SceneInspector::summary(&Scene::new());
        assert_eq!(summary.nodes, 1);
        assert_eq!(summary.groups, 1);
        assert_eq!(summary.meshes, 0);
    }

    #[test]
    fn summary_counts_payloads() {
        let (scene, _) = sample();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.nodes, 4);
        assert_eq!(summary.meshes, 1);
        assert_eq!(summary.lights, 1);
        assert_eq!(summary.triangles, 12);
        assert_eq!((summary.textures_loaded, summary.textures), (0, 1));
        assert!(summary.to_string().contains("textures=0/1"));
    }

    #[test]
    fn inspect_node_found_and_missing() {
        let (mut scene, top) = sample();
        let info = SceneInspector::inspect_node(&scene, top).unwrap();
        assert_eq!(info.position, [1.0, 2.0, 3.0]);
        assert_eq!(info.kind, "mesh");
        scene.detach(top).unwrap();
        assert!(SceneInspector::inspect_node(&scene, top).is_none());
    }

    #[test]
    fn tree_is_indented() {
        let (scene, _) = sample();
        let tree = SceneInspector::tree(&scene);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("scene (group)"));
        assert!(lines[1].starts_with("  table (group)"));
        assert!(lines[2].starts_with("    top (mesh)"));
        assert!(lines[3].starts_with("  sun (directional light)"));
    }
}
