use crate::geometry::Geometry;
use crate::light::{Fog, Light, ToneMapping};
use crate::material::{Material, Texture};
use glam::{Mat4, Vec3};
use slotmap::{SlotMap, new_key_type};
use vitrine_common::{Color, Transform};

new_key_type! {
    /// Handle to a node in a [`Scene`].
    pub struct NodeId;
    /// Handle to a geometry owned by a [`Scene`].
    pub struct GeometryId;
    /// Handle to a texture owned by a [`Scene`].
    pub struct TextureId;
}

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("geometry {0:?} not found")]
    GeometryNotFound(GeometryId),
    #[error("texture {0:?} not found")]
    TextureNotFound(TextureId),
    #[error("the scene root cannot be detached")]
    DetachRoot,
}

/// What a node draws or emits.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload {
    Group,
    Mesh {
        geometry: GeometryId,
        material: Material,
        cast_shadow: bool,
        receive_shadow: bool,
    },
    Points {
        geometry: GeometryId,
        material: Material,
    },
    Lines {
        geometry: GeometryId,
    },
    Light(Light),
}

/// A scene graph node.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub payload: NodePayload,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn with_payload(name: impl Into<String>, payload: NodePayload) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            visible: true,
            payload,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::with_payload(name, NodePayload::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: GeometryId, material: Material) -> Self {
        Self::with_payload(
            name,
            NodePayload::Mesh {
                geometry,
                material,
                cast_shadow: false,
                receive_shadow: false,
            },
        )
    }

    pub fn points(name: impl Into<String>, geometry: GeometryId, material: Material) -> Self {
        Self::with_payload(name, NodePayload::Points { geometry, material })
    }

    pub fn lines(name: impl Into<String>, geometry: GeometryId) -> Self {
        Self::with_payload(name, NodePayload::Lines { geometry })
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::with_payload(name, NodePayload::Light(light))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set cast/receive shadow flags. No-op on non-mesh payloads.
    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.set_shadows(cast, receive);
        self
    }

    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        if let NodePayload::Mesh {
            cast_shadow,
            receive_shadow,
            ..
        } = &mut self.payload
        {
            *cast_shadow = cast;
            *receive_shadow = receive;
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn geometry(&self) -> Option<GeometryId> {
        match &self.payload {
            NodePayload::Mesh { geometry, .. }
            | NodePayload::Points { geometry, .. }
            | NodePayload::Lines { geometry } => Some(*geometry),
            NodePayload::Group | NodePayload::Light(_) => None,
        }
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.payload {
            NodePayload::Mesh { material, .. } | NodePayload::Points { material, .. } => {
                Some(material)
            }
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.payload {
            NodePayload::Mesh { material, .. } | NodePayload::Points { material, .. } => {
                Some(material)
            }
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.payload {
            NodePayload::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.payload {
            NodePayload::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.payload, NodePayload::Mesh { .. })
    }
}

/// A drawable node resolved to its world matrix.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub node: NodeId,
    pub world: Mat4,
}

/// A light resolved to world space.
#[derive(Debug, Clone, Copy)]
pub struct LightItem {
    pub node: NodeId,
    pub position: Vec3,
    pub light: Light,
}

/// Geometry slot with a revision counter bumped on replacement.
#[derive(Debug, Clone)]
struct GeometrySlot {
    geometry: Geometry,
    revision: u64,
}

/// The scene graph.
///
/// Nodes live in an arena; every node except the root has exactly one parent
/// and children keep insertion order. Geometries and textures live in their
/// own arenas and are shared by handle.
///
/// # Invariants
/// - Detaching a node destroys its whole subtree; its ids stop resolving.
/// - The root can never be detached.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    geometries: SlotMap<GeometryId, GeometrySlot>,
    textures: SlotMap<TextureId, Texture>,
    pub background: Color,
    pub fog: Option<Fog>,
    pub tone_mapping: ToneMapping,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::group("scene"));
        Self {
            nodes,
            root,
            geometries: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            background: Color::BLACK,
            fog: None,
            tone_mapping: ToneMapping::None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a node directly under the root.
    pub fn add(&mut self, node: Node) -> NodeId {
        let root = self.root;
        self.attach(root, node)
    }

    /// Add a node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        Ok(self.attach(parent, node))
    }

    fn attach(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Remove a node and its subtree. Returns how many nodes were destroyed.
    pub fn detach(&mut self, id: NodeId) -> Result<usize, SceneError> {
        if id == self.root {
            return Err(SceneError::DetachRoot);
        }
        let parent = self
            .nodes
            .get(id)
            .ok_or(SceneError::NodeNotFound(id))?
            .parent;
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(p)) {
            p.children.retain(|c| *c != id);
        }
        let doomed = self.descendants(id);
        for n in &doomed {
            self.nodes.remove(*n);
        }
        tracing::debug!(removed = doomed.len(), "detached subtree");
        Ok(doomed.len())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children()).unwrap_or(&[])
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        node.transform = transform;
        Ok(())
    }

    /// `id` followed by every descendant, depth-first pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.nodes.get(n) else {
                continue;
            };
            out.push(n);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Visit `start` and its subtree depth-first, pre-order.
    pub fn traverse(&self, start: NodeId, mut visit: impl FnMut(NodeId, &Node)) {
        for id in self.descendants(start) {
            if let Some(node) = self.nodes.get(id) {
                visit(id, node);
            }
        }
    }

    /// First node with the given name, depth-first from the root.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.nodes[*id].name == name)
    }

    /// Leaf meshes under `start`. Interior nodes are descended into but never
    /// reported, even when they carry a mesh themselves.
    pub fn leaf_meshes(&self, start: NodeId) -> Vec<NodeId> {
        self.descendants(start)
            .into_iter()
            .filter(|id| {
                let node = &self.nodes[*id];
                node.children.is_empty() && node.is_mesh()
            })
            .collect()
    }

    /// Product of all transforms from the root down to `id`.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut m = self.nodes.get(id)?.transform.matrix();
        let mut cursor = self.nodes[id].parent;
        while let Some(p) = cursor {
            let parent = self.nodes.get(p)?;
            m = parent.transform.matrix() * m;
            cursor = parent.parent;
        }
        Some(m)
    }

    /// Visible drawables with their world matrices. A hidden node hides its
    /// whole subtree.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut out = Vec::new();
        self.walk_visible(self.root, Mat4::IDENTITY, &mut |id, node, world| {
            if node.geometry().is_some() {
                out.push(DrawItem { node: id, world });
            }
        });
        out
    }

    /// Visible lights with their world positions.
    pub fn lights(&self) -> Vec<LightItem> {
        let mut out = Vec::new();
        self.walk_visible(self.root, Mat4::IDENTITY, &mut |id, node, world| {
            if let Some(light) = node.as_light() {
                out.push(LightItem {
                    node: id,
                    position: world.w_axis.truncate(),
                    light: *light,
                });
            }
        });
        out
    }

    fn walk_visible(
        &self,
        id: NodeId,
        parent_world: Mat4,
        visit: &mut impl FnMut(NodeId, &Node, Mat4),
    ) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let world = parent_world * node.transform.matrix();
        visit(id, node, world);
        for child in &node.children {
            self.walk_visible(*child, world, visit);
        }
    }

    // --- Geometry ---

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.insert(GeometrySlot {
            geometry,
            revision: 0,
        })
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id).map(|s| &s.geometry)
    }

    /// Bumped every time the geometry is replaced.
    pub fn geometry_revision(&self, id: GeometryId) -> Option<u64> {
        self.geometries.get(id).map(|s| s.revision)
    }

    pub fn replace_geometry(
        &mut self,
        id: GeometryId,
        geometry: Geometry,
    ) -> Result<(), SceneError> {
        let slot = self
            .geometries
            .get_mut(id)
            .ok_or(SceneError::GeometryNotFound(id))?;
        slot.geometry = geometry;
        slot.revision += 1;
        Ok(())
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Geometry of the mesh/points/lines payload on `node`.
    pub fn node_geometry(&self, node: NodeId) -> Option<&Geometry> {
        self.get(node)?.geometry().and_then(|g| self.geometry(g))
    }

    // --- Texture ---

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.insert(texture)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id)
    }

    pub fn texture_mut(&mut self, id: TextureId) -> Option<&mut Texture> {
        self.textures.get_mut(id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureId, &Texture)> {
        self.textures.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn cube(scene: &mut Scene) -> GeometryId {
        scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0))
    }

    #[test]
    fn scene_starts_with_root_only() {
        let s = Scene::new();
        assert_eq!(s.node_count(), 1);
        assert!(s.children(s.root()).is_empty());
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut s = Scene::new();
        let a = s.add(Node::group("a"));
        let b = s.add(Node::group("b"));
        let c = s.add(Node::group("c"));
        assert_eq!(s.children(s.root()), &[a, b, c]);
        assert_eq!(s.get(b).unwrap().parent(), Some(s.root()));
    }

    #[test]
    fn detach_destroys_subtree() {
        let mut s = Scene::new();
        let g = cube(&mut s);
        let group = s.add(Node::group("dominos"));
        let child = s
            .add_child(group, Node::mesh("d0", g, Material::default()))
            .unwrap();
        let grandchild = s.add_child(child, Node::group("inner")).unwrap();
        let sibling = s.add(Node::group("arena"));

        assert_eq!(s.detach(group).unwrap(), 3);
        assert!(!s.contains(group));
        assert!(!s.contains(child));
        assert!(!s.contains(grandchild));
        assert!(s.contains(sibling));
        assert_eq!(s.children(s.root()), &[sibling]);
        // geometry is shared by handle and survives
        assert!(s.geometry(g).is_some());
    }

    #[test]
    fn detach_errors() {
        let mut s = Scene::new();
        let root = s.root();
        assert!(matches!(s.detach(root), Err(SceneError::DetachRoot)));
        let n = s.add(Node::group("x"));
        s.detach(n).unwrap();
        assert!(matches!(s.detach(n), Err(SceneError::NodeNotFound(_))));
        assert!(matches!(
            s.add_child(n, Node::group("y")),
            Err(SceneError::NodeNotFound(_))
        ));
    }

    #[test]
    fn find_by_name_depth_first() {
        let mut s = Scene::new();
        let outer = s.add(Node::group("outer"));
        let nested = s.add_child(outer, Node::group("target")).unwrap();
        s.add(Node::group("target"));
        assert_eq!(s.find_by_name("target"), Some(nested));
        assert_eq!(s.find_by_name("missing"), None);
    }

    #[test]
    fn leaf_meshes_skip_interior_nodes() {
        let mut s = Scene::new();
        let g = cube(&mut s);
        let parent_mesh = s.add(Node::mesh("parent", g, Material::default()));
        let leaf = s
            .add_child(parent_mesh, Node::mesh("leaf", g, Material::default()))
            .unwrap();
        s.add_child(parent_mesh, Node::group("empty")).unwrap();
        assert_eq!(s.leaf_meshes(s.root()), vec![leaf]);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut s = Scene::new();
        let parent = s.add(
            Node::group("p").with_transform(
                Transform::from_position(Vec3::new(1.0, 0.0, 0.0))
                    .with_scale(Vec3::splat(2.0)),
            ),
        );
        let child = s
            .add_child(parent, Node::group("c").with_position(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        let p = s.world_matrix(child).unwrap().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn hidden_nodes_hide_subtree() {
        let mut s = Scene::new();
        let g = cube(&mut s);
        let group = s.add(Node::group("g").hidden());
        s.add_child(group, Node::mesh("m", g, Material::default()))
            .unwrap();
        let shown = s.add(Node::mesh("shown", g, Material::default()));
        s.add_child(group, Node::light("l", Light::ambient(0xffffff, 1.0)))
            .unwrap();
        let draws = s.draw_list();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].node, shown);
        assert!(s.lights().is_empty());
    }

    #[test]
    fn lights_report_world_position() {
        let mut s = Scene::new();
        let parent = s.add(Node::group("rig").with_position(Vec3::new(0.0, 5.0, 0.0)));
        s.add_child(
            parent,
            Node::light("sun", Light::directional(0xffffff, 1.5))
                .with_transform(Transform::from_position(Vec3::new(0.0, 1.0, 4.0)).with_rotation(Quat::IDENTITY)),
        )
        .unwrap();
        let lights = s.lights();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].position, Vec3::new(0.0, 6.0, 4.0));
    }

    #[test]
    fn light_accessors_only_match_light_nodes() {
        let mut s = Scene::new();
        let g = cube(&mut s);
        let sun = s.add(Node::light("sun", Light::directional(0xffffff, 1.5)));
        let mesh = s.add(Node::mesh("m", g, Material::default()));

        s.get_mut(sun).unwrap().as_light_mut().unwrap().intensity = 3.0;
        assert_eq!(s.get(sun).unwrap().as_light().unwrap().intensity, 3.0);
        assert!(s.get(mesh).unwrap().as_light().is_none());
        assert!(s.get_mut(mesh).unwrap().as_light_mut().is_none());
    }

    #[test]
    fn replace_geometry_bumps_revision() {
        let mut s = Scene::new();
        let g = cube(&mut s);
        assert_eq!(s.geometry_revision(g), Some(0));
        s.replace_geometry(g, Geometry::cuboid(2.0, 2.0, 2.0)).unwrap();
        assert_eq!(s.geometry_revision(g), Some(1));
        assert_eq!(
            s.geometry(g).unwrap().box_half_extents(),
            Some(Vec3::ONE)
        );
    }

    #[test]
    fn shadow_flags_only_on_meshes() {
        let mut s = Scene::new();
        let g = cube(&mut s);
        let m = s.add(Node::mesh("m", g, Material::default()).with_shadows(true, true));
        match &s.get(m).unwrap().payload {
            NodePayload::Mesh {
                cast_shadow,
                receive_shadow,
                ..
            } => assert!(*cast_shadow && *receive_shadow),
            _ => panic!("expected mesh"),
        }
        let grp = Node::group("g").with_shadows(true, true);
        assert_eq!(grp.payload, NodePayload::Group);
    }
}
