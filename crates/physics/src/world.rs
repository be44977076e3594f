use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;
use vitrine_scene::{NodeId, Scene};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PhysicsError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("node {0:?} has no box geometry")]
    NotABox(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Moves under gravity and drives its node.
    Dynamic,
    /// Never moves; only collides.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

/// A dynamic body and the node it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLink {
    pub body: BodyHandle,
    pub node: NodeId,
}

/// Owns every rapier set plus the body/node pairing.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    query: QueryPipeline,
    links: Vec<BodyLink>,
    steps: u64,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity())
            .field("bodies", &self.bodies.len())
            .field("links", &self.links.len())
            .field("steps", &self.steps)
            .finish()
    }
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query: QueryPipeline::new(),
            links: Vec::new(),
            steps: 0,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }

    /// Takes effect on the next step.
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = to_vector(gravity);
    }

    /// Fixed step length in seconds.
    pub fn timestep(&self) -> f32 {
        self.params.dt
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn links(&self) -> &[BodyLink] {
        &self.links
    }

    /// Create a body at the node's local pose with a cuboid collider
    /// matching the node's box geometry (times the node's scale).
    pub fn attach_box(
        &mut self,
        scene: &Scene,
        node: NodeId,
        kind: BodyKind,
    ) -> Result<BodyHandle, PhysicsError> {
        let n = scene.get(node).ok_or(PhysicsError::NodeNotFound(node))?;
        let half = scene
            .node_geometry(node)
            .and_then(|g| g.box_half_extents())
            .ok_or(PhysicsError::NotABox(node))?
            * n.transform.scale.abs();

        let t = n.transform.position;
        let r = n.transform.rotation;
        let position = Isometry::from_parts(
            Translation::new(t.x, t.y, t.z),
            UnitQuaternion::new_normalize(Quaternion::new(r.w, r.x, r.y, r.z)),
        );
        let builder = match kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .gravity_scale(1.0)
                .can_sleep(false)
                .ccd_enabled(false),
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
        };
        let handle = self.bodies.insert(builder.position(position).build());
        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        if kind == BodyKind::Dynamic {
            self.links.push(BodyLink {
                body: BodyHandle(handle),
                node,
            });
        }
        tracing::debug!(?node, ?kind, ?half, "attached box body");
        Ok(BodyHandle(handle))
    }

    /// Advance one fixed step under the current gravity.
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query),
            &(),
            &(),
        );
        self.steps += 1;
    }

    /// Copy every tracked body's pose onto its node. Returns how many nodes
    /// were written; links whose node is gone are skipped.
    pub fn sync(&self, scene: &mut Scene) -> usize {
        let mut written = 0;
        for link in &self.links {
            let Some((position, rotation)) = self.body_pose(link.body) else {
                continue;
            };
            let Some(node) = scene.get_mut(link.node) else {
                tracing::trace!(node = ?link.node, "skipping sync for missing node");
                continue;
            };
            node.transform.position = position;
            node.transform.rotation = rotation;
            written += 1;
        }
        written
    }

    pub fn body_pose(&self, body: BodyHandle) -> Option<(Vec3, Quat)> {
        let b = self.bodies.get(body.0)?;
        let t = b.translation();
        let q = b.rotation();
        Some((Vec3::new(t.x, t.y, t.z), Quat::from_xyzw(q.i, q.j, q.k, q.w)))
    }

    /// Half-extents of the body's first cuboid collider.
    pub fn collider_half_extents(&self, body: BodyHandle) -> Option<Vec3> {
        let b = self.bodies.get(body.0)?;
        let collider = self.colliders.get(*b.colliders().first()?)?;
        let cuboid = collider.shape().as_cuboid()?;
        let h = cuboid.half_extents;
        Some(Vec3::new(h.x, h.y, h.z))
    }
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}
