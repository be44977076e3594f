use crate::demo::{AnimateCtx, AnimateFn, DemoSetup};
use vitrine_common::Viewport;
use vitrine_input::{PointerEvent, PointerInput};
use vitrine_physics::PhysicsWorld;
use vitrine_render::{OrbitController, PerspectiveCamera, Renderer};
use vitrine_scene::Scene;
use vitrine_tools::{ControlPanel, FrameStats};

/// The per-frame driver of one mounted demo.
///
/// A tick runs, in order: pointer input into the orbit controller, the
/// demo's animation callback, one fixed physics step, body-to-node sync,
/// one draw. There is no catch-up: a late refresh simply produces a later
/// frame.
pub struct FrameLoop {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controller: Option<OrbitController>,
    pub physics: Option<PhysicsWorld>,
    pub controls: ControlPanel,
    input: PointerInput,
    animate: Option<AnimateFn>,
    viewport: Viewport,
    stats: FrameStats,
    frame: u64,
}

impl std::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("frame", &self.frame)
            .field("viewport", &self.viewport)
            .field("nodes", &self.scene.node_count())
            .field("physics", &self.physics.is_some())
            .finish()
    }
}

impl FrameLoop {
    pub fn new(setup: DemoSetup, viewport: Viewport) -> Self {
        let mut camera = setup.camera;
        camera.set_viewport(viewport);
        Self {
            scene: setup.scene,
            camera,
            controller: setup.controller,
            physics: setup.physics,
            controls: setup.controls,
            input: PointerInput::new(),
            animate: setup.animate,
            viewport,
            stats: FrameStats::new(),
            frame: 0,
        }
    }

    /// Frames drawn so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Queue a pointer event for the next tick.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.input.handle(event);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.set_viewport(viewport);
    }

    pub fn tick<R: Renderer>(&mut self, now_ms: f64, renderer: &mut R) -> R::Output {
        let _span = tracing::trace_span!("tick", frame = self.frame).entered();

        let actions = self.input.drain();
        if let Some(controller) = self.controller.as_mut() {
            for action in actions {
                controller.apply(action, &self.camera, self.viewport);
            }
            controller.update(&mut self.camera);
        }

        let changed = self.controls.take_changes();
        if let Some(animate) = self.animate.as_mut() {
            animate(&mut AnimateCtx {
                scene: &mut self.scene,
                camera: &mut self.camera,
                physics: self.physics.as_mut(),
                controls: &self.controls,
                changed: &changed,
                now_ms,
                frame: self.frame,
            });
        }

        if let Some(physics) = self.physics.as_mut() {
            physics.step();
            let synced = physics.sync(&mut self.scene);
            tracing::trace!(synced, "bodies synced");
        }

        let output = renderer.render(&self.scene, &self.camera);
        self.stats.record(now_ms);
        self.frame += 1;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec2, Vec3};
    use vitrine_input::PointerButton;
    use vitrine_physics::BodyKind;
    use vitrine_scene::{Geometry, Material, Node, NodeId};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records what each draw saw.
    #[derive(Default)]
    struct Recorder {
        draws: Vec<(u64, Vec3)>,
        watch: Option<NodeId>,
    }

    impl Renderer for Recorder {
        type Output = ();

        fn resize(&mut self, _viewport: Viewport) {}

        fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
            let pos = self
                .watch
                .and_then(|id| scene.get(id))
                .map_or(camera.position, |n| n.transform.position);
            self.draws.push((self.draws.len() as u64, pos));
        }
    }

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0).with_position(Vec3::new(0.0, 0.0, 5.0));
        camera.look_at(Vec3::ZERO);
        camera
    }

    #[test]
    fn one_draw_per_tick_after_animation() {
        let mut scene = Scene::new();
        let cube = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let id = scene.add(Node::mesh("cube", cube, Material::basic(0x00ff00u32)));
        let setup = DemoSetup::new(scene, camera()).with_animation(move |ctx| {
            if let Some(node) = ctx.scene.get_mut(id) {
                node.transform.position.x += 1.0;
            }
        });
        let mut frame_loop = FrameLoop::new(setup, Viewport::new(800, 600));
        let mut recorder = Recorder {
            watch: Some(id),
            ..Recorder::default()
        };
        for i in 0..3 {
            frame_loop.tick(i as f64 * 16.0, &mut recorder);
        }
        // the draw sees the animation of its own tick
        let xs: Vec<f32> = recorder.draws.iter().map(|(_, p)| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert_eq!(frame_loop.frame(), 3);
        assert_eq!(frame_loop.stats().frames(), 3);
    }

    #[test]
    fn nodes_mirror_bodies_exactly_each_tick() {
        let mut scene = Scene::new();
        let tile = scene.add_geometry(Geometry::cuboid(0.05, 0.5, 0.2));
        let node = scene.add(
            Node::mesh("domino", tile, Material::standard(0xf8fafcu32))
                .with_position(Vec3::new(0.0, 0.5, 0.0)),
        );
        if let Some(n) = scene.get_mut(node) {
            n.transform.rotation = Quat::from_rotation_z(0.2);
        }
        let mut physics = PhysicsWorld::new(Vec3::new(0.0, -9.8, 0.0));
        let body = physics.attach_box(&scene, node, BodyKind::Dynamic).unwrap();
        let setup = DemoSetup::new(scene, camera()).with_physics(physics);
        let mut frame_loop = FrameLoop::new(setup, Viewport::default());
        let mut recorder = Recorder::default();
        for i in 0..20 {
            frame_loop.tick(i as f64, &mut recorder);
            let physics = frame_loop.physics.as_ref().unwrap();
            let (pos, rot) = physics.body_pose(body).unwrap();
            let t = frame_loop.scene.get(node).unwrap().transform;
            assert_eq!(t.position, pos);
            assert_eq!(t.rotation, rot);
        }
        assert_eq!(frame_loop.physics.as_ref().unwrap().step_count(), 20);
        assert!(frame_loop.scene.get(node).unwrap().transform.position.y < 0.5);
    }

    #[test]
    fn damping_keeps_easing_after_input_stops() {
        let setup = DemoSetup::new(Scene::new(), camera()).with_controller(OrbitController::damped());
        let mut frame_loop = FrameLoop::new(setup, Viewport::new(800, 600));
        let mut recorder = Recorder::default();

        frame_loop.handle_pointer(PointerEvent::Moved(Vec2::new(100.0, 100.0)));
        frame_loop.handle_pointer(PointerEvent::Down(PointerButton::Primary));
        frame_loop.handle_pointer(PointerEvent::Moved(Vec2::new(200.0, 100.0)));
        frame_loop.handle_pointer(PointerEvent::Up(PointerButton::Primary));
        frame_loop.tick(0.0, &mut recorder);

        let mut steps = Vec::new();
        let mut last = frame_loop.camera.position;
        for i in 1..200 {
            frame_loop.tick(i as f64 * 16.0, &mut recorder);
            steps.push(frame_loop.camera.position.distance(last));
            last = frame_loop.camera.position;
        }
        assert!(steps[0] > 1e-3, "no motion after input stopped");
        assert!(steps[10] < steps[0]);
        assert!(steps[198] < 1e-4);
        // radius is preserved by a pure rotation
        assert!((frame_loop.camera.position.length() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn animation_sees_control_changes_once() {
        let mut controls = ControlPanel::new();
        controls.add_number("speed", 0.01, 0.0, 1.0, 0.01);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let setup = DemoSetup::new(Scene::new(), camera())
            .with_controls(controls)
            .with_animation(move |ctx| log.borrow_mut().push(ctx.changed("speed")));
        let mut frame_loop = FrameLoop::new(setup, Viewport::default());
        let mut recorder = Recorder::default();

        frame_loop.tick(0.0, &mut recorder);
        frame_loop.controls.set_number("speed", 0.5).unwrap();
        frame_loop.tick(16.0, &mut recorder);
        frame_loop.tick(32.0, &mut recorder);
        assert_eq!(*seen.borrow(), vec![false, true, false]);
    }

    #[test]
    fn viewport_sets_camera_aspect() {
        let setup = DemoSetup::new(Scene::new(), camera());
        let mut frame_loop = FrameLoop::new(setup, Viewport::new(1000, 500));
        assert_eq!(frame_loop.camera.aspect, 2.0);
        frame_loop.set_viewport(Viewport::new(300, 600));
        assert_eq!(frame_loop.camera.aspect, 0.5);
    }
}
