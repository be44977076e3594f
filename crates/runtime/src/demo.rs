use std::path::Path;
use vitrine_assets::{AssetError, AssetLoader};
use vitrine_common::Viewport;
use vitrine_physics::{PhysicsError, PhysicsWorld};
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_scene::{Scene, SceneError};
use vitrine_tools::{ControlError, ControlPanel};

/// Errors raised while building a demo.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("physics error: {0}")]
    Physics(#[from] PhysicsError),
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("control error: {0}")]
    Control(#[from] ControlError),
    #[error("unknown demo {0:?}")]
    Unknown(String),
}

/// What a demo's animation callback may touch on each tick.
pub struct AnimateCtx<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut PerspectiveCamera,
    pub physics: Option<&'a mut PhysicsWorld>,
    pub controls: &'a ControlPanel,
    /// Control keys edited since the previous tick.
    pub changed: &'a [String],
    /// Refresh timestamp in milliseconds.
    pub now_ms: f64,
    pub frame: u64,
}

impl AnimateCtx<'_> {
    pub fn changed(&self, key: &str) -> bool {
        self.changed.iter().any(|k| k == key)
    }
}

pub type AnimateFn = Box<dyn FnMut(&mut AnimateCtx<'_>)>;

/// Everything a mounted demo runs with.
pub struct DemoSetup {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controller: Option<OrbitController>,
    pub physics: Option<PhysicsWorld>,
    pub controls: ControlPanel,
    pub animate: Option<AnimateFn>,
}

impl std::fmt::Debug for DemoSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoSetup")
            .field("nodes", &self.scene.node_count())
            .field("camera", &self.camera)
            .field("controller", &self.controller.is_some())
            .field("physics", &self.physics)
            .field("controls", &self.controls.len())
            .field("animate", &self.animate.is_some())
            .finish()
    }
}

impl DemoSetup {
    pub fn new(scene: Scene, camera: PerspectiveCamera) -> Self {
        Self {
            scene,
            camera,
            controller: None,
            physics: None,
            controls: ControlPanel::new(),
            animate: None,
        }
    }

    pub fn with_controller(mut self, controller: OrbitController) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn with_physics(mut self, physics: PhysicsWorld) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn with_controls(mut self, controls: ControlPanel) -> Self {
        self.controls = controls;
        self
    }

    pub fn with_animation(mut self, animate: impl FnMut(&mut AnimateCtx<'_>) + 'static) -> Self {
        self.animate = Some(Box::new(animate));
        self
    }
}

/// Handed to [`Demo::build`]: the initial viewport and a loader whose
/// completions are applied to this demo's scene while it stays mounted.
#[derive(Debug)]
pub struct DemoContext {
    pub viewport: Viewport,
    pub loader: AssetLoader,
}

impl DemoContext {
    pub fn new(assets_dir: &Path, viewport: Viewport) -> Self {
        Self {
            viewport,
            loader: AssetLoader::new(assets_dir),
        }
    }
}

/// One gallery page.
pub trait Demo {
    /// Stable identifier used on the command line.
    fn name(&self) -> &'static str;

    fn title(&self) -> &'static str {
        self.name()
    }

    /// Assemble the scene, camera and per-frame behavior.
    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError>;
}
