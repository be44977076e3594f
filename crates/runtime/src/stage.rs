use crate::demo::{Demo, DemoContext, DemoError};
use crate::frame_loop::FrameLoop;
use std::path::{Path, PathBuf};
use vitrine_assets::AssetLoader;
use vitrine_common::Viewport;
use vitrine_render::Renderer;

struct Mounted {
    name: &'static str,
    frame_loop: FrameLoop,
    loader: AssetLoader,
}

/// Hosts at most one demo and forwards the host's refresh and resize
/// callbacks to it.
///
/// Teardown drops the demo's loop together with its loader, so loads still
/// running on workers find their channel closed and are discarded.
pub struct Stage {
    assets_dir: PathBuf,
    viewport: Viewport,
    mounted: Option<Mounted>,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("assets_dir", &self.assets_dir)
            .field("viewport", &self.viewport)
            .field("mounted", &self.mounted_name())
            .finish()
    }
}

impl Stage {
    pub fn new(assets_dir: impl Into<PathBuf>, viewport: Viewport) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            viewport,
            mounted: None,
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn mounted_name(&self) -> Option<&'static str> {
        self.mounted.as_ref().map(|m| m.name)
    }

    pub fn frame_loop(&self) -> Option<&FrameLoop> {
        self.mounted.as_ref().map(|m| &m.frame_loop)
    }

    pub fn frame_loop_mut(&mut self) -> Option<&mut FrameLoop> {
        self.mounted.as_mut().map(|m| &mut m.frame_loop)
    }

    /// Loads queued by the mounted demo and not yet applied.
    pub fn pending_loads(&self) -> usize {
        self.mounted.as_ref().map_or(0, |m| m.loader.pending())
    }

    /// Build `demo` and make it the one that refreshes. Any demo already
    /// mounted is torn down first, even if the build then fails.
    pub fn mount(&mut self, demo: &dyn Demo) -> Result<(), DemoError> {
        self.teardown();
        let mut ctx = DemoContext::new(&self.assets_dir, self.viewport);
        let setup = demo.build(&mut ctx)?;
        let frame_loop = FrameLoop::new(setup, self.viewport);
        tracing::info!(
            demo = demo.name(),
            nodes = frame_loop.scene.node_count(),
            loads = ctx.loader.pending(),
            "mounted demo"
        );
        self.mounted = Some(Mounted {
            name: demo.name(),
            frame_loop,
            loader: ctx.loader,
        });
        Ok(())
    }

    /// Apply finished loads, then run one tick. `None` when nothing is mounted.
    pub fn on_refresh<R: Renderer>(&mut self, now_ms: f64, renderer: &mut R) -> Option<R::Output> {
        let mounted = self.mounted.as_mut()?;
        let applied = mounted.loader.poll(&mut mounted.frame_loop.scene);
        if applied > 0 {
            tracing::debug!(demo = mounted.name, applied, "applied loaded assets");
        }
        Some(mounted.frame_loop.tick(now_ms, renderer))
    }

    /// Block until the mounted demo's loads are in, then apply them.
    pub fn finish_loads(&mut self) -> usize {
        match self.mounted.as_mut() {
            Some(m) => m.loader.wait_all(&mut m.frame_loop.scene),
            None => 0,
        }
    }

    pub fn on_resize<R: Renderer>(&mut self, width: u32, height: u32, renderer: &mut R) {
        let viewport = Viewport::new(width, height);
        self.viewport = viewport;
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.frame_loop.set_viewport(viewport);
        }
        renderer.resize(viewport);
        tracing::debug!(width = viewport.width, height = viewport.height, "resized");
    }

    /// Unmount the current demo. Returns whether one was mounted.
    pub fn teardown(&mut self) -> bool {
        let Some(mounted) = self.mounted.take() else {
            return false;
        };
        tracing::info!(
            demo = mounted.name,
            frames = mounted.frame_loop.frame(),
            abandoned_loads = mounted.loader.pending(),
            "tore down demo"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DemoSetup;
    use glam::Vec3;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use vitrine_render::PerspectiveCamera;
    use vitrine_scene::{Node, Scene};

    #[derive(Default)]
    struct CountingRenderer {
        draws: usize,
        viewport: Option<Viewport>,
    }

    impl Renderer for CountingRenderer {
        type Output = usize;

        fn resize(&mut self, viewport: Viewport) {
            self.viewport = Some(viewport);
        }

        fn render(&mut self, scene: &Scene, _camera: &PerspectiveCamera) -> usize {
            self.draws += 1;
            scene.node_count()
        }
    }

    struct Empty(&'static str);

    impl Demo for Empty {
        fn name(&self) -> &'static str {
            self.0
        }

        fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
            let camera = PerspectiveCamera::new(75.0, ctx.viewport.aspect(), 0.1, 100.0)
                .with_position(Vec3::new(0.0, 0.0, 5.0));
            Ok(DemoSetup::new(Scene::new(), camera))
        }
    }

    /// Queues one load of `file` that marks `applied` when its callback runs.
    struct Loading {
        file: &'static str,
        applied: Arc<AtomicBool>,
        parsed: Arc<AtomicUsize>,
    }

    impl Demo for Loading {
        fn name(&self) -> &'static str {
            "loading"
        }

        fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
            let applied = Arc::clone(&self.applied);
            let parsed = Arc::clone(&self.parsed);
            ctx.loader.load(
                self.file,
                move |path| {
                    let text = std::fs::read_to_string(path)?;
                    parsed.fetch_add(1, Ordering::SeqCst);
                    Ok(text)
                },
                move |scene: &mut Scene, text: String| {
                    scene.add(Node::group(text.trim()));
                    applied.store(true, Ordering::SeqCst);
                },
            );
            Ok(DemoSetup::new(Scene::new(), PerspectiveCamera::default()))
        }
    }

    struct Broken;

    impl Demo for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn build(&self, _ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
            Err(DemoError::Unknown("broken".into()))
        }
    }

    fn stage() -> Stage {
        Stage::new("assets", Viewport::new(800, 600))
    }

    #[test]
    fn refresh_without_demo_draws_nothing() {
        let mut stage = stage();
        let mut renderer = CountingRenderer::default();
        assert!(stage.on_refresh(0.0, &mut renderer).is_none());
        assert_eq!(renderer.draws, 0);
    }

    #[test]
    fn resize_updates_aspect_and_target() {
        let mut stage = stage();
        let mut renderer = CountingRenderer::default();
        stage.mount(&Empty("a")).unwrap();
        stage.on_resize(1920, 480, &mut renderer);
        assert_eq!(renderer.viewport, Some(Viewport::new(1920, 480)));
        assert_eq!(stage.frame_loop().unwrap().camera.aspect, 4.0);

        stage.on_resize(0, 0, &mut renderer);
        assert_eq!(renderer.viewport, Some(Viewport::new(1, 1)));
        assert_eq!(stage.frame_loop().unwrap().camera.aspect, 1.0);
    }

    #[test]
    fn mount_uses_current_viewport() {
        let mut stage = stage();
        let mut renderer = CountingRenderer::default();
        stage.on_resize(600, 300, &mut renderer);
        stage.mount(&Empty("a")).unwrap();
        assert_eq!(stage.frame_loop().unwrap().camera.aspect, 2.0);
    }

    #[test]
    fn no_draw_after_teardown() {
        let mut stage = stage();
        let mut renderer = CountingRenderer::default();
        stage.mount(&Empty("a")).unwrap();
        for i in 0..5 {
            assert_eq!(stage.on_refresh(i as f64, &mut renderer), Some(1));
        }
        assert!(stage.teardown());
        assert!(!stage.teardown());
        assert!(stage.on_refresh(10.0, &mut renderer).is_none());
        assert_eq!(renderer.draws, 5);
    }

    #[test]
    fn mounting_replaces_previous_demo() {
        let mut stage = stage();
        let mut renderer = CountingRenderer::default();
        stage.mount(&Empty("a")).unwrap();
        stage.on_refresh(0.0, &mut renderer);
        stage.mount(&Empty("b")).unwrap();
        assert_eq!(stage.mounted_name(), Some("b"));
        assert_eq!(stage.frame_loop().unwrap().frame(), 0);
    }

    #[test]
    fn failed_build_leaves_nothing_mounted() {
        let mut stage = stage();
        stage.mount(&Empty("a")).unwrap();
        assert!(stage.mount(&Broken).is_err());
        assert!(!stage.is_mounted());
    }

    #[test]
    fn completed_load_reaches_mounted_scene() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("name.txt"), "loaded\n").unwrap();
        let demo = Loading {
            file: "name.txt",
            applied: Arc::default(),
            parsed: Arc::default(),
        };
        let mut stage = Stage::new(dir.path(), Viewport::default());
        stage.mount(&demo).unwrap();
        assert_eq!(stage.finish_loads(), 1);
        assert!(demo.applied.load(Ordering::SeqCst));
        let scene = &stage.frame_loop().unwrap().scene;
        assert!(scene.find_by_name("loaded").is_some());
    }

    #[test]
    fn load_completing_after_teardown_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("name.txt"), "late").unwrap();
        let demo = Loading {
            file: "name.txt",
            applied: Arc::default(),
            parsed: Arc::default(),
        };
        let mut stage = Stage::new(dir.path(), Viewport::default());
        let mut renderer = CountingRenderer::default();
        stage.mount(&demo).unwrap();
        stage.teardown();

        // wait for the worker to finish parsing
        for _ in 0..200 {
            if demo.parsed.load(Ordering::SeqCst) > 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(demo.parsed.load(Ordering::SeqCst), 1);

        stage.mount(&Empty("next")).unwrap();
        stage.on_refresh(0.0, &mut renderer);
        assert!(!demo.applied.load(Ordering::SeqCst));
        let scene = &stage.frame_loop().unwrap().scene;
        assert!(scene.find_by_name("late").is_none());
    }
}
