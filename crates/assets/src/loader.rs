use crate::{AssetError, Font, ImportedScene, import_gltf, read_ply, read_texture};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use vitrine_scene::{MeshData, Scene, Texture, TextureId};

type Apply = Box<dyn FnOnce(&mut Scene) + Send>;

struct Completion {
    label: String,
    result: Result<Apply, AssetError>,
}

/// Longest `wait_all` blocks for a single completion.
const WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs each load on its own worker thread and hands the parsed value to a
/// callback on the loop thread.
///
/// Workers only parse; callbacks run inside [`AssetLoader::poll`] and may
/// mutate the scene freely. Dropping the loader abandons in-flight loads:
/// their results are discarded when the worker finds the channel closed.
pub struct AssetLoader {
    root: PathBuf,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    pending: usize,
    failed: usize,
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("root", &self.root)
            .field("pending", &self.pending)
            .field("failed", &self.failed)
            .finish()
    }
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            root: root.into(),
            tx,
            rx,
            pending: 0,
            failed: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Web-style paths (`/assets/x.png`) resolve under the root too.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches('/'))
    }

    /// Loads queued and not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Parse `relative` on a worker with `parse`, then run `done` on the next poll.
    pub fn load<T, P, F>(&mut self, relative: &str, parse: P, done: F)
    where
        T: Send + 'static,
        P: FnOnce(&Path) -> Result<T, AssetError> + Send + 'static,
        F: FnOnce(&mut Scene, T) + Send + 'static,
    {
        let path = self.resolve(relative);
        let label = relative.to_string();
        let tx = self.tx.clone();
        self.pending += 1;
        tracing::debug!(path = %path.display(), "queued asset load");

        std::thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| parse(&path)))
                .unwrap_or_else(|payload| Err(AssetError::Panicked(panic_message(payload))))
                .map(|value| Box::new(move |scene: &mut Scene| done(scene, value)) as Apply);
            if tx.send(Completion { label, result }).is_err() {
                tracing::debug!(path = %path.display(), "loader dropped, discarding result");
            }
        });
    }

    /// Register an empty texture now; its pixels arrive with a later poll.
    pub fn load_texture(&mut self, scene: &mut Scene, relative: &str) -> TextureId {
        let id = scene.add_texture(Texture::empty(relative));
        self.load(relative, read_texture, move |scene, image| {
            if let Some(texture) = scene.texture_mut(id) {
                texture.set_image(image);
            }
        });
        id
    }

    pub fn load_gltf<F>(&mut self, relative: &str, done: F)
    where
        F: FnOnce(&mut Scene, ImportedScene) + Send + 'static,
    {
        self.load(relative, import_gltf, done);
    }

    pub fn load_ply<F>(&mut self, relative: &str, done: F)
    where
        F: FnOnce(&mut Scene, MeshData) + Send + 'static,
    {
        self.load(relative, read_ply, done);
    }

    pub fn load_font<F>(&mut self, relative: &str, done: F)
    where
        F: FnOnce(&mut Scene, Font) + Send + 'static,
    {
        self.load(relative, Font::read, done);
    }

    /// Apply every completion that has arrived. Never blocks.
    pub fn poll(&mut self, scene: &mut Scene) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            applied += usize::from(self.finish(scene, completion));
        }
        applied
    }

    /// Block until every queued load has been delivered.
    pub fn wait_all(&mut self, scene: &mut Scene) -> usize {
        let mut applied = 0;
        while self.pending > 0 {
            match self.rx.recv_timeout(WAIT_TIMEOUT) {
                Ok(completion) => applied += usize::from(self.finish(scene, completion)),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(pending = self.pending, "gave up waiting for asset loads");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        applied
    }

    fn finish(&mut self, scene: &mut Scene, completion: Completion) -> bool {
        self.pending = self.pending.saturating_sub(1);
        match completion.result {
            Ok(apply) => {
                apply(scene);
                tracing::debug!(asset = %completion.label, "asset loaded");
                true
            }
            Err(e) => {
                self.failed += 1;
                tracing::warn!(asset = %completion.label, error = %e, "asset load failed");
                false
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_scene::{Geometry, Material, Node};

    fn write_png(dir: &Path, name: &str) {
        image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn texture_fills_in_after_poll() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "wood.png");
        let mut scene = Scene::new();
        let mut loader = AssetLoader::new(dir.path());

        let id = loader.load_texture(&mut scene, "/wood.png");
        assert!(scene.texture(id).unwrap().image().is_none());
        assert_eq!(loader.pending(), 1);

        assert_eq!(loader.wait_all(&mut scene), 1);
        let texture = scene.texture(id).unwrap();
        assert_eq!(texture.image().unwrap().width, 4);
        assert_eq!(texture.revision(), 1);
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn failed_load_leaves_scene_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::new();
        let mut loader = AssetLoader::new(dir.path());
        let id = loader.load_texture(&mut scene, "missing.png");
        assert_eq!(loader.wait_all(&mut scene), 0);
        assert_eq!(loader.failed(), 1);
        assert!(scene.texture(id).unwrap().image().is_none());
    }

    #[test]
    fn callback_can_add_nodes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("size.txt"), "3").unwrap();
        let mut scene = Scene::new();
        let mut loader = AssetLoader::new(dir.path());
        loader.load(
            "size.txt",
            |path| {
                let text = std::fs::read_to_string(path)?;
                text.trim()
                    .parse::<f32>()
                    .map_err(|e| AssetError::Font(e.to_string()))
            },
            |scene, size| {
                let g = scene.add_geometry(Geometry::cuboid(size, size, size));
                scene.add(Node::mesh("loaded", g, Material::basic(0xffffffu32)));
            },
        );
        loader.wait_all(&mut scene);
        assert!(scene.find_by_name("loaded").is_some());
    }

    #[test]
    fn panicking_parser_counts_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::new();
        let mut loader = AssetLoader::new(dir.path());
        loader.load(
            "boom.bin",
            |_| -> Result<u32, AssetError> { panic!("bad header") },
            |scene, _| {
                scene.add(Node::group("never"));
            },
        );
        assert_eq!(loader.wait_all(&mut scene), 0);
        assert_eq!(loader.pending(), 0);
        assert_eq!(loader.failed(), 1);
        assert!(scene.find_by_name("never").is_none());
    }

    #[test]
    fn malformed_ply_settles_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bad.ply"),
            "ply\nformat ascii 1.0\nelement face 1\n\
property list uchar int vertex_indices\nend_header\n1e30 0 0 0\n",
        )
        .unwrap();
        let mut scene = Scene::new();
        let mut loader = AssetLoader::new(dir.path());
        loader.load_ply("bad.ply", |_, _| {});
        assert_eq!(loader.wait_all(&mut scene), 0);
        assert_eq!(loader.pending(), 0);
        assert_eq!(loader.failed(), 1);
    }

    #[test]
    fn dropping_loader_discards_results() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png");
        let mut scene = Scene::new();
        let mut loader = AssetLoader::new(dir.path());
        loader.load_texture(&mut scene, "a.png");
        drop(loader);
        // give the worker time to find the channel closed
        std::thread::sleep(Duration::from_millis(50));
        assert!(scene.textures().all(|(_, t)| t.image().is_none()));
    }
}
