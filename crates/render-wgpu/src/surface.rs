use crate::gpu::WgpuRenderer;
use vitrine_common::Viewport;
use vitrine_render::{PerspectiveCamera, Renderer};
use vitrine_scene::Scene;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl RenderError {
    /// The frame was skipped and the surface reconfigured; the next one
    /// should succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RenderError::Surface(
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Timeout
            )
        )
    }
}

/// A drawn but not yet presented surface image. Overlays can be drawn
/// onto [`SurfaceFrame::view`] before [`SurfaceFrame::present`].
pub struct SurfaceFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

impl SurfaceFrame {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn present(self) {
        self.texture.present();
    }
}

/// Owns the GPU device and a window surface and draws scenes into it.
pub struct SurfaceRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scene: WgpuRenderer,
    backend: wgpu::Backend,
}

impl SurfaceRenderer {
    /// Blocks until an adapter and device are ready.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        viewport: Viewport,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("vitrine_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or(RenderError::NoAdapter)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width,
            height: viewport.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scene = WgpuRenderer::new(&device, &queue, format, viewport.width, viewport.height);
        let backend = adapter.get_info().backend;
        tracing::info!(backend = backend.to_str(), ?format, "GPU initialized");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            scene,
            backend,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn backend(&self) -> wgpu::Backend {
        self.backend
    }

    pub fn size(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    fn acquire(&self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.surface.configure(&self.device, &self.config);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Renderer for SurfaceRenderer {
    type Output = Result<SurfaceFrame, RenderError>;

    fn resize(&mut self, viewport: Viewport) {
        self.config.width = viewport.width;
        self.config.height = viewport.height;
        self.surface.configure(&self.device, &self.config);
        self.scene.resize(&self.device, viewport.width, viewport.height);
        tracing::debug!(width = viewport.width, height = viewport.height, "surface resized");
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output {
        let texture = self.acquire()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.scene
            .render(&self.device, &self.queue, &view, scene, camera);
        Ok(SurfaceFrame { texture, view })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_and_outdated_are_transient() {
        assert!(RenderError::Surface(wgpu::SurfaceError::Lost).is_transient());
        assert!(RenderError::Surface(wgpu::SurfaceError::Outdated).is_transient());
        assert!(!RenderError::Surface(wgpu::SurfaceError::OutOfMemory).is_transient());
        assert!(!RenderError::NoAdapter.is_transient());
    }
}
