use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::{EngineError, Result};

use super::surface;
use super::{GpuContext, GpuFrame, GpuInit, SurfaceErrorAction};

/// Window-bound GPU state: a `GpuContext` plus the configured surface.
///
/// This type is the low-level presentation layer:
/// - creates the Surface for a window and a compatible `GpuContext`
/// - keeps the swapchain configured across resizes
/// - acquires and presents surface frames
pub struct Gpu<'w> {
    context: GpuContext,

    /// Surface bound to the window; the window must outlive the `Gpu`.
    surface: wgpu::Surface<'w>,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(EngineError::Surface("window has zero size".into()));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| EngineError::Surface(e.to_string()))?;

        let context = GpuContext::with_instance(instance, Some(&surface), &init).await?;

        let surface_caps = surface.get_capabilities(context.adapter());
        let format = surface::select_format(&surface_caps.formats, init.prefer_srgb)?;
        let alpha_mode = surface::select_alpha_mode(&surface_caps.alpha_modes, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(context.device(), &config);
        log::debug!("surface configured: {format:?} {}x{}", config.width, config.height);

        Ok(Self {
            context,
            surface,
            config,
            size,
        })
    }

    /// Shared device handles.
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the surface after a resize. A zero extent is recorded
    /// but configuration waits for a drawable size.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if !surface::is_drawable(new_size) {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(self.context.device(), &self.config);
    }

    /// Acquires the next surface texture.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(GpuFrame {
            surface_texture,
            view,
        })
    }

    /// Presents a frame whose commands were already submitted.
    pub fn present(&self, frame: GpuFrame) {
        drop(frame.view);
        frame.surface_texture.present();
    }

    /// Maps an acquisition failure to an action, reconfiguring the surface
    /// when that is what recovery takes.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        let action = SurfaceErrorAction::for_error(&err);
        log::warn!("surface error: {err} -> {action:?}");
        if action == SurfaceErrorAction::Reconfigure && surface::is_drawable(self.size) {
            self.surface.configure(self.context.device(), &self.config);
        }
        action
    }
}
