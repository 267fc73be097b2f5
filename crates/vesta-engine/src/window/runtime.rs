use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::assets::AssetLoader;
use crate::core::{App, AppControl, Scheduler, SchedulerConfig};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,

    /// Scheduler parameters; `initial_size` and `surface_format` are
    /// replaced with the window's actual values.
    pub scheduler: SchedulerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "vesta".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    pub fn run<A, L>(config: RuntimeConfig, gpu_init: GpuInit, assets: L, app: A) -> Result<()>
    where
        A: App + 'static,
        L: AssetLoader + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config,
            gpu_init,
            assets: Some(assets),
            app,
            entry: None,
            scheduler: None,
            exit_requested: false,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A, L> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    assets: Option<L>,
    app: A,

    entry: Option<WindowEntry>,
    scheduler: Option<Scheduler>,
    exit_requested: bool,
}

impl<A, L> AppState<A, L>
where
    A: App + 'static,
    L: AssetLoader + 'static,
{
    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let (size, format, context) = entry.with_gpu(|gpu| {
            (gpu.size(), gpu.surface_format(), gpu.context().clone())
        });

        let mut config = self.config.scheduler.clone();
        config.initial_size = (size.width, size.height);
        config.surface_format = format;

        let assets = self
            .assets
            .take()
            .context("runtime resumed twice without assets")?;
        let mut scheduler =
            Scheduler::new(context, assets, config).context("failed to create scheduler")?;

        self.app
            .setup(&mut scheduler)
            .context("application setup failed")?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        self.scheduler = Some(scheduler);
        Ok(())
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let (Some(entry), Some(scheduler)) = (self.entry.as_mut(), self.scheduler.as_mut()) else {
            return;
        };
        entry.with_gpu_mut(|gpu| gpu.resize(new_size));
        if new_size.width > 0 && new_size.height > 0 {
            scheduler.resize(new_size.width, new_size.height);
        }
        entry.with_window(|w| w.request_redraw());
    }

    /// Drives one scheduler frame into the next surface texture.
    fn redraw(&mut self) -> AppControl {
        let (Some(entry), Some(scheduler)) = (self.entry.as_mut(), self.scheduler.as_mut()) else {
            return AppControl::Continue;
        };

        let mut control = AppControl::Continue;

        entry.with_mut(|fields| {
            let frame = match fields.gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    if fields.gpu.handle_surface_error(err) == SurfaceErrorAction::Fatal {
                        control = AppControl::Exit;
                    }
                    return;
                }
            };

            if let Err(e) = scheduler.render_frame(Some(&frame.view)) {
                log::error!("frame {} failed: {e}", scheduler.frames_completed());
                if e.is_fatal() {
                    control = AppControl::Exit;
                }
            }

            fields.window.pre_present_notify();
            fields.gpu.present(frame);
        });

        if control == AppControl::Exit {
            return control;
        }
        self.app.after_frame(scheduler)
    }
}

impl<A, L> ApplicationHandler for AppState<A, L>
where
    A: App + 'static,
    L: AssetLoader + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            log::error!("failed to start: {e:#}");
            self.request_exit(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: units animate every frame.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.request_exit(event_loop);
                return;
            }

            WindowEvent::Resized(new_size) => self.resize(*new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size);
                }
            }

            WindowEvent::RedrawRequested => {
                if self.redraw() == AppControl::Exit {
                    self.request_exit(event_loop);
                }
                return;
            }

            _ => {}
        }

        if let Some(scheduler) = self.scheduler.as_mut() {
            if self.app.on_window_event(scheduler, &event) == AppControl::Exit {
                self.request_exit(event_loop);
            }
        }
    }
}
