use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use glam::{Mat4, Vec3};

use crate::assets::{AssetLoader, ShaderProgram};
use crate::device::GpuContext;
use crate::error::{EngineError, Result};
use crate::render::{
    AttachmentLayout, AttachmentRole, CompositeView, Compositor, DrawPass, Drawable, Material,
    MaterialDesc, MaterialFactory, RenderTarget, TargetPass, UniformChannel,
};
use crate::scene::Camera;
use crate::time::{FrameClock, FrameTime};
use crate::unit::{QueueEntry, QueueKind, RenderQueues, Unit, UnitId, UnitRegistry};

use super::ctx::{CameraSlot, FrameCtx};
use super::setup::UnitSetup;
use super::spawn::{registration, Spawner};

/// Scheduler construction parameters.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Attachments of the off-screen target, in index order.
    pub layout: AttachmentLayout,

    /// Target extent until the first `resize`.
    pub initial_size: (u32, u32),

    /// Format of the surface views passed to `render_frame`.
    pub surface_format: wgpu::TextureFormat,

    pub camera: Camera,

    pub dt_min: Duration,
    pub dt_max: Duration,
}

impl SchedulerConfig {
    pub const DEFAULT_CLEAR: wgpu::Color = wgpu::Color {
        r: 0.08,
        g: 0.09,
        b: 0.11,
        a: 1.0,
    };
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            layout: AttachmentLayout::standard(Self::DEFAULT_CLEAR),
            initial_size: (1280, 720),
            surface_format: wgpu::TextureFormat::Bgra8UnormSrgb,
            camera: Camera::default(),
            dt_min: FrameClock::DEFAULT_DT_MIN,
            dt_max: FrameClock::DEFAULT_DT_MAX,
        }
    }
}

/// Frame loop, unit registry, render queues, camera and render target.
///
/// One `render_frame` call is one frame:
/// 1. tick the clock
/// 2. admit units whose spawned registration finished
/// 3. run every live unit's `response` in registration order
/// 4. flush the primary queue with every attachment writable
/// 5. flush the marker queue with the color attachment masked off
/// 6. composite onto the surface view, if one is given
/// 7. sweep tombstoned units (`close`, then drop)
pub struct Scheduler {
    context: GpuContext,
    target: RenderTarget,
    uniforms: UniformChannel,
    compositor: Compositor,
    surface_format: wgpu::TextureFormat,

    registry: UnitRegistry,
    spawner: Spawner,
    queues: RenderQueues,
    camera: CameraSlot,

    clock: FrameClock,
    last_frame: Option<FrameTime>,
    frames_completed: u64,
    /// Target generation the last completed frame drew into.
    drawn_generation: Option<u64>,
}

impl Scheduler {
    pub fn new(
        context: GpuContext,
        assets: impl AssetLoader + 'static,
        config: SchedulerConfig,
    ) -> Result<Self> {
        let (width, height) = config.initial_size;
        let target = RenderTarget::new(&context, config.layout, width, height)?;
        let uniforms = UniformChannel::new(context.device());
        let compositor = Compositor::new(context.device(), target.layout());

        let materials = MaterialFactory::new(
            context.clone(),
            target.layout().formats(),
            uniforms.layout().clone(),
        );
        let spawner = Spawner::new(UnitSetup::new(materials, Rc::new(assets)));

        let mut camera = config.camera;
        camera.set_aspect(target.size().0, target.size().1);

        log::info!(
            "scheduler ready: {} attachments at {}x{}",
            target.attachment_count(),
            target.size().0,
            target.size().1
        );

        Ok(Self {
            context,
            target,
            uniforms,
            compositor,
            surface_format: config.surface_format,
            registry: UnitRegistry::new(),
            spawner,
            queues: RenderQueues::new(),
            camera: CameraSlot {
                camera,
                owner: None,
            },
            clock: FrameClock::with_clamps(config.dt_min, config.dt_max),
            last_frame: None,
            frames_completed: 0,
            drawn_generation: None,
        })
    }

    // ── registration ──────────────────────────────────────────────────────

    /// Creates, initializes and registers a unit.
    ///
    /// The id is reserved before the factory runs and is burned if the
    /// factory or `init` fails; the error is returned and nothing is
    /// registered.
    pub async fn register_unit<F, Fut, U>(&mut self, factory: F) -> Result<UnitId>
    where
        F: FnOnce(UnitSetup) -> Fut + 'static,
        Fut: Future<Output = Result<U>> + 'static,
        U: Unit,
    {
        let id = self.registry.reserve_id();
        let unit = registration(self.spawner.setup_for(id), factory).await?;
        self.registry.insert(id, unit);
        Ok(id)
    }

    /// Starts a registration that completes at a later frame boundary.
    pub fn spawn_unit<F, Fut, U>(&mut self, factory: F) -> UnitId
    where
        F: FnOnce(UnitSetup) -> Fut + 'static,
        Fut: Future<Output = Result<U>> + 'static,
        U: Unit,
    {
        self.spawner.spawn(&self.registry, factory)
    }

    pub fn is_pending(&self, id: UnitId) -> bool {
        self.spawner.is_pending(id)
    }

    pub fn pending_count(&self) -> usize {
        self.spawner.len()
    }

    // ── units ─────────────────────────────────────────────────────────────

    /// Marks a unit for removal at the end of the next frame sweep.
    pub fn tombstone(&mut self, id: UnitId) -> bool {
        self.registry.tombstone(id)
    }

    pub fn unit(&self, id: UnitId) -> Option<&(dyn Unit + 'static)> {
        self.registry.get(id)
    }

    pub fn unit_as<T: Unit>(&self, id: UnitId) -> Option<&T> {
        self.registry.get(id)?.downcast_ref()
    }

    pub fn unit_as_mut<T: Unit>(&mut self, id: UnitId) -> Option<&mut T> {
        self.registry.get_mut(id)?.downcast_mut()
    }

    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.registry.ids().collect()
    }

    pub fn unit_count(&self) -> usize {
        self.registry.len()
    }

    /// Host-side submission. Only valid while a unit response is running,
    /// so between frames this always fails with `NoActiveUnit`.
    pub fn submit_primary(&mut self, drawable: Rc<dyn Drawable>, transform: Mat4) -> Result<()> {
        self.queues.submit(QueueKind::Primary, drawable, transform)
    }

    pub fn submit_marker(&mut self, drawable: Rc<dyn Drawable>, transform: Mat4) -> Result<()> {
        self.queues.submit(QueueKind::Marker, drawable, transform)
    }

    /// Entries waiting in both queues. Zero between frames.
    pub fn queued_len(&self) -> usize {
        self.queues.len(QueueKind::Primary) + self.queues.len(QueueKind::Marker)
    }

    // ── camera ────────────────────────────────────────────────────────────

    pub fn camera(&self) -> &Camera {
        &self.camera.camera
    }

    /// Host access between frames, regardless of unit claims.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera.camera
    }

    pub fn camera_owner(&self) -> Option<UnitId> {
        self.camera.owner
    }

    // ── resources ─────────────────────────────────────────────────────────

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    /// Resizes the render target and keeps the camera aspect in sync.
    /// Read-back is `NotReady` again until the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.target.resize(self.context.device(), width, height);
        let (w, h) = self.target.size();
        self.camera.camera.set_aspect(w, h);
    }

    pub fn set_surface_format(&mut self, format: wgpu::TextureFormat) {
        self.surface_format = format;
    }

    /// Setup handle with no unit id, for host-side resource creation.
    pub fn setup(&self) -> UnitSetup {
        self.spawner.setup_for(UnitId::NONE)
    }

    pub fn materials(&self) -> &MaterialFactory {
        self.spawner.setup().materials()
    }

    pub async fn load_program(&self, path: &str) -> Result<Rc<ShaderProgram>> {
        self.setup().load_program(path).await
    }

    pub fn create_material(
        &self,
        program: Rc<ShaderProgram>,
        desc: MaterialDesc,
    ) -> Result<Rc<Material>> {
        self.setup().create_material(program, desc)
    }

    /// Fixes the composite program. Fails once a program (possibly the
    /// built-in one, at the first composite) was assigned.
    pub fn set_composite_program(&self, program: Rc<ShaderProgram>) -> Result<()> {
        self.compositor.set_program(program)
    }

    pub fn set_composite_view(&mut self, view: CompositeView) {
        self.compositor.set_view(view);
    }

    pub fn composite_view(&self) -> CompositeView {
        self.compositor.view()
    }

    // ── frame ─────────────────────────────────────────────────────────────

    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    pub fn last_frame_time(&self) -> Option<FrameTime> {
        self.last_frame
    }

    /// Runs one frame.
    ///
    /// Unit errors are logged and contained; the returned error is reserved
    /// for failures of the frame itself (composite setup).
    pub fn render_frame(&mut self, surface: Option<&wgpu::TextureView>) -> Result<()> {
        let time = self.clock.tick();
        self.last_frame = Some(time);

        let admitted = self.spawner.admit(&mut self.registry);
        if admitted > 0 {
            log::debug!("admitted {admitted} unit(s) at frame {}", time.frame_index);
        }

        self.run_responses(time);

        let result = self.flush(surface);

        for (id, mut unit) in self.registry.sweep() {
            unit.close();
            if self.camera.owner == Some(id) {
                self.camera.owner = None;
            }
            log::debug!("unit {id} swept");
        }

        self.frames_completed += 1;
        self.drawn_generation = Some(self.target.generation());
        result
    }

    fn run_responses(&mut self, time: FrameTime) {
        let viewport = self.target.size();

        for index in 0..self.registry.len() {
            let (Some(id), Some(mut unit)) = (self.registry.id_at(index), self.registry.take(index))
            else {
                continue;
            };

            self.queues.begin_unit(id);
            let result = {
                let mut ctx = FrameCtx {
                    id,
                    time,
                    viewport,
                    camera: &mut self.camera,
                    queues: &mut self.queues,
                    registry: &self.registry,
                    spawner: &mut self.spawner,
                };
                unit.response(&mut ctx)
            };
            self.queues.end_unit(result.is_ok());

            if let Err(e) = result {
                log::error!("unit {id} ({}) response failed: {e}", unit.label());
            }

            self.registry.put_back(index, unit);
        }
    }

    fn flush(&mut self, surface: Option<&wgpu::TextureView>) -> Result<()> {
        let (primary, marker) = self.queues.take();

        let camera = &self.camera.camera;
        self.uniforms
            .begin_frame(camera.view_projection(), camera.location);
        let offsets: Vec<u32> = primary
            .iter()
            .chain(&marker)
            .map(|entry| self.uniforms.push(entry.transform, entry.identity))
            .collect();
        self.uniforms
            .upload(self.context.device(), self.context.queue());

        let color = self.target.attachment_index(AttachmentRole::Color);

        let mut encoder = self
            .context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vesta frame encoder"),
            });

        {
            let mut pass = self.target.bind(&mut encoder, true);
            let (primary_offsets, marker_offsets) = offsets.split_at(primary.len());

            draw_queue(&mut pass, &self.uniforms, &primary, primary_offsets);

            if let Some(color) = color {
                pass.set_attachment_writable(color, false)?;
            }
            draw_queue(&mut pass, &self.uniforms, &marker, marker_offsets);
            if let Some(color) = color {
                pass.set_attachment_writable(color, true)?;
            }
        }

        let composite = match surface {
            Some(view) => self.compositor.render(
                &self.context,
                &mut encoder,
                &self.target,
                view,
                self.surface_format,
            ),
            None => Ok(()),
        };

        self.context.queue().submit(std::iter::once(encoder.finish()));
        composite
    }

    // ── picking ───────────────────────────────────────────────────────────

    /// Synchronous read-back access to the last completed frame.
    ///
    /// `NotReady` until a frame has drawn into the current attachments;
    /// a resize reallocates them, so it also resets readiness.
    pub fn blocking_readback(&self) -> Result<Readback<'_>> {
        if self.drawn_generation != Some(self.target.generation()) {
            return Err(EngineError::NotReady);
        }
        Ok(Readback { scheduler: self })
    }

    pub fn query_unit_at(&self, x: u32, y: u32) -> Result<Option<UnitId>> {
        self.blocking_readback()?.unit_at(x, y)
    }

    pub fn query_world_position_at(&self, x: u32, y: u32) -> Result<Vec3> {
        self.blocking_readback()?.world_position_at(x, y)
    }
}

fn draw_queue(
    pass: &mut TargetPass<'_>,
    uniforms: &UniformChannel,
    entries: &[QueueEntry],
    offsets: &[u32],
) {
    // Mask changes made inside a drawable end with that drawable.
    let queue_mask = pass.write_mask();

    for (entry, &offset) in entries.iter().zip(offsets) {
        pass.render_pass()
            .set_bind_group(0, uniforms.bind_group(), &[offset]);

        let mut draw = DrawPass::new(pass);
        let outcome = entry.drawable.draw(&mut draw);
        let draws = draw.draw_count();
        pass.restore_write_mask(queue_mask);

        if let Err(e) = outcome {
            log::error!("draw for unit {} failed: {e}", entry.identity);
            continue;
        }
        if draws != 1 {
            log::trace!("drawable of unit {} issued {draws} draw calls", entry.identity);
        }
    }
}

/// Blocking GPU→CPU access to the render target attachments.
///
/// Each call copies one texel and waits for the GPU; issue a handful per
/// input event, not per frame.
pub struct Readback<'s> {
    scheduler: &'s Scheduler,
}

impl Readback<'_> {
    fn read_role(&self, role: AttachmentRole, x: u32, y: u32) -> Result<Vec<f32>> {
        let target = &self.scheduler.target;
        let index = target
            .attachment_index(role)
            .ok_or_else(|| EngineError::InvalidLayout(format!("no {role:?} attachment")))?;
        target.read_attachment(&self.scheduler.context, index, x, y)
    }

    /// Raw texel of attachment `index`.
    pub fn raw(&self, index: usize, x: u32, y: u32) -> Result<Vec<f32>> {
        self.scheduler
            .target
            .read_attachment(&self.scheduler.context, index, x, y)
    }

    /// Live unit whose draw covers `(x, y)`; `None` for background and for
    /// units already swept.
    pub fn unit_at(&self, x: u32, y: u32) -> Result<Option<UnitId>> {
        let texel = self.read_role(AttachmentRole::Identity, x, y)?;
        let id = UnitId::from_identity_texel(texel.first().copied().unwrap_or(0.0));
        Ok((!id.is_none() && self.scheduler.registry.contains(id)).then_some(id))
    }

    /// World position written at `(x, y)`. Meaningless over background;
    /// check `unit_at` first.
    pub fn world_position_at(&self, x: u32, y: u32) -> Result<Vec3> {
        let texel = self.read_role(AttachmentRole::Position, x, y)?;
        match texel.as_slice() {
            [x, y, z, ..] => Ok(Vec3::new(*x, *y, *z)),
            _ => Err(EngineError::Readback(format!(
                "position texel has {} components",
                texel.len()
            ))),
        }
    }
}
