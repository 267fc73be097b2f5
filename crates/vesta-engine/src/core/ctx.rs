use std::future::Future;
use std::rc::Rc;

use glam::Mat4;

use crate::error::{EngineError, Result};
use crate::render::Drawable;
use crate::scene::Camera;
use crate::time::FrameTime;
use crate::unit::{QueueKind, RenderQueues, Unit, UnitId, UnitRegistry};

use super::setup::UnitSetup;
use super::spawn::Spawner;

/// Camera plus its single-writer claim.
#[derive(Debug, Default)]
pub(crate) struct CameraSlot {
    pub(crate) camera: Camera,
    pub(crate) owner: Option<UnitId>,
}

/// Per-unit view of the frame, passed to `Unit::response`.
///
/// Everything a response may touch goes through here: time, camera, the
/// render queues, other units (read-only) and deferred spawning/removal.
pub struct FrameCtx<'a> {
    pub(crate) id: UnitId,
    pub(crate) time: FrameTime,
    pub(crate) viewport: (u32, u32),
    pub(crate) camera: &'a mut CameraSlot,
    pub(crate) queues: &'a mut RenderQueues,
    pub(crate) registry: &'a UnitRegistry,
    pub(crate) spawner: &'a mut Spawner,
}

impl<'a> FrameCtx<'a> {
    /// Id of the unit whose response is running.
    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }

    /// Render target extent in pixels.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    // ── camera ────────────────────────────────────────────────────────────

    pub fn camera(&self) -> &Camera {
        &self.camera.camera
    }

    pub fn camera_owner(&self) -> Option<UnitId> {
        self.camera.owner
    }

    /// Makes this unit the camera's only writer. Claiming twice is a no-op.
    pub fn claim_camera(&mut self) -> Result<()> {
        match self.camera.owner {
            Some(owner) if owner != self.id => Err(EngineError::CameraClaimed { owner }),
            _ => {
                self.camera.owner = Some(self.id);
                Ok(())
            }
        }
    }

    pub fn release_camera(&mut self) -> Result<()> {
        if self.camera.owner != Some(self.id) {
            return Err(EngineError::CameraNotOwned { unit: self.id });
        }
        self.camera.owner = None;
        Ok(())
    }

    pub fn camera_mut(&mut self) -> Result<&mut Camera> {
        if self.camera.owner != Some(self.id) {
            return Err(EngineError::CameraNotOwned { unit: self.id });
        }
        Ok(&mut self.camera.camera)
    }

    // ── queues ────────────────────────────────────────────────────────────

    pub fn submit_primary(&mut self, drawable: Rc<dyn Drawable>, transform: Mat4) -> Result<()> {
        self.queues.submit(QueueKind::Primary, drawable, transform)
    }

    /// Pickable overlay: writes identity and position, never the color attachment.
    pub fn submit_marker(&mut self, drawable: Rc<dyn Drawable>, transform: Mat4) -> Result<()> {
        self.queues.submit(QueueKind::Marker, drawable, transform)
    }

    // ── units ─────────────────────────────────────────────────────────────

    /// Other live units. The running unit is not visible through this.
    pub fn units(&self) -> &UnitRegistry {
        self.registry
    }

    pub fn unit<T: Unit>(&self, id: UnitId) -> Option<&T> {
        self.registry.get(id)?.downcast_ref()
    }

    /// Marks `id` for removal at the end of this frame.
    pub fn tombstone(&self, id: UnitId) -> bool {
        self.registry.tombstone(id)
    }

    pub fn destroy_self(&self) {
        self.registry.tombstone(self.id);
    }

    /// Starts registering a new unit; it joins at a later frame boundary.
    pub fn spawn_unit<F, Fut, U>(&mut self, factory: F) -> UnitId
    where
        F: FnOnce(UnitSetup) -> Fut + 'static,
        Fut: Future<Output = Result<U>> + 'static,
        U: Unit,
    {
        self.spawner.spawn(self.registry, factory)
    }
}
