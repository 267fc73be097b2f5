//! Frame participants.
//!
//! A unit is created by a factory handed to the scheduler, initialized
//! (possibly asynchronously), then asked for a `response` once per frame until
//! it is tombstoned. Tombstoned units run their last `response` in the same
//! frame and are closed and dropped by the end-of-frame sweep.

mod queue;
mod registry;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::core::{FrameCtx, UnitSetup};
use crate::error::Result;

pub use queue::{QueueEntry, QueueKind, RenderQueues};
pub use registry::UnitRegistry;

/// Scheduler-assigned identity, also written to the identity attachment.
///
/// Ids grow monotonically and are never reused; `0` means "no unit".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct UnitId(u32);

impl UnitId {
    pub const NONE: Self = Self(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Id encoded in an identity texel. Float storage is exact up to 2^24.
    pub fn from_identity_texel(value: f32) -> Self {
        if value.is_finite() && value >= 0.5 {
            Self(value.round() as u32)
        } else {
            Self::NONE
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type InitFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;

pub trait Unit: Any {
    /// Runs once after construction, before the unit is registered.
    ///
    /// Suspending here delays registration only; the unit is neither drawn nor
    /// pickable until it completes. An error discards the unit.
    fn init<'a>(&'a mut self, setup: &'a UnitSetup) -> InitFuture<'a> {
        let _ = setup;
        Box::pin(async { Ok(()) })
    }

    /// Per-frame logic: read time and camera, submit drawables.
    fn response(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()>;

    /// Runs when the unit is swept after being tombstoned.
    fn close(&mut self) {}

    fn label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn Unit {
    pub fn downcast_ref<T: Unit>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }

    pub fn downcast_mut<T: Unit>(&mut self) -> Option<&mut T> {
        let any: &mut dyn Any = self;
        any.downcast_mut()
    }
}
