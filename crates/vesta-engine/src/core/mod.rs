//! Core engine-facing contracts.
//!
//! This module defines the frame scheduler and the interfaces units and host
//! applications program against: `FrameCtx` during a unit's response,
//! `UnitSetup` during its creation, `App` for the binary driving the runtime.

mod app;
mod ctx;
mod setup;
mod spawn;
mod system;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
pub use setup::UnitSetup;
pub use system::{Readback, Scheduler, SchedulerConfig};
