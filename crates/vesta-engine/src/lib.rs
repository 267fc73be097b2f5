//! Vesta engine crate.
//!
//! A frame scheduler driving a dynamic set of units, rendered through wgpu
//! into a multi-attachment off-screen target. Besides color, every draw
//! writes the identity of its unit and the world position it covers, so a
//! screen coordinate resolves to a unit and a 3-D point by reading back one
//! texel instead of ray-casting on the CPU.

pub mod assets;
pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod render;
pub mod scene;
pub mod time;
pub mod unit;
pub mod window;

pub use crate::core::{App, AppControl, FrameCtx, Readback, Scheduler, SchedulerConfig, UnitSetup};
pub use crate::error::{EngineError, Result};
pub use crate::unit::{Unit, UnitId};
