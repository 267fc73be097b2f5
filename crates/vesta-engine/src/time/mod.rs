//! Time subsystem.
//!
//! The scheduler owns one `FrameClock` and ticks it once at the start of every
//! frame; units read the resulting `FrameTime` from their `FrameCtx`.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
