//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU layer and
//! drives one `Scheduler` frame per redraw.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
