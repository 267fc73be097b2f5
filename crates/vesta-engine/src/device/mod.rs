//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (`GpuContext`)
//! - creating & configuring the window Surface (`Gpu`)
//! - acquiring frames and providing encoders/views for rendering

mod context;
mod frame;
mod gpu;
mod init;
mod surface;

pub use context::GpuContext;
pub use surface::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
