//! Engine error taxonomy.
//!
//! Initialization errors are fatal and surface from construction. Asset errors
//! surface from unit registration. Bounds errors surface from read-back
//! queries. Ordering errors surface from the `FrameCtx` call that broke the
//! frame contract.

use std::path::PathBuf;

use crate::unit::UnitId;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // ── initialization ────────────────────────────────────────────────────
    #[error("no suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("failed to create GPU device: {0}")]
    Device(String),

    #[error("failed to create surface: {0}")]
    Surface(String),

    #[error("required capability unavailable: {what}")]
    Unsupported { what: String },

    #[error("invalid attachment layout: {0}")]
    InvalidLayout(String),

    // ── assets ────────────────────────────────────────────────────────────
    #[error("failed to read asset {path:?}")]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset {0:?} is not registered")]
    AssetNotFound(String),

    #[error("shader {label:?} failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    #[error("texture data holds {actual} bytes, expected {expected}")]
    TextureData { expected: usize, actual: usize },

    #[error("aux block expects {expected} bytes, got {actual}")]
    AuxBlockSize { expected: u64, actual: u64 },

    // ── bounds ────────────────────────────────────────────────────────────
    #[error("read-back at ({x}, {y}) is outside the {width}x{height} target")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("attachment index {index} out of range (target has {count})")]
    AttachmentIndex { index: usize, count: usize },

    // ── ordering / consistency ────────────────────────────────────────────
    #[error("queue submission outside of a unit response")]
    NoActiveUnit,

    #[error("unit {unit} does not own the camera")]
    CameraNotOwned { unit: UnitId },

    #[error("camera is already claimed by unit {owner}")]
    CameraClaimed { owner: UnitId },

    #[error("no frame has been drawn into the current render target")]
    NotReady,

    #[error("composite program is already assigned")]
    CompositeAlreadyAssigned,

    // ── transfer ──────────────────────────────────────────────────────────
    #[error("attachment read-back failed: {0}")]
    Readback(String),

    // ── units ─────────────────────────────────────────────────────────────
    #[error("unit {id}: {message}")]
    Unit { id: UnitId, message: String },
}

impl EngineError {
    /// Wraps an arbitrary error raised by unit code.
    pub fn unit(id: UnitId, err: impl std::fmt::Display) -> Self {
        Self::Unit {
            id,
            message: err.to_string(),
        }
    }

    /// True for errors that make the GPU context unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Adapter(_)
                | Self::Device(_)
                | Self::Surface(_)
                | Self::Unsupported { .. }
                | Self::InvalidLayout(_)
        )
    }
}
