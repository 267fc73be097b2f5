//! GPU rendering subsystem.
//!
//! Units queue `Drawable`s; the scheduler flushes them into a multi-attachment
//! `RenderTarget` (color, identity, world position, ...) and composites the
//! result onto the surface.
//!
//! Convention:
//! - world space is right-handed, +Y up
//! - every shader reads `DrawUniforms` at `@group(0) @binding(0)`
//! - material resources live at `@group(1)`

mod compositor;
mod drawable;
mod material;
mod target;
mod uniform;

pub use compositor::{CompositeView, Compositor};
pub use drawable::{DrawPass, Drawable, Primitive};
pub use material::{Material, MaterialDesc, MaterialFactory, MaterialTexture};
pub use target::{
    decode_texel, AttachmentLayout, AttachmentMask, AttachmentRole, AttachmentSpec,
    RenderTarget, TargetPass, DEPTH_FORMAT, MAX_ATTACHMENTS,
};
pub use uniform::{DrawUniforms, UniformChannel, UniformSlots, DRAW_UNIFORMS_SIZE};
