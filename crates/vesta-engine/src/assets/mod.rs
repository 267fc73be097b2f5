//! Shader sources and compiled programs.
//!
//! The engine only needs "load a named WGSL source, compile it, bind it".
//! Where the source comes from is up to the `AssetLoader` the scheduler holds.

mod loader;
mod program;

pub use loader::{AssetLoader, EmbeddedAssets, FsAssetLoader, LoadFuture};
pub use program::{compile_program, ShaderProgram};

/// Names of the shaders shipped with the engine.
pub mod builtin {
    pub const SURFACE: &str = "vesta/surface.wgsl";
    pub const MARKER: &str = "vesta/marker.wgsl";
    pub const COMPOSITE: &str = "vesta/composite.wgsl";

    pub(crate) const SOURCES: [(&str, &str); 3] = [
        (SURFACE, include_str!("../render/shaders/surface.wgsl")),
        (MARKER, include_str!("../render/shaders/marker.wgsl")),
        (COMPOSITE, include_str!("../render/shaders/composite.wgsl")),
    ];

    pub(crate) fn source(name: &str) -> Option<&'static str> {
        SOURCES.iter().find(|(n, _)| *n == name).map(|(_, s)| *s)
    }
}
