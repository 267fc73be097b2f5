use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::error::{EngineError, Result};

pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

/// Resolves a shader name to WGSL source.
///
/// Loading may suspend; the scheduler awaits it inside unit registration.
pub trait AssetLoader {
    fn load_source<'a>(&'a self, path: &'a str) -> LoadFuture<'a>;
}

/// Reads sources relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FsAssetLoader {
    fn load_source<'a>(&'a self, path: &'a str) -> LoadFuture<'a> {
        Box::pin(async move {
            let full = self.root.join(path);
            log::debug!("loading shader source {}", full.display());
            std::fs::read_to_string(&full)
                .map_err(|source| EngineError::Asset { path: full, source })
        })
    }
}

/// In-memory sources, optionally backed by another loader for misses.
#[derive(Default)]
pub struct EmbeddedAssets {
    sources: HashMap<String, Cow<'static, str>>,
    fallback: Option<Box<dyn AssetLoader>>,
}

impl EmbeddedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine's own shaders (`assets::builtin`).
    pub fn with_builtins() -> Self {
        let mut assets = Self::new();
        for (name, source) in super::builtin::SOURCES {
            assets.insert(name, source);
        }
        assets
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<Cow<'static, str>>) {
        self.sources.insert(name.into(), source.into());
    }

    pub fn with_fallback(mut self, loader: impl AssetLoader + 'static) -> Self {
        self.fallback = Some(Box::new(loader));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }
}

impl AssetLoader for EmbeddedAssets {
    fn load_source<'a>(&'a self, path: &'a str) -> LoadFuture<'a> {
        if let Some(source) = self.sources.get(path) {
            let source = source.to_string();
            return Box::pin(async move { Ok(source) });
        }
        match &self.fallback {
            Some(loader) => loader.load_source(path),
            None => Box::pin(async move { Err(EngineError::AssetNotFound(path.to_string())) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::builtin;

    #[test]
    fn builtins_are_embedded() {
        let assets = EmbeddedAssets::with_builtins();
        for name in [builtin::SURFACE, builtin::MARKER, builtin::COMPOSITE] {
            let source = pollster::block_on(assets.load_source(name)).expect("builtin source");
            assert!(source.contains("fn vs_main"), "{name} has no vertex entry");
        }
    }

    #[test]
    fn unknown_name_without_fallback_is_not_found() {
        let assets = EmbeddedAssets::new();
        let err = pollster::block_on(assets.load_source("missing.wgsl")).unwrap_err();
        assert!(matches!(err, EngineError::AssetNotFound(name) if name == "missing.wgsl"));
    }

    #[test]
    fn misses_fall_through_to_the_filesystem() {
        let assets =
            EmbeddedAssets::new().with_fallback(FsAssetLoader::new("/nonexistent-vesta-root"));
        let err = pollster::block_on(assets.load_source("a.wgsl")).unwrap_err();
        assert!(matches!(err, EngineError::Asset { .. }));
    }
}
