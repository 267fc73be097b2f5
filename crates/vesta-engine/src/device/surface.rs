//! Surface policy: format and alpha selection, error recovery.
//!
//! Kept free of live wgpu objects so the choices are testable without a
//! window; `Gpu` applies them.

use winit::dpi::PhysicalSize;

use crate::error::{EngineError, Result};

/// What the runtime does after failing to acquire a surface texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface must be configured again; rendering resumes next frame.
    Reconfigure,
    /// Transient; drop this frame and keep the scheduler state.
    SkipFrame,
    /// The device is unusable; the runtime exits.
    Fatal,
}

impl SurfaceErrorAction {
    pub fn for_error(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigure,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => Self::SkipFrame,
        }
    }
}

/// Picks the presentation format.
///
/// The compositor writes display-referred color, so an sRGB format is taken
/// whenever the surface offers one and `prefer_srgb` is set.
pub(crate) fn select_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Result<wgpu::TextureFormat> {
    let srgb = formats.iter().copied().find(|f| f.is_srgb());
    let first = formats.first().copied();
    let chosen = if prefer_srgb { srgb.or(first) } else { first };

    chosen.ok_or_else(|| EngineError::Unsupported {
        what: "surface exposes no formats".into(),
    })
}

pub(crate) fn select_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| modes.contains(m))
        .or_else(|| modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// wgpu rejects configuring a surface with a zero extent (minimized windows).
pub(crate) fn is_drawable(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode, TextureFormat};

    #[test]
    fn srgb_is_preferred_regardless_of_order() {
        let formats = [TextureFormat::Bgra8Unorm, TextureFormat::Rgba8UnormSrgb];
        assert_eq!(select_format(&formats, true).unwrap(), TextureFormat::Rgba8UnormSrgb);
        assert_eq!(select_format(&formats, false).unwrap(), TextureFormat::Bgra8Unorm);
    }

    #[test]
    fn linear_only_surface_still_works() {
        let formats = [TextureFormat::Rgba16Float];
        assert_eq!(select_format(&formats, true).unwrap(), TextureFormat::Rgba16Float);
    }

    #[test]
    fn empty_capabilities_are_unsupported() {
        assert!(matches!(
            select_format(&[], true),
            Err(EngineError::Unsupported { .. })
        ));
    }

    #[test]
    fn unsupported_alpha_request_falls_back() {
        let modes = [CompositeAlphaMode::Opaque];
        assert_eq!(
            select_alpha_mode(&modes, Some(CompositeAlphaMode::PreMultiplied)),
            CompositeAlphaMode::Opaque
        );
        assert_eq!(select_alpha_mode(&[], None), CompositeAlphaMode::Auto);
    }

    #[test]
    fn lost_surfaces_are_recoverable() {
        assert_eq!(
            SurfaceErrorAction::for_error(&wgpu::SurfaceError::Outdated),
            SurfaceErrorAction::Reconfigure
        );
        assert_eq!(
            SurfaceErrorAction::for_error(&wgpu::SurfaceError::OutOfMemory),
            SurfaceErrorAction::Fatal
        );
        assert!(!is_drawable(PhysicalSize::new(0, 720)));
    }
}
