//! Off-screen multi-attachment framebuffer with per-texel read-back.

use crate::device::GpuContext;
use crate::error::{EngineError, Result};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Upper bound for color attachments (wgpu's `max_color_attachments` floor).
pub const MAX_ATTACHMENTS: usize = 8;

/// What an attachment index is used for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttachmentRole {
    /// Shaded color, the only attachment shown in the composited image.
    Color,
    /// Identity tag of the unit that produced the texel (0 = background).
    Identity,
    /// World-space position written by the drawable.
    Position,
    /// Application-defined extra data.
    Custom(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentSpec {
    pub role: AttachmentRole,
    pub format: wgpu::TextureFormat,
    pub clear: wgpu::Color,
    pub label: &'static str,
}

impl AttachmentSpec {
    pub fn new(role: AttachmentRole, format: wgpu::TextureFormat, label: &'static str) -> Self {
        Self {
            role,
            format,
            clear: wgpu::Color::TRANSPARENT,
            label,
        }
    }

    pub fn with_clear(mut self, clear: wgpu::Color) -> Self {
        self.clear = clear;
        self
    }
}

/// Ordered attachment declarations. Index order is fixed for the target's
/// lifetime; resizing never reorders it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentLayout {
    specs: Vec<AttachmentSpec>,
}

impl AttachmentLayout {
    /// Color (`Rgba8Unorm`), identity (`R32Float`), position (`Rgba32Float`).
    pub fn standard(clear_color: wgpu::Color) -> Self {
        Self {
            specs: vec![
                AttachmentSpec::new(
                    AttachmentRole::Color,
                    wgpu::TextureFormat::Rgba8Unorm,
                    "vesta color attachment",
                )
                .with_clear(clear_color),
                AttachmentSpec::new(
                    AttachmentRole::Identity,
                    wgpu::TextureFormat::R32Float,
                    "vesta identity attachment",
                ),
                AttachmentSpec::new(
                    AttachmentRole::Position,
                    wgpu::TextureFormat::Rgba32Float,
                    "vesta position attachment",
                ),
            ],
        }
    }

    /// Validates a custom layout.
    ///
    /// Every material shader writes color, identity and position to
    /// locations 0, 1 and 2, so those roles are pinned to the first three
    /// indices: color in a 4-component non-integer format, identity in
    /// `R32Float`, position in `Rgba32Float`. Further indices must be `Custom`
    /// roles in a format `decode_texel` understands.
    pub fn new(specs: Vec<AttachmentSpec>) -> Result<Self> {
        let invalid = |msg: String| Err(EngineError::InvalidLayout(msg));

        if specs.len() < FIXED_ROLES.len() || specs.len() > MAX_ATTACHMENTS {
            return invalid(format!(
                "{} attachments (expected {}..={MAX_ATTACHMENTS})",
                specs.len(),
                FIXED_ROLES.len()
            ));
        }

        for (index, (spec, role)) in specs.iter().zip(FIXED_ROLES).enumerate() {
            if spec.role != role {
                return invalid(format!("index {index} must be {role:?}, found {:?}", spec.role));
            }
            if !fixed_role_accepts(role, spec.format) {
                return invalid(format!("{role:?} attachment cannot use {:?}", spec.format));
            }
        }

        for (i, spec) in specs.iter().enumerate().skip(FIXED_ROLES.len()) {
            if !matches!(spec.role, AttachmentRole::Custom(_)) {
                return invalid(format!(
                    "index {i}: {:?} is only valid at its fixed index",
                    spec.role
                ));
            }
            if specs[..i].iter().any(|s| s.role == spec.role) {
                return invalid(format!("role {:?} declared twice", spec.role));
            }
            if texel_components(spec.format).is_none() {
                return invalid(format!("format {:?} cannot be read back", spec.format));
            }
        }

        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[AttachmentSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn index_of(&self, role: AttachmentRole) -> Option<usize> {
        self.specs.iter().position(|s| s.role == role)
    }

    pub fn formats(&self) -> impl Iterator<Item = wgpu::TextureFormat> + '_ {
        self.specs.iter().map(|s| s.format)
    }
}

/// Roles at indices 0, 1 and 2 of every layout.
const FIXED_ROLES: [AttachmentRole; 3] = [
    AttachmentRole::Color,
    AttachmentRole::Identity,
    AttachmentRole::Position,
];

fn fixed_role_accepts(role: AttachmentRole, format: wgpu::TextureFormat) -> bool {
    use wgpu::TextureFormat as F;
    match role {
        AttachmentRole::Color => matches!(
            format,
            F::Rgba8Unorm
                | F::Rgba8UnormSrgb
                | F::Bgra8Unorm
                | F::Bgra8UnormSrgb
                | F::Rgba32Float
        ),
        AttachmentRole::Identity => format == F::R32Float,
        AttachmentRole::Position => format == F::Rgba32Float,
        AttachmentRole::Custom(_) => false,
    }
}

/// Set of attachment indices that receive writes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttachmentMask(u8);

impl AttachmentMask {
    pub const NONE: Self = Self(0);

    /// Every index below `count` is writable.
    pub fn all(count: usize) -> Self {
        debug_assert!(count <= MAX_ATTACHMENTS);
        Self(((1u16 << count) - 1) as u8)
    }

    pub fn with(self, index: usize, enabled: bool) -> Self {
        let bit = 1u8 << index;
        if enabled { Self(self.0 | bit) } else { Self(self.0 & !bit) }
    }

    pub fn is_writable(self, index: usize) -> bool {
        index < MAX_ATTACHMENTS && self.0 & (1 << index) != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

struct Attachment {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Off-screen framebuffer: N color attachments plus depth, sized to the viewport.
pub struct RenderTarget {
    layout: AttachmentLayout,
    width: u32,
    height: u32,
    attachments: Vec<Attachment>,
    depth_view: wgpu::TextureView,
    writable: AttachmentMask,
    generation: u64,
    readback: wgpu::Buffer,
}

impl RenderTarget {
    /// Bytes reserved for a single-texel copy; wide enough for any supported format.
    const READBACK_SIZE: u64 = 256;

    pub fn new(
        context: &GpuContext,
        layout: AttachmentLayout,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        for format in layout.formats() {
            context.require_attachment_format(format)?;
        }

        let device = context.device();
        let (width, height) = (width.max(1), height.max(1));
        let attachments = Self::create_attachments(device, &layout, width, height);
        let depth_view = Self::create_depth(device, width, height);

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vesta readback staging"),
            size: Self::READBACK_SIZE,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let writable = AttachmentMask::all(layout.len());

        Ok(Self {
            layout,
            width,
            height,
            attachments,
            depth_view,
            writable,
            generation: 0,
            readback,
        })
    }

    fn create_attachments(
        device: &wgpu::Device,
        layout: &AttachmentLayout,
        width: u32,
        height: u32,
    ) -> Vec<Attachment> {
        layout
            .specs()
            .iter()
            .map(|spec| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(spec.label),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: spec.format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                Attachment { texture, view }
            })
            .collect()
    }

    fn create_depth(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("vesta depth attachment"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Reallocates every attachment at the new extent.
    ///
    /// Index order and roles are untouched; zero extents are clamped to 1.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return;
        }

        self.attachments = Self::create_attachments(device, &self.layout, width, height);
        self.depth_view = Self::create_depth(device, width, height);
        self.width = width;
        self.height = height;
        self.generation += 1;

        log::debug!("render target resized to {width}x{height}");
    }

    /// Begins a render pass into every attachment.
    ///
    /// The returned scope starts from the target's write mask. Mask changes
    /// made on the scope are dropped with it, and dropping it ends the pass,
    /// so early returns from the draw batch leave the target as it was.
    pub fn bind<'e>(&self, encoder: &'e mut wgpu::CommandEncoder, clear: bool) -> TargetPass<'e> {
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = self
            .attachments
            .iter()
            .zip(self.layout.specs())
            .map(|(attachment, spec)| {
                Some(wgpu::RenderPassColorAttachment {
                    view: &attachment.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: if clear {
                            wgpu::LoadOp::Clear(spec.clear)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vesta target pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: if clear {
                        wgpu::LoadOp::Clear(1.0)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        TargetPass {
            pass,
            mask: self.writable,
            count: self.layout.len(),
        }
    }

    /// Sets the write mask that subsequent `bind` scopes start from.
    pub fn set_attachment_writable(&mut self, index: usize, enabled: bool) -> Result<()> {
        self.check_index(index)?;
        self.writable = self.writable.with(index, enabled);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.layout.len() {
            Ok(())
        } else {
            Err(EngineError::AttachmentIndex {
                index,
                count: self.layout.len(),
            })
        }
    }

    /// Copies one texel of attachment `index` back to the CPU.
    ///
    /// Blocks until the GPU has finished all submitted work and the copy
    /// landed. This stalls the frame loop; issue at most one per input event.
    pub fn read_attachment(
        &self,
        context: &GpuContext,
        index: usize,
        x: u32,
        y: u32,
    ) -> Result<Vec<f32>> {
        self.check_index(index)?;
        if x >= self.width || y >= self.height {
            return Err(EngineError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let format = self.layout.specs()[index].format;
        let texel_size = format
            .block_copy_size(None)
            .ok_or_else(|| EngineError::Readback(format!("{format:?} has no copy size")))?;

        let device = context.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("vesta readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.attachments[index].texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: None,
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let submission = context.queue().submit(std::iter::once(encoder.finish()));

        let slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission),
                timeout: None,
            })
            .map_err(|e| EngineError::Readback(e.to_string()))?;

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(EngineError::Readback(e.to_string())),
            Err(_) => return Err(EngineError::Readback("map callback never ran".into())),
        }

        let texel = {
            let mapped = slice.get_mapped_range();
            decode_texel(format, &mapped[..texel_size as usize])
        };
        self.readback.unmap();

        texel.ok_or_else(|| EngineError::Readback(format!("cannot decode {format:?}")))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> &AttachmentLayout {
        &self.layout
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    pub fn attachment_index(&self, role: AttachmentRole) -> Option<usize> {
        self.layout.index_of(role)
    }

    pub fn view(&self, index: usize) -> Option<&wgpu::TextureView> {
        self.attachments.get(index).map(|a| &a.view)
    }

    pub fn views(&self) -> impl Iterator<Item = &wgpu::TextureView> {
        self.attachments.iter().map(|a| &a.view)
    }

    pub fn write_mask(&self) -> AttachmentMask {
        self.writable
    }

    /// Bumped on every reallocation; bind groups over the views compare it.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A bound `RenderTarget` scope (see `RenderTarget::bind`).
pub struct TargetPass<'e> {
    pass: wgpu::RenderPass<'e>,
    mask: AttachmentMask,
    count: usize,
}

impl<'e> TargetPass<'e> {
    /// Toggles writes to `index` for the remaining draws of this scope.
    pub fn set_attachment_writable(&mut self, index: usize, enabled: bool) -> Result<()> {
        if index >= self.count {
            return Err(EngineError::AttachmentIndex {
                index,
                count: self.count,
            });
        }
        self.mask = self.mask.with(index, enabled);
        Ok(())
    }

    pub fn write_mask(&self) -> AttachmentMask {
        self.mask
    }

    pub(crate) fn restore_write_mask(&mut self, mask: AttachmentMask) {
        self.mask = mask;
    }

    pub fn render_pass(&mut self) -> &mut wgpu::RenderPass<'e> {
        &mut self.pass
    }
}

fn texel_components(format: wgpu::TextureFormat) -> Option<usize> {
    use wgpu::TextureFormat as F;
    match format {
        F::R32Float | F::R32Uint | F::R32Sint => Some(1),
        F::Rg32Float => Some(2),
        F::Rgba8Unorm | F::Rgba8UnormSrgb | F::Bgra8Unorm | F::Bgra8UnormSrgb | F::Rgba32Float => {
            Some(4)
        }
        _ => None,
    }
}

/// Decodes one texel into its components as `f32`, in RGBA order.
///
/// Returns `None` for formats outside the read-back set or short input.
pub fn decode_texel(format: wgpu::TextureFormat, bytes: &[u8]) -> Option<Vec<f32>> {
    use wgpu::TextureFormat as F;

    let words = |n: usize| -> Option<Vec<[u8; 4]>> {
        (bytes.len() >= n * 4).then(|| {
            bytes[..n * 4]
                .chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], c[3]])
                .collect()
        })
    };

    match format {
        F::R32Float | F::Rg32Float | F::Rgba32Float => {
            let n = texel_components(format)?;
            Some(words(n)?.into_iter().map(f32::from_le_bytes).collect())
        }
        F::R32Uint => Some(vec![u32::from_le_bytes(words(1)?[0]) as f32]),
        F::R32Sint => Some(vec![i32::from_le_bytes(words(1)?[0]) as f32]),
        F::Rgba8Unorm | F::Rgba8UnormSrgb => {
            let b = bytes.get(..4)?;
            Some(b.iter().map(|&v| f32::from(v) / 255.0).collect())
        }
        F::Bgra8Unorm | F::Bgra8UnormSrgb => {
            let b = bytes.get(..4)?;
            Some(
                [b[2], b[1], b[0], b[3]]
                    .iter()
                    .map(|&v| f32::from(v) / 255.0)
                    .collect(),
            )
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_maps_roles_to_fixed_indices() {
        let layout = AttachmentLayout::standard(wgpu::Color::BLACK);
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.index_of(AttachmentRole::Color), Some(0));
        assert_eq!(layout.index_of(AttachmentRole::Identity), Some(1));
        assert_eq!(layout.index_of(AttachmentRole::Position), Some(2));
        assert_eq!(layout.index_of(AttachmentRole::Custom(0)), None);
    }

    #[test]
    fn layout_rejects_duplicate_roles() {
        let spec = AttachmentSpec::new(AttachmentRole::Color, wgpu::TextureFormat::Rgba8Unorm, "c");
        let err = AttachmentLayout::new(vec![spec.clone(), spec]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidLayout(_)));
    }

    #[test]
    fn layout_rejects_missing_identity() {
        let err = AttachmentLayout::new(vec![
            AttachmentSpec::new(AttachmentRole::Color, wgpu::TextureFormat::Rgba8Unorm, "c"),
            AttachmentSpec::new(AttachmentRole::Position, wgpu::TextureFormat::Rgba32Float, "p"),
            AttachmentSpec::new(AttachmentRole::Custom(0), wgpu::TextureFormat::R32Float, "x"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Identity"), "{err}");
    }

    #[test]
    fn layout_rejects_unreadable_formats() {
        let err = AttachmentLayout::new(vec![
            AttachmentSpec::new(AttachmentRole::Color, wgpu::TextureFormat::Rgba16Float, "c"),
            AttachmentSpec::new(AttachmentRole::Identity, wgpu::TextureFormat::R32Float, "i"),
            AttachmentSpec::new(AttachmentRole::Position, wgpu::TextureFormat::Rgba32Float, "p"),
        ])
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidLayout(_)));
    }

    #[test]
    fn layout_accepts_custom_extra_attachment() {
        let layout = AttachmentLayout::new(vec![
            AttachmentSpec::new(AttachmentRole::Color, wgpu::TextureFormat::Bgra8Unorm, "c"),
            AttachmentSpec::new(AttachmentRole::Identity, wgpu::TextureFormat::R32Float, "i"),
            AttachmentSpec::new(AttachmentRole::Position, wgpu::TextureFormat::Rgba32Float, "p"),
            AttachmentSpec::new(AttachmentRole::Custom(1), wgpu::TextureFormat::R32Uint, "x"),
        ])
        .expect("valid layout");
        assert_eq!(layout.index_of(AttachmentRole::Color), Some(0));
        assert_eq!(layout.index_of(AttachmentRole::Custom(1)), Some(3));
    }

    #[test]
    fn layout_pins_builtin_roles_to_their_shader_locations() {
        let err = AttachmentLayout::new(vec![
            AttachmentSpec::new(AttachmentRole::Identity, wgpu::TextureFormat::R32Float, "i"),
            AttachmentSpec::new(AttachmentRole::Color, wgpu::TextureFormat::Rgba8Unorm, "c"),
            AttachmentSpec::new(AttachmentRole::Position, wgpu::TextureFormat::Rgba32Float, "p"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("index 0 must be Color"), "{err}");
    }

    #[test]
    fn layout_rejects_formats_the_shaders_cannot_write() {
        use wgpu::TextureFormat as F;

        // Integer identity against an f32 shader output; normalized position
        // would clamp world coordinates.
        for (identity, position) in [(F::R32Uint, F::Rgba32Float), (F::R32Float, F::Rgba8Unorm)] {
            let err = AttachmentLayout::new(vec![
                AttachmentSpec::new(AttachmentRole::Color, F::Rgba8Unorm, "c"),
                AttachmentSpec::new(AttachmentRole::Identity, identity, "i"),
                AttachmentSpec::new(AttachmentRole::Position, position, "p"),
            ])
            .unwrap_err();
            assert!(matches!(err, EngineError::InvalidLayout(_)), "{err}");
        }

        let err = AttachmentLayout::new(vec![
            AttachmentSpec::new(AttachmentRole::Color, wgpu::TextureFormat::R32Uint, "c"),
            AttachmentSpec::new(AttachmentRole::Identity, wgpu::TextureFormat::R32Float, "i"),
            AttachmentSpec::new(AttachmentRole::Position, wgpu::TextureFormat::Rgba32Float, "p"),
        ])
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidLayout(_)));
    }

    #[test]
    fn builtin_roles_cannot_repeat_as_extras() {
        let mut specs = AttachmentLayout::standard(wgpu::Color::BLACK).specs().to_vec();
        specs.push(AttachmentSpec::new(
            AttachmentRole::Identity,
            wgpu::TextureFormat::R32Float,
            "i2",
        ));
        assert!(matches!(
            AttachmentLayout::new(specs),
            Err(EngineError::InvalidLayout(_))
        ));
    }

    #[test]
    fn mask_toggles_single_indices() {
        let all = AttachmentMask::all(3);
        assert_eq!(all.bits(), 0b111);

        let no_color = all.with(0, false);
        assert!(!no_color.is_writable(0));
        assert!(no_color.is_writable(1));
        assert!(no_color.is_writable(2));
        assert_eq!(no_color.with(0, true), all);
        assert!(!all.is_writable(3));
    }

    #[test]
    fn mask_all_covers_max_attachments() {
        assert_eq!(AttachmentMask::all(MAX_ATTACHMENTS).bits(), 0xff);
        assert_eq!(AttachmentMask::all(0), AttachmentMask::NONE);
    }

    #[test]
    fn decodes_float_texels() {
        let mut bytes = Vec::new();
        for v in [1.5f32, -2.0, 3.25, 1.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(
            decode_texel(wgpu::TextureFormat::Rgba32Float, &bytes),
            Some(vec![1.5, -2.0, 3.25, 1.0])
        );
        assert_eq!(
            decode_texel(wgpu::TextureFormat::R32Float, &bytes),
            Some(vec![1.5])
        );
    }

    #[test]
    fn decodes_unorm_and_swizzles_bgra() {
        let bytes = [255u8, 0, 51, 255];
        assert_eq!(
            decode_texel(wgpu::TextureFormat::Rgba8Unorm, &bytes),
            Some(vec![1.0, 0.0, 0.2, 1.0])
        );
        assert_eq!(
            decode_texel(wgpu::TextureFormat::Bgra8Unorm, &bytes),
            Some(vec![0.2, 0.0, 1.0, 1.0])
        );
    }

    #[test]
    fn decode_rejects_short_input() {
        assert_eq!(decode_texel(wgpu::TextureFormat::Rgba32Float, &[0u8; 8]), None);
        assert_eq!(decode_texel(wgpu::TextureFormat::Depth32Float, &[0u8; 4]), None);
    }
}
