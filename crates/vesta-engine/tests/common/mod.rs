//! Shared fixtures for the headless GPU tests.
//!
//! Every test builds its own scheduler on a headless adapter. Machines
//! without any adapter (or without the attachment formats) skip with a
//! message instead of failing.

#![allow(dead_code)]

use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use vesta_engine::assets::{builtin, EmbeddedAssets};
use vesta_engine::device::{GpuContext, GpuInit};
use vesta_engine::logging::{init_logging, LoggingConfig};
use vesta_engine::render::{decode_texel, Material, MaterialDesc, Primitive};
use vesta_engine::scene::MeshData;
use vesta_engine::{EngineError, FrameCtx, Result, Scheduler, SchedulerConfig, Unit, UnitSetup};

pub const SIZE: u32 = 100;

pub fn scheduler_with(assets: EmbeddedAssets) -> Option<Scheduler> {
    init_logging(LoggingConfig::for_tests());

    let context = match pollster::block_on(GpuContext::headless(GpuInit::headless())) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("no headless GPU available ({e}), skipping");
            return None;
        }
    };

    let config = SchedulerConfig {
        initial_size: (SIZE, SIZE),
        ..SchedulerConfig::default()
    };

    match Scheduler::new(context, assets, config) {
        Ok(scheduler) => Some(scheduler),
        Err(e @ EngineError::Unsupported { .. }) => {
            eprintln!("adapter lacks a required capability ({e}), skipping");
            None
        }
        Err(e) => panic!("scheduler creation failed: {e}"),
    }
}

pub fn scheduler() -> Option<Scheduler> {
    scheduler_with(EmbeddedAssets::with_builtins())
}

/// Mirrors `SurfaceParams` in `surface.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SurfaceParams {
    pub albedo: [f32; 4],
    pub shading: [f32; 4],
}

/// Mirrors `MarkerParams` in `marker.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct MarkerParams {
    pub tint: [f32; 4],
    pub cutoff: [f32; 4],
}

pub async fn surface_material(setup: &UnitSetup, albedo: [f32; 4]) -> Result<Rc<Material>> {
    let program = setup.load_program(builtin::SURFACE).await?;
    let material = setup.create_material(
        program,
        MaterialDesc::new("test surface").with_aux::<SurfaceParams>(),
    )?;
    material.write_aux(&SurfaceParams {
        albedo,
        shading: [0.3, 0.0, 1.0, 0.0],
    })?;
    Ok(material)
}

/// Static geometry on the primary queue.
pub struct Solid {
    pub primitive: Rc<Primitive>,
    pub transform: Mat4,
}

impl Solid {
    pub async fn new(setup: UnitSetup, mesh: MeshData, transform: Mat4) -> Result<Self> {
        let material = surface_material(&setup, [0.8, 0.6, 0.3, 1.0]).await?;
        let mesh = setup.upload_mesh(&mesh, "solid");
        Ok(Self {
            primitive: Rc::new(Primitive::new(mesh, material)),
            transform,
        })
    }
}

impl Unit for Solid {
    fn response(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        ctx.submit_primary(self.primitive.clone(), self.transform)
    }
}

/// Ground plane at y = 0 covering the whole default view.
pub async fn ground(setup: UnitSetup) -> Result<Solid> {
    Solid::new(setup, MeshData::plane(50.0), Mat4::IDENTITY).await
}

/// Unit cube (half extent 1) at the origin.
pub async fn cube(setup: UnitSetup) -> Result<Solid> {
    Solid::new(setup, MeshData::cuboid(Vec3::ONE), Mat4::IDENTITY).await
}

/// Camera-facing billboard on the marker queue.
pub struct Billboard {
    pub primitive: Rc<Primitive>,
    pub position: Vec3,
    pub scale: f32,
}

impl Billboard {
    pub async fn new(setup: UnitSetup, position: Vec3, scale: f32) -> Result<Self> {
        let program = setup.load_program(builtin::MARKER).await?;
        let texture = setup.texture_rgba8("white", 1, 1, &[255, 255, 255, 255])?;
        let material = setup.create_material(
            program,
            MaterialDesc::new("test marker")
                .with_aux::<MarkerParams>()
                .with_texture(texture),
        )?;
        material.write_aux(&MarkerParams {
            tint: [1.0, 0.2, 0.2, 1.0],
            cutoff: [0.5, 0.0, 0.0, 0.0],
        })?;
        let mesh = setup.upload_mesh(&MeshData::quad(0.5), "marker quad");
        Ok(Self {
            primitive: Rc::new(Primitive::new(mesh, material)),
            position,
            scale,
        })
    }
}

impl Unit for Billboard {
    fn response(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let transform = ctx.camera().billboard(self.position, self.scale);
        ctx.submit_marker(self.primitive.clone(), transform)
    }
}

/// Unit driven by a closure, for lifecycle tests.
pub struct Scripted {
    pub script: Box<dyn FnMut(&mut FrameCtx<'_>) -> Result<()>>,
    pub on_close: Option<Box<dyn FnOnce()>>,
}

impl Scripted {
    pub fn new(script: impl FnMut(&mut FrameCtx<'_>) -> Result<()> + 'static) -> Self {
        Self {
            script: Box::new(script),
            on_close: None,
        }
    }

    pub fn on_close(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }
}

impl Unit for Scripted {
    fn response(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        (self.script)(ctx)
    }

    fn close(&mut self) {
        if let Some(f) = self.on_close.take() {
            f();
        }
    }
}

pub fn approx(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a - b).abs().max_element() < eps
}

/// Stands in for a swapchain texture: renderable and copyable.
pub fn offscreen_surface(
    context: &GpuContext,
    format: wgpu::TextureFormat,
    (width, height): (u32, u32),
) -> wgpu::Texture {
    context.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("test surface"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Reads one texel of `texture`, decoded to RGBA order.
pub fn read_texel(context: &GpuContext, texture: &wgpu::Texture, x: u32, y: u32) -> Vec<f32> {
    let device = context.device();
    let format = texture.format();
    let texel_size = format.block_copy_size(None).expect("copyable format") as usize;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("test texel"),
        size: 256,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("test texel encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x, y, z: 0 },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
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

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: None,
        })
        .expect("device poll");
    rx.recv().expect("map callback ran").expect("buffer mapped");

    let texel = {
        let mapped = slice.get_mapped_range();
        decode_texel(format, &mapped[..texel_size]).expect("decodable format")
    };
    buffer.unmap();
    texel
}

pub fn assert_rgba_near(got: &[f32], want: [f32; 4], what: &str) {
    assert_eq!(got.len(), 4, "{what}: {got:?} is not RGBA");
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < 0.01, "{what}: {got:?} differs from {want:?}");
    }
}
