//! Scene units used by the studio.

use std::cell::Cell;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use vesta_engine::assets::builtin;
use vesta_engine::render::{MaterialDesc, Primitive};
use vesta_engine::scene::MeshData;
use vesta_engine::{FrameCtx, Result, Unit, UnitId, UnitSetup};

/// Mirrors `SurfaceParams` in the builtin surface shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SurfaceParams {
    albedo: [f32; 4],
    shading: [f32; 4],
}

/// Mirrors `MarkerParams` in the builtin marker shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MarkerParams {
    tint: [f32; 4],
    cutoff: [f32; 4],
}

async fn surface(
    setup: &UnitSetup,
    mesh: &MeshData,
    params: SurfaceParams,
    label: &str,
) -> Result<Rc<Primitive>> {
    let program = setup.load_program(builtin::SURFACE).await?;
    let desc = MaterialDesc::new(label).with_aux::<SurfaceParams>();
    let material = setup.create_material(program, desc)?;
    material.write_aux(&params)?;
    let mesh = setup.upload_mesh(mesh, label);
    Ok(Rc::new(Primitive::new(mesh, material)))
}

/// Ground plane with grid lines.
pub struct Ground {
    primitive: Rc<Primitive>,
}

impl Ground {
    pub async fn new(setup: UnitSetup) -> Result<Self> {
        let params = SurfaceParams {
            albedo: [0.32, 0.34, 0.36, 1.0],
            shading: [0.45, 0.6, 1.0, 0.0],
        };
        let primitive = surface(&setup, &MeshData::plane(40.0), params, "ground").await?;
        Ok(Self { primitive })
    }
}

impl Unit for Ground {
    fn response(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        ctx.submit_primary(self.primitive.clone(), Mat4::IDENTITY)
    }
}

const PALETTE: [[f32; 4]; 5] = [
    [0.86, 0.42, 0.26, 1.0],
    [0.30, 0.62, 0.84, 1.0],
    [0.46, 0.76, 0.38, 1.0],
    [0.88, 0.74, 0.30, 1.0],
    [0.64, 0.44, 0.80, 1.0],
];

/// Box standing on the ground, slowly spinning about its vertical axis.
pub struct NodeBox {
    primitive: Rc<Primitive>,
    base: Vec3,
    half: Vec3,
    spin: f32,
}

impl NodeBox {
    pub async fn new(setup: UnitSetup, base: Vec3, half: Vec3) -> Result<Self> {
        let color = PALETTE[setup.id().get() as usize % PALETTE.len()];
        let params = SurfaceParams {
            albedo: color,
            shading: [0.25, 0.0, 1.0, 0.0],
        };
        let label = format!("node box {}", setup.id());
        let primitive = surface(&setup, &MeshData::cuboid(half), params, &label).await?;
        Ok(Self {
            primitive,
            base,
            half,
            spin: 0.3 + 0.1 * (setup.id().get() % 4) as f32,
        })
    }

    /// Top-center of the box, where the selection marker floats.
    pub fn anchor(&self) -> Vec3 {
        self.base + Vec3::Y * (self.half.y * 2.0)
    }
}

impl Unit for NodeBox {
    fn response(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let angle = ctx.time().elapsed * self.spin;
        let transform = Mat4::from_rotation_translation(
            Quat::from_rotation_y(angle),
            self.base + Vec3::Y * self.half.y,
        );
        ctx.submit_primary(self.primitive.clone(), transform)
    }
}

/// Current selection, shared between the app and the marker unit.
pub type Selection = Rc<Cell<Option<UnitId>>>;

const RING_SIZE: u32 = 32;

/// Ring sprite; the hole and the outside are transparent so they are
/// neither drawn nor pickable.
fn ring_pixels() -> Vec<u8> {
    let center = (RING_SIZE as f32 - 1.0) * 0.5;
    let mut pixels = Vec::with_capacity((RING_SIZE * RING_SIZE * 4) as usize);
    for y in 0..RING_SIZE {
        for x in 0..RING_SIZE {
            let d = ((x as f32 - center).hypot(y as f32 - center)) / center;
            let alpha = if (0.55..=1.0).contains(&d) { 255 } else { 0 };
            pixels.extend_from_slice(&[255, 255, 255, alpha]);
        }
    }
    pixels
}

/// Billboard ring floating above the selected node box.
pub struct SelectionMarker {
    primitive: Rc<Primitive>,
    selection: Selection,
}

impl SelectionMarker {
    pub async fn new(setup: UnitSetup, selection: Selection) -> Result<Self> {
        let program = setup.load_program(builtin::MARKER).await?;
        let texture = setup.texture_rgba8("selection ring", RING_SIZE, RING_SIZE, &ring_pixels())?;
        let material = setup.create_material(
            program,
            MaterialDesc::new("selection marker")
                .with_aux::<MarkerParams>()
                .with_texture(texture),
        )?;
        material.write_aux(&MarkerParams {
            tint: [1.0, 0.85, 0.2, 1.0],
            cutoff: [0.5, 0.0, 0.0, 0.0],
        })?;
        let mesh = setup.upload_mesh(&MeshData::quad(0.5), "selection marker");
        Ok(Self {
            primitive: Rc::new(Primitive::new(mesh, material)),
            selection,
        })
    }
}

impl Unit for SelectionMarker {
    fn response(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let Some(selected) = self.selection.get() else {
            return Ok(());
        };
        let Some(node) = ctx.unit::<NodeBox>(selected) else {
            // Selected unit is gone.
            self.selection.set(None);
            return Ok(());
        };

        let bob = (ctx.time().elapsed * 2.0).sin() * 0.1;
        let position = node.anchor() + Vec3::Y * (0.8 + bob);
        let transform = ctx.camera().billboard(position, 0.9);
        ctx.submit_marker(self.primitive.clone(), transform)
    }
}

/// Orbits the camera around the origin. Owns the camera while live.
pub struct Turntable {
    radius: f32,
    height: f32,
    speed: f32,
    angle: f32,
    paused: Rc<Cell<bool>>,
}

impl Turntable {
    pub fn new(radius: f32, height: f32, paused: Rc<Cell<bool>>) -> Self {
        Self {
            radius,
            height,
            speed: 0.15,
            angle: 0.0,
            paused,
        }
    }
}

impl Unit for Turntable {
    fn response(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        ctx.claim_camera()?;
        if !self.paused.get() {
            self.angle += ctx.time().dt * self.speed;
        }

        let (sin, cos) = self.angle.sin_cos();
        let location = Vec3::new(sin * self.radius, self.height, cos * self.radius);
        let camera = ctx.camera_mut()?;
        camera.location = location;
        camera.look_at(Vec3::ZERO, Vec3::Y);
        Ok(())
    }

    fn label(&self) -> &'static str {
        "turntable"
    }
}
