use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::assets::{compile_program, AssetLoader, ShaderProgram};
use crate::device::GpuContext;
use crate::error::Result;
use crate::render::{Material, MaterialDesc, MaterialFactory, MaterialTexture};
use crate::scene::{Mesh, MeshData};
use crate::unit::UnitId;

type ProgramCache = Rc<RefCell<HashMap<String, Rc<ShaderProgram>>>>;

/// Resources handed to a unit factory and to `Unit::init`.
///
/// Owned and cheap to clone, so factories may move it into their futures.
#[derive(Clone)]
pub struct UnitSetup {
    id: UnitId,
    materials: MaterialFactory,
    assets: Rc<dyn AssetLoader>,
    programs: ProgramCache,
}

impl UnitSetup {
    pub(crate) fn new(materials: MaterialFactory, assets: Rc<dyn AssetLoader>) -> Self {
        Self {
            id: UnitId::NONE,
            materials,
            assets,
            programs: ProgramCache::default(),
        }
    }

    pub(crate) fn for_unit(&self, id: UnitId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    /// Id reserved for the unit being created; its draws carry this identity.
    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn context(&self) -> &GpuContext {
        self.materials.context()
    }

    pub fn materials(&self) -> &MaterialFactory {
        &self.materials
    }

    pub fn assets(&self) -> &Rc<dyn AssetLoader> {
        &self.assets
    }

    /// Loads and compiles a shader program, reusing earlier compilations.
    pub async fn load_program(&self, path: &str) -> Result<Rc<ShaderProgram>> {
        if let Some(program) = self.programs.borrow().get(path) {
            return Ok(program.clone());
        }

        let source = self.assets.load_source(path).await?;
        let program = compile_program(self.context().device(), path, &source)?;
        self.programs
            .borrow_mut()
            .insert(path.to_string(), program.clone());
        Ok(program)
    }

    pub fn create_material(
        &self,
        program: Rc<ShaderProgram>,
        desc: MaterialDesc,
    ) -> Result<Rc<Material>> {
        self.materials.create(program, desc)
    }

    pub fn upload_mesh(&self, data: &MeshData, label: &str) -> Rc<Mesh> {
        Rc::new(data.upload(self.context().device(), label))
    }

    pub fn texture_rgba8(
        &self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Rc<MaterialTexture>> {
        MaterialTexture::from_rgba8(self.context(), label, width, height, pixels)
    }
}
