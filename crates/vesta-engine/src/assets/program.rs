use std::rc::Rc;

use crate::error::{EngineError, Result};

/// A validated WGSL module with its entry points.
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    module: wgpu::ShaderModule,
    vs_entry: &'static str,
    fs_entry: &'static str,
}

impl ShaderProgram {
    pub const VS_ENTRY: &'static str = "vs_main";
    pub const FS_ENTRY: &'static str = "fs_main";

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    pub fn vs_entry(&self) -> &'static str {
        self.vs_entry
    }

    pub fn fs_entry(&self) -> &'static str {
        self.fs_entry
    }
}

/// Validates `source` with naga, then creates the wgpu module.
///
/// wgpu reports invalid shaders through the device error callback; running
/// naga first turns compile failures into `ShaderCompile` errors that unit
/// registration can propagate.
pub fn compile_program(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<Rc<ShaderProgram>> {
    validate_wgsl(label, source)?;

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    log::debug!("compiled shader program {label:?}");

    Ok(Rc::new(ShaderProgram {
        label: label.to_string(),
        module,
        vs_entry: ShaderProgram::VS_ENTRY,
        fs_entry: ShaderProgram::FS_ENTRY,
    }))
}

pub(crate) fn validate_wgsl(label: &str, source: &str) -> Result<()> {
    let compile_error = |message: String| EngineError::ShaderCompile {
        label: label.to_string(),
        message,
    };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| compile_error(e.emit_to_string(source)))?;

    for (entry, stage) in [
        (ShaderProgram::VS_ENTRY, naga::ShaderStage::Vertex),
        (ShaderProgram::FS_ENTRY, naga::ShaderStage::Fragment),
    ] {
        if !module
            .entry_points
            .iter()
            .any(|ep| ep.name == entry && ep.stage == stage)
        {
            return Err(compile_error(format!("missing {stage:?} entry point `{entry}`")));
        }
    }

    Ok(())
}
