use std::ops::Range;
use std::rc::Rc;

use crate::error::Result;
use crate::scene::Mesh;

use super::material::Material;
use super::target::{AttachmentMask, TargetPass};

/// Something that can be submitted to a render queue.
///
/// `draw` runs inside a bound `RenderTarget` scope with the entry's
/// `DrawUniforms` slot already bound at group 0. It should issue one draw
/// call.
pub trait Drawable {
    fn draw(&self, pass: &mut DrawPass<'_, '_>) -> Result<()>;
}

/// Render-pass access handed to `Drawable::draw`.
pub struct DrawPass<'p, 'e> {
    target: &'p mut TargetPass<'e>,
    draws: u32,
}

impl<'p, 'e> DrawPass<'p, 'e> {
    pub(crate) fn new(target: &'p mut TargetPass<'e>) -> Self {
        Self { target, draws: 0 }
    }

    /// Attachments the next draw writes to; pick the pipeline variant from it.
    pub fn write_mask(&self) -> AttachmentMask {
        self.target.write_mask()
    }

    /// Toggles writes to `index` for the rest of this drawable's draws.
    /// The queue's mask is restored before the next entry draws.
    pub fn set_attachment_writable(&mut self, index: usize, enabled: bool) -> Result<()> {
        self.target.set_attachment_writable(index, enabled)
    }

    pub fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        self.target.render_pass().set_pipeline(pipeline);
    }

    /// Group 0 belongs to the uniform channel.
    pub fn set_bind_group(&mut self, index: u32, bind_group: &wgpu::BindGroup) {
        debug_assert!(index > 0, "bind group 0 is reserved for DrawUniforms");
        self.target.render_pass().set_bind_group(index, bind_group, &[]);
    }

    pub fn set_vertex_buffer(&mut self, slot: u32, buffer: wgpu::BufferSlice<'_>) {
        self.target.render_pass().set_vertex_buffer(slot, buffer);
    }

    pub fn set_index_buffer(&mut self, buffer: wgpu::BufferSlice<'_>, format: wgpu::IndexFormat) {
        self.target.render_pass().set_index_buffer(buffer, format);
    }

    pub fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.draws += 1;
        self.target.render_pass().draw(vertices, instances);
    }

    pub fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.draws += 1;
        self.target
            .render_pass()
            .draw_indexed(indices, base_vertex, instances);
    }

    /// Draw calls issued through this pass so far.
    pub fn draw_count(&self) -> u32 {
        self.draws
    }
}

/// Mesh + material: the stock `Drawable`.
#[derive(Debug, Clone)]
pub struct Primitive {
    mesh: Rc<Mesh>,
    material: Rc<Material>,
}

impl Primitive {
    pub fn new(mesh: Rc<Mesh>, material: Rc<Material>) -> Self {
        Self { mesh, material }
    }

    pub fn mesh(&self) -> &Rc<Mesh> {
        &self.mesh
    }

    pub fn material(&self) -> &Rc<Material> {
        &self.material
    }
}

impl Drawable for Primitive {
    fn draw(&self, pass: &mut DrawPass<'_, '_>) -> Result<()> {
        let pipeline = self.material.pipeline(pass.write_mask());
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(1, self.material.bind_group());
        pass.set_vertex_buffer(0, self.mesh.vertex_buffer().slice(..));
        pass.set_index_buffer(self.mesh.index_buffer().slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.mesh.index_count(), 0, 0..1);
        Ok(())
    }
}
