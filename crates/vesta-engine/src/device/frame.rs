/// A single acquired surface frame.
///
/// Holding the surface texture prevents acquisition of subsequent frames, so
/// the runtime hands it back through `Gpu::present` right after rendering.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}
