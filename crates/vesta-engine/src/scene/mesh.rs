use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

/// Interleaved vertex shared by every built-in shader (locations 0..=2).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// CPU-side geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Square in the XZ plane at y = 0, normal +Y.
    pub fn plane(half_extent: f32) -> Self {
        let h = half_extent;
        let n = [0.0, 1.0, 0.0];
        Self {
            vertices: vec![
                Vertex { position: [-h, 0.0, -h], normal: n, uv: [0.0, 0.0] },
                Vertex { position: [h, 0.0, -h], normal: n, uv: [1.0, 0.0] },
                Vertex { position: [h, 0.0, h], normal: n, uv: [1.0, 1.0] },
                Vertex { position: [-h, 0.0, h], normal: n, uv: [0.0, 1.0] },
            ],
            // Counter-clockwise seen from +Y.
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    /// Square in the XY plane centered at the origin, normal +Z. Billboard base.
    pub fn quad(half_extent: f32) -> Self {
        let h = half_extent;
        let n = [0.0, 0.0, 1.0];
        Self {
            vertices: vec![
                Vertex { position: [-h, -h, 0.0], normal: n, uv: [0.0, 1.0] },
                Vertex { position: [h, -h, 0.0], normal: n, uv: [1.0, 1.0] },
                Vertex { position: [h, h, 0.0], normal: n, uv: [1.0, 0.0] },
                Vertex { position: [-h, h, 0.0], normal: n, uv: [0.0, 0.0] },
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Axis-aligned box centered at the origin, four vertices per face.
    pub fn cuboid(half: Vec3) -> Self {
        let mut data = Self::default();

        // (normal, u axis, v axis); u x v == normal keeps every face CCW from outside.
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        for (normal, u, v) in faces {
            let base = data.vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (normal + u * su + v * sv) * half;
                data.vertices.push(Vertex {
                    position: p.to_array(),
                    normal: normal.to_array(),
                    uv: [(su + 1.0) * 0.5, (1.0 - sv) * 0.5],
                });
            }
            data.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        data
    }

    /// Uploads into vertex/index buffers.
    pub fn upload(&self, device: &wgpu::Device, label: &str) -> Mesh {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Mesh {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// GPU geometry buffers.
#[derive(Debug)]
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Mesh {
    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
