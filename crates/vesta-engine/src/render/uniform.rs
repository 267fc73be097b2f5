//! Per-draw uniform block shared by every shader.
//!
//! A wgpu render pass cannot rewrite one uniform buffer between draws, so the
//! channel stages one `DrawUniforms` record per queued draw and binds each
//! record through a dynamic offset. From a shader's point of view the block is
//! "rewritten every draw call".

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::unit::UnitId;

/// Fixed-layout record bound at `@group(0) @binding(0)`.
///
/// Must match `struct DrawUniforms` in the WGSL sources:
/// `vec3<f32>` followed by `u32` packs into one 16-byte row.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub transform: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub camera_location: [f32; 3],
    pub identity: u32,
}

pub const DRAW_UNIFORMS_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;

const _: () = assert!(DRAW_UNIFORMS_SIZE == 144);

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// CPU staging for one frame of `DrawUniforms` records.
#[derive(Debug, Clone)]
pub struct UniformSlots {
    stride: u64,
    view_proj: [[f32; 4]; 4],
    camera_location: [f32; 3],
    bytes: Vec<u8>,
    count: u32,
}

impl UniformSlots {
    /// `alignment` is the device's `min_uniform_buffer_offset_alignment`.
    pub fn new(alignment: u32) -> Self {
        Self {
            stride: align_up(DRAW_UNIFORMS_SIZE, u64::from(alignment.max(1))),
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_location: [0.0; 3],
            bytes: Vec::new(),
            count: 0,
        }
    }

    /// Sets the per-frame fields and drops every staged record.
    pub fn begin_frame(&mut self, view_proj: Mat4, camera_location: Vec3) {
        self.view_proj = view_proj.to_cols_array_2d();
        self.camera_location = camera_location.to_array();
        self.bytes.clear();
        self.count = 0;
    }

    /// Stages a record and returns its dynamic offset.
    pub fn push(&mut self, transform: Mat4, identity: UnitId) -> u32 {
        let offset = self.bytes.len() as u64;
        debug_assert_eq!(offset % self.stride, 0);

        let record = DrawUniforms {
            transform: transform.to_cols_array_2d(),
            view_proj: self.view_proj,
            camera_location: self.camera_location,
            identity: identity.get(),
        };
        self.bytes.extend_from_slice(bytemuck::bytes_of(&record));
        self.bytes.resize((offset + self.stride) as usize, 0);
        self.count += 1;

        offset as u32
    }

    /// Record at slot `index`, if staged.
    pub fn record(&self, index: u32) -> Option<DrawUniforms> {
        if index >= self.count {
            return None;
        }
        let start = (u64::from(index) * self.stride) as usize;
        let end = start + DRAW_UNIFORMS_SIZE as usize;
        Some(bytemuck::pod_read_unaligned(&self.bytes[start..end]))
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// GPU side of the per-draw uniform block.
pub struct UniformChannel {
    slots: UniformSlots,
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u64,
}

impl UniformChannel {
    const MIN_CAPACITY: u64 = 64;

    pub fn new(device: &wgpu::Device) -> Self {
        let slots = UniformSlots::new(device.limits().min_uniform_buffer_offset_alignment);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vesta draw uniforms bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DRAW_UNIFORMS_SIZE),
                },
                count: None,
            }],
        });

        let capacity = Self::MIN_CAPACITY;
        let (buffer, bind_group) = Self::allocate(device, &layout, capacity * slots.stride());

        Self {
            slots,
            layout,
            buffer,
            bind_group,
            capacity,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        size: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vesta draw uniforms"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vesta draw uniforms bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(DRAW_UNIFORMS_SIZE),
                }),
            }],
        });

        (buffer, bind_group)
    }

    /// Layout of bind group 0; every material pipeline layout starts with it.
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn slots(&self) -> &UniformSlots {
        &self.slots
    }

    pub fn begin_frame(&mut self, view_proj: Mat4, camera_location: Vec3) {
        self.slots.begin_frame(view_proj, camera_location);
    }

    pub fn push(&mut self, transform: Mat4, identity: UnitId) -> u32 {
        self.slots.push(transform, identity)
    }

    /// Uploads the staged records, growing the buffer when needed.
    ///
    /// Growing replaces the bind group, so call this before recording draws.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let needed = u64::from(self.slots.len());
        if needed > self.capacity {
            let capacity = needed.next_power_of_two().max(Self::MIN_CAPACITY);
            log::debug!("uniform channel grows to {capacity} slots");
            let (buffer, bind_group) =
                Self::allocate(device, &self.layout, capacity * self.slots.stride());
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }

        if !self.slots.is_empty() {
            queue.write_buffer(&self.buffer, 0, self.slots.as_bytes());
        }
    }
}
