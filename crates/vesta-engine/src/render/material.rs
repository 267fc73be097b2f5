use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::rc::Rc;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use crate::assets::ShaderProgram;
use crate::device::GpuContext;
use crate::error::{EngineError, Result};
use crate::scene::Vertex;

use super::target::{AttachmentMask, DEPTH_FORMAT};

/// A sampled 2-D texture owned by one or more materials.
#[derive(Debug)]
pub struct MaterialTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MaterialTexture {
    /// Uploads tightly packed sRGB RGBA8 pixels.
    pub fn from_rgba8(
        context: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Rc<Self>> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected || expected == 0 {
            return Err(EngineError::TextureData {
                expected,
                actual: pixels.len(),
            });
        }

        let texture = context.device().create_texture_with_data(
            context.queue(),
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Rc::new(Self { texture, view }))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Everything a material needs besides its program.
#[derive(Debug, Clone)]
pub struct MaterialDesc {
    pub label: String,
    /// Size of the auxiliary uniform block at `@group(1) @binding(0)`.
    pub aux_size: Option<NonZeroU64>,
    /// Bound at `@group(1) @binding(1..=N)`, followed by one sampler.
    pub textures: Vec<Rc<MaterialTexture>>,
    pub cull_mode: Option<wgpu::Face>,
    pub depth_write: bool,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            label: "vesta material".to_string(),
            aux_size: None,
            textures: Vec::new(),
            cull_mode: None,
            depth_write: true,
        }
    }
}

impl MaterialDesc {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Declares an aux block shaped like `T`.
    pub fn with_aux<T: Pod>(mut self) -> Self {
        self.aux_size = NonZeroU64::new(std::mem::size_of::<T>() as u64);
        self
    }

    pub fn with_texture(mut self, texture: Rc<MaterialTexture>) -> Self {
        self.textures.push(texture);
        self
    }

    pub fn with_cull_mode(mut self, face: wgpu::Face) -> Self {
        self.cull_mode = Some(face);
        self
    }

    pub fn with_depth_write(mut self, enabled: bool) -> Self {
        self.depth_write = enabled;
        self
    }
}

/// Creates materials compatible with one scheduler's render target.
#[derive(Clone)]
pub struct MaterialFactory {
    context: GpuContext,
    formats: Rc<[wgpu::TextureFormat]>,
    uniform_layout: wgpu::BindGroupLayout,
}

impl MaterialFactory {
    pub(crate) fn new(
        context: GpuContext,
        formats: impl IntoIterator<Item = wgpu::TextureFormat>,
        uniform_layout: wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            context,
            formats: formats.into_iter().collect(),
            uniform_layout,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// Attachment formats every pipeline writes, in target index order.
    pub fn target_formats(&self) -> &[wgpu::TextureFormat] {
        &self.formats
    }

    pub fn create(&self, program: Rc<ShaderProgram>, desc: MaterialDesc) -> Result<Rc<Material>> {
        let device = self.context.device();

        let mut entries = Vec::new();
        if let Some(size) = desc.aux_size {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(size),
                },
                count: None,
            });
        }
        for i in 0..desc.textures.len() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + i as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        if !desc.textures.is_empty() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + desc.textures.len() as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&desc.label),
            entries: &entries,
        });

        // Rounded up so any std140-padded struct of the declared size fits.
        let aux = desc.aux_size.map(|size| {
            let padded = size.get().div_ceil(16) * 16;
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&desc.label),
                contents: &vec![0u8; padded as usize],
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        });

        let sampler = (!desc.textures.is_empty()).then(|| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(&desc.label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            })
        });

        let mut bindings = Vec::new();
        if let Some(buffer) = &aux {
            bindings.push(wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            });
        }
        for (i, texture) in desc.textures.iter().enumerate() {
            bindings.push(wgpu::BindGroupEntry {
                binding: 1 + i as u32,
                resource: wgpu::BindingResource::TextureView(texture.view()),
            });
        }
        if let Some(sampler) = &sampler {
            bindings.push(wgpu::BindGroupEntry {
                binding: 1 + desc.textures.len() as u32,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&desc.label),
            layout: &layout,
            entries: &bindings,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&desc.label),
            bind_group_layouts: &[&self.uniform_layout, &layout],
            immediate_size: 0,
        });

        let material = Material {
            queue: self.context.queue().clone(),
            device: device.clone(),
            formats: self.formats.clone(),
            program,
            pipeline_layout,
            bind_group,
            aux,
            aux_size: desc.aux_size.map_or(0, NonZeroU64::get),
            textures: desc.textures,
            cull_mode: desc.cull_mode,
            depth_write: desc.depth_write,
            label: desc.label,
            pipelines: RefCell::new(HashMap::new()),
        };

        // The common variant is built up front so the first frame does not stall.
        material.pipeline(AttachmentMask::all(material.formats.len()));
        log::debug!("created material {:?}", material.label);

        Ok(Rc::new(material))
    }
}

/// Program + bindings + per-write-mask pipeline cache.
///
/// Color write masks are pipeline state in wgpu, so every distinct
/// `AttachmentMask` a material is drawn under gets its own pipeline.
pub struct Material {
    label: String,
    device: wgpu::Device,
    queue: wgpu::Queue,
    formats: Rc<[wgpu::TextureFormat]>,
    program: Rc<ShaderProgram>,
    pipeline_layout: wgpu::PipelineLayout,
    bind_group: wgpu::BindGroup,
    aux: Option<wgpu::Buffer>,
    aux_size: u64,
    textures: Vec<Rc<MaterialTexture>>,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    pipelines: RefCell<HashMap<AttachmentMask, wgpu::RenderPipeline>>,
}

impl Material {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn program(&self) -> &Rc<ShaderProgram> {
        &self.program
    }

    pub fn textures(&self) -> &[Rc<MaterialTexture>] {
        &self.textures
    }

    pub fn has_aux(&self) -> bool {
        self.aux.is_some()
    }

    /// Replaces the aux block contents.
    ///
    /// The block is one buffer per material, written through the queue, so
    /// the value is per frame, not per draw: every draw of this material in
    /// a frame sees the last value written before that frame is submitted.
    /// Per-draw values belong in `DrawUniforms` or a separate material.
    pub fn write_aux<T: Pod>(&self, value: &T) -> Result<()> {
        let actual = std::mem::size_of::<T>() as u64;
        match &self.aux {
            Some(buffer) if actual == self.aux_size => {
                self.queue.write_buffer(buffer, 0, bytemuck::bytes_of(value));
                Ok(())
            }
            _ => Err(EngineError::AuxBlockSize {
                expected: self.aux_size,
                actual,
            }),
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Number of pipeline variants built so far.
    pub fn variant_count(&self) -> usize {
        self.pipelines.borrow().len()
    }

    /// Pipeline writing exactly the attachments enabled in `mask`.
    pub fn pipeline(&self, mask: AttachmentMask) -> wgpu::RenderPipeline {
        if let Some(pipeline) = self.pipelines.borrow().get(&mask) {
            return pipeline.clone();
        }

        let pipeline = self.build_pipeline(mask);
        self.pipelines.borrow_mut().insert(mask, pipeline.clone());
        pipeline
    }

    fn build_pipeline(&self, mask: AttachmentMask) -> wgpu::RenderPipeline {
        log::trace!("building {:?} pipeline for mask {:#010b}", self.label, mask.bits());

        let targets: Vec<Option<wgpu::ColorTargetState>> = self
            .formats
            .iter()
            .enumerate()
            .map(|(i, &format)| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: if mask.is_writable(i) {
                        wgpu::ColorWrites::ALL
                    } else {
                        wgpu::ColorWrites::empty()
                    },
                })
            })
            .collect();

        let module = self.program.module();

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&self.label),
                layout: Some(&self.pipeline_layout),

                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some(self.program.vs_entry()),
                    compilation_options: Default::default(),
                    buffers: &[Vertex::layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(self.program.fs_entry()),
                    compilation_options: Default::default(),
                    targets: &targets,
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: self.cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: self.depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            })
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("label", &self.label)
            .field("program", &self.program.label())
            .field("textures", &self.textures.len())
            .field("aux_size", &self.aux_size)
            .field("variants", &self.variant_count())
            .finish()
    }
}
