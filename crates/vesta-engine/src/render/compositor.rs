//! Final pass: copies the off-screen target onto the visible surface.
//!
//! Every attachment is bound for `textureLoad`, so the composite program can
//! show any of them. Bindings: 0 = params, 1 = color, 2 = identity,
//! 3 = position, 4.. = custom attachments in target index order.

use std::cell::OnceCell;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::assets::{builtin, compile_program, ShaderProgram};
use crate::device::GpuContext;
use crate::error::{EngineError, Result};

use super::target::{AttachmentLayout, AttachmentRole, RenderTarget};

/// Which attachment the built-in composite program shows.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[repr(u32)]
pub enum CompositeView {
    #[default]
    Color = 0,
    /// Identity tags in false color, background black.
    Identity = 1,
    /// `fract` of the world position.
    Position = 2,
}

impl CompositeView {
    pub fn next(self) -> Self {
        match self {
            Self::Color => Self::Identity,
            Self::Identity => Self::Position,
            Self::Position => Self::Color,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CompositeParams {
    view: u32,
    _pad: [u32; 3],
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct CompositeBinding {
    binding: u32,
    attachment: usize,
    sample_type: wgpu::TextureSampleType,
}

fn sample_type(format: wgpu::TextureFormat) -> wgpu::TextureSampleType {
    match format {
        wgpu::TextureFormat::R32Uint => wgpu::TextureSampleType::Uint,
        wgpu::TextureFormat::R32Sint => wgpu::TextureSampleType::Sint,
        _ => wgpu::TextureSampleType::Float { filterable: false },
    }
}

fn composite_bindings(layout: &AttachmentLayout) -> Vec<CompositeBinding> {
    let mut bindings = Vec::with_capacity(layout.len());
    let mut next_custom = 4;

    for (attachment, spec) in layout.specs().iter().enumerate() {
        let binding = match spec.role {
            AttachmentRole::Color => 1,
            AttachmentRole::Identity => 2,
            AttachmentRole::Position => 3,
            AttachmentRole::Custom(_) => {
                next_custom += 1;
                next_custom - 1
            }
        };
        bindings.push(CompositeBinding {
            binding,
            attachment,
            sample_type: sample_type(spec.format),
        });
    }

    bindings.sort_by_key(|b| b.binding);
    bindings
}

pub struct Compositor {
    program: OnceCell<Rc<ShaderProgram>>,
    view: CompositeView,
    view_dirty: bool,
    bindings: Vec<CompositeBinding>,
    params: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipeline: Option<(wgpu::TextureFormat, wgpu::RenderPipeline)>,
    bind_group: Option<(u64, wgpu::BindGroup)>,
}

impl Compositor {
    pub fn new(device: &wgpu::Device, target_layout: &AttachmentLayout) -> Self {
        let bindings = composite_bindings(target_layout);

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        entries.extend(bindings.iter().map(|b| wgpu::BindGroupLayoutEntry {
            binding: b.binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: b.sample_type,
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }));

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vesta composite bgl"),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vesta composite pipeline layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vesta composite params"),
            contents: bytemuck::bytes_of(&CompositeParams {
                view: CompositeView::Color as u32,
                _pad: [0; 3],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            program: OnceCell::new(),
            view: CompositeView::Color,
            view_dirty: false,
            bindings,
            params,
            layout,
            pipeline_layout,
            pipeline: None,
            bind_group: None,
        }
    }

    /// Assigns the composite program. Allowed once; the built-in program is
    /// assigned implicitly by the first composite.
    pub fn set_program(&self, program: Rc<ShaderProgram>) -> Result<()> {
        self.program
            .set(program)
            .map_err(|_| EngineError::CompositeAlreadyAssigned)
    }

    pub fn has_program(&self) -> bool {
        self.program.get().is_some()
    }

    pub fn view(&self) -> CompositeView {
        self.view
    }

    pub fn set_view(&mut self, view: CompositeView) {
        if self.view != view {
            self.view = view;
            self.view_dirty = true;
        }
    }

    fn program(&self, device: &wgpu::Device) -> Result<&Rc<ShaderProgram>> {
        if self.program.get().is_none() {
            let source = builtin::source(builtin::COMPOSITE)
                .ok_or_else(|| EngineError::AssetNotFound(builtin::COMPOSITE.to_string()))?;
            let program = compile_program(device, builtin::COMPOSITE, source)?;
            // Empty cell checked above; nothing else can fill it in between.
            let _ = self.program.set(program);
        }
        self.program
            .get()
            .ok_or(EngineError::CompositeAlreadyAssigned)
    }

    fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Result<()> {
        if matches!(&self.pipeline, Some((f, _)) if *f == format) {
            return Ok(());
        }

        let program = self.program(device)?.clone();
        let module = program.module();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("vesta composite pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module,
                entry_point: Some(program.vs_entry()),
                compilation_options: Default::default(),
                buffers: &[],
            },

            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some(program.fs_entry()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        log::debug!("composite pipeline built for {format:?}");
        self.pipeline = Some((format, pipeline));
        Ok(())
    }

    fn ensure_bind_group(&mut self, device: &wgpu::Device, target: &RenderTarget) -> Result<()> {
        if matches!(&self.bind_group, Some((g, _)) if *g == target.generation()) {
            return Ok(());
        }

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: self.params.as_entire_binding(),
        }];
        for b in &self.bindings {
            let view = target.view(b.attachment).ok_or(EngineError::AttachmentIndex {
                index: b.attachment,
                count: target.attachment_count(),
            })?;
            entries.push(wgpu::BindGroupEntry {
                binding: b.binding,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vesta composite bind group"),
            layout: &self.layout,
            entries: &entries,
        });

        self.bind_group = Some((target.generation(), bind_group));
        Ok(())
    }

    /// Records the composite pass into `encoder`.
    pub fn render(
        &mut self,
        context: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &RenderTarget,
        surface: &wgpu::TextureView,
        surface_format: wgpu::TextureFormat,
    ) -> Result<()> {
        let device = context.device();
        self.ensure_pipeline(device, surface_format)?;
        self.ensure_bind_group(device, target)?;

        if self.view_dirty {
            context.queue().write_buffer(
                &self.params,
                0,
                bytemuck::bytes_of(&CompositeParams {
                    view: self.view as u32,
                    _pad: [0; 3],
                }),
            );
            self.view_dirty = false;
        }

        let (Some((_, pipeline)), Some((_, bind_group))) = (&self.pipeline, &self.bind_group) else {
            return Ok(());
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vesta composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);

        Ok(())
    }
}
