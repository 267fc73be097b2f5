use crate::error::{EngineError, Result};

use super::GpuInit;

/// Instance/adapter/device/queue shared by everything that touches the GPU.
///
/// All members are reference-counted wgpu handles, so cloning is cheap; the
/// scheduler, materials and unit setups each hold a clone.
#[derive(Clone, Debug)]
pub struct GpuContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    /// Creates a context without a surface.
    pub async fn headless(init: GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });
        Self::with_instance(instance, None, &init).await
    }

    /// Creates a context whose adapter can present to `surface`.
    pub(crate) async fn with_instance(
        instance: wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
        init: &GpuInit,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .map_err(|e| EngineError::Adapter(e.to_string()))?;

        let info = adapter.get_info();
        log::info!(
            "adapter: {} ({:?}, {:?})",
            info.name,
            info.device_type,
            info.backend
        );

        let missing = init.required_features - adapter.features();
        if !missing.is_empty() {
            return Err(EngineError::Unsupported {
                what: format!("features {missing:?}"),
            });
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("vesta-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| EngineError::Device(e.to_string()))?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Fails with `Unsupported` unless `format` can be rendered to, sampled
    /// with `textureLoad`, and copied out for read-back.
    pub fn require_attachment_format(&self, format: wgpu::TextureFormat) -> Result<()> {
        let needed = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;
        let features = self.adapter.get_texture_format_features(format);
        if features.allowed_usages.contains(needed) {
            Ok(())
        } else {
            Err(EngineError::Unsupported {
                what: format!("{format:?} as a readable render attachment"),
            })
        }
    }
}
