//! Headless GPU context creation.

use std::sync::Arc;

use crate::error::{BackendError, Result};

/// A shared headless device/queue pair.
///
/// Created once and cloned cheaply via `Arc`; presentation surfaces are
/// out of scope, render into textures instead.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create a context, blocking on adapter and device acquisition.
    pub fn new_sync() -> Result<Arc<Self>> {
        pollster::block_on(Self::new())
    }

    /// Create a context asynchronously.
    pub async fn new() -> Result<Arc<Self>> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(BackendError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Starling Device"),
                ..Default::default()
            })
            .await
            .map_err(BackendError::DeviceRequest)?;

        tracing::info!(adapter = %adapter.get_info().name, "created GPU context");

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
        }))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Adapter info, for logs and diagnostics.
    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }
}
