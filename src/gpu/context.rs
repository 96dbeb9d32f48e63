//! Window surface setup on top of a shared device

use std::sync::Arc;
use winit::window::Window;

use super::device::GpuDevice;
use crate::error::CapabilityError;

/// Surface and configuration for one window
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub gpu: Arc<GpuDevice>,
    pub config: wgpu::SurfaceConfiguration,
    pub size: (u32, u32),
    // Keep window alive (surface borrows from it)
    window: Arc<Window>,
}

impl GpuContext {
    /// Create a surface for `window` on the device held by `gpu`
    pub fn new(window: Arc<Window>, gpu: Arc<GpuDevice>) -> Result<Self, CapabilityError> {
        let size = window.inner_size();
        let size = (size.width.max(1), size.height.max(1));

        let surface = gpu
            .instance
            .create_surface(window.clone())
            .map_err(|e| CapabilityError::Surface(e.to_string()))?;

        if !gpu.adapter.is_surface_supported(&surface) {
            return Err(CapabilityError::Surface(format!(
                "adapter '{}' cannot present to this window",
                gpu.adapter.get_info().name
            )));
        }

        // Linear format: the blur writes unorm bytes that should reach the
        // screen unchanged
        let surface_caps = surface.get_capabilities(&gpu.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| CapabilityError::Surface("surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0,
            height: size.1,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);
        log::info!("Surface configured: {}x{} {:?}", size.0, size.1, surface_format);

        Ok(Self {
            surface,
            gpu,
            config,
            size,
            window,
        })
    }

    /// Reconfigure after the surface was lost or outdated
    pub fn reconfigure(&self) {
        self.surface.configure(&self.gpu.device, &self.config);
    }

    /// Get the surface texture format
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Request a redraw of the window
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}
