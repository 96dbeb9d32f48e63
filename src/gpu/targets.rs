//! The scene texture and the two working textures of a frame

use super::device::GpuDevice;
use super::FRAME_FORMAT;
use crate::blur::BufferId;

/// A texture together with its default view
pub struct Target {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Target {
    fn new(gpu: &GpuDevice, label: &str, size: (u32, u32), usage: wgpu::TextureUsages) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        Self { texture, view }
    }
}

/// All three frame buffers, sized to the surface
pub struct FrameTargets {
    scene: Target,
    working_a: Target,
    working_b: Target,
    size: (u32, u32),
}

impl FrameTargets {
    pub fn new(gpu: &GpuDevice, size: (u32, u32)) -> Self {
        let scene_usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;
        let working_usage = wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;

        Self {
            scene: Target::new(gpu, "Scene Texture", size, scene_usage),
            working_a: Target::new(gpu, "Working Texture A", size, working_usage),
            working_b: Target::new(gpu, "Working Texture B", size, working_usage),
            size,
        }
    }

    pub fn get(&self, id: BufferId) -> &Target {
        match id {
            BufferId::Scene => &self.scene,
            BufferId::WorkingA => &self.working_a,
            BufferId::WorkingB => &self.working_b,
        }
    }

    pub fn view(&self, id: BufferId) -> &wgpu::TextureView {
        &self.get(id).view
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}
