//! Owns the frame textures and the scene and blur pipelines

use super::blur::TiledBlurPipeline;
use super::device::GpuDevice;
use super::readback::read_texture;
use super::scene::ScenePipeline;
use super::targets::FrameTargets;
use crate::blur::{BlurParams, BufferId, FramePlan, PointerParams};
use crate::error::GalleryError;
use crate::frame::FrameBuffer;
use crate::scene::Scene;

pub struct BlurRenderer {
    targets: FrameTargets,
    scene: ScenePipeline,
    blur: TiledBlurPipeline,
    plan: FramePlan,
}

impl BlurRenderer {
    /// Build all pipelines for `size` and draw the scene once
    pub fn new(
        gpu: &GpuDevice,
        size: (u32, u32),
        params: BlurParams,
        scene: &Scene,
        plan: FramePlan,
    ) -> Result<Self, GalleryError> {
        let targets = FrameTargets::new(gpu, size);
        let scene_pipeline = ScenePipeline::new(gpu, scene)?;
        let blur = TiledBlurPipeline::new(gpu, &targets, params, &plan)?;

        let renderer = Self {
            targets,
            scene: scene_pipeline,
            blur,
            plan,
        };
        renderer.redraw_scene(gpu);
        log::info!(
            "GPU blur ready: {}x{}, filter {} (block {})",
            size.0,
            size.1,
            params.filter_dim,
            params.block_dim
        );
        Ok(renderer)
    }

    /// Re-render the scene texture
    pub fn redraw_scene(&self, gpu: &GpuDevice) {
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });
        self.scene.encode(&mut encoder, self.targets.view(BufferId::Scene));
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Upload the pointer and record both blur passes
    pub fn encode_frame(&self, gpu: &GpuDevice, encoder: &mut wgpu::CommandEncoder, pointer: &PointerParams) {
        self.blur.update_pointer(gpu, pointer);
        self.blur.encode(encoder);
    }

    /// View of the buffer the compositor presents
    pub fn presented_view(&self) -> &wgpu::TextureView {
        self.targets.view(self.plan.presented())
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    pub fn blur(&self) -> &TiledBlurPipeline {
        &self.blur
    }

    pub fn size(&self) -> (u32, u32) {
        self.targets.size()
    }

    /// Copy any of the three buffers back to the CPU
    pub fn read_buffer(&self, gpu: &GpuDevice, id: BufferId) -> Result<FrameBuffer, GalleryError> {
        read_texture(gpu, &self.targets.get(id).texture, self.targets.size())
    }

    /// Run one frame without a surface and return the presented buffer
    pub fn render_offscreen(&self, gpu: &GpuDevice, pointer: &PointerParams) -> Result<FrameBuffer, GalleryError> {
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Frame Encoder"),
            });
        self.encode_frame(gpu, &mut encoder, pointer);
        gpu.queue.submit(std::iter::once(encoder.finish()));

        self.read_buffer(gpu, self.plan.presented())
    }
}
