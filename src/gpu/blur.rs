//! Tiled separable blur on the GPU
//!
//! One compute pipeline, dispatched twice per frame. Group 0 carries the
//! session-constant parameters and the per-frame pointer uniform; group 1
//! binds one pass's input, output and flip flag. Both dispatches are
//! recorded into a single compute pass, the vertical one reading the
//! texture the horizontal one wrote.

use super::device::GpuDevice;
use super::shader::{wgsl_f32, ShaderTemplate};
use super::targets::FrameTargets;
use super::FRAME_FORMAT;
use crate::blur::{
    BlurParams, FramePlan, PassBinding, PointerParams, BATCH, INTENSITY_THRESHOLD, MIN_FILTER_DIM, TILE_DIM,
    WORKGROUP_SIZE,
};
use crate::error::ShaderError;

const TILED_BLUR_WGSL: &str = include_str!("shaders/tiled_blur.wgsl");

/// Session-constant kernel parameters as laid out in the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurUniforms {
    pub filter_dim: i32,
    pub block_dim: u32,
    pub _padding: [u32; 2],
}

impl From<&BlurParams> for BlurUniforms {
    fn from(params: &BlurParams) -> Self {
        Self {
            filter_dim: params.filter_dim as i32,
            block_dim: params.block_dim,
            _padding: [0; 2],
        }
    }
}

/// Pointer position and falloff, rewritten every frame
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointerUniforms {
    pub position: [f32; 2],
    pub max_radius: f32,
    pub decay_factor: f32,
}

impl From<&PointerParams> for PointerUniforms {
    fn from(pointer: &PointerParams) -> Self {
        Self {
            position: [pointer.position.0, pointer.position.1],
            max_radius: pointer.max_radius,
            decay_factor: pointer.decay_factor,
        }
    }
}

/// Per-pass axis selector (0 = horizontal, 1 = vertical)
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FlipUniforms {
    pub value: u32,
    pub _padding: [u32; 3],
}

/// Blur kernel source with the tiling constants injected
pub fn tiled_blur_shader() -> ShaderTemplate<'static> {
    ShaderTemplate::new("Tiled Blur Shader", TILED_BLUR_WGSL)
        .define("TILE_DIM", TILE_DIM)
        .define("BATCH", BATCH)
        .define("WORKGROUP_SIZE", WORKGROUP_SIZE)
        .define("INTENSITY_THRESHOLD", wgsl_f32(INTENSITY_THRESHOLD))
        .define("MIN_FILTER_DIM", MIN_FILTER_DIM)
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// One dispatch: its bind group and workgroup grid
struct BlurPass {
    binding: PassBinding,
    bind_group: wgpu::BindGroup,
    workgroups: (u32, u32),
    // Kept alive for the bind group
    _flip_buffer: wgpu::Buffer,
}

/// Compute pipeline plus the bind groups for both passes of a `FramePlan`
pub struct TiledBlurPipeline {
    pipeline: wgpu::ComputePipeline,
    constants_bind_group: wgpu::BindGroup,
    pointer_buffer: wgpu::Buffer,
    _params_buffer: wgpu::Buffer,
    _sampler: wgpu::Sampler,
    passes: [BlurPass; 2],
    params: BlurParams,
}

impl TiledBlurPipeline {
    pub fn new(
        gpu: &GpuDevice,
        targets: &FrameTargets,
        params: BlurParams,
        plan: &FramePlan,
    ) -> Result<Self, ShaderError> {
        let device = &gpu.device;
        let shader = tiled_blur_shader().build(device)?;

        // Loads land on texel centres; nearest keeps them exact
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blur Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let constants_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blur Constants Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                uniform_entry(1),
                uniform_entry(2),
            ],
        });

        let pass_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blur Pass Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: FRAME_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                uniform_entry(2),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blur Pipeline Layout"),
            bind_group_layouts: &[&constants_layout, &pass_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Tiled Blur Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("blur_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Blur Params Buffer"),
            size: std::mem::size_of::<BlurUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue
            .write_buffer(&params_buffer, 0, bytemuck::bytes_of(&BlurUniforms::from(&params)));

        let pointer_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pointer Params Buffer"),
            size: std::mem::size_of::<PointerUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue.write_buffer(
            &pointer_buffer,
            0,
            bytemuck::bytes_of(&PointerUniforms::from(&PointerParams::default())),
        );

        let constants_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blur Constants Bind Group"),
            layout: &constants_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: pointer_buffer.as_entire_binding(),
                },
            ],
        });

        let make_pass = |index: usize, binding: PassBinding| {
            let flip_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(format!("Blur Flip Buffer {index}").as_str()),
                size: std::mem::size_of::<FlipUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let flip = FlipUniforms {
                value: binding.direction.flip_value(),
                _padding: [0; 3],
            };
            gpu.queue.write_buffer(&flip_buffer, 0, bytemuck::bytes_of(&flip));

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(format!("Blur Pass {index} Bind Group").as_str()),
                layout: &pass_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(targets.view(binding.input)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(targets.view(binding.output)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: flip_buffer.as_entire_binding(),
                    },
                ],
            });

            let workgroups = binding.workgroups(targets.size(), &params);
            log::debug!(
                "Blur pass {}: {:?} {:?} -> {:?}, {}x{} workgroups",
                index,
                binding.direction,
                binding.input,
                binding.output,
                workgroups.0,
                workgroups.1
            );

            BlurPass {
                binding,
                bind_group,
                workgroups,
                _flip_buffer: flip_buffer,
            }
        };

        let [first, second] = *plan.passes();
        let passes = [make_pass(1, first), make_pass(2, second)];

        Ok(Self {
            pipeline,
            constants_bind_group,
            pointer_buffer,
            _params_buffer: params_buffer,
            _sampler: sampler,
            passes,
            params,
        })
    }

    pub fn params(&self) -> &BlurParams {
        &self.params
    }

    /// Bindings of both passes, in dispatch order
    pub fn bindings(&self) -> [PassBinding; 2] {
        [self.passes[0].binding, self.passes[1].binding]
    }

    /// Upload this frame's pointer parameters
    pub fn update_pointer(&self, gpu: &GpuDevice, pointer: &PointerParams) {
        gpu.queue
            .write_buffer(&self.pointer_buffer, 0, bytemuck::bytes_of(&PointerUniforms::from(pointer)));
    }

    /// Record both dispatches
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Tiled Blur Pass"),
            timestamp_writes: None,
        });

        compute_pass.set_pipeline(&self.pipeline);
        compute_pass.set_bind_group(0, &self.constants_bind_group, &[]);
        for pass in &self.passes {
            compute_pass.set_bind_group(1, &pass.bind_group, &[]);
            compute_pass.dispatch_workgroups(pass.workgroups.0, pass.workgroups.1, 1);
        }
    }
}
