//! Draws the scene (gradient + text strokes) into the scene texture

use super::device::GpuDevice;
use super::shader::{wgsl_f32, wgsl_vec3, ShaderTemplate, FULLSCREEN_PRELUDE};
use super::FRAME_FORMAT;
use crate::error::ShaderError;
use crate::frame::Rgba;
use crate::scene::Scene;

const SCENE_WGSL: &str = include_str!("shaders/scene.wgsl");

fn color_literal(color: Rgba) -> String {
    wgsl_vec3(color.r, color.g, color.b)
}

/// Scene shader with the stroke table and colors baked in
pub fn scene_shader(scene: &Scene) -> ShaderTemplate<'static> {
    let strokes = if scene.strokes.is_empty() {
        // WGSL has no zero-length arrays
        "    vec4<f32>(0.0, 0.0, 0.0, 0.0)".to_string()
    } else {
        scene
            .strokes
            .iter()
            .map(|s| {
                format!(
                    "    vec4<f32>({}, {}, {}, {})",
                    wgsl_f32(s.x0),
                    wgsl_f32(s.y0),
                    wgsl_f32(s.x1),
                    wgsl_f32(s.y1)
                )
            })
            .collect::<Vec<_>>()
            .join(",\n")
    };

    ShaderTemplate::new("Scene Shader", SCENE_WGSL)
        .with_prelude(FULLSCREEN_PRELUDE)
        .define("STROKE_COUNT", scene.strokes.len())
        .define("STROKE_ARRAY_LEN", scene.strokes.len().max(1))
        .define("GRADIENT_START", color_literal(scene.gradient_start))
        .define("GRADIENT_END", color_literal(scene.gradient_end))
        .define("TEXT_COLOR", color_literal(scene.text_color))
        .define("STROKES", strokes)
}

/// Fullscreen render pipeline producing the scene texture
pub struct ScenePipeline {
    render_pipeline: wgpu::RenderPipeline,
}

impl ScenePipeline {
    pub fn new(gpu: &GpuDevice, scene: &Scene) -> Result<Self, ShaderError> {
        let device = &gpu.device;
        let shader = scene_shader(scene).build(device)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_fullscreen"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_scene"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: FRAME_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self { render_pipeline })
    }

    /// Record the scene draw into `target`
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.draw(0..3, 0..1);
    }
}
