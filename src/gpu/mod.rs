//! GPU implementation of the blur pipeline using wgpu
//!
//! `device` owns adapter selection and loss tracking, `renderer` ties the
//! scene and blur pipelines to the three frame textures, and `pipelines`
//! composites the result onto a window surface.

pub mod blur;
pub mod context;
pub mod device;
pub mod pipelines;
pub mod readback;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod targets;

pub use context::GpuContext;
pub use device::{probe, DeviceSlot, GpuDevice, SlotState};
pub use pipelines::DisplayPipeline;
pub use renderer::BlurRenderer;

/// Format of the scene and working textures
pub const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
