//! Error types shared by the CPU and GPU paths

use thiserror::Error;

/// Reasons the platform cannot run the GPU pipeline.
///
/// Reported once, before any pipeline is built.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("no compatible GPU adapter was found")]
    NoAdapter,
    #[error("adapter '{adapter}' does not support compute shaders")]
    NoComputeSupport { adapter: String },
    #[error("adapter rejected the device request: {0}")]
    DeviceRejected(String),
    #[error("failed to create rendering surface: {0}")]
    Surface(String),
    #[error("GPU device was lost: {0}")]
    DeviceLost(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("filter size {0} is too large for a {tile}-texel tile", tile = crate::blur::TILE_DIM)]
    FilterTooLarge(u32),
    #[error("max radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("decay factor must be non-negative and finite, got {0}")]
    InvalidDecay(f32),
    #[error("surface size must be non-zero, got {0}x{1}")]
    InvalidSurfaceSize(u32, u32),
    #[error("surface size {width}x{height} exceeds the {max} texel limit")]
    SurfaceTooLarge { width: u32, height: u32, max: u32 },
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),
    #[error("missing value for '{0}'")]
    MissingValue(String),
    #[error("invalid value '{value}' for '{flag}'")]
    InvalidValue { flag: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShaderError {
    #[error("shader '{shader}' references undefined constant '{name}'")]
    UnresolvedConstant { shader: String, name: String },
    #[error("shader '{shader}' failed to render: {detail}")]
    Template { shader: String, detail: String },
}

/// Violations of the buffer ping-pong between blur passes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("pass {pass} binds {buffer:?} as both input and output")]
    AliasedBuffers { pass: usize, buffer: crate::blur::BufferId },
    #[error("first pass must read the scene buffer, reads {0:?}")]
    SceneNotFirst(crate::blur::BufferId),
    #[error("pass 2 reads {found:?} but pass 1 wrote {expected:?}")]
    BrokenChain {
        expected: crate::blur::BufferId,
        found: crate::blur::BufferId,
    },
    #[error("both passes filter along the same axis ({0:?})")]
    SameDirection(crate::blur::PassDirection),
    #[error("pass {pass} writes the scene buffer")]
    WritesScene { pass: usize },
    #[error("pass {pass} must be {expected:?}, got {found:?}")]
    NotStandard {
        pass: usize,
        expected: crate::blur::PassBinding,
        found: crate::blur::PassBinding,
    },
}

/// Top-level error for viewers, snapshots and the CLI.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("texture readback failed: {0}")]
    Readback(String),
    #[error("window error: {0}")]
    Window(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
