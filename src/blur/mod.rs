//! Pointer-following separable blur
//!
//! The blur is a box filter split into a horizontal and a vertical pass.
//! Each pass is executed as a grid of workgroups that first cooperatively
//! load a `BATCH x TILE_DIM` tile of texels, then filter from the tile.
//! The filter width shrinks with distance from the pointer (see `falloff`).
//!
//! `tiled` emulates the compute kernel on the CPU; the GPU version lives in
//! `gpu::blur` and shares the parameter types, falloff math and pass plan
//! defined here.

pub mod falloff;
pub mod pipeline;
pub mod plan;
pub mod reference;
pub mod tiled;

pub use falloff::{blur_intensity, effective_filter_dim, INTENSITY_THRESHOLD, MIN_FILTER_DIM};
pub use pipeline::CpuBlurPipeline;
pub use plan::{BufferId, FramePlan, PassBinding};
pub use reference::box_blur_2d;
pub use tiled::TiledBlur;

use crate::error::ConfigError;

/// Texels cached per tile row
pub const TILE_DIM: u32 = 128;
/// Rows per tile, and texels loaded per invocation along a row
pub const BATCH: u32 = 4;
/// Invocations per workgroup
pub const WORKGROUP_SIZE: u32 = TILE_DIM / BATCH;

/// Filter axis of one dispatch; the flip flag in the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassDirection {
    Horizontal,
    Vertical,
}

impl PassDirection {
    /// Value uploaded to the kernel's flip uniform
    pub fn flip_value(self) -> u32 {
        match self {
            PassDirection::Horizontal => 0,
            PassDirection::Vertical => 1,
        }
    }

    /// Swap x/y when the pass works along the vertical axis
    #[inline]
    pub fn orient(self, (x, y): (i64, i64)) -> (i64, i64) {
        match self {
            PassDirection::Horizontal => (x, y),
            PassDirection::Vertical => (y, x),
        }
    }
}

/// Session-constant kernel parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurParams {
    /// Odd width of the widest box filter
    pub filter_dim: u32,
    /// Output texels each workgroup is responsible for along the filter axis
    pub block_dim: u32,
}

impl BlurParams {
    /// Derive kernel parameters from a filter-size setting.
    ///
    /// Even sizes are bumped to the next odd width, anything below 3 becomes 3.
    pub fn from_filter_size(filter_size: u32) -> Result<Self, ConfigError> {
        let filter_dim = (filter_size | 1).max(MIN_FILTER_DIM);
        if filter_dim >= TILE_DIM {
            return Err(ConfigError::FilterTooLarge(filter_size));
        }
        Ok(Self {
            filter_dim,
            block_dim: TILE_DIM - filter_dim,
        })
    }

    pub fn filter_offset(&self) -> u32 {
        (self.filter_dim - 1) / 2
    }
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            filter_dim: 15,
            block_dim: TILE_DIM - 15,
        }
    }
}

/// Per-frame pointer input to the kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerParams {
    /// Pointer position in UV space, `[0,1]²`
    pub position: (f32, f32),
    /// Radius of influence in UV units
    pub max_radius: f32,
    /// Steepness of the exponential falloff
    pub decay_factor: f32,
}

impl PointerParams {
    pub fn new(position: (f32, f32), max_radius: f32, decay_factor: f32) -> Self {
        Self {
            position,
            max_radius,
            decay_factor,
        }
    }

    /// Parameters that give full intensity over the whole frame.
    ///
    /// The radius exceeds the UV diagonal and the decay is zero, so every
    /// texel is filtered with the full `filter_dim`.
    pub fn full_strength() -> Self {
        Self {
            position: (0.5, 0.5),
            max_radius: 2.0,
            decay_factor: 0.0,
        }
    }

    /// Intensity for a texel at `uv`
    pub fn intensity_at(&self, uv: (f32, f32)) -> f32 {
        let dx = uv.0 - self.position.0;
        let dy = uv.1 - self.position.1;
        blur_intensity((dx * dx + dy * dy).sqrt(), self.max_radius, self.decay_factor)
    }
}

impl Default for PointerParams {
    fn default() -> Self {
        Self {
            position: (0.5, 0.5),
            max_radius: 0.2,
            decay_factor: 2.0,
        }
    }
}

/// Number of workgroups covering `len` texels in steps of `step`
#[inline]
pub fn group_count(len: u32, step: u32) -> u32 {
    len.div_ceil(step)
}
