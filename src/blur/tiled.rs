//! CPU execution of the tiled blur kernel
//!
//! Mirrors `gpu/shaders/tiled_blur.wgsl` workgroup by workgroup:
//! 1. every invocation loads `BATCH x BATCH` texels into the shared tile
//! 2. barrier
//! 3. every invocation filters its texels from the tile and writes them
//!
//! Workgroups run in parallel on the rayon pool. Each one returns its writes
//! instead of touching the output, so the overlap between neighbouring
//! tiles is resolved after all groups finish.

use rayon::prelude::*;

use super::plan::dispatch_size;
use super::{effective_filter_dim, BlurParams, PassDirection, PointerParams, BATCH, TILE_DIM, WORKGROUP_SIZE};
use crate::frame::{clamp_coord, FrameBuffer, Rgba};

const TILE_ROWS: usize = BATCH as usize;
const TILE_COLS: usize = TILE_DIM as usize;

type Tile = [[[f32; 3]; TILE_COLS]; TILE_ROWS];

/// A single texel written by a workgroup
#[derive(Debug, Clone, Copy)]
pub struct TexelWrite {
    pub x: u32,
    pub y: u32,
    pub color: Rgba,
}

/// Tiled separable box blur with a pointer-driven filter width
#[derive(Debug, Clone, Copy)]
pub struct TiledBlur {
    params: BlurParams,
}

impl TiledBlur {
    pub fn new(params: BlurParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BlurParams {
        &self.params
    }

    /// Run one pass over `input`, writing into `output`.
    ///
    /// Texels that no workgroup owns keep their previous value in `output`.
    pub fn run_pass(
        &self,
        input: &FrameBuffer,
        output: &mut FrameBuffer,
        pointer: &PointerParams,
        direction: PassDirection,
    ) {
        assert_eq!(input.dims(), output.dims(), "pass input and output sizes differ");
        let (groups_x, groups_y) = dispatch_size(direction, input.dims(), &self.params);

        let writes: Vec<Vec<TexelWrite>> = (0..groups_x * groups_y)
            .into_par_iter()
            .map(|i| self.run_workgroup(input, pointer, direction, (i % groups_x, i / groups_x)))
            .collect();

        let mut count = 0usize;
        for write in writes.iter().flatten() {
            output.store(write.x, write.y, write.color);
            count += 1;
        }
        log::debug!(
            "{:?} pass: {}x{} workgroups, {} texel writes",
            direction,
            groups_x,
            groups_y,
            count
        );
    }

    /// Tile origin for one invocation, in pass-oriented coordinates
    pub fn base_index(&self, group: (u32, u32), local_x: u32) -> (i64, i64) {
        let x = group.0 as i64 * self.params.block_dim as i64 + (local_x * BATCH) as i64
            - self.params.filter_offset() as i64;
        let y = group.1 as i64 * BATCH as i64;
        (x, y)
    }

    /// Texel an invocation loads into `tile[row][BATCH * local_x + col]`
    pub fn load_coord(
        &self,
        group: (u32, u32),
        local_x: u32,
        row: u32,
        col: u32,
        direction: PassDirection,
        dims: (u32, u32),
    ) -> (u32, u32) {
        let base = self.base_index(group, local_x);
        let (x, y) = direction.orient((base.0 + col as i64, base.1 + row as i64));
        clamp_coord(x, y, dims)
    }

    /// Execute one workgroup and return the texels it writes
    pub fn run_workgroup(
        &self,
        input: &FrameBuffer,
        pointer: &PointerParams,
        direction: PassDirection,
        group: (u32, u32),
    ) -> Vec<TexelWrite> {
        let dims = input.dims();
        let mut tile: Tile = [[[0.0; 3]; TILE_COLS]; TILE_ROWS];

        for local_x in 0..WORKGROUP_SIZE {
            for row in 0..BATCH {
                for col in 0..BATCH {
                    let (x, y) = self.load_coord(group, local_x, row, col, direction, dims);
                    let texel = input.texel(x, y);
                    tile[row as usize][(BATCH * local_x + col) as usize] = [texel.r, texel.g, texel.b];
                }
            }
        }

        // Barrier: the filter phase below only starts once the whole tile is loaded.

        let filter_offset = self.params.filter_offset() as i64;
        let mut writes = Vec::with_capacity((WORKGROUP_SIZE * BATCH * BATCH) as usize);

        for local_x in 0..WORKGROUP_SIZE {
            let base = self.base_index(group, local_x);
            for row in 0..BATCH {
                for col in 0..BATCH {
                    let (wx, wy) = direction.orient((base.0 + col as i64, base.1 + row as i64));
                    let center = (BATCH * local_x + col) as i64;

                    let owned = center >= filter_offset && center < TILE_DIM as i64 - filter_offset;
                    let inside = wx >= 0 && wy >= 0 && wx < dims.0 as i64 && wy < dims.1 as i64;
                    if !owned || !inside {
                        continue;
                    }

                    let uv = (
                        (wx as f32 + 0.5) / dims.0 as f32,
                        (wy as f32 + 0.5) / dims.1 as f32,
                    );
                    let filter_dim = effective_filter_dim(self.params.filter_dim, pointer.intensity_at(uv));
                    let color = filter_tile_row(&tile[row as usize], center, filter_dim);

                    writes.push(TexelWrite {
                        x: wx as u32,
                        y: wy as u32,
                        color,
                    });
                }
            }
        }

        writes
    }
}

/// Uniform box average of `filter_dim` tile entries centred on `center`
fn filter_tile_row(row: &[[f32; 3]; TILE_COLS], center: i64, filter_dim: u32) -> Rgba {
    let offset = (filter_dim as i64 - 1) / 2;
    let weight = 1.0 / filter_dim as f32;
    let mut acc = [0.0f32; 3];

    for f in 0..filter_dim as i64 {
        let i = center + f - offset;
        if i >= 0 && i < TILE_DIM as i64 {
            let texel = row[i as usize];
            acc[0] += weight * texel[0];
            acc[1] += weight * texel[1];
            acc[2] += weight * texel[2];
        }
    }

    Rgba::rgb(acc[0], acc[1], acc[2])
}
