//! Direct 2-D box blur, used to check the separable passes

use crate::frame::{FrameBuffer, Rgba};

/// Clamp-to-edge 2-D box blur with a square `filter_dim x filter_dim` window.
///
/// Computed in floating point straight from the source, with no
/// intermediate quantization.
pub fn box_blur_2d(input: &FrameBuffer, filter_dim: u32) -> FrameBuffer {
    let offset = (filter_dim as i64 - 1) / 2;
    let weight = 1.0 / (filter_dim * filter_dim) as f32;

    FrameBuffer::from_fn(input.width(), input.height(), |x, y| {
        let mut acc = [0.0f32; 3];
        for dy in -offset..=offset {
            for dx in -offset..=offset {
                let texel = input.texel_clamped(x as i64 + dx, y as i64 + dy);
                acc[0] += weight * texel.r;
                acc[1] += weight * texel.g;
                acc[2] += weight * texel.b;
            }
        }
        Rgba::rgb(acc[0], acc[1], acc[2])
    })
}
