//! Distance falloff of the blur strength

/// Below this intensity the filter is narrowed instead of applied at full width
pub const INTENSITY_THRESHOLD: f32 = 0.1;

/// Narrowest filter the kernel ever applies
pub const MIN_FILTER_DIM: u32 = 3;

/// Gaussian-shaped falloff, exactly zero at and beyond `max_radius`.
///
/// `exp(-(d / r)² · decay)` for `d < r`.
pub fn blur_intensity(distance: f32, max_radius: f32, decay_factor: f32) -> f32 {
    if distance < max_radius {
        let normalized = distance / max_radius;
        (-normalized * normalized * decay_factor).exp()
    } else {
        0.0
    }
}

/// Filter width actually used at a texel of the given intensity.
///
/// Always odd, at least `MIN_FILTER_DIM`, never wider than `filter_dim`.
pub fn effective_filter_dim(filter_dim: u32, intensity: f32) -> u32 {
    if intensity >= INTENSITY_THRESHOLD {
        return filter_dim;
    }
    let scaled = (filter_dim as f32 * intensity * 10.0).round();
    // NaN and negatives saturate to 0 here
    let mut dim = (scaled as u32).max(MIN_FILTER_DIM);
    if dim % 2 == 0 {
        dim += 1;
    }
    dim.min(filter_dim.max(MIN_FILTER_DIM))
}
