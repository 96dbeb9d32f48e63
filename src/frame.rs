//! Frame buffers and colors
//!
//! A `FrameBuffer` is an RGBA8 grid in row-major order, the same layout the
//! GPU textures use. Texels are read back as floating point `Rgba`.

use rayon::prelude::*;

/// RGBA color with floating point components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Rgba { r, g, b, a: 1.0 }
    }

    pub const fn black() -> Self {
        Rgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 }
    }

    /// Linear interpolation of the color channels, alpha forced to 1
    pub fn mix(self, other: Rgba, t: f32) -> Rgba {
        Rgba::rgb(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Rgba::new(
            bytes[0] as f32 / 255.0,
            bytes[1] as f32 / 255.0,
            bytes[2] as f32 / 255.0,
            bytes[3] as f32 / 255.0,
        )
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [to_byte(self.r), to_byte(self.g), to_byte(self.b), to_byte(self.a)]
    }

    /// Largest per-channel difference, ignoring alpha
    pub fn max_channel_diff(self, other: Rgba) -> f32 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
    }

    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

/// Convert a float value (0.0-1.0) to a byte (0-255), rounding like a unorm store
#[inline]
pub fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Fixed-size RGBA8 texel grid
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// New buffer with every texel transparent black
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let bytes = color.to_bytes();
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            pixels.extend_from_slice(&bytes);
        }
        Self { width, height, pixels }
    }

    /// Build a buffer by evaluating `f(x, y)` for every texel, rows in parallel
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> Rgba + Sync,
    {
        let mut frame = Self::new(width, height);
        let row_bytes = width as usize * 4;
        if row_bytes == 0 {
            return frame;
        }
        frame
            .pixels
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, texel) in row.chunks_exact_mut(4).enumerate() {
                    texel.copy_from_slice(&f(x as u32, y as u32).to_bytes());
                }
            });
        frame
    }

    /// Wrap tightly packed RGBA8 bytes; `None` if the length does not match
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn texel(&self, x: u32, y: u32) -> Rgba {
        let i = self.offset(x, y);
        Rgba::from_bytes([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Read with coordinates clamped into the buffer, like a clamp-to-edge sampler
    pub fn texel_clamped(&self, x: i64, y: i64) -> Rgba {
        let (cx, cy) = clamp_coord(x, y, self.dims());
        self.texel(cx, cy)
    }

    pub fn store(&mut self, x: u32, y: u32, color: Rgba) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&color.to_bytes());
    }

    /// Pack into 0x00RRGGBB words for minifb
    pub fn to_rgb_u32(&self) -> Vec<u32> {
        self.pixels
            .chunks_exact(4)
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect()
    }

    /// Largest per-channel difference between two equally sized buffers
    pub fn max_diff(&self, other: &FrameBuffer) -> f32 {
        assert_eq!(self.dims(), other.dims(), "frame sizes differ");
        self.pixels
            .iter()
            .zip(&other.pixels)
            .map(|(a, b)| (*a as i32 - *b as i32).unsigned_abs())
            .max()
            .unwrap_or(0) as f32
            / 255.0
    }
}

/// Clamp a signed texel coordinate into `[0, dims)`
#[inline]
pub fn clamp_coord(x: i64, y: i64, dims: (u32, u32)) -> (u32, u32) {
    let max_x = dims.0.saturating_sub(1) as i64;
    let max_y = dims.1.saturating_sub(1) as i64;
    (x.clamp(0, max_x) as u32, y.clamp(0, max_y) as u32)
}
