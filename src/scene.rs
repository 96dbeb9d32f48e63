//! Procedural background: a horizontal gradient with the word "BLUR"
//!
//! Glyphs are built from axis-aligned strokes in a unit glyph box. The same
//! stroke list is rasterized on the CPU and injected into the WGSL scene
//! shader, so both paths draw identical shapes.

use crate::frame::{FrameBuffer, Rgba};

/// Axis-aligned rectangle, half-open: `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub fn contains(&self, u: f32, v: f32) -> bool {
        u >= self.x0 && u < self.x1 && v >= self.y0 && v < self.y1
    }
}

const GLYPH_B: &[Rect] = &[
    Rect::new(0.0, 0.0, 0.15, 1.0),
    Rect::new(0.0, 0.0, 0.85, 0.15),
    Rect::new(0.0, 0.4, 0.85, 0.6),
    Rect::new(0.0, 0.85, 0.85, 1.0),
    Rect::new(0.7, 0.0, 0.85, 1.0),
];

const GLYPH_L: &[Rect] = &[Rect::new(0.0, 0.0, 0.15, 1.0), Rect::new(0.0, 0.85, 0.85, 1.0)];

const GLYPH_U: &[Rect] = &[
    Rect::new(0.0, 0.0, 0.15, 1.0),
    Rect::new(0.7, 0.0, 0.85, 1.0),
    Rect::new(0.0, 0.85, 0.85, 1.0),
];

const GLYPH_R: &[Rect] = &[
    Rect::new(0.0, 0.0, 0.15, 1.0),
    Rect::new(0.0, 0.0, 0.85, 0.15),
    Rect::new(0.0, 0.4, 0.85, 0.6),
    Rect::new(0.7, 0.0, 0.85, 0.5),
    // stepped leg
    Rect::new(0.5, 0.6, 0.65, 0.8),
    Rect::new(0.65, 0.8, 0.85, 1.0),
];

/// Scene description; `Default` is the gradient with "BLUR"
#[derive(Debug, Clone)]
pub struct Scene {
    pub gradient_start: Rgba,
    pub gradient_end: Rgba,
    pub text_color: Rgba,
    /// Strokes in scene UV space
    pub strokes: Vec<Rect>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            strokes: layout_text(&[GLYPH_B, GLYPH_L, GLYPH_U, GLYPH_R], (0.2, 0.4), (0.06, 0.1), 0.08),
            ..Self::gradient_only()
        }
    }
}

impl Scene {
    /// Just the gradient, no text
    pub fn gradient_only() -> Self {
        Self {
            gradient_start: Rgba::rgb(0.2, 0.3, 0.8),
            gradient_end: Rgba::rgb(0.8, 0.2, 0.4),
            text_color: Rgba::rgb(1.0, 1.0, 1.0),
            strokes: Vec::new(),
        }
    }

    /// Color at a UV coordinate (origin top-left)
    pub fn color_at(&self, u: f32, v: f32) -> Rgba {
        if self.strokes.iter().any(|stroke| stroke.contains(u, v)) {
            return self.text_color;
        }
        self.gradient_start.mix(self.gradient_end, u)
    }

    /// Render into a new buffer, sampling at texel centres
    pub fn rasterize(&self, width: u32, height: u32) -> FrameBuffer {
        FrameBuffer::from_fn(width, height, |x, y| {
            let u = (x as f32 + 0.5) / width as f32;
            let v = (y as f32 + 0.5) / height as f32;
            self.color_at(u, v)
        })
    }
}

/// Place glyphs left to right starting at `origin`, `advance` apart
fn layout_text(glyphs: &[&[Rect]], origin: (f32, f32), glyph_size: (f32, f32), advance: f32) -> Vec<Rect> {
    let mut strokes = Vec::new();
    for (i, glyph) in glyphs.iter().enumerate() {
        let left = origin.0 + advance * i as f32;
        for stroke in glyph.iter() {
            strokes.push(Rect::new(
                left + stroke.x0 * glyph_size.0,
                origin.1 + stroke.y0 * glyph_size.1,
                left + stroke.x1 * glyph_size.0,
                origin.1 + stroke.y1 * glyph_size.1,
            ));
        }
    }
    strokes
}
