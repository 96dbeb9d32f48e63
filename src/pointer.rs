//! Pointer feed: raw mouse/touch positions → normalized blur parameters
//!
//! Event handlers update a `PointerState` synchronously; the render loop
//! reads it once per frame through `PointerState::blur_params`.

use std::collections::VecDeque;

use crate::blur::PointerParams;
use crate::config::PointerSettings;

/// Default number of samples kept for velocity estimation
pub const DEFAULT_HISTORY_LEN: usize = 5;

/// Bounding box of the render surface in the coordinate space of the events
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Surface anchored at the origin
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    /// Map a point to `[0,1]²`, clamped to the surface edges
    pub fn normalize(&self, x: f32, y: f32) -> (f32, f32) {
        let u = if self.width > 0.0 { (x - self.left) / self.width } else { 0.5 };
        let v = if self.height > 0.0 { (y - self.top) / self.height } else { 0.5 };
        (clamp_unit(u), clamp_unit(v))
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.5 } else { value.clamp(0.0, 1.0) }
}

/// Unified mouse/touch input, in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved { x: f32, y: f32 },
    Pressed { x: f32, y: f32 },
    Released { x: f32, y: f32 },
    /// The pointer left the surface
    Left,
}

/// Fixed-size ring of recent normalized positions
#[derive(Debug, Clone)]
pub struct PointerHistory {
    samples: VecDeque<(f32, f32)>,
    capacity: usize,
}

impl PointerHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, position: (f32, f32)) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(position);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<(f32, f32)> {
        self.samples.back().copied()
    }

    /// `latest - previous`, zero with fewer than two samples
    pub fn velocity(&self) -> (f32, f32) {
        let n = self.samples.len();
        if n < 2 {
            return (0.0, 0.0);
        }
        let current = self.samples[n - 1];
        let previous = self.samples[n - 2];
        (current.0 - previous.0, current.1 - previous.1)
    }

    pub fn speed(&self) -> f32 {
        let (vx, vy) = self.velocity();
        (vx * vx + vy * vy).sqrt()
    }

    /// Unit vector along the velocity, zero when not moving
    pub fn direction(&self) -> (f32, f32) {
        let (vx, vy) = self.velocity();
        let speed = (vx * vx + vy * vy).sqrt();
        if speed == 0.0 {
            return (0.0, 0.0);
        }
        (vx / speed, vy / speed)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for PointerHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

/// Latest pointer sample plus derived motion
#[derive(Debug, Clone)]
pub struct PointerState {
    position: (f32, f32),
    is_down: bool,
    history: PointerHistory,
}

impl PointerState {
    pub fn new(history_len: usize) -> Self {
        Self {
            position: (0.5, 0.5),
            is_down: false,
            history: PointerHistory::new(history_len),
        }
    }

    /// Apply one input event; positions are normalized against `surface`
    pub fn handle(&mut self, event: PointerEvent, surface: &SurfaceRect) {
        match event {
            PointerEvent::Moved { x, y } => self.record(surface.normalize(x, y)),
            PointerEvent::Pressed { x, y } => {
                self.is_down = true;
                self.record(surface.normalize(x, y));
            }
            PointerEvent::Released { x, y } => {
                self.is_down = false;
                self.record(surface.normalize(x, y));
            }
            PointerEvent::Left => self.is_down = false,
        }
    }

    fn record(&mut self, position: (f32, f32)) {
        self.position = position;
        self.history.push(position);
    }

    /// Latest normalized position, the surface centre until an event arrives
    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn is_down(&self) -> bool {
        self.is_down
    }

    pub fn history(&self) -> &PointerHistory {
        &self.history
    }

    pub fn velocity(&self) -> (f32, f32) {
        self.history.velocity()
    }

    pub fn direction(&self) -> (f32, f32) {
        self.history.direction()
    }

    pub fn speed(&self) -> f32 {
        self.history.speed()
    }

    /// Kernel parameters for this frame
    pub fn blur_params(&self, settings: &PointerSettings) -> PointerParams {
        PointerParams::new(self.position, settings.max_radius, settings.decay_factor)
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}
