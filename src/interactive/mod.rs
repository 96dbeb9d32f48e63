//! Windowed viewers: wgpu/winit for the GPU pipeline, minifb for the CPU preview

mod viewer;
pub mod gpu_viewer;

pub use gpu_viewer::run_gpu_viewer;
pub use viewer::CpuPreview;

use crate::config::PointerSettings;
use crate::pointer::PointerEvent;

const MIN_RADIUS: f32 = 0.02;
const MAX_RADIUS: f32 = 1.5;
const MAX_DECAY: f32 = 10.0;

/// Nudge the radius of influence, kept in a usable range
pub fn adjust_radius(settings: &mut PointerSettings, delta: f32) {
    settings.max_radius = (settings.max_radius + delta).clamp(MIN_RADIUS, MAX_RADIUS);
}

/// Nudge the falloff steepness, never negative
pub fn adjust_decay(settings: &mut PointerSettings, delta: f32) {
    settings.decay_factor = (settings.decay_factor + delta).clamp(0.0, MAX_DECAY);
}

/// Button press or release at the last known cursor position.
///
/// `None` until the cursor has been seen inside the window.
pub fn button_event(cursor: Option<(f32, f32)>, pressed: bool) -> Option<PointerEvent> {
    let (x, y) = cursor?;
    Some(if pressed {
        PointerEvent::Pressed { x, y }
    } else {
        PointerEvent::Released { x, y }
    })
}
