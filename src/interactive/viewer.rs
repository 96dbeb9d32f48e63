//! CPU preview - the tiled kernel emulated on the CPU, shown in a minifb window

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use super::{adjust_decay, adjust_radius};
use crate::blur::{CpuBlurPipeline, PointerParams};
use crate::config::{GalleryConfig, PointerSettings};
use crate::error::GalleryError;
use crate::pointer::{PointerEvent, PointerState, SurfaceRect};
use crate::scene::Scene;

/// Interactive viewer running the CPU blur pipeline
pub struct CpuPreview {
    pipeline: CpuBlurPipeline,
    pointer: PointerState,
    settings: PointerSettings,
    window: Window,
    buffer: Vec<u32>,
}

impl CpuPreview {
    /// Open the preview window.
    ///
    /// `notice`, when set, is appended to the title; used to explain why the
    /// GPU viewer is not running.
    pub fn new(config: &GalleryConfig, notice: Option<&str>) -> Result<Self, GalleryError> {
        let params = config.validate()?;
        let (width, height) = config.surface_size;

        let title = match notice {
            Some(notice) => format!("Pointer Blur (CPU preview) - {notice}"),
            None => "Pointer Blur (CPU preview, ESC to exit)".to_string(),
        };
        let window = Window::new(
            &title,
            width as usize,
            height as usize,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| GalleryError::Window(e.to_string()))?;

        Ok(Self {
            pipeline: CpuBlurPipeline::new(width, height, params, &Scene::default()),
            pointer: PointerState::new(config.history_len),
            settings: config.pointer,
            window,
            buffer: Vec::new(),
        })
    }

    pub fn run(&mut self) -> Result<(), GalleryError> {
        let (width, height) = self.pipeline.dims();
        let surface = SurfaceRect::from_size(width, height);

        // The CPU kernel is far slower than the GPU one
        self.window.set_target_fps(30);

        println!("=== Pointer Blur (CPU preview) ===");
        println!("Controls:");
        println!("  Mouse  - Move blur centre");
        println!("  +/-    - Adjust radius");
        println!("  [/]    - Adjust decay");
        println!("  ESC    - Exit");
        println!();

        let mut last_frame: Option<PointerParams> = None;
        let mut was_down = false;

        while self.window.is_open() && !self.window.is_key_down(Key::Escape) {
            self.handle_keys();

            match self.window.get_mouse_pos(MouseMode::Discard) {
                Some((x, y)) => {
                    let down = self.window.get_mouse_down(MouseButton::Left);
                    let event = match (was_down, down) {
                        (false, true) => PointerEvent::Pressed { x, y },
                        (true, false) => PointerEvent::Released { x, y },
                        _ => PointerEvent::Moved { x, y },
                    };
                    was_down = down;
                    self.pointer.handle(event, &surface);
                }
                None => {
                    if self.pointer.is_down() {
                        self.pointer.handle(PointerEvent::Left, &surface);
                    }
                    was_down = false;
                }
            }

            let frame = self.pointer.blur_params(&self.settings);
            if last_frame != Some(frame) {
                self.buffer = self.pipeline.render(&frame).to_rgb_u32();
                last_frame = Some(frame);
                log::debug!(
                    "CPU frame at ({:.3}, {:.3}), speed {:.4}",
                    frame.position.0,
                    frame.position.1,
                    self.pointer.speed()
                );
            }

            self.window
                .update_with_buffer(&self.buffer, width as usize, height as usize)
                .map_err(|e| GalleryError::Window(e.to_string()))?;
        }

        Ok(())
    }

    fn handle_keys(&mut self) {
        if self.window.is_key_pressed(Key::Equal, KeyRepeat::Yes)
            || self.window.is_key_pressed(Key::NumPadPlus, KeyRepeat::Yes)
        {
            adjust_radius(&mut self.settings, 0.02);
            println!("Radius: {:.2}", self.settings.max_radius);
        }
        if self.window.is_key_pressed(Key::Minus, KeyRepeat::Yes)
            || self.window.is_key_pressed(Key::NumPadMinus, KeyRepeat::Yes)
        {
            adjust_radius(&mut self.settings, -0.02);
            println!("Radius: {:.2}", self.settings.max_radius);
        }
        if self.window.is_key_pressed(Key::RightBracket, KeyRepeat::Yes) {
            adjust_decay(&mut self.settings, 0.25);
            println!("Decay: {:.2}", self.settings.decay_factor);
        }
        if self.window.is_key_pressed(Key::LeftBracket, KeyRepeat::Yes) {
            adjust_decay(&mut self.settings, -0.25);
            println!("Decay: {:.2}", self.settings.decay_factor);
        }
    }
}
