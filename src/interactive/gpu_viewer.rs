//! GPU viewer: scene, blur and compositor running on wgpu inside a winit window

use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use super::{adjust_decay, adjust_radius, button_event};
use crate::blur::{BlurParams, FramePlan};
use crate::config::{GalleryConfig, PointerSettings};
use crate::error::{CapabilityError, GalleryError};
use crate::gpu::{BlurRenderer, DeviceSlot, DisplayPipeline, GpuContext, GpuDevice, SlotState};
use crate::pointer::{PointerEvent, PointerState, SurfaceRect};
use crate::scene::Scene;

/// Per-window GPU state
struct ViewerState {
    ctx: GpuContext,
    renderer: BlurRenderer,
    display: DisplayPipeline,
    pointer: PointerState,
    settings: PointerSettings,
    // Last cursor position in window pixels, for button events
    cursor: Option<(f32, f32)>,
}

impl ViewerState {
    fn new(
        window: Arc<Window>,
        gpu: Arc<GpuDevice>,
        config: &GalleryConfig,
        params: BlurParams,
    ) -> Result<Self, GalleryError> {
        let ctx = GpuContext::new(window, gpu)?;
        let renderer = BlurRenderer::new(&ctx.gpu, ctx.size, params, &Scene::default(), FramePlan::standard())?;
        let display = DisplayPipeline::new(&ctx, renderer.presented_view())?;

        Ok(Self {
            ctx,
            renderer,
            display,
            pointer: PointerState::new(config.history_len),
            settings: config.pointer,
            cursor: None,
        })
    }

    fn surface_rect(&self) -> SurfaceRect {
        SurfaceRect::from_size(self.ctx.size.0, self.ctx.size.1)
    }

    fn pointer_event(&mut self, event: PointerEvent) {
        let rect = self.surface_rect();
        self.pointer.handle(event, &rect);
    }

    fn render(&mut self) -> Result<(), GalleryError> {
        let frame = self.pointer.blur_params(&self.settings);
        match self.display.render(&self.ctx, &self.renderer, &frame) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.ctx.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Application handler for winit event loop
struct GpuViewerApp<'a> {
    config: GalleryConfig,
    params: BlurParams,
    slot: &'a DeviceSlot,
    state: Option<ViewerState>,
    error: Option<GalleryError>,
}

impl<'a> GpuViewerApp<'a> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: GalleryError) {
        log::error!("GPU viewer stopped: {}", error);
        self.state = None;
        self.error = Some(error);
        event_loop.exit();
    }

    fn create_state(&self, event_loop: &ActiveEventLoop) -> Result<ViewerState, GalleryError> {
        let (width, height) = self.config.surface_size;
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| GalleryError::Window(e.to_string()))?,
        );

        let gpu = self
            .slot
            .acquire(|| GpuDevice::request(GpuDevice::new_instance()))?;
        ViewerState::new(window, gpu, &self.config, self.params)
    }
}

impl ApplicationHandler for GpuViewerApp<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.create_state(event_loop) {
            Ok(state) => {
                println!("=== Pointer Blur (GPU) ===");
                println!("Controls:");
                println!("  Mouse/Touch - Move blur centre");
                println!("  +/-         - Adjust radius");
                println!("  [/]         - Adjust decay");
                println!("  ESC         - Exit");
                println!();

                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let state = match &mut self.state {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Equal | KeyCode::NumpadAdd => {
                    adjust_radius(&mut state.settings, 0.02);
                    println!("Radius: {:.2}", state.settings.max_radius);
                }
                KeyCode::Minus | KeyCode::NumpadSubtract => {
                    adjust_radius(&mut state.settings, -0.02);
                    println!("Radius: {:.2}", state.settings.max_radius);
                }
                KeyCode::BracketRight => {
                    adjust_decay(&mut state.settings, 0.25);
                    println!("Decay: {:.2}", state.settings.decay_factor);
                }
                KeyCode::BracketLeft => {
                    adjust_decay(&mut state.settings, -0.25);
                    println!("Decay: {:.2}", state.settings.decay_factor);
                }
                _ => {}
            },

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                state.cursor = Some((x, y));
                state.pointer_event(PointerEvent::Moved { x, y });
            }

            WindowEvent::CursorLeft { .. } => {
                state.cursor = None;
                state.pointer_event(PointerEvent::Left);
            }

            WindowEvent::MouseInput {
                state: btn_state,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(event) = button_event(state.cursor, btn_state == ElementState::Pressed) {
                    state.pointer_event(event);
                }
            }

            WindowEvent::Touch(touch) => {
                let (x, y) = (touch.location.x as f32, touch.location.y as f32);
                let event = match touch.phase {
                    TouchPhase::Started => PointerEvent::Pressed { x, y },
                    TouchPhase::Moved => PointerEvent::Moved { x, y },
                    TouchPhase::Ended | TouchPhase::Cancelled => PointerEvent::Released { x, y },
                };
                state.pointer_event(event);
            }

            WindowEvent::RedrawRequested => {
                if let SlotState::Lost(reason) = self.slot.state() {
                    self.fail(event_loop, CapabilityError::DeviceLost(reason).into());
                    return;
                }
                if let Err(e) = state.render() {
                    self.fail(event_loop, e);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            // Request continuous redraw for smooth updates
            state.ctx.request_redraw();
        }
    }
}

/// Run the GPU viewer until the window closes.
///
/// Returns the error that stopped rendering, e.g. `DeviceLost`, so the
/// caller can fall back to the CPU preview.
pub fn run_gpu_viewer(config: &GalleryConfig, slot: &DeviceSlot) -> Result<(), GalleryError> {
    let params = config.validate()?;

    let event_loop = EventLoop::new().map_err(|e| GalleryError::Window(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuViewerApp {
        config: config.clone(),
        params,
        slot,
        state: None,
        error: None,
    };
    event_loop
        .run_app(&mut app)
        .map_err(|e| GalleryError::Window(e.to_string()))?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
