//! Yard Viewer
//!
//! Opens a window onto the container yard described by a JSON config.
//!
//! Run with: `cargo run --bin yard_viewer -- [config.json]`
//!
//! Controls:
//! - Left mouse: Select container / build primary action
//! - Right mouse drag: Orbit
//! - Middle mouse drag: Pan
//! - Scroll wheel: Zoom
//! - E: Interact (crosshair select in first person, commit while building)
//! - B: Toggle build mode
//! - V: Toggle first-person walk
//! - O: Toggle auto-orbit
//! - R: Rotate build preview
//! - Tab: Cycle build object
//! - X: Toggle place/remove
//! - WASD / Shift / Space: Walk, sprint, climb
//! - F5: Reload records
//! - ESC: Leave build mode / clear selection

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{self, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use yard_engine::camera::Viewport;
use yard_engine::config::ViewerConfig;
use yard_engine::input::{KeyCode, KeyEvent, MouseButton, PointerEvent, Position, ScrollDelta};
use yard_engine::render::{FrameView, RenderError, SceneRenderer, YardRenderer};
use yard_engine::scene::{JsonFileSource, YardScene};

// ============================================================================
// KEY MAPPING
// ============================================================================

fn map_key(code: keyboard::KeyCode) -> KeyCode {
    use keyboard::KeyCode as W;
    match code {
        W::KeyW => KeyCode::W,
        W::KeyA => KeyCode::A,
        W::KeyS => KeyCode::S,
        W::KeyD => KeyCode::D,
        W::Space => KeyCode::Space,
        W::ShiftLeft => KeyCode::ShiftLeft,
        W::ShiftRight => KeyCode::ShiftRight,
        W::ArrowUp => KeyCode::ArrowUp,
        W::ArrowDown => KeyCode::ArrowDown,
        W::ArrowLeft => KeyCode::ArrowLeft,
        W::ArrowRight => KeyCode::ArrowRight,
        W::KeyB => KeyCode::B,
        W::KeyC => KeyCode::C,
        W::KeyE => KeyCode::E,
        W::KeyF => KeyCode::F,
        W::KeyG => KeyCode::G,
        W::KeyH => KeyCode::H,
        W::KeyL => KeyCode::L,
        W::KeyM => KeyCode::M,
        W::KeyO => KeyCode::O,
        W::KeyP => KeyCode::P,
        W::KeyQ => KeyCode::Q,
        W::KeyR => KeyCode::R,
        W::KeyT => KeyCode::T,
        W::KeyV => KeyCode::V,
        W::KeyX => KeyCode::X,
        W::F1 => KeyCode::F1,
        W::F2 => KeyCode::F2,
        W::F3 => KeyCode::F3,
        W::F4 => KeyCode::F4,
        W::F5 => KeyCode::F5,
        W::F11 => KeyCode::F11,
        W::Digit1 => KeyCode::Digit1,
        W::Digit2 => KeyCode::Digit2,
        W::Digit3 => KeyCode::Digit3,
        W::Digit4 => KeyCode::Digit4,
        W::Escape => KeyCode::Escape,
        W::Enter => KeyCode::Enter,
        W::Tab => KeyCode::Tab,
        W::Backspace => KeyCode::Backspace,
        W::Delete => KeyCode::Delete,
        _ => KeyCode::Unknown,
    }
}

fn map_button(button: winit::event::MouseButton) -> MouseButton {
    use winit::event::MouseButton as W;
    match button {
        W::Left => MouseButton::Left,
        W::Right => MouseButton::Right,
        W::Middle => MouseButton::Middle,
        W::Back => MouseButton::Other(3),
        W::Forward => MouseButton::Other(4),
        W::Other(n) => MouseButton::Other(n),
    }
}

// ============================================================================
// APPLICATION
// ============================================================================

struct YardViewerApp {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    renderer: Option<YardRenderer>,
    scene: YardScene,
    cursor: Position,
    last_frame: Instant,
    cursor_grabbed: bool,
}

impl YardViewerApp {
    fn new(config: ViewerConfig) -> Self {
        let viewport = Viewport::new(config.window.width, config.window.height);
        let mut scene = YardScene::new(&config, viewport);

        if let Some(path) = config.records_path.clone() {
            match scene.attach_source(Box::new(JsonFileSource::new(path))) {
                Ok(()) => {
                    scene.request_refresh();
                }
                Err(e) => log::error!("Failed to start refresh worker: {}", e),
            }
        } else {
            log::warn!("No records_path configured; the yard starts empty");
        }

        scene.set_selection_callback(Box::new(|record| match record {
            Some(r) => log::info!("Selected {} at {} ({}, {}, {:?})", r.id, r.slot, r.size, r.carrier, r.status),
            None => log::info!("Selection cleared"),
        }));
        scene.set_build_callback(Box::new(|event| log::info!("Build event: {:?}", event)));

        Self {
            config,
            window: None,
            renderer: None,
            scene,
            cursor: Position::default(),
            last_frame: Instant::now(),
            cursor_grabbed: false,
        }
    }

    fn initialize(&mut self, window: Arc<Window>) {
        match YardRenderer::new(Arc::clone(&window), self.config.gpu.clone()) {
            Ok(renderer) => {
                let size = window.inner_size();
                self.scene.resize(size.width, size.height, &mut NoSurface);
                self.renderer = Some(renderer);
                self.scene.mark_surface_ready();
            }
            Err(e) => log::error!("Failed to initialize renderer: {}", e),
        }
        self.window = Some(window);
        self.last_frame = Instant::now();
    }

    /// Grab the cursor while walking so mouse motion turns the view.
    fn sync_cursor_grab(&mut self) {
        let want = self.scene.camera().is_first_person();
        if want == self.cursor_grabbed {
            return;
        }
        let Some(window) = &self.window else {
            return;
        };
        if want {
            if window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
                let _ = window.set_cursor_grab(CursorGrabMode::Confined);
            }
            window.set_cursor_visible(false);
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
        }
        self.cursor_grabbed = want;
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        self.scene.tick(dt);
        if let Some(renderer) = self.renderer.as_mut()
            && let Err(e) = self.scene.render(renderer)
        {
            log::warn!("Frame dropped: {}", e);
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        match self.renderer.as_mut() {
            Some(renderer) => self.scene.teardown(renderer),
            None => self.scene.teardown(&mut NoSurface),
        }
        self.renderer = None;
        event_loop.exit();
    }
}

/// Stand-in renderer while the GPU side is unavailable.
struct NoSurface;

impl SceneRenderer for NoSurface {
    fn draw(&mut self, _frame: FrameView<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn release(&mut self) {}
}

impl ApplicationHandler for YardViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.window.width, self.config.window.height));
        match event_loop.create_window(attrs) {
            Ok(window) => self.initialize(Arc::new(window)),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::Focused(false) => self.scene.focus_lost(),

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let key = map_key(code);
                    if key == KeyCode::Unknown {
                        return;
                    }
                    let mut key_event = if event.state == ElementState::Pressed {
                        KeyEvent::press(key)
                    } else {
                        KeyEvent::release(key)
                    };
                    key_event.repeat = event.repeat;
                    self.scene.handle_key(key_event);
                    self.sync_cursor_grab();
                }
            }

            WindowEvent::MouseInput { button, state, .. } => {
                let button = map_button(button);
                let at = self.cursor;
                let event = if state == ElementState::Pressed {
                    PointerEvent::Pressed { button, at }
                } else {
                    PointerEvent::Released { button, at }
                };
                self.scene.handle_pointer(event);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Position::new(position.x as f32, position.y as f32);
                self.scene.handle_pointer(PointerEvent::Moved(self.cursor));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => ScrollDelta::from_lines(x, y),
                    MouseScrollDelta::PixelDelta(pos) => ScrollDelta::from_pixels(pos.x, pos.y),
                };
                self.scene.handle_pointer(PointerEvent::Scrolled(delta));
            }

            WindowEvent::Resized(size) => match self.renderer.as_mut() {
                Some(renderer) => self.scene.resize(size.width, size.height, renderer),
                None => self.scene.resize(size.width, size.height, &mut NoSurface),
            },

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.scene.handle_pointer(PointerEvent::Motion {
                dx: delta.0 as f32,
                dy: delta.1 as f32,
            });
        }
    }

    fn about_to_wait(&mut self, _: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match ViewerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => ViewerConfig::default(),
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = YardViewerApp::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}
