//! Desktop preview: the same engine, drawn into a window.

use softbuffer::{Context, Surface as WindowSurface};

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    platform::modifier_supplement::KeyEventExtModifierSupplement,
    window::{Window, WindowId},
};

use crossbeam_channel::Sender;
use log::{debug, error, info, warn};

use std::{
    num::NonZeroU32,
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::Duration,
};

use crate::{
    controls::{Control, InputEvent},
    data::{Config, WINDOW_TITLE},
    engine::{EngineState, Shared},
    game::Direction,
    graphics::{blend::to_xrgb, Backing, DisplayError, Geometry, Surface},
};

/// The last presented frame, in the window's pixel format.
pub struct FrontBuffer {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
}

pub type Front = Arc<Mutex<FrontBuffer>>;

/// Memory the compositor draws into. Each present copies it to the front
/// buffer for the event loop to pick up.
pub struct WindowBacking {
    pixels: Vec<u8>,
    front: Front,
}

impl Backing for WindowBacking {
    fn bytes(&self) -> &[u8] {
        &self.pixels
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    fn present(&mut self) {
        let mut front = self.front.lock().unwrap_or_else(PoisonError::into_inner);

        for (dst, px) in front.pixels.iter_mut().zip(self.pixels.chunks_exact(4)) {
            *dst = to_xrgb(u32::from_le_bytes([px[0], px[1], px[2], px[3]]));
        }
    }
}

/// A 32-bit surface the size of the play area, and the front buffer it
/// presents to.
pub fn surface(config: &Config) -> Result<(Surface, Front), DisplayError> {
    let geometry = Geometry::new(config.screen_width, config.screen_height, 4);
    let (width, height) = (geometry.width as usize, geometry.height as usize);

    let front = Arc::new(Mutex::new(FrontBuffer {
        pixels: vec![0; width * height],
        width,
        height,
    }));

    let backing = WindowBacking {
        pixels: vec![0; geometry.len()],
        front: Arc::clone(&front),
    };

    Ok((Surface::new(Box::new(backing), geometry)?, front))
}

pub fn map_key(key: Key<&str>) -> Option<InputEvent> {
    let turn = |d| Some(InputEvent::Turn(d));
    let control = |c| Some(InputEvent::Control(c));

    match key {
        Key::Named(NamedKey::ArrowUp) | Key::Character("w" | "W") => turn(Direction::Up),
        Key::Named(NamedKey::ArrowDown) | Key::Character("s" | "S") => turn(Direction::Down),
        Key::Named(NamedKey::ArrowLeft) | Key::Character("a" | "A") => turn(Direction::Left),
        Key::Named(NamedKey::ArrowRight) | Key::Character("d" | "D") => turn(Direction::Right),

        Key::Named(NamedKey::Space) | Key::Character("p" | "P") => control(Control::Pause),
        Key::Character("r" | "R") => control(Control::Restart),
        Key::Named(NamedKey::Escape) | Key::Character("q" | "Q") => control(Control::Quit),

        _ => None,
    }
}

struct WindowState {
    shared: Arc<Shared>,
    front: Front,
    keys: Sender<InputEvent>,
    size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    surface: Option<WindowSurface<Arc<Window>, Arc<Window>>>,
    redraw: Option<thread::JoinHandle<()>>,
    error: Option<DisplayError>,
}

fn window_error(e: impl std::fmt::Display) -> DisplayError {
    DisplayError::Window(e.to_string())
}

impl WindowState {
    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<(), DisplayError> {
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(self.size)
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(attributes).map_err(window_error)?);

        // Some window managers ignore the resizable hint.
        window.set_min_inner_size(Some(self.size));
        window.set_max_inner_size(Some(self.size));

        let context = Context::new(Arc::clone(&window)).map_err(window_error)?;
        let mut surface = WindowSurface::new(&context, Arc::clone(&window)).map_err(window_error)?;

        let size = window.inner_size();
        Self::resize_surface(&mut surface, size)?;
        self.size = size;

        let shared = Arc::clone(&self.shared);
        let redraw_window = Arc::clone(&window);
        let frame = Duration::from_secs(1) / shared.config().fps.max(1);

        // Requests a redraw every frame, and once more on the way out so
        // the event loop notices.
        let redraw = thread::Builder::new()
            .name("redraw".to_owned())
            .spawn(move || {
                while shared.sleep(frame) {
                    redraw_window.request_redraw();
                }
                redraw_window.request_redraw();
            })
            .map_err(window_error)?;

        info!("Window opened at {}x{}", size.width, size.height);

        self.window = Some(window);
        self.surface = Some(surface);
        self.redraw = Some(redraw);
        Ok(())
    }

    fn resize_surface(
        surface: &mut WindowSurface<Arc<Window>, Arc<Window>>,
        size: PhysicalSize<u32>,
    ) -> Result<(), DisplayError> {
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            return Ok(());
        };

        surface.resize(w, h).map_err(window_error)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: DisplayError) {
        error!("{e}");
        self.error = Some(e);
        self.shared.request_exit();
        event_loop.exit();
    }

    fn present(&mut self) -> Result<(), DisplayError> {
        let (Some(window), Some(surface)) = (self.window.as_ref(), self.surface.as_mut()) else {
            return Ok(());
        };

        let mut buffer = surface.buffer_mut().map_err(window_error)?;
        let width = self.size.width as usize;

        {
            let front = self.front.lock().unwrap_or_else(PoisonError::into_inner);
            let cols = width.min(front.width);

            for (dst, src) in buffer
                .chunks_exact_mut(width.max(1))
                .zip(front.pixels.chunks_exact(front.width.max(1)))
                .take(front.height)
            {
                dst[..cols].copy_from_slice(&src[..cols]);
            }
        }

        window.pre_present_notify();
        buffer.present().map_err(window_error)
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.open(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.shared.request_exit();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                let Some(surface) = self.surface.as_mut() else {
                    return;
                };

                self.size = size;

                if let Err(e) = Self::resize_surface(surface, size) {
                    self.fail(event_loop, e);
                    return;
                }

                if let Ok(mut buffer) = surface.buffer_mut() {
                    buffer.fill(0);
                }
            }

            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                let Some(input) = map_key(event.key_without_modifiers().as_ref()) else {
                    return;
                };

                if self.keys.send(input).is_err() {
                    debug!("Input thread is gone, dropping {input:?}");
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.present() {
                    warn!("Could not present the frame: {e}");
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.shared.state() == EngineState::Exiting {
            event_loop.exit();
        }
    }
}

/// Run the window on this thread until the engine exits or the window is
/// closed.
pub fn run(shared: Arc<Shared>, front: Front, keys: Sender<InputEvent>) -> Result<(), DisplayError> {
    let config = shared.config();
    let size = PhysicalSize::new(config.screen_width, config.screen_height);

    let event_loop = EventLoop::new().map_err(window_error)?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut state = WindowState {
        shared: Arc::clone(&shared),
        front,
        keys,
        size,
        window: None,
        surface: None,
        redraw: None,
        error: None,
    };

    let result = event_loop.run_app(&mut state).map_err(window_error);

    shared.request_exit();

    if let Some(redraw) = state.redraw.take() {
        if redraw.join().is_err() {
            warn!("Redraw thread panicked");
        }
    }

    match state.error.take() {
        Some(e) => Err(e),
        None => result,
    }
}
