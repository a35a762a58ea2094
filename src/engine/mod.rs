pub mod workers;
pub mod world;

use std::{
    io,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{error, info};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    controls::{InputError, InputHub, InputIntent},
    data::{Config, ConfigError},
    game::Direction,
    graphics::{
        compositor::Compositor,
        sprites::{ResourceError, SpriteSet},
        DisplayError, Surface,
    },
};

use world::World;

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("no input device could be opened")]
    NoInput,
    #[error("could not start the {name} thread: {source}")]
    Spawn { name: &'static str, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    Paused = 0,
    Running = 1,
    GameOver = 2,
    Exiting = 3,
}

impl EngineState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => EngineState::Paused,
            1 => EngineState::Running,
            2 => EngineState::GameOver,
            _ => EngineState::Exiting,
        }
    }
}

/// What the engine needs from the outside world.
pub struct Platform {
    pub surface: Surface,
    pub sprites: SpriteSet,
    pub input: InputHub,
}

/// State shared by the engine and its workers.
///
/// The top level state lives in an atomic so loops can check it without
/// the lock. It is only changed while holding the world lock, so anyone
/// holding the lock sees a stable value.
pub struct Shared {
    state: AtomicU8,
    world: Mutex<World>,
    pub intent: InputIntent,
    config: Config,
    /// Dropped on exit, which disconnects every sleeper at once.
    wake: Mutex<Option<Sender<()>>>,
    sleeper: Receiver<()>,
}

impl Shared {
    fn new(world: World, config: Config) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);

        Self {
            state: AtomicU8::new(EngineState::Paused as u8),
            world: Mutex::new(world),
            intent: InputIntent::new(Direction::Right),
            config,
            wake: Mutex::new(Some(tx)),
            sleeper: rx,
        }
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Only call with the world lock held.
    fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `d`, or less if exit is requested meanwhile. Returns
    /// whether the caller should keep going.
    pub fn sleep(&self, d: Duration) -> bool {
        match self.sleeper.recv_timeout(d) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => self.state() != EngineState::Exiting,
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Move from one of `from` to `to`. Returns whether it happened.
    fn transition(&self, from: &[EngineState], to: EngineState) -> bool {
        let _world = self.world();
        let state = self.state();

        if !from.contains(&state) {
            return false;
        }

        self.set_state(to);
        info!("{state:?} -> {to:?}");
        true
    }

    pub fn pause(&self) -> bool {
        self.transition(&[EngineState::Running], EngineState::Paused)
    }

    pub fn resume(&self) -> bool {
        self.transition(&[EngineState::Paused], EngineState::Running)
    }

    pub fn toggle_pause(&self) -> bool {
        self.pause() || self.resume()
    }

    pub fn request_exit(&self) {
        {
            let _world = self.world();
            if self.state() != EngineState::Exiting {
                info!("Exit requested");
            }
            self.set_state(EngineState::Exiting);
        }

        self.wake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Start over. Refused while running or exiting; a finished game
    /// comes back paused.
    pub fn reset(&self) -> bool {
        let mut world = self.world();

        match self.state() {
            EngineState::Running | EngineState::Exiting => return false,
            EngineState::GameOver => self.set_state(EngineState::Paused),
            EngineState::Paused => {}
        }

        world.reset(Instant::now());
        self.intent.reset(world.snake().direction());
        info!("Board reset");
        true
    }

    /// Reset and run, from a finished or paused game.
    pub fn restart(&self) -> bool {
        self.reset() && self.resume()
    }
}

struct Workers {
    logic: JoinHandle<()>,
    render: JoinHandle<Compositor>,
    input: JoinHandle<InputHub>,
}

fn spawn<T: Send + 'static>(
    name: &'static str,
    f: impl FnOnce() -> T + Send + 'static,
) -> Result<JoinHandle<T>, InitError> {
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(f)
        .map_err(|source| InitError::Spawn { name, source })
}

pub struct Engine {
    shared: Arc<Shared>,
    platform: Option<(Compositor, InputHub)>,
    workers: Option<Workers>,
}

impl Engine {
    /// Build the world and take hold of display and input. Nothing runs
    /// until `start`.
    pub fn initialize(
        config: &Config,
        acquire: impl FnOnce(&Config) -> Result<Platform, InitError>,
    ) -> Result<Self, InitError> {
        config.validate()?;

        let Platform {
            surface,
            sprites,
            input,
        } = acquire(config)?;

        // The play area never extends past what the display shows.
        let config = &Config {
            screen_width: config.screen_width.min(surface.width()),
            screen_height: config.screen_height.min(surface.height()),
            ..config.clone()
        };
        config.validate()?;

        let compositor = Compositor::new(surface, sprites, config);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let world = World::new(config, rng, Instant::now());
        let (w, h) = config.board_size();
        info!("Board is {w}x{h} cells, {} items at most", config.max_items);

        Ok(Self {
            shared: Arc::new(Shared::new(world, config.clone())),
            platform: Some((compositor, input)),
            workers: None,
        })
    }

    pub fn handle(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }

    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    /// Spawn the workers on first call, and leave Paused for Running.
    pub fn start(&mut self) -> Result<(), InitError> {
        if let Some((compositor, input)) = self.platform.take() {
            let shared = Arc::clone(&self.shared);
            let logic = spawn("logic", move || workers::logic_loop(&shared))?;

            let shared = Arc::clone(&self.shared);
            let render = spawn("render", move || workers::render_loop(&shared, compositor))?;

            let shared = Arc::clone(&self.shared);
            let input = spawn("input", move || workers::input_loop(&shared, input))?;

            self.workers = Some(Workers {
                logic,
                render,
                input,
            });
        }

        self.shared.resume();
        Ok(())
    }

    pub fn pause(&self) -> bool {
        self.shared.pause()
    }

    pub fn resume(&self) -> bool {
        self.shared.resume()
    }

    pub fn reset(&self) -> bool {
        self.shared.reset()
    }

    pub fn request_exit(&self) {
        self.shared.request_exit();
    }

    pub fn sleep(&self, d: Duration) -> bool {
        self.shared.sleep(d)
    }

    /// Stop everything and wait for the workers. Hands back the compositor
    /// so its surface is released by the caller, after the threads are gone.
    pub fn join(&mut self) -> Option<Compositor> {
        self.shared.request_exit();

        let workers = self.workers.take()?;

        if workers.logic.join().is_err() {
            error!("Logic thread panicked");
        }

        if workers.input.join().is_err() {
            error!("Input thread panicked");
        }

        match workers.render.join() {
            Ok(compositor) => Some(compositor),
            Err(_) => {
                error!("Render thread panicked");
                None
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.join();
    }
}
