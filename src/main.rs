mod controls;
mod data;
mod engine;
mod game;
mod graphics;
mod modes;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    thread,
};

use clap::Parser;
use log::{error, info, warn};

use controls::{keyboard::Keyboard, touch::{SwipeTracker, TouchSource}, InputHub};
use data::{Config, DEFAULT_FB_DEVICE, DEFAULT_RESOURCE_DIR, DEFAULT_TOUCH_DEVICE};
use engine::{workers::supervise, Engine, InitError, Platform};
use graphics::{sprites::SpriteSet, Argb, Pixel};
use modes::{framebuffer, windowed, Mode};

#[derive(Parser, Debug)]
#[command(name = "fbsnake")]
#[command(version, about = "Snake on the Linux framebuffer", long_about = None)]
struct Cli {
    /// Sprite directory (defaults to assets/pic next to the executable)
    resources: Option<PathBuf>,

    /// Framebuffer device
    #[arg(long, default_value = DEFAULT_FB_DEVICE)]
    fb: PathBuf,

    /// Touch screen event device
    #[arg(long, default_value = DEFAULT_TOUCH_DEVICE)]
    touch: PathBuf,

    /// Do not read the touch screen
    #[arg(long)]
    no_touch: bool,

    /// Configuration file (defaults to ./fbsnake.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Play in a desktop window instead of the framebuffer
    #[arg(short, long)]
    window: bool,

    /// Seed for item placement
    #[arg(long)]
    seed: Option<u64>,

    /// More output, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.window {
            Mode::Window
        } else {
            Mode::Framebuffer
        }
    }

    fn resources(&self) -> PathBuf {
        if let Some(dir) = &self.resources {
            return dir.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_RESOURCE_DIR)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCE_DIR))
    }

    fn config(&self) -> Result<Config, InitError> {
        let mut config = Config::load(self.config.as_deref())?;

        if self.seed.is_some() {
            config.seed = self.seed;
        }

        Ok(config)
    }
}

/// Terminal keys, and touch unless turned off. At least one must open.
fn console_input(cli: &Cli, config: &Config, screen: (u32, u32)) -> Result<InputHub, InitError> {
    let mut hub = InputHub::new();

    match Keyboard::new() {
        Ok(keyboard) => hub.add(Box::new(keyboard)),
        Err(e) => warn!("No terminal keyboard: {e}"),
    }

    if !cli.no_touch {
        let tracker = SwipeTracker::new(
            config.swipe_threshold,
            config.touch_range,
            (screen.0 as i32, screen.1 as i32),
        );

        match TouchSource::open(&cli.touch, tracker) {
            Ok(touch) => {
                info!("Touch input on {}", cli.touch.display());
                hub.add(Box::new(touch));
            }
            Err(e) => warn!("No touch input: {e}"),
        }
    }

    if hub.is_empty() {
        return Err(InitError::NoInput);
    }

    Ok(hub)
}

fn run_framebuffer(cli: &Cli, config: &Config, resources: &Path) -> Result<(), InitError> {
    let mut engine = Engine::initialize(config, |config| {
        let surface = framebuffer::open(&cli.fb)?;
        let sprites = SpriteSet::load(resources)?;

        let screen = (
            config.screen_width.min(surface.width()),
            config.screen_height.min(surface.height()),
        );
        let input = console_input(cli, config, screen)?;

        Ok(Platform {
            surface,
            sprites,
            input,
        })
    })?;

    engine.start()?;
    supervise(&engine.handle());

    if let Some(compositor) = engine.join() {
        let mut surface = compositor.into_surface();
        surface.fill(Argb::black());
    }

    Ok(())
}

fn run_window(config: &Config, resources: &Path) -> Result<(), InitError> {
    let (keys, key_events) = crossbeam_channel::unbounded();
    let mut front = None;

    let mut engine = Engine::initialize(config, |config| {
        let (surface, shown) = windowed::surface(config)?;
        front = Some(shown);

        let mut input = InputHub::new();
        input.add(Box::new(key_events));

        Ok(Platform {
            surface,
            sprites: SpriteSet::load(resources)?,
            input,
        })
    })?;

    let Some(front) = front else {
        return Err(InitError::NoInput);
    };

    engine.start()?;

    let shared = engine.handle();
    let watcher = {
        let shared = Arc::clone(&shared);
        thread::Builder::new()
            .name("supervisor".to_owned())
            .spawn(move || supervise(&shared))
            .map_err(|source| InitError::Spawn {
                name: "supervisor",
                source,
            })?
    };

    let result = windowed::run(shared, front, keys);

    engine.join();
    if watcher.join().is_err() {
        warn!("Supervisor thread panicked");
    }

    result.map_err(InitError::from)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    data::log::init(cli.verbose);

    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let resources = cli.resources();
    let mode = cli.mode();

    info!(
        "Starting in {} mode, sprites from {}",
        mode.name(),
        resources.display()
    );

    let result = match mode {
        Mode::Framebuffer => run_framebuffer(&cli, &config, &resources),
        Mode::Window => run_window(&config, &resources),
    };

    match result {
        Ok(()) => {
            info!("Bye");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
