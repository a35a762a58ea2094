pub mod config;
pub mod log;

pub use config::{Config, ConfigError};

pub const SCREEN_WIDTH: u32 = 800;
pub const SCREEN_HEIGHT: u32 = 480;
pub const CELL_SIZE: u32 = 40;

pub const INITIAL_LENGTH: usize = 3;

pub const DEFAULT_FPS: u32 = 15;

/// Sprite pixels of this color are not drawn.
pub const TRANSPARENT: u32 = 0xFF_FF_FF_FF;

pub const CONFIG_FILE: &str = "fbsnake.toml";

pub const DEFAULT_FB_DEVICE: &str = "/dev/fb0";
pub const DEFAULT_TOUCH_DEVICE: &str = "/dev/input/event0";

/// Resource directory relative to the executable.
pub const DEFAULT_RESOURCE_DIR: &str = "assets/pic";

pub const WINDOW_TITLE: &str = "fbsnake";
