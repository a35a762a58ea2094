//! Tunables, read from `fbsnake.toml` in the working directory unless
//! `--config` points somewhere else. Every key is optional.

use log::{debug, info};
use serde::Deserialize;
use std::{fs, io, path::Path, time::Duration};

use super::{CELL_SIZE, CONFIG_FILE, DEFAULT_FPS, INITIAL_LENGTH, SCREEN_HEIGHT, SCREEN_WIDTH, TRANSPARENT};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ItemWeights {
    pub common: u32,
    pub speed: u32,
    pub double: u32,
    pub hazard: u32,
}

impl Default for ItemWeights {
    fn default() -> Self {
        Self {
            common: 50,
            speed: 15,
            double: 20,
            hazard: 15,
        }
    }
}

impl ItemWeights {
    /// In the order of `ItemKind::ALL`.
    pub fn as_array(&self) -> [u32; 4] {
        [self.common, self.speed, self.double, self.hazard]
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Play area in pixels, clamped to the device.
    pub screen_width: u32,
    pub screen_height: u32,
    /// Edge of one board cell in pixels.
    pub cell_size: u32,

    pub base_interval_ms: u64,
    pub interval_step_ms: u64,
    pub min_interval_ms: u64,

    pub idle_poll_ms: u64,
    pub input_poll_ms: u64,
    pub fps: u32,

    pub max_items: usize,
    pub item_lifetime_ms: u64,
    pub item_weights: ItemWeights,

    /// Tick interval multiplier while a speed boost is active.
    pub speed_boost_factor: f32,
    pub speed_boost_ms: u64,

    pub swipe_threshold: i32,
    /// Raw touch coordinate range, scaled onto the play area.
    pub touch_range: (i32, i32),

    pub transparent_color: u32,
    pub border_walls: bool,

    /// 0 keeps the game open after it ends.
    pub game_over_exit_ms: u64,

    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            cell_size: CELL_SIZE,

            base_interval_ms: 400,
            interval_step_ms: 10,
            min_interval_ms: 150,

            idle_poll_ms: 100,
            input_poll_ms: 50,
            fps: DEFAULT_FPS,

            max_items: 3,
            item_lifetime_ms: 10_000,
            item_weights: ItemWeights::default(),

            speed_boost_factor: 0.5,
            speed_boost_ms: 10_000,

            swipe_threshold: 30,
            touch_range: (1024, 600),

            transparent_color: TRANSPARENT,
            border_walls: false,

            game_over_exit_ms: 3000,

            seed: None,
        }
    }
}

impl Config {
    /// Read from `path`, or from `fbsnake.toml` if none was given. A
    /// missing default file is not an error; a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some();
        let path = path.unwrap_or(Path::new(CONFIG_FILE));

        match fs::read_to_string(path) {
            Ok(text) => {
                info!("Reading config from {}", path.display());
                Self::parse(&text)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
                debug!("No {} found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                key,
                reason: reason.into(),
            }
        }

        if self.cell_size == 0 {
            return Err(invalid("cell_size", "must be positive"));
        }

        if self.screen_width < self.cell_size || self.screen_height < self.cell_size {
            return Err(invalid("screen_width", "play area is smaller than one cell"));
        }

        if self.fps == 0 {
            return Err(invalid("fps", "must be positive"));
        }

        if self.min_interval_ms == 0 {
            return Err(invalid("min_interval_ms", "must be positive"));
        }

        if !(self.speed_boost_factor > 0.0 && self.speed_boost_factor.is_finite()) {
            return Err(invalid("speed_boost_factor", "must be a positive number"));
        }

        if self.max_items > 0 && self.item_weights.as_array().iter().all(|&w| w == 0) {
            return Err(invalid("item_weights", "at least one weight must be non-zero"));
        }

        if self.touch_range.0 <= 1 || self.touch_range.1 <= 1 {
            return Err(invalid("touch_range", "must be larger than 1x1"));
        }

        Ok(())
    }

    /// Board size in cells.
    pub fn board_size(&self) -> (i32, i32) {
        (
            (self.screen_width / self.cell_size) as i32,
            (self.screen_height / self.cell_size) as i32,
        )
    }

    /// Tick interval for a snake of `len` cells: shrinks with length down
    /// to the floor.
    pub fn interval_for(&self, len: usize) -> Duration {
        let extra = (len.saturating_sub(INITIAL_LENGTH)) as u64;
        let ms = self
            .base_interval_ms
            .saturating_sub(extra.saturating_mul(self.interval_step_ms))
            .max(self.min_interval_ms);

        Duration::from_millis(ms)
    }

    pub fn boosted(&self, interval: Duration) -> Duration {
        let ms = (interval.as_millis() as f64 * self.speed_boost_factor as f64).round() as u64;
        Duration::from_millis(ms.max(1))
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    pub fn item_lifetime(&self) -> Duration {
        Duration::from_millis(self.item_lifetime_ms)
    }

    pub fn speed_boost(&self) -> Duration {
        Duration::from_millis(self.speed_boost_ms)
    }

    pub fn game_over_exit(&self) -> Option<Duration> {
        (self.game_over_exit_ms > 0).then(|| Duration::from_millis(self.game_over_exit_ms))
    }
}
