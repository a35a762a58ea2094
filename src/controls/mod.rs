pub mod keyboard;
pub mod touch;

use std::{
    io,
    sync::{Mutex, PoisonError},
};

use crossbeam_channel::{Receiver, TryRecvError};
use log::warn;

use crate::game::Direction;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("could not open {path}: {source}")]
    Open { path: String, source: io::Error },
    #[error("read failed: {0}")]
    Read(#[from] io::Error),
    #[error("input source went away")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Toggle between running and paused.
    Pause,
    Restart,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Turn(Direction),
    Control(Control),
}

#[derive(Debug)]
struct IntentState {
    direction: Direction,
    fresh: bool,
}

/// The latest direction asked for, and whether anyone has acted on it yet.
/// Has its own lock, separate from the game state.
#[derive(Debug)]
pub struct InputIntent {
    state: Mutex<IntentState>,
}

impl InputIntent {
    pub fn new(direction: Direction) -> Self {
        Self {
            state: Mutex::new(IntentState {
                direction,
                fresh: false,
            }),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut IntentState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn direction(&self) -> Direction {
        self.with(|s| s.direction)
    }

    pub fn has_new_input(&self) -> bool {
        self.with(|s| s.fresh)
    }

    pub fn clear_new_input(&self) {
        self.with(|s| s.fresh = false);
    }

    /// Clear only if nothing newer arrived since `direction` was read.
    pub fn clear_new_input_for(&self, direction: Direction) {
        self.with(|s| {
            if s.direction == direction {
                s.fresh = false;
            }
        });
    }

    /// Record a request. Straight reversals of the last request are
    /// dropped here already. Returns whether it was taken.
    pub fn set_direction(&self, direction: Direction) -> bool {
        self.with(|s| {
            if direction == s.direction.opposite() {
                return false;
            }

            s.direction = direction;
            s.fresh = true;
            true
        })
    }

    /// The pending request, if there is one.
    pub fn pending(&self) -> Option<Direction> {
        self.with(|s| s.fresh.then_some(s.direction))
    }

    pub fn reset(&self, direction: Direction) {
        self.with(|s| {
            s.direction = direction;
            s.fresh = false;
        });
    }
}

pub trait InputSource: Send {
    fn name(&self) -> &str;

    /// Append whatever arrived since the last call. Must not block.
    fn poll(&mut self, out: &mut Vec<InputEvent>) -> Result<(), InputError>;
}

/// Events forwarded from another thread, e.g. the window's event loop.
impl InputSource for Receiver<InputEvent> {
    fn name(&self) -> &str {
        "window"
    }

    fn poll(&mut self, out: &mut Vec<InputEvent>) -> Result<(), InputError> {
        loop {
            match self.try_recv() {
                Ok(event) => out.push(event),
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => return Err(InputError::Disconnected),
            }
        }
    }
}

/// All input sources, polled together by the input thread.
#[derive(Default)]
pub struct InputHub {
    sources: Vec<Box<dyn InputSource>>,
    events: Vec<InputEvent>,
}

impl InputHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source: Box<dyn InputSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Poll every source once. A source that errors is dropped.
    pub fn poll(&mut self) -> &[InputEvent] {
        self.events.clear();

        let events = &mut self.events;
        self.sources.retain_mut(|source| match source.poll(events) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping input source {}: {e}", source.name());
                false
            }
        });

        &self.events
    }
}
