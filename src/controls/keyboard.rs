use std::time::Duration;

use crossterm::{
    event::{poll, read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use log::{info, warn};

use super::{Control, InputError, InputEvent, InputSource};
use crate::game::Direction;

pub fn map_key(event: KeyEvent) -> Option<InputEvent> {
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') => Some(InputEvent::Control(Control::Quit)),
            _ => None,
        };
    }

    match event.code {
        KeyCode::Up | KeyCode::Char('w' | 'W') => Some(InputEvent::Turn(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s' | 'S') => Some(InputEvent::Turn(Direction::Down)),
        KeyCode::Left | KeyCode::Char('a' | 'A') => Some(InputEvent::Turn(Direction::Left)),
        KeyCode::Right | KeyCode::Char('d' | 'D') => Some(InputEvent::Turn(Direction::Right)),

        KeyCode::Char('p' | 'P' | ' ') => Some(InputEvent::Control(Control::Pause)),
        KeyCode::Char('r' | 'R') => Some(InputEvent::Control(Control::Restart)),
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(InputEvent::Control(Control::Quit)),

        _ => None,
    }
}

/// Keys from the controlling terminal, read in raw mode.
pub struct Keyboard;

impl Keyboard {
    pub fn new() -> Result<Self, InputError> {
        enable_raw_mode()?;
        info!("Keyboard input on the terminal");
        Ok(Self)
    }
}

impl Drop for Keyboard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Could not restore the terminal: {e}");
        }
    }
}

impl InputSource for Keyboard {
    fn name(&self) -> &str {
        "terminal"
    }

    fn poll(&mut self, out: &mut Vec<InputEvent>) -> Result<(), InputError> {
        while poll(Duration::ZERO)? {
            if let Event::Key(event) = read()? {
                if event.kind == KeyEventKind::Release {
                    continue;
                }

                out.extend(map_key(event));
            }
        }

        Ok(())
    }
}
