//! The three loops the engine runs. Each returns once the state reads
//! Exiting, handing back whatever it owned.

use std::time::Instant;

use fps_clock::FpsClock;
use log::{debug, info, trace, warn};

use super::{
    world::{Steer, Tick, World},
    EngineState, Shared,
};
use crate::{
    controls::{Control, InputEvent, InputHub, InputIntent},
    graphics::compositor::Compositor,
};

/// Hand the latest requested turn to the world. The intent is only
/// consumed when the world decided on it.
pub fn apply_pending_turn(world: &mut World, intent: &InputIntent) -> Option<Steer> {
    let direction = intent.pending()?;
    let steer = world.steer(direction);

    match steer {
        Steer::Applied | Steer::Rejected => intent.clear_new_input_for(direction),
        Steer::Deferred => {}
    }

    trace!("Turn {} {steer:?}", direction.name());
    Some(steer)
}

pub fn apply_control(shared: &Shared, control: Control) {
    match control {
        Control::Pause => {
            shared.toggle_pause();
        }
        Control::Restart => {
            if !shared.restart() {
                debug!("Restart ignored while {:?}", shared.state());
            }
        }
        Control::Quit => shared.request_exit(),
    }
}

pub fn logic_loop(shared: &Shared) {
    let idle = shared.config().idle_poll();
    let mut interval = shared.world().interval();

    loop {
        let wait = match shared.state() {
            EngineState::Exiting => break,
            EngineState::Paused | EngineState::GameOver => idle,
            EngineState::Running => interval,
        };

        if !shared.sleep(wait) {
            break;
        }

        let mut world = shared.world();

        // Might have changed while asleep.
        if shared.state() != EngineState::Running {
            continue;
        }

        apply_pending_turn(&mut world, &shared.intent);

        match world.tick(Instant::now()) {
            Tick::Moved { ate: Some(kind) } => {
                debug!("Ate {}, length {}", kind.name(), world.snake().len());
            }
            Tick::Moved { ate: None } => {}
            Tick::Over(cause) => {
                shared.set_state(EngineState::GameOver);
                info!(
                    "Game over: the snake {} (score {}, length {})",
                    cause.describe(),
                    world.score(),
                    world.snake().len()
                );
            }
        }

        interval = world.interval();
    }

    debug!("Logic thread done");
}

pub fn render_loop(shared: &Shared, mut compositor: Compositor) -> Compositor {
    let mut clock = FpsClock::new(shared.config().fps);

    while shared.state() != EngineState::Exiting {
        let frame = {
            let world = shared.world();
            let mut frame = world.snapshot();
            frame.game_over |= shared.state() == EngineState::GameOver;
            frame
        };

        compositor.draw_frame(&frame);
        clock.tick();
    }

    debug!("Render thread done");
    compositor
}

pub fn input_loop(shared: &Shared, mut hub: InputHub) -> InputHub {
    let poll = shared.config().input_poll();
    let mut had_sources = !hub.is_empty();

    loop {
        for &event in hub.poll() {
            match event {
                InputEvent::Turn(d) => {
                    if !shared.intent.set_direction(d) {
                        trace!("Dropped reversal {}", d.name());
                    }
                }
                InputEvent::Control(c) => {
                    debug!("Control {c:?}");
                    apply_control(shared, c);
                }
            }
        }

        if had_sources && hub.is_empty() {
            warn!("No input sources left");
            had_sources = false;
        }

        if !shared.sleep(poll) {
            break;
        }
    }

    debug!("Input thread done");
    hub
}

/// Run on the main thread while the workers play. Ends the process a
/// while after the game is lost, if configured to.
pub fn supervise(shared: &Shared) {
    let idle = shared.config().idle_poll();
    let delay = shared.config().game_over_exit();
    let mut over_since: Option<Instant> = None;

    while shared.sleep(idle) {
        if shared.state() != EngineState::GameOver {
            over_since = None;
            continue;
        }

        let Some(delay) = delay else {
            continue;
        };

        let since = *over_since.get_or_insert_with(Instant::now);

        if since.elapsed() >= delay {
            info!("Leaving {} ms after game over", delay.as_millis());
            shared.request_exit();
        }
    }
}
