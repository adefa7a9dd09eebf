//! Wiring from input sources to rendered frames.
//!
//! ```text
//! timer ─────────────► map(Tick) ─┐
//! reset keys ─► combine ► map(Reset) ─┼► combine ► fold(update) ► debounce ► frames
//! flap keys + clicks ► combine ► map(Flap) ─┘
//! ```

use crate::config::GameConfig;
use crate::errors::FlapResult;
use crate::game::{update, GameEvent, GameState};
use crate::stream::sources::{from_event, from_key, from_timer, EventHost, EventKind};
use crate::stream::Stream;
use crossterm::event::{Event, KeyCode, KeyModifiers};

/// The streams a running game needs to hold on to.
pub struct Pipeline {
    /// Every game event, in arrival order.
    pub events: Stream<GameEvent>,
    /// One state per event.
    pub states: Stream<GameState>,
    /// States rate-limited for drawing.
    pub frames: Stream<GameState>,
    /// Fires when a quit key (or Ctrl-C) is pressed.
    pub quit: Stream<()>,
}

/// Union of the named key sources, as unit values.
fn keys(host: &EventHost, names: &[String]) -> FlapResult<Vec<Stream<()>>> {
    names
        .iter()
        .map(|name| Ok(from_key(host, name)?.map(|_| ())))
        .collect()
}

pub fn build_pipeline(
    host: &EventHost,
    config: &GameConfig,
    initial: GameState,
) -> FlapResult<Pipeline> {
    let mut flap_inputs = keys(host, &config.keys.flap)?;
    if host.mouse_capture() {
        flap_inputs.push(from_event(host, EventKind::Click)?.map(|_| ()));
    }
    let flaps = Stream::combine(&flap_inputs)
        .with_label("flaps")
        .map(|_| GameEvent::Flap);

    let resets = Stream::combine(&keys(host, &config.keys.reset)?)
        .with_label("resets")
        .map(|_| GameEvent::Reset);

    let ticks = from_timer(host, config.tick_interval())?.map(|_| GameEvent::Tick);

    let events = Stream::combine([&ticks, &resets, &flaps]).with_label("events");
    let states = events
        .fold(|event, state| update(event, state), initial)
        .with_label("states");
    let frames = states
        .debounce_with_clock(config.render_debounce(), host.clock())
        .with_label("frames");

    let mut quit_inputs = keys(host, &config.keys.quit)?;
    quit_inputs.push(
        from_event(host, EventKind::Key)?
            .filter(|event| match event {
                Event::Key(key) => {
                    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                }
                _ => false,
            })
            .map(|_| ()),
    );
    let quit = Stream::combine(&quit_inputs).with_label("quit");

    Ok(Pipeline {
        events,
        states,
        frames,
        quit,
    })
}
