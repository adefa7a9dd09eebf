//! Adapters that feed terminal input and timers into streams.
//!
//! [`EventHost`] plays the part of a browser window: it owns interval timers
//! and raw-event listeners, and it is the only place emissions originate.
//! Sources register with the host at construction and never emit until the
//! host is polled (or driven directly through [`EventHost::dispatch`] and
//! [`EventHost::fire_due_timers`]).

use super::clock::{Clock, SystemClock};
use super::{Emitter, Stream};
use crate::errors::SourceError;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEventKind};
use log::debug;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

/// One firing of an interval timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based firing count for this timer.
    pub sequence: u64,
    /// Host clock reading when the timer fired.
    pub at: Duration,
}

struct Timer {
    interval: Duration,
    next_due: Duration,
    fired: u64,
    emitter: Emitter<Tick>,
}

type Listener = Rc<dyn Fn(&Event)>;

/// Owner of timers and event listeners.
pub struct EventHost {
    clock: Rc<dyn Clock>,
    mouse_capture: bool,
    timers: RefCell<Vec<Timer>>,
    listeners: RefCell<Vec<Listener>>,
}

impl EventHost {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            mouse_capture: false,
            timers: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// A host driven by the system clock.
    pub fn system() -> Self {
        Self::new(Rc::new(SystemClock::new()))
    }

    /// Whether the terminal reports mouse events. Click sources need this.
    pub fn with_mouse_capture(mut self, enabled: bool) -> Self {
        self.mouse_capture = enabled;
        self
    }

    pub fn mouse_capture(&self) -> bool {
        self.mouse_capture
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    pub fn timer_count(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn add_timer(&self, interval: Duration, emitter: Emitter<Tick>) {
        let next_due = self.clock.now() + interval;
        self.timers.borrow_mut().push(Timer {
            interval,
            next_due,
            fired: 0,
            emitter,
        });
    }

    fn add_listener(&self, listener: Listener) {
        self.listeners.borrow_mut().push(listener);
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.borrow().iter().map(|t| t.next_due).min()
    }

    /// Hand a terminal event to every listener.
    pub fn dispatch(&self, event: &Event) {
        let listeners: Vec<Listener> = self.listeners.borrow().iter().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Fire every timer whose deadline has passed. A timer that fell behind
    /// fires once and is rescheduled from now.
    pub fn fire_due_timers(&self) -> usize {
        let now = self.clock.now();
        let due: Vec<(Emitter<Tick>, Tick)> = {
            let mut timers = self.timers.borrow_mut();
            timers
                .iter_mut()
                .filter(|timer| now >= timer.next_due)
                .map(|timer| {
                    timer.fired += 1;
                    timer.next_due += timer.interval;
                    if timer.next_due <= now {
                        timer.next_due = now + timer.interval;
                    }
                    let tick = Tick {
                        sequence: timer.fired,
                        at: now,
                    };
                    (timer.emitter.clone(), tick)
                })
                .collect()
        };

        let fired = due.len();
        for (emitter, tick) in due {
            emitter.emit(tick);
        }
        fired
    }

    /// Wait for terminal input until the next timer deadline (at most
    /// `max_wait`), dispatch what arrived, then fire due timers.
    pub fn poll(&self, max_wait: Duration) -> io::Result<()> {
        let now = self.clock.now();
        let wait = self
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(now).min(max_wait))
            .unwrap_or(max_wait);

        if event::poll(wait)? {
            let event = event::read()?;
            self.dispatch(&event);
        }
        self.fire_due_timers();
        Ok(())
    }
}

/// A key identifier in browser style: a character (`"r"`), a code name
/// (`"KeyR"`, `"Digit1"`) or a named key (`"Space"`, `"Enter"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyName {
    Char(char),
    /// Letter code name; matches either case.
    Letter(char),
    Named(KeyCode),
}

impl KeyName {
    pub fn parse(name: &str) -> Result<Self, SourceError> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Self::Char(c));
        }

        if let Some(rest) = name.strip_prefix("Key") {
            let mut chars = rest.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if c.is_ascii_alphabetic() {
                    return Ok(Self::Letter(c.to_ascii_lowercase()));
                }
            }
        }

        if let Some(rest) = name.strip_prefix("Digit") {
            let mut chars = rest.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if c.is_ascii_digit() {
                    return Ok(Self::Char(c));
                }
            }
        }

        let named = match name {
            "Space" => return Ok(Self::Char(' ')),
            "Enter" => KeyCode::Enter,
            "Escape" | "Esc" => KeyCode::Esc,
            "ArrowUp" | "Up" => KeyCode::Up,
            "ArrowDown" | "Down" => KeyCode::Down,
            "ArrowLeft" | "Left" => KeyCode::Left,
            "ArrowRight" | "Right" => KeyCode::Right,
            "Tab" => KeyCode::Tab,
            "Backspace" => KeyCode::Backspace,
            _ => return Err(SourceError::UnknownKey(name.to_string())),
        };
        Ok(Self::Named(named))
    }

    /// The key code a terminal reports for this key.
    pub fn key_code(&self) -> KeyCode {
        match *self {
            Self::Char(c) | Self::Letter(c) => KeyCode::Char(c),
            Self::Named(code) => code,
        }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        match (*self, key.code) {
            (Self::Char(c), KeyCode::Char(k)) => c == k,
            (Self::Letter(c), KeyCode::Char(k)) => k.to_ascii_lowercase() == c,
            (Self::Named(code), actual) => code == actual,
            _ => false,
        }
    }
}

/// Kinds of raw terminal events a generic source can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Key,
    Click,
    Resize,
    FocusGained,
    FocusLost,
    Paste,
}

impl EventKind {
    pub fn matches(&self, event: &Event) -> bool {
        match (self, event) {
            (Self::Key, Event::Key(key)) => key.kind == KeyEventKind::Press,
            (Self::Click, Event::Mouse(mouse)) => matches!(mouse.kind, MouseEventKind::Down(_)),
            (Self::Resize, Event::Resize(..)) => true,
            (Self::FocusGained, Event::FocusGained) => true,
            (Self::FocusLost, Event::FocusLost) => true,
            (Self::Paste, Event::Paste(_)) => true,
            _ => false,
        }
    }
}

/// Periodic ticks every `interval`.
pub fn from_timer(host: &EventHost, interval: Duration) -> Result<Stream<Tick>, SourceError> {
    if interval.is_zero() {
        return Err(SourceError::ZeroInterval);
    }
    let stream = Stream::new(|emitter| host.add_timer(interval, emitter))
        .with_label(format!("timer({}ms)", interval.as_millis()));
    debug!("registered {}", stream.label());
    Ok(stream)
}

/// Presses of the named key.
///
/// Terminals report presses reliably but releases only with keyboard
/// enhancement, so presses stand in for key-up events. Events tagged
/// `Repeat` or `Release` are ignored. Those tags only arrive when the
/// terminal reports event types; otherwise auto-repeat comes through as
/// further presses, one per repeat.
pub fn from_key(host: &EventHost, name: &str) -> Result<Stream<KeyEvent>, SourceError> {
    let key = KeyName::parse(name)?;
    let stream = Stream::new(|emitter: Emitter<KeyEvent>| {
        host.add_listener(Rc::new(move |event: &Event| {
            if let Event::Key(pressed) = event {
                if pressed.kind == KeyEventKind::Press && key.matches(pressed) {
                    emitter.emit_ref(pressed);
                }
            }
        }));
    })
    .with_label(format!("key({name})"));
    debug!("registered {}", stream.label());
    Ok(stream)
}

/// Raw terminal events of one kind.
pub fn from_event(host: &EventHost, kind: EventKind) -> Result<Stream<Event>, SourceError> {
    if kind == EventKind::Click && !host.mouse_capture() {
        return Err(SourceError::MouseCaptureDisabled);
    }
    let stream = Stream::new(|emitter: Emitter<Event>| {
        host.add_listener(Rc::new(move |event: &Event| {
            if kind.matches(event) {
                emitter.emit_ref(event);
            }
        }));
    })
    .with_label(format!("event({kind:?})"));
    debug!("registered {}", stream.label());
    Ok(stream)
}
