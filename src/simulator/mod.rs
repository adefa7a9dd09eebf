//! Headless runs of scripted input through the game pipeline.
//!
//! A script is a comma-separated list of event tags with optional repeat
//! counts, e.g. `flap,tick*200,flap,tick*50,reset`. Each `tick` advances a
//! manual clock by one tick interval and fires the pipeline's timer; `flap`
//! and `reset` are delivered as presses of the first bound key. The
//! pipeline is the same one the interactive game uses.

mod report;

pub use report::SimReport;

use crate::config::GameConfig;
use crate::errors::{FlapError, FlapResult};
use crate::game::{GameEvent, GameState};
use crate::pipeline::build_pipeline;
use crate::stream::sources::{EventHost, KeyName};
use crate::stream::ManualClock;
use crossterm::event::{Event, KeyEvent, KeyModifiers};
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

/// One script entry: a tag and how many times to send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub tag: String,
    pub repeat: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventScript {
    steps: Vec<ScriptStep>,
}

impl EventScript {
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Total number of events the script sends.
    pub fn event_count(&self) -> u64 {
        self.steps.iter().map(|s| s.repeat as u64).sum()
    }
}

impl FromStr for EventScript {
    type Err = FlapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut steps = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (tag, repeat) = match part.split_once('*') {
                Some((tag, count)) => {
                    let repeat: u32 = count.trim().parse().map_err(|_| {
                        FlapError::Script(format!("bad repeat count in {part:?}"))
                    })?;
                    if repeat == 0 {
                        return Err(FlapError::Script(format!(
                            "repeat count must be positive in {part:?}"
                        )));
                    }
                    (tag.trim(), repeat)
                }
                None => (part, 1),
            };
            if tag.is_empty() {
                return Err(FlapError::Script(format!("missing tag in {part:?}")));
            }
            steps.push(ScriptStep {
                tag: tag.to_string(),
                repeat,
            });
        }
        Ok(Self { steps })
    }
}

/// Settings for one simulated run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub seed: u64,
    pub game: GameConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            game: GameConfig::default(),
        }
    }
}

#[derive(Debug, Default)]
struct Tracker {
    events: u64,
    frames: u64,
    crashes: u32,
    best_score: u32,
    last: Option<Snapshot>,
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    score: u32,
    playing: bool,
    game_over: bool,
    bird_x: f64,
    bird_y: f64,
    level_length: usize,
}

impl Snapshot {
    fn of(state: &GameState) -> Self {
        Self {
            score: state.score,
            playing: state.playing,
            game_over: state.game_over,
            bird_x: state.bird.x,
            bird_y: state.bird.y,
            level_length: state.level.len(),
        }
    }
}

fn key_press(name: &str) -> FlapResult<Event> {
    let key = KeyName::parse(name)?;
    Ok(Event::Key(KeyEvent::new(key.key_code(), KeyModifiers::NONE)))
}

/// Run `script` from a fresh state seeded with `config.seed`.
pub fn run_script(script: &EventScript, config: &SimConfig) -> FlapResult<SimReport> {
    let mut game = config.game.clone();
    game.mouse = false;
    game.validate()?;

    let flap = match game.keys.flap.first() {
        Some(name) => key_press(name)?,
        None => return Err(FlapError::Script("no flap key bound".to_string())),
    };
    let reset = game.keys.reset.first().map(|name| key_press(name)).transpose()?;

    let clock = Rc::new(ManualClock::new());
    let host = EventHost::new(clock.clone());
    let initial = GameState::new(config.seed);
    let initial_snapshot = Snapshot::of(&initial);
    let pipeline = build_pipeline(&host, &game, initial)?;

    let tracker = Rc::new(RefCell::new(Tracker::default()));
    {
        let tracker = Rc::clone(&tracker);
        let _ = pipeline.states.subscribe(move |state: &GameState| {
            let mut t = tracker.borrow_mut();
            t.events += 1;
            let was_over = t.last.map(|s| s.game_over).unwrap_or(false);
            if state.game_over && !was_over {
                t.crashes += 1;
            }
            t.best_score = t.best_score.max(state.score);
            t.last = Some(Snapshot::of(state));
        });
    }
    {
        let tracker = Rc::clone(&tracker);
        let _ = pipeline
            .frames
            .subscribe(move |_| tracker.borrow_mut().frames += 1);
    }

    let mut ticks = 0u64;
    let mut ignored = Vec::new();
    for step in script.steps() {
        match step.tag.parse::<GameEvent>() {
            Ok(GameEvent::Tick) => {
                for _ in 0..step.repeat {
                    clock.advance(game.tick_interval());
                    host.fire_due_timers();
                    ticks += 1;
                }
            }
            Ok(GameEvent::Flap) => {
                for _ in 0..step.repeat {
                    host.dispatch(&flap);
                }
            }
            Ok(GameEvent::Reset) => match &reset {
                Some(event) => {
                    for _ in 0..step.repeat {
                        host.dispatch(event);
                    }
                }
                None => ignored.push(step.tag.clone()),
            },
            Err(err) => {
                warn!("{err}; skipping");
                ignored.push(step.tag.clone());
            }
        }
    }

    let t = tracker.borrow();
    let last = t.last.unwrap_or(initial_snapshot);
    Ok(SimReport {
        seed: config.seed,
        events_processed: t.events,
        ticks,
        ignored_tags: ignored,
        frames_rendered: t.frames,
        final_score: last.score,
        best_score: t.best_score,
        crashes: t.crashes,
        playing: last.playing,
        game_over: last.game_over,
        bird_x: last.bird_x,
        bird_y: last.bird_y,
        level_length: last.level_length,
    })
}
