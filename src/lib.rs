//! flapstream - a terminal flappy bird built on a small push-based stream
//! library.
//!
//! Input sources (keys, clicks, a timer) are [`Stream`]s. They are merged
//! into one stream of [`GameEvent`]s, folded through the pure
//! [`game::update`] reducer, rate-limited and drawn with ratatui.

pub mod build_info;
pub mod config;
pub mod constants;
pub mod errors;
pub mod game;
pub mod logging;
pub mod pipeline;
pub mod simulator;
pub mod stream;
pub mod ui;

pub use errors::{FlapError, FlapResult};
pub use game::{GameEvent, GameState};
pub use stream::Stream;
