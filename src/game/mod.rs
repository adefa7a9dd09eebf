//! Flappy bird rules.
//!
//! The game is a pure reducer over [`GameEvent`]s. Physics, level
//! generation, scoring and collision are small functions composed by
//! [`logic::update`]; the only randomness is the seeded [`LevelGenerator`]
//! carried inside the state, so a fixed initial state and event sequence
//! always produce the same result.

pub mod level;
pub mod logic;
pub mod types;

pub use level::LevelGenerator;
pub use logic::*;
pub use types::*;
