//! Flappy bird data structures.
//!
//! Level space: `x` grows rightward in column units, `y` grows upward in
//! block units, and row 0 is the floor.

use super::level::LevelGenerator;
use crate::constants::{BIRD_SPEED_X, VIEW_HEIGHT, VIEW_WIDTH};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Sprites on the sheet, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SpriteRef {
    Bird,
    Flap,
    Floor,
    Tower,
    Roof,
}

impl SpriteRef {
    pub const ALL: [SpriteRef; 5] = [
        SpriteRef::Bird,
        SpriteRef::Flap,
        SpriteRef::Floor,
        SpriteRef::Tower,
        SpriteRef::Roof,
    ];

    /// Position on the sprite sheet, counted in sprites.
    pub fn sheet_index(&self) -> u32 {
        match self {
            Self::Bird => 0,
            Self::Flap => 1,
            Self::Floor => 2,
            Self::Tower => 3,
            Self::Roof => 4,
        }
    }
}

/// One cell of a level column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Block {
    Floor,
    Tower,
    Roof,
}

impl Block {
    pub fn sprite(&self) -> SpriteRef {
        match self {
            Self::Floor => SpriteRef::Floor,
            Self::Tower => SpriteRef::Tower,
            Self::Roof => SpriteRef::Roof,
        }
    }

    pub fn is_solid(&self) -> bool {
        match self {
            Self::Floor | Self::Tower | Self::Roof => true,
        }
    }
}

/// Blocks stacked from the floor up. A floor-only column is open air.
pub type Column = Vec<Block>;

pub fn floor_column() -> Column {
    vec![Block::Floor]
}

/// The player's bird.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bird {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Wing sprite toggle, flipped on every flap.
    pub flapping: bool,
}

impl Bird {
    pub fn new() -> Self {
        Self {
            x: VIEW_WIDTH / 2.0,
            y: VIEW_HEIGHT / 2.0,
            vx: BIRD_SPEED_X,
            vy: 0.0,
            flapping: false,
        }
    }
}

impl Default for Bird {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs the reducer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEvent {
    Tick,
    Flap,
    Reset,
}

impl GameEvent {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Flap => "flap",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returned when a tag names no [`GameEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventTag(pub String);

impl fmt::Display for UnknownEventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event tag {:?}", self.0)
    }
}

impl FromStr for GameEvent {
    type Err = UnknownEventTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tick" => Ok(Self::Tick),
            "flap" => Ok(Self::Flap),
            "reset" => Ok(Self::Reset),
            other => Err(UnknownEventTag(other.to_string())),
        }
    }
}

/// Complete game state. Every event produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub bird: Bird,
    pub level: Vec<Column>,
    /// Obstacle columns behind the bird.
    pub score: u32,
    /// Set by the first flap; gravity and obstacles start then.
    pub playing: bool,
    /// Terminal until a reset.
    pub game_over: bool,
    /// Source of obstacle columns for this run.
    pub generator: LevelGenerator,
}

impl GameState {
    /// Fresh state whose level generator is seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_generator(LevelGenerator::new(seed))
    }

    pub fn with_generator(generator: LevelGenerator) -> Self {
        Self {
            bird: Bird::new(),
            level: initial_level(),
            score: 0,
            playing: false,
            game_over: false,
            generator,
        }
    }
}

/// Floor-only columns covering the first screen.
pub fn initial_level() -> Vec<Column> {
    (0..VIEW_WIDTH as usize).map(|_| floor_column()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = GameState::new(7);
        assert_eq!(state.score, 0);
        assert!(!state.playing);
        assert!(!state.game_over);
        assert_eq!(state.level.len(), 6);
        assert!(state.level.iter().all(|c| c == &vec![Block::Floor]));
        assert!((state.bird.x - 3.0).abs() < f64::EPSILON);
        assert!((state.bird.y - 4.5).abs() < f64::EPSILON);
        assert!((state.bird.vx - 0.05).abs() < f64::EPSILON);
        assert!(!state.bird.flapping);
    }

    #[test]
    fn test_blocks_are_solid_and_have_sprites() {
        assert!(Block::Floor.is_solid());
        assert!(Block::Tower.is_solid());
        assert!(Block::Roof.is_solid());
        assert_eq!(Block::Roof.sprite(), SpriteRef::Roof);
        assert_eq!(Block::Floor.sprite().sheet_index(), 2);
    }

    #[test]
    fn test_event_tags_round_trip() {
        for event in [GameEvent::Tick, GameEvent::Flap, GameEvent::Reset] {
            assert_eq!(event.tag().parse::<GameEvent>(), Ok(event));
        }
        assert_eq!(
            "jump".parse::<GameEvent>(),
            Err(UnknownEventTag("jump".to_string()))
        );
    }

    #[test]
    fn test_same_seed_same_state() {
        assert_eq!(GameState::new(42), GameState::new(42));
    }
}
