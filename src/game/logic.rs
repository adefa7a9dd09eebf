//! Game logic for flappy bird: the reducer and its sub-rules.

use super::level::LevelGenerator;
use super::types::{floor_column, Bird, Block, Column, GameEvent, GameState};
use crate::constants::{
    FLAP_IMPULSE, GAME_OVER_VELOCITY_Y, GRAVITY, MAX_FLAP_VELOCITY_Y, MIN_VELOCITY_Y, VIEW_WIDTH,
};
use log::{debug, info};

/// Advance `state` by one event.
pub fn update(event: &GameEvent, state: GameState) -> GameState {
    match event {
        GameEvent::Tick => tick(state),
        GameEvent::Flap => {
            if state.game_over {
                state
            } else if !state.playing {
                info!("game started");
                GameState {
                    playing: true,
                    ..state
                }
            } else {
                GameState {
                    bird: flap(&state.bird),
                    ..state
                }
            }
        }
        GameEvent::Reset => {
            if state.game_over {
                reset(state)
            } else {
                state
            }
        }
    }
}

/// [`update`] driven by a text tag. Unknown tags leave the state untouched.
pub fn update_tag(tag: &str, state: GameState) -> GameState {
    match tag.parse::<GameEvent>() {
        Ok(event) => update(&event, state),
        Err(err) => {
            debug!("{err}; state unchanged");
            state
        }
    }
}

/// Physics, level growth, scoring, then collision.
pub fn tick(state: GameState) -> GameState {
    let GameState {
        bird,
        level,
        playing,
        game_over,
        mut generator,
        ..
    } = state;

    let bird = apply_physics(&bird, playing);
    let level = build_level(level, bird.x, playing, &mut generator);
    let score = calculate_score(&bird, &level);

    collisions(GameState {
        bird,
        level,
        score,
        playing,
        game_over,
        generator,
    })
}

pub fn apply_gravity(bird: &Bird) -> Bird {
    Bird {
        vy: (bird.vy - GRAVITY).max(MIN_VELOCITY_Y),
        ..*bird
    }
}

pub fn apply_velocity(bird: &Bird) -> Bird {
    Bird {
        x: bird.x + bird.vx,
        y: bird.y + bird.vy,
        ..*bird
    }
}

/// Before the first flap the bird drifts without gravity.
pub fn apply_physics(bird: &Bird, playing: bool) -> Bird {
    let moved = apply_velocity(bird);
    if playing {
        apply_gravity(&moved)
    } else {
        moved
    }
}

pub fn flap(bird: &Bird) -> Bird {
    Bird {
        vy: (bird.vy + FLAP_IMPULSE).min(MAX_FLAP_VELOCITY_Y),
        flapping: !bird.flapping,
        ..*bird
    }
}

/// Number of columns that must exist for a bird at `bird_x`.
pub fn look_ahead(bird_x: f64) -> usize {
    (bird_x + VIEW_WIDTH / 2.0 + 1.0).ceil().max(0.0) as usize
}

/// Extend `level` until it covers [`look_ahead`]. Obstacles only appear
/// once the game is playing; before that the level is floor.
pub fn build_level(
    mut level: Vec<Column>,
    bird_x: f64,
    playing: bool,
    generator: &mut LevelGenerator,
) -> Vec<Column> {
    let needed = look_ahead(bird_x);
    while level.len() < needed {
        let column = if playing {
            generator.next_column()
        } else {
            floor_column()
        };
        level.push(column);
    }
    level
}

/// Obstacle columns up to the bird's position.
pub fn calculate_score(bird: &Bird, level: &[Column]) -> u32 {
    let passed = (bird.x.ceil().max(0.0) as usize).min(level.len());
    level[..passed].iter().filter(|c| c.len() > 1).count() as u32
}

/// Block at the rounded level position, if any. Positions outside the
/// generated grid hold nothing.
pub fn block_at(level: &[Column], x: f64, y: f64) -> Option<Block> {
    let (col, row) = (x.round(), y.round());
    if col < 0.0 || row < 0.0 {
        return None;
    }
    level.get(col as usize)?.get(row as usize).copied()
}

pub fn collisions(state: GameState) -> GameState {
    let hit = block_at(&state.level, state.bird.x, state.bird.y).is_some_and(|b| b.is_solid());
    if hit {
        game_over(state)
    } else {
        state
    }
}

/// Stop the bird and let it drop.
pub fn game_over(state: GameState) -> GameState {
    if !state.game_over {
        info!("game over with score {}", state.score);
    }
    GameState {
        bird: Bird {
            vx: 0.0,
            vy: GAME_OVER_VELOCITY_Y,
            ..state.bird
        },
        game_over: true,
        ..state
    }
}

fn reset(mut state: GameState) -> GameState {
    info!("reset after score {}", state.score);
    GameState::with_generator(state.generator.reseeded())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_state() -> GameState {
        GameState {
            playing: true,
            ..GameState::new(3)
        }
    }

    fn obstacle(height: usize) -> Column {
        let mut column = vec![Block::Floor];
        column.extend(std::iter::repeat(Block::Tower).take(height));
        column.push(Block::Roof);
        column
    }

    #[test]
    fn test_first_flap_starts_game_without_moving() {
        let state = GameState::new(1);
        let next = update(&GameEvent::Flap, state.clone());
        assert!(next.playing);
        assert_eq!(next.bird, state.bird);
    }

    #[test]
    fn test_flap_applies_capped_impulse_and_toggles_wings() {
        let state = playing_state();
        let next = update(&GameEvent::Flap, state);
        assert!((next.bird.vy - MAX_FLAP_VELOCITY_Y).abs() < 1e-12);
        assert!(next.bird.flapping);

        let falling = GameState {
            bird: Bird {
                vy: -0.1,
                ..Bird::new()
            },
            ..playing_state()
        };
        let next = update(&GameEvent::Flap, falling);
        assert!((next.bird.vy - (-0.01)).abs() < 1e-12);
    }

    #[test]
    fn test_flap_ignored_after_game_over() {
        let state = game_over(playing_state());
        let next = update(&GameEvent::Flap, state.clone());
        assert_eq!(next, state);
    }

    #[test]
    fn test_gravity_is_clamped() {
        let bird = Bird {
            vy: -0.099,
            ..Bird::new()
        };
        assert!((apply_gravity(&bird).vy - MIN_VELOCITY_Y).abs() < 1e-12);
        let bird = Bird::new();
        assert!((apply_gravity(&bird).vy - (-GRAVITY)).abs() < 1e-12);
    }

    #[test]
    fn test_no_gravity_before_start() {
        let state = GameState::new(1);
        let next = tick(state.clone());
        assert!((next.bird.vy - state.bird.vy).abs() < f64::EPSILON);
        assert!((next.bird.x - (state.bird.x + state.bird.vx)).abs() < 1e-12);
    }

    #[test]
    fn test_gravity_while_playing() {
        let next = tick(playing_state());
        assert!(next.bird.vy < 0.0);
    }

    #[test]
    fn test_level_is_floor_before_start() {
        let mut state = GameState::new(1);
        for _ in 0..100 {
            state = tick(state);
        }
        assert!(state.level.iter().all(|c| c.len() == 1));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_level_extends_to_look_ahead() {
        let mut generator = LevelGenerator::new(1);
        let level = build_level(Vec::new(), 10.2, true, &mut generator);
        assert_eq!(level.len(), 15);
        assert_eq!(look_ahead(10.2), 15);
    }

    #[test]
    fn test_build_level_keeps_existing_columns() {
        let mut generator = LevelGenerator::new(1);
        let existing = vec![obstacle(2); 20];
        let level = build_level(existing.clone(), 3.0, true, &mut generator);
        assert_eq!(level, existing);
    }

    #[test]
    fn test_score_counts_obstacles_behind_bird() {
        let level = vec![
            floor_column(),
            obstacle(0),
            floor_column(),
            obstacle(3),
            floor_column(),
        ];
        let bird = Bird {
            x: 2.5,
            ..Bird::new()
        };
        assert_eq!(calculate_score(&bird, &level), 1);
        let bird = Bird { x: 3.2, ..bird };
        assert_eq!(calculate_score(&bird, &level), 2);
        let bird = Bird { x: 50.0, ..bird };
        assert_eq!(calculate_score(&bird, &level), 2);
    }

    #[test]
    fn test_block_lookup_guards_range() {
        let level = vec![obstacle(1)];
        assert_eq!(block_at(&level, 0.2, 0.4), Some(Block::Floor));
        assert_eq!(block_at(&level, 0.0, 1.6), Some(Block::Roof));
        assert_eq!(block_at(&level, 0.0, 3.0), None);
        assert_eq!(block_at(&level, 0.0, -0.6), None);
        assert_eq!(block_at(&level, -0.6, 1.0), None);
        assert_eq!(block_at(&level, 7.0, 0.0), None);
    }

    #[test]
    fn test_collision_triggers_game_over() {
        let mut state = playing_state();
        state.bird = Bird {
            x: 1.0,
            y: 0.2,
            vx: 0.0,
            vy: 0.0,
            flapping: false,
        };
        let next = collisions(state);
        assert!(next.game_over);
        assert_eq!(next.bird.vx, 0.0);
        assert!((next.bird.vy - GAME_OVER_VELOCITY_Y).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_only_after_game_over() {
        let state = playing_state();
        let same = update(&GameEvent::Reset, state.clone());
        assert_eq!(same, state);

        let over = game_over(playing_state());
        let fresh = update(&GameEvent::Reset, over);
        assert!(!fresh.game_over);
        assert!(!fresh.playing);
        assert_eq!(fresh.score, 0);
        assert_eq!(fresh.bird, Bird::new());
        assert_eq!(fresh.level.len(), 6);
    }

    #[test]
    fn test_unknown_tag_is_noop() {
        let state = playing_state();
        let next = update_tag("moonwalk", state.clone());
        assert_eq!(next, state);
        let next = update_tag("flap", state);
        assert!(next.bird.flapping);
    }
}
