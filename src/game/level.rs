//! Obstacle column generation.

use super::types::{Block, Column};
use crate::constants::MAX_TOWER_HEIGHT;
use log::trace;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Endless supply of level columns, alternating an obstacle column (floor,
/// 0..=4 tower blocks, roof) with a floor-only gap column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelGenerator {
    rng: ChaCha8Rng,
    /// The next column is the gap after an obstacle.
    gap_next: bool,
}

impl LevelGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            gap_next: false,
        }
    }

    /// A new generator seeded from this one's stream, so a restarted level
    /// differs from the previous one but stays reproducible.
    pub fn reseeded(&mut self) -> Self {
        Self::new(self.rng.gen())
    }

    pub fn next_column(&mut self) -> Column {
        if self.gap_next {
            self.gap_next = false;
            return vec![Block::Floor];
        }
        self.gap_next = true;

        let height = self.rng.gen_range(0..=MAX_TOWER_HEIGHT);
        trace!("generated obstacle with tower height {height}");

        let mut column = Vec::with_capacity(height + 2);
        column.push(Block::Floor);
        column.extend(std::iter::repeat(Block::Tower).take(height));
        column.push(Block::Roof);
        column
    }
}

impl Iterator for LevelGenerator {
    type Item = Column;

    fn next(&mut self) -> Option<Column> {
        Some(self.next_column())
    }
}
