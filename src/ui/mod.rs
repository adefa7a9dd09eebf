//! Terminal rendering.

pub mod scene;
pub mod sprites;

use crate::game::GameState;
use log::error;
use ratatui::{backend::Backend, Terminal};

pub use scene::{render_scene, SceneWidget};

/// Draws game states to a terminal. Draw failures are logged, never raised,
/// so a bad frame cannot stop the game loop.
pub struct Renderer<B: Backend> {
    terminal: Terminal<B>,
    frames_drawn: u64,
}

impl<B: Backend> Renderer<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            frames_drawn: 0,
        }
    }

    pub fn render(&mut self, state: &GameState) {
        match self.terminal.draw(|frame| render_scene(frame, state)) {
            Ok(_) => self.frames_drawn += 1,
            Err(err) => error!("failed to draw frame: {err}"),
        }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}
