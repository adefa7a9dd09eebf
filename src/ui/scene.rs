//! UI rendering for the game scene.

use super::sprites::{color, destination, glyphs, scale_x, scale_y};
use crate::constants::{CELL_H, CELL_W, VIEW_HEIGHT, VIEW_WIDTH};
use crate::game::{GameState, SpriteRef};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

/// Size of the play field in terminal cells.
pub fn scene_size() -> (u16, u16) {
    (
        (VIEW_WIDTH * CELL_W as f64) as u16,
        (VIEW_HEIGHT * CELL_H as f64) as u16,
    )
}

/// Draws one game state: level, bird, score and prompts.
pub struct SceneWidget<'a> {
    state: &'a GameState,
}

impl<'a> SceneWidget<'a> {
    pub fn new(state: &'a GameState) -> Self {
        Self { state }
    }
}

impl Widget for SceneWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state;
        // Keep the bird horizontally centred.
        let camera = scale_x(VIEW_WIDTH / 2.0 - state.bird.x - 0.5);

        let first = state.level.len().saturating_sub(VIEW_WIDTH as usize + 2);
        for (x, column) in state.level.iter().enumerate().skip(first) {
            for (y, block) in column.iter().enumerate() {
                draw_sprite(buf, area, block.sprite(), x as f64, y as f64, camera);
            }
        }

        let bird = if state.bird.flapping {
            SpriteRef::Flap
        } else {
            SpriteRef::Bird
        };
        draw_sprite(buf, area, bird, state.bird.x, state.bird.y, camera);

        draw_text(buf, area, 1, &state.score.to_string());

        if state.game_over {
            draw_text(buf, area, scale_y(VIEW_HEIGHT / 2.0 - 1.0), "GAME OVER");
            draw_text(buf, area, scale_y(VIEW_HEIGHT / 2.0), "Press R to restart");
        }

        if !state.playing {
            draw_text(buf, area, scale_y(VIEW_HEIGHT / 2.0), "Press Space to start");
        }
    }
}

fn draw_sprite(buf: &mut Buffer, area: Rect, sprite: SpriteRef, x: f64, y: f64, camera: i32) {
    let dest = destination(x, y);
    let fg = color(sprite);
    for (row, line) in glyphs(sprite).iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let sx = area.x as i32 + dest.x + camera + col as i32;
            let sy = area.y as i32 + dest.y + row as i32;
            if let Some((cx, cy)) = clip(area, sx, sy) {
                buf.get_mut(cx, cy).set_char(ch).set_fg(fg);
            }
        }
    }
}

fn clip(area: Rect, x: i32, y: i32) -> Option<(u16, u16)> {
    let inside = x >= area.left() as i32
        && x < area.right() as i32
        && y >= area.top() as i32
        && y < area.bottom() as i32;
    inside.then_some((x as u16, y as u16))
}

/// Centred, bold text on row `row` of `area`.
fn draw_text(buf: &mut Buffer, area: Rect, row: i32, text: &str) {
    let width = text.chars().count() as u16;
    if row < 0 || row >= area.height as i32 || width > area.width {
        return;
    }
    let x = area.x + (area.width - width) / 2;
    let y = area.y + row as u16;
    buf.set_string(
        x,
        y,
        text,
        Style::default()
            .fg(Color::White)
            .bg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );
}

/// Render the bordered play field centred in the frame.
pub fn render_scene(frame: &mut Frame, state: &GameState) {
    let area = frame.size();
    frame.render_widget(Clear, area);

    let (width, height) = scene_size();
    if area.width < width + 2 || area.height < height + 2 {
        let notice = Paragraph::new(format!(
            "Terminal too small: need {}x{}",
            width + 2,
            height + 2
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(notice, area);
        return;
    }

    let outer = Rect {
        x: area.x + (area.width - width - 2) / 2,
        y: area.y + (area.height - height - 2) / 2,
        width: width + 2,
        height: height + 2,
    };
    let block = Block::default()
        .title(" flapstream ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(outer);
    frame.render_widget(block, outer);
    frame.render_widget(SceneWidget::new(state), inner);
}
