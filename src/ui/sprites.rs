//! Sprite lookup: sheet rectangles, terminal glyph art, and the mapping from
//! level coordinates to screen cells.

use crate::constants::{CELL_H, CELL_W, SPRITE_SIZE, VIEW_HEIGHT};
use crate::game::SpriteRef;
use ratatui::style::Color;

/// Rectangle on the sprite sheet, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Rectangle on screen, in terminal cells. May lie partly off screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

pub fn sheet_rect(sprite: SpriteRef) -> SheetRect {
    SheetRect {
        x: sprite.sheet_index() * SPRITE_SIZE,
        y: 0,
        width: SPRITE_SIZE,
        height: SPRITE_SIZE,
    }
}

/// Level units to terminal columns.
pub fn scale_x(units: f64) -> i32 {
    (units * CELL_W as f64).floor() as i32
}

/// Level units to terminal rows.
pub fn scale_y(units: f64) -> i32 {
    (units * CELL_H as f64).floor() as i32
}

/// Screen cells covered by a sprite at level position `(x, y)`. Level `y`
/// grows upward, screen rows grow downward.
pub fn destination(x: f64, y: f64) -> ScreenRect {
    ScreenRect {
        x: scale_x(x),
        y: scale_y(VIEW_HEIGHT - y - 1.0),
        width: CELL_W,
        height: CELL_H,
    }
}

/// Glyph rows for a sprite. Spaces are transparent.
pub fn glyphs(sprite: SpriteRef) -> [&'static str; CELL_H as usize] {
    match sprite {
        SpriteRef::Bird => [" ,--. ", "(  o >", " `--' "],
        SpriteRef::Flap => [" \\--. ", "(  o >", " /--' "],
        SpriteRef::Floor => ["▀▀▀▀▀▀", "▒▒▒▒▒▒", "▒▒▒▒▒▒"],
        SpriteRef::Tower => ["▐████▌", "▐████▌", "▐████▌"],
        SpriteRef::Roof => ["▄▄▄▄▄▄", "██████", "▀▀▀▀▀▀"],
    }
}

pub fn color(sprite: SpriteRef) -> Color {
    match sprite {
        SpriteRef::Bird | SpriteRef::Flap => Color::Yellow,
        SpriteRef::Floor => Color::Rgb(210, 185, 110),
        SpriteRef::Tower => Color::Green,
        SpriteRef::Roof => Color::LightGreen,
    }
}
