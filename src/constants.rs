// Viewport size in level units
pub const VIEW_WIDTH: f64 = 6.0;
pub const VIEW_HEIGHT: f64 = 9.0;

// Timing
pub const TICK_INTERVAL_MS: u64 = 15;
pub const RENDER_DEBOUNCE_MS: u64 = 15;

// Bird physics, per tick
pub const GRAVITY: f64 = 0.003;
pub const MIN_VELOCITY_Y: f64 = -0.1;
pub const FLAP_IMPULSE: f64 = 0.09;
pub const MAX_FLAP_VELOCITY_Y: f64 = 0.05;
pub const BIRD_SPEED_X: f64 = 0.05;
pub const GAME_OVER_VELOCITY_Y: f64 = -0.1;

// Level generation
pub const MAX_TOWER_HEIGHT: usize = 4;

// Sprite sheet cells are square, in pixels
pub const SPRITE_SIZE: u32 = 64;

// Terminal cells per level unit
pub const CELL_W: u16 = 6;
pub const CELL_H: u16 = 3;
