//! Runtime configuration.
//!
//! Everything has a default, so a config file only needs the fields it
//! changes:
//!
//! ```json
//! { "tick_interval_ms": 20, "keys": { "flap": ["Space", "ArrowUp"] } }
//! ```

use crate::constants::{RENDER_DEBOUNCE_MS, TICK_INTERVAL_MS};
use crate::errors::ConfigError;
use crate::stream::sources::KeyName;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Key names bound to each action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyBindings {
    pub flap: Vec<String>,
    pub reset: Vec<String>,
    pub quit: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            flap: vec!["Space".to_string()],
            reset: vec!["r".to_string()],
            quit: vec!["q".to_string(), "Escape".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Milliseconds between physics ticks.
    pub tick_interval_ms: u64,
    /// Minimum milliseconds between rendered frames.
    pub render_debounce_ms: u64,
    /// Level seed. `None` draws one at startup.
    pub seed: Option<u64>,
    /// Capture the mouse so a click flaps.
    pub mouse: bool,
    pub keys: KeyBindings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            render_debounce_ms: RENDER_DEBOUNCE_MS,
            seed: None,
            mouse: true,
            keys: KeyBindings::default(),
        }
    }
}

impl GameConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GameConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.keys.flap.is_empty() && !self.mouse {
            return Err(ConfigError::Invalid(
                "no way to flap: bind a key or enable the mouse".to_string(),
            ));
        }

        let bindings = [
            ("flap", &self.keys.flap),
            ("reset", &self.keys.reset),
            ("quit", &self.keys.quit),
        ];
        for (action, names) in bindings {
            for name in names {
                KeyName::parse(name)
                    .map_err(|err| ConfigError::Invalid(format!("keys.{action}: {err}")))?;
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn render_debounce(&self) -> Duration {
        Duration::from_millis(self.render_debounce_ms)
    }
}
