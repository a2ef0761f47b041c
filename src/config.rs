/// User configuration, read from config.toml
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::persist::DEFAULT_PATTERN_PATH;

pub const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub midi_output: Option<String>,
    pub pattern_path: String,
    pub tempo_up: f32,
    pub tempo_down: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            midi_output: None,
            pattern_path: DEFAULT_PATTERN_PATH.to_string(),
            tempo_up: 1.03,
            tempo_down: 0.97,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        toml::from_str(&s).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(CONFIG_PATH)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let s = toml::to_string(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, s)?;
        Ok(())
    }
}
