// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::commands::CommandAction;
use crate::cursor::CursorConfig;
use crate::gesture::{ClassifierConfig, CustomPattern};
use crate::landmarks::Handedness;
use crate::pinch::PinchConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub dominant_hand: Handedness,
    pub debounce_frames: u32,
    pub finger_open_ratio: f64,
    pub pinch_distance: f64,
    pub v_sign_ratio: f64,
    pub closed_depth: f64,
    pub pinch: PinchConfig,
    pub cursor: CursorConfig,
    pub scroll_step: i32,
    pub custom_cooldown_ms: u64,
    pub custom_patterns: Vec<CustomPattern>,
    pub commands: HashMap<String, CommandAction>,
    pub library_path: Option<PathBuf>,
    /// Overrides the resolution reported by the input backend.
    pub screen: Option<(u32, u32)>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            dominant_hand: Handedness::Right,
            debounce_frames: 5,
            finger_open_ratio: 0.5,
            pinch_distance: 0.05,
            v_sign_ratio: 1.7,
            closed_depth: 0.1,
            pinch: PinchConfig::default(),
            cursor: CursorConfig::default(),
            scroll_step: 120,
            custom_cooldown_ms: 1000,
            custom_patterns: Vec::new(),
            commands: HashMap::new(),
            library_path: None,
            screen: None,
        }
    }
}

impl ControllerConfig {
    /// `<config dir>/gesture-controller/config.json` for the current user.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "gesture-controller")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Reads a JSON config; a missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn classifier(&self) -> ClassifierConfig {
        ClassifierConfig {
            pinch_distance: self.pinch_distance,
            v_sign_ratio: self.v_sign_ratio,
            closed_depth: self.closed_depth,
        }
    }

    pub fn custom_cooldown(&self) -> Duration {
        Duration::from_millis(self.custom_cooldown_ms)
    }
}
