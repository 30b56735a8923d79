use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PlayerError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "loopview.json";
pub const CONFIG_ENV_VAR: &str = "LOOPVIEW_CONFIG";

/// How the decoded video is laid out inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Keep aspect ratio, letterbox inside the region.
    #[default]
    Fit,
    /// Keep aspect ratio, cover the region and crop the overflow.
    Fill,
    Stretch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    pub resource_name: String,
    pub resource_ext: String,
    /// Extra directories searched before the default asset locations.
    pub resource_dirs: Vec<PathBuf>,
    pub show_time_label: bool,
    pub tick_interval_ms: u64,
    pub fill_mode: FillMode,
    pub window_title: String,
    pub window_size: [f32; 2],
    pub muted: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            resource_name: "sample".to_string(),
            resource_ext: "mp4".to_string(),
            resource_dirs: Vec::new(),
            show_time_label: true,
            tick_interval_ms: 10,
            fill_mode: FillMode::Fit,
            window_title: "loopview".to_string(),
            window_size: [640.0, 360.0],
            muted: false,
        }
    }
}

impl PlayerConfig {
    /// Load a config from a JSON file at the given path.
    pub fn load_from_file(path: &Path) -> Result<PlayerConfig> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|source| PlayerError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> std::result::Result<PlayerConfig, serde_json::Error> {
        let mut config: PlayerConfig = serde_json::from_str(json)?;
        // A zero interval would spin the tick thread.
        config.tick_interval_ms = config.tick_interval_ms.max(1);
        Ok(config)
    }

    /// Resolve the config for this run.
    ///
    /// An explicit path (CLI argument, then `LOOPVIEW_CONFIG`) must load; a
    /// missing `loopview.json` in the working directory silently yields the
    /// defaults. Any failure is logged and falls back to defaults.
    pub fn discover(explicit: Option<PathBuf>) -> PlayerConfig {
        let explicit = explicit.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        let path = match explicit {
            Some(path) => path,
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !local.exists() {
                    return PlayerConfig::default();
                }
                local
            }
        };

        match Self::load_from_file(&path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{e}; using default config");
                PlayerConfig::default()
            }
        }
    }

    pub fn resource_file_name(&self) -> String {
        format!("{}.{}", self.resource_name, self.resource_ext)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}
