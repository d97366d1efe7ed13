use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_double_tap_window_ms() -> u64 {
    300
}

fn default_long_press_ms() -> u64 {
    800
}

fn default_block_height_px() -> f32 {
    48.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window in which a second activation on the same cell counts as a
    /// double-activate.
    #[serde(default = "default_double_tap_window_ms")]
    pub double_tap_window_ms: u64,
    /// Hold threshold for the contextual action menu on touch surfaces.
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,
    /// Fixed height of one time-block, used to convert edge-drag
    /// displacement into whole-block deltas.
    #[serde(default = "default_block_height_px")]
    pub block_height_px: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: default_double_tap_window_ms(),
            long_press_ms: default_long_press_ms(),
            block_height_px: default_block_height_px(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/teamgrid/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("teamgrid/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("teamgrid\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    pub fn load() -> Self {
        if let Some(config_path) = Self::config_path() {
            if config_path.exists() {
                if let Ok(content) = std::fs::read_to_string(&config_path) {
                    if let Ok(config) = toml::from_str(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.double_tap_window_ms, 300);
        assert_eq!(config.long_press_ms, 800);
        assert_eq!(config.block_height_px, 48.0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str("long_press_ms = 600").unwrap();
        assert_eq!(config.long_press_ms, 600);
        assert_eq!(config.double_tap_window_ms, 300);
    }
}
