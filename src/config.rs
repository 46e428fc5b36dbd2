//! Application paths and user preferences.
//!
//! Paths resolve in this order:
//! 1. CLI `--config-dir`
//! 2. `SCENE_REVIEW_CONFIG_DIR` environment variable
//! 3. the current folder, if a config or log file already exists there
//! 4. the platform directory from dirs-next
//!
//! Platform paths:
//! - Linux: ~/.config/scene-review/{name}, ~/.local/share/scene-review/{name}
//! - macOS: ~/Library/Application Support/scene-review/{name}
//! - Windows: %APPDATA%\scene-review\{name}

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::detect::{DetectorKind, IndexLayout, IndexSettings};
use crate::ui::color::Rgba;

pub const APP_DIR: &str = "scene-review";
pub const SETTINGS_FILE: &str = "scene-review.json";
pub const LOG_FILE: &str = "scene-review.log";
pub const CONFIG_DIR_ENV: &str = "SCENE_REVIEW_CONFIG_DIR";

/// Override for the default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    config_dir(config).join(name)
}

/// Data files (logs) live next to the config when a custom dir is set.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    data_dir(config).join(name)
}

pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = config_dir(config);
    let data_dir = data_dir(config);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    }
    if data_dir != config_dir && !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }
    Ok(())
}

fn has_local_config_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_config_files(&current_dir) {
            return current_dir;
        }
    }
    match platform {
        Some(dir) => dir.join(APP_DIR),
        None => PathBuf::from("."),
    }
}

fn config_dir(config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir())
}

fn data_dir(config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir())
}

/// User preferences. Every field has a default, so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub background: Rgba,
    /// Target host refresh rate (Hz) for the tick clock
    pub refresh_rate: f64,

    pub scene_threshold: f64,
    pub shot_threshold: f64,
    pub subshot_threshold: f64,
    /// Shots at least this long (seconds) get a subshot pass
    pub subshot_min_length: f64,

    pub index_row_height: i32,
    pub index_indent: i32,
    pub index_font_size: f32,
    /// Pixels per wheel notch
    pub scroll_speed: i32,

    pub scenedetect_path: PathBuf,
    pub detector: DetectorKind,
    /// Frame rate assumed for image sequences
    pub sequence_fps: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_title: "Scene Review".to_string(),
            window_width: 1500,
            window_height: 800,
            background: Rgba::rgb(0x50, 0x55, 0x5e),
            refresh_rate: 60.0,
            scene_threshold: 8.0,
            shot_threshold: 6.0,
            subshot_threshold: 4.0,
            subshot_min_length: 10.0,
            index_row_height: 25,
            index_indent: 20,
            index_font_size: 14.0,
            scroll_speed: crate::ui::scroll::DEFAULT_SCROLL_SPEED,
            scenedetect_path: PathBuf::from("scenedetect"),
            detector: DetectorKind::Adaptive,
            sequence_fps: 24.0,
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file gives defaults; a file
    /// that fails to parse is reported and also gives defaults.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("Failed to read settings {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("Malformed settings {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write settings: {}", path.display()))?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings {
            scene_threshold: self.scene_threshold,
            shot_threshold: self.shot_threshold,
            subshot_threshold: self.subshot_threshold,
            subshot_min_length: self.subshot_min_length,
        }
    }

    pub fn index_layout(&self) -> IndexLayout {
        IndexLayout {
            row_height: self.index_row_height.max(1),
            indent: self.index_indent,
            font_size: self.index_font_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("test.json", &config), PathBuf::from("/custom/test.json"));
        assert_eq!(data_file(LOG_FILE, &config), PathBuf::from("/custom/scene-review.log"));
    }

    #[test]
    fn test_missing_settings_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r##"{ "window_width": 800, "background": "#000000", "detector": "content" }"##,
        )
        .unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.window_width, 800);
        assert_eq!(settings.background, Rgba::BLACK);
        assert_eq!(settings.detector, DetectorKind::Content);
        assert_eq!(settings.window_height, Settings::default().window_height);
    }

    #[test]
    fn test_malformed_settings_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());

        // Bad color string is a parse failure too
        std::fs::write(&path, r#"{ "background": "red" }"#).unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let settings = Settings {
            scene_threshold: 30.0,
            scenedetect_path: PathBuf::from("/opt/bin/scenedetect"),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }
}
