//! Configuration management for the storyreel engine

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Playback timing configuration
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Gesture classification thresholds
    #[serde(default)]
    pub gesture: GestureConfig,

    /// Story gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Display duration for image stories (ms)
    #[serde(default = "default_image_duration")]
    pub image_duration_ms: u64,

    /// Display duration for videos whose own duration is unknown (ms)
    #[serde(default = "default_video_fallback_duration")]
    pub video_fallback_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Minimum hold time before a touch counts as a long-press (ms)
    #[serde(default = "default_long_press")]
    pub long_press_ms: u64,

    /// Movement within this radius still counts as a stationary touch (px)
    #[serde(default = "default_touch_slop")]
    pub touch_slop_px: f32,

    /// Viewport width used for tap bucketing (px)
    #[serde(default = "default_viewport_width")]
    pub viewport_width_px: f32,

    /// Horizontal translation that resolves a pan as a user switch (px)
    #[serde(default = "default_swipe_distance")]
    pub swipe_distance_px: f32,

    /// Horizontal velocity that resolves a short pan as a user switch (px/s)
    #[serde(default = "default_swipe_velocity")]
    pub swipe_velocity_px_s: f32,

    /// Downward translation that resolves a pan as a dismissal (px)
    #[serde(default = "default_dismiss_distance")]
    pub dismiss_distance_px: f32,

    /// Downward velocity that resolves a short pan as a dismissal (px/s)
    #[serde(default = "default_dismiss_velocity")]
    pub dismiss_velocity_px_s: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the story service; remote calls are skipped when unset
    pub endpoint: Option<String>,

    /// Per-request timeout (ms)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

// Default value functions
fn default_image_duration() -> u64 {
    5_000
}

fn default_video_fallback_duration() -> u64 {
    15_000
}

fn default_long_press() -> u64 {
    200
}

fn default_touch_slop() -> f32 {
    12.0
}

fn default_viewport_width() -> f32 {
    430.0
}

fn default_swipe_distance() -> f32 {
    100.0
}

fn default_swipe_velocity() -> f32 {
    600.0
}

fn default_dismiss_distance() -> f32 {
    150.0
}

fn default_dismiss_velocity() -> f32 {
    800.0
}

fn default_request_timeout() -> u64 {
    4_000
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            image_duration_ms: default_image_duration(),
            video_fallback_duration_ms: default_video_fallback_duration(),
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_ms: default_long_press(),
            touch_slop_px: default_touch_slop(),
            viewport_width_px: default_viewport_width(),
            swipe_distance_px: default_swipe_distance(),
            swipe_velocity_px_s: default_swipe_velocity(),
            dismiss_distance_px: default_dismiss_distance(),
            dismiss_velocity_px_s: default_dismiss_velocity(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            config.config_path = Some(config_path);
            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = match self.config_path.clone() {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the config file path
    pub fn config_path(&self) -> Result<PathBuf> {
        match self.config_path.clone() {
            Some(path) => Ok(path),
            None => Self::default_config_path(),
        }
    }

    /// Get default config path
    fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("dev", "storyreel", "storyreel")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}
