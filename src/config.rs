//! Configuration parsing and management for Kagami

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, KagamiError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub avatar: AvatarConfig,
    pub tuning: TuningConfig,
    pub gestures: GesturesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            avatar: AvatarConfig::default(),
            tuning: TuningConfig::default(),
            gestures: GesturesConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, KagamiError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, KagamiError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, KagamiError> {
        // Try config paths in order
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), KagamiError> {
        if self.tracker.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tracker.port".to_string(),
                message: "Port must be greater than 0".to_string(),
            }
            .into());
        }

        if self.tracker.auto_launch {
            let path = std::path::Path::new(&self.tracker.tracker_script);
            if !path.exists() {
                tracing::warn!(
                    "Tracker auto_launch enabled but tracker script not found at: {}",
                    self.tracker.tracker_script
                );
            }
        }

        for (field, alpha) in [
            ("tuning.eye_alpha", self.tuning.eye_alpha),
            ("tuning.mouth_alpha", self.tuning.mouth_alpha),
            ("tuning.smile_alpha", self.tuning.smile_alpha),
            ("tuning.brow_alpha", self.tuning.brow_alpha),
            ("tuning.head_alpha", self.tuning.head_alpha),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Smoothing factor must be in (0.0, 1.0]".to_string(),
                }
                .into());
            }
        }

        if self.tuning.ear_open <= self.tuning.ear_closed {
            return Err(ConfigError::InvalidValue {
                field: "tuning.ear_open".to_string(),
                message: "Open threshold must be above the closed threshold".to_string(),
            }
            .into());
        }

        if self.gestures.wave_min_samples < 3 {
            return Err(ConfigError::InvalidValue {
                field: "gestures.wave_min_samples".to_string(),
                message: "Wave needs at least 3 samples to observe a reversal".to_string(),
            }
            .into());
        }

        if self.gestures.wave_history < self.gestures.wave_min_samples {
            return Err(ConfigError::InvalidValue {
                field: "gestures.wave_history".to_string(),
                message: "History capacity must hold at least wave_min_samples".to_string(),
            }
            .into());
        }

        if self.gestures.hand_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gestures.hand_interval".to_string(),
                message: "Hand detection interval must be at least 1".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Landmark tracker feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// UDP port to receive landmark packets on
    pub port: u16,
    /// Listen address for UDP socket
    pub listen_address: String,
    /// Auto-launch the Python tracker subprocess
    pub auto_launch: bool,
    /// Path to the tracker helper script
    pub tracker_script: String,
    /// Camera device index
    pub camera_device: u32,
    /// Camera capture width
    pub capture_width: u32,
    /// Camera capture height
    pub capture_height: u32,
    /// Camera capture FPS
    pub capture_fps: u32,
    /// Auto-restart subprocess on crash
    pub auto_restart: bool,
    /// Delay before restarting crashed subprocess (seconds)
    pub restart_delay_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            port: 9571,
            listen_address: "127.0.0.1".to_string(),
            auto_launch: true,
            tracker_script: "scripts/kagami_tracker.py".to_string(),
            camera_device: 0,
            capture_width: 640,
            capture_height: 480,
            capture_fps: 30,
            auto_restart: true,
            restart_delay_secs: 3,
        }
    }
}

/// Avatar rig configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Blend-weight names exposed by the loaded mesh
    pub blend_names: Vec<String>,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            blend_names: vec![
                "eyeBlinkLeft".to_string(),
                "eyeBlinkRight".to_string(),
                "jawOpen".to_string(),
                "mouthSmileLeft".to_string(),
                "mouthSmileRight".to_string(),
                "browInnerUp".to_string(),
            ],
        }
    }
}

/// Geometry thresholds and smoothing factors.
///
/// Gains convert small normalized-coordinate distances into usable
/// `[0, 1]` signal ranges; alphas are per-channel exponential smoothing
/// factors (higher = more responsive, lower = smoother).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    // --- Head pose ---
    /// Yaw multiplier on nose-to-eye-center horizontal offset
    #[serde(default = "default_8_0")]
    pub yaw_gain: f32,
    /// Pitch multiplier on nose vertical offset from frame center
    #[serde(default = "default_5_0")]
    pub pitch_gain: f32,
    /// Pitch bias correcting the downward rest position of the nose
    #[serde(default = "default_neg_0_25")]
    pub pitch_offset: f32,
    /// Magnitude below which head rotation snaps to neutral
    #[serde(default = "default_0_02")]
    pub head_deadzone: f32,
    #[serde(default = "default_0_3")]
    pub head_alpha: f32,

    // --- Eyes ---
    /// Eye aspect ratio at or below which the eye reads fully closed
    #[serde(default = "default_0_15")]
    pub ear_closed: f32,
    /// Eye aspect ratio at or above which the eye reads fully open
    #[serde(default = "default_0_28")]
    pub ear_open: f32,
    #[serde(default = "default_0_6")]
    pub eye_alpha: f32,

    // --- Mouth ---
    /// Multiplier on inner-lip gap
    #[serde(default = "default_12_0")]
    pub mouth_gain: f32,
    #[serde(default = "default_0_5")]
    pub mouth_alpha: f32,

    // --- Smile ---
    /// Width/height ratio below which the mouth reads neutral
    #[serde(default = "default_3_0")]
    pub smile_ratio_threshold: f32,
    #[serde(default = "default_0_8")]
    pub smile_gain: f32,
    #[serde(default = "default_0_25")]
    pub smile_alpha: f32,
    /// Scale applied to the smile channel before writing to the rig
    #[serde(default = "default_0_7")]
    pub smile_damping: f32,

    // --- Brows ---
    /// Brow-to-eyelid gap at the neutral expression
    #[serde(default = "default_0_035")]
    pub brow_offset: f32,
    #[serde(default = "default_25_0")]
    pub brow_gain: f32,
    #[serde(default = "default_0_25")]
    pub brow_alpha: f32,
    /// Scale applied to the brow channel before writing to the rig
    #[serde(default = "default_0_5")]
    pub brow_damping: f32,
}

fn default_8_0() -> f32 { 8.0 }
fn default_5_0() -> f32 { 5.0 }
fn default_neg_0_25() -> f32 { -0.25 }
fn default_0_02() -> f32 { 0.02 }
fn default_0_3() -> f32 { 0.3 }
fn default_0_15() -> f32 { 0.15 }
fn default_0_28() -> f32 { 0.28 }
fn default_0_6() -> f32 { 0.6 }
fn default_12_0() -> f32 { 12.0 }
fn default_0_5() -> f32 { 0.5 }
fn default_3_0() -> f32 { 3.0 }
fn default_0_8() -> f32 { 0.8 }
fn default_0_25() -> f32 { 0.25 }
fn default_0_7() -> f32 { 0.7 }
fn default_0_035() -> f32 { 0.035 }
fn default_25_0() -> f32 { 25.0 }

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            yaw_gain: default_8_0(),
            pitch_gain: default_5_0(),
            pitch_offset: default_neg_0_25(),
            head_deadzone: default_0_02(),
            head_alpha: default_0_3(),
            ear_closed: default_0_15(),
            ear_open: default_0_28(),
            eye_alpha: default_0_6(),
            mouth_gain: default_12_0(),
            mouth_alpha: default_0_5(),
            smile_ratio_threshold: default_3_0(),
            smile_gain: default_0_8(),
            smile_alpha: default_0_25(),
            smile_damping: default_0_7(),
            brow_offset: default_0_035(),
            brow_gain: default_25_0(),
            brow_alpha: default_0_25(),
            brow_damping: default_0_5(),
        }
    }
}

/// Gesture recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GesturesConfig {
    /// Enable hand tracking and gesture recognition
    pub enabled: bool,
    /// Run hand detection every N processed frames
    pub hand_interval: u64,
    /// Wrist history capacity (samples)
    pub wave_history: usize,
    /// Minimum samples before a wave can be classified
    pub wave_min_samples: usize,
    /// Minimum horizontal direction reversals for a wave
    pub wave_min_reversals: usize,
    /// Minimum horizontal travel range (normalized coordinates)
    pub wave_min_range_x: f32,
    /// Maximum vertical step between consecutive samples
    pub wave_max_step_y: f32,
    /// How far below the wrist a fingertip may sit and still count as curled
    pub thumb_curl_tolerance: f32,
    /// Minimum interval between two firings of the same gesture (ms)
    pub cooldown_ms: u64,
}

impl Default for GesturesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hand_interval: 2,
            wave_history: 14,
            wave_min_samples: 12,
            wave_min_reversals: 2,
            wave_min_range_x: 0.12,
            wave_max_step_y: 0.12,
            thumb_curl_tolerance: 0.05,
            cooldown_ms: 2000,
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("kagami");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/kagami");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/kagami");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("kagami");
        }
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracker.port, 9571);
        assert!(config.gestures.enabled);
        assert_eq!(config.gestures.cooldown_ms, 2000);
        assert!(config.avatar.blend_names.contains(&"jawOpen".to_string()));
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [tracker]
            port = 12000
            auto_launch = false

            [tuning]
            eye_alpha = 0.9
            ear_closed = 0.1

            [gestures]
            cooldown_ms = 1500
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.tracker.port, 12000);
        assert!(!config.tracker.auto_launch);
        assert_eq!(config.tuning.eye_alpha, 0.9);
        assert_eq!(config.tuning.ear_closed, 0.1);
        // Unspecified fields keep their defaults
        assert_eq!(config.tuning.ear_open, 0.28);
        assert_eq!(config.gestures.cooldown_ms, 1500);
        assert_eq!(config.gestures.wave_min_samples, 12);
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let mut config = Config::default();
        config.tuning.mouth_alpha = 0.0;
        assert!(config.validate().is_err());

        config.tuning.mouth_alpha = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ear_thresholds_ordered() {
        let mut config = Config::default();
        config.tuning.ear_open = config.tuning.ear_closed;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wave_history_must_hold_min_samples() {
        let mut config = Config::default();
        config.gestures.wave_history = 8;
        config.gestures.wave_min_samples = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_hand_interval_rejected() {
        let mut config = Config::default();
        config.gestures.hand_interval = 0;
        assert!(config.validate().is_err());
    }
}
