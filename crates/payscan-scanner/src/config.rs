//! # Scanner Configuration
//!
//! Configuration management for the scan controller.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PAYSCAN_POLL_INTERVAL_MS=250                                       │
//! │     PAYSCAN_MAX_DIMENSION=800                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/payscan/scanner.toml (Linux)                             │
//! │     ~/Library/Application Support/com.payscan.scanner/scanner.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     500 ms polling, 1024 px bound, 10 MiB uploads, 5 s toasts          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scanner.toml
//! [scanner]
//! poll_interval_ms = 500
//! max_dimension = 1024
//!
//! [upload]
//! max_bytes = 10485760
//! accepted_mime_prefix = "image/"
//!
//! [camera]
//! facing = "environment"
//! ideal_width = 640
//! ideal_height = 480
//!
//! [notifications]
//! lifetime_secs = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use payscan_core::validation::UploadLimits;
use payscan_core::{
    ACCEPTED_MIME_PREFIX, DEFAULT_MAX_DIMENSION, DEFAULT_POLL_INTERVAL_MS, IDEAL_CAPTURE_HEIGHT,
    IDEAL_CAPTURE_WIDTH, MAX_UPLOAD_BYTES, NOTIFICATION_LIFETIME_SECS,
};

use crate::error::{ScanError, ScanResult};

/// Upper bound for `notifications.lifetime_secs` (one hour).
pub const MAX_NOTIFICATION_LIFETIME_SECS: u64 = 60 * 60;

// =============================================================================
// Facing Mode
// =============================================================================

/// Which camera to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera (what you point at a printed code).
    #[default]
    Environment,
    /// Front camera.
    User,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            "user" | "front" => Ok(FacingMode::User),
            other => Err(ScanError::InvalidConfig(format!(
                "Unknown camera facing: '{}'. Valid options: environment, user",
                other
            ))),
        }
    }
}

// =============================================================================
// Scanner Settings
// =============================================================================

/// Poll loop and normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Delay between camera poll ticks (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Largest side of an uploaded image after normalization (pixels).
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            poll_interval_ms: default_poll_interval(),
            max_dimension: default_max_dimension(),
        }
    }
}

// =============================================================================
// Upload Settings
// =============================================================================

/// Gallery upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Largest accepted file in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Required MIME prefix.
    #[serde(default = "default_mime_prefix")]
    pub accepted_mime_prefix: String,
}

fn default_max_bytes() -> u64 {
    MAX_UPLOAD_BYTES
}

fn default_mime_prefix() -> String {
    ACCEPTED_MIME_PREFIX.to_string()
}

impl Default for UploadSettings {
    fn default() -> Self {
        UploadSettings {
            max_bytes: default_max_bytes(),
            accepted_mime_prefix: default_mime_prefix(),
        }
    }
}

// =============================================================================
// Camera Settings
// =============================================================================

/// Capture request settings. The device may deliver another resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default)]
    pub facing: FacingMode,

    #[serde(default = "default_ideal_width")]
    pub ideal_width: u32,

    #[serde(default = "default_ideal_height")]
    pub ideal_height: u32,
}

fn default_ideal_width() -> u32 {
    IDEAL_CAPTURE_WIDTH
}

fn default_ideal_height() -> u32 {
    IDEAL_CAPTURE_HEIGHT
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraSettings {
            facing: FacingMode::default(),
            ideal_width: default_ideal_width(),
            ideal_height: default_ideal_height(),
        }
    }
}

// =============================================================================
// Notification Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// How long each notification stays visible (seconds).
    #[serde(default = "default_lifetime")]
    pub lifetime_secs: u64,
}

fn default_lifetime() -> u64 {
    NOTIFICATION_LIFETIME_SECS
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            lifetime_secs: default_lifetime(),
        }
    }
}

// =============================================================================
// Main Scanner Configuration
// =============================================================================

/// Complete scanner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub upload: UploadSettings,

    #[serde(default)]
    pub camera: CameraSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl ScannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scanner.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ScanResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scanner config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ScanError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scanner config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ScanResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ScanError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Scanner config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ScanResult<()> {
        if self.scanner.poll_interval_ms == 0 {
            return Err(ScanError::InvalidConfig(
                "poll_interval_ms must be greater than 0".into(),
            ));
        }

        if self.scanner.max_dimension == 0 {
            return Err(ScanError::InvalidConfig(
                "max_dimension must be greater than 0".into(),
            ));
        }

        if self.upload.max_bytes == 0 {
            return Err(ScanError::InvalidConfig(
                "upload max_bytes must be greater than 0".into(),
            ));
        }

        if self.upload.accepted_mime_prefix.is_empty() {
            return Err(ScanError::InvalidConfig(
                "accepted_mime_prefix must not be empty".into(),
            ));
        }

        if self.notifications.lifetime_secs == 0 {
            return Err(ScanError::InvalidConfig(
                "notification lifetime_secs must be greater than 0".into(),
            ));
        }

        if self.notifications.lifetime_secs > MAX_NOTIFICATION_LIFETIME_SECS {
            return Err(ScanError::InvalidConfig(format!(
                "notification lifetime_secs must be at most {}",
                MAX_NOTIFICATION_LIFETIME_SECS
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the environment in production).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PAYSCAN_POLL_INTERVAL_MS") {
            match value.parse::<u64>() {
                Ok(ms) => {
                    debug!(poll_interval_ms = ms, "Overriding poll interval from environment");
                    self.scanner.poll_interval_ms = ms;
                }
                Err(_) => warn!(value = %value, "Invalid PAYSCAN_POLL_INTERVAL_MS"),
            }
        }

        if let Some(value) = lookup("PAYSCAN_MAX_DIMENSION") {
            if let Ok(px) = value.parse::<u32>() {
                debug!(max_dimension = px, "Overriding max dimension from environment");
                self.scanner.max_dimension = px;
            }
        }

        if let Some(value) = lookup("PAYSCAN_MAX_UPLOAD_BYTES") {
            if let Ok(bytes) = value.parse::<u64>() {
                self.upload.max_bytes = bytes;
            }
        }

        if let Some(value) = lookup("PAYSCAN_NOTIFICATION_LIFETIME_SECS") {
            if let Ok(secs) = value.parse::<u64>() {
                self.notifications.lifetime_secs = secs;
            }
        }

        if let Some(value) = lookup("PAYSCAN_CAMERA_FACING") {
            match value.parse() {
                Ok(facing) => self.camera.facing = facing,
                Err(_) => warn!(value = %value, "Unknown camera facing in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "payscan", "scanner")
            .map(|dirs| dirs.config_dir().join("scanner.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.scanner.poll_interval_ms)
    }

    pub fn max_dimension(&self) -> u32 {
        self.scanner.max_dimension
    }

    pub fn notification_lifetime(&self) -> Duration {
        Duration::from_secs(self.notifications.lifetime_secs)
    }

    /// Upload limits in the form the core validator expects.
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            mime_prefix: self.upload.accepted_mime_prefix.clone(),
            max_bytes: self.upload.max_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.max_dimension(), 1024);
        assert_eq!(config.upload.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.camera.facing, FacingMode::Environment);
        assert_eq!(config.camera.ideal_width, 640);
        assert_eq!(config.camera.ideal_height, 480);
        assert_eq!(config.notification_lifetime(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScannerConfig::default();
        config.scanner.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.scanner.max_dimension = 0;
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.upload.accepted_mime_prefix.clear();
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.notifications.lifetime_secs = 0;
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_notification_lifetime_is_capped() {
        let mut config = ScannerConfig::default();
        config.notifications.lifetime_secs = MAX_NOTIFICATION_LIFETIME_SECS;
        assert!(config.validate().is_ok());

        config.notifications.lifetime_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn test_facing_parsing() {
        assert_eq!("rear".parse::<FacingMode>().unwrap(), FacingMode::Environment);
        assert_eq!("front".parse::<FacingMode>().unwrap(), FacingMode::User);
        assert!("sideways".parse::<FacingMode>().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PAYSCAN_POLL_INTERVAL_MS", "250"),
            ("PAYSCAN_MAX_DIMENSION", "800"),
            ("PAYSCAN_CAMERA_FACING", "user"),
            ("PAYSCAN_MAX_UPLOAD_BYTES", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = ScannerConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.scanner.poll_interval_ms, 250);
        assert_eq!(config.scanner.max_dimension, 800);
        assert_eq!(config.camera.facing, FacingMode::User);
        assert_eq!(config.upload.max_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ScannerConfig = toml::from_str("[scanner]\npoll_interval_ms = 100\n").unwrap();
        assert_eq!(config.scanner.poll_interval_ms, 100);
        assert_eq!(config.scanner.max_dimension, 1024);
        assert_eq!(config.notifications.lifetime_secs, 5);
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ScannerConfig::default()).unwrap();
        assert!(toml_str.contains("[scanner]"));
        assert!(toml_str.contains("[upload]"));
        assert!(toml_str.contains("facing = \"environment\""));
    }

    #[test]
    fn test_upload_limits() {
        let limits = ScannerConfig::default().upload_limits();
        assert_eq!(limits.mime_prefix, "image/");
        assert_eq!(limits.max_bytes, 10 * 1024 * 1024);
    }
}
