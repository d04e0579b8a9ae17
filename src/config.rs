//! Configuration management for the scanner.
//!
//! Loads configuration from TOML files and provides runtime defaults.

use crate::types::CaptureRegion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Screen area sampled every tick
    #[serde(default)]
    pub region: CaptureRegion,

    /// Sleep between ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Where the diagnostic screenshot is written (overwritten every tick)
    #[serde(default)]
    pub artifact_path: Option<PathBuf>,

    /// Whether to write the diagnostic screenshot at all
    #[serde(default = "default_true")]
    pub save_artifacts: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            region: CaptureRegion::default(),
            interval_ms: default_interval_ms(),
            artifact_path: None,
            save_artifacts: true,
        }
    }
}

impl CaptureConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Resolved artifact path, if artifacts are enabled
    pub fn resolved_artifact_path(&self) -> Option<PathBuf> {
        if !self.save_artifacts {
            return None;
        }
        Some(
            self.artifact_path
                .clone()
                .unwrap_or_else(default_artifact_path),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Path to the tesseract binary (searched for when unset)
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,

    /// Tesseract language pack
    #[serde(default = "default_language")]
    pub language: String,

    /// Timeout for a single recognition call
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            language: default_language(),
            timeout_secs: default_ocr_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Minimum fuzzy score (exclusive) for a product alias to win
    #[serde(default = "default_product_threshold")]
    pub product_threshold: u8,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            product_threshold: default_product_threshold(),
        }
    }
}

/// A browser the URL resolver may target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserIdentity {
    /// Substring matched against window titles and owning application names
    pub name: String,

    /// Key combined with the platform modifier to focus the address bar
    #[serde(default = "default_focus_key")]
    pub focus_key: char,
}

impl BrowserIdentity {
    pub fn new(name: &str, focus_key: char) -> Self {
        Self {
            name: name.to_string(),
            focus_key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Supported browsers in preference order
    #[serde(default = "default_browsers")]
    pub browsers: Vec<BrowserIdentity>,

    /// Delay between triggering the copy and reading the clipboard
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browsers: default_browsers(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl BrowserConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_interval_ms() -> u64 {
    200
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_ocr_timeout() -> u64 {
    30
}

fn default_product_threshold() -> u8 {
    70
}

fn default_focus_key() -> char {
    'l'
}

fn default_settle_delay() -> u64 {
    50
}

fn default_browsers() -> Vec<BrowserIdentity> {
    vec![
        BrowserIdentity::new("Opera", 'l'),
        BrowserIdentity::new("Chrome", 'l'),
        BrowserIdentity::new("Firefox", 'l'),
        BrowserIdentity::new("Microsoft Edge", 'l'),
    ]
}

fn default_artifact_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("qb-scanner")
        .join("screenshot.png")
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qb-scanner")
            .join("config.toml")
    }

    /// Save configuration to the default path
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to_path(Self::default_config_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: PathBuf) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(&path, contents)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }
}
